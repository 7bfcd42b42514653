//! Error types surfaced by the library

use thiserror::Error;

/// Errors that abort a whole probing run
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("no candidate proxies to check")]
    NoCandidates,

    #[error("quota must be at least 1, got {0}")]
    InvalidQuota(i64),

    #[error("probe worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Errors raised while resolving the probe target from a web page
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("no download link found on {0}")]
    LinkNotFound(String),

    #[error("invalid link pattern: {0}")]
    Pattern(#[from] regex::Error),
}
