//! Target resolver module for finding the probe target on a web page
//!
//! The target is the download endpoint linked from a mod page. The page is
//! fetched once, directly, and the first matching `href` is used.

use crate::error::ResolveError;
use crate::proxy::checker::DEFAULT_USER_AGENT;
use regex::Regex;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

/// Default timeout for fetching the page in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default pattern for download links; group 1 is the URL
pub const DEFAULT_LINK_PATTERN: &str =
    r#"href="([^"]*api\.geode-sdk\.org/v1/mods/[^/]+/versions/[^/]+/download[^"]*)""#;

/// Configuration for target resolver
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Timeout for the page request
    pub timeout: Duration,
    /// User agent for the page request
    pub user_agent: String,
    /// Regex whose first capture group is the target URL
    pub link_pattern: String,
    /// Skip certificate validation when fetching the page
    pub accept_invalid_certs: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            link_pattern: DEFAULT_LINK_PATTERN.to_string(),
            accept_invalid_certs: true,
        }
    }
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_link_pattern(mut self, pattern: String) -> Self {
        self.link_pattern = pattern;
        self
    }

    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }
}

/// Resolves the probe target by scraping a page for its download link
pub struct TargetResolver {
    client: Client,
    link_regex: Regex,
}

impl TargetResolver {
    /// Create a new resolver with default configuration
    pub fn new() -> crate::Result<Self> {
        Self::with_config(ResolverConfig::default())
    }

    /// Create a new resolver with custom configuration
    pub fn with_config(config: ResolverConfig) -> crate::Result<Self> {
        let link_regex = Regex::new(&config.link_pattern).map_err(ResolveError::from)?;
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self { client, link_regex })
    }

    /// Fetch `page_url` and return the download link found on it
    pub async fn resolve(&self, page_url: &str) -> Result<String, ResolveError> {
        debug!("Fetching page {}", page_url);
        let fetch_err = |source| ResolveError::Fetch {
            url: page_url.to_string(),
            source,
        };

        let content = self
            .client
            .get(page_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(fetch_err)?
            .text()
            .await
            .map_err(fetch_err)?;

        let link = self
            .extract_link(&content)
            .ok_or_else(|| ResolveError::LinkNotFound(page_url.to_string()))?;
        info!("Extracted download URL: {}", link);
        Ok(link)
    }

    /// Extract the first download link from page content
    pub fn extract_link(&self, content: &str) -> Option<String> {
        self.link_regex
            .captures(content)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}
