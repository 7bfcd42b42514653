//! Proxy Quota - concurrent proxy prober
//!
//! Probes a list of HTTP proxies against a single target URL and stops as
//! soon as a requested number of them produce the expected response.

pub mod error;
pub mod proxy;
pub mod report;
pub mod scheduler;

pub use error::{ResolveError, SchedulerError};
pub use proxy::*;
pub use report::{ConsoleReporter, Reporter};
pub use scheduler::{Report, Scheduler, SchedulerConfig, Tally};

/// Application result type
pub type Result<T> = anyhow::Result<T>;
