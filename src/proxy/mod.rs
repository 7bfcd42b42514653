//! Proxy module for loading, probing and target resolution
//!
//! This module provides functionality for:
//! - Parsing proxy lists into `host:port` candidates
//! - Probing a single proxy against a target URL
//! - Resolving the target URL by scraping a download page

pub mod checker;
pub mod models;
pub mod parser;
pub mod resolver;

pub use checker::{CheckerConfig, Probe, ProxyChecker};
pub use models::{Proxy, ProxyAuth, Quota, Verdict};
pub use parser::ProxyParser;
pub use resolver::{ResolverConfig, TargetResolver};
