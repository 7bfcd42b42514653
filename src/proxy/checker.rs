//! Proxy checker module for probing a proxy against a target URL

use crate::proxy::models::{Proxy, Verdict};
use crate::Result;
use async_trait::async_trait;
use reqwest::{redirect, Client, Proxy as ReqwestProxy, StatusCode};
use std::time::Duration;
use tracing::{debug, trace};

/// Default timeout for a single probe in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 8;

/// Browser user agent sent with every probe
pub const DEFAULT_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 ",
    "(KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
);

/// A single check of one proxy against one target.
///
/// Implementations must be total: every outcome, including transport
/// errors, is reduced to a [`Verdict`].
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, proxy: &Proxy, target: &str) -> Verdict;
}

/// Configuration for proxy checker
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Total timeout for each probe request
    pub timeout: Duration,
    /// User agent sent to the target
    pub user_agent: String,
    /// Status code that marks a proxy as working
    pub expected_status: StatusCode,
    /// Skip certificate validation on the probe client
    pub accept_invalid_certs: bool,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            // a working proxy relays the target's download redirect
            expected_status: StatusCode::FOUND,
            accept_invalid_certs: true,
        }
    }
}

impl CheckerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn with_expected_status(mut self, status: StatusCode) -> Self {
        self.expected_status = status;
        self
    }

    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }
}

/// Probes proxies with a real HTTP request through them
#[derive(Debug, Clone, Default)]
pub struct ProxyChecker {
    config: CheckerConfig,
}

impl ProxyChecker {
    /// Create a new proxy checker with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new proxy checker with custom configuration
    pub fn with_config(config: CheckerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Check a single proxy, returning why it failed if it did
    pub async fn check_proxy(&self, proxy: &Proxy, target: &str) -> Result<()> {
        let client = self.create_client(proxy)?;
        let response = client.get(target).send().await?;
        let status = response.status();
        if status == self.config.expected_status {
            Ok(())
        } else {
            Err(anyhow::anyhow!("HTTP status: {}", status))
        }
    }

    /// Create a reqwest client routed through the proxy
    fn create_client(&self, proxy: &Proxy) -> Result<Client> {
        let mut reqwest_proxy = ReqwestProxy::all(proxy.url())?;
        if let Some(auth) = &proxy.auth {
            reqwest_proxy = reqwest_proxy.basic_auth(&auth.username, &auth.password);
        }

        let client = Client::builder()
            .proxy(reqwest_proxy)
            .user_agent(&self.config.user_agent)
            .redirect(redirect::Policy::none())
            .timeout(self.config.timeout)
            .danger_accept_invalid_certs(self.config.accept_invalid_certs)
            .build()?;

        Ok(client)
    }
}

#[async_trait]
impl Probe for ProxyChecker {
    async fn probe(&self, proxy: &Proxy, target: &str) -> Verdict {
        match self.check_proxy(proxy, target).await {
            Ok(()) => {
                trace!("proxy {} relayed the expected response", proxy);
                Verdict::Success
            }
            Err(e) => {
                debug!("proxy {} failed: {:#}", proxy, e);
                Verdict::Failure
            }
        }
    }
}
