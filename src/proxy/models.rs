//! Proxy data models

use crate::error::SchedulerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Proxy authentication credentials
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProxyAuth {
    pub username: String,
    pub password: String,
}

impl ProxyAuth {
    pub fn new(username: String, password: String) -> Self {
        Self { username, password }
    }
}

/// A candidate HTTP proxy, identified by its `host:port` address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Proxy {
    pub host: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<ProxyAuth>,
}

impl Proxy {
    /// Create a new proxy without authentication
    pub fn new(host: String, port: u16) -> Self {
        Self {
            host,
            port,
            auth: None,
        }
    }

    /// Create a new proxy with authentication
    pub fn with_auth(host: String, port: u16, username: String, password: String) -> Self {
        Self {
            host,
            port,
            auth: Some(ProxyAuth::new(username, password)),
        }
    }

    /// Get the proxy URL string used to route requests through it
    ///
    /// Every candidate is spoken to as a plain HTTP proxy, including for
    /// https targets, which are tunnelled with CONNECT. Credentials are
    /// not part of it; they are sent as basic auth by the checker.
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Get the proxy string in HOST:PORT format
    pub fn to_simple_string(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the proxy as a list entry that parses back to the same proxy
    pub fn to_full_string(&self) -> String {
        match &self.auth {
            Some(auth) => format!(
                "http://{}:{}@{}:{}",
                auth.username, auth.password, self.host, self.port
            ),
            None => self.to_simple_string(),
        }
    }
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for Proxy {
    type Err = String;

    /// Parses `HOST:PORT` or `USER:PASS@HOST:PORT`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (auth, address) = match s.rsplit_once('@') {
            Some((credentials, address)) => {
                let (username, password) = credentials
                    .split_once(':')
                    .ok_or_else(|| format!("missing password in {:?}", s))?;
                if username.is_empty() {
                    return Err(format!("missing username in {:?}", s));
                }
                (
                    Some(ProxyAuth::new(username.to_string(), password.to_string())),
                    address,
                )
            }
            None => (None, s),
        };

        let (host, port) = address
            .rsplit_once(':')
            .ok_or_else(|| format!("missing port in {:?}", s))?;
        if host.is_empty() || host.contains(['/', ' ']) {
            return Err(format!("invalid host in {:?}", s));
        }
        let port: u16 = port
            .parse()
            .map_err(|_| format!("invalid port in {:?}", s))?;
        if port == 0 {
            return Err(format!("invalid port in {:?}", s));
        }
        Ok(Self {
            host: host.to_string(),
            port,
            auth,
        })
    }
}

/// Outcome of exactly one probe of one proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Success,
    Failure,
}

impl Verdict {
    pub fn is_success(&self) -> bool {
        matches!(self, Verdict::Success)
    }
}

impl From<bool> for Verdict {
    fn from(ok: bool) -> Self {
        if ok {
            Verdict::Success
        } else {
            Verdict::Failure
        }
    }
}

/// Number of working proxies a run is looking for, always at least 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Quota(usize);

impl Quota {
    pub fn new(n: i64) -> Result<Self, SchedulerError> {
        if n < 1 {
            return Err(SchedulerError::InvalidQuota(n));
        }
        usize::try_from(n)
            .map(Quota)
            .map_err(|_| SchedulerError::InvalidQuota(n))
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl TryFrom<i64> for Quota {
    type Error = SchedulerError;

    fn try_from(n: i64) -> Result<Self, Self::Error> {
        Self::new(n)
    }
}

impl fmt::Display for Quota {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
