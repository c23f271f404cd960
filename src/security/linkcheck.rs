//! Link-registry authorization.
//!
//! Under the LinkCheck policy, unauthenticated requests are only allowed
//! when the requested host appears in at least one analyzed metadata link.
//! The registry is consulted fresh for every decision.

use crate::config::{ProxyError, Result};
use crate::core::middleware::SessionSnapshot;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use url::Url;

/// Lookup over persisted analyzed-link records, keyed by exact host.
#[async_trait]
pub trait LinkRegistry: Send + Sync {
    /// Number of analyzed links whose host matches exactly.
    async fn count_for_host(&self, host: &str) -> u64;

    /// Total number of analyzed links.
    async fn count_total(&self) -> u64;
}

/// Why an unauthenticated request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The registry has never been populated; likely a misconfiguration.
    EmptyRegistry,
    /// The registry is populated but this host was never seen.
    HostNotRegistered,
}

impl DenyReason {
    /// Operator-facing message included in the 403 body.
    #[must_use]
    pub fn message(&self, url: &str) -> String {
        let not_registered = format!(
            "The proxy does not allow to access '{url}' because the URL host \
             was not registered in any metadata records."
        );
        match self {
            Self::HostNotRegistered => not_registered,
            Self::EmptyRegistry => format!(
                "The proxy is configured with DB_LINK_CHECK mode but the link \
                 registry is empty. Administrator may need to analyze record \
                 links from the admin console in order to register URL allowed \
                 by the proxy. {not_registered}"
            ),
        }
    }
}

/// Outcome of a link authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

/// Decides whether a request may be forwarded under the LinkCheck policy.
///
/// Authenticated sessions bypass the registry entirely. Both deny reasons
/// surface as 403; the reason only differs in the body text and logs.
///
/// # Errors
///
/// Returns `ProxyError::InvalidUrl` when the `url` parameter is missing,
/// unparsable, or has no host component. This is a client error, never a
/// silent allow.
pub async fn authorize(
    session: &SessionSnapshot,
    url_param: Option<&str>,
    registry: &dyn LinkRegistry,
) -> Result<Decision> {
    if session.authenticated {
        return Ok(Decision::Allow);
    }

    let raw = url_param
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ProxyError::InvalidUrl("missing 'url' parameter".to_string()))?;
    let parsed = Url::parse(raw)
        .map_err(|e| ProxyError::InvalidUrl(format!("'{raw}' is invalid. Error is: '{e}'")))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| ProxyError::InvalidUrl(format!("'{raw}' has no host component")))?;

    if registry.count_for_host(host).await > 0 {
        return Ok(Decision::Allow);
    }

    if registry.count_total().await == 0 {
        Ok(Decision::Deny(DenyReason::EmptyRegistry))
    } else {
        Ok(Decision::Deny(DenyReason::HostNotRegistered))
    }
}

/// Registry built from a host list loaded at startup.
///
/// The file format is one host per line; blank lines and `#` comments are
/// skipped. Repeated hosts accumulate their link count.
#[derive(Default)]
pub struct InMemoryLinkRegistry {
    hosts: HashMap<String, u64>,
    total: u64,
}

impl InMemoryLinkRegistry {
    /// An empty registry; every unauthenticated request is denied with the
    /// empty-registry diagnosis.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a registry from host names.
    pub fn from_hosts<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map: HashMap<String, u64> = HashMap::new();
        let mut total = 0;
        for host in hosts {
            let host = host.as_ref().trim();
            if host.is_empty() || host.starts_with('#') {
                continue;
            }
            *map.entry(host.to_string()).or_default() += 1;
            total += 1;
        }
        Self { hosts: map, total }
    }

    /// Loads a host list file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(Self::from_hosts(data.lines()))
    }
}

#[async_trait]
impl LinkRegistry for InMemoryLinkRegistry {
    async fn count_for_host(&self, host: &str) -> u64 {
        self.hosts.get(host).copied().unwrap_or(0)
    }

    async fn count_total(&self) -> u64 {
        self.total
    }
}
