//! Test utilities and shared configuration.
//!
//! Common helpers for unit and integration tests.

#[cfg(any(test, feature = "testing"))]
use crate::config::{Config, ProxyPolicy};
#[cfg(any(test, feature = "testing"))]
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
#[cfg(any(test, feature = "testing"))]
use std::sync::Arc;

/// Creates a standard configuration for testing purposes: local target,
/// no policy, forwarding headers off.
#[cfg(any(test, feature = "testing"))]
#[must_use]
pub fn create_test_config() -> Arc<Config> {
    Arc::new(Config {
        listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8080),
        target_url: "http://127.0.0.1:8080".to_string(),
        proxy_policy: ProxyPolicy::None,
        forward_host: false,
        forward_host_prefix_path: String::new(),
        forward_proto: "http".to_string(),
        auth_header: "X-Authenticated-User".to_string(),
        sso_token: None,
        rules_path: None,
        link_hosts_path: None,
        log_format: "pretty".to_string(),
    })
}
