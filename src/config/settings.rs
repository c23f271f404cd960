//! Configuration settings.
//!
//! Defines the main `Config` struct and environment variable loading logic.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// Authorization policy enforced for the lifetime of the proxy instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyPolicy {
    /// Every request is forwarded unconditionally.
    None,
    /// Unauthenticated requests are only forwarded when the target host is
    /// registered in at least one analyzed metadata link.
    LinkCheck,
}

impl ProxyPolicy {
    fn parse(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "DB_LINK_CHECK" | "LINK_CHECK" => Self::LinkCheck,
            _ => Self::None,
        }
    }
}

fn get_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} must be set in environment"))
}

fn get_env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn get_env_bool(key: &str) -> bool {
    env::var(key)
        .map(|v| v.to_lowercase() == "true" || v == "1")
        .unwrap_or(false)
}

fn get_env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Application configuration loaded from environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to listen on.
    pub listen_addr: SocketAddr,
    /// Upstream target URL requests are proxied to.
    pub target_url: String,
    /// Authorization policy, fixed after initialization.
    pub proxy_policy: ProxyPolicy,
    /// Whether to add X-Forwarded-Host/-Proto/-Prefix to upstream requests.
    pub forward_host: bool,
    /// Prefix path appended to X-Forwarded-Prefix.
    pub forward_host_prefix_path: String,
    /// Public scheme reported in X-Forwarded-Proto (TLS terminates upstream
    /// of this proxy).
    pub forward_proto: String,
    /// Trusted header marking an authenticated session, set by the fronting
    /// web layer.
    pub auth_header: String,
    /// Static SSO bearer token used for Bearer service rules, if configured.
    pub sso_token: Option<String>,
    /// Path to the JSON file with secured map-service rules.
    pub rules_path: Option<PathBuf>,
    /// Path to the analyzed-link host list used by the LinkCheck policy.
    pub link_hosts_path: Option<PathBuf>,
    /// Logging format: "json" or "pretty".
    pub log_format: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Panics
    ///
    /// Panics if `LISTEN_ADDR` is not a valid socket address or if
    /// `TARGET_URL` is missing. The proxy refuses to start without a target.
    #[must_use]
    pub fn from_env() -> Arc<Self> {
        let listen_addr = get_env_or("LISTEN_ADDR", "0.0.0.0:8080")
            .parse()
            .expect("LISTEN_ADDR must be a valid socket address");
        let target_url = get_env("TARGET_URL");
        let proxy_policy = ProxyPolicy::parse(&get_env_or("PROXY_POLICY", "NONE"));
        let forward_host = get_env_bool("FORWARD_HOST");
        let forward_host_prefix_path = get_env_or("FORWARD_HOST_PREFIX_PATH", "");
        let forward_proto = get_env_or("FORWARD_PROTO", "http");
        let auth_header = get_env_or("AUTH_HEADER", "X-Authenticated-User");
        let sso_token = get_env_opt("SSO_TOKEN");
        let rules_path = get_env_opt("MAP_SERVICES_PATH").map(PathBuf::from);
        let link_hosts_path = get_env_opt("LINK_HOSTS_PATH").map(PathBuf::from);
        let log_format = get_env_or("LOG_FORMAT", "json");

        Arc::new(Self {
            listen_addr,
            target_url,
            proxy_policy,
            forward_host,
            forward_host_prefix_path,
            forward_proto,
            auth_header,
            sso_token,
            rules_path,
            link_hosts_path,
            log_format,
        })
    }
}
