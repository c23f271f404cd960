//! Library definitions.
//!
//! Exports configuration, authorization, and the main proxy service
//! implementation.

pub mod config;
pub mod core;
pub mod security;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

pub use config::{Config, ProxyError, ProxyPolicy, Result};
pub use core::middleware::SessionSnapshot;
pub use core::proxy::{MapGateProxy, UpstreamTarget};
pub use security::credentials::{SsoTokenProvider, StaticTokenProvider};
pub use security::linkcheck::{
    Decision, DenyReason, InMemoryLinkRegistry, LinkRegistry, authorize,
};
pub use security::rules::{AuthType, MatchType, RuleSet, RuleSpec, ServiceRule};
