//! Error types and result aliases.
//!
//! Defines the core `ProxyError` enumeration and common `Result` type.

use thiserror::Error;

/// Proxy-specific errors.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Configuration error. Fatal at startup, never downgraded.
    #[error("configuration error: {0}")]
    Config(String),

    /// The `url` request parameter could not be parsed. Surfaces as a 400.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Upstream target error.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// I/O error while loading rule or registry files.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for `ProxyError`.
pub type Result<T> = std::result::Result<T, ProxyError>;
