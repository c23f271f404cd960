//! Header filtering and forwarded-host injection.
//!
//! Strips headers that must not cross the proxy boundary, on both the
//! outbound request and the upstream response, and adds X-Forwarded-*
//! headers when configured.

use crate::config::Config;
use pingora::Result;
use pingora::http::{RequestHeader, ResponseHeader};

/// Headers removed from forwarded requests and upstream responses.
/// Matching is case-insensitive; surviving headers keep their order and
/// values.
pub const FILTERED_HEADERS: [&str; 6] = [
    "X-XSRF-TOKEN",
    "Access-Control-Allow-Origin",
    "Vary",
    "Access-Control-Allow-Credentials",
    "Strict-Transport-Security",
    "Etag",
];

/// Strips the filtered headers from the outbound request.
pub fn strip_request_headers(upstream_request: &mut RequestHeader) {
    for name in FILTERED_HEADERS {
        upstream_request.remove_header(name);
    }
}

/// Strips the filtered headers from the upstream response.
pub fn strip_response_headers(upstream_response: &mut ResponseHeader) {
    for name in FILTERED_HEADERS {
        upstream_response.remove_header(name);
    }
}

/// Adds X-Forwarded-Host/-Proto/-Prefix computed from the original request
/// authority and the configured public scheme and prefix path.
///
/// # Errors
///
/// Returns an error if header insertion fails.
pub fn apply_forward_headers(
    upstream_request: &mut RequestHeader,
    original_host: &str,
    config: &Config,
) -> Result<()> {
    upstream_request.insert_header("X-Forwarded-Host", original_host)?;
    upstream_request.insert_header("X-Forwarded-Proto", config.forward_proto.as_str())?;
    upstream_request.insert_header(
        "X-Forwarded-Prefix",
        config.forward_host_prefix_path.as_str(),
    )?;
    Ok(())
}
