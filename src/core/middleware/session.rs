//! Session snapshot.
//!
//! Identity is managed by the fronting web layer; the proxy only reads
//! whether the session is authenticated, once per request.

use pingora::http::RequestHeader;

/// Read-only view of the caller's session, taken at the start of request
/// handling. Later identity changes are not observed within the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionSnapshot {
    pub authenticated: bool,
}

impl SessionSnapshot {
    #[must_use]
    pub const fn new(authenticated: bool) -> Self {
        Self { authenticated }
    }

    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            authenticated: false,
        }
    }

    /// Resolves the snapshot from the trusted header the fronting auth layer
    /// sets for authenticated principals. A missing, empty, or literal
    /// "anonymous" value means unauthenticated.
    #[must_use]
    pub fn from_request(req: &RequestHeader, trusted_header: &str) -> Self {
        let authenticated = req
            .headers
            .get(trusted_header)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| !v.is_empty() && !v.eq_ignore_ascii_case("anonymous"));
        Self { authenticated }
    }
}
