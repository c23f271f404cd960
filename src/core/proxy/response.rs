//! HTTP response utilities.
//!
//! Serves the plain-text error responses the proxy produces itself,
//! without contacting the upstream.

use pingora::Result;
use pingora::http::ResponseHeader;
use pingora::proxy::Session;

/// Writes a plain-text error response and ends the request.
///
/// # Errors
///
/// Returns an error if headers cannot be built or the response cannot be
/// written.
pub async fn serve_error(session: &mut Session, status: u16, body: String) -> Result<bool> {
    let mut header = ResponseHeader::build(status, None)?;
    header.insert_header("Content-Type", "text/plain; charset=utf-8")?;
    header.insert_header("Content-Length", body.len().to_string())?;
    header.insert_header("Cache-Control", "no-store")?;

    session
        .write_response_header(Box::new(header), false)
        .await?;
    session
        .write_response_body(Some(bytes::Bytes::from(body)), true)
        .await?;
    Ok(true)
}
