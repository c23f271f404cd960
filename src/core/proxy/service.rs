//! Proxy service logic.
//!
//! Implements the per-request policy decision, header preparation, and
//! credential injection around Pingora's forwarding engine.

use crate::config::{Config, ProxyError, ProxyPolicy};
use crate::core::middleware::SessionSnapshot;
use crate::core::proxy::headers::{
    apply_forward_headers, strip_request_headers, strip_response_headers,
};
use crate::core::proxy::response::serve_error;
use crate::security::credentials::{SsoTokenProvider, inject};
use crate::security::linkcheck::{Decision, LinkRegistry, authorize};
use crate::security::rules::RuleSet;
use async_trait::async_trait;
use percent_encoding::percent_decode_str;
use pingora::Result;
use pingora::http::{RequestHeader, ResponseHeader};
use pingora::proxy::{ProxyHttp, Session};
use pingora::upstreams::peer::HttpPeer;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Upstream target fixed at startup, parsed from `TARGET_URL`.
#[derive(Debug, Clone)]
pub struct UpstreamTarget {
    pub addr: String,
    pub tls: bool,
    pub sni: String,
    pub host_header: String,
}

impl UpstreamTarget {
    /// Parses an http(s) target URL into peer parameters.
    ///
    /// # Errors
    ///
    /// Returns `ProxyError::Upstream` for unparsable URLs, non-http schemes,
    /// or URLs without a host.
    pub fn parse(target_url: &str) -> crate::config::Result<Self> {
        let url = Url::parse(target_url)
            .map_err(|e| ProxyError::Upstream(format!("invalid target '{target_url}': {e}")))?;
        let tls = match url.scheme() {
            "http" => false,
            "https" => true,
            other => {
                return Err(ProxyError::Upstream(format!(
                    "unsupported scheme '{other}' in target '{target_url}'"
                )));
            }
        };
        let host = url
            .host_str()
            .ok_or_else(|| ProxyError::Upstream(format!("target '{target_url}' has no host")))?
            .to_string();
        let default_port = if tls { 443 } else { 80 };
        let port = url.port().unwrap_or(default_port);
        let host_header = if port == default_port {
            host.clone()
        } else {
            format!("{host}:{port}")
        };

        Ok(Self {
            addr: format!("{host}:{port}"),
            tls,
            sni: host,
            host_header,
        })
    }
}

/// Extracts a query parameter, percent-decoded, with '+' as space.
fn query_param(query: &str, name: &str) -> Option<String> {
    for pair in query.split('&') {
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        if k == name {
            return Some(
                percent_decode_str(&v.replace('+', " "))
                    .decode_utf8_lossy()
                    .into_owned(),
            );
        }
    }
    None
}

/// Context for a single request. The session is snapshotted once, at the
/// start of header preparation.
#[derive(Default)]
pub struct RequestCtx {
    pub session: SessionSnapshot,
    pub inbound_host: Option<String>,
    pub is_error: bool,
}

/// Main proxy service implementing `ProxyHttp`.
pub struct MapGateProxy {
    config: Arc<Config>,
    rules: Arc<RuleSet>,
    registry: Arc<dyn LinkRegistry>,
    sso: Option<Arc<dyn SsoTokenProvider>>,
    upstream: UpstreamTarget,
}

impl std::fmt::Debug for MapGateProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapGateProxy")
            .field("config", &self.config)
            .field("rules", &self.rules)
            .field("upstream", &self.upstream)
            .finish_non_exhaustive()
    }
}

impl MapGateProxy {
    /// Creates a new `MapGateProxy` service.
    ///
    /// # Errors
    ///
    /// Returns `ProxyError::Config` when a BEARER rule is configured without
    /// an SSO token provider, and `ProxyError::Upstream` when the target URL
    /// cannot be used. Both are fatal before the proxy accepts traffic.
    pub fn new(
        config: Arc<Config>,
        rules: Arc<RuleSet>,
        registry: Arc<dyn LinkRegistry>,
        sso: Option<Arc<dyn SsoTokenProvider>>,
    ) -> crate::config::Result<Self> {
        if rules.any_bearer() && sso.is_none() {
            return Err(ProxyError::Config(
                "BEARER rule configured but no SSO token provider is available".to_string(),
            ));
        }
        let upstream = UpstreamTarget::parse(&config.target_url)?;

        Ok(Self {
            config,
            rules,
            registry,
            sso,
            upstream,
        })
    }

    async fn check_link_policy(&self, session: &mut Session, ctx: &RequestCtx) -> Result<bool> {
        let url_param = session
            .req_header()
            .uri
            .query()
            .and_then(|q| query_param(q, "url"));

        match authorize(&ctx.session, url_param.as_deref(), self.registry.as_ref()).await {
            Ok(Decision::Allow) => Ok(false),
            Ok(Decision::Deny(reason)) => {
                let requested = url_param.as_deref().unwrap_or("");
                warn!(
                    requested_url = %requested,
                    reason = ?reason,
                    action = "DENY",
                    "Link check denied request"
                );
                serve_error(session, 403, reason.message(requested)).await
            }
            Err(e @ ProxyError::InvalidUrl(_)) => {
                warn!(error = %e, action = "REJECT", "Unusable url parameter");
                serve_error(session, 400, e.to_string()).await
            }
            Err(e) => Err(pingora::Error::because(
                pingora::ErrorType::InternalError,
                "link authorization",
                e,
            )),
        }
    }
}

#[async_trait]
impl ProxyHttp for MapGateProxy {
    type CTX = RequestCtx;

    fn new_ctx(&self) -> Self::CTX {
        RequestCtx::default()
    }

    async fn request_filter(&self, session: &mut Session, ctx: &mut Self::CTX) -> Result<bool> {
        ctx.session =
            SessionSnapshot::from_request(session.req_header(), &self.config.auth_header);
        ctx.inbound_host = session
            .req_header()
            .headers
            .get("Host")
            .and_then(|v| v.to_str().ok())
            .map(std::string::ToString::to_string);

        match self.config.proxy_policy {
            ProxyPolicy::None => Ok(false),
            ProxyPolicy::LinkCheck => self.check_link_policy(session, ctx).await,
        }
    }

    async fn upstream_peer(
        &self,
        _session: &mut Session,
        _ctx: &mut Self::CTX,
    ) -> Result<Box<HttpPeer>> {
        let peer = Box::new(HttpPeer::new(
            self.upstream.addr.as_str(),
            self.upstream.tls,
            self.upstream.sni.clone(),
        ));
        Ok(peer)
    }

    async fn upstream_request_filter(
        &self,
        _session: &mut Session,
        upstream_request: &mut RequestHeader,
        ctx: &mut Self::CTX,
    ) -> Result<()> {
        strip_request_headers(upstream_request);
        upstream_request.insert_header("Host", self.upstream.host_header.as_str())?;

        if self.config.forward_host
            && let Some(host) = ctx.inbound_host.as_deref()
        {
            apply_forward_headers(upstream_request, host, &self.config)?;
        }

        let existing_auth = upstream_request
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .map(std::string::ToString::to_string);

        let request_uri = upstream_request.uri.to_string();
        let rule = self.rules.match_first(&request_uri);
        let injected = inject(
            rule,
            existing_auth.as_deref(),
            &ctx.session,
            self.sso.as_deref(),
        )
        .map_err(|e| {
            pingora::Error::because(
                pingora::ErrorType::InternalError,
                "credential injection",
                e,
            )
        })?;

        if let Some(value) = injected {
            debug!(uri = %request_uri, "Injecting service credentials");
            upstream_request.insert_header("Authorization", value.as_str())?;
        }

        Ok(())
    }

    async fn response_filter(
        &self,
        _session: &mut Session,
        upstream_response: &mut ResponseHeader,
        ctx: &mut Self::CTX,
    ) -> Result<()> {
        let status = upstream_response.status.as_u16();
        if status >= 500 || status == 403 {
            ctx.is_error = true;
        }

        strip_response_headers(upstream_response);

        Ok(())
    }

    async fn logging(
        &self,
        session: &mut Session,
        _e: Option<&pingora::Error>,
        ctx: &mut Self::CTX,
    ) {
        let status = session.response_written().map_or(0, |r| r.status.as_u16());
        let path = session.req_header().uri.path();
        debug!(status = status, http_path = %path, "Request completed");

        if ctx.is_error {
            warn!(status = status, http_path = %path, "Upstream error response");
        }
    }
}
