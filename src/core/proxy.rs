//! Proxy service implementation.
//!
//! Policy checks, header preparation, credential injection, and the
//! `ProxyHttp` hooks around Pingora's forwarding engine.

pub mod headers;
pub mod response;
pub mod service;

pub use service::{MapGateProxy, RequestCtx, UpstreamTarget};
