//! Core system components.
//!
//! Contains the main proxy logic and request-scoped middleware.

pub mod middleware;
pub mod proxy;
