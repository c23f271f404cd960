//! Authorization and credential modules.
//!
//! Rule matching, credential injection, and link-registry checks.

pub mod credentials;
pub mod linkcheck;
pub mod rules;
