//! Request-scoped middleware types.

pub mod session;

pub use session::SessionSnapshot;
