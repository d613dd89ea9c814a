//! Cross-cutting HTTP middleware.
//!
//! Auth and role gating live in `crate::auth::middleware`; this module holds
//! the request logging applied to every route.

pub mod logging;

pub use logging::request_logging;
