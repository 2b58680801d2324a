//! Middleware for observability.
//!
//! Request logging with latency tracking; auth lives in `crate::auth`.

pub mod logging;

pub use logging::request_logging;
