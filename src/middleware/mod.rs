//! Middleware for observability.
//!
//! Request logging with latency tracking for both services.

pub mod logging;

pub use logging::request_logging;
