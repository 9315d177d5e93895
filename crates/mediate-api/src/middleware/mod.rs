//! # Middleware
//!
//! - [`metrics`]: in-process request and error counters.

pub mod metrics;
