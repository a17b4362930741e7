//! Tuning for the middleware layers applied in [`super::router`].
//!
//! The router stacks request tracing, a per-request timeout and response
//! compression over every route.

use std::time::Duration;

/// Per-request timeout applied to all routes.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
