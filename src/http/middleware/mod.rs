//! Per-route middleware.
//!
//! Applied inside the correlation layer, in this order:
//! ```text
//! auth.rs (protected routes only) → metrics.rs → handler
//! ```

pub mod auth;
pub mod metrics;

pub use auth::{auth_middleware, AuthFailure, AuthGate};
pub use metrics::{metrics_middleware, InFlightGuard, InFlightTracker};
