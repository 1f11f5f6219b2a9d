//! Health reporting subsystem.
//!
//! # Data Flow
//! ```text
//! GET /health | /ready | /live
//!     → aggregator.rs (evaluate every registered check, fresh each call)
//!     → checks.rs (per-subsystem severity + detail)
//!     → severity precedence: error > warn > ok
//!     → handlers.rs (ok/warn → 200, error → 503)
//! ```
//!
//! # Design Decisions
//! - Overall severity is derived, never stored
//! - No caching: every call re-evaluates
//! - Uptime is measured from a start instant captured once at process init

pub mod aggregator;
pub mod checks;
pub mod handlers;

pub use aggregator::{HealthAggregator, HealthReport, ProcessStart};
pub use checks::{HealthCheck, RegistryCheck, Severity, SubsystemCheck};
