//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, request_id on every line)
//!     → metrics.rs (MetricsSink: counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (JSON or pretty)
//!     → Prometheus scrape on the metrics port
//! ```
//!
//! # Design Decisions
//! - Request ID flows through all subsystems as a typed value
//! - The metrics sink is injected, never reached through a global
//! - Metric updates are cheap (atomic operations)

pub mod logging;
pub mod metrics;

pub use metrics::{MetricsSink, PrometheusSink, RecordingSink};
