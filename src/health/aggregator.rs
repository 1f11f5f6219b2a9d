//! Combines subsystem checks into one report.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use super::checks::{HealthCheck, Severity, SubsystemCheck};

/// Instant the process started, captured once.
#[derive(Debug, Clone, Copy)]
pub struct ProcessStart(Instant);

impl ProcessStart {
    pub fn now() -> Self {
        Self(Instant::now())
    }

    pub fn uptime(&self) -> Duration {
        self.0.elapsed()
    }
}

/// Aggregate health, built fresh for each call.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    #[serde(rename = "status")]
    pub overall: Severity,
    pub timestamp: DateTime<Utc>,
    #[serde(serialize_with = "serialize_uptime")]
    pub uptime: Duration,
    pub checks: BTreeMap<String, HealthCheck>,
}

fn serialize_uptime<S: Serializer>(uptime: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_uptime(*uptime))
}

/// Render a duration as `1h2m3.456s`, dropping leading zero units.
pub fn format_uptime(uptime: Duration) -> String {
    let total_ms = uptime.as_millis();
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let seconds = (total_ms / 1_000) % 60;
    let millis = total_ms % 1_000;

    let mut out = String::new();
    if hours > 0 {
        let _ = write!(out, "{hours}h");
    }
    if hours > 0 || minutes > 0 {
        let _ = write!(out, "{minutes}m");
    }
    let _ = write!(out, "{seconds}.{millis:03}s");
    out
}

/// Overall severity by precedence: any error wins, then any warn, else ok.
pub fn overall_severity<'a>(checks: impl IntoIterator<Item = &'a HealthCheck>) -> Severity {
    checks
        .into_iter()
        .map(|c| c.severity)
        .max()
        .unwrap_or(Severity::Ok)
}

pub struct HealthAggregator {
    checks: Vec<Arc<dyn SubsystemCheck>>,
    started: ProcessStart,
}

impl HealthAggregator {
    pub fn new(started: ProcessStart) -> Self {
        Self {
            checks: Vec::new(),
            started,
        }
    }

    pub fn with_check(mut self, check: Arc<dyn SubsystemCheck>) -> Self {
        self.checks.push(check);
        self
    }

    pub fn report(&self) -> HealthReport {
        let checks: BTreeMap<String, HealthCheck> = self
            .checks
            .iter()
            .map(|c| (c.name().to_string(), c.evaluate()))
            .collect();

        HealthReport {
            overall: overall_severity(checks.values()),
            timestamp: Utc::now(),
            uptime: self.started.uptime(),
            checks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str, Severity);

    impl SubsystemCheck for Fixed {
        fn name(&self) -> &str {
            self.0
        }

        fn evaluate(&self) -> HealthCheck {
            HealthCheck::new(self.0, self.1, "fixed")
        }
    }

    fn aggregate(severities: &[Severity]) -> Severity {
        const NAMES: [&str; 4] = ["a", "b", "c", "d"];
        let agg = severities
            .iter()
            .zip(NAMES)
            .fold(HealthAggregator::new(ProcessStart::now()), |agg, (s, n)| {
                agg.with_check(Arc::new(Fixed(n, *s)))
            });
        agg.report().overall
    }

    #[test]
    fn test_precedence() {
        use Severity::*;
        assert_eq!(aggregate(&[]), Ok);
        assert_eq!(aggregate(&[Ok, Ok]), Ok);
        assert_eq!(aggregate(&[Ok, Warn]), Warn);
        assert_eq!(aggregate(&[Warn, Error, Ok]), Error);
        assert_eq!(aggregate(&[Error, Warn]), Error);
        assert_eq!(aggregate(&[Warn, Warn]), Warn);
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(Duration::from_millis(1_500)), "1.500s");
        assert_eq!(format_uptime(Duration::from_secs(61)), "1m1.000s");
        assert_eq!(format_uptime(Duration::from_secs(3_600 + 5)), "1h0m5.000s");
    }

    #[test]
    fn test_report_serialization() {
        let report = HealthAggregator::new(ProcessStart::now())
            .with_check(Arc::new(Fixed("registry", Severity::Warn)))
            .report();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "warn");
        assert_eq!(json["checks"]["registry"]["status"], "warn");
        assert_eq!(json["checks"]["registry"]["detail"], "fixed");
        assert!(json["uptime"].as_str().unwrap().ends_with('s'));
        assert!(json["timestamp"].is_string());
    }
}
