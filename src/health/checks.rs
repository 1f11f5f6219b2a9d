//! Subsystem health checks.

use std::sync::Arc;

use serde::Serialize;

use crate::registry::DeviceRegistry;

/// Ordered so that `max` picks the worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Ok,
    Warn,
    Error,
}

/// Result of evaluating one subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    #[serde(skip)]
    pub name: String,
    #[serde(rename = "status")]
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl HealthCheck {
    pub fn new(name: impl Into<String>, severity: Severity, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            severity,
            detail: Some(detail.into()),
        }
    }
}

/// Something the aggregator can ask for a [`HealthCheck`].
pub trait SubsystemCheck: Send + Sync {
    fn name(&self) -> &str;

    fn evaluate(&self) -> HealthCheck;
}

/// Device registry reachability.
///
/// Uninitialized is an error. Zero devices is still healthy; the registry
/// works, there is just nothing plugged in.
pub struct RegistryCheck {
    registry: Arc<dyn DeviceRegistry>,
}

impl RegistryCheck {
    pub const NAME: &'static str = "registry";

    pub fn new(registry: Arc<dyn DeviceRegistry>) -> Self {
        Self { registry }
    }
}

impl SubsystemCheck for RegistryCheck {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn evaluate(&self) -> HealthCheck {
        if !self.registry.is_initialized() {
            return HealthCheck::new(Self::NAME, Severity::Error, "Registry not initialized");
        }
        match self.registry.devices().len() {
            0 => HealthCheck::new(
                Self::NAME,
                Severity::Ok,
                "Registry initialized, no devices currently connected",
            ),
            n => HealthCheck::new(Self::NAME, Severity::Ok, format!("{n} devices connected")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SimulatedRegistry;

    #[test]
    fn test_severity_order() {
        assert!(Severity::Error > Severity::Warn);
        assert!(Severity::Warn > Severity::Ok);
    }

    #[test]
    fn test_registry_check() {
        let check = RegistryCheck::new(Arc::new(SimulatedRegistry::new()));
        assert_eq!(check.evaluate().severity, Severity::Error);

        let check = RegistryCheck::new(Arc::new(SimulatedRegistry::with_devices(Vec::<String>::new())));
        let result = check.evaluate();
        assert_eq!(result.severity, Severity::Ok);
        assert!(result.detail.unwrap().contains("no devices"));

        let check = RegistryCheck::new(Arc::new(SimulatedRegistry::with_devices(["a", "b"])));
        let result = check.evaluate();
        assert_eq!(result.severity, Severity::Ok);
        assert_eq!(result.detail.as_deref(), Some("2 devices connected"));
    }
}
