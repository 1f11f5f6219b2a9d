//! Command fan-out across the device set.
//!
//! # Responsibilities
//! - Apply one [`Command`] to every device, in enumeration order
//! - Record one [`DeviceCommandOutcome`] per device
//! - Space successive device calls by a configurable delay
//!
//! # Design Decisions
//! - Continue on error: every device is attempted exactly once
//! - Device calls are strictly sequential, never concurrent
//! - Errors never escape: the result is always a complete aggregate
//! - Zero devices is a trivial success

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::http::request::RequestContext;
use crate::lights::command::Command;
use crate::observability::MetricsSink;
use crate::registry::{Device, DeviceError, DeviceRegistry};

/// What happened to one device during one fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceCommandOutcome {
    pub device_id: String,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Combined result of one fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateCommandResult {
    pub operation: &'static str,
    pub outcomes: Vec<DeviceCommandOutcome>,
    pub overall_succeeded: bool,
}

impl AggregateCommandResult {
    fn new(operation: &'static str, outcomes: Vec<DeviceCommandOutcome>) -> Self {
        let overall_succeeded = outcomes.iter().all(|o| o.succeeded);
        Self {
            operation,
            outcomes,
            overall_succeeded,
        }
    }

    pub fn failed_devices(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|o| !o.succeeded)
            .map(|o| o.device_id.as_str())
    }
}

/// Applies commands to every device known to the registry.
pub struct FanOutExecutor {
    registry: Arc<dyn DeviceRegistry>,
    metrics: Arc<dyn MetricsSink>,
    device_delay: Duration,
}

impl FanOutExecutor {
    pub fn new(
        registry: Arc<dyn DeviceRegistry>,
        metrics: Arc<dyn MetricsSink>,
        device_delay: Duration,
    ) -> Self {
        Self {
            registry,
            metrics,
            device_delay,
        }
    }

    pub fn device_delay(&self) -> Duration {
        self.device_delay
    }

    /// Apply `command` to the current device set.
    pub async fn execute(&self, ctx: &RequestContext, command: &Command) -> AggregateCommandResult {
        let operation = command.operation();
        let devices = self.registry.devices();

        tracing::info!(
            request_id = %ctx.request_id(),
            operation,
            command = %command,
            devices = devices.len(),
            "Executing light operation"
        );

        let mut outcomes = Vec::with_capacity(devices.len());
        for (i, device) in devices.iter().enumerate() {
            if i > 0 && !self.device_delay.is_zero() {
                tokio::time::sleep(self.device_delay).await;
            }

            let outcome = match dispatch(device.as_ref(), command).await {
                Ok(()) => DeviceCommandOutcome {
                    device_id: device.id().to_string(),
                    succeeded: true,
                    error: None,
                },
                Err(e) => {
                    tracing::error!(
                        request_id = %ctx.request_id(),
                        device = device.id(),
                        operation,
                        error = %e,
                        "Device command failed"
                    );
                    DeviceCommandOutcome {
                        device_id: device.id().to_string(),
                        succeeded: false,
                        error: Some(e.to_string()),
                    }
                }
            };
            outcomes.push(outcome);
        }

        let result = AggregateCommandResult::new(operation, outcomes);
        self.metrics.observe_operation(operation, result.overall_succeeded);
        result
    }
}

async fn dispatch(device: &dyn Device, command: &Command) -> Result<(), DeviceError> {
    match *command {
        Command::Power(true) => device.turn_on().await,
        Command::Power(false) => device.turn_off().await,
        Command::Color { rgb, .. } => device.set_color(rgb).await,
        Command::Brightness(percent) => device.set_brightness(percent).await,
        Command::ColorTemperature(kelvin) => device.set_color_temperature(kelvin).await,
    }
}
