//! Device registry boundary.
//!
//! # Data Flow
//! ```text
//! Device transport / discovery (external)
//!     → DeviceRegistry (enumerates reachable devices)
//!     → Device (one primitive command per call)
//!     → lights::executor (fan-out across the device set)
//!     → health (registry reachability check)
//! ```
//!
//! # Design Decisions
//! - The registry is the only resource shared across requests
//! - Implementations must tolerate concurrent single-device calls
//! - Each call completes in bounded time; the transport owns timeouts

pub mod simulated;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

pub use simulated::{SimulatedDevice, SimulatedRegistry};

/// Error returned by a single device call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("device did not respond in time")]
    Timeout,

    #[error("operation not supported by device")]
    Unsupported,
}

/// RGB colour as sent to a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.r, self.g, self.b)
    }
}

/// Snapshot of a device's state, as reported by the device itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceStatus {
    #[serde(rename = "deviceID")]
    pub device_id: String,
    #[serde(rename = "onOff")]
    pub on: bool,
    pub brightness: u8,
    pub color: Rgb,
    /// Colour temperature rendered as `"<kelvin>K"`.
    pub colortemp: String,
}

/// A single remotely controllable light.
#[async_trait]
pub trait Device: Send + Sync {
    /// Stable device identifier.
    fn id(&self) -> &str;

    async fn turn_on(&self) -> Result<(), DeviceError>;

    async fn turn_off(&self) -> Result<(), DeviceError>;

    async fn set_color(&self, color: Rgb) -> Result<(), DeviceError>;

    async fn set_brightness(&self, percent: u8) -> Result<(), DeviceError>;

    async fn set_color_temperature(&self, kelvin: u16) -> Result<(), DeviceError>;

    /// Ask the device for its current state.
    async fn status(&self) -> Result<DeviceStatus, DeviceError>;
}

/// Enumerates the devices that are currently reachable.
pub trait DeviceRegistry: Send + Sync {
    /// Whether discovery has completed at least once.
    fn is_initialized(&self) -> bool;

    /// Current device set, in a stable enumeration order.
    fn devices(&self) -> Vec<Arc<dyn Device>>;
}
