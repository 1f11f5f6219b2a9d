//! In-process device registry.
//!
//! Stands in for the real transport when no hardware is attached, and lets
//! tests inject per-device failures and count how often each device was
//! driven.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use async_trait::async_trait;

use super::{Device, DeviceError, DeviceRegistry, DeviceStatus, Rgb};

const DEFAULT_KELVIN: u16 = 4000;

#[derive(Debug, Clone)]
struct LightState {
    on: bool,
    brightness: u8,
    color: Rgb,
    kelvin: u16,
}

impl Default for LightState {
    fn default() -> Self {
        Self {
            on: false,
            brightness: 100,
            color: Rgb::new(255, 255, 255),
            kelvin: DEFAULT_KELVIN,
        }
    }
}

/// A light that keeps its state in memory.
#[derive(Debug)]
pub struct SimulatedDevice {
    id: String,
    state: Mutex<LightState>,
    failing: AtomicBool,
    status_failing: AtomicBool,
    calls: AtomicUsize,
}

impl SimulatedDevice {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: Mutex::new(LightState::default()),
            failing: AtomicBool::new(false),
            status_failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// Make every subsequent command fail with a transport error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make status reads fail while commands keep working.
    pub fn set_status_failing(&self, failing: bool) {
        self.status_failing.store(failing, Ordering::SeqCst);
    }

    /// Number of commands issued to this device (status reads excluded).
    pub fn command_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn is_on(&self) -> bool {
        self.lock().on
    }

    pub fn color(&self) -> Rgb {
        self.lock().color
    }

    pub fn brightness(&self) -> u8 {
        self.lock().brightness
    }

    pub fn color_temperature(&self) -> u16 {
        self.lock().kelvin
    }

    fn lock(&self) -> MutexGuard<'_, LightState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn apply(&self, update: impl FnOnce(&mut LightState)) -> Result<(), DeviceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(DeviceError::Transport(format!(
                "device {} is not responding",
                self.id
            )));
        }
        update(&mut self.lock());
        Ok(())
    }
}

#[async_trait]
impl Device for SimulatedDevice {
    fn id(&self) -> &str {
        &self.id
    }

    async fn turn_on(&self) -> Result<(), DeviceError> {
        self.apply(|s| s.on = true)
    }

    async fn turn_off(&self) -> Result<(), DeviceError> {
        self.apply(|s| s.on = false)
    }

    async fn set_color(&self, color: Rgb) -> Result<(), DeviceError> {
        self.apply(|s| s.color = color)
    }

    async fn set_brightness(&self, percent: u8) -> Result<(), DeviceError> {
        self.apply(|s| s.brightness = percent)
    }

    async fn set_color_temperature(&self, kelvin: u16) -> Result<(), DeviceError> {
        self.apply(|s| s.kelvin = kelvin)
    }

    async fn status(&self) -> Result<DeviceStatus, DeviceError> {
        if self.status_failing.load(Ordering::SeqCst) {
            return Err(DeviceError::Timeout);
        }
        let state = self.lock();
        Ok(DeviceStatus {
            device_id: self.id.clone(),
            on: state.on,
            brightness: state.brightness,
            color: state.color,
            colortemp: format!("{}K", state.kelvin),
        })
    }
}

/// Registry over a fixed list of simulated devices.
#[derive(Debug, Default)]
pub struct SimulatedRegistry {
    initialized: AtomicBool,
    devices: RwLock<Vec<Arc<SimulatedDevice>>>,
}

impl SimulatedRegistry {
    /// Create an uninitialized registry; call [`start`](Self::start) to
    /// publish its devices.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry that is already initialized with `ids`.
    pub fn with_devices<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let registry = Self::new();
        for id in ids {
            registry.add_device(SimulatedDevice::new(id));
        }
        registry.initialized.store(true, Ordering::SeqCst);
        registry
    }

    /// Register a device and return a handle to it.
    pub fn add_device(&self, device: SimulatedDevice) -> Arc<SimulatedDevice> {
        let device = Arc::new(device);
        self.devices
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(device.clone());
        device
    }

    /// Look up a device by id.
    pub fn device(&self, id: &str) -> Option<Arc<SimulatedDevice>> {
        self.devices
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .find(|d| d.id == id)
            .cloned()
    }

    /// Concrete handles to every device, in enumeration order.
    pub fn devices_snapshot(&self) -> Vec<Arc<SimulatedDevice>> {
        self.devices
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Mark discovery complete.
    pub async fn start(&self) {
        let count = self
            .devices
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len();
        self.initialized.store(true, Ordering::SeqCst);
        tracing::info!(devices = count, "Simulated device registry started");
    }
}

impl DeviceRegistry for SimulatedRegistry {
    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    fn devices(&self) -> Vec<Arc<dyn Device>> {
        self.devices
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .map(|d| d.clone() as Arc<dyn Device>)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_registry_starts_uninitialized() {
        let registry = SimulatedRegistry::new();
        registry.add_device(SimulatedDevice::new("a"));
        assert!(!registry.is_initialized());

        registry.start().await;
        assert!(registry.is_initialized());
        assert_eq!(registry.devices().len(), 1);
    }

    #[tokio::test]
    async fn test_device_state_and_failure_injection() {
        let registry = SimulatedRegistry::with_devices(["a", "b"]);
        let a = registry.device("a").unwrap();

        a.turn_on().await.unwrap();
        a.set_color(Rgb::new(1, 2, 3)).await.unwrap();
        assert!(a.is_on());
        assert_eq!(a.color(), Rgb::new(1, 2, 3));

        a.set_failing(true);
        assert!(a.set_brightness(10).await.is_err());
        assert_eq!(a.brightness(), 100);
        assert_eq!(a.command_count(), 3);

        let status = a.status().await.unwrap();
        assert_eq!(status.device_id, "a");
        assert_eq!(status.colortemp, "4000K");
    }

    #[test]
    fn test_enumeration_order_is_insertion_order() {
        let registry = SimulatedRegistry::with_devices(["x", "y", "z"]);
        let ids: Vec<_> = registry.devices().iter().map(|d| d.id().to_string()).collect();
        assert_eq!(ids, vec!["x", "y", "z"]);
    }
}
