//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the lights service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LightsConfig {
    /// API listener settings.
    pub listener: ListenerConfig,

    /// Bearer token authentication.
    pub auth: AuthConfig,

    /// Device fan-out settings.
    pub fanout: FanOutConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,

    /// Where rejected and unmatched requests are sent.
    pub redirect: RedirectConfig,

    /// Simulated device registry contents.
    pub registry: RegistryConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host to bind (env: `HOSTNAME`).
    pub host: String,

    /// API port (env: `PORT`).
    pub port: u16,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Whole-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl ListenerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_body_bytes: 64 * 1024,
            request_timeout_secs: 30,
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Static bearer token (env: `BEARER_TOKEN`). Required.
    pub bearer_token: String,

    /// Header carrying the credential.
    pub header: String,

    /// Expected scheme in front of the token.
    pub scheme: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            bearer_token: String::new(),
            header: "authorization".to_string(),
            scheme: "Bearer".to_string(),
        }
    }
}

/// Fan-out configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FanOutConfig {
    /// Pause between successive device calls, in milliseconds. The device
    /// transport stalls on back-to-back commands; 0 disables the pause.
    pub device_delay_ms: u64,
}

impl FanOutConfig {
    pub fn device_delay(&self) -> Duration {
        Duration::from_millis(self.device_delay_ms)
    }
}

impl Default for FanOutConfig {
    fn default() -> Self {
        Self { device_delay_ms: 100 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Metrics port (env: `METRICS_PORT`), bound on the listener host.
    pub metrics_port: u16,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
            metrics_enabled: true,
            metrics_port: 9090,
        }
    }
}

/// Fallback redirect configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RedirectConfig {
    pub fallback_url: String,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            fallback_url: "https://xkcd.com/random/".to_string(),
        }
    }
}

/// Devices published by the simulated registry.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RegistryConfig {
    pub devices: Vec<String>,
}
