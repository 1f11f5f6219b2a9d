//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! .env (outside production) → process environment
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, then environment overrides)
//!     → validation.rs (semantic checks)
//!     → LightsConfig (validated, immutable)
//!     → shared by value with the subsystems that need it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AuthConfig, FanOutConfig, LightsConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    RedirectConfig, RegistryConfig,
};
