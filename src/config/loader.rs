//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::LightsConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {name}: {value}")]
    Env { name: &'static str, value: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Source of environment values, so tests need not touch the process env.
pub trait EnvSource {
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads the real process environment.
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.is_empty())
    }
}

/// Load `.env` (outside production), the optional TOML file, apply
/// environment overrides, and validate.
pub fn load_config(path: Option<&Path>) -> Result<LightsConfig, ConfigError> {
    if std::env::var("APP_ENV").map(|v| v != "production").unwrap_or(true) {
        // A missing .env file is fine.
        let _ = dotenv::dotenv();
    }

    let mut config = match path {
        Some(path) => parse_file(path)?,
        None => LightsConfig::default(),
    };
    apply_env(&mut config, &ProcessEnv)?;

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Parse a TOML file without validating it.
pub fn parse_file(path: &Path) -> Result<LightsConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Overlay `HOSTNAME`, `PORT`, `METRICS_PORT` and `BEARER_TOKEN`.
pub fn apply_env(config: &mut LightsConfig, env: &impl EnvSource) -> Result<(), ConfigError> {
    if let Some(host) = env.var("HOSTNAME") {
        config.listener.host = host;
    }
    if let Some(port) = env.var("PORT") {
        config.listener.port = parse_port("PORT", port)?;
    }
    if let Some(port) = env.var("METRICS_PORT") {
        config.observability.metrics_port = parse_port("METRICS_PORT", port)?;
    }
    if let Some(token) = env.var("BEARER_TOKEN") {
        config.auth.bearer_token = token;
    }
    Ok(())
}

fn parse_port(name: &'static str, value: String) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { name, value })
}
