//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function: &LightsConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use url::Url;

use crate::config::schema::LightsConfig;

const MAX_DEVICE_DELAY_MS: u64 = 10_000;

/// One semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &LightsConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.auth.bearer_token.trim().is_empty() {
        errors.push(ValidationError::new(
            "auth.bearer_token",
            "BEARER_TOKEN is required. Set it in the environment or .env file",
        ));
    }
    if config.auth.scheme.trim().is_empty() {
        errors.push(ValidationError::new("auth.scheme", "must not be empty"));
    }

    if config.observability.metrics_enabled && config.listener.port == config.observability.metrics_port {
        errors.push(ValidationError::new(
            "observability.metrics_port",
            format!("must differ from listener port {}", config.listener.port),
        ));
    }

    match Url::parse(&config.redirect.fallback_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            "redirect.fallback_url",
            format!("unsupported scheme {}", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("redirect.fallback_url", e.to_string())),
    }

    if config.fanout.device_delay_ms > MAX_DEVICE_DELAY_MS {
        errors.push(ValidationError::new(
            "fanout.device_delay_ms",
            format!("must be at most {MAX_DEVICE_DELAY_MS}"),
        ));
    }

    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::new("listener.request_timeout_secs", "must be > 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> LightsConfig {
        let mut config = LightsConfig::default();
        config.auth.bearer_token = "token".to_string();
        config
    }

    #[test]
    fn test_defaults_with_token_are_valid() {
        assert_eq!(validate_config(&valid()), Ok(()));
    }

    #[test]
    fn test_missing_token_is_rejected() {
        let errors = validate_config(&LightsConfig::default()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "auth.bearer_token");
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = LightsConfig::default();
        config.observability.metrics_port = config.listener.port;
        config.redirect.fallback_url = "ftp://example.com".to_string();
        config.fanout.device_delay_ms = 60_000;

        let fields: Vec<_> = validate_config(&config)
            .unwrap_err()
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(
            fields,
            vec![
                "auth.bearer_token",
                "observability.metrics_port",
                "redirect.fallback_url",
                "fanout.device_delay_ms",
            ]
        );
    }
}
