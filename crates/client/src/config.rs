//! Client connection configuration
//!
//! Values come from `TABULA_*` environment variables, falling back to
//! [`ClientDefaults`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default configuration values
pub struct ClientDefaults;

impl ClientDefaults {
    pub const BASE_URL: &'static str = "http://localhost:8000/api";
    pub const TIMEOUT_SECS: u64 = 30;
    pub const MAX_RETRIES: u32 = 2;
    pub const RETRY_DELAY_MS: u64 = 200;
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for field '{field}': '{value}'. Expected: {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },

    #[error("Configuration validation failed: {message}")]
    ValidationFailed { message: String },
}

impl ConfigError {
    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }
}

/// Where a configuration value came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    EnvVar(String),
    Default(String),
}

/// Remote query service connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    /// Service root; resource paths are appended to it
    pub base_url: String,
    /// Sent as a bearer token when present
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Extra attempts after the first. Reads, updates and deletes retry on
    /// connect errors, timeouts and 5xx; creates only on connect errors
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    /// Extra headers added to every request
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: ClientDefaults::BASE_URL.to_string(),
            api_key: None,
            timeout_secs: ClientDefaults::TIMEOUT_SECS,
            max_retries: ClientDefaults::MAX_RETRIES,
            retry_delay_ms: ClientDefaults::RETRY_DELAY_MS,
            headers: HashMap::new(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Load from `TABULA_*` environment variables and validate
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = get_env_or_default("TABULA_BASE_URL", ClientDefaults::BASE_URL);
        let api_key = env::var("TABULA_API_KEY").ok().filter(|key| !key.is_empty());
        let timeout_secs = parse_env(
            "TABULA_TIMEOUT_SECS",
            "timeout_secs",
            ClientDefaults::TIMEOUT_SECS,
            "valid number of seconds",
        )?;
        let max_retries = parse_env(
            "TABULA_MAX_RETRIES",
            "max_retries",
            ClientDefaults::MAX_RETRIES,
            "non-negative retry count",
        )?;
        let retry_delay_ms = parse_env(
            "TABULA_RETRY_DELAY_MS",
            "retry_delay_ms",
            ClientDefaults::RETRY_DELAY_MS,
            "valid number of milliseconds",
        )?;

        let config = Self {
            base_url,
            api_key,
            timeout_secs,
            max_retries,
            retry_delay_ms,
            headers: HashMap::new(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::validation_failed("Base URL must not be empty"));
        }

        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "base_url".to_string(),
                value: self.base_url.clone(),
                expected: "an http:// or https:// URL".to_string(),
            });
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::validation_failed("Timeout must be greater than 0"));
        }

        Ok(())
    }

    pub fn config_sources(&self) -> HashMap<String, ConfigSource> {
        let mut sources = HashMap::new();
        for (field, var, default) in [
            ("base_url", "TABULA_BASE_URL", ClientDefaults::BASE_URL.to_string()),
            ("api_key", "TABULA_API_KEY", String::new()),
            ("timeout_secs", "TABULA_TIMEOUT_SECS", ClientDefaults::TIMEOUT_SECS.to_string()),
            ("max_retries", "TABULA_MAX_RETRIES", ClientDefaults::MAX_RETRIES.to_string()),
            ("retry_delay_ms", "TABULA_RETRY_DELAY_MS", ClientDefaults::RETRY_DELAY_MS.to_string()),
        ] {
            let source = if env::var(var).is_ok() {
                ConfigSource::EnvVar(var.to_string())
            } else {
                ConfigSource::Default(default)
            };
            sources.insert(field.to_string(), source);
        }
        sources
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: std::str::FromStr>(key: &str, field: &str, default: T, expected: &str) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
            field: field.to_string(),
            value: raw,
            expected: expected.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 5] = [
        "TABULA_BASE_URL",
        "TABULA_API_KEY",
        "TABULA_TIMEOUT_SECS",
        "TABULA_MAX_RETRIES",
        "TABULA_RETRY_DELAY_MS",
    ];

    fn clean_test_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clean_test_env();
        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(
            config.config_sources().get("timeout_secs"),
            Some(&ConfigSource::Default("30".to_string()))
        );
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clean_test_env();
        env::set_var("TABULA_BASE_URL", "https://query.example.com/v1");
        env::set_var("TABULA_API_KEY", "secret");
        env::set_var("TABULA_TIMEOUT_SECS", "5");
        env::set_var("TABULA_MAX_RETRIES", "0");
        env::set_var("TABULA_RETRY_DELAY_MS", "50");

        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.base_url, "https://query.example.com/v1");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.retry_delay(), Duration::from_millis(50));
        assert_eq!(
            config.config_sources().get("base_url"),
            Some(&ConfigSource::EnvVar("TABULA_BASE_URL".to_string()))
        );

        clean_test_env();
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_number() {
        clean_test_env();
        env::set_var("TABULA_TIMEOUT_SECS", "soon");

        let err = ClientConfig::from_env().unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                field: "timeout_secs".to_string(),
                value: "soon".to_string(),
                expected: "valid number of seconds".to_string(),
            }
        );

        clean_test_env();
    }

    #[test]
    fn test_validate() {
        assert!(ClientConfig::new("https://example.com").validate().is_ok());
        assert!(matches!(
            ClientConfig::new("").validate(),
            Err(ConfigError::ValidationFailed { .. })
        ));
        assert!(matches!(
            ClientConfig::new("ftp://example.com").validate(),
            Err(ConfigError::InvalidValue { .. })
        ));

        let mut config = ClientConfig::default();
        config.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let config = ClientConfig::new("https://example.com")
            .with_api_key("k")
            .with_header("X-Tenant", "acme");
        let text = serde_json::to_string(&config).unwrap();
        assert_eq!(serde_json::from_str::<ClientConfig>(&text).unwrap(), config);
    }
}
