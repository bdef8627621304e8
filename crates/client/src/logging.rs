//! Structured logging setup for applications embedding the client

use std::io;
use tracing_subscriber::{fmt::Layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "warn")
    pub level: String,
    /// JSON structured output instead of plain text
    pub json_format: bool,
    /// Directive string such as "tabula_query=debug,reqwest=warn"
    pub env_filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            env_filter: None,
        }
    }
}

impl LoggingConfig {
    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            json_format: true,
            env_filter: Some("tabula_query=info,tabula_client=info,reqwest=warn".to_string()),
        }
    }

    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            json_format: false,
            env_filter: Some("tabula_query=debug,tabula_client=debug".to_string()),
        }
    }

    pub fn with_env_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Directives used when `RUST_LOG` is unset
    pub fn directives(&self) -> &str {
        self.env_filter.as_deref().unwrap_or(&self.level)
    }
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// configured directives. Fails if a subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(config.directives()))?;

    if config.json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stdout).json())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stdout))
            .try_init()?;
    }

    tracing::info!(
        target: "tabula::logging",
        "Logging initialized (level: {}, format: {})",
        config.level,
        if config.json_format { "JSON" } else { "text" }
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directives_fall_back_to_level() {
        assert_eq!(LoggingConfig::default().directives(), "info");
        assert_eq!(
            LoggingConfig::default().with_env_filter("tabula_query=trace").directives(),
            "tabula_query=trace"
        );
    }

    #[test]
    fn test_presets() {
        assert!(LoggingConfig::production().json_format);
        assert_eq!(LoggingConfig::development().level, "debug");
    }

    #[test]
    fn test_second_init_is_an_error() {
        let config = LoggingConfig::default().with_env_filter("error");
        let _ = init_logging(&config);
        assert!(init_logging(&config).is_err());
    }
}
