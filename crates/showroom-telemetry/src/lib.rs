//! Tracing setup shared by Showroom binaries.

use std::fmt::{Display, Formatter};
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use typed_builder::TypedBuilder;

pub const DEFAULT_DIRECTIVE: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable, one event per line.
    #[default]
    Pretty,
    /// Newline delimited JSON.
    Json,
}

impl Display for LogFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log filter: {0}")]
    Filter(String),
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(String),
}

#[derive(Debug, Clone, TypedBuilder)]
pub struct TelemetryConfig {
    #[builder(default)]
    format: LogFormat,
    /// Used when `RUST_LOG` is unset.
    #[builder(default = DEFAULT_DIRECTIVE.to_string(), setter(into))]
    default_directive: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl TelemetryConfig {
    pub fn format(&self) -> LogFormat {
        self.format
    }

    /// Builds the filter from `RUST_LOG`, falling back to the default directive.
    pub fn env_filter(&self) -> Result<EnvFilter, TelemetryError> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.default_directive)
                .map_err(|e| TelemetryError::Filter(e.to_string())),
        }
    }
}

/// Installs the global tracing subscriber.
///
/// `log` records are bridged into tracing as well. Fails if a global
/// subscriber is already set.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = config.env_filter()?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match config.format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| TelemetryError::Subscriber(e.to_string()))?;

    tracing::debug!(format = %config.format, "tracing initialised");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = TelemetryConfig::default();
        assert_eq!(config.format(), LogFormat::Pretty);
        assert_eq!(config.default_directive, "info");
    }

    #[test]
    fn rejects_malformed_directive() {
        let config = TelemetryConfig::builder()
            .default_directive("showroom=verbose")
            .build();
        if std::env::var_os("RUST_LOG").is_none() {
            assert!(matches!(config.env_filter(), Err(TelemetryError::Filter(_))));
        }
    }

    #[test]
    fn second_init_fails() {
        let config = TelemetryConfig::builder().format(LogFormat::Json).build();
        init(&config).unwrap();
        assert!(matches!(init(&config), Err(TelemetryError::Subscriber(_))));
    }
}
