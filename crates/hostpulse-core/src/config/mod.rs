//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! optional TOML files plus `HOSTPULSE__*` environment variables. Each
//! sub-module represents a logical configuration section, and every field
//! has a default so an empty configuration is valid.

pub mod app;
pub mod collection;
pub mod logging;
pub mod stream;

use serde::{Deserialize, Serialize};

pub use self::app::ServerConfig;
pub use self::collection::{CollectionConfig, GpuBackend, MIN_INTERVAL_MS};
pub use self::logging::LoggingConfig;
pub use self::stream::{StreamConfig, WindowConfig};

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP/WebSocket server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Collection engine settings.
    #[serde(default)]
    pub collection: CollectionConfig,
    /// Per-client delivery settings.
    #[serde(default)]
    pub stream: StreamConfig,
    /// Rolling window settings for viewers.
    #[serde(default)]
    pub window: WindowConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files and the environment.
    ///
    /// Merges `config/default.toml`, an environment-specific overlay
    /// `config/{env}.toml`, and environment variables prefixed with
    /// `HOSTPULSE` (e.g. `HOSTPULSE__COLLECTION__INTERVAL_MS=500`).
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("HOSTPULSE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        tracing::debug!(env, interval_ms = config.collection.interval_ms, "Configuration loaded");
        Ok(config)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.collection.interval_ms < collection::MIN_INTERVAL_MS {
            return Err(AppError::validation(format!(
                "collection.interval_ms must be at least {} (got {})",
                collection::MIN_INTERVAL_MS,
                self.collection.interval_ms
            )));
        }
        if self.collection.source_buffer_capacity == 0 {
            return Err(AppError::validation(
                "collection.source_buffer_capacity must be at least 1",
            ));
        }
        if self.collection.collector_timeout_ms == 0 {
            return Err(AppError::validation(
                "collection.collector_timeout_ms must be at least 1",
            ));
        }
        if self.stream.sink_buffer_capacity == 0 {
            return Err(AppError::validation(
                "stream.sink_buffer_capacity must be at least 1",
            ));
        }
        if self.window.capacity == 0 {
            return Err(AppError::validation("window.capacity must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::collection::GpuBackend;
    use crate::error::ErrorKind;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 5062);
        assert_eq!(config.collection.interval_ms, 1000);
        assert_eq!(config.collection.source_buffer_capacity, 2);
        assert_eq!(config.stream.sink_buffer_capacity, 2);
        assert_eq!(config.collection.gpu, GpuBackend::None);
    }

    #[test]
    fn test_empty_source_deserializes_to_defaults() {
        let config: AppConfig = config::Config::builder()
            .build()
            .and_then(|c| c.try_deserialize())
            .expect("empty config");
        assert_eq!(config.window.capacity, 60);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_toml_overrides() {
        let raw = r#"
            [collection]
            interval_ms = 250
            gpu = "NVIDIA"
            docker = true

            [stream]
            sink_buffer_capacity = 4
        "#;
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .and_then(|c| c.try_deserialize())
            .expect("toml config");
        assert_eq!(config.collection.interval_ms, 250);
        assert_eq!(config.collection.gpu, GpuBackend::Nvidia);
        assert!(config.collection.docker);
        assert_eq!(config.stream.sink_buffer_capacity, 4);
    }

    #[test]
    fn test_validate_rejects_tiny_interval() {
        let mut config = AppConfig::default();
        config.collection.interval_ms = 1;
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_validate_rejects_zero_capacities() {
        let mut config = AppConfig::default();
        config.stream.sink_buffer_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.window.capacity = 0;
        assert!(config.validate().is_err());
    }
}
