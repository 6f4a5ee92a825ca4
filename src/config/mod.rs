//! Application configuration.
//!
//! Aggregates server, storage and scheduler settings into a single Config
//! struct that can be loaded from YAML files or environment variables.

mod server;
mod storage;

pub use server::{ConfigError, SchedulerConfig, ServerConfig};
pub use storage::{PostgresConfig, SqliteConfig, StorageConfig, StorageType};

use serde::Deserialize;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "ROI_ENGINE_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "ROI_ENGINE";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "ROI_ENGINE_LOG";

const SECONDS_PER_DAY: u32 = 86_400;

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Built-in scheduler configuration.
    pub scheduler: SchedulerConfig,
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `config.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would only fail later at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "storage.max_connections must be at least 1".to_string(),
            ));
        }
        if self.scheduler.offset_secs >= SECONDS_PER_DAY {
            return Err(ConfigError::Invalid(format!(
                "scheduler.offset_secs must be below {}",
                SECONDS_PER_DAY
            )));
        }
        Ok(())
    }

    /// Create config for testing: in-memory storage, scheduler off.
    pub fn for_test() -> Self {
        Self {
            storage: StorageConfig {
                storage_type: StorageType::Memory,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}
