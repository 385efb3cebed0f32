use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Prefix shared by every environment variable the service reads
pub const ENV_PREFIX: &str = "SHOECART";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading error: {message}")]
    LoadError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub storage: StorageConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_base_url")]
    pub catalog_base_url: String,
    #[serde(default = "default_catalog_timeout")]
    pub catalog_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    #[serde(default)]
    pub reset_on_corrupt: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_service_version")]
    pub service_version: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub enable_json_logging: bool,
}

impl Config {
    pub fn from_environment() -> Result<Self, ConfigError> {
        Self::from_source(environment())
    }

    /// Load every section from the given environment source
    pub fn from_source(source: config::Environment) -> Result<Self, ConfigError> {
        let config = Config {
            catalog: load_section(source.clone(), "catalog")?,
            storage: load_section(source.clone(), "storage")?,
            observability: load_section(source, "observability")?,
        };

        config.validate()?;

        debug!("Configuration: {:?}", config);
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.catalog.validate()?;
        self.storage.validate()?;
        info!("Configuration validation completed");
        Ok(())
    }
}

impl CatalogConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog_timeout_seconds)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.catalog_base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::ValidationError {
                message: "Catalog base URL cannot be empty".to_string(),
            });
        }

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::ValidationError {
                message: format!("Catalog base URL must use http or https: {}", base_url),
            });
        }

        if self.catalog_timeout_seconds == 0 {
            return Err(ConfigError::ValidationError {
                message: "Catalog timeout cannot be 0".to_string(),
            });
        }

        Ok(())
    }
}

impl StorageConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "Storage key cannot be empty".to_string(),
            });
        }

        if self.storage_path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "Storage path cannot be empty".to_string(),
            });
        }

        Ok(())
    }
}

/// Environment source with the service prefix
pub fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX).try_parsing(true)
}

fn load_section<T: DeserializeOwned>(
    source: config::Environment,
    section: &str,
) -> Result<T, ConfigError> {
    let settings = config::Config::builder()
        .add_source(source)
        .build()
        .map_err(|e| ConfigError::LoadError {
            message: format!("Failed to load {} config: {}", section, e),
        })?;

    settings
        .try_deserialize()
        .map_err(|e| ConfigError::LoadError {
            message: format!("Failed to deserialize {} config: {}", section, e),
        })
}

// Default value functions
pub(crate) fn default_catalog_base_url() -> String {
    "http://localhost:3333".to_string()
}

pub(crate) fn default_catalog_timeout() -> u64 {
    30
}

pub(crate) fn default_storage_path() -> PathBuf {
    PathBuf::from("./.shoecart/local-storage.json")
}

pub(crate) fn default_storage_key() -> String {
    "@RocketShoes:cart".to_string()
}

pub(crate) fn default_service_name() -> String {
    "shoecart-rs".to_string()
}

pub(crate) fn default_service_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

pub(crate) fn default_log_level() -> String {
    "info".to_string()
}
