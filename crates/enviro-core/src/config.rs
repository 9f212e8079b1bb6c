//! Service configuration.
//!
//! Loaded from TOML. Every key is optional and falls back to its default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shortest aggregation interval that still gives every aggregate its own
/// minute-resolution file name.
pub const MIN_AGGREGATE_INTERVAL_SECS: u64 = 60;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub sampling: SamplingConfig,
    pub storage: StorageConfig,
    pub server: ServerConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SamplingConfig {
    /// Run the background sampler
    pub enabled: bool,
    /// A reading is taken every this many seconds
    pub sample_interval_secs: u64,
    /// Readings are averaged and saved on multiples of this many seconds
    pub aggregate_interval_secs: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sample_interval_secs: 10,
            aggregate_interval_secs: 60,
        }
    }
}

impl SamplingConfig {
    pub fn sample_interval(&self) -> Duration {
        Duration::from_secs(self.sample_interval_secs)
    }

    /// Number of readings in one aggregation window.
    pub fn target_size(&self) -> usize {
        (self.aggregate_interval_secs / self.sample_interval_secs.max(1)) as usize
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("enviro-data"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Serve the HTTP file browser
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from a TOML file. Missing keys take their defaults.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let sampling = &self.sampling;

        if sampling.sample_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "sampling.sample_interval_secs must be > 0".into(),
            ));
        }
        if sampling.aggregate_interval_secs < MIN_AGGREGATE_INTERVAL_SECS {
            return Err(ConfigError::Invalid(format!(
                "sampling.aggregate_interval_secs must be at least {MIN_AGGREGATE_INTERVAL_SECS}"
            )));
        }
        if sampling.aggregate_interval_secs % sampling.sample_interval_secs != 0 {
            return Err(ConfigError::Invalid(format!(
                "sampling.aggregate_interval_secs ({}) must be a multiple of sampling.sample_interval_secs ({})",
                sampling.aggregate_interval_secs, sampling.sample_interval_secs
            )));
        }
        if !sampling.enabled && !self.server.enabled {
            return Err(ConfigError::Invalid(
                "both the sampler and the server are disabled".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.sampling.sample_interval_secs, 10);
        assert_eq!(config.sampling.aggregate_interval_secs, 60);
        assert_eq!(config.sampling.target_size(), 6);
        assert_eq!(config.storage.data_dir, PathBuf::from("enviro-data"));
        assert_eq!(config.server.bind_addr(), "0.0.0.0:5000");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [sampling]
            aggregate_interval_secs = 3600

            [server]
            port = 8080
            "#,
        )
        .unwrap();

        assert_eq!(config.sampling.sample_interval_secs, 10);
        assert_eq!(config.sampling.target_size(), 360);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert!(config.sampling.enabled);
    }

    #[test]
    fn test_rejects_bad_intervals() {
        let mut config = Config::default();
        config.sampling.sample_interval_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.sampling.sample_interval_secs = 7;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.sampling.sample_interval_secs = 10;
        config.sampling.aggregate_interval_secs = 30;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_everything_disabled() {
        let mut config = Config::default();
        config.sampling.enabled = false;
        assert!(config.validate().is_ok());
        config.server.enabled = false;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_example_file_matches_defaults() {
        let config = Config::from_toml_str(include_str!("../../../enviro.example.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            Config::from_toml_str("[sampling\nenabled = true"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = Config::load("/definitely/not/here.toml").await.unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
