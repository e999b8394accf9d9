//! Configuration loaded from YAML

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "ORKG_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub publishing: PublishingConfig,
    pub cache: CacheConfig,
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Defaults to the platform data directory when unset
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishingConfig {
    pub comparison_base_url: String,
    pub literature_list_base_url: String,
}

impl Default for PublishingConfig {
    fn default() -> Self {
        Self {
            comparison_base_url: "https://orkg.org/comparison/".to_string(),
            literature_list_base_url: "https://orkg.org/list/".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl Config {
    /// Location of the config file: `$ORKG_CONFIG` or the platform config directory
    pub fn config_path() -> Option<PathBuf> {
        if let Ok(custom) = env::var(CONFIG_ENV) {
            return Some(PathBuf::from(custom));
        }
        dirs::config_dir().map(|dir| dir.join("orkg").join("config.yaml"))
    }

    /// Load the config file, falling back to defaults when it does not exist
    pub fn load() -> Result<Self, ConfigError> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, url) in [
            ("comparison_base_url", &self.publishing.comparison_base_url),
            ("literature_list_base_url", &self.publishing.literature_list_base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::Invalid(format!("publishing.{} must be an http(s) URL", name)));
            }
        }
        Ok(())
    }

    /// Configured database path or the default one
    pub fn database_path(&self) -> PathBuf {
        self.database.path.clone().unwrap_or_else(default_db_path)
    }
}

/// Default database location in the platform data directory
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("orkg")
        .join("orkg.db")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_files_fill_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "cache:\n  enabled: false\nlog_level: debug").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert!(!config.cache.enabled);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.publishing, PublishingConfig::default());
        assert!(config.database.path.is_none());
    }

    #[test]
    fn non_http_base_urls_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "publishing:\n  comparison_base_url: ftp://example.org/").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn explicit_database_path_wins() {
        let config = Config {
            database: DatabaseConfig { path: Some(PathBuf::from("/tmp/graph.db")) },
            ..Config::default()
        };
        assert_eq!(config.database_path(), PathBuf::from("/tmp/graph.db"));
        assert!(default_db_path().ends_with("orkg/orkg.db"));
    }
}
