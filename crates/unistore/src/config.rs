//! Store configuration
//!
//! Configuration can be built in code or loaded from a TOML file:
//!
//! ```toml
//! name = "counter"
//! action_log_level = "info"
//! log_notifications = true
//! ```

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings shared by a store and the middleware built from it
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StoreConfig {
    /// Name used to tag log lines and fatal-error messages
    #[serde(default = "default_name")]
    pub name: String,

    /// Level at which `LoggingMiddleware` records actions
    /// ("error", "warn", "info", "debug", "trace")
    #[serde(default = "default_action_log_level")]
    pub action_log_level: String,

    /// Log every notification round at trace level
    #[serde(default)]
    pub log_notifications: bool,
}

fn default_name() -> String {
    "store".to_string()
}

fn default_action_log_level() -> String {
    "debug".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            action_log_level: default_action_log_level(),
            log_notifications: false,
        }
    }
}

impl StoreConfig {
    /// Config with the given name and default settings otherwise
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, StoreError> {
        Ok(toml::from_str(content)?)
    }

    /// Load config from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| StoreError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Load config from a TOML file, or use defaults if it is missing or invalid
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No store config at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::load(path) {
            Ok(config) => {
                log::info!("Loaded store config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("{}", e);
                Self::default()
            }
        }
    }

    /// Parsed `action_log_level`, falling back to `Debug` for unknown values
    pub fn action_level(&self) -> log::Level {
        match self.action_log_level.to_lowercase().as_str() {
            "error" => log::Level::Error,
            "warn" => log::Level::Warn,
            "info" => log::Level::Info,
            "trace" => log::Level::Trace,
            _ => log::Level::Debug,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.name, "store");
        assert_eq!(config.action_level(), log::Level::Debug);
        assert!(!config.log_notifications);
    }

    #[test]
    fn test_config_deserialize() {
        let toml = r#"
            name = "counter"
            action_log_level = "INFO"
        "#;
        let config = StoreConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.name, "counter");
        assert_eq!(config.action_level(), log::Level::Info);
        // log_notifications should use default
        assert!(!config.log_notifications);
    }

    #[test]
    fn test_unknown_level_falls_back_to_debug() {
        let config = StoreConfig {
            action_log_level: "loud".to_string(),
            ..StoreConfig::default()
        };
        assert_eq!(config.action_level(), log::Level::Debug);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let err = StoreConfig::from_toml_str("name = [").unwrap_err();
        assert!(matches!(err, StoreError::ConfigParse(_)));
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let path = std::env::temp_dir().join("unistore-does-not-exist.toml");
        let err = StoreConfig::load(&path).unwrap_err();
        assert!(matches!(err, StoreError::ConfigRead { .. }));
        assert_eq!(StoreConfig::load_or_default(&path), StoreConfig::default());
    }

    #[test]
    fn test_load_from_file() -> anyhow::Result<()> {
        let file_name = format!("unistore-config-{}.toml", std::process::id());
        let path = std::env::temp_dir().join(file_name);
        std::fs::write(&path, "name = \"from-file\"\nlog_notifications = true\n")?;

        let config = StoreConfig::load(&path)?;
        std::fs::remove_file(&path)?;

        assert_eq!(config.name, "from-file");
        assert!(config.log_notifications);
        Ok(())
    }
}
