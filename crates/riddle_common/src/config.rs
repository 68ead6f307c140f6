//! Configuration for the judge, its stores and the daemon.
//!
//! Lookup order: an explicit path, then `$RIDDLE_CONFIG`, then
//! /etc/riddle/config.toml, then built-in defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::cache::DEFAULT_CAPACITY;
use crate::error::{Result, RiddleError};

/// System config file path
pub const CONFIG_PATH: &str = "/etc/riddle/config.toml";

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "RIDDLE_CONFIG";

/// System data directory, used when it exists
pub const SYSTEM_DATA_DIR: &str = "/var/lib/riddle";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeConfig {
    /// Verdict cache capacity
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Replacement pattern catalog; the built-in one otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,

    /// Replacement scenario text; the built-in one otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_path: Option<PathBuf>,
}

fn default_cache_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
            catalog_path: None,
            scenario_path: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding overrides.jsonl and answer_feedback.jsonl
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Configured directory, else /var/lib/riddle if present, else the user
    /// data dir.
    pub fn resolve_data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        let system = Path::new(SYSTEM_DATA_DIR);
        if system.is_dir() {
            return system.to_path_buf();
        }
        dirs::data_dir()
            .map(|d| d.join("riddle"))
            .unwrap_or_else(|| PathBuf::from("riddle-data"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Questions a player may ask before the session runs dry
    #[serde(default = "default_questions_per_session")]
    pub questions_per_session: u32,

    /// Request body cap in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_questions_per_session() -> u32 {
    20
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            questions_per_session: default_questions_per_session(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiddleConfig {
    #[serde(default)]
    pub judge: JudgeConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RiddleConfig {
    /// Load using the lookup order. An explicitly named file (argument or
    /// environment) must exist and parse; the system file is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config = if let Some(path) = explicit {
            Self::load_from_path(path)?
        } else if let Some(path) = std::env::var_os(CONFIG_ENV) {
            Self::load_from_path(Path::new(&path))?
        } else {
            Self::load_from_path(Path::new(CONFIG_PATH)).unwrap_or_else(|e| {
                warn!("Config not found, using defaults: {}", e);
                RiddleConfig::default()
            })
        };
        config.validate()?;
        Ok(config)
    }

    /// Load config from specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            RiddleError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: RiddleConfig = toml::from_str(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.judge.cache_capacity == 0 {
            return Err(RiddleError::Config(
                "judge.cache_capacity must be at least 1".to_string(),
            ));
        }
        if self.server.bind.trim().is_empty() {
            return Err(RiddleError::Config("server.bind is empty".to_string()));
        }
        if self.server.max_body_bytes == 0 {
            return Err(RiddleError::Config(
                "server.max_body_bytes must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn data_dir(&self) -> PathBuf {
        self.storage.resolve_data_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RiddleConfig::default();
        assert_eq!(config.judge.cache_capacity, 1000);
        assert_eq!(config.server.bind, "127.0.0.1:5000");
        assert_eq!(config.server.questions_per_session, 20);
        assert_eq!(config.server.max_body_bytes, 65536);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml_str = r#"
[judge]
cache_capacity = 16

[storage]
data_dir = "/tmp/riddle-test"
"#;
        let config: RiddleConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.judge.cache_capacity, 16);
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/riddle-test"));
        // Defaults for missing sections
        assert_eq!(config.server.questions_per_session, 20);
        assert!(config.judge.catalog_path.is_none());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut config = RiddleConfig::default();
        config.judge.cache_capacity = 0;
        assert!(matches!(config.validate(), Err(RiddleError::Config(_))));
    }

    #[test]
    fn test_empty_bind_rejected() {
        let mut config = RiddleConfig::default();
        config.server.bind = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[server]\nbind = \"0.0.0.0:8080\"\n").unwrap();
        let config = RiddleConfig::load(Some(&path)).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8080");

        let missing = RiddleConfig::load(Some(&dir.path().join("missing.toml")));
        assert!(matches!(missing, Err(RiddleError::Config(_))));
    }

    #[test]
    fn test_explicit_invalid_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[judge]\ncache_capacity = 0\n").unwrap();
        assert!(RiddleConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn test_serializes_back() {
        let config = RiddleConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: RiddleConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
