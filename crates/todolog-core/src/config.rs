//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/todolog/config.toml)
//! 3. Environment variables (TODOLOG_* prefix)
//!
//! Environment variables take precedence over config file values.
//! Loading never creates the data directory; the store does that on first use.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::storage::EVENTS_FILE;
use crate::store::DEFAULT_INPUT_CAPACITY;

/// Environment variable prefix
const ENV_PREFIX: &str = "TODOLOG";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the event log
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Write logs to this file instead of stderr
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,

    /// How many mutations may queue before submitters wait
    #[serde(default = "default_input_capacity")]
    pub input_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_file: None,
            input_capacity: DEFAULT_INPUT_CAPACITY,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (TODOLOG_DATA_DIR, TODOLOG_LOG_FILE, TODOLOG_INPUT_CAPACITY)
    /// 2. Config file (~/.config/todolog/config.toml or TODOLOG_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load from `path` when given, otherwise from the default location
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        // empty clears it
        if let Ok(val) = std::env::var(format!("{}_LOG_FILE", ENV_PREFIX)) {
            self.log_file = if val.is_empty() {
                None
            } else {
                Some(PathBuf::from(val))
            };
        }

        if let Ok(val) = std::env::var(format!("{}_INPUT_CAPACITY", ENV_PREFIX)) {
            self.input_capacity = val
                .trim()
                .parse()
                .with_context(|| format!("Invalid {}_INPUT_CAPACITY: {:?}", ENV_PREFIX, val))?;
        }
        Ok(())
    }

    /// Save configuration to the default config file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path())
    }

    /// Save configuration to `path`, creating its parent directory
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with TODOLOG_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("todolog")
            .join("config.toml")
    }

    /// Get the path to the event log
    pub fn events_path(&self) -> PathBuf {
        self.data_dir.join(EVENTS_FILE)
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("todolog")
}

fn default_input_capacity() -> usize {
    DEFAULT_INPUT_CAPACITY
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "TODOLOG_DATA_DIR",
        "TODOLOG_LOG_FILE",
        "TODOLOG_INPUT_CAPACITY",
        "TODOLOG_CONFIG",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.data_dir.ends_with("todolog"));
        assert!(config.log_file.is_none());
        assert_eq!(config.input_capacity, 256);
        assert!(config.events_path().ends_with("todolog/events.json"));
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("TODOLOG_DATA_DIR", "/tmp/todolog-test");
        config.apply_env_overrides().unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/todolog-test"));
    }

    #[test]
    fn test_env_override_log_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("TODOLOG_LOG_FILE", "/tmp/todolog.log");
        config.apply_env_overrides().unwrap();
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/todolog.log")));

        env::set_var("TODOLOG_LOG_FILE", "");
        config.apply_env_overrides().unwrap();
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_env_override_input_capacity() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("TODOLOG_INPUT_CAPACITY", "16");
        config.apply_env_overrides().unwrap();
        assert_eq!(config.input_capacity, 16);

        env::set_var("TODOLOG_INPUT_CAPACITY", "lots");
        assert!(config.apply_env_overrides().is_err());
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            data_dir = "/custom/data"
            log_file = "/custom/todolog.log"
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(config.log_file, Some(PathBuf::from("/custom/todolog.log")));
        assert_eq!(config.input_capacity, 256);
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        assert!(config.log_file.is_none());
        assert_eq!(config.input_capacity, 256);
    }

    #[test]
    fn test_load_does_not_create_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("data");

        env::set_var("TODOLOG_DATA_DIR", &data_dir);
        let config = Config::load_from_path(&temp_dir.path().join("missing.toml")).unwrap();

        assert_eq!(config.data_dir, data_dir);
        assert!(!data_dir.exists());
    }

    #[test]
    fn test_save_and_reload() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = Config {
            data_dir: PathBuf::from("/data/todolog"),
            log_file: None,
            input_capacity: 32,
        };
        config.save_to(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("data_dir"));
        assert!(!content.contains("log_file"));

        let loaded = Config::load_with_cli_override(Some(&path)).unwrap();
        assert_eq!(loaded.data_dir, config.data_dir);
        assert_eq!(loaded.input_capacity, 32);
    }

    #[test]
    fn test_config_file_path_override() {
        let _guard = EnvGuard::new(ENV_VARS);

        assert!(Config::config_file_path().ends_with("todolog/config.toml"));
        env::set_var("TODOLOG_CONFIG", "/etc/todolog.toml");
        assert_eq!(Config::config_file_path(), PathBuf::from("/etc/todolog.toml"));
    }
}
