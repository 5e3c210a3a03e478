//! Configuration loading and management
//!
//! Handles parsing of `daycard.toml` in the data directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::task::is_clock_time;

/// Config file name inside the data directory
pub const CONFIG_FILE: &str = "daycard.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Sign-up and sign-in settings
    #[serde(default)]
    pub auth: AuthConfig,

    /// Task defaults and validation policy
    #[serde(default)]
    pub tasks: TasksConfig,
}

/// Auth-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Minimum password length accepted on sign-up
    #[serde(default = "default_min_password_len")]
    pub min_password_len: usize,

    /// PBKDF2 iterations used when hashing new passwords
    #[serde(default = "default_hash_rounds")]
    pub hash_rounds: u32,
}

fn default_min_password_len() -> usize {
    6
}

fn default_hash_rounds() -> u32 {
    10_000
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            min_password_len: default_min_password_len(),
            hash_rounds: default_hash_rounds(),
        }
    }
}

/// How `HH:MM` values are checked when tasks are created or edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimePolicy {
    /// Reject anything that is not a zero-padded 24-hour `HH:MM`.
    #[default]
    Strict,
    /// Store time strings as given.
    Lenient,
}

/// Tasks configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Start time used when a task is added without one
    #[serde(default = "default_start")]
    pub default_start: String,

    /// End time used when a task is added without one
    #[serde(default = "default_end")]
    pub default_end: String,

    #[serde(default)]
    pub time_policy: TimePolicy,
}

fn default_start() -> String {
    "09:00".to_string()
}

fn default_end() -> String {
    "10:00".to_string()
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            default_start: default_start(),
            default_end: default_end(),
            time_policy: TimePolicy::default(),
        }
    }
}

impl Config {
    /// Load configuration from a `daycard.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the data directory, or return defaults
    pub fn load_from_dir(data_dir: &Path) -> Self {
        let config_path = Self::path_in(data_dir);
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load(&config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %config_path.display(), error = %err, "ignoring invalid config");
                Self::default()
            }
        }
    }

    pub fn path_in(data_dir: &Path) -> PathBuf {
        data_dir.join(CONFIG_FILE)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        crate::lock::write_atomic(path, content.as_bytes())
    }

    fn validate(&self) -> Result<()> {
        self.auth.validate()?;
        self.tasks.validate()?;
        Ok(())
    }
}

impl AuthConfig {
    fn validate(&self) -> Result<()> {
        if self.min_password_len == 0 {
            return Err(Error::InvalidConfig(
                "auth.min_password_len must be >= 1".to_string(),
            ));
        }
        if self.hash_rounds == 0 {
            return Err(Error::InvalidConfig(
                "auth.hash_rounds must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl TasksConfig {
    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("tasks.default_start", &self.default_start),
            ("tasks.default_end", &self.default_end),
        ] {
            if !is_clock_time(value) {
                return Err(Error::InvalidConfig(format!(
                    "{field}: '{value}' is not a valid HH:MM time"
                )));
            }
        }
        Ok(())
    }
}
