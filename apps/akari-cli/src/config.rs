//! # CLI Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Command line (highest priority)                                    │
//! │     akari --db ./shop.db ...                                           │
//! │                                                                         │
//! │  2. Environment Variables                                              │
//! │     AKARI_DB_PATH=/srv/akari/akari.db                                  │
//! │     AKARI_CONFLICT_RETRIES=5                                           │
//! │                                                                         │
//! │  3. TOML Config File                                                   │
//! │     --config <PATH>, or                                                │
//! │     ~/.config/akari-pos/akari.toml (Linux)                             │
//! │     ~/Library/Application Support/com.akari.pos/akari.toml (macOS)     │
//! │                                                                         │
//! │  4. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/srv/akari/akari.db"
//! max_connections = 5
//! busy_timeout_ms = 5000
//!
//! [checkout]
//! allow_empty = false
//! decrement_stock = true
//! conflict_retries = 3
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use akari_core::CheckoutPolicy;
use akari_db::DbConfig;

use crate::error::ConfigError;

const CONFIG_FILE: &str = "akari.toml";
const DATABASE_FILE: &str = "akari.db";

/// Upper bound for `checkout.conflict_retries`.
const MAX_CONFLICT_RETRIES: u32 = 20;

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database file. Defaults to the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a writer waits on SQLite's lock before giving up.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: None,
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

/// Complete CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AkariConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub checkout: CheckoutPolicy,
}

impl AkariConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// An explicit `config_path` must exist; the platform default is
    /// optional.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                Some(path) => {
                    debug!(?path, "Config file not found, using defaults");
                    Self::default()
                }
                None => Self::default(),
            },
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        info!(?path, "Loading config from file");
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be at least 1".into(),
            ));
        }

        if self.database.busy_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "database.busy_timeout_ms must be greater than 0".into(),
            ));
        }

        if self.checkout.conflict_retries > MAX_CONFLICT_RETRIES {
            return Err(ConfigError::Invalid(format!(
                "checkout.conflict_retries must be at most {}",
                MAX_CONFLICT_RETRIES
            )));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `AKARI_*` overrides read through `lookup`. Unparseable values
    /// are logged and ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("AKARI_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(value) = lookup("AKARI_MAX_CONNECTIONS") {
            match value.parse::<u32>() {
                Ok(max) => self.database.max_connections = max,
                Err(_) => warn!(value = %value, "Ignoring invalid AKARI_MAX_CONNECTIONS"),
            }
        }

        if let Some(value) = lookup("AKARI_ALLOW_EMPTY_CHECKOUT") {
            match parse_flag(&value) {
                Some(flag) => self.checkout.allow_empty = flag,
                None => warn!(value = %value, "Ignoring invalid AKARI_ALLOW_EMPTY_CHECKOUT"),
            }
        }

        if let Some(value) = lookup("AKARI_DECREMENT_STOCK") {
            match parse_flag(&value) {
                Some(flag) => self.checkout.decrement_stock = flag,
                None => warn!(value = %value, "Ignoring invalid AKARI_DECREMENT_STOCK"),
            }
        }

        if let Some(value) = lookup("AKARI_CONFLICT_RETRIES") {
            match value.parse::<u32>() {
                Ok(retries) => self.checkout.conflict_retries = retries,
                Err(_) => warn!(value = %value, "Ignoring invalid AKARI_CONFLICT_RETRIES"),
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "akari", "pos")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Resolves the database file, creating the platform data directory
    /// when no path is configured.
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.database.path {
            return Ok(path.clone());
        }

        let dirs = directories::ProjectDirs::from("com", "akari", "pos")
            .ok_or(ConfigError::NoDataDir)?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir).map_err(|source| ConfigError::Read {
            path: data_dir.to_path_buf(),
            source,
        })?;

        Ok(data_dir.join(DATABASE_FILE))
    }

    pub fn db_config(&self) -> Result<DbConfig, ConfigError> {
        Ok(DbConfig::new(self.database_path()?)
            .max_connections(self.database.max_connections)
            .busy_timeout(Duration::from_millis(self.database.busy_timeout_ms)))
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
