//! # Shop Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     REPAIRDESK_DB_PATH=/srv/repairdesk.db                              │
//! │     REPAIRDESK_ALLOW_NEGATIVE_STOCK=true                               │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/repairdesk/shop.toml (Linux)                             │
//! │     ~/Library/Application Support/com.repairdesk.repairdesk/ (macOS)   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [shop]
//! name = "Fix-It Corner"
//!
//! [database]
//! path = "/srv/repairdesk/repairdesk.db"
//! max_connections = 5
//! connect_timeout_secs = 30
//!
//! [stock]
//! allow_negative_stock = false
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::pool::DbConfig;

const IN_MEMORY: &str = ":memory:";

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to write config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("No config directory available on this platform")]
    NoConfigDir,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopSettings {
    /// Printed on invoices and in logs.
    #[serde(default = "default_shop_name")]
    pub name: String,
}

fn default_shop_name() -> String {
    "RepairDesk".to_string()
}

impl Default for ShopSettings {
    fn default() -> Self {
        ShopSettings {
            name: default_shop_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database file. `None` means the platform data directory;
    /// `":memory:"` means a throwaway in-memory database.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 {
    5
}
fn default_min_connections() -> u32 {
    1
}
fn default_connect_timeout() -> u64 {
    30
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_true() -> bool {
    true
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            run_migrations: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockSettings {
    /// Let jobs use parts that are not on hand (stock goes negative).
    #[serde(default)]
    pub allow_negative_stock: bool,
}

// =============================================================================
// Shop Configuration
// =============================================================================

/// Complete configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShopConfig {
    #[serde(default)]
    pub shop: ShopSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub stock: StockSettings,
}

impl ShopConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`shop.toml`)
    /// 3. `REPAIRDESK_*` environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading shop config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Writes the configuration as TOML, creating parent directories.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or(ConfigError::NoConfigDir)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Shop config saved");
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.shop.name.trim().is_empty() {
            return Err(ConfigError::Invalid("shop.name must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid(format!(
                "database.min_connections ({}) exceeds max_connections ({})",
                self.database.min_connections, self.database.max_connections
            )));
        }

        if self.database.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "database.connect_timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies `REPAIRDESK_*` overrides read through `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(name) = lookup("REPAIRDESK_SHOP_NAME") {
            self.shop.name = name;
        }

        if let Some(path) = lookup("REPAIRDESK_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(max) = lookup("REPAIRDESK_DB_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(max) => self.database.max_connections = max,
                Err(_) => warn!(value = %max, "Ignoring invalid REPAIRDESK_DB_MAX_CONNECTIONS"),
            }
        }

        if let Some(allow) = lookup("REPAIRDESK_ALLOW_NEGATIVE_STOCK") {
            match allow.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.stock.allow_negative_stock = true,
                "0" | "false" | "no" => self.stock.allow_negative_stock = false,
                _ => warn!(value = %allow, "Ignoring invalid REPAIRDESK_ALLOW_NEGATIVE_STOCK"),
            }
        }
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("com", "repairdesk", "repairdesk")
    }

    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("shop.toml"))
    }

    /// Database file used when none is configured.
    pub fn default_database_path() -> PathBuf {
        Self::project_dirs()
            .map(|dirs| dirs.data_dir().join("repairdesk.db"))
            .unwrap_or_else(|| PathBuf::from("repairdesk.db"))
    }

    /// Builds the pool configuration.
    pub fn db_config(&self) -> DbConfig {
        let path = self
            .database
            .path
            .clone()
            .unwrap_or_else(Self::default_database_path);

        let base = if path.as_os_str() == IN_MEMORY {
            DbConfig::in_memory()
        } else {
            DbConfig::new(path)
                .max_connections(self.database.max_connections)
                .min_connections(self.database.min_connections)
                .connect_timeout(Duration::from_secs(self.database.connect_timeout_secs))
                .idle_timeout(Duration::from_secs(self.database.idle_timeout_secs))
        };

        base.run_migrations(self.database.run_migrations)
            .allow_negative_stock(self.stock.allow_negative_stock)
    }
}
