use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::notifications::DismissPolicy;

/// Main configuration structure
///
/// Loaded from `config.toml` in the user config directory. Every section
/// and key is optional; missing ones take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub billing: BillingConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

impl Config {
    /// Load config from the default location, or defaults if there is none
    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&contents)
                .map_err(|e| crate::Error::ConfigError(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to the default location
    pub fn save(&self) -> crate::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// `<config dir>/lelabs/config.toml`
    pub fn config_path() -> crate::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find config directory".into()))?
            .join("lelabs");

        Ok(config_dir.join("config.toml"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataConfig {
    /// Where the catalog document lives
    #[serde(default = "default_primary_url")]
    pub primary_url: String,

    /// Local document to fall back to instead of the bundled snapshot
    #[serde(default)]
    pub fallback_path: Option<PathBuf>,
}

fn default_primary_url() -> String {
    "https://lelabs.dev/data/le-labs-data.json".to_string()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            primary_url: default_primary_url(),
            fallback_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BillingConfig {
    #[serde(default = "default_products_url")]
    pub products_url: String,

    #[serde(default = "default_checkout_url")]
    pub checkout_url: String,

    /// Retries for the product listing (checkout is never retried)
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// How long a product listing stays fresh
    #[serde(default = "default_stale_minutes")]
    pub stale_minutes: i64,
}

fn default_products_url() -> String {
    "https://api.lelabs.dev/billing/products".to_string()
}

fn default_checkout_url() -> String {
    "https://api.lelabs.dev/billing/create-checkout-session".to_string()
}

fn default_retry_count() -> u32 {
    3
}

fn default_stale_minutes() -> i64 {
    5
}

impl BillingConfig {
    /// Negative values mean "always stale"; huge values saturate
    pub fn stale_after(&self) -> Duration {
        Duration::try_minutes(self.stale_minutes.max(0)).unwrap_or(Duration::MAX)
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            products_url: default_products_url(),
            checkout_url: default_checkout_url(),
            retry_count: default_retry_count(),
            stale_minutes: default_stale_minutes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct NotificationConfig {
    #[serde(default)]
    pub dismiss_policy: DismissPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StorageConfig {
    /// Override for the preferences database location
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

impl StorageConfig {
    /// Configured path, else `<data dir>/lelabs/le-labs-preferences.db`
    pub fn database_path(&self) -> crate::Result<PathBuf> {
        if let Some(path) = &self.db_path {
            return Ok(path.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find data directory".into()))?;
        Ok(data_dir.join("lelabs").join("le-labs-preferences.db"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UiConfig {
    /// Event loop tick in the TUI, in milliseconds
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Enable mouse support in TUI
    #[serde(default = "default_mouse")]
    pub mouse_enabled: bool,
}

fn default_tick_ms() -> u64 {
    250
}

fn default_mouse() -> bool {
    true
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            mouse_enabled: default_mouse(),
        }
    }
}
