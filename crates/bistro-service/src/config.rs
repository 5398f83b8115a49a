//! # Service Configuration
//!
//! Settings for the database, order policy and logging.
//!
//! ## Load Order
//! ```text
//! PosConfig::default()
//!       │
//!       ▼
//! bistro.toml (explicit path, or the platform config dir)
//!       │
//!       ▼
//! BISTRO_* environment variables
//!       │
//!       ▼
//! validate()
//! ```
//!
//! ## Example File
//! ```toml
//! [database]
//! path = "/var/lib/bistro/bistro.db"
//! max_connections = 5
//!
//! [orders]
//! discount_approval_threshold_percent = 20
//! max_item_quantity = 50
//!
//! [logging]
//! filter = "info,bistro=debug,sqlx=warn"
//! ```
//!
//! Tax and service-charge rates live on each outlet row, not here.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

use bistro_db::DbConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to write config file: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("bistro.db")
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseSettings {
    pub fn to_db_config(&self) -> DbConfig {
        DbConfig::new(&self.path).max_connections(self.max_connections)
    }
}

/// Order policy knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSettings {
    /// Discounts above this share of the subtotal need a manager PIN.
    #[serde(default = "default_discount_threshold")]
    pub discount_approval_threshold_percent: Decimal,

    #[serde(default = "default_max_item_quantity")]
    pub max_item_quantity: i64,

    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

fn default_discount_threshold() -> Decimal {
    Decimal::from(20)
}

fn default_max_item_quantity() -> i64 {
    bistro_core::MAX_ITEM_QUANTITY
}

fn default_page_size() -> u32 {
    20
}

fn default_max_page_size() -> u32 {
    100
}

impl Default for OrderSettings {
    fn default() -> Self {
        OrderSettings {
            discount_approval_threshold_percent: default_discount_threshold(),
            max_item_quantity: default_max_item_quantity(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "info,bistro=debug,sqlx=warn".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_filter(),
        }
    }
}

// =============================================================================
// PosConfig
// =============================================================================

/// Complete service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PosConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub orders: OrderSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl PosConfig {
    /// Loads configuration from file and environment.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML document. Missing sections and keys take defaults.
    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Loads config or falls back to defaults if loading fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::Invalid("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, toml::to_string_pretty(self)?)?;

        info!(?path, "Config saved");
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        let threshold = self.orders.discount_approval_threshold_percent;
        if threshold < Decimal::ZERO || threshold > Decimal::ONE_HUNDRED {
            return Err(ConfigError::Invalid(format!(
                "orders.discount_approval_threshold_percent must be between 0 and 100, got {threshold}"
            )));
        }

        if !(1..=bistro_core::MAX_ITEM_QUANTITY).contains(&self.orders.max_item_quantity) {
            return Err(ConfigError::Invalid(format!(
                "orders.max_item_quantity must be between 1 and {}",
                bistro_core::MAX_ITEM_QUANTITY
            )));
        }

        if self.orders.default_page_size == 0
            || self.orders.default_page_size > self.orders.max_page_size
        {
            return Err(ConfigError::Invalid(
                "orders.default_page_size must be between 1 and max_page_size".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("BISTRO_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Ok(max) = std::env::var("BISTRO_DB_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(n) => self.database.max_connections = n,
                Err(_) => warn!(value = %max, "Ignoring non-numeric BISTRO_DB_MAX_CONNECTIONS"),
            }
        }

        if let Ok(threshold) = std::env::var("BISTRO_DISCOUNT_APPROVAL_THRESHOLD") {
            match threshold.parse::<Decimal>() {
                Ok(t) => self.orders.discount_approval_threshold_percent = t,
                Err(_) => warn!(value = %threshold, "Ignoring invalid BISTRO_DISCOUNT_APPROVAL_THRESHOLD"),
            }
        }

        if let Ok(qty) = std::env::var("BISTRO_MAX_ITEM_QUANTITY") {
            if let Ok(q) = qty.parse::<i64>() {
                self.orders.max_item_quantity = q;
            }
        }

        if let Ok(filter) = std::env::var("BISTRO_LOG") {
            self.logging.filter = filter;
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "bistro", "pos")
            .map(|dirs| dirs.config_dir().join("bistro.toml"))
    }
}
