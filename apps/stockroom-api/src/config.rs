//! # API Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOCKROOM_PORT=9000                                                │
//! │     STOCKROOM_JWT_SECRET=...                                           │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $STOCKROOM_CONFIG, or                                              │
//! │     ~/.config/stockroom/stockroom.toml (Linux)                         │
//! │     ~/Library/Application Support/com.stockroom.stockroom/... (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [server]
//! bind_addr = "0.0.0.0"
//! port = 8080
//!
//! [database]
//! path = "/var/lib/stockroom/stockroom.db"
//! max_connections = 5
//!
//! [auth]
//! jwt_secret = "a long random string"
//! token_lifetime_secs = 28800
//! bootstrap_admin_username = "admin"
//! bootstrap_admin_password = "change-me-now"
//!
//! [inventory]
//! default_location = "Main Warehouse"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "STOCKROOM_CONFIG";

const MIN_SECRET_LEN: usize = 16;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            bind_addr: default_bind_addr(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Defaults to `stockroom.db` in the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseSettings {
    /// Configured path, else the platform data dir, else the working directory.
    pub fn database_path(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return path.clone();
        }
        directories::ProjectDirs::from("com", "stockroom", "stockroom")
            .map(|dirs| dirs.data_dir().join("stockroom.db"))
            .unwrap_or_else(|| PathBuf::from("stockroom.db"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    #[serde(default = "default_token_lifetime")]
    pub token_lifetime_secs: i64,

    /// Admin account created when the users table is empty.
    #[serde(default = "default_admin_username")]
    pub bootstrap_admin_username: String,

    /// Without a password no bootstrap admin is created.
    #[serde(default)]
    pub bootstrap_admin_password: Option<String>,
}

fn default_jwt_secret() -> String {
    // Must be overridden in production
    "stockroom-dev-secret-change-in-production".to_string()
}

fn default_token_lifetime() -> i64 {
    8 * 3600
}

fn default_admin_username() -> String {
    "admin".to_string()
}

impl Default for AuthSettings {
    fn default() -> Self {
        AuthSettings {
            jwt_secret: default_jwt_secret(),
            token_lifetime_secs: default_token_lifetime(),
            bootstrap_admin_username: default_admin_username(),
            bootstrap_admin_password: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventorySettings {
    /// Location for admitted units when no warehouse store is active.
    #[serde(default = "default_location")]
    pub default_location: String,
}

fn default_location() -> String {
    stockroom_core::DEFAULT_WAREHOUSE_LOCATION.to_string()
}

impl Default for InventorySettings {
    fn default() -> Self {
        InventorySettings {
            default_location: default_location(),
        }
    }
}

// =============================================================================
// ApiConfig
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub auth: AuthSettings,

    #[serde(default)]
    pub inventory: InventorySettings,
}

impl ApiConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`explicit`, `$STOCKROOM_CONFIG`, or the platform config dir)
    /// 3. `STOCKROOM_*` environment variables
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = explicit
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from))
            .or_else(Self::default_config_path);

        let mut config = match path {
            Some(path) if path.exists() => {
                info!(?path, "Loading config from file");
                Self::from_toml(&std::fs::read_to_string(&path)?)?
            }
            Some(path) => {
                debug!(?path, "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Applies `STOCKROOM_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("STOCKROOM_BIND_ADDR") {
            self.server.bind_addr = addr;
        }
        if let Some(port) = lookup("STOCKROOM_PORT") {
            debug!(port = %port, "Overriding port from environment");
            self.server.port = parse("STOCKROOM_PORT", &port)?;
        }
        if let Some(path) = lookup("STOCKROOM_DB_PATH") {
            self.database.path = Some(PathBuf::from(path));
        }
        if let Some(max) = lookup("STOCKROOM_DB_MAX_CONNECTIONS") {
            self.database.max_connections = parse("STOCKROOM_DB_MAX_CONNECTIONS", &max)?;
        }
        if let Some(secret) = lookup("STOCKROOM_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(secs) = lookup("STOCKROOM_TOKEN_LIFETIME_SECS") {
            self.auth.token_lifetime_secs = parse("STOCKROOM_TOKEN_LIFETIME_SECS", &secs)?;
        }
        if let Some(username) = lookup("STOCKROOM_ADMIN_USERNAME") {
            self.auth.bootstrap_admin_username = username;
        }
        if let Some(password) = lookup("STOCKROOM_ADMIN_PASSWORD") {
            self.auth.bootstrap_admin_password = Some(password);
        }
        if let Some(location) = lookup("STOCKROOM_DEFAULT_LOCATION") {
            self.inventory.default_location = location;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be non-zero".into()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }
        if self.auth.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid(format!(
                "auth.jwt_secret must be at least {} characters",
                MIN_SECRET_LEN
            )));
        }
        if self.auth.token_lifetime_secs <= 0 {
            return Err(ConfigError::Invalid(
                "auth.token_lifetime_secs must be positive".into(),
            ));
        }
        if self.inventory.default_location.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "inventory.default_location must not be empty".into(),
            ));
        }
        Ok(())
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "stockroom", "stockroom")
            .map(|dirs| dirs.config_dir().join("stockroom.toml"))
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}
