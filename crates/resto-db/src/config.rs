//! # Loyalty Configuration
//!
//! File and environment configuration for the loyalty database and engine.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     RESTO_DB_PATH=/var/lib/resto/loyalty.db                            │
//! │     RESTO_DB_MAX_CONNECTIONS=8                                         │
//! │     RESTO_LOYALTY_TIMEOUT_MS=1500                                      │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/pos/loyalty.toml (Linux)                                 │
//! │     ~/Library/Application Support/com.resto.pos/loyalty.toml (macOS)   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     ./resto-loyalty.db, 5 connections, 2000 ms per operation           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # loyalty.toml
//! [database]
//! path = "/var/lib/resto/loyalty.db"
//! max_connections = 5
//! connect_timeout_secs = 30
//!
//! [engine]
//! operation_timeout_ms = 2000
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::engine::EngineConfig;
use crate::error::{DbError, DbResult};
use crate::pool::DbConfig;

// =============================================================================
// Database Settings
// =============================================================================

/// Where the loyalty store lives and how the pool is sized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite database file. Created on first connect.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    /// Pool ceiling. Concurrent credits beyond this wait for a connection.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Apply embedded migrations on connect.
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("resto-loyalty.db")
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

fn default_true() -> bool {
    true
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Engine Settings
// =============================================================================

/// Runtime limits for the points engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Upper bound on a single credit, redeem or standing lookup. An
    /// operation that runs past it yields the zero-effect result.
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_ms: u64,
}

fn default_operation_timeout() -> u64 {
    2000
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            operation_timeout_ms: default_operation_timeout(),
        }
    }
}

// =============================================================================
// Loyalty Configuration
// =============================================================================

/// Complete loyalty configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoyaltyConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub engine: EngineSettings,
}

impl LoyaltyConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (loyalty.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> DbResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading loyalty config from file");
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

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load loyalty config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Parses a TOML document. Missing sections take their defaults.
    pub fn from_toml(contents: &str) -> DbResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> DbResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(DbError::InvalidConfig("database.path is empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(DbError::InvalidConfig(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(DbError::InvalidConfig(format!(
                "database.min_connections ({}) exceeds max_connections ({})",
                self.database.min_connections, self.database.max_connections
            )));
        }

        if self.engine.operation_timeout_ms == 0 {
            return Err(DbError::InvalidConfig(
                "engine.operation_timeout_ms must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `RESTO_*` overrides read through `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("RESTO_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = lookup("RESTO_DB_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(n) => self.database.max_connections = n,
                Err(_) => warn!(value = %max, "Ignoring non-numeric RESTO_DB_MAX_CONNECTIONS"),
            }
        }

        if let Some(timeout) = lookup("RESTO_LOYALTY_TIMEOUT_MS") {
            match timeout.parse::<u64>() {
                Ok(ms) => {
                    debug!(ms, "Overriding loyalty operation timeout from environment");
                    self.engine.operation_timeout_ms = ms;
                }
                Err(_) => warn!(value = %timeout, "Ignoring non-numeric RESTO_LOYALTY_TIMEOUT_MS"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "resto", "pos")
            .map(|dirs| dirs.config_dir().join("loyalty.toml"))
    }

    // =========================================================================
    // Conversions
    // =========================================================================

    /// Pool configuration for [`crate::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database.path.clone())
            .max_connections(self.database.max_connections)
            .min_connections(self.database.min_connections)
            .connect_timeout(Duration::from_secs(self.database.connect_timeout_secs))
            .run_migrations(self.database.run_migrations)
    }

    /// Engine configuration for [`crate::PointsEngine::new`].
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .operation_timeout(Duration::from_millis(self.engine.operation_timeout_ms))
    }
}
