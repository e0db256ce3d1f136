//! # resto-db: Loyalty Store and Points Engine for Resto POS
//!
//! This crate persists loyalty programs, tier ladders and customer ledgers
//! in SQLite via sqlx, and runs the points engine over them.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Resto POS Loyalty Data Flow                      │
//! │                                                                         │
//! │  Order settlement (credit)  Checkout (redeem)  Balance screen (standing)│
//! │       │                          │                   │                  │
//! │       ▼                          ▼                   ▼                  │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     resto-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │ PointsEngine  │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │ (engine.rs)   │───►│ programs      │    │  (embedded)  │  │   │
//! │  │   │ timeout +     │    │ levels        │    │              │  │   │
//! │  │   │ absorb errors │    │ ledgers       │    │ 001_loyalty  │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │           │                    │                               │   │
//! │  │           ▼                    ▼                               │   │
//! │  │   resto-core (pure rules)   Database (pool.rs)                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`config`] - File and environment configuration
//! - [`repository`] - Program, level and ledger repositories
//! - [`engine`] - The points engine
//!
//! ## Usage
//!
//! ```rust,ignore
//! use resto_core::{CreditRequest, Money};
//! use resto_db::{Database, LoyaltyConfig};
//!
//! let config = LoyaltyConfig::load(None)?;
//! let db = Database::new(config.db_config()).await?;
//! let engine = db.engine(config.engine_config());
//!
//! let request = CreditRequest::new(Money::from_minor(25_000), Some("cust-1"), Some("outlet-7"));
//! let credit = engine.credit_for_order(&request, None).await;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod engine;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::LoyaltyConfig;
pub use engine::{EngineConfig, PointsEngine};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::{LedgerRepository, LevelRepository, ProgramRepository};
