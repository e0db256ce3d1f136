//! # Repository Module
//!
//! Database repository implementations for the loyalty store.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Who Uses What                                        │
//! │                                                                         │
//! │  Admin tooling / seed              PointsEngine (inside a transaction) │
//! │       │                                   │                             │
//! │       │ pool-level methods                │ connection-level methods    │
//! │       ▼                                   ▼                             │
//! │  ProgramRepository                 resolve(conn, outlet)               │
//! │  ├── insert / get_by_id / list     LevelRepository::ladder(conn, ..)   │
//! │  └── set_active                    LedgerRepository                    │
//! │  LevelRepository                   ├── create_if_missing               │
//! │  ├── insert / get_by_id            ├── consume_first_transaction       │
//! │  └── list_for_program              ├── apply_credit / apply_level_up   │
//! │  LedgerRepository                  ├── apply_redemption                │
//! │  └── find / history                └── record_history                  │
//! │                                                                         │
//! │  Connection-level methods take `&mut SqliteConnection` so they run on  │
//! │  whatever transaction (or savepoint) the caller has open.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProgramRepository`] - Program registry and administration
//! - [`LevelRepository`] - Tier ladders
//! - [`LedgerRepository`] - Customer balances and points history

pub mod ledger;
pub mod level;
pub mod program;

pub use ledger::LedgerRepository;
pub use level::LevelRepository;
pub use program::ProgramRepository;
