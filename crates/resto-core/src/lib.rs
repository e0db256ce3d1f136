//! # resto-core: Pure Loyalty Logic for Resto POS
//!
//! This crate holds the rules of the Loyalty Points Engine as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Resto POS Loyalty Architecture                      │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │           Order Settlement / Receipt / Balance Display          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ credit / redeem / standing             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 resto-db: PointsEngine + Ledger store            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ resto-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  program  │  │   tier    │  │  points   │  │ validation│  │   │
//! │  │   │ registry  │  │  ladder   │  │ credit /  │  │   rules   │  │   │
//! │  │   │ resolve   │  │ evaluate  │  │ redeem    │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Programs, levels, ledgers, requests and results
//! - [`money`] - Integer money with floor point conversion
//! - [`program`] - Program Registry resolution rule
//! - [`tier`] - Tier Ladder evaluation
//! - [`points`] - Credit and redemption arithmetic
//! - [`validation`] - Configuration and input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use resto_core::money::Money;
//!
//! // Rp 25.000 at 100 per point earns 250 points
//! assert_eq!(Money::from_minor(25_000).points_at_rate(100), 250);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod points;
pub mod program;
pub mod tier;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreResult, FailureKind, LoyaltyError, ValidationError};
pub use money::Money;
pub use points::{plan_credit, plan_redemption, CreditPlan, RedemptionPlan};
pub use program::resolve_program;
pub use tier::{evaluate_tier, qualifying_level, TierPromotion};
pub use types::*;
