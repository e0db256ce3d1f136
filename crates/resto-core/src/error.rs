//! # Error Types
//!
//! Domain-specific error types for resto-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  resto-core errors (this file)                                         │
//! │  ├── LoyaltyError     - Why a credit/redeem could not take effect      │
//! │  └── ValidationError  - Program/level/request input failures           │
//! │                                                                         │
//! │  resto-db errors (separate crate)                                      │
//! │  └── DbError          - Store failures, wraps LoyaltyError             │
//! │                                                                         │
//! │  Flow: ValidationError → LoyaltyError → DbError → PointsEngine         │
//! │        PointsEngine logs it and returns the zero-effect result         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these ever reach the order-settlement caller. They exist so the
//! engine can log exactly why a customer earned or redeemed nothing.

use thiserror::Error;

// =============================================================================
// Failure Kind
// =============================================================================

/// Coarse classification used when an engine failure is absorbed.
///
/// ```text
/// ConfigurationMissing  no active program, broken ladder      → info
/// Precondition          guest order, zero points, low balance → debug
/// Infrastructure        store down, timeout, overflow         → warn
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    ConfigurationMissing,
    Precondition,
    Infrastructure,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::ConfigurationMissing => write!(f, "configuration_missing"),
            FailureKind::Precondition => write!(f, "precondition"),
            FailureKind::Infrastructure => write!(f, "infrastructure"),
        }
    }
}

// =============================================================================
// Loyalty Error
// =============================================================================

/// Reasons a loyalty operation produced no effect.
#[derive(Debug, Error)]
pub enum LoyaltyError {
    /// No active program applies to the outlet (nor a global fallback).
    #[error("No active loyalty program for outlet {}", .outlet_id.as_deref().unwrap_or("<none>"))]
    NoActiveProgram { outlet_id: Option<String> },

    /// Order or redemption has no customer attached (guest checkout).
    #[error("No customer attached to the request")]
    MissingCustomer,

    /// Redemption amount was zero or negative.
    #[error("Points to redeem must be positive, got {requested}")]
    NonPositiveRedemption { requested: i64 },

    /// Customer has never earned under this program.
    ///
    /// ## When This Occurs
    /// Redeeming or querying before the first credit created the ledger.
    #[error("No ledger for customer {customer_id} in program {program_id}")]
    LedgerNotFound {
        customer_id: String,
        program_id: String,
    },

    /// Redemption would drive the balance negative.
    #[error("Insufficient points: available {available}, requested {requested}")]
    InsufficientPoints { available: i64, requested: i64 },

    /// Point or currency arithmetic overflowed i64.
    #[error("Arithmetic overflow computing {what}")]
    Overflow { what: String },

    /// Stored program or level data fails validation.
    #[error("Invalid loyalty configuration: {0}")]
    InvalidConfiguration(#[from] ValidationError),
}

impl LoyaltyError {
    /// Classifies the error for logging at the absorption point.
    pub fn kind(&self) -> FailureKind {
        match self {
            LoyaltyError::NoActiveProgram { .. } | LoyaltyError::InvalidConfiguration(_) => {
                FailureKind::ConfigurationMissing
            }
            LoyaltyError::MissingCustomer
            | LoyaltyError::NonPositiveRedemption { .. }
            | LoyaltyError::LedgerNotFound { .. }
            | LoyaltyError::InsufficientPoints { .. } => FailureKind::Precondition,
            LoyaltyError::Overflow { .. } => FailureKind::Infrastructure,
        }
    }

    /// Creates an Overflow error.
    pub fn overflow(what: impl Into<String>) -> Self {
        LoyaltyError::Overflow { what: what.into() }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised for program/level configuration that would break the engine's
/// numeric invariants, and for malformed request fields.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Tier thresholds are not strictly ascending.
    #[error("Level '{level}' threshold {required_points} does not exceed the previous level")]
    LadderOutOfOrder { level: String, required_points: i64 },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with LoyaltyError.
pub type CoreResult<T> = Result<T, LoyaltyError>;

// =============================================================================
// Unit Tests
// =============================================================================
