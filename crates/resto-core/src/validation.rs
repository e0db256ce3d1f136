//! # Validation Module
//!
//! Checks that program and level configuration keeps the engine's numeric
//! invariants, and that request identifiers are usable.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Admin CRUD (outside this workspace)                          │
//! │  └── Form checks before a program is saved                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Repositories validate before insert                               │
//! │  └── PointsEngine re-validates the resolved program before use         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (points_per_rp > 0), CHECK (current_points >= 0)            │
//! │  └── UNIQUE (customer_id, program_id)                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use resto_core::validation::{validate_customer_id, validate_redemption_points};
//!
//! assert_eq!(validate_customer_id(" cust-42 ").unwrap(), "cust-42");
//! assert!(validate_redemption_points(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::{LoyaltyLevel, LoyaltyProgram};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 100;
const MAX_ID_LEN: usize = 64;

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates a customer identifier and returns it trimmed.
///
/// Customer ids come from the CRM collaborator and are opaque here; only
/// emptiness and length are checked.
pub fn validate_customer_id(id: &str) -> ValidationResult<&str> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: "customer_id".to_string(),
        });
    }

    if id.len() > MAX_ID_LEN {
        return Err(ValidationError::TooLong {
            field: "customer_id".to_string(),
            max: MAX_ID_LEN,
        });
    }

    Ok(id)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a redemption amount.
pub fn validate_redemption_points(points: i64) -> ValidationResult<()> {
    if points <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "points_to_redeem".to_string(),
        });
    }

    Ok(())
}

fn non_negative(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn display_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.len() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Configuration Validators
// =============================================================================

/// Validates a program's rates.
///
/// ## Rules
/// - Name present, at most 100 characters
/// - `points_per_rp` > 0 (the accrual divisor)
/// - `points_to_discount_ratio` > 0
/// - Registration, first-transaction and discount values >= 0
pub fn validate_program(program: &LoyaltyProgram) -> ValidationResult<()> {
    display_name("program name", &program.name)?;

    if program.points_per_rp <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "points_per_rp".to_string(),
        });
    }

    if program.points_to_discount_ratio <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "points_to_discount_ratio".to_string(),
        });
    }

    non_negative("registration_points", program.registration_points)?;
    non_negative("first_transaction_points", program.first_transaction_points)?;
    non_negative("discount_value_per_point", program.discount_value_per_point)?;

    Ok(())
}

/// Validates a single tier.
pub fn validate_level(level: &LoyaltyLevel) -> ValidationResult<()> {
    display_name("level name", &level.name)?;
    non_negative("required_points", level.required_points)?;
    non_negative("level_up_bonus_points", level.level_up_bonus_points)?;
    Ok(())
}

/// Validates a ladder: every level valid, thresholds strictly ascending.
pub fn validate_ladder(levels: &[LoyaltyLevel]) -> ValidationResult<()> {
    let mut previous: Option<i64> = None;

    for level in levels {
        validate_level(level)?;

        if let Some(prev) = previous {
            if level.required_points <= prev {
                return Err(ValidationError::LadderOutOfOrder {
                    level: level.name.clone(),
                    required_points: level.required_points,
                });
            }
        }
        previous = Some(level.required_points);
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tests::program;
    use chrono::Utc;

    fn level(name: &str, required: i64, bonus: i64) -> LoyaltyLevel {
        LoyaltyLevel {
            id: name.to_lowercase(),
            program_id: "prog-1".to_string(),
            name: name.to_string(),
            required_points: required,
            level_up_bonus_points: bonus,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_validate_customer_id() {
        assert_eq!(validate_customer_id("cust-1").unwrap(), "cust-1");
        assert_eq!(validate_customer_id("  cust-1 ").unwrap(), "cust-1");
        assert!(validate_customer_id("").is_err());
        assert!(validate_customer_id("   ").is_err());
        assert!(validate_customer_id(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_redemption_points() {
        assert!(validate_redemption_points(1).is_ok());
        assert!(validate_redemption_points(0).is_err());
        assert!(validate_redemption_points(-10).is_err());
    }

    #[test]
    fn test_validate_program() {
        assert!(validate_program(&program(100, 50, 100)).is_ok());

        let mut p = program(0, 50, 100);
        assert!(matches!(
            validate_program(&p),
            Err(ValidationError::MustBePositive { .. })
        ));

        p = program(100, -1, 100);
        assert!(matches!(
            validate_program(&p),
            Err(ValidationError::MustNotBeNegative { .. })
        ));

        p = program(100, 0, 0);
        p.discount_value_per_point = -5;
        assert!(validate_program(&p).is_err());

        p = program(100, 0, 0);
        p.name = "  ".to_string();
        assert!(matches!(
            validate_program(&p),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_validate_ladder() {
        let ok = vec![level("Silver", 500, 50), level("Gold", 2000, 0)];
        assert!(validate_ladder(&ok).is_ok());
        assert!(validate_ladder(&[]).is_ok());

        let duplicate = vec![level("Silver", 500, 50), level("Gold", 500, 0)];
        assert!(matches!(
            validate_ladder(&duplicate),
            Err(ValidationError::LadderOutOfOrder { .. })
        ));

        let negative_bonus = vec![level("Silver", 500, -1)];
        assert!(validate_ladder(&negative_bonus).is_err());
    }
}
