//! # Point Arithmetic
//!
//! The numbers behind a credit and a redemption, computed without touching
//! the ledger. The database layer applies them atomically.
//!
//! ## Credit
//! ```text
//! base_points   = floor(order_amount / points_per_rp)
//! bonus_points  = first_transaction_points   if the ledger's flag was consumed
//!               = 0                          otherwise
//! points_earned = base_points + bonus_points
//! ```
//!
//! ## Redemption
//! ```text
//! discount_amount = points_to_redeem × discount_value_per_point
//! ```

use crate::error::{CoreResult, LoyaltyError};
use crate::money::Money;
use crate::types::LoyaltyProgram;

/// Points a single order earns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditPlan {
    pub base_points: i64,
    pub bonus_points: i64,
    pub points_earned: i64,
}

/// Computes the points for an order.
///
/// `first_transaction` is whether this order consumed the ledger's
/// first-transaction flag.
pub fn plan_credit(
    program: &LoyaltyProgram,
    order_amount: Money,
    first_transaction: bool,
) -> CoreResult<CreditPlan> {
    let base_points = program.base_points(order_amount);
    let bonus_points = if first_transaction {
        program.first_transaction_points.max(0)
    } else {
        0
    };
    let points_earned = base_points
        .checked_add(bonus_points)
        .ok_or_else(|| LoyaltyError::overflow("points earned"))?;

    Ok(CreditPlan {
        base_points,
        bonus_points,
        points_earned,
    })
}

/// A redemption that passed its preconditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedemptionPlan {
    pub points: i64,
    pub discount_amount: Money,
}

/// Prices a redemption of `points` under `program`.
///
/// Balance sufficiency is not checked here; the ledger update enforces it.
pub fn plan_redemption(program: &LoyaltyProgram, points: i64) -> CoreResult<RedemptionPlan> {
    if points <= 0 {
        return Err(LoyaltyError::NonPositiveRedemption { requested: points });
    }

    let discount_amount = program
        .discount_value_per_point()
        .checked_times_points(points)
        .ok_or_else(|| LoyaltyError::overflow("discount amount"))?;

    Ok(RedemptionPlan {
        points,
        discount_amount,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
