//! # Domain Types
//!
//! Loyalty records and the request/result DTOs of the points engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ LoyaltyProgram  │   │  LoyaltyLevel   │   │ CustomerLedger  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  outlet_id?     │◄──│  program_id     │   │  customer_id    │       │
//! │  │  points_per_rp  │   │  required_points│◄──│  current_level  │       │
//! │  │  reg/first pts  │   │  level_up_bonus │   │  current_points │       │
//! │  │  value/point    │   └─────────────────┘   │  lifetime totals│       │
//! │  └─────────────────┘                         └────────┬────────┘       │
//! │        config (read-only)                             │                 │
//! │                                              ┌────────▼────────┐       │
//! │                                              │ PointsHistory   │       │
//! │                                              │ (append-only)   │       │
//! │                                              └─────────────────┘       │
//! │                                                                         │
//! │  CreditRequest ──► CreditResult     RedeemRequest ──► RedeemResult     │
//! │                        StandingResult (pure read)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Point quantities are `i64` to match SQLite INTEGER columns. Every
//! constructor and update path keeps them non-negative.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Loyalty Program
// =============================================================================

/// Accrual and redemption rates for one outlet, or for all outlets when
/// `outlet_id` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LoyaltyProgram {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name, unique across programs. Printed on receipts.
    pub name: String,

    /// Outlet scope. `None` makes this the global fallback program.
    pub outlet_id: Option<String>,

    /// Inactive programs never resolve.
    pub is_active: bool,

    /// Currency units per earned point (base accrual rate).
    pub points_per_rp: i64,

    /// Granted once when the customer's ledger is created.
    pub registration_points: i64,

    /// Granted on the customer's first completed transaction.
    pub first_transaction_points: i64,

    /// Points per discount step. Stored for the dashboard; the value law
    /// uses `discount_value_per_point` directly.
    pub points_to_discount_ratio: i64,

    /// Discount in currency units per redeemed point.
    pub discount_value_per_point: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl LoyaltyProgram {
    /// Creates an active global program with no bonuses and no redemption
    /// value. Chain the `with_*` setters to fill in the rates.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::Utc;
    /// use resto_core::LoyaltyProgram;
    ///
    /// let program = LoyaltyProgram::new("prog-1", "Resto Rewards", 100, Utc::now())
    ///     .with_registration_points(50)
    ///     .with_first_transaction_points(100)
    ///     .with_discount_value_per_point(50);
    /// assert!(program.is_global());
    /// ```
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        points_per_rp: i64,
        now: DateTime<Utc>,
    ) -> Self {
        LoyaltyProgram {
            id: id.into(),
            name: name.into(),
            outlet_id: None,
            is_active: true,
            points_per_rp,
            registration_points: 0,
            first_transaction_points: 0,
            points_to_discount_ratio: 1,
            discount_value_per_point: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Scopes the program to a single outlet.
    pub fn for_outlet(mut self, outlet_id: impl Into<String>) -> Self {
        self.outlet_id = Some(outlet_id.into());
        self
    }

    pub fn with_registration_points(mut self, points: i64) -> Self {
        self.registration_points = points;
        self
    }

    pub fn with_first_transaction_points(mut self, points: i64) -> Self {
        self.first_transaction_points = points;
        self
    }

    pub fn with_discount_value_per_point(mut self, value: i64) -> Self {
        self.discount_value_per_point = value;
        self
    }

    pub fn with_points_to_discount_ratio(mut self, ratio: i64) -> Self {
        self.points_to_discount_ratio = ratio;
        self
    }

    /// Returns true when the program applies to every outlet.
    #[inline]
    pub fn is_global(&self) -> bool {
        self.outlet_id.is_none()
    }

    /// Returns the discount value per point as Money.
    #[inline]
    pub fn discount_value_per_point(&self) -> Money {
        Money::from_minor(self.discount_value_per_point)
    }

    /// Base points for an order: `floor(order_amount / points_per_rp)`.
    #[inline]
    pub fn base_points(&self, order_amount: Money) -> i64 {
        order_amount.points_at_rate(self.points_per_rp)
    }
}

// =============================================================================
// Loyalty Level
// =============================================================================

/// A tier on a program's ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LoyaltyLevel {
    pub id: String,
    pub program_id: String,
    /// Display name ("Silver", "Gold").
    pub name: String,
    /// Minimum balance that qualifies for this tier.
    pub required_points: i64,
    /// Granted once, the moment the customer first reaches this tier.
    pub level_up_bonus_points: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl LoyaltyLevel {
    pub fn new(
        id: impl Into<String>,
        program_id: impl Into<String>,
        name: impl Into<String>,
        required_points: i64,
        level_up_bonus_points: i64,
        now: DateTime<Utc>,
    ) -> Self {
        LoyaltyLevel {
            id: id.into(),
            program_id: program_id.into(),
            name: name.into(),
            required_points,
            level_up_bonus_points,
            created_at: now,
        }
    }
}

// =============================================================================
// Customer Ledger
// =============================================================================

/// Running totals for one customer under one program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CustomerLedger {
    pub id: String,
    pub customer_id: String,
    pub program_id: String,
    /// Spendable balance. Never negative.
    pub current_points: i64,
    /// Lifetime points credited, including registration and bonuses.
    pub total_points_earned: i64,
    /// Lifetime points spent on discounts.
    pub total_points_redeemed: i64,
    /// Highest tier reached so far.
    pub current_level_id: Option<String>,
    /// True until the first completed transaction consumes it.
    pub is_first_transaction: bool,
    pub transaction_count: i64,
    #[ts(as = "Option<String>")]
    pub last_transaction_date: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl CustomerLedger {
    /// Builds the ledger a customer starts with under `program`.
    ///
    /// Seeded with `registration_points` as both spendable and lifetime
    /// earned; the first-transaction bonus is still pending.
    pub fn seed(
        id: impl Into<String>,
        customer_id: impl Into<String>,
        program: &LoyaltyProgram,
        now: DateTime<Utc>,
    ) -> Self {
        let registration = program.registration_points.max(0);
        CustomerLedger {
            id: id.into(),
            customer_id: customer_id.into(),
            program_id: program.id.clone(),
            current_points: registration,
            total_points_earned: registration,
            total_points_redeemed: 0,
            current_level_id: None,
            is_first_transaction: true,
            transaction_count: 0,
            last_transaction_date: None,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Points History
// =============================================================================

/// What moved a ledger balance.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PointsEntryKind {
    /// Seed points when the ledger was created.
    Registration,
    /// Base points from an order.
    Earn,
    /// One-time bonus on the first transaction.
    FirstTransactionBonus,
    /// One-time bonus for reaching a tier.
    LevelUpBonus,
    /// Points converted to a discount.
    Redeem,
}

/// One audit row per ledger movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PointsHistoryEntry {
    pub id: String,
    pub ledger_id: String,
    pub kind: PointsEntryKind,
    /// Always positive; `kind` says which direction.
    pub points: i64,
    /// Discount granted, for `Redeem` rows. Zero otherwise.
    pub discount_amount: i64,
    pub balance_after: i64,
    pub order_id: Option<String>,
    pub level_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl PointsHistoryEntry {
    /// Records `points` of `kind` against `ledger`, with the balance the
    /// ledger showed right after the movement.
    pub fn new(
        id: impl Into<String>,
        ledger: &CustomerLedger,
        kind: PointsEntryKind,
        points: i64,
        balance_after: i64,
        now: DateTime<Utc>,
    ) -> Self {
        PointsHistoryEntry {
            id: id.into(),
            ledger_id: ledger.id.clone(),
            kind,
            points,
            discount_amount: 0,
            balance_after,
            order_id: None,
            level_id: None,
            created_at: now,
        }
    }

    pub fn with_order_id(mut self, order_id: Option<&str>) -> Self {
        self.order_id = order_id.map(str::to_string);
        self
    }

    pub fn with_level_id(mut self, level_id: impl Into<String>) -> Self {
        self.level_id = Some(level_id.into());
        self
    }

    pub fn with_discount(mut self, discount: Money) -> Self {
        self.discount_amount = discount.minor();
        self
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Input to the credit path, handed over by order settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreditRequest {
    /// Pre-computed order total.
    pub order_amount: Money,
    /// `None` for guest checkout.
    pub customer_id: Option<String>,
    /// `None` when the order has no outlet context.
    pub outlet_id: Option<String>,
    /// Order reference recorded in the points history.
    pub order_id: Option<String>,
}

impl CreditRequest {
    pub fn new(
        order_amount: Money,
        customer_id: Option<&str>,
        outlet_id: Option<&str>,
    ) -> Self {
        CreditRequest {
            order_amount,
            customer_id: customer_id.map(str::to_string),
            outlet_id: outlet_id.map(str::to_string),
            order_id: None,
        }
    }

    /// Attaches the order reference.
    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }
}

/// Input to the redemption path, handed over by checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RedeemRequest {
    pub customer_id: Option<String>,
    pub points_to_redeem: i64,
    pub outlet_id: Option<String>,
    pub order_id: Option<String>,
}

impl RedeemRequest {
    pub fn new(customer_id: Option<&str>, points_to_redeem: i64, outlet_id: Option<&str>) -> Self {
        RedeemRequest {
            customer_id: customer_id.map(str::to_string),
            points_to_redeem,
            outlet_id: outlet_id.map(str::to_string),
            order_id: None,
        }
    }

    /// Attaches the order reference.
    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }
}

// =============================================================================
// Results
// =============================================================================

/// Summary of a credit, shown on the receipt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreditResult {
    /// `base_points + bonus_points`.
    pub points_earned: i64,
    pub base_points: i64,
    /// First-transaction bonus granted by this order.
    pub bonus_points: i64,
    /// Tier bonus granted by this order.
    pub level_up_bonus_points: i64,
    /// True when this order consumed the first-transaction bonus.
    pub is_first_transaction: bool,
    /// Name of the tier reached by this order, if it changed.
    pub new_tier: Option<String>,
    /// Balance after the credit, tier bonus included.
    pub total_points: i64,
    pub program_name: Option<String>,
}

impl CreditResult {
    /// The zero-effect result: nothing earned, nothing changed.
    pub fn none() -> Self {
        CreditResult::default()
    }
}

/// Summary of a redemption, applied as a checkout discount.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RedeemResult {
    pub discount_amount: Money,
    pub points_used: i64,
    pub remaining_points: i64,
}

impl RedeemResult {
    /// The zero-effect result: no discount, nothing spent.
    pub fn none() -> Self {
        RedeemResult::default()
    }
}

/// A customer's current standing under the program resolving for an outlet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StandingResult {
    pub available_points: i64,
    /// Display name of the highest tier reached.
    pub current_level: Option<String>,
    pub total_earned: i64,
    pub total_redeemed: i64,
    pub program_name: Option<String>,
}

impl StandingResult {
    /// The empty standing for unknown customers or unresolved programs.
    pub fn none() -> Self {
        StandingResult::default()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
