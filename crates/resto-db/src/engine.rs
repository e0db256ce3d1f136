//! # Points Engine
//!
//! Credits points for settled orders, converts points into checkout
//! discounts, and reports a customer's standing.
//!
//! ## Credit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  credit_for_order(request, session)                                     │
//! │       │                                                                 │
//! │       ├── no customer?              ──► CreditResult::none()            │
//! │       ├── resolve program           ──► none if no program applies      │
//! │       ├── load ladder (ascending)                                       │
//! │       ▼                                                                 │
//! │  ┌───────────────── SAVEPOINT / TRANSACTION ─────────────────────┐     │
//! │  │ 1. INSERT ledger ON CONFLICT DO NOTHING  (+ registration row) │     │
//! │  │ 2. flip is_first_transaction 1 → 0       (bonus if we won)    │     │
//! │  │ 3. current_points += base + bonus, count += 1                 │     │
//! │  │ 4. evaluate tier on the new balance                           │     │
//! │  │ 5. CAS current_level_id, += level-up bonus                    │     │
//! │  └───────────────────────────── COMMIT ──────────────────────────┘     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CreditResult { points_earned, ..., total_points, new_tier }           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Absorption
//! Nothing here ever fails order settlement. Every error, and every
//! operation that outlives `operation_timeout`, is logged where it is
//! absorbed and turned into the zero-effect result:
//!
//! ```text
//! FailureKind::Precondition          → debug!  (guest order, low balance)
//! FailureKind::ConfigurationMissing  → info!   (no program, bad ladder)
//! FailureKind::Infrastructure        → warn!   (store error, timeout)
//! ```
//!
//! ## Sessions
//! Pass `Some(&mut *tx)` to join the caller's transaction: the engine's
//! writes run in a savepoint inside it and commit with the order, and a
//! failed credit rolls back only the savepoint. Pass `None` to let the
//! engine run its own transaction on a pooled connection.

use chrono::{DateTime, Utc};
use sqlx::{Connection, SqliteConnection};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::repository::{LedgerRepository, LevelRepository, ProgramRepository};
use resto_core::validation::{validate_customer_id, validate_program};
use resto_core::{
    evaluate_tier, plan_credit, plan_redemption, CreditRequest, CreditResult, CustomerLedger,
    FailureKind, LoyaltyError, LoyaltyProgram, Money, PointsEntryKind, PointsHistoryEntry,
    RedeemRequest, RedeemResult, StandingResult,
};

// =============================================================================
// Configuration
// =============================================================================

/// Runtime limits for [`PointsEngine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on one operation, including waiting for a connection
    /// and for SQLite's write lock.
    /// Default: 2 seconds
    pub operation_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            operation_timeout: Duration::from_millis(2000),
        }
    }
}

impl EngineConfig {
    /// Sets the per-operation timeout.
    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }
}

// =============================================================================
// Engine
// =============================================================================

/// The loyalty points engine.
///
/// Cheap to clone; clones share the pool.
///
/// ## Usage
/// ```rust,ignore
/// let engine = db.engine(EngineConfig::default());
///
/// let request = CreditRequest::new(Money::from_minor(25_000), Some("cust-1"), Some("outlet-7"))
///     .with_order_id("order-1001");
/// let credit = engine.credit_for_order(&request, None).await;
/// println!("Earned {} points", credit.points_earned);
/// ```
#[derive(Debug, Clone)]
pub struct PointsEngine {
    db: Database,
    programs: ProgramRepository,
    levels: LevelRepository,
    ledgers: LedgerRepository,
    config: EngineConfig,
}

impl PointsEngine {
    /// Creates an engine over `db`.
    pub fn new(db: Database, config: EngineConfig) -> Self {
        PointsEngine {
            programs: db.programs(),
            levels: db.levels(),
            ledgers: db.ledgers(),
            db,
            config,
        }
    }

    /// Returns the engine's configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // =========================================================================
    // Public Operations
    // =========================================================================

    /// Credits points for a settled order.
    ///
    /// Returns [`CreditResult::none`] for guest orders, outlets without a
    /// program, and any failure; never an error.
    pub async fn credit_for_order(
        &self,
        request: &CreditRequest,
        session: Option<&mut SqliteConnection>,
    ) -> CreditResult {
        let outcome = self
            .bounded(async move {
                match session {
                    Some(conn) => self.try_credit(request, conn).await,
                    None => {
                        let mut pooled = self.db.pool().acquire().await?;
                        self.try_credit(request, &mut pooled).await
                    }
                }
            })
            .await;

        match outcome {
            Ok(result) => result,
            Err(err) => {
                absorb("credit_for_order", request.customer_id.as_deref(), &err);
                CreditResult::none()
            }
        }
    }

    /// Spends points for a checkout discount.
    ///
    /// Returns [`RedeemResult::none`] when the customer is missing, the
    /// amount is not positive, the balance does not cover it, or anything
    /// fails; the ledger is unchanged in every one of those cases.
    pub async fn redeem_points(
        &self,
        request: &RedeemRequest,
        session: Option<&mut SqliteConnection>,
    ) -> RedeemResult {
        let outcome = self
            .bounded(async move {
                match session {
                    Some(conn) => self.try_redeem(request, conn).await,
                    None => {
                        let mut pooled = self.db.pool().acquire().await?;
                        self.try_redeem(request, &mut pooled).await
                    }
                }
            })
            .await;

        match outcome {
            Ok(result) => result,
            Err(err) => {
                absorb("redeem_points", request.customer_id.as_deref(), &err);
                RedeemResult::none()
            }
        }
    }

    /// Reads a customer's standing under the program for `outlet_id`.
    ///
    /// Pure read. Unknown customers and unresolved programs yield
    /// [`StandingResult::none`].
    pub async fn get_standing(
        &self,
        customer_id: Option<&str>,
        outlet_id: Option<&str>,
        session: Option<&mut SqliteConnection>,
    ) -> StandingResult {
        let outcome = self
            .bounded(async move {
                match session {
                    Some(conn) => self.try_standing(customer_id, outlet_id, conn).await,
                    None => {
                        let mut pooled = self.db.pool().acquire().await?;
                        self.try_standing(customer_id, outlet_id, &mut pooled).await
                    }
                }
            })
            .await;

        match outcome {
            Ok(result) => result,
            Err(err) => {
                absorb("get_standing", customer_id, &err);
                StandingResult::none()
            }
        }
    }

    /// Prices `points` under the program for `outlet_id` without touching
    /// any ledger. Zero when nothing applies.
    pub async fn quote_redemption(
        &self,
        outlet_id: Option<&str>,
        points: i64,
        session: Option<&mut SqliteConnection>,
    ) -> Money {
        let outcome = self
            .bounded(async move {
                match session {
                    Some(conn) => self.try_quote(outlet_id, points, conn).await,
                    None => {
                        let mut pooled = self.db.pool().acquire().await?;
                        self.try_quote(outlet_id, points, &mut pooled).await
                    }
                }
            })
            .await;

        match outcome {
            Ok(amount) => amount,
            Err(err) => {
                absorb("quote_redemption", None, &err);
                Money::zero()
            }
        }
    }

    // =========================================================================
    // Fallible Cores
    // =========================================================================

    async fn try_credit(
        &self,
        request: &CreditRequest,
        conn: &mut SqliteConnection,
    ) -> DbResult<CreditResult> {
        let customer_id = require_customer(request.customer_id.as_deref())?;
        let program = self
            .active_program(conn, request.outlet_id.as_deref())
            .await?;
        let levels = self.levels.ladder(conn, &program.id).await?;
        let order_id = request.order_id.as_deref();
        let now = Utc::now();

        let mut tx = conn.begin().await?;

        let (ledger, created) = self
            .ledgers
            .create_if_missing(&mut tx, customer_id, &program, now)
            .await?;
        if created && ledger.current_points > 0 {
            let entry = history_entry(
                &ledger,
                PointsEntryKind::Registration,
                ledger.current_points,
                ledger.current_points,
                now,
            );
            self.ledgers.record_history(&mut tx, &entry).await?;
        }

        let first_transaction = self
            .ledgers
            .consume_first_transaction(&mut tx, &ledger.id, now)
            .await?;
        let plan = plan_credit(&program, request.order_amount, first_transaction)?;

        let mut ledger = self
            .ledgers
            .apply_credit(&mut tx, &ledger.id, plan.points_earned, now)
            .await?;
        if plan.base_points > 0 {
            let entry = history_entry(
                &ledger,
                PointsEntryKind::Earn,
                plan.base_points,
                ledger.current_points - plan.bonus_points,
                now,
            )
            .with_order_id(order_id);
            self.ledgers.record_history(&mut tx, &entry).await?;
        }
        if plan.bonus_points > 0 {
            let entry = history_entry(
                &ledger,
                PointsEntryKind::FirstTransactionBonus,
                plan.bonus_points,
                ledger.current_points,
                now,
            )
            .with_order_id(order_id);
            self.ledgers.record_history(&mut tx, &entry).await?;
        }

        let mut new_tier = None;
        let mut level_up_bonus_points = 0;

        if let Some(promotion) = evaluate_tier(&ledger, &levels) {
            let promoted = self
                .ledgers
                .apply_level_up(
                    &mut tx,
                    &ledger.id,
                    ledger.current_level_id.as_deref(),
                    &promotion.level.id,
                    promotion.bonus_points,
                    now,
                )
                .await?;

            match promoted {
                Some(promoted) => {
                    info!(
                        customer_id = %customer_id,
                        program = %program.name,
                        tier = %promotion.level.name,
                        bonus = promotion.bonus_points,
                        "Customer reached a new tier"
                    );
                    if promotion.bonus_points > 0 {
                        let entry = history_entry(
                            &promoted,
                            PointsEntryKind::LevelUpBonus,
                            promotion.bonus_points,
                            promoted.current_points,
                            now,
                        )
                        .with_order_id(order_id)
                        .with_level_id(promotion.level.id.clone());
                        self.ledgers.record_history(&mut tx, &entry).await?;
                    }
                    new_tier = Some(promotion.level.name.clone());
                    level_up_bonus_points = promotion.bonus_points;
                    ledger = promoted;
                }
                None => {
                    debug!(
                        ledger_id = %ledger.id,
                        "Tier moved by another writer, skipping promotion"
                    );
                }
            }
        }

        tx.commit().await?;

        debug!(
            customer_id = %customer_id,
            program = %program.name,
            base = plan.base_points,
            bonus = plan.bonus_points,
            level_up_bonus = level_up_bonus_points,
            balance = ledger.current_points,
            "Credited order"
        );

        Ok(CreditResult {
            points_earned: plan.points_earned,
            base_points: plan.base_points,
            bonus_points: plan.bonus_points,
            level_up_bonus_points,
            is_first_transaction: first_transaction,
            new_tier,
            total_points: ledger.current_points,
            program_name: Some(program.name),
        })
    }

    async fn try_redeem(
        &self,
        request: &RedeemRequest,
        conn: &mut SqliteConnection,
    ) -> DbResult<RedeemResult> {
        let customer_id = require_customer(request.customer_id.as_deref())?;
        if request.points_to_redeem <= 0 {
            return Err(LoyaltyError::NonPositiveRedemption {
                requested: request.points_to_redeem,
            }
            .into());
        }

        let program = self
            .active_program(conn, request.outlet_id.as_deref())
            .await?;
        let plan = plan_redemption(&program, request.points_to_redeem)?;
        let now = Utc::now();

        let mut tx = conn.begin().await?;

        let spent = self
            .ledgers
            .apply_redemption(&mut tx, customer_id, &program.id, plan.points, now)
            .await?;

        let ledger = match spent {
            Some(ledger) => ledger,
            None => {
                let existing = self.ledgers.load(&mut tx, customer_id, &program.id).await?;
                return Err(match existing {
                    Some(ledger) => LoyaltyError::InsufficientPoints {
                        available: ledger.current_points,
                        requested: plan.points,
                    },
                    None => LoyaltyError::LedgerNotFound {
                        customer_id: customer_id.to_string(),
                        program_id: program.id.clone(),
                    },
                }
                .into());
            }
        };

        let entry = history_entry(
            &ledger,
            PointsEntryKind::Redeem,
            plan.points,
            ledger.current_points,
            now,
        )
        .with_order_id(request.order_id.as_deref())
        .with_discount(plan.discount_amount);
        self.ledgers.record_history(&mut tx, &entry).await?;

        tx.commit().await?;

        debug!(
            customer_id = %customer_id,
            program = %program.name,
            points = plan.points,
            discount = %plan.discount_amount,
            remaining = ledger.current_points,
            "Redeemed points"
        );

        Ok(RedeemResult {
            discount_amount: plan.discount_amount,
            points_used: plan.points,
            remaining_points: ledger.current_points,
        })
    }

    async fn try_standing(
        &self,
        customer_id: Option<&str>,
        outlet_id: Option<&str>,
        conn: &mut SqliteConnection,
    ) -> DbResult<StandingResult> {
        let customer_id = require_customer(customer_id)?;
        let program = self.active_program(conn, outlet_id).await?;

        let ledger = self
            .ledgers
            .load(conn, customer_id, &program.id)
            .await?
            .ok_or_else(|| LoyaltyError::LedgerNotFound {
                customer_id: customer_id.to_string(),
                program_id: program.id.clone(),
            })?;

        let current_level = match ledger.current_level_id.as_deref() {
            Some(level_id) => self.levels.load(conn, level_id).await?.map(|l| l.name),
            None => None,
        };

        Ok(StandingResult {
            available_points: ledger.current_points,
            current_level,
            total_earned: ledger.total_points_earned,
            total_redeemed: ledger.total_points_redeemed,
            program_name: Some(program.name),
        })
    }

    async fn try_quote(
        &self,
        outlet_id: Option<&str>,
        points: i64,
        conn: &mut SqliteConnection,
    ) -> DbResult<Money> {
        let program = self.active_program(conn, outlet_id).await?;
        Ok(plan_redemption(&program, points)?.discount_amount)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Resolves the program for `outlet_id` and re-checks its rates.
    async fn active_program(
        &self,
        conn: &mut SqliteConnection,
        outlet_id: Option<&str>,
    ) -> DbResult<LoyaltyProgram> {
        let program = self
            .programs
            .resolve(conn, outlet_id)
            .await?
            .ok_or_else(|| LoyaltyError::NoActiveProgram {
                outlet_id: outlet_id.map(str::to_string),
            })?;

        validate_program(&program)?;
        Ok(program)
    }

    /// Runs `operation` under the configured timeout.
    async fn bounded<T>(&self, operation: impl Future<Output = DbResult<T>>) -> DbResult<T> {
        match tokio::time::timeout(self.config.operation_timeout, operation).await {
            Ok(result) => result,
            Err(_) => Err(DbError::Timeout(
                self.config.operation_timeout.as_millis() as u64,
            )),
        }
    }
}

fn require_customer(customer_id: Option<&str>) -> Result<&str, LoyaltyError> {
    customer_id
        .and_then(|id| validate_customer_id(id).ok())
        .ok_or(LoyaltyError::MissingCustomer)
}

fn history_entry(
    ledger: &CustomerLedger,
    kind: PointsEntryKind,
    points: i64,
    balance_after: i64,
    now: DateTime<Utc>,
) -> PointsHistoryEntry {
    PointsHistoryEntry::new(Uuid::new_v4().to_string(), ledger, kind, points, balance_after, now)
}

/// Logs an absorbed failure at the level its kind calls for.
fn absorb(operation: &'static str, customer_id: Option<&str>, err: &DbError) {
    let kind = err.kind();
    match kind {
        FailureKind::Precondition => {
            debug!(operation, customer_id = ?customer_id, %kind, error = %err, "Loyalty operation skipped")
        }
        FailureKind::ConfigurationMissing => {
            info!(operation, customer_id = ?customer_id, %kind, error = %err, "Loyalty not applicable")
        }
        FailureKind::Infrastructure => {
            warn!(operation, customer_id = ?customer_id, %kind, error = %err, "Loyalty operation failed, returning zero result")
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DbConfig;
    use resto_core::LoyaltyLevel;

    async fn engine() -> (Database, PointsEngine) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let program = LoyaltyProgram::new("prog-1", "Resto Rewards", 100, Utc::now())
            .with_registration_points(50)
            .with_first_transaction_points(100)
            .with_discount_value_per_point(50);
        db.programs().insert(&program).await.unwrap();
        db.levels()
            .insert(&LoyaltyLevel::new("silver", "prog-1", "Silver", 500, 50, Utc::now()))
            .await
            .unwrap();
        let engine = db.engine(EngineConfig::default());
        (db, engine)
    }

    #[test]
    fn test_require_customer() {
        assert_eq!(require_customer(Some(" cust-1 ")).unwrap(), "cust-1");
        assert!(matches!(require_customer(None), Err(LoyaltyError::MissingCustomer)));
        assert!(matches!(require_customer(Some("  ")), Err(LoyaltyError::MissingCustomer)));
    }

    #[test]
    fn test_engine_config_default() {
        let config = EngineConfig::default().operation_timeout(Duration::from_millis(250));
        assert_eq!(config.operation_timeout, Duration::from_millis(250));
        assert_eq!(EngineConfig::default().operation_timeout, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_first_credit_records_history() {
        let (db, engine) = engine().await;

        let request = CreditRequest::new(Money::from_minor(25_000), Some("cust-1"), None)
            .with_order_id("order-1");
        let result = engine.credit_for_order(&request, None).await;

        assert_eq!(result.points_earned, 350);
        assert_eq!(result.total_points, 400);
        assert!(result.is_first_transaction);
        assert_eq!(result.program_name.as_deref(), Some("Resto Rewards"));

        let ledger = db.ledgers().find("cust-1", "prog-1").await.unwrap().unwrap();
        let kinds: Vec<PointsEntryKind> = db
            .ledgers()
            .history(&ledger.id)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                PointsEntryKind::Registration,
                PointsEntryKind::Earn,
                PointsEntryKind::FirstTransactionBonus,
            ]
        );
    }

    #[tokio::test]
    async fn test_redeem_records_discount() {
        let (db, engine) = engine().await;

        engine
            .credit_for_order(&CreditRequest::new(Money::from_minor(25_000), Some("cust-1"), None), None)
            .await;
        let result = engine
            .redeem_points(&RedeemRequest::new(Some("cust-1"), 100, None).with_order_id("order-2"), None)
            .await;

        assert_eq!(result.discount_amount, Money::from_minor(5_000));
        assert_eq!(result.remaining_points, 300);

        let ledger = db.ledgers().find("cust-1", "prog-1").await.unwrap().unwrap();
        let history = db.ledgers().history(&ledger.id).await.unwrap();
        let redeem = history.last().unwrap();
        assert_eq!(redeem.kind, PointsEntryKind::Redeem);
        assert_eq!(redeem.discount_amount, 5_000);
        assert_eq!(redeem.balance_after, 300);
        assert_eq!(redeem.order_id.as_deref(), Some("order-2"));
    }

    #[tokio::test]
    async fn test_redeem_without_ledger_is_noop() {
        let (_db, engine) = engine().await;

        let result = engine
            .redeem_points(&RedeemRequest::new(Some("stranger"), 10, None), None)
            .await;
        assert_eq!(result, RedeemResult::none());
    }

    #[tokio::test]
    async fn test_non_positive_redeem_is_noop() {
        let (_db, engine) = engine().await;

        for points in [0, -5] {
            let result = engine
                .redeem_points(&RedeemRequest::new(Some("cust-1"), points, None), None)
                .await;
            assert_eq!(result, RedeemResult::none());
        }
    }

    #[tokio::test]
    async fn test_quote_redemption() {
        let (_db, engine) = engine().await;

        assert_eq!(engine.quote_redemption(None, 200, None).await, Money::from_minor(10_000));
        assert_eq!(engine.quote_redemption(None, 0, None).await, Money::zero());
    }

    #[tokio::test]
    async fn test_standing_reports_tier_name() {
        let (_db, engine) = engine().await;

        engine
            .credit_for_order(&CreditRequest::new(Money::from_minor(25_000), Some("cust-1"), None), None)
            .await;
        engine
            .credit_for_order(&CreditRequest::new(Money::from_minor(10_000), Some("cust-1"), None), None)
            .await;

        let standing = engine.get_standing(Some("cust-1"), None, None).await;
        // 50 registration + 350 first order + 100 second order + 50 Silver bonus
        assert_eq!(standing.available_points, 550);
        assert_eq!(standing.current_level.as_deref(), Some("Silver"));
        assert_eq!(standing.total_earned, 550);
        assert_eq!(standing.total_redeemed, 0);

        assert_eq!(engine.get_standing(Some("nobody"), None, None).await, StandingResult::none());
        assert_eq!(engine.get_standing(None, None, None).await, StandingResult::none());
    }

    #[tokio::test]
    async fn test_closed_pool_degrades_to_zero() {
        let (db, engine) = engine().await;
        db.close().await;

        let result = engine
            .credit_for_order(&CreditRequest::new(Money::from_minor(25_000), Some("cust-1"), None), None)
            .await;
        assert_eq!(result, CreditResult::none());
    }

    #[tokio::test]
    async fn test_timeout_degrades_to_zero() {
        let (db, _) = engine().await;
        let engine = db.engine(EngineConfig::default().operation_timeout(Duration::from_millis(50)));

        // The in-memory pool has a single connection; holding it starves the engine.
        let held = db.pool().acquire().await.unwrap();
        let result = engine
            .credit_for_order(&CreditRequest::new(Money::from_minor(25_000), Some("cust-1"), None), None)
            .await;
        assert_eq!(result, CreditResult::none());
        drop(held);

        let ledger = db.ledgers().find("cust-1", "prog-1").await.unwrap();
        assert!(ledger.is_none());
    }
}
