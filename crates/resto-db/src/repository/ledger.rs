//! # Ledger Repository
//!
//! Customer balances and their points history.
//!
//! ## Atomic Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Ledger Update Strategy                               │
//! │                                                                         │
//! │  ❌ WRONG: read, compute in Rust, write back                           │
//! │     SELECT current_points → 600                                         │
//! │     UPDATE ... SET current_points = 400                                │
//! │     Two terminals redeeming 200 each both write 400 (one is lost)      │
//! │                                                                         │
//! │  ✅ CORRECT: one conditional statement, evaluated by SQLite            │
//! │     UPDATE ... SET current_points = current_points - 200               │
//! │     WHERE ... AND current_points >= 200                                │
//! │     RETURNING *                                                        │
//! │     Second redeem sees 400, third sees 200, fourth matches no row      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every mutating method takes the caller's connection so it runs inside
//! the engine's transaction. History rows are written on the same
//! connection and commit or roll back with the movement they record.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use resto_core::{CustomerLedger, LoyaltyProgram, PointsHistoryEntry};

/// Repository for customer ledger operations.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Loads the ledger for a customer under a program.
    pub async fn load(
        &self,
        conn: &mut SqliteConnection,
        customer_id: &str,
        program_id: &str,
    ) -> DbResult<Option<CustomerLedger>> {
        let ledger = sqlx::query_as(
            "SELECT * FROM customer_ledgers WHERE customer_id = ?1 AND program_id = ?2",
        )
        .bind(customer_id)
        .bind(program_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(ledger)
    }

    /// Loads a ledger on a pooled connection.
    pub async fn find(&self, customer_id: &str, program_id: &str) -> DbResult<Option<CustomerLedger>> {
        let mut conn = self.pool.acquire().await?;
        self.load(&mut conn, customer_id, program_id).await
    }

    /// Points history for a ledger, oldest first.
    pub async fn history(&self, ledger_id: &str) -> DbResult<Vec<PointsHistoryEntry>> {
        let entries = sqlx::query_as(
            r#"
            SELECT * FROM points_history
            WHERE ledger_id = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(ledger_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    // =========================================================================
    // Atomic Writes
    // =========================================================================

    /// Creates the customer's ledger if it doesn't exist yet.
    ///
    /// Concurrent first orders for the same customer race on the
    /// `(customer_id, program_id)` unique key; exactly one insert wins and
    /// every caller then reads the same row.
    ///
    /// ## Returns
    /// `(ledger, created)` where `created` is true only for the caller whose
    /// insert took effect.
    pub async fn create_if_missing(
        &self,
        conn: &mut SqliteConnection,
        customer_id: &str,
        program: &LoyaltyProgram,
        now: DateTime<Utc>,
    ) -> DbResult<(CustomerLedger, bool)> {
        let seed = CustomerLedger::seed(Uuid::new_v4().to_string(), customer_id, program, now);

        let result = sqlx::query(
            r#"
            INSERT INTO customer_ledgers (
                id, customer_id, program_id,
                current_points, total_points_earned, total_points_redeemed,
                current_level_id, is_first_transaction, transaction_count,
                last_transaction_date, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ON CONFLICT (customer_id, program_id) DO NOTHING
            "#,
        )
        .bind(&seed.id)
        .bind(&seed.customer_id)
        .bind(&seed.program_id)
        .bind(seed.current_points)
        .bind(seed.total_points_earned)
        .bind(seed.total_points_redeemed)
        .bind(&seed.current_level_id)
        .bind(seed.is_first_transaction)
        .bind(seed.transaction_count)
        .bind(seed.last_transaction_date)
        .bind(seed.created_at)
        .bind(seed.updated_at)
        .execute(&mut *conn)
        .await?;

        let created = result.rows_affected() == 1;
        if created {
            debug!(
                customer_id = %customer_id,
                program = %program.name,
                registration_points = seed.current_points,
                "Created customer ledger"
            );
        }

        let ledger = self
            .load(conn, customer_id, &program.id)
            .await?
            .ok_or_else(|| DbError::not_found("CustomerLedger", customer_id))?;

        Ok((ledger, created))
    }

    /// Clears the first-transaction flag if it is still set.
    ///
    /// Returns true for exactly one caller per ledger: the bonus goes to
    /// whoever flips the flag.
    pub async fn consume_first_transaction(
        &self,
        conn: &mut SqliteConnection,
        ledger_id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE customer_ledgers
            SET is_first_transaction = 0, updated_at = ?2
            WHERE id = ?1 AND is_first_transaction = 1
            "#,
        )
        .bind(ledger_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Credits `points` and counts the order.
    pub async fn apply_credit(
        &self,
        conn: &mut SqliteConnection,
        ledger_id: &str,
        points: i64,
        now: DateTime<Utc>,
    ) -> DbResult<CustomerLedger> {
        debug!(ledger_id = %ledger_id, points, "Applying credit");

        sqlx::query_as(
            r#"
            UPDATE customer_ledgers
            SET current_points = current_points + ?2,
                total_points_earned = total_points_earned + ?2,
                transaction_count = transaction_count + 1,
                last_transaction_date = ?3,
                updated_at = ?3
            WHERE id = ?1
            RETURNING *
            "#,
        )
        .bind(ledger_id)
        .bind(points)
        .bind(now)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("CustomerLedger", ledger_id))
    }

    /// Moves the ledger to `level_id` and credits the tier bonus.
    ///
    /// Compare-and-set on the recorded tier: if another writer already
    /// moved it away from `expected_level_id`, nothing changes and `None`
    /// is returned.
    pub async fn apply_level_up(
        &self,
        conn: &mut SqliteConnection,
        ledger_id: &str,
        expected_level_id: Option<&str>,
        level_id: &str,
        bonus_points: i64,
        now: DateTime<Utc>,
    ) -> DbResult<Option<CustomerLedger>> {
        debug!(ledger_id = %ledger_id, level_id = %level_id, bonus_points, "Applying level up");

        let ledger = sqlx::query_as(
            r#"
            UPDATE customer_ledgers
            SET current_level_id = ?3,
                current_points = current_points + ?4,
                total_points_earned = total_points_earned + ?4,
                updated_at = ?5
            WHERE id = ?1 AND current_level_id IS ?2
            RETURNING *
            "#,
        )
        .bind(ledger_id)
        .bind(expected_level_id)
        .bind(level_id)
        .bind(bonus_points)
        .bind(now)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(ledger)
    }

    /// Spends `points` if the balance covers them.
    ///
    /// ## Returns
    /// * `Ok(Some(ledger))` - Balance after the redemption
    /// * `Ok(None)` - No ledger, or balance below `points`; nothing changed
    pub async fn apply_redemption(
        &self,
        conn: &mut SqliteConnection,
        customer_id: &str,
        program_id: &str,
        points: i64,
        now: DateTime<Utc>,
    ) -> DbResult<Option<CustomerLedger>> {
        debug!(customer_id = %customer_id, points, "Applying redemption");

        let ledger = sqlx::query_as(
            r#"
            UPDATE customer_ledgers
            SET current_points = current_points - ?3,
                total_points_redeemed = total_points_redeemed + ?3,
                updated_at = ?4
            WHERE customer_id = ?1
              AND program_id = ?2
              AND current_points >= ?3
            RETURNING *
            "#,
        )
        .bind(customer_id)
        .bind(program_id)
        .bind(points)
        .bind(now)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(ledger)
    }

    /// Appends an audit row.
    pub async fn record_history(
        &self,
        conn: &mut SqliteConnection,
        entry: &PointsHistoryEntry,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO points_history (
                id, ledger_id, kind, points, discount_amount,
                balance_after, order_id, level_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.ledger_id)
        .bind(entry.kind)
        .bind(entry.points)
        .bind(entry.discount_amount)
        .bind(entry.balance_after)
        .bind(&entry.order_id)
        .bind(&entry.level_id)
        .bind(entry.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
