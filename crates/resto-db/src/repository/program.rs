//! # Program Repository
//!
//! Loyalty program storage and the registry lookup used by the engine.
//!
//! ## Registry Lookup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  resolve(conn, Some("outlet-7"))                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SELECT * FROM loyalty_programs                                        │
//! │  WHERE is_active = 1 AND (outlet_id = 'outlet-7' OR outlet_id IS NULL) │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌──────────────────────────────────────────┐                          │
//! │  │ Dine-In Rewards  │ outlet-7 │ 2024-01-03 │ ← scoped wins            │
//! │  │ Resto Rewards    │ NULL     │ 2023-11-20 │   global fallback        │
//! │  └──────────────────────────────────────────┘                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  resto_core::resolve_program (tie-break: oldest, then lowest id)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use resto_core::validation::validate_program;
use resto_core::{resolve_program, LoyaltyProgram};

/// Repository for loyalty program operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.programs();
///
/// // Admin: register a program
/// repo.insert(&program).await?;
///
/// // Engine: resolve inside an open transaction
/// let program = repo.resolve(&mut conn, Some("outlet-7")).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProgramRepository {
    pool: SqlitePool,
}

impl ProgramRepository {
    /// Creates a new ProgramRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProgramRepository { pool }
    }

    /// Resolves the single program that applies to `outlet_id`.
    ///
    /// Runs on the caller's connection so it sees the caller's
    /// uncommitted configuration, if any.
    ///
    /// ## Returns
    /// * `Ok(Some(program))` - An active program applies
    /// * `Ok(None)` - Loyalty is not configured for this outlet
    pub async fn resolve(
        &self,
        conn: &mut SqliteConnection,
        outlet_id: Option<&str>,
    ) -> DbResult<Option<LoyaltyProgram>> {
        let candidates: Vec<LoyaltyProgram> = sqlx::query_as(
            r#"
            SELECT * FROM loyalty_programs
            WHERE is_active = 1
              AND (outlet_id IS NULL OR outlet_id = ?1)
            "#,
        )
        .bind(outlet_id)
        .fetch_all(&mut *conn)
        .await?;

        let resolved = resolve_program(&candidates, outlet_id).cloned();

        debug!(
            outlet_id = ?outlet_id,
            candidates = candidates.len(),
            program = ?resolved.as_ref().map(|p| p.name.as_str()),
            "Resolved loyalty program"
        );

        Ok(resolved)
    }

    /// Inserts a new program.
    ///
    /// ## Returns
    /// * `Ok(LoyaltyProgram)` - The stored program
    /// * `Err(DbError::Loyalty)` - Rates fail validation
    /// * `Err(DbError::UniqueViolation)` - Name already taken
    pub async fn insert(&self, program: &LoyaltyProgram) -> DbResult<LoyaltyProgram> {
        validate_program(program)?;

        debug!(id = %program.id, name = %program.name, outlet_id = ?program.outlet_id, "Inserting loyalty program");

        sqlx::query(
            r#"
            INSERT INTO loyalty_programs (
                id, name, outlet_id, is_active,
                points_per_rp, registration_points, first_transaction_points,
                points_to_discount_ratio, discount_value_per_point,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&program.id)
        .bind(&program.name)
        .bind(&program.outlet_id)
        .bind(program.is_active)
        .bind(program.points_per_rp)
        .bind(program.registration_points)
        .bind(program.first_transaction_points)
        .bind(program.points_to_discount_ratio)
        .bind(program.discount_value_per_point)
        .bind(program.created_at)
        .bind(program.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(program.clone())
    }

    /// Gets a program by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<LoyaltyProgram>> {
        let program = sqlx::query_as("SELECT * FROM loyalty_programs WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(program)
    }

    /// Lists every program, active or not, oldest first.
    pub async fn list(&self) -> DbResult<Vec<LoyaltyProgram>> {
        let programs = sqlx::query_as("SELECT * FROM loyalty_programs ORDER BY created_at, id")
            .fetch_all(&self.pool)
            .await?;

        Ok(programs)
    }

    /// Activates or retires a program.
    ///
    /// Retiring a program stops resolution; existing ledgers are kept.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        debug!(id = %id, active, "Setting loyalty program active flag");

        let result = sqlx::query(
            r#"
            UPDATE loyalty_programs
            SET is_active = ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("LoyaltyProgram", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use chrono::{Duration, Utc};
    use resto_core::LoyaltyProgram;

    use super::*;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn program(id: &str, name: &str, outlet: Option<&str>, age_days: i64) -> LoyaltyProgram {
        let p = LoyaltyProgram::new(id, name, 100, Utc::now() - Duration::days(age_days));
        match outlet {
            Some(outlet) => p.for_outlet(outlet),
            None => p,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = db().await;
        let repo = db.programs();

        let p = program("p-1", "Resto Rewards", None, 0).with_registration_points(50);
        repo.insert(&p).await.unwrap();

        let loaded = repo.get_by_id("p-1").await.unwrap().unwrap();
        assert_eq!(loaded.name, "Resto Rewards");
        assert_eq!(loaded.registration_points, 50);
        assert!(loaded.is_active);
        assert!(loaded.is_global());

        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_rejects_invalid_rates() {
        let db = db().await;
        let p = LoyaltyProgram::new("p-1", "Broken", 0, Utc::now());

        let err = db.programs().insert(&p).await.unwrap_err();
        assert!(matches!(err, DbError::Loyalty(_)));
    }

    #[tokio::test]
    async fn test_duplicate_name() {
        let db = db().await;
        let repo = db.programs();

        repo.insert(&program("p-1", "Resto Rewards", None, 0)).await.unwrap();
        let err = repo
            .insert(&program("p-2", "Resto Rewards", Some("outlet-1"), 0))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_resolve_prefers_outlet_then_global() {
        let db = db().await;
        let repo = db.programs();

        repo.insert(&program("global", "Everywhere", None, 10)).await.unwrap();
        repo.insert(&program("scoped", "Outlet Seven", Some("outlet-7"), 1)).await.unwrap();
        repo.insert(&program("other", "Outlet Nine", Some("outlet-9"), 20)).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();

        let p = repo.resolve(&mut conn, Some("outlet-7")).await.unwrap().unwrap();
        assert_eq!(p.id, "scoped");

        let p = repo.resolve(&mut conn, Some("outlet-1")).await.unwrap().unwrap();
        assert_eq!(p.id, "global");

        let p = repo.resolve(&mut conn, None).await.unwrap().unwrap();
        assert_eq!(p.id, "global");
    }

    #[tokio::test]
    async fn test_set_active_hides_program() {
        let db = db().await;
        let repo = db.programs();

        repo.insert(&program("global", "Everywhere", None, 0)).await.unwrap();
        repo.set_active("global", false).await.unwrap();

        {
            let mut conn = db.pool().acquire().await.unwrap();
            assert!(repo.resolve(&mut conn, None).await.unwrap().is_none());
        }

        let listed = repo.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(!listed[0].is_active);

        let err = repo.set_active("missing", true).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
