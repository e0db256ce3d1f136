//! # Level Repository
//!
//! Tier ladders per program. Ladders are always read in ascending
//! threshold order; the tier scan depends on it.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use resto_core::validation::{validate_ladder, validate_level};
use resto_core::LoyaltyLevel;

/// Repository for tier ladder operations.
#[derive(Debug, Clone)]
pub struct LevelRepository {
    pool: SqlitePool,
}

impl LevelRepository {
    /// Creates a new LevelRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LevelRepository { pool }
    }

    /// Inserts a tier.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Program already has a tier at this threshold
    /// * `Err(DbError::ForeignKeyViolation)` - Program doesn't exist
    pub async fn insert(&self, level: &LoyaltyLevel) -> DbResult<LoyaltyLevel> {
        validate_level(level)?;

        debug!(
            program_id = %level.program_id,
            name = %level.name,
            required_points = level.required_points,
            "Inserting loyalty level"
        );

        sqlx::query(
            r#"
            INSERT INTO loyalty_levels (
                id, program_id, name, required_points, level_up_bonus_points, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&level.id)
        .bind(&level.program_id)
        .bind(&level.name)
        .bind(level.required_points)
        .bind(level.level_up_bonus_points)
        .bind(level.created_at)
        .execute(&self.pool)
        .await?;

        Ok(level.clone())
    }

    /// Loads a program's ladder, ascending by threshold, on the caller's
    /// connection. An empty ladder means the program has no tiers.
    pub async fn ladder(
        &self,
        conn: &mut SqliteConnection,
        program_id: &str,
    ) -> DbResult<Vec<LoyaltyLevel>> {
        let levels: Vec<LoyaltyLevel> = sqlx::query_as(
            r#"
            SELECT * FROM loyalty_levels
            WHERE program_id = ?1
            ORDER BY required_points, id
            "#,
        )
        .bind(program_id)
        .fetch_all(&mut *conn)
        .await?;

        validate_ladder(&levels)?;

        Ok(levels)
    }

    /// Loads a program's ladder on a pooled connection.
    pub async fn list_for_program(&self, program_id: &str) -> DbResult<Vec<LoyaltyLevel>> {
        let mut conn = self.pool.acquire().await?;
        self.ladder(&mut conn, program_id).await
    }

    /// Loads a tier by its ID on the caller's connection.
    pub async fn load(&self, conn: &mut SqliteConnection, id: &str) -> DbResult<Option<LoyaltyLevel>> {
        let level = sqlx::query_as("SELECT * FROM loyalty_levels WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(level)
    }

    /// Gets a tier by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<LoyaltyLevel>> {
        let mut conn = self.pool.acquire().await?;
        self.load(&mut conn, id).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;
    use resto_core::{LoyaltyLevel, LoyaltyProgram};

    async fn db_with_program() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.programs()
            .insert(&LoyaltyProgram::new("prog-1", "Resto Rewards", 100, Utc::now()))
            .await
            .unwrap();
        db
    }

    fn level(id: &str, required: i64, bonus: i64) -> LoyaltyLevel {
        LoyaltyLevel::new(id, "prog-1", id.to_uppercase(), required, bonus, Utc::now())
    }

    #[tokio::test]
    async fn test_ladder_is_sorted_ascending() {
        let db = db_with_program().await;
        let repo = db.levels();

        repo.insert(&level("gold", 2000, 100)).await.unwrap();
        repo.insert(&level("bronze", 0, 0)).await.unwrap();
        repo.insert(&level("silver", 500, 50)).await.unwrap();

        let ladder = repo.list_for_program("prog-1").await.unwrap();
        let ids: Vec<&str> = ladder.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["bronze", "silver", "gold"]);

        assert!(repo.list_for_program("other").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_threshold_rejected() {
        let db = db_with_program().await;
        let repo = db.levels();

        repo.insert(&level("silver", 500, 50)).await.unwrap();
        let err = repo.insert(&level("silver-2", 500, 10)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_unknown_program_rejected() {
        let db = db_with_program().await;
        let orphan = LoyaltyLevel::new("x", "nope", "X", 10, 0, Utc::now());

        let err = db.levels().insert(&orphan).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let db = db_with_program().await;
        db.levels().insert(&level("silver", 500, 50)).await.unwrap();

        let loaded = db.levels().get_by_id("silver").await.unwrap().unwrap();
        assert_eq!(loaded.level_up_bonus_points, 50);
        assert!(db.levels().get_by_id("gold").await.unwrap().is_none());
    }
}
