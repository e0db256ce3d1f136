//! Shared fixtures for the loyalty integration tests.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use resto_core::{CreditRequest, LoyaltyLevel, LoyaltyProgram, Money, RedeemRequest};
use resto_db::{Database, DbConfig, EngineConfig, PointsEngine};
use std::path::PathBuf;
use uuid::Uuid;

pub const PROGRAM_ID: &str = "prog-rewards";

/// Fresh in-memory database with migrations applied.
pub async fn memory_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

/// The program used throughout: 1 point per 100, 50 on registration,
/// 100 on the first order, 50 per redeemed point.
pub fn rewards_program() -> LoyaltyProgram {
    LoyaltyProgram::new(PROGRAM_ID, "Resto Rewards", 100, Utc::now() - Duration::days(30))
        .with_registration_points(50)
        .with_first_transaction_points(100)
        .with_discount_value_per_point(50)
}

pub async fn insert_rewards_program(db: &Database) -> LoyaltyProgram {
    db.programs().insert(&rewards_program()).await.unwrap()
}

pub async fn insert_level(db: &Database, name: &str, required: i64, bonus: i64) -> LoyaltyLevel {
    let level = LoyaltyLevel::new(
        name.to_lowercase(),
        PROGRAM_ID,
        name,
        required,
        bonus,
        Utc::now(),
    );
    db.levels().insert(&level).await.unwrap()
}

pub fn engine(db: &Database) -> PointsEngine {
    db.engine(EngineConfig::default())
}

pub fn order(amount: i64, customer: &str) -> CreditRequest {
    CreditRequest::new(Money::from_minor(amount), Some(customer), None)
}

pub fn redeem(points: i64, customer: &str) -> RedeemRequest {
    RedeemRequest::new(Some(customer), points, None)
}

/// A file-backed database under the temp dir, for multi-connection tests.
pub struct TempDb {
    pub db: Database,
    path: PathBuf,
}

impl TempDb {
    pub async fn new(max_connections: u32) -> Self {
        let path = std::env::temp_dir().join(format!("resto-loyalty-{}.db", Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path).max_connections(max_connections))
            .await
            .unwrap();
        TempDb { db, path }
    }

    pub async fn cleanup(self) {
        self.db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}
