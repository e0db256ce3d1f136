//! Concurrent access to one customer's ledger over a multi-connection pool.

mod common;

use common::*;
use resto_db::EngineConfig;
use std::time::Duration;

fn patient_engine(db: &resto_db::Database) -> resto_db::PointsEngine {
    db.engine(EngineConfig::default().operation_timeout(Duration::from_secs(30)))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_orders_pay_one_bonus() {
    let temp = TempDb::new(8).await;
    insert_rewards_program(&temp.db).await;
    let engine = patient_engine(&temp.db);

    let mut handles = Vec::new();
    for _ in 0..20 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine.credit_for_order(&order(10_000, "cust-race"), None).await
        }));
    }

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }

    let credited: Vec<_> = results.iter().filter(|r| r.program_name.is_some()).collect();
    assert!(!credited.is_empty());
    assert_eq!(credited.iter().filter(|r| r.is_first_transaction).count(), 1);

    let earned: i64 = credited.iter().map(|r| r.points_earned).sum();
    let ledger = temp
        .db
        .ledgers()
        .find("cust-race", PROGRAM_ID)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ledger.current_points, 50 + earned);
    assert_eq!(ledger.transaction_count, credited.len() as i64);
    assert_eq!(ledger.total_points_earned, ledger.current_points);

    let history = temp.db.ledgers().history(&ledger.id).await.unwrap();
    assert_eq!(
        history
            .iter()
            .filter(|e| e.kind == resto_core::PointsEntryKind::Registration)
            .count(),
        1
    );

    temp.cleanup().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_redemptions_never_overdraw() {
    let temp = TempDb::new(8).await;
    insert_rewards_program(&temp.db).await;
    let engine = patient_engine(&temp.db);

    // 50 + 850 + 100 = 1,000 points to fight over.
    let seeded = engine.credit_for_order(&order(85_000, "cust-spend"), None).await;
    assert_eq!(seeded.total_points, 1_000);

    let mut handles = Vec::new();
    for _ in 0..10 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine.redeem_points(&redeem(300, "cust-spend"), None).await
        }));
    }

    let mut used = 0;
    let mut successes = 0;
    for handle in handles {
        let result = handle.await.unwrap();
        if result.points_used > 0 {
            assert_eq!(result.points_used, 300);
            successes += 1;
            used += result.points_used;
        }
    }

    let ledger = temp
        .db
        .ledgers()
        .find("cust-spend", PROGRAM_ID)
        .await
        .unwrap()
        .unwrap();
    assert!(successes <= 3);
    assert!(ledger.current_points >= 0);
    assert_eq!(ledger.current_points + used, 1_000);
    assert_eq!(ledger.total_points_redeemed, used);

    temp.cleanup().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mixed_credits_and_redemptions_balance() {
    let temp = TempDb::new(8).await;
    insert_rewards_program(&temp.db).await;
    insert_level(&temp.db, "Silver", 500, 50).await;
    let engine = patient_engine(&temp.db);

    engine.credit_for_order(&order(25_000, "cust-mixed"), None).await;

    let mut credits = Vec::new();
    let mut redemptions = Vec::new();
    for i in 0..12 {
        let engine = engine.clone();
        if i % 2 == 0 {
            credits.push(tokio::spawn(async move {
                engine.credit_for_order(&order(20_000, "cust-mixed"), None).await
            }));
        } else {
            redemptions.push(tokio::spawn(async move {
                engine.redeem_points(&redeem(150, "cust-mixed"), None).await
            }));
        }
    }

    let mut level_bonus = 0;
    let mut earned = 0;
    for handle in credits {
        let result = handle.await.unwrap();
        earned += result.points_earned;
        level_bonus += result.level_up_bonus_points;
    }
    let mut used = 0;
    for handle in redemptions {
        used += handle.await.unwrap().points_used;
    }

    let ledger = temp
        .db
        .ledgers()
        .find("cust-mixed", PROGRAM_ID)
        .await
        .unwrap()
        .unwrap();

    // Registration and the first order came before the race.
    assert_eq!(ledger.current_points, 400 + earned + level_bonus - used);
    assert_eq!(ledger.total_points_redeemed, used);
    assert!(level_bonus <= 50);

    temp.cleanup().await;
}
