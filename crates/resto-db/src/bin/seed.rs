//! # Seed Data Generator
//!
//! Creates a loyalty database with a demo program for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./resto_dev.db
//! cargo run -p resto-db --bin seed
//!
//! # Specify database path
//! cargo run -p resto-db --bin seed -- --db ./data/loyalty.db
//!
//! # Also run a credit and a redemption and print the standing
//! cargo run -p resto-db --bin seed -- --demo
//! ```
//!
//! ## Generated Data
//! - One global program, "Resto Rewards": 1 point per Rp 100, 50 points on
//!   registration, 100 on the first order, each point worth Rp 50
//! - A three-tier ladder: Silver 500 (+50), Gold 2,000 (+150), Platinum
//!   5,000 (+500)

use chrono::Utc;
use resto_core::{CreditRequest, LoyaltyLevel, LoyaltyProgram, Money, RedeemRequest};
use resto_db::{Database, DbConfig, EngineConfig};
use std::env;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const PROGRAM_NAME: &str = "Resto Rewards";

/// (name, required_points, level_up_bonus_points)
const LADDER: &[(&str, i64, i64)] = &[
    ("Silver", 500, 50),
    ("Gold", 2_000, 150),
    ("Platinum", 5_000, 500),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./resto_dev.db");
    let mut demo = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--demo" => demo = true,
            "--help" | "-h" => {
                println!("Resto POS Loyalty Seed");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./resto_dev.db)");
                println!("      --demo         Credit and redeem for a demo customer");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Resto POS Loyalty Seed");
    println!("=========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.programs().list().await?;
    let program = match existing.into_iter().find(|p| p.name == PROGRAM_NAME) {
        Some(program) => {
            println!("⚠ Program '{}' already exists, skipping seed", PROGRAM_NAME);
            program
        }
        None => seed_program(&db).await?,
    };

    if demo {
        run_demo(&db, &program).await;
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Inserts the demo program and its ladder.
async fn seed_program(db: &Database) -> Result<LoyaltyProgram, Box<dyn std::error::Error>> {
    let now = Utc::now();

    let program = LoyaltyProgram::new(Uuid::new_v4().to_string(), PROGRAM_NAME, 100, now)
        .with_registration_points(50)
        .with_first_transaction_points(100)
        .with_discount_value_per_point(50);
    let program = db.programs().insert(&program).await?;
    println!("✓ Created program '{}'", program.name);

    for (name, required, bonus) in LADDER {
        let level = LoyaltyLevel::new(
            Uuid::new_v4().to_string(),
            program.id.clone(),
            *name,
            *required,
            *bonus,
            now,
        );
        db.levels().insert(&level).await?;
        println!("  Tier {:<9} from {:>5} points, bonus {}", name, required, bonus);
    }

    Ok(program)
}

/// Walks a demo customer through two orders and a redemption.
async fn run_demo(db: &Database, program: &LoyaltyProgram) {
    let engine = db.engine(EngineConfig::default());
    let customer = format!("demo-{}", &Uuid::new_v4().to_string()[..8]);

    println!();
    println!("Demo customer: {}", customer);

    for (order, amount) in [("order-1", 25_000), ("order-2", 30_000)] {
        let request = CreditRequest::new(Money::from_minor(amount), Some(customer.as_str()), None)
            .with_order_id(order);
        let credit = engine.credit_for_order(&request, None).await;
        println!(
            "  {} for {}: +{} points (bonus {}, tier bonus {}), balance {}{}",
            order,
            Money::from_minor(amount),
            credit.points_earned,
            credit.bonus_points,
            credit.level_up_bonus_points,
            credit.total_points,
            credit
                .new_tier
                .map(|t| format!(", reached {}", t))
                .unwrap_or_default()
        );
    }

    let quote = engine.quote_redemption(None, 200, None).await;
    println!("  200 points are worth {}", quote);

    let redeem = engine
        .redeem_points(&RedeemRequest::new(Some(customer.as_str()), 200, None), None)
        .await;
    println!(
        "  Redeemed {} points for {}, {} left",
        redeem.points_used, redeem.discount_amount, redeem.remaining_points
    );

    let standing = engine.get_standing(Some(customer.as_str()), None, None).await;
    println!(
        "  Standing in '{}': {} points, tier {}, earned {}, redeemed {}",
        standing.program_name.as_deref().unwrap_or(&program.name),
        standing.available_points,
        standing.current_level.as_deref().unwrap_or("-"),
        standing.total_earned,
        standing.total_redeemed
    );

    match serde_json::to_string_pretty(&standing) {
        Ok(json) => println!("  Balance screen payload:\n{}", json),
        Err(e) => eprintln!("  Failed to serialize standing: {}", e),
    }
}

/// Initializes logging. `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,resto=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
