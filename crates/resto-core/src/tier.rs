//! # Tier Ladder
//!
//! Decides whether a credit moved a customer onto a higher tier.
//!
//! ## Highest Qualifying Tier
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Ladder (ascending):  Bronze 0 ── Silver 500 ── Gold 2000 ── Plat 5000  │
//! │                                                                         │
//! │  balance 2400  →  scan Bronze ✓  Silver ✓  Gold ✓  Plat ✗ (stop)        │
//! │               →  qualifying tier = Gold                                 │
//! │                                                                         │
//! │  recorded tier Silver, Gold is higher  →  promote, award Gold's bonus   │
//! │  recorded tier Gold                    →  no change, no bonus           │
//! │  recorded tier Plat (balance dropped)  →  no change (never downgrade)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Tiers record the highest level ever reached. Redemptions lower the
//! balance but never the tier, and a tier bonus is paid at most once
//! because the recorded tier only ever moves up.

use crate::types::{CustomerLedger, LoyaltyLevel};

/// A tier change produced by a credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierPromotion<'a> {
    /// The tier the ledger moves to.
    pub level: &'a LoyaltyLevel,
    /// Bonus to fold into the same update. Zero when the tier has none.
    pub bonus_points: i64,
}

/// Returns the highest level whose threshold `points` meets.
///
/// `levels` must be sorted ascending by `required_points`; the scan stops
/// at the first threshold above the balance.
pub fn qualifying_level(levels: &[LoyaltyLevel], points: i64) -> Option<&LoyaltyLevel> {
    let mut reached = None;
    for level in levels {
        if level.required_points > points {
            break;
        }
        reached = Some(level);
    }
    reached
}

/// Evaluates the ledger's balance against the ladder.
///
/// Returns `Some` only when the qualifying tier is strictly higher than the
/// tier recorded on the ledger. A recorded tier that is no longer on the
/// ladder counts as no tier.
pub fn evaluate_tier<'a>(
    ledger: &CustomerLedger,
    levels: &'a [LoyaltyLevel],
) -> Option<TierPromotion<'a>> {
    let reached = qualifying_level(levels, ledger.current_points)?;

    let recorded = ledger
        .current_level_id
        .as_deref()
        .and_then(|id| levels.iter().find(|l| l.id == id));

    if let Some(recorded) = recorded {
        if reached.required_points <= recorded.required_points {
            return None;
        }
    }

    Some(TierPromotion {
        level: reached,
        bonus_points: reached.level_up_bonus_points.max(0),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tests::program;
    use chrono::Utc;

    fn level(id: &str, required: i64, bonus: i64) -> LoyaltyLevel {
        LoyaltyLevel {
            id: id.to_string(),
            program_id: "prog-1".to_string(),
            name: id.to_string(),
            required_points: required,
            level_up_bonus_points: bonus,
            created_at: Utc::now(),
        }
    }

    fn ledger_with(points: i64, level_id: Option<&str>) -> CustomerLedger {
        let mut ledger = CustomerLedger::seed("l-1", "c-1", &program(100, 0, 0), Utc::now());
        ledger.current_points = points;
        ledger.current_level_id = level_id.map(str::to_string);
        ledger
    }

    fn ladder() -> Vec<LoyaltyLevel> {
        vec![
            level("silver", 500, 50),
            level("gold", 2000, 200),
            level("platinum", 5000, 0),
        ]
    }

    #[test]
    fn test_qualifying_level_is_highest_met() {
        let levels = ladder();
        assert_eq!(qualifying_level(&levels, 0), None);
        assert_eq!(qualifying_level(&levels, 499), None);
        assert_eq!(qualifying_level(&levels, 500).unwrap().id, "silver");
        assert_eq!(qualifying_level(&levels, 2400).unwrap().id, "gold");
        assert_eq!(qualifying_level(&levels, 9000).unwrap().id, "platinum");
    }

    #[test]
    fn test_below_first_threshold_no_change() {
        let levels = ladder();
        assert_eq!(evaluate_tier(&ledger_with(450, None), &levels), None);
    }

    #[test]
    fn test_crossing_threshold_awards_bonus() {
        let levels = ladder();
        let promotion = evaluate_tier(&ledger_with(550, None), &levels).unwrap();
        assert_eq!(promotion.level.id, "silver");
        assert_eq!(promotion.bonus_points, 50);
    }

    #[test]
    fn test_same_tier_awards_nothing() {
        let levels = ladder();
        assert_eq!(evaluate_tier(&ledger_with(1500, Some("silver")), &levels), None);
    }

    #[test]
    fn test_skipping_tiers_pays_highest_only() {
        let levels = ladder();
        let promotion = evaluate_tier(&ledger_with(2500, None), &levels).unwrap();
        assert_eq!(promotion.level.id, "gold");
        assert_eq!(promotion.bonus_points, 200);
    }

    #[test]
    fn test_never_downgrades() {
        let levels = ladder();
        // Balance fell below Gold after a redemption; recorded tier stays.
        assert_eq!(evaluate_tier(&ledger_with(600, Some("gold")), &levels), None);
    }

    #[test]
    fn test_tier_without_bonus_still_promotes() {
        let levels = ladder();
        let promotion = evaluate_tier(&ledger_with(6000, Some("gold")), &levels).unwrap();
        assert_eq!(promotion.level.id, "platinum");
        assert_eq!(promotion.bonus_points, 0);
    }

    #[test]
    fn test_unknown_recorded_tier_counts_as_none() {
        let levels = ladder();
        let promotion = evaluate_tier(&ledger_with(600, Some("retired")), &levels).unwrap();
        assert_eq!(promotion.level.id, "silver");
    }

    #[test]
    fn test_empty_ladder() {
        assert_eq!(evaluate_tier(&ledger_with(10_000, None), &[]), None);
    }
}
