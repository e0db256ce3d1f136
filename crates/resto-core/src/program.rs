//! # Program Registry
//!
//! Decides which loyalty program applies to an outlet.
//!
//! ## Resolution Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  resolve_program(candidates, outlet_id)                                 │
//! │                                                                         │
//! │  1. Drop inactive programs                                              │
//! │  2. Outlet-scoped program for this outlet?  ──► pick it                 │
//! │  3. Else global program (outlet_id = NULL)? ──► pick it                 │
//! │  4. Else None  (loyalty not applicable, never an error)                 │
//! │                                                                         │
//! │  Ties inside a step: oldest created_at, then lowest id.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::types::LoyaltyProgram;

/// Picks the single program that applies to `outlet_id`.
///
/// `candidates` may contain programs for other outlets and inactive
/// programs; both are ignored. With no outlet context only global
/// programs are eligible.
///
/// ## Example
/// ```rust,ignore
/// let program = resolve_program(&programs, Some("outlet-1"));
/// ```
pub fn resolve_program<'a>(
    candidates: &'a [LoyaltyProgram],
    outlet_id: Option<&str>,
) -> Option<&'a LoyaltyProgram> {
    let scoped = outlet_id.and_then(|outlet| {
        earliest(
            candidates
                .iter()
                .filter(|p| p.is_active && p.outlet_id.as_deref() == Some(outlet)),
        )
    });

    scoped.or_else(|| earliest(candidates.iter().filter(|p| p.is_active && p.is_global())))
}

fn earliest<'a>(programs: impl Iterator<Item = &'a LoyaltyProgram>) -> Option<&'a LoyaltyProgram> {
    programs.min_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn program(id: &str, outlet: Option<&str>, active: bool, age_days: i64) -> LoyaltyProgram {
        let created = Utc::now() - Duration::days(age_days);
        LoyaltyProgram {
            id: id.to_string(),
            name: format!("Program {}", id),
            outlet_id: outlet.map(str::to_string),
            is_active: active,
            points_per_rp: 100,
            registration_points: 0,
            first_transaction_points: 0,
            points_to_discount_ratio: 1,
            discount_value_per_point: 50,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_outlet_scoped_beats_global() {
        let programs = vec![
            program("global", None, true, 30),
            program("scoped", Some("outlet-1"), true, 1),
        ];

        let resolved = resolve_program(&programs, Some("outlet-1")).unwrap();
        assert_eq!(resolved.id, "scoped");
    }

    #[test]
    fn test_falls_back_to_global() {
        let programs = vec![
            program("global", None, true, 30),
            program("other-outlet", Some("outlet-2"), true, 1),
        ];

        let resolved = resolve_program(&programs, Some("outlet-1")).unwrap();
        assert_eq!(resolved.id, "global");
    }

    #[test]
    fn test_no_outlet_context_uses_global_only() {
        let programs = vec![program("scoped", Some("outlet-1"), true, 1)];
        assert!(resolve_program(&programs, None).is_none());

        let programs = vec![
            program("scoped", Some("outlet-1"), true, 1),
            program("global", None, true, 1),
        ];
        assert_eq!(resolve_program(&programs, None).unwrap().id, "global");
    }

    #[test]
    fn test_inactive_programs_never_resolve() {
        let programs = vec![
            program("scoped", Some("outlet-1"), false, 1),
            program("global", None, false, 1),
        ];
        assert!(resolve_program(&programs, Some("outlet-1")).is_none());

        let programs = vec![
            program("scoped", Some("outlet-1"), false, 1),
            program("global", None, true, 1),
        ];
        assert_eq!(
            resolve_program(&programs, Some("outlet-1")).unwrap().id,
            "global"
        );
    }

    #[test]
    fn test_ties_are_deterministic() {
        let a = program("b-newer", Some("outlet-1"), true, 1);
        let b = program("a-older", Some("outlet-1"), true, 5);

        let forward = vec![a.clone(), b.clone()];
        let backward = vec![b, a];
        assert_eq!(resolve_program(&forward, Some("outlet-1")).unwrap().id, "a-older");
        assert_eq!(resolve_program(&backward, Some("outlet-1")).unwrap().id, "a-older");

        let mut same_age = program("zz", None, true, 3);
        let mut other = program("aa", None, true, 3);
        same_age.created_at = other.created_at;
        other.updated_at = other.created_at;
        let programs = vec![same_age, other];
        assert_eq!(resolve_program(&programs, None).unwrap().id, "aa");
    }

    #[test]
    fn test_empty_registry() {
        assert!(resolve_program(&[], Some("outlet-1")).is_none());
        assert!(resolve_program(&[], None).is_none());
    }
}
