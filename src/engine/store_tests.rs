//! State Store Tests
//!
//! Exercises every store operation contract: budget paths, holding counters,
//! the period log, SP awards, and the two rankings with their deterministic
//! tiebreaks.

use crate::engine::amount::{to_amount, Amount};
use crate::engine::mechanism::MechanismTag;
use crate::engine::store::{StoreError, TournamentStore};
use crate::engine::types::{Holding, PeriodRecord};

fn make_store(ids: &[&str]) -> TournamentStore {
    let ids: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
    TournamentStore::new(to_amount(10_000.0), 3, &ids).unwrap()
}

fn holding(stage: usize, period: usize, tokens: f64, price: f64, ppt: f64) -> Holding {
    Holding {
        stage,
        period,
        tokens: to_amount(tokens),
        price: to_amount(price),
        points_per_token: to_amount(ppt),
    }
}

fn record(stage: usize, period: usize, absolute: usize) -> PeriodRecord {
    PeriodRecord {
        stage,
        period,
        absolute_period: absolute,
        tokens_available: to_amount(100.0),
        floor: to_amount(10.0),
        points_per_token: to_amount(1.0),
        clearing_price: to_amount(10.0),
        allocations: Vec::new(),
        winner: None,
        rescinded: None,
        bids: Vec::new(),
        mechanism: MechanismTag::SecondPrice,
    }
}

// =============================================================================
// BUDGET
// =============================================================================

#[test]
fn test_deduct_enforces_non_negativity() {
    let mut store = make_store(&["x"]);
    let balance = store.deduct_budget("x", to_amount(4_000.0)).unwrap();
    assert_eq!(balance, to_amount(6_000.0));

    let err = store.deduct_budget("x", to_amount(6_000.01)).unwrap_err();
    assert!(matches!(err, StoreError::InsufficientBudget { .. }));
    // Balance untouched by the failed deduction.
    assert_eq!(store.agent("x").unwrap().budget, to_amount(6_000.0));
}

#[test]
fn test_refund_always_succeeds() {
    let mut store = make_store(&["x"]);
    store.refund_budget("x", to_amount(500.0)).unwrap();
    assert_eq!(store.agent("x").unwrap().budget, to_amount(10_500.0));
}

#[test]
fn test_unknown_agent_errors() {
    let mut store = make_store(&["x"]);
    assert!(matches!(
        store.deduct_budget("ghost", 1),
        Err(StoreError::UnknownAgent(_))
    ));
    assert!(matches!(
        store.refund_budget("ghost", 1),
        Err(StoreError::UnknownAgent(_))
    ));
    assert!(matches!(
        store.award_sp("ghost", 1),
        Err(StoreError::UnknownAgent(_))
    ));
}

#[test]
fn test_duplicate_agent_at_construction() {
    let ids = vec!["x".to_string(), "y".to_string(), "x".to_string()];
    let err = TournamentStore::new(to_amount(100.0), 1, &ids).unwrap_err();
    assert_eq!(err, StoreError::DuplicateAgent("x".into()));
}

// =============================================================================
// HOLDINGS AND DERIVED COUNTERS
// =============================================================================

#[test]
fn test_add_holding_updates_counters() {
    let mut store = make_store(&["x"]);
    store.add_holding("x", holding(0, 0, 100.0, 11.0, 1.0)).unwrap();
    store.add_holding("x", holding(1, 3, 50.0, 12.0, 1.5)).unwrap();

    let agent = store.agent("x").unwrap();
    assert_eq!(agent.stage_tokens[0], to_amount(100.0));
    assert_eq!(agent.stage_tokens[1], to_amount(50.0));
    // 100 x 1.0 + 50 x 1.5 = 175
    assert_eq!(agent.weighted_points, to_amount(175.0));
    store.verify_consistency().unwrap();
}

#[test]
fn test_remove_holding_restores_counters() {
    let mut store = make_store(&["x"]);
    store.add_holding("x", holding(0, 0, 100.0, 11.0, 1.0)).unwrap();
    store.add_holding("x", holding(0, 2, 40.0, 11.5, 1.0)).unwrap();

    let removed = store.remove_holding("x", 0, 0).unwrap().unwrap();
    assert_eq!(removed.tokens, to_amount(100.0));

    let agent = store.agent("x").unwrap();
    assert_eq!(agent.stage_tokens[0], to_amount(40.0));
    assert_eq!(agent.weighted_points, to_amount(40.0));
    store.verify_consistency().unwrap();
}

#[test]
fn test_remove_missing_holding_is_noop() {
    let mut store = make_store(&["x"]);
    assert_eq!(store.remove_holding("x", 0, 5).unwrap(), None);
}

// =============================================================================
// PERIOD LOG
// =============================================================================

#[test]
fn test_append_and_mark_rescinded() {
    let mut store = make_store(&["x"]);
    store.append_record(record(0, 0, 0));
    store.append_record(record(0, 1, 1));

    assert_eq!(store.periods().len(), 2);
    assert_eq!(store.periods()[0].rescinded, None);

    store.mark_rescinded(0, 0);
    assert_eq!(store.periods()[0].rescinded, Some(true));
    assert_eq!(store.periods()[1].rescinded, None);

    // Unknown position is a no-op.
    store.mark_rescinded(2, 7);
    assert_eq!(store.periods().len(), 2);
}

// =============================================================================
// STAGE POINTS
// =============================================================================

#[test]
fn test_award_sp_accumulates() {
    let mut store = make_store(&["x"]);
    store.award_sp("x", 3).unwrap();
    store.award_sp("x", 1).unwrap();
    assert_eq!(store.agent("x").unwrap().sp, 4);
}

// =============================================================================
// RANKINGS
// =============================================================================

#[test]
fn test_stage_ranking_excludes_zero_and_breaks_ties_by_id() {
    let mut store = make_store(&["carol", "alice", "bob", "dave"]);
    store.add_holding("bob", holding(0, 0, 50.0, 11.0, 1.0)).unwrap();
    store.add_holding("carol", holding(0, 1, 50.0, 11.0, 1.0)).unwrap();
    store.add_holding("alice", holding(0, 2, 80.0, 11.0, 1.0)).unwrap();
    // dave has tokens only in another stage.
    store.add_holding("dave", holding(1, 0, 10.0, 11.0, 1.5)).unwrap();

    let ranking = store.stage_ranking(0);
    let ids: Vec<&str> = ranking.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["alice", "bob", "carol"]);
}

#[test]
fn test_overall_ranking_by_weighted_points() {
    let mut store = make_store(&["b", "a", "c"]);
    store.add_holding("b", holding(0, 0, 100.0, 11.0, 1.0)).unwrap();
    store.add_holding("a", holding(1, 0, 100.0, 11.0, 1.5)).unwrap();
    // c holds nothing; ties at zero break lexicographically after the others.

    let ranking = store.overall_ranking();
    let ids: Vec<&str> = ranking.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(ranking[0].1, to_amount(150.0));
}

#[test]
fn test_consistency_check_catches_divergence() {
    let mut store = make_store(&["x"]);
    store.add_holding("x", holding(0, 0, 100.0, 11.0, 1.0)).unwrap();
    store.verify_consistency().unwrap();

    // A refund cannot break consistency; only direct state corruption could,
    // and that is exactly what the checker exists to catch in debug runs.
    store.refund_budget("x", to_amount(1.0)).unwrap();
    store.verify_consistency().unwrap();

    let total: Amount = store.agent("x").unwrap().stage_tokens.iter().sum();
    assert_eq!(total, to_amount(100.0));
}
