//! Tournament Result
//!
//! The value handed back to callers when a tournament completes: configuration
//! echo, final leaderboard, winner, the full period log, and per-agent
//! summaries. Aggregates are exposed as native floats; the period log keeps
//! the exact fixed-point values.

use crate::engine::amount::{div_fixed, from_amount, mul_fixed, Amount};
use crate::engine::config::TournamentConfig;
use crate::engine::store::AgentState;
use crate::engine::types::{AgentId, PeriodRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Final standing of one agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub agent: AgentId,
    pub stage_tokens: Vec<f64>,
    pub weighted_points: f64,
    pub sp: u32,
}

/// Per-agent tournament summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSummary {
    pub sp: u32,
    pub weighted_points: f64,
    pub stage_tokens: Vec<f64>,
    pub budget_spent: f64,
    pub budget_remaining: f64,
    /// Periods won and retained; rescinded wins are excluded.
    pub periods_won: u32,
    pub rescinds_made: u32,
    /// Token-weighted mean price over retained holdings.
    pub mean_price: f64,
    /// Weighted points per unit of budget spent. Zero when nothing was spent.
    pub points_per_budget: f64,
}

/// Everything a caller gets back from a completed tournament.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentResult {
    pub config: TournamentConfig,
    /// Sorted by SP descending, weighted points descending, agent id ascending.
    pub leaderboard: Vec<LeaderboardEntry>,
    /// Winner's agent id; empty when the tournament had no agents.
    pub winner: AgentId,
    pub periods: Vec<PeriodRecord>,
    pub summaries: BTreeMap<AgentId, AgentSummary>,
}

/// Derive the summary for one agent's final state.
pub(crate) fn summarize(state: &AgentState, starting_budget: Amount) -> AgentSummary {
    let spent = starting_budget - state.budget;
    let total_tokens: Amount = state.holdings.iter().map(|h| h.tokens).sum();
    let total_paid: Amount = state
        .holdings
        .iter()
        .map(|h| mul_fixed(h.price, h.tokens))
        .sum();
    let mean_price = if total_tokens > 0 {
        from_amount(div_fixed(total_paid, total_tokens))
    } else {
        0.0
    };
    let points_per_budget = if spent > 0 {
        from_amount(div_fixed(state.weighted_points, spent))
    } else {
        0.0
    };
    AgentSummary {
        sp: state.sp,
        weighted_points: from_amount(state.weighted_points),
        stage_tokens: state.stage_tokens.iter().copied().map(from_amount).collect(),
        budget_spent: from_amount(spent),
        budget_remaining: from_amount(state.budget),
        periods_won: state.holdings.len() as u32,
        rescinds_made: state.rescinds_made,
        mean_price,
        points_per_budget,
    }
}
