//! Observation Builder
//!
//! Constructs the value each agent receives at the start of a period: position,
//! the agent's own private state, the period framing, the public history with
//! current rescinded flags, and the public leaderboard. The observation is a
//! fully owned copy; holding onto it cannot mutate engine state.

use crate::engine::amount::Amount;
use crate::engine::config::TournamentConfig;
use crate::engine::period::PeriodParams;
use crate::engine::store::TournamentStore;
use crate::engine::types::{AgentId, Holding, PeriodRecord, PrivateRescindInfo};
use serde::{Deserialize, Serialize};

/// Public per-agent leaderboard row. Budgets and pending rescinds of other
/// agents are never part of this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub agent: AgentId,
    pub stage_tokens: Vec<Amount>,
    pub weighted_points: Amount,
    pub sp: u32,
}

/// Everything one agent can see at the start of a period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    // Position
    pub stage: usize,
    pub period: usize,
    pub absolute_period: usize,
    pub periods_remaining_in_stage: usize,
    pub stages_remaining: usize,

    // Agent-private
    pub budget: Amount,
    pub holdings: Vec<Holding>,
    pub weighted_points: Amount,
    pub stage_tokens: Vec<Amount>,
    pub sp: u32,
    pub private_rescinds: Vec<PrivateRescindInfo>,

    // Period framing
    pub tokens_available: Amount,
    pub floor: Amount,
    pub points_per_token: Amount,

    // Public state
    pub history: Vec<PeriodRecord>,
    pub leaderboard: Vec<LeaderboardRow>,
}

/// Build the observation for one agent. Revelation of due rescinds has already
/// happened this period, so `history` reflects post-revelation flags.
pub fn build_observation(
    store: &TournamentStore,
    config: &TournamentConfig,
    params: &PeriodParams,
    agent_id: &str,
) -> Observation {
    let state = store
        .agent(agent_id)
        .expect("observation target is a registered agent");
    let stage_len = config.stages[params.stage].periods;

    let leaderboard = store
        .agents()
        .iter()
        .map(|a| LeaderboardRow {
            agent: a.id.clone(),
            stage_tokens: a.stage_tokens.clone(),
            weighted_points: a.weighted_points,
            sp: a.sp,
        })
        .collect();

    Observation {
        stage: params.stage,
        period: params.period,
        absolute_period: params.absolute_period,
        periods_remaining_in_stage: stage_len - params.period - 1,
        stages_remaining: config.stages.len() - params.stage - 1,
        budget: state.budget,
        holdings: state.holdings.clone(),
        weighted_points: state.weighted_points,
        stage_tokens: state.stage_tokens.clone(),
        sp: state.sp,
        private_rescinds: state.private_info.clone(),
        tokens_available: params.supply,
        floor: params.floor,
        points_per_token: params.points_per_token,
        history: store.periods().to_vec(),
        leaderboard,
    }
}
