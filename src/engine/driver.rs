//! Tournament Driver
//!
//! Owns the store and the registered agents, iterates stages and periods,
//! reveals due rescinds at period start, awards stage SP at stage end and the
//! overall bonus after the terminal stage, and assembles the final result.
//! Strictly sequential: one period at a time, agents consulted in registration
//! order, no suspension points.

use crate::engine::agent::BiddingAgent;
use crate::engine::amount::from_amount;
use crate::engine::config::{ConfigError, TournamentConfig};
use crate::engine::mechanism::make_mechanism;
use crate::engine::period::{PeriodParams, PeriodRunner};
use crate::engine::result::{summarize, LeaderboardEntry, TournamentResult};
use crate::engine::store::{StoreError, TournamentStore};
use crate::engine::types::{AgentId, Phase};
use anyhow::Result;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Fatal construction failures.
#[derive(Debug)]
pub enum TournamentError {
    Config(ConfigError),
    DuplicateAgent(AgentId),
}

impl std::fmt::Display for TournamentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentError::Config(err) => write!(f, "invalid configuration: {}", err),
            TournamentError::DuplicateAgent(id) => {
                write!(f, "duplicate agent identifier '{}'", id)
            }
        }
    }
}

impl std::error::Error for TournamentError {}

impl From<ConfigError> for TournamentError {
    fn from(err: ConfigError) -> Self {
        TournamentError::Config(err)
    }
}

/// One tournament: configuration, agents, and the state store it owns.
pub struct Tournament {
    config: TournamentConfig,
    agents: Vec<Box<dyn BiddingAgent>>,
    store: TournamentStore,
    phase: Phase,
}

impl Tournament {
    /// Validate the configuration and agent identifiers and build the zeroed
    /// state. Both failure modes are fatal; no tournament exists afterwards.
    pub fn new(
        config: TournamentConfig,
        agents: Vec<Box<dyn BiddingAgent>>,
    ) -> Result<Self, TournamentError> {
        config.validate()?;
        let ids: Vec<AgentId> = agents.iter().map(|a| a.id().to_string()).collect();
        let store = TournamentStore::new(config.starting_budget, config.stages.len(), &ids)
            .map_err(|err| match err {
                StoreError::DuplicateAgent(id) => TournamentError::DuplicateAgent(id),
                other => unreachable!("store construction only fails on duplicates: {}", other),
            })?;
        Ok(Self {
            config,
            agents,
            store,
            phase: Phase::Setup,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Drive the tournament to completion and produce the result. Consumes
    /// the tournament; all engine state is destroyed with it.
    pub fn run(mut self) -> Result<TournamentResult> {
        self.phase = Phase::StageActive;
        let total_periods = self.config.total_periods();
        info!(
            agents = self.agents.len(),
            stages = self.config.stages.len(),
            total_periods,
            "tournament started"
        );

        let mut absolute_period = 0;
        for stage in 0..self.config.stages.len() {
            let stage_cfg = self.config.stages[stage].clone();
            let base_share = stage_cfg.base_share();

            for period in 0..stage_cfg.periods {
                let revealed = self.store.reveal_due_rescinds(absolute_period);
                for rescind in &revealed {
                    debug!(
                        agent = %rescind.agent,
                        source_stage = rescind.stage,
                        source_period = rescind.period,
                        tokens = rescind.tokens,
                        "rescind revealed"
                    );
                }

                let supply = base_share + self.store.supply_due(absolute_period);
                let params = PeriodParams {
                    stage,
                    period,
                    absolute_period,
                    supply,
                    floor: stage_cfg.floor,
                    points_per_token: stage_cfg.points_per_token,
                    mechanism: stage_cfg.mechanism,
                    max_bids: stage_cfg.max_bids_per_agent,
                    rescind_allowed: absolute_period + 2 < total_periods,
                };
                let mechanism = make_mechanism(stage_cfg.mechanism);
                PeriodRunner::new(&mut self.store, &self.config).run(
                    &mut self.agents,
                    mechanism.as_ref(),
                    &params,
                )?;

                debug_assert!(
                    self.store.verify_consistency().is_ok(),
                    "store invariants violated after period"
                );
                absolute_period += 1;
            }

            self.award_stage_sp(stage)?;
        }

        self.award_overall_bonus()?;
        self.phase = Phase::Completed;
        Ok(self.into_result())
    }

    /// Award SP by stage rank: the ranking is truncated to the award vector
    /// and agents with zero tokens in the stage are excluded.
    fn award_stage_sp(&mut self, stage: usize) -> Result<()> {
        let ranking = self.store.stage_ranking(stage);
        for (place, (agent, tokens)) in ranking
            .iter()
            .take(self.config.sp_awards.len())
            .enumerate()
        {
            let points = self.config.sp_awards[place];
            self.store.award_sp(agent, points)?;
            info!(
                stage,
                agent = %agent,
                place = place + 1,
                tokens = from_amount(*tokens),
                points,
                "stage points awarded"
            );
        }
        Ok(())
    }

    /// Award the overall bonus to the top weighted-points agent, only when
    /// strictly positive.
    fn award_overall_bonus(&mut self) -> Result<()> {
        if let Some((agent, points)) = self.store.overall_ranking().into_iter().next() {
            if points > 0 {
                self.store.award_sp(&agent, self.config.overall_bonus_sp)?;
                info!(
                    agent = %agent,
                    weighted_points = from_amount(points),
                    bonus = self.config.overall_bonus_sp,
                    "overall bonus awarded"
                );
            }
        }
        Ok(())
    }

    fn into_result(self) -> TournamentResult {
        let mut leaderboard: Vec<LeaderboardEntry> = self
            .store
            .agents()
            .iter()
            .map(|a| LeaderboardEntry {
                agent: a.id.clone(),
                stage_tokens: a.stage_tokens.iter().copied().map(from_amount).collect(),
                weighted_points: from_amount(a.weighted_points),
                sp: a.sp,
            })
            .collect();
        leaderboard.sort_by(|a, b| {
            b.sp.cmp(&a.sp)
                .then_with(|| b.weighted_points.total_cmp(&a.weighted_points))
                .then_with(|| a.agent.cmp(&b.agent))
        });

        let winner = leaderboard
            .first()
            .map(|e| e.agent.clone())
            .unwrap_or_default();
        let summaries: BTreeMap<AgentId, _> = self
            .store
            .agents()
            .iter()
            .map(|a| (a.id.clone(), summarize(a, self.store.starting_budget())))
            .collect();

        info!(winner = %winner, "tournament completed");
        TournamentResult {
            config: self.config,
            leaderboard,
            winner,
            periods: self.store.periods().to_vec(),
            summaries,
        }
    }
}
