//! Period Runner
//!
//! Drives one bidding round: observation construction, bid collection,
//! admission, clearing, settlement, the rescind offer to a single winner, and
//! the emitted period record. Agent failures are recovered locally; settlement
//! failures are engine bugs and abort the tournament.

use crate::engine::agent::BiddingAgent;
use crate::engine::amount::{mul_fixed, Amount};
use crate::engine::config::TournamentConfig;
use crate::engine::mechanism::{ClearingMechanism, MechanismTag};
use crate::engine::observation::build_observation;
use crate::engine::store::TournamentStore;
use crate::engine::types::{Bid, Holding, PeriodRecord};
use anyhow::{Context, Result};
use tracing::{debug, warn};

/// Inputs for one period, assembled by the tournament driver.
#[derive(Debug, Clone)]
pub struct PeriodParams {
    pub stage: usize,
    pub period: usize,
    pub absolute_period: usize,
    /// Base share plus injections maturing this period.
    pub supply: Amount,
    pub floor: Amount,
    pub points_per_token: Amount,
    pub mechanism: MechanismTag,
    /// Offers beyond this cap are dropped before admission.
    pub max_bids: usize,
    /// False in the last two periods of the terminal stage.
    pub rescind_allowed: bool,
}

pub struct PeriodRunner<'a> {
    store: &'a mut TournamentStore,
    config: &'a TournamentConfig,
}

impl<'a> PeriodRunner<'a> {
    pub fn new(store: &'a mut TournamentStore, config: &'a TournamentConfig) -> Self {
        Self { store, config }
    }

    /// Run one period end to end and append its record to the log.
    pub fn run(
        &mut self,
        agents: &mut [Box<dyn BiddingAgent>],
        mechanism: &dyn ClearingMechanism,
        params: &PeriodParams,
    ) -> Result<()> {
        let bids = self.collect_bids(agents, params);

        let outcome = mechanism
            .clear(&bids, params.supply, params.floor)
            .with_context(|| {
                format!(
                    "clearing failed at stage {} period {}",
                    params.stage, params.period
                )
            })?;

        // Settlement. Admission bounded every offer by the agent's budget and
        // the clearing price never exceeds the admitted price, so a deduction
        // failure here is an engine bug, not a user error.
        for allocation in &outcome.allocations {
            self.store
                .deduct_budget(&allocation.agent, allocation.total_paid)
                .with_context(|| {
                    format!(
                        "settlement underflow at stage {} period {}",
                        params.stage, params.period
                    )
                })?;
            self.store.add_holding(
                &allocation.agent,
                Holding {
                    stage: params.stage,
                    period: params.period,
                    tokens: allocation.tokens,
                    price: allocation.price,
                    points_per_token: params.points_per_token,
                },
            )?;
        }

        let winner = if mechanism.single_winner() {
            outcome.allocations.first().map(|a| a.agent.clone())
        } else {
            None
        };

        let record = PeriodRecord {
            stage: params.stage,
            period: params.period,
            absolute_period: params.absolute_period,
            tokens_available: params.supply,
            floor: params.floor,
            points_per_token: params.points_per_token,
            clearing_price: outcome.clearing_price,
            allocations: outcome.allocations.clone(),
            winner,
            rescinded: None,
            bids,
            mechanism: params.mechanism,
        };

        // Rescind offer: exactly one allocation means a single-winner outcome.
        // The record shown to the agent carries the same unset rescinded flag
        // that the emitted record will carry.
        if outcome.allocations.len() == 1 && params.rescind_allowed {
            self.offer_rescind(agents, params, &record)?;
        }

        debug!(
            stage = params.stage,
            period = params.period,
            absolute_period = params.absolute_period,
            admitted_bids = record.bids.len(),
            allocations = record.allocations.len(),
            clearing_price = record.clearing_price,
            "period cleared"
        );

        self.store.append_record(record);
        Ok(())
    }

    /// Steps 1-3: observation, bid collection, cap trimming, admission.
    ///
    /// The submission timestamp `seq` is assigned at admission, walking agents
    /// in registration order and offers in submission order.
    fn collect_bids(
        &mut self,
        agents: &mut [Box<dyn BiddingAgent>],
        params: &PeriodParams,
    ) -> Vec<Bid> {
        let mut bids = Vec::new();
        let mut seq: u64 = 0;
        for agent in agents.iter_mut() {
            let observation = build_observation(self.store, self.config, params, agent.id());
            let decision = match agent.decide_bids(&observation) {
                Ok(decision) => decision,
                Err(err) => {
                    warn!(
                        agent = agent.id(),
                        stage = params.stage,
                        period = params.period,
                        error = %err,
                        "bid decision failed; dropping this agent's offers"
                    );
                    continue;
                }
            };
            let budget = observation.budget;
            for offer in decision.offers.into_iter().take(params.max_bids) {
                let total = mul_fixed(offer.price, params.supply);
                let admitted =
                    offer.price >= params.floor && offer.price > 0 && total <= budget;
                if !admitted {
                    continue;
                }
                bids.push(Bid {
                    agent: agent.id().to_string(),
                    price: offer.price,
                    total,
                    seq,
                });
                seq += 1;
            }
        }
        bids
    }

    /// Step 6: the rescind prompt and, on acceptance, the rescind transition.
    fn offer_rescind(
        &mut self,
        agents: &mut [Box<dyn BiddingAgent>],
        params: &PeriodParams,
        preliminary: &PeriodRecord,
    ) -> Result<()> {
        let winner_id = preliminary.allocations[0].agent.clone();
        let Some(agent) = agents.iter_mut().find(|a| a.id() == winner_id) else {
            return Ok(());
        };

        let observation = build_observation(self.store, self.config, params, &winner_id);
        let decision = match agent.decide_rescind(&observation, preliminary) {
            Ok(decision) => decision,
            Err(err) => {
                warn!(
                    agent = %winner_id,
                    stage = params.stage,
                    period = params.period,
                    error = %err,
                    "rescind decision failed; winner keeps tokens"
                );
                return Ok(());
            }
        };
        if !decision.rescind {
            return Ok(());
        }

        let target = self
            .config
            .position_of(params.absolute_period + 2)
            .context("rescind target outside the tournament horizon")?;
        let pending = self.store.apply_rescind(
            &winner_id,
            params.stage,
            params.period,
            params.absolute_period,
            target,
        )?;
        debug!(
            agent = %winner_id,
            stage = params.stage,
            period = params.period,
            reveal_at = pending.reveal_at,
            tokens = pending.tokens,
            "rescind accepted"
        );
        Ok(())
    }
}
