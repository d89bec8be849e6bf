//! Tournament State Store
//!
//! Single source of truth for one tournament: per-agent budget, holdings,
//! derived counters, the append-only period log, and the rescind ledger. All
//! mutations arising from clearing and rescinds go through here, and the
//! derived counters (per-stage tokens, weighted points) are kept consistent on
//! every path. The store is owned exclusively by the tournament driver.

use crate::engine::amount::{mul_fixed, Amount};
use crate::engine::rescind::{RescindLedger, RESCIND_DELAY};
use crate::engine::types::{
    AgentId, Holding, PendingRescind, PeriodRecord, PrivateRescindInfo, SupplyInjection,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Mutable runtime state for one participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    pub id: AgentId,
    /// Remaining budget. Non-negative after every operation.
    pub budget: Amount,
    /// Retained allocations.
    pub holdings: Vec<Holding>,
    /// Tokens retained per stage, materialised for ranking.
    pub stage_tokens: Vec<Amount>,
    /// Sum of tokens x points-per-token over holdings.
    pub weighted_points: Amount,
    /// Accumulated stage points.
    pub sp: u32,
    /// This agent's rescinds not yet public.
    pub private_info: Vec<PrivateRescindInfo>,
    /// Lifetime rescind count, for the final summary.
    pub rescinds_made: u32,
}

impl AgentState {
    fn new(id: AgentId, budget: Amount, stage_count: usize) -> Self {
        Self {
            id,
            budget,
            holdings: Vec::new(),
            stage_tokens: vec![0; stage_count],
            weighted_points: 0,
            sp: 0,
            private_info: Vec::new(),
            rescinds_made: 0,
        }
    }
}

/// Store operation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    UnknownAgent(AgentId),
    DuplicateAgent(AgentId),
    InsufficientBudget {
        agent: AgentId,
        requested: Amount,
        available: Amount,
    },
    HoldingNotFound {
        agent: AgentId,
        stage: usize,
        period: usize,
    },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::UnknownAgent(id) => write!(f, "unknown agent '{}'", id),
            StoreError::DuplicateAgent(id) => write!(f, "duplicate agent id '{}'", id),
            StoreError::InsufficientBudget {
                agent,
                requested,
                available,
            } => write!(
                f,
                "insufficient budget for '{}': requested {} with {} available",
                agent, requested, available
            ),
            StoreError::HoldingNotFound {
                agent,
                stage,
                period,
            } => write!(
                f,
                "no holding for '{}' at stage {} period {}",
                agent, stage, period
            ),
        }
    }
}

impl std::error::Error for StoreError {}

/// State store for one tournament.
#[derive(Debug)]
pub struct TournamentStore {
    starting_budget: Amount,
    stage_count: usize,
    agents: Vec<AgentState>,
    index: HashMap<AgentId, usize>,
    periods: Vec<PeriodRecord>,
    ledger: RescindLedger,
}

impl TournamentStore {
    pub fn new(
        starting_budget: Amount,
        stage_count: usize,
        agent_ids: &[AgentId],
    ) -> Result<Self, StoreError> {
        let mut agents = Vec::with_capacity(agent_ids.len());
        let mut index = HashMap::with_capacity(agent_ids.len());
        for id in agent_ids {
            if index.insert(id.clone(), agents.len()).is_some() {
                return Err(StoreError::DuplicateAgent(id.clone()));
            }
            agents.push(AgentState::new(id.clone(), starting_budget, stage_count));
        }
        Ok(Self {
            starting_budget,
            stage_count,
            agents,
            index,
            periods: Vec::new(),
            ledger: RescindLedger::new(),
        })
    }

    pub fn starting_budget(&self) -> Amount {
        self.starting_budget
    }

    pub fn stage_count(&self) -> usize {
        self.stage_count
    }

    /// Agents in registration order.
    pub fn agents(&self) -> &[AgentState] {
        &self.agents
    }

    pub fn agent(&self, id: &str) -> Result<&AgentState, StoreError> {
        self.index
            .get(id)
            .map(|&i| &self.agents[i])
            .ok_or_else(|| StoreError::UnknownAgent(id.to_string()))
    }

    fn agent_mut(&mut self, id: &str) -> Result<&mut AgentState, StoreError> {
        match self.index.get(id) {
            Some(&i) => Ok(&mut self.agents[i]),
            None => Err(StoreError::UnknownAgent(id.to_string())),
        }
    }

    pub fn periods(&self) -> &[PeriodRecord] {
        &self.periods
    }

    pub fn ledger(&self) -> &RescindLedger {
        &self.ledger
    }

    // -------------------------------------------------------------------------
    // Budget and holdings
    // -------------------------------------------------------------------------

    /// Subtract `amount` from the agent's budget. Enforces non-negativity.
    pub fn deduct_budget(&mut self, id: &str, amount: Amount) -> Result<Amount, StoreError> {
        let agent = self.agent_mut(id)?;
        if amount > agent.budget {
            return Err(StoreError::InsufficientBudget {
                agent: agent.id.clone(),
                requested: amount,
                available: agent.budget,
            });
        }
        agent.budget -= amount;
        Ok(agent.budget)
    }

    /// Add `amount` back to the agent's budget. Always succeeds for known agents.
    pub fn refund_budget(&mut self, id: &str, amount: Amount) -> Result<(), StoreError> {
        let agent = self.agent_mut(id)?;
        agent.budget += amount;
        Ok(())
    }

    /// Append a holding and keep the derived counters consistent.
    pub fn add_holding(&mut self, id: &str, holding: Holding) -> Result<(), StoreError> {
        let agent = self.agent_mut(id)?;
        agent.stage_tokens[holding.stage] += holding.tokens;
        agent.weighted_points += mul_fixed(holding.tokens, holding.points_per_token);
        agent.holdings.push(holding);
        Ok(())
    }

    /// Remove the holding matching (stage, period), decrementing counters.
    /// Returns `None` when no such holding exists.
    pub fn remove_holding(
        &mut self,
        id: &str,
        stage: usize,
        period: usize,
    ) -> Result<Option<Holding>, StoreError> {
        let agent = self.agent_mut(id)?;
        let pos = agent
            .holdings
            .iter()
            .position(|h| h.stage == stage && h.period == period);
        let Some(pos) = pos else {
            return Ok(None);
        };
        let holding = agent.holdings.remove(pos);
        agent.stage_tokens[holding.stage] -= holding.tokens;
        agent.weighted_points -= mul_fixed(holding.tokens, holding.points_per_token);
        Ok(Some(holding))
    }

    // -------------------------------------------------------------------------
    // Period log
    // -------------------------------------------------------------------------

    /// Append to the log. Prior records are never mutated by this path.
    pub fn append_record(&mut self, record: PeriodRecord) {
        self.periods.push(record);
    }

    /// Flip the rescinded flag of the (stage, period) record to `true`.
    /// No-op when no such record exists.
    pub fn mark_rescinded(&mut self, stage: usize, period: usize) {
        if let Some(record) = self
            .periods
            .iter_mut()
            .find(|r| r.stage == stage && r.period == period)
        {
            debug_assert!(record.rescinded.is_none(), "rescinded flag flips once");
            record.rescinded = Some(true);
        }
    }

    // -------------------------------------------------------------------------
    // Stage points
    // -------------------------------------------------------------------------

    pub fn award_sp(&mut self, id: &str, points: u32) -> Result<(), StoreError> {
        let agent = self.agent_mut(id)?;
        agent.sp += points;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Rescind protocol
    // -------------------------------------------------------------------------

    /// Execute the rescind transition atomically for the winner of the period
    /// cleared at `absolute_period`:
    /// holding removal, full refund, pending-revelation entry, supply
    /// injection at source + 2, and the agent's private-info entry. `target`
    /// is the (stage, period-within-stage) decomposition of source + 2.
    pub fn apply_rescind(
        &mut self,
        id: &str,
        stage: usize,
        period: usize,
        absolute_period: usize,
        target: (usize, usize),
    ) -> Result<PendingRescind, StoreError> {
        let holding = self
            .remove_holding(id, stage, period)?
            .ok_or_else(|| StoreError::HoldingNotFound {
                agent: id.to_string(),
                stage,
                period,
            })?;
        let total_refunded = mul_fixed(holding.price, holding.tokens);
        self.refund_budget(id, total_refunded)?;

        let reveal_at = absolute_period + RESCIND_DELAY;
        let pending = PendingRescind {
            agent: id.to_string(),
            stage,
            period,
            tokens: holding.tokens,
            price: holding.price,
            total_refunded,
            rescinded_at: absolute_period,
            reveal_at,
        };
        self.ledger.push_pending(pending.clone());
        self.ledger.push_injection(SupplyInjection {
            target_period: reveal_at,
            tokens: holding.tokens,
            origin: format!("rescind s{}p{}", stage, period),
        });

        let agent = self.agent_mut(id)?;
        agent.private_info.push(PrivateRescindInfo {
            target_stage: target.0,
            target_period: target.1,
            tokens: holding.tokens,
            reveal_at,
        });
        agent.rescinds_made += 1;
        Ok(pending)
    }

    /// Reveal all pending rescinds due at the given absolute period: the
    /// source records' flags flip to `true` and the rescinding agents'
    /// matching private-info entries are purged. Returns the revealed entries.
    pub fn reveal_due_rescinds(&mut self, absolute_period: usize) -> Vec<PendingRescind> {
        let due = self.ledger.reveal_due(absolute_period);
        for rescind in &due {
            self.mark_rescinded(rescind.stage, rescind.period);
            if let Some(&i) = self.index.get(&rescind.agent) {
                self.agents[i]
                    .private_info
                    .retain(|info| info.reveal_at != rescind.reveal_at);
            }
        }
        due
    }

    /// Extra supply maturing into the given absolute period.
    pub fn supply_due(&self, absolute_period: usize) -> Amount {
        self.ledger.injected_supply(absolute_period)
    }

    // -------------------------------------------------------------------------
    // Rankings
    // -------------------------------------------------------------------------

    /// Agents with tokens in the stage, ordered by token count descending with
    /// lexicographic agent-id tiebreak. Deterministic regardless of
    /// registration order.
    pub fn stage_ranking(&self, stage: usize) -> Vec<(AgentId, Amount)> {
        let mut ranked: Vec<(AgentId, Amount)> = self
            .agents
            .iter()
            .filter(|a| a.stage_tokens[stage] > 0)
            .map(|a| (a.id.clone(), a.stage_tokens[stage]))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }

    /// All agents ordered by weighted points descending, agent id ascending.
    pub fn overall_ranking(&self) -> Vec<(AgentId, Amount)> {
        let mut ranked: Vec<(AgentId, Amount)> = self
            .agents
            .iter()
            .map(|a| (a.id.clone(), a.weighted_points))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }

    // -------------------------------------------------------------------------
    // Consistency
    // -------------------------------------------------------------------------

    /// Recompute the derived counters from holdings and compare. Used by tests
    /// and by the driver's debug assertions after every period.
    pub fn verify_consistency(&self) -> Result<(), String> {
        for agent in &self.agents {
            if agent.budget < 0 {
                return Err(format!("agent '{}' has negative budget", agent.id));
            }
            let mut stage_tokens = vec![0 as Amount; self.stage_count];
            let mut weighted: Amount = 0;
            for holding in &agent.holdings {
                stage_tokens[holding.stage] += holding.tokens;
                weighted += mul_fixed(holding.tokens, holding.points_per_token);
            }
            if stage_tokens != agent.stage_tokens {
                return Err(format!(
                    "agent '{}' stage tokens diverge from holdings",
                    agent.id
                ));
            }
            if weighted != agent.weighted_points {
                return Err(format!(
                    "agent '{}' weighted points diverge from holdings",
                    agent.id
                ));
            }
        }
        Ok(())
    }
}
