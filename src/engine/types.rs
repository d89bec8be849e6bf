//! Core Value Types
//!
//! Canonical types shared by the store, the mechanisms, and the period runner:
//! admitted bids, allocations, holdings, the per-period record, and the private
//! rescind carrier. Everything is a plain serializable value; agents only ever
//! see copies.

use crate::engine::amount::Amount;
use crate::engine::mechanism::MechanismTag;
use serde::{Deserialize, Serialize};

/// Stable agent identifier, unique within a tournament.
pub type AgentId = String;

/// Tournament lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Setup,
    StageActive,
    Completed,
}

/// A bid that passed admission (floor, positivity, affordability).
///
/// `seq` is the submission timestamp recorded at admission: monotone across the
/// period, walking agents in registration order and offers in submission order.
/// Mechanisms break price ties by the lowest `seq` (FIFO).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    pub agent: AgentId,
    /// Price per token.
    pub price: Amount,
    /// Total-cost budget of the offer: price x period supply for the full batch.
    pub total: Amount,
    /// Admission-order submission timestamp for FIFO tiebreaks.
    pub seq: u64,
}

/// One agent's share of a cleared period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub agent: AgentId,
    pub tokens: Amount,
    /// Price actually paid per token (clearing price, not the bid price).
    pub price: Amount,
    pub total_paid: Amount,
}

/// A retained allocation: tokens the agent holds and has not rescinded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub stage: usize,
    pub period: usize,
    pub tokens: Amount,
    pub price: Amount,
    pub points_per_token: Amount,
}

/// One completed period in the monotonic log.
///
/// `rescinded` is `None` while the rescind (if any) is still inside its private
/// window, and flips to `Some(true)` exactly once at revelation. No other value
/// is ever observable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRecord {
    pub stage: usize,
    pub period: usize,
    pub absolute_period: usize,
    /// Tokens actually auctioned: base share plus matured rescind injections.
    pub tokens_available: Amount,
    pub floor: Amount,
    pub points_per_token: Amount,
    pub clearing_price: Amount,
    pub allocations: Vec<Allocation>,
    /// Winner identity for single-winner mechanisms, unset otherwise.
    pub winner: Option<AgentId>,
    pub rescinded: Option<bool>,
    /// Full admitted bid set, for post-hoc analysis.
    pub bids: Vec<Bid>,
    pub mechanism: MechanismTag,
}

/// A rescind awaiting public revelation. Internal to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRescind {
    pub agent: AgentId,
    pub stage: usize,
    pub period: usize,
    pub tokens: Amount,
    /// Price per token that was refunded.
    pub price: Amount,
    pub total_refunded: Amount,
    pub rescinded_at: usize,
    /// Always `rescinded_at + 2`.
    pub reveal_at: usize,
}

/// Extra supply scheduled into a future period by a rescind. Internal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyInjection {
    /// Absolute period that receives the tokens. Always source + 2.
    pub target_period: usize,
    pub tokens: Amount,
    /// Human-readable provenance, e.g. the source position.
    pub origin: String,
}

/// Private knowledge held only by a rescinding agent until revelation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateRescindInfo {
    /// Stage that will receive the injected supply.
    pub target_stage: usize,
    /// Period-within-stage that will receive the injected supply.
    pub target_period: usize,
    pub tokens: Amount,
    pub reveal_at: usize,
}
