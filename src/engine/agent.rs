//! Bidding Agent Interface
//!
//! Agents implement a small capability set: a stable identifier, a per-period
//! bid decision, and an optional rescind decision offered to a single winner.
//! Both calls are value-in/value-out; a returned error drops the agent's
//! contribution for that call and nothing else. The engine never lets an agent
//! hold a reference to mutable engine state.

use crate::engine::amount::Amount;
use crate::engine::observation::Observation;
use crate::engine::types::PeriodRecord;
use serde::{Deserialize, Serialize};

/// One bid offer: a price per token, interpreted as price x supply for the
/// full batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidOffer {
    pub price: Amount,
}

impl BidOffer {
    pub fn at(price: Amount) -> Self {
        Self { price }
    }
}

/// Bid decision for one period. An empty offer list means "skip".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BidDecision {
    pub offers: Vec<BidOffer>,
}

impl BidDecision {
    pub fn skip() -> Self {
        Self::default()
    }

    pub fn single(price: Amount) -> Self {
        Self {
            offers: vec![BidOffer::at(price)],
        }
    }
}

/// Rescind decision offered to the single winner of a just-cleared period.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RescindDecision {
    pub rescind: bool,
}

impl RescindDecision {
    pub fn keep() -> Self {
        Self { rescind: false }
    }

    pub fn rescind() -> Self {
        Self { rescind: true }
    }
}

/// The core agent trait.
///
/// Implementations must be deterministic given their inputs; agents that
/// randomise must carry a caller-supplied seeded PRNG so whole runs stay
/// reproducible.
pub trait BiddingAgent: Send {
    /// Stable identifier, unique within a tournament.
    fn id(&self) -> &str;

    /// Called once per period after observation construction. Errors drop all
    /// of this agent's offers for the period; agent state is untouched.
    fn decide_bids(&mut self, observation: &Observation) -> Result<BidDecision, String>;

    /// Called only when this agent is the single winner of the just-cleared
    /// period and rescind is allowed. The preliminary record carries the
    /// clearing outcome with `rescinded` unset. Errors mean "keep".
    fn decide_rescind(
        &mut self,
        _observation: &Observation,
        _record: &PeriodRecord,
    ) -> Result<RescindDecision, String> {
        Ok(RescindDecision::keep())
    }
}
