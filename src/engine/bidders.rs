//! Reference Bidding Agents
//!
//! Minimal agents that exercise the engine: a fixed-increment bidder, a
//! rescinding variant, a seeded random bidder, a skip bidder, and a failing
//! bidder for recovery paths. They double as the building blocks of the
//! scenario tests.

use crate::engine::agent::{BidDecision, BiddingAgent, RescindDecision};
use crate::engine::amount::{to_amount, Amount};
use crate::engine::observation::Observation;
use crate::engine::types::PeriodRecord;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Bids floor + a fixed increment every period. Optionally rescinds every win.
pub struct IncrementBidder {
    id: String,
    increment: Amount,
    always_rescind: bool,
}

impl IncrementBidder {
    pub fn new(id: impl Into<String>, increment: Amount) -> Self {
        Self {
            id: id.into(),
            increment,
            always_rescind: false,
        }
    }

    /// Same bidding rule, but rescinds whenever the option is offered.
    pub fn rescinding(id: impl Into<String>, increment: Amount) -> Self {
        Self {
            id: id.into(),
            increment,
            always_rescind: true,
        }
    }
}

impl BiddingAgent for IncrementBidder {
    fn id(&self) -> &str {
        &self.id
    }

    fn decide_bids(&mut self, observation: &Observation) -> Result<BidDecision, String> {
        Ok(BidDecision::single(observation.floor + self.increment))
    }

    fn decide_rescind(
        &mut self,
        _observation: &Observation,
        _record: &PeriodRecord,
    ) -> Result<RescindDecision, String> {
        Ok(RescindDecision {
            rescind: self.always_rescind,
        })
    }
}

/// Bids floor + a uniform random increment from a caller-seeded PRNG, so a
/// whole run stays reproducible.
pub struct RandomBidder {
    id: String,
    rng: ChaCha8Rng,
    max_increment: f64,
}

impl RandomBidder {
    pub fn new(id: impl Into<String>, seed: u64, max_increment: f64) -> Self {
        Self {
            id: id.into(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            max_increment,
        }
    }
}

impl BiddingAgent for RandomBidder {
    fn id(&self) -> &str {
        &self.id
    }

    fn decide_bids(&mut self, observation: &Observation) -> Result<BidDecision, String> {
        let increment = self.rng.gen_range(0.0..self.max_increment);
        Ok(BidDecision::single(
            observation.floor + to_amount(increment),
        ))
    }
}

/// Never bids.
pub struct SkipBidder {
    id: String,
}

impl SkipBidder {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl BiddingAgent for SkipBidder {
    fn id(&self) -> &str {
        &self.id
    }

    fn decide_bids(&mut self, _observation: &Observation) -> Result<BidDecision, String> {
        Ok(BidDecision::skip())
    }
}

/// Fails its decisions on demand; otherwise bids like an increment bidder.
/// Used to verify local recovery of agent failures.
pub struct FailingBidder {
    id: String,
    increment: Amount,
    pub fail_bids: bool,
    pub fail_rescind: bool,
    always_rescind: bool,
}

impl FailingBidder {
    pub fn new(id: impl Into<String>, increment: Amount) -> Self {
        Self {
            id: id.into(),
            increment,
            fail_bids: false,
            fail_rescind: false,
            always_rescind: false,
        }
    }

    pub fn failing_bids(mut self) -> Self {
        self.fail_bids = true;
        self
    }

    pub fn failing_rescind(mut self) -> Self {
        self.fail_rescind = true;
        self.always_rescind = true;
        self
    }
}

impl BiddingAgent for FailingBidder {
    fn id(&self) -> &str {
        &self.id
    }

    fn decide_bids(&mut self, observation: &Observation) -> Result<BidDecision, String> {
        if self.fail_bids {
            return Err("bid decision exploded".to_string());
        }
        Ok(BidDecision::single(observation.floor + self.increment))
    }

    fn decide_rescind(
        &mut self,
        _observation: &Observation,
        _record: &PeriodRecord,
    ) -> Result<RescindDecision, String> {
        if self.fail_rescind {
            return Err("rescind decision exploded".to_string());
        }
        Ok(RescindDecision {
            rescind: self.always_rescind,
        })
    }
}
