//! Second-Price Single-Winner Clearing
//!
//! The period's entire supply goes to the highest bidder; each token is paid at
//! the second-highest admitted price, or the floor when only one bid was
//! admitted. Truthful bidding is the dominant strategy under this rule, which
//! lets agent authors reason locally about valuations.

use crate::engine::amount::{mul_fixed, Amount};
use crate::engine::mechanism::{ClearingMechanism, ClearingOutcome, MechanismError, MechanismTag};
use crate::engine::types::{Allocation, Bid};
use serde_json::json;

pub struct SecondPriceMechanism;

impl ClearingMechanism for SecondPriceMechanism {
    fn tag(&self) -> MechanismTag {
        MechanismTag::SecondPrice
    }

    fn single_winner(&self) -> bool {
        true
    }

    fn clear(
        &self,
        bids: &[Bid],
        supply: Amount,
        floor: Amount,
    ) -> Result<ClearingOutcome, MechanismError> {
        let Some(winner) = best_bid(bids) else {
            return Ok(ClearingOutcome::empty(floor));
        };

        // Payment price: highest admitted price among the other bids, else floor.
        // Admission has already filtered below-floor prices, so the second
        // price can never undercut the floor.
        let pay_price = bids
            .iter()
            .filter(|b| b.seq != winner.seq)
            .map(|b| b.price)
            .max()
            .unwrap_or(floor);

        let total_paid = mul_fixed(pay_price, supply);
        let allocation = Allocation {
            agent: winner.agent.clone(),
            tokens: supply,
            price: pay_price,
            total_paid,
        };

        Ok(ClearingOutcome {
            clearing_price: pay_price,
            allocations: vec![allocation],
            tokens_allocated: supply,
            metadata: json!({
                "admitted_bids": bids.len(),
                "winning_bid": winner.price,
            }),
        })
    }
}

/// Highest price wins; ties break to the earliest submission (lowest seq).
fn best_bid(bids: &[Bid]) -> Option<&Bid> {
    bids.iter()
        .max_by(|a, b| a.price.cmp(&b.price).then(b.seq.cmp(&a.seq)))
}
