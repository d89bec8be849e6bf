//! Uniform-Price Multi-Winner Clearing
//!
//! Every admitted bid carries a price per token and a total-cost budget; the
//! implied demand is total / price. Bids sort by price descending with FIFO
//! tiebreak. Under-subscription fills everyone at the floor. Otherwise the
//! clearing price is the marginal bid's price, bids strictly above fill in
//! full, and bids exactly at the clearing price share the residual pro-rata by
//! demanded quantity. Pro-rata shares use banker's rounding at the fixed
//! 8-digit precision; the last tied bid absorbs the rounding residue so the
//! shares sum exactly to the residual.

use crate::engine::amount::{div_fixed, div_round_half_even, mul_fixed, Amount};
use crate::engine::mechanism::{ClearingMechanism, ClearingOutcome, MechanismError, MechanismTag};
use crate::engine::types::{Allocation, Bid};
use serde_json::json;

pub struct UniformPriceMechanism;

impl ClearingMechanism for UniformPriceMechanism {
    fn tag(&self) -> MechanismTag {
        MechanismTag::UniformPrice
    }

    fn single_winner(&self) -> bool {
        false
    }

    fn clear(
        &self,
        bids: &[Bid],
        supply: Amount,
        floor: Amount,
    ) -> Result<ClearingOutcome, MechanismError> {
        if bids.is_empty() {
            return Ok(ClearingOutcome::empty(floor));
        }

        // Price descending, earliest submission first within a price.
        let mut book: Vec<&Bid> = bids.iter().collect();
        book.sort_by(|a, b| b.price.cmp(&a.price).then(a.seq.cmp(&b.seq)));

        let demands: Vec<Amount> = book.iter().map(|b| div_fixed(b.total, b.price)).collect();
        let total_demand: Amount = demands.iter().sum();

        if total_demand <= supply {
            // Under-subscription: every bid fills in full at the floor.
            let allocations: Vec<Allocation> = book
                .iter()
                .zip(&demands)
                .filter(|(_, &qty)| qty > 0)
                .map(|(bid, &qty)| Allocation {
                    agent: bid.agent.clone(),
                    tokens: qty,
                    price: floor,
                    total_paid: mul_fixed(floor, qty),
                })
                .collect();
            let tokens_allocated = allocations.iter().map(|a| a.tokens).sum();
            return Ok(ClearingOutcome {
                clearing_price: floor,
                allocations,
                tokens_allocated,
                metadata: json!({
                    "admitted_bids": bids.len(),
                    "total_demand": total_demand,
                    "oversubscribed": false,
                }),
            });
        }

        // Marginal bid: first position where cumulative demand reaches supply.
        let mut cumulative: Amount = 0;
        let mut marginal = 0;
        for (i, &qty) in demands.iter().enumerate() {
            cumulative += qty;
            if cumulative >= supply {
                marginal = i;
                break;
            }
        }
        let clearing_price = book[marginal].price;

        let mut allocations = Vec::new();
        let mut above_qty: Amount = 0;
        for (bid, &qty) in book.iter().zip(&demands) {
            if bid.price > clearing_price && qty > 0 {
                above_qty += qty;
                allocations.push(Allocation {
                    agent: bid.agent.clone(),
                    tokens: qty,
                    price: clearing_price,
                    total_paid: mul_fixed(clearing_price, qty),
                });
            }
        }

        // Bids exactly at the clearing price share the residual pro-rata by
        // demanded quantity. The last tied bid takes the residue.
        let residual = supply - above_qty;
        let tied: Vec<(&Bid, Amount)> = book
            .iter()
            .zip(&demands)
            .filter(|(bid, &qty)| bid.price == clearing_price && qty > 0)
            .map(|(bid, &qty)| (*bid, qty))
            .collect();
        let tied_demand: Amount = tied.iter().map(|(_, qty)| qty).sum();

        let mut assigned: Amount = 0;
        for (i, (bid, qty)) in tied.iter().enumerate() {
            let share = if i + 1 == tied.len() {
                residual - assigned
            } else {
                div_round_half_even(residual * qty, tied_demand)
            };
            assigned += share;
            if share > 0 {
                allocations.push(Allocation {
                    agent: bid.agent.clone(),
                    tokens: share,
                    price: clearing_price,
                    total_paid: mul_fixed(clearing_price, share),
                });
            }
        }

        let tokens_allocated = allocations.iter().map(|a| a.tokens).sum();
        Ok(ClearingOutcome {
            clearing_price,
            allocations,
            tokens_allocated,
            metadata: json!({
                "admitted_bids": bids.len(),
                "total_demand": total_demand,
                "oversubscribed": true,
                "tied_at_margin": tied.len(),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::amount::to_amount;

    fn bid(agent: &str, price: f64, total: f64, seq: u64) -> Bid {
        Bid {
            agent: agent.into(),
            price: to_amount(price),
            total: to_amount(total),
            seq,
        }
    }

    fn clear(bids: &[Bid], supply: f64, floor: f64) -> ClearingOutcome {
        UniformPriceMechanism
            .clear(bids, to_amount(supply), to_amount(floor))
            .unwrap()
    }

    fn alloc_of<'a>(outcome: &'a ClearingOutcome, agent: &str) -> &'a Allocation {
        outcome
            .allocations
            .iter()
            .find(|a| a.agent == agent)
            .unwrap()
    }

    #[test]
    fn test_no_bids_clears_at_floor() {
        let outcome = clear(&[], 100.0, 8.0);
        assert!(outcome.allocations.is_empty());
        assert_eq!(outcome.clearing_price, to_amount(8.0));
    }

    #[test]
    fn test_under_subscription_fills_at_floor() {
        // Demand 30 + 20 = 50 against supply 100.
        let outcome = clear(
            &[bid("a", 10.0, 300.0, 0), bid("b", 9.0, 180.0, 1)],
            100.0,
            8.0,
        );
        assert_eq!(outcome.clearing_price, to_amount(8.0));
        assert_eq!(alloc_of(&outcome, "a").tokens, to_amount(30.0));
        assert_eq!(alloc_of(&outcome, "a").price, to_amount(8.0));
        assert_eq!(alloc_of(&outcome, "b").tokens, to_amount(20.0));
        assert_eq!(outcome.tokens_allocated, to_amount(50.0));
    }

    #[test]
    fn test_oversubscription_pro_rata_at_margin() {
        // Scenario: supply 100, floor 8. A @ $15 for $750 (50 tokens),
        // B @ $11 for $550 (50), C @ $11 for $550 (50). Demand reaches supply
        // at the $11 tier: A fills 50 at $11, B and C split the residual 50.
        let outcome = clear(
            &[
                bid("a", 15.0, 750.0, 0),
                bid("b", 11.0, 550.0, 1),
                bid("c", 11.0, 550.0, 2),
            ],
            100.0,
            8.0,
        );
        assert_eq!(outcome.clearing_price, to_amount(11.0));
        assert_eq!(alloc_of(&outcome, "a").tokens, to_amount(50.0));
        assert_eq!(alloc_of(&outcome, "a").price, to_amount(11.0));
        assert_eq!(alloc_of(&outcome, "b").tokens, to_amount(25.0));
        assert_eq!(alloc_of(&outcome, "c").tokens, to_amount(25.0));
        assert_eq!(outcome.tokens_allocated, to_amount(100.0));
    }

    #[test]
    fn test_pro_rata_residue_absorbed_by_last_tie() {
        // Residual 100 split across three equal ties of 50: exact shares are
        // 33.33333333..., so the last tie absorbs the residue and the sum is
        // exactly the residual.
        let outcome = clear(
            &[
                bid("a", 9.0, 450.0, 0),
                bid("b", 9.0, 450.0, 1),
                bid("c", 9.0, 450.0, 2),
            ],
            100.0,
            8.0,
        );
        assert_eq!(outcome.clearing_price, to_amount(9.0));
        let sum: Amount = outcome.allocations.iter().map(|a| a.tokens).sum();
        assert_eq!(sum, to_amount(100.0));
        assert_eq!(alloc_of(&outcome, "a").tokens, 3_333_333_333);
        assert_eq!(alloc_of(&outcome, "b").tokens, 3_333_333_333);
        assert_eq!(alloc_of(&outcome, "c").tokens, 3_333_333_334);
    }

    #[test]
    fn test_fifo_order_among_ties_is_stable() {
        // Two ties submitted out of order: shares are identical but the
        // residue lands on the later submission.
        let outcome = clear(
            &[bid("late", 9.0, 270.0, 7), bid("early", 9.0, 270.0, 2)],
            50.0,
            8.0,
        );
        let total: Amount = outcome.allocations.iter().map(|a| a.tokens).sum();
        assert_eq!(total, to_amount(50.0));
        assert_eq!(outcome.allocations[0].agent, "early");
        assert_eq!(outcome.allocations[1].agent, "late");
    }

    #[test]
    fn test_marginal_bid_partially_filled() {
        // a demands 60 above the margin; b is marginal with demand 50 but only
        // 40 remain.
        let outcome = clear(
            &[bid("a", 12.0, 720.0, 0), bid("b", 10.0, 500.0, 1)],
            100.0,
            8.0,
        );
        assert_eq!(outcome.clearing_price, to_amount(10.0));
        assert_eq!(alloc_of(&outcome, "a").tokens, to_amount(60.0));
        assert_eq!(alloc_of(&outcome, "b").tokens, to_amount(40.0));
    }
}
