//! Rescind Ledger
//!
//! A rescind schedules two follow-ups at the same future period: a public
//! revelation (consumed by the tournament driver) and a supply injection
//! (summed into the period supply by the period runner). They are kept as two
//! independent queues keyed by absolute period because they are consumed by
//! different components at different sub-steps of the period start.

use crate::engine::amount::Amount;
use crate::engine::types::{PendingRescind, SupplyInjection};

/// Periods between a rescind and its public revelation / supply injection.
pub const RESCIND_DELAY: usize = 2;

#[derive(Debug, Clone, Default)]
pub struct RescindLedger {
    pending: Vec<PendingRescind>,
    injections: Vec<SupplyInjection>,
}

impl RescindLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_pending(&mut self, rescind: PendingRescind) {
        debug_assert_eq!(rescind.reveal_at, rescind.rescinded_at + RESCIND_DELAY);
        self.pending.push(rescind);
    }

    pub fn push_injection(&mut self, injection: SupplyInjection) {
        self.injections.push(injection);
    }

    /// Remove and return all pending rescinds due at or before the given
    /// absolute period, in the order they were made.
    pub fn reveal_due(&mut self, absolute_period: usize) -> Vec<PendingRescind> {
        let (due, rest): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|r| r.reveal_at <= absolute_period);
        self.pending = rest;
        due
    }

    /// Sum of injected tokens targeting exactly the given absolute period.
    /// Injections stay in the ledger; targets are unique per period so the
    /// sum never double-counts.
    pub fn injected_supply(&self, absolute_period: usize) -> Amount {
        self.injections
            .iter()
            .filter(|i| i.target_period == absolute_period)
            .map(|i| i.tokens)
            .sum()
    }

    /// Injections that mature anywhere inside the given stage's absolute
    /// period range. Used by supply-conservation checks.
    pub fn injections_in_range(&self, start: usize, end: usize) -> Amount {
        self.injections
            .iter()
            .filter(|i| i.target_period >= start && i.target_period < end)
            .map(|i| i.tokens)
            .sum()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn injections(&self) -> &[SupplyInjection] {
        &self.injections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::amount::to_amount;

    fn pending(agent: &str, rescinded_at: usize) -> PendingRescind {
        PendingRescind {
            agent: agent.into(),
            stage: 0,
            period: rescinded_at,
            tokens: to_amount(100.0),
            price: to_amount(11.0),
            total_refunded: to_amount(1100.0),
            rescinded_at,
            reveal_at: rescinded_at + RESCIND_DELAY,
        }
    }

    #[test]
    fn test_reveal_due_drains_in_order() {
        let mut ledger = RescindLedger::new();
        ledger.push_pending(pending("x", 0));
        ledger.push_pending(pending("y", 1));
        ledger.push_pending(pending("x", 4));

        assert!(ledger.reveal_due(1).is_empty());
        let due = ledger.reveal_due(3);
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].agent, "x");
        assert_eq!(due[1].agent, "y");
        assert_eq!(ledger.pending_count(), 1);
    }

    #[test]
    fn test_injected_supply_sums_exact_target() {
        let mut ledger = RescindLedger::new();
        ledger.push_injection(SupplyInjection {
            target_period: 2,
            tokens: to_amount(100.0),
            origin: "rescind s0p0".into(),
        });
        ledger.push_injection(SupplyInjection {
            target_period: 2,
            tokens: to_amount(50.0),
            origin: "rescind s0p0".into(),
        });
        ledger.push_injection(SupplyInjection {
            target_period: 5,
            tokens: to_amount(25.0),
            origin: "rescind s0p3".into(),
        });

        assert_eq!(ledger.injected_supply(2), to_amount(150.0));
        assert_eq!(ledger.injected_supply(3), 0);
        assert_eq!(ledger.injections_in_range(0, 9), to_amount(175.0));
    }
}
