//! Clearing Mechanisms
//!
//! A mechanism is a pure function of (admitted bids, supply, floor) producing a
//! clearing price and per-agent allocations. Mechanisms never touch agent
//! budgets; affordability is the period runner's admission predicate. Outputs
//! are deterministic, including FIFO tiebreaks via the bid `seq`.

pub mod second_price;
pub mod uniform_price;

use crate::engine::amount::Amount;
use crate::engine::types::{Allocation, Bid};
use serde::{Deserialize, Serialize};

pub use second_price::SecondPriceMechanism;
pub use uniform_price::UniformPriceMechanism;

/// Identifies a clearing mechanism in configuration and period records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MechanismTag {
    /// Single winner pays the second-highest admitted price. Default.
    SecondPrice,
    /// Multi-winner uniform price with pro-rata rationing at the margin.
    UniformPrice,
    /// Reserved: discriminatory pay-as-bid. Not implemented.
    PayAsBid,
    /// Reserved: descending-price clock auction. Not implemented.
    DescendingPrice,
    /// Reserved: sealed first-price. Not implemented.
    FirstPrice,
}

impl MechanismTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            MechanismTag::SecondPrice => "second-price",
            MechanismTag::UniformPrice => "uniform-price",
            MechanismTag::PayAsBid => "pay-as-bid",
            MechanismTag::DescendingPrice => "descending-price",
            MechanismTag::FirstPrice => "first-price",
        }
    }
}

impl std::fmt::Display for MechanismTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MechanismTag {
    type Err = MechanismError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "second-price" => Ok(MechanismTag::SecondPrice),
            "uniform-price" => Ok(MechanismTag::UniformPrice),
            "pay-as-bid" => Ok(MechanismTag::PayAsBid),
            "descending-price" => Ok(MechanismTag::DescendingPrice),
            "first-price" => Ok(MechanismTag::FirstPrice),
            other => Err(MechanismError::UnknownTag(other.to_string())),
        }
    }
}

/// Result of clearing one period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearingOutcome {
    /// Price at which tokens were allocated; the floor when nothing cleared.
    pub clearing_price: Amount,
    pub allocations: Vec<Allocation>,
    /// Sum of tokens across allocations.
    pub tokens_allocated: Amount,
    /// Opaque mechanism-specific diagnostics.
    pub metadata: serde_json::Value,
}

impl ClearingOutcome {
    /// An empty outcome at the floor price.
    pub fn empty(floor: Amount) -> Self {
        Self {
            clearing_price: floor,
            allocations: Vec::new(),
            tokens_allocated: 0,
            metadata: serde_json::Value::Null,
        }
    }
}

/// Mechanism failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MechanismError {
    /// The tag is reserved but the mechanism is not implemented.
    Unimplemented(MechanismTag),
    /// The string does not name any known mechanism.
    UnknownTag(String),
}

impl std::fmt::Display for MechanismError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MechanismError::Unimplemented(tag) => {
                write!(f, "mechanism '{}' is reserved but not implemented", tag)
            }
            MechanismError::UnknownTag(name) => {
                write!(f, "unknown mechanism tag '{}'", name)
            }
        }
    }
}

impl std::error::Error for MechanismError {}

/// The clearing contract. Implementations must be pure and deterministic.
pub trait ClearingMechanism: Send {
    /// The tag this instance serves.
    fn tag(&self) -> MechanismTag;

    /// Whether this mechanism awards the whole supply to a single winner.
    /// Controls the `winner` field of the period record.
    fn single_winner(&self) -> bool;

    /// Clear one period. `bids` have already passed admission; `supply` and
    /// `floor` are non-negative.
    fn clear(
        &self,
        bids: &[Bid],
        supply: Amount,
        floor: Amount,
    ) -> Result<ClearingOutcome, MechanismError>;
}

/// Reserved mechanism: rejects use at period time.
struct ReservedMechanism {
    tag: MechanismTag,
}

impl ClearingMechanism for ReservedMechanism {
    fn tag(&self) -> MechanismTag {
        self.tag
    }

    fn single_winner(&self) -> bool {
        false
    }

    fn clear(
        &self,
        _bids: &[Bid],
        _supply: Amount,
        _floor: Amount,
    ) -> Result<ClearingOutcome, MechanismError> {
        Err(MechanismError::Unimplemented(self.tag))
    }
}

/// All tags the registry enumerates, implemented or reserved.
pub fn all_tags() -> [MechanismTag; 5] {
    [
        MechanismTag::SecondPrice,
        MechanismTag::UniformPrice,
        MechanismTag::PayAsBid,
        MechanismTag::DescendingPrice,
        MechanismTag::FirstPrice,
    ]
}

/// Construct the mechanism instance for a tag. Reserved tags yield instances
/// that fail at clearing time.
pub fn make_mechanism(tag: MechanismTag) -> Box<dyn ClearingMechanism> {
    match tag {
        MechanismTag::SecondPrice => Box::new(SecondPriceMechanism),
        MechanismTag::UniformPrice => Box::new(UniformPriceMechanism),
        reserved => Box::new(ReservedMechanism { tag: reserved }),
    }
}

/// Resolve a mechanism by its string tag. Errors on unknown names.
pub fn resolve(name: &str) -> Result<Box<dyn ClearingMechanism>, MechanismError> {
    let tag: MechanismTag = name.parse()?;
    Ok(make_mechanism(tag))
}

/// Availability probe: a tag is available iff its mechanism clears an empty
/// bid set at zero supply and zero floor.
pub fn is_available(tag: MechanismTag) -> bool {
    make_mechanism(tag).clear(&[], 0, 0).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_round_trip() {
        for tag in all_tags() {
            let parsed: MechanismTag = tag.as_str().parse().unwrap();
            assert_eq!(parsed, tag);
        }
    }

    #[test]
    fn test_resolve_unknown() {
        match resolve("english-auction") {
            Ok(_) => panic!("expected error"),
            Err(err) => {
                assert_eq!(err, MechanismError::UnknownTag("english-auction".into()));
            }
        }
    }

    #[test]
    fn test_availability_probe() {
        assert!(is_available(MechanismTag::SecondPrice));
        assert!(is_available(MechanismTag::UniformPrice));
        assert!(!is_available(MechanismTag::PayAsBid));
        assert!(!is_available(MechanismTag::DescendingPrice));
        assert!(!is_available(MechanismTag::FirstPrice));
    }

    #[test]
    fn test_reserved_rejects_at_clearing_time() {
        let mech = make_mechanism(MechanismTag::FirstPrice);
        let err = mech.clear(&[], 100, 10).unwrap_err();
        assert_eq!(err, MechanismError::Unimplemented(MechanismTag::FirstPrice));
    }
}
