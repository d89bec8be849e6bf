//! Tournament Configuration
//!
//! Immutable configuration for one tournament run: the ordered stage schedule,
//! the stage-points award vector, and the shared starting budget. Validation is
//! fatal at construction; nothing downstream re-checks these fields.

use crate::engine::amount::{div_fixed_floor, to_amount, Amount};
use crate::engine::mechanism::MechanismTag;
use serde::{Deserialize, Serialize};

/// Configuration for one contiguous block of periods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    /// Base token supply for the whole stage, split evenly across its periods.
    pub base_supply: Amount,
    /// Points credited per token retained from this stage.
    pub points_per_token: Amount,
    /// Minimum admissible price per token.
    pub floor: Amount,
    /// Number of periods in the stage.
    pub periods: usize,
    /// Maximum bid offers admitted per agent per period.
    pub max_bids_per_agent: usize,
    /// Clearing mechanism used for every period of the stage.
    pub mechanism: MechanismTag,
}

impl StageConfig {
    /// Token supply auctioned per period before rescind injections.
    ///
    /// Truncated at the fixed precision: the per-period shares of a stage must
    /// never sum to more than the stage's base supply.
    pub fn base_share(&self) -> Amount {
        div_fixed_floor(self.base_supply, to_amount(self.periods as f64))
    }
}

/// Full tournament configuration, immutable for the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentConfig {
    /// Starting budget per agent, shared across all stages. Never resets.
    pub starting_budget: Amount,
    /// Ordered stage schedule.
    pub stages: Vec<StageConfig>,
    /// Stage-points awarded by stage rank: index 0 is 1st place.
    pub sp_awards: Vec<u32>,
    /// Bonus SP for the top weighted-points agent after the terminal stage.
    pub overall_bonus_sp: u32,
}

impl TournamentConfig {
    /// The canonical three-stage schedule used by reference runs.
    pub fn default_schedule() -> Self {
        let stage = |supply: f64, ppt: f64, floor: f64| StageConfig {
            base_supply: to_amount(supply),
            points_per_token: to_amount(ppt),
            floor: to_amount(floor),
            periods: 9,
            max_bids_per_agent: 3,
            mechanism: MechanismTag::SecondPrice,
        };
        Self {
            starting_budget: to_amount(100_000.0),
            stages: vec![
                stage(900.0, 1.0, 10.00),
                stage(600.0, 1.5, 10.50),
                stage(300.0, 2.5, 11.03),
            ],
            sp_awards: vec![3, 2, 1],
            overall_bonus_sp: 1,
        }
    }

    /// Total number of periods across all stages.
    pub fn total_periods(&self) -> usize {
        self.stages.iter().map(|s| s.periods).sum()
    }

    /// Decompose an absolute period into (stage, period-within-stage).
    ///
    /// Returns `None` when the absolute period lies outside the horizon.
    pub fn position_of(&self, absolute_period: usize) -> Option<(usize, usize)> {
        let mut remaining = absolute_period;
        for (stage, cfg) in self.stages.iter().enumerate() {
            if remaining < cfg.periods {
                return Some((stage, remaining));
            }
            remaining -= cfg.periods;
        }
        None
    }

    /// Validate the configuration. All failures are fatal at construction.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.starting_budget < 0 {
            return Err(ConfigError::NegativeBudget);
        }
        if self.stages.is_empty() {
            return Err(ConfigError::NoStages);
        }
        for (stage, cfg) in self.stages.iter().enumerate() {
            if cfg.periods == 0 {
                return Err(ConfigError::EmptyStage { stage });
            }
            if cfg.floor < 0 {
                return Err(ConfigError::NegativeFloor { stage });
            }
            if cfg.base_supply < 0 {
                return Err(ConfigError::NegativeSupply { stage });
            }
            if cfg.points_per_token < 0 {
                return Err(ConfigError::NegativePoints { stage });
            }
            if cfg.max_bids_per_agent == 0 {
                return Err(ConfigError::ZeroBidCap { stage });
            }
        }
        Ok(())
    }
}

/// Malformed-configuration failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    NegativeBudget,
    NoStages,
    EmptyStage { stage: usize },
    NegativeFloor { stage: usize },
    NegativeSupply { stage: usize },
    NegativePoints { stage: usize },
    ZeroBidCap { stage: usize },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NegativeBudget => write!(f, "starting budget must be non-negative"),
            ConfigError::NoStages => write!(f, "tournament requires at least one stage"),
            ConfigError::EmptyStage { stage } => {
                write!(f, "stage {} has zero periods", stage)
            }
            ConfigError::NegativeFloor { stage } => {
                write!(f, "stage {} has a negative floor price", stage)
            }
            ConfigError::NegativeSupply { stage } => {
                write!(f, "stage {} has negative base supply", stage)
            }
            ConfigError::NegativePoints { stage } => {
                write!(f, "stage {} has a negative points-per-token multiplier", stage)
            }
            ConfigError::ZeroBidCap { stage } => {
                write!(f, "stage {} admits zero bids per agent", stage)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
