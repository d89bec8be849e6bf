//! Auction Tournament Engine
//!
//! Deterministic, synchronous simulation engine for multi-stage sealed-bid
//! token auction tournaments.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Tournament                           │
//! │  (owns store + agents, drives stages, awards SP)            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ per period
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       PeriodRunner                          │
//! │  observe → collect → admit → clear → settle → rescind offer │
//! └─────────────────────────────────────────────────────────────┘
//!         │                    │                    │
//!         ▼                    ▼                    ▼
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ BiddingAgent │     │  Clearing    │     │ Tournament   │
//! │  (trait)     │     │  Mechanism   │     │ Store        │
//! └──────────────┘     └──────────────┘     └──────┬───────┘
//!                                                  │
//!                                                  ▼
//!                                           ┌──────────────┐
//!                                           │ RescindLedger│
//!                                           │ (two queues) │
//!                                           └──────────────┘
//! ```
//!
//! # Determinism Guarantees
//!
//! - One thread, no suspension points: agents are consulted in registration
//!   order and every decision returns before the next agent is asked
//! - Fixed-point arithmetic at 8 fractional digits with banker's rounding;
//!   pro-rata shares sum exactly to the residual supply
//! - FIFO tiebreaks via admission-order submission timestamps
//! - Agents that randomise carry a caller-seeded `ChaCha8Rng`

pub mod agent;
pub mod amount;
pub mod bidders;
pub mod config;
pub mod driver;
pub mod mechanism;
pub mod observation;
pub mod period;
pub mod rescind;
pub mod result;
pub mod store;
pub mod types;

#[cfg(test)]
mod store_tests;

// Re-exports for convenience
pub use agent::{BidDecision, BidOffer, BiddingAgent, RescindDecision};
pub use amount::{from_amount, to_amount, Amount, AMOUNT_SCALE};
pub use bidders::{FailingBidder, IncrementBidder, RandomBidder, SkipBidder};
pub use config::{ConfigError, StageConfig, TournamentConfig};
pub use driver::{Tournament, TournamentError};
pub use mechanism::{
    all_tags, is_available, make_mechanism, resolve, ClearingMechanism, ClearingOutcome,
    MechanismError, MechanismTag, SecondPriceMechanism, UniformPriceMechanism,
};
pub use observation::{LeaderboardRow, Observation};
pub use period::{PeriodParams, PeriodRunner};
pub use rescind::{RescindLedger, RESCIND_DELAY};
pub use result::{AgentSummary, LeaderboardEntry, TournamentResult};
pub use store::{AgentState, StoreError, TournamentStore};
pub use types::{
    AgentId, Allocation, Bid, Holding, PendingRescind, PeriodRecord, Phase, PrivateRescindInfo,
    SupplyInjection,
};
