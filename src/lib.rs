//! Auction Arena
//!
//! Library crate for deterministic sealed-bid token auction tournaments.
//! Front-ends (CLIs, exporters, batch harnesses) are callers: they supply a
//! `TournamentConfig` and an ordered set of `BiddingAgent`s, and consume the
//! emitted `TournamentResult`.

pub mod engine;

// Re-export the core surface at the crate root for convenience
pub use engine::{
    BidDecision, BidOffer, BiddingAgent, Observation, PeriodRecord, RescindDecision, StageConfig,
    Tournament, TournamentConfig, TournamentError, TournamentResult,
};
