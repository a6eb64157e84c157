//! stakepool-raffle - random delegator selection for Cardano stake pools
//!
//! Fetches the full delegator set of a pool from the Blockfrost API and
//! draws one eligible delegator at random, filtering by minimum stake,
//! epochs staked and excluded stake addresses. Useful for stake pool
//! giveaways and raffles.

pub mod blockfrost;
pub mod config;
pub mod engine;
pub mod error;
pub mod report;
pub mod repository;
pub mod types;

// Re-export main types for convenience
pub use blockfrost::BlockfrostClient;
pub use config::{Cli, RaffleCriteria};
pub use engine::RaffleEngine;
pub use error::{ConfigError, RepositoryError};
pub use repository::DelegatorRepository;
pub use types::{Delegator, RaffleResult, RejectionReason, Winner};
