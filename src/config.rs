//! Run configuration: CLI surface and the immutable eligibility criteria.
//!
//! The criteria are built once at startup, validated before any remote call,
//! and passed into the engine by value. Nothing in the draw loop reads the
//! environment.

use crate::error::ConfigError;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;

/// Default Blockfrost mainnet endpoint.
pub const DEFAULT_BASE_URL: &str = "https://cardano-mainnet.blockfrost.io/api/v0";

#[derive(Parser, Debug)]
#[command(name = "stakepool-raffle")]
#[command(about = "Select a random eligible delegator from a Cardano stake pool")]
pub struct Cli {
    #[arg(long, help = "Bech32 pool id to raffle over")]
    pub pool_id: String,

    #[arg(long, help = "Minimum live/controlled stake in lovelace")]
    pub min_stake: Option<u64>,

    #[arg(long, help = "Minimum number of epochs the delegation must have been active")]
    pub min_epochs: Option<u64>,

    #[arg(long = "exclude", help = "Stake address to exclude (repeatable)")]
    pub excluded: Vec<String>,

    #[arg(long, help = "Seed for the draw RNG (omit for a non-deterministic draw)")]
    pub seed: Option<u64>,

    #[arg(long, help = "Blockfrost API base URL", default_value_t = String::from(DEFAULT_BASE_URL))]
    pub base_url: String,

    #[arg(long, help = "Request rate limit against the API", default_value_t = 10)]
    pub requests_per_second: u32,
}

/// Eligibility criteria for one raffle run. Immutable once constructed.
///
/// Unset thresholds mean "no constraint": the corresponding check is skipped
/// entirely, never evaluated against zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaffleCriteria {
    /// Pool the winner must currently delegate to
    pub pool_id: String,
    /// Minimum stake in lovelace, applied to both the bulk live stake and the
    /// authoritative controlled amount
    pub min_stake: Option<u64>,
    /// Minimum epochs the delegation must have been active
    pub min_epochs: Option<u64>,
    /// Stake addresses barred from winning
    pub excluded: HashSet<String>,
}

impl RaffleCriteria {
    pub fn new(
        pool_id: impl Into<String>,
        min_stake: Option<u64>,
        min_epochs: Option<u64>,
        excluded: impl IntoIterator<Item = String>,
    ) -> Result<Self, ConfigError> {
        let pool_id = pool_id.into();
        if pool_id.trim().is_empty() {
            return Err(ConfigError::MissingPoolId);
        }
        Ok(Self {
            pool_id,
            min_stake,
            min_epochs,
            excluded: excluded.into_iter().collect(),
        })
    }
}

/// Connection settings for the Blockfrost client.
#[derive(Debug, Clone)]
pub struct BlockfrostConfig {
    pub base_url: String,
    /// Project id sent as the auth header, read from `BLOCKFROST_PROJECT_ID`
    pub project_id: String,
    pub requests_per_second: u32,
}

impl Cli {
    /// Validate the parsed arguments into criteria plus client settings.
    pub fn into_config(self) -> Result<(RaffleCriteria, BlockfrostConfig, Option<u64>), ConfigError> {
        let criteria =
            RaffleCriteria::new(self.pool_id, self.min_stake, self.min_epochs, self.excluded)?;
        let project_id = env::var("BLOCKFROST_PROJECT_ID")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingProjectId)?;
        if self.requests_per_second == 0 {
            return Err(ConfigError::ZeroRequestRate);
        }
        let client = BlockfrostConfig {
            base_url: self.base_url,
            project_id,
            requests_per_second: self.requests_per_second,
        };
        Ok((criteria, client, self.seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn criteria_rejects_empty_pool_id() {
        let result = RaffleCriteria::new("", None, None, vec![]);
        assert!(matches!(result, Err(ConfigError::MissingPoolId)));

        let result = RaffleCriteria::new("   ", None, None, vec![]);
        assert!(matches!(result, Err(ConfigError::MissingPoolId)));
    }

    #[test]
    fn criteria_collects_exclusions_into_set() {
        let criteria = RaffleCriteria::new(
            "pool1abc",
            Some(1_000_000),
            None,
            vec!["stake1x".to_string(), "stake1x".to_string(), "stake1y".to_string()],
        )
        .unwrap();

        assert_eq!(criteria.excluded.len(), 2);
        assert!(criteria.excluded.contains("stake1x"));
        assert!(criteria.excluded.contains("stake1y"));
    }

    #[test]
    fn unset_thresholds_stay_unset() {
        let criteria = RaffleCriteria::new("pool1abc", None, None, vec![]).unwrap();
        assert_eq!(criteria.min_stake, None);
        assert_eq!(criteria.min_epochs, None);
    }
}
