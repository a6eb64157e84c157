//! Main entry point for the stakepool-raffle CLI.

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use stakepool_raffle::repository::DelegatorRepository;
use stakepool_raffle::{report, BlockfrostClient, Cli, RaffleEngine};
use tracing::{info, Level};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();
    let (criteria, client_config, seed) = cli
        .into_config()
        .context("invalid run configuration")?;

    let client = BlockfrostClient::new(client_config).context("failed to build API client")?;

    let epoch = client
        .latest_epoch()
        .await
        .context("failed to fetch latest epoch")?;
    let summary = client
        .pool_summary(&criteria.pool_id)
        .await
        .context("failed to fetch pool summary")?;
    let metadata = client
        .pool_metadata(&criteria.pool_id)
        .await
        .context("failed to fetch pool metadata")?;

    report::print_pool_header(&criteria.pool_id, &summary, &metadata, epoch);
    report::print_criteria(&criteria);

    let rng = match seed {
        Some(seed) => {
            info!(seed, "using seeded draw");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    };

    let mut engine = RaffleEngine::new(client, criteria, rng);
    let result = engine
        .run(epoch.epoch)
        .await
        .context("raffle run aborted")?;

    report::print_outcome(&result);
    Ok(())
}
