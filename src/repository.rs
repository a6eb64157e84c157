//! The collaborator boundary: on-demand lookups against the remote data
//! source, with pagination hidden behind a single bulk fetch.

use crate::blockfrost::{page_count, BlockfrostClient, PAGE_SIZE};
use crate::error::RepositoryError;
use crate::types::{AccountDetail, Delegator, Epoch, PoolMetadata, PoolSummary};
use async_trait::async_trait;
use tracing::{debug, info};

/// Remote data source for a raffle run.
///
/// The engine only ever talks to this trait; tests drive it with an
/// in-memory implementation.
#[async_trait]
pub trait DelegatorRepository {
    /// Aggregate pool figures; also the source of the population size.
    async fn pool_summary(&self, pool_id: &str) -> Result<PoolSummary, RepositoryError>;

    /// Registered pool metadata for the run report.
    async fn pool_metadata(&self, pool_id: &str) -> Result<PoolMetadata, RepositoryError>;

    /// Latest epoch on chain, fetched once per run.
    async fn latest_epoch(&self) -> Result<Epoch, RepositoryError>;

    /// The complete delegator population, in listing order.
    ///
    /// Any page failure is fatal; a partial population is never returned.
    async fn fetch_all_delegators(&self, pool_id: &str) -> Result<Vec<Delegator>, RepositoryError>;

    /// Authoritative account state for one delegator. Not cached.
    async fn fetch_account_detail(
        &self,
        stake_address: &str,
    ) -> Result<AccountDetail, RepositoryError>;

    /// Payment addresses associated with a stake address. Called once per
    /// run, for the winner only.
    async fn fetch_related_addresses(
        &self,
        stake_address: &str,
    ) -> Result<Vec<String>, RepositoryError>;
}

#[async_trait]
impl<T: DelegatorRepository + Send + Sync + ?Sized> DelegatorRepository for std::sync::Arc<T> {
    async fn pool_summary(&self, pool_id: &str) -> Result<PoolSummary, RepositoryError> {
        (**self).pool_summary(pool_id).await
    }

    async fn pool_metadata(&self, pool_id: &str) -> Result<PoolMetadata, RepositoryError> {
        (**self).pool_metadata(pool_id).await
    }

    async fn latest_epoch(&self) -> Result<Epoch, RepositoryError> {
        (**self).latest_epoch().await
    }

    async fn fetch_all_delegators(&self, pool_id: &str) -> Result<Vec<Delegator>, RepositoryError> {
        (**self).fetch_all_delegators(pool_id).await
    }

    async fn fetch_account_detail(
        &self,
        stake_address: &str,
    ) -> Result<AccountDetail, RepositoryError> {
        (**self).fetch_account_detail(stake_address).await
    }

    async fn fetch_related_addresses(
        &self,
        stake_address: &str,
    ) -> Result<Vec<String>, RepositoryError> {
        (**self).fetch_related_addresses(stake_address).await
    }
}

#[async_trait]
impl DelegatorRepository for BlockfrostClient {
    async fn pool_summary(&self, pool_id: &str) -> Result<PoolSummary, RepositoryError> {
        BlockfrostClient::pool_summary(self, pool_id).await
    }

    async fn pool_metadata(&self, pool_id: &str) -> Result<PoolMetadata, RepositoryError> {
        BlockfrostClient::pool_metadata(self, pool_id).await
    }

    async fn latest_epoch(&self) -> Result<Epoch, RepositoryError> {
        BlockfrostClient::latest_epoch(self).await
    }

    async fn fetch_all_delegators(&self, pool_id: &str) -> Result<Vec<Delegator>, RepositoryError> {
        let summary = BlockfrostClient::pool_summary(self, pool_id).await?;
        let pages = page_count(summary.live_delegators, PAGE_SIZE);
        info!(pool_id, delegators = summary.live_delegators, pages, "fetching delegators");

        let mut delegators = Vec::with_capacity(summary.live_delegators as usize);
        for page in 1..=pages {
            debug!(page, pages, "fetching delegator page");
            let batch = self.delegator_page(pool_id, page).await?;
            delegators.extend(batch);
        }
        info!(fetched = delegators.len(), "delegator population complete");
        Ok(delegators)
    }

    async fn fetch_account_detail(
        &self,
        stake_address: &str,
    ) -> Result<AccountDetail, RepositoryError> {
        self.account_detail(stake_address).await
    }

    async fn fetch_related_addresses(
        &self,
        stake_address: &str,
    ) -> Result<Vec<String>, RepositoryError> {
        self.account_addresses(stake_address).await
    }
}
