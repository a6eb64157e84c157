//! Blockfrost API client.
//!
//! HTTP plumbing for the v0 REST surface: auth header, request rate
//! limiting, status and response-shape error mapping. Quantities arrive as
//! decimal strings and are parsed here; a value that does not parse is a
//! malformed response, not a panic.

use crate::config::BlockfrostConfig;
use crate::error::{ConfigError, RepositoryError};
use crate::types::{AccountDetail, Delegator, Epoch, PoolMetadata, PoolSummary};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::debug;

/// Fixed page size of the delegator listing (API maximum).
pub const PAGE_SIZE: u64 = 100;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the Blockfrost REST API.
///
/// All requests are serialized through a direct rate limiter so a run never
/// exceeds the configured request rate.
pub struct BlockfrostClient {
    http: Client,
    base_url: String,
    project_id: String,
    rate_limiter: DefaultDirectRateLimiter,
}

impl BlockfrostClient {
    pub fn new(config: BlockfrostConfig) -> Result<Self, ConfigError> {
        let quota = NonZeroU32::new(config.requests_per_second).ok_or(ConfigError::ZeroRequestRate)?;
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            project_id: config.project_id,
            rate_limiter: RateLimiter::direct(Quota::per_second(quota)),
        })
    }

    /// Issue one GET and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RepositoryError> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}/{}", self.base_url, path);
        debug!(%path, "issuing request");

        let response = self
            .http
            .get(&url)
            .header("project_id", &self.project_id)
            .send()
            .await
            .map_err(|source| RepositoryError::Network {
                path: path.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RepositoryError::Status {
                path: path.to_string(),
                status,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| RepositoryError::Malformed {
                path: path.to_string(),
                reason: source.to_string(),
            })
    }

    pub(crate) async fn pool_summary(&self, pool_id: &str) -> Result<PoolSummary, RepositoryError> {
        let path = format!("pools/{pool_id}");
        let wire: PoolWire = self.get_json(&path).await?;
        Ok(PoolSummary {
            live_delegators: wire.live_delegators,
            live_stake: parse_lovelace(&wire.live_stake, &path)?,
            active_stake: parse_lovelace(&wire.active_stake, &path)?,
        })
    }

    pub(crate) async fn pool_metadata(&self, pool_id: &str) -> Result<PoolMetadata, RepositoryError> {
        let wire: PoolMetadataWire = self.get_json(&format!("pools/{pool_id}/metadata")).await?;
        Ok(PoolMetadata {
            ticker: wire.ticker,
            name: wire.name,
            homepage: wire.homepage,
        })
    }

    pub(crate) async fn latest_epoch(&self) -> Result<Epoch, RepositoryError> {
        let wire: EpochWire = self.get_json("epochs/latest").await?;
        Ok(Epoch { epoch: wire.epoch })
    }

    /// Fetch one page of the delegator listing. Pages are 1-indexed.
    pub(crate) async fn delegator_page(
        &self,
        pool_id: &str,
        page: u64,
    ) -> Result<Vec<Delegator>, RepositoryError> {
        let path = format!("pools/{pool_id}/delegators?count={PAGE_SIZE}&page={page}");
        let wire: Vec<DelegatorWire> = self.get_json(&path).await?;
        wire.into_iter()
            .map(|d| {
                Ok(Delegator {
                    live_stake: parse_lovelace(&d.live_stake, &path)?,
                    stake_address: d.address,
                })
            })
            .collect()
    }

    pub(crate) async fn account_detail(
        &self,
        stake_address: &str,
    ) -> Result<AccountDetail, RepositoryError> {
        let path = format!("accounts/{stake_address}");
        let wire: AccountWire = self.get_json(&path).await?;
        Ok(AccountDetail {
            pool_id: wire.pool_id,
            active_epoch: wire.active_epoch.unwrap_or(0),
            controlled_amount: parse_lovelace(&wire.controlled_amount, &path)?,
        })
    }

    pub(crate) async fn account_addresses(
        &self,
        stake_address: &str,
    ) -> Result<Vec<String>, RepositoryError> {
        let wire: Vec<AddressWire> = self
            .get_json(&format!("accounts/{stake_address}/addresses"))
            .await?;
        Ok(wire.into_iter().map(|a| a.address).collect())
    }
}

/// Number of pages needed to cover the whole population.
pub fn page_count(population: u64, page_size: u64) -> u64 {
    population.div_ceil(page_size)
}

fn parse_lovelace(value: &str, path: &str) -> Result<u64, RepositoryError> {
    value.parse::<u64>().map_err(|_| RepositoryError::Malformed {
        path: path.to_string(),
        reason: format!("expected lovelace quantity, got {value:?}"),
    })
}

// Wire shapes: quantities are decimal strings, several fields nullable.

#[derive(Debug, Deserialize)]
struct PoolWire {
    live_delegators: u64,
    live_stake: String,
    active_stake: String,
}

#[derive(Debug, Deserialize)]
struct PoolMetadataWire {
    ticker: Option<String>,
    name: Option<String>,
    homepage: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EpochWire {
    epoch: u64,
}

#[derive(Debug, Deserialize)]
struct DelegatorWire {
    address: String,
    live_stake: String,
}

#[derive(Debug, Deserialize)]
struct AccountWire {
    pool_id: Option<String>,
    active_epoch: Option<u64>,
    controlled_amount: String,
}

#[derive(Debug, Deserialize)]
struct AddressWire {
    address: String,
}
