//! Error taxonomy for the raffle run.
//!
//! Remote failures are fatal to the run and are never downgraded to a
//! rejection: a lookup that failed must not silently count a delegator as
//! ineligible and bias the draw.

use reqwest::StatusCode;
use thiserror::Error;

/// A remote call against the data source failed.
///
/// Every variant carries the request path so the operator can tell which
/// call, for which address, broke the run.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("request to {path} failed: {source}")]
    Network {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{path} returned HTTP {status}")]
    Status { path: String, status: StatusCode },

    #[error("malformed response from {path}: {reason}")]
    Malformed { path: String, reason: String },
}

/// Invalid run configuration, detected before any remote call is made.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("pool id must not be empty")]
    MissingPoolId,

    #[error("BLOCKFROST_PROJECT_ID is not set")]
    MissingProjectId,

    #[error("requests per second must be at least 1")]
    ZeroRequestRate,

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
