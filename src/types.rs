//! Core types and data structures for the stake pool raffle.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One delegator of the target pool, as returned by the bulk delegator listing.
///
/// The listing order is stable for the duration of a run; indices into the
/// fetched sequence identify delegators in the discard set and attempt trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegator {
    /// Bech32 stake address of the delegating account
    pub stake_address: String,
    /// Live stake in lovelace, from the bulk listing (may lag chain state)
    pub live_stake: u64,
}

/// Authoritative account state, fetched on demand for a single delegator.
///
/// Never cached across draws: each validation must see current chain state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDetail {
    /// Pool the account currently delegates to, if any
    pub pool_id: Option<String>,
    /// Epoch in which the current delegation became active
    pub active_epoch: u64,
    /// Total controlled amount in lovelace
    pub controlled_amount: u64,
}

/// Aggregate figures for the target pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSummary {
    /// Number of live delegators (drives pagination of the delegator listing)
    pub live_delegators: u64,
    /// Live stake in lovelace
    pub live_stake: u64,
    /// Active stake in lovelace
    pub active_stake: u64,
}

/// Registered metadata for the target pool. All fields are optional upstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolMetadata {
    pub ticker: Option<String>,
    pub name: Option<String>,
    pub homepage: Option<String>,
}

/// The latest epoch on chain, supplied once per run to the engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Epoch {
    pub epoch: u64,
}

/// Why a drawn delegator was rejected.
///
/// Reasons are reported in the attempt trace and the log; the engine never
/// branches on which reason applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionReason {
    /// Live stake from the bulk listing is below the configured minimum
    BelowMinimumLiveStake,
    /// Stake address is on the exclusion list
    ExcludedAddress,
    /// Account does not currently delegate to the target pool
    PoolMismatch,
    /// Delegation has not been active for the configured number of epochs
    InsufficientEpochs,
    /// Authoritative controlled amount is below the configured minimum
    BelowMinimumControlledStake,
}

impl RejectionReason {
    /// String form used in the attempt trace and run report.
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::BelowMinimumLiveStake => "insufficient live stake",
            RejectionReason::ExcludedAddress => "excluded stake address",
            RejectionReason::PoolMismatch => "no pool id match",
            RejectionReason::InsufficientEpochs => "insufficient epochs staked",
            RejectionReason::BelowMinimumControlledStake => "insufficient controlled amount",
        }
    }
}

/// One rejected draw, recorded in draw order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    /// Index of the drawn delegator in the fetched sequence
    pub index: usize,
    pub stake_address: String,
    pub reason: RejectionReason,
}

/// The selected delegator together with the state that validated it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Winner {
    /// Index of the winner in the fetched sequence
    pub index: usize,
    pub delegator: Delegator,
    /// Account detail that passed validation
    pub detail: AccountDetail,
    /// Payment addresses associated with the winning stake address
    pub related_addresses: Vec<String>,
}

/// Terminal outcome of a raffle run.
///
/// `winner` is `None` when every delegator was tried and rejected. The
/// discard set and attempt trace are kept for audit either way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaffleResult {
    pub winner: Option<Winner>,
    /// Indices tried and rejected during the run, in ascending order
    pub discarded: BTreeSet<usize>,
    /// Rejected draws in the order they happened
    pub attempts: Vec<Attempt>,
}

impl RaffleResult {
    /// True when the whole population was tried without finding a winner.
    pub fn is_exhausted(&self) -> bool {
        self.winner.is_none()
    }
}
