//! The draw loop: sampling without replacement with late validation.
//!
//! Each iteration draws a random index that has not been tried before,
//! applies the filters that need no remote call, and only then fetches the
//! authoritative account state. Every rejection permanently discards the
//! index, so the loop terminates after at most one validation per delegator.

use crate::config::RaffleCriteria;
use crate::error::RepositoryError;
use crate::repository::DelegatorRepository;
use crate::types::{AccountDetail, Attempt, Delegator, RaffleResult, RejectionReason, Winner};
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Runs the draw-filter-validate loop against a repository.
///
/// State is scoped to one `run` call; the discard set and attempt trace are
/// reset at the start and kept on the engine afterwards for inspection even
/// when a run aborts with a repository error.
pub struct RaffleEngine<R> {
    repository: R,
    criteria: RaffleCriteria,
    rng: StdRng,
    discarded: BTreeSet<usize>,
    attempts: Vec<Attempt>,
}

impl<R: DelegatorRepository> RaffleEngine<R> {
    pub fn new(repository: R, criteria: RaffleCriteria, rng: StdRng) -> Self {
        Self {
            repository,
            criteria,
            rng,
            discarded: BTreeSet::new(),
            attempts: Vec::new(),
        }
    }

    /// Indices tried and rejected so far.
    pub fn discarded(&self) -> &BTreeSet<usize> {
        &self.discarded
    }

    /// Rejected draws in draw order.
    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    /// Run one raffle to completion.
    ///
    /// `latest_epoch` is the current epoch number, fetched once before the
    /// run. A `RepositoryError` aborts immediately without discarding the
    /// in-flight index: a failed lookup is not evidence of ineligibility.
    pub async fn run(&mut self, latest_epoch: u64) -> Result<RaffleResult, RepositoryError> {
        self.discarded.clear();
        self.attempts.clear();

        let delegators = self
            .repository
            .fetch_all_delegators(&self.criteria.pool_id)
            .await?;
        let population = delegators.len();
        info!(population, "starting raffle");

        while self.discarded.len() < population {
            let index = self.draw(population);
            let delegator = &delegators[index];
            info!(index, address = %delegator.stake_address, live_stake = delegator.live_stake, "trying delegator");

            if let Some(reason) = self.local_rejection(delegator) {
                self.reject(index, delegator, reason);
                continue;
            }

            let detail = self
                .repository
                .fetch_account_detail(&delegator.stake_address)
                .await?;
            debug!(index, pool_id = ?detail.pool_id, active_epoch = detail.active_epoch, "fetched account detail");

            match self.validate(&detail, latest_epoch) {
                Some(reason) => self.reject(index, delegator, reason),
                None => {
                    info!(index, address = %delegator.stake_address, "valid stake address found");
                    let related_addresses = self
                        .repository
                        .fetch_related_addresses(&delegator.stake_address)
                        .await?;
                    return Ok(RaffleResult {
                        winner: Some(Winner {
                            index,
                            delegator: delegator.clone(),
                            detail,
                            related_addresses,
                        }),
                        discarded: self.discarded.clone(),
                        attempts: self.attempts.clone(),
                    });
                }
            }
        }

        info!(tried = self.discarded.len(), "no valid stake address found");
        Ok(RaffleResult {
            winner: None,
            discarded: self.discarded.clone(),
            attempts: self.attempts.clone(),
        })
    }

    /// Draw a uniform index that has not been discarded.
    ///
    /// Reject-and-resample: fine for populations of hundreds to low
    /// thousands. The caller guarantees at least one index remains.
    fn draw(&mut self, population: usize) -> usize {
        loop {
            let index = self.rng.gen_range(0..population);
            if !self.discarded.contains(&index) {
                return index;
            }
        }
    }

    /// Checks that need nothing beyond the bulk listing. Applied before any
    /// per-account call, on every draw.
    fn local_rejection(&self, delegator: &Delegator) -> Option<RejectionReason> {
        if let Some(min_stake) = self.criteria.min_stake {
            if delegator.live_stake < min_stake {
                return Some(RejectionReason::BelowMinimumLiveStake);
            }
        }
        if self.criteria.excluded.contains(&delegator.stake_address) {
            return Some(RejectionReason::ExcludedAddress);
        }
        None
    }

    /// Authoritative checks against freshly fetched account state.
    ///
    /// The controlled-amount gate re-applies the stake minimum: the bulk
    /// listing's live stake can be stale or misattributed, so both gates run.
    fn validate(&self, detail: &AccountDetail, latest_epoch: u64) -> Option<RejectionReason> {
        if detail.pool_id.as_deref() != Some(self.criteria.pool_id.as_str()) {
            return Some(RejectionReason::PoolMismatch);
        }
        if let Some(min_epochs) = self.criteria.min_epochs {
            if latest_epoch.saturating_sub(detail.active_epoch) < min_epochs {
                return Some(RejectionReason::InsufficientEpochs);
            }
        }
        if let Some(min_stake) = self.criteria.min_stake {
            if detail.controlled_amount < min_stake {
                return Some(RejectionReason::BelowMinimumControlledStake);
            }
        }
        None
    }

    fn reject(&mut self, index: usize, delegator: &Delegator, reason: RejectionReason) {
        info!(index, address = %delegator.stake_address, reason = reason.as_str(), "discarding delegator");
        self.discarded.insert(index);
        self.attempts.push(Attempt {
            index,
            stake_address: delegator.stake_address.clone(),
            reason,
        });
    }
}
