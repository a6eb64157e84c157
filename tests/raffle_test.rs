//! End-to-end tests for the raffle engine against an in-memory repository.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use stakepool_raffle::config::RaffleCriteria;
use stakepool_raffle::error::RepositoryError;
use stakepool_raffle::repository::DelegatorRepository;
use stakepool_raffle::types::{
    AccountDetail, Delegator, Epoch, PoolMetadata, PoolSummary, RejectionReason,
};
use stakepool_raffle::RaffleEngine;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};

const POOL: &str = "pool1moai";
const LATEST_EPOCH: u64 = 400;

/// In-memory repository with canned data, injected failures, and a recorded
/// log of account-detail lookups.
struct MockRepository {
    delegators: Vec<Delegator>,
    details: HashMap<String, AccountDetail>,
    failing_details: HashSet<String>,
    detail_calls: Mutex<Vec<String>>,
}

impl MockRepository {
    /// Every account delegates to `POOL` with controlled amount equal to its
    /// live stake, unless overridden.
    fn new(delegators: &[(&str, u64)]) -> Self {
        let delegators: Vec<Delegator> = delegators
            .iter()
            .map(|(address, live_stake)| Delegator {
                stake_address: address.to_string(),
                live_stake: *live_stake,
            })
            .collect();
        let details = delegators
            .iter()
            .map(|d| {
                (
                    d.stake_address.clone(),
                    AccountDetail {
                        pool_id: Some(POOL.to_string()),
                        active_epoch: 0,
                        controlled_amount: d.live_stake,
                    },
                )
            })
            .collect();
        Self {
            delegators,
            details,
            failing_details: HashSet::new(),
            detail_calls: Mutex::new(Vec::new()),
        }
    }

    fn with_detail(mut self, address: &str, detail: AccountDetail) -> Self {
        self.details.insert(address.to_string(), detail);
        self
    }

    fn with_failing_detail(mut self, address: &str) -> Self {
        self.failing_details.insert(address.to_string());
        self
    }

    fn detail_calls(&self) -> Vec<String> {
        self.detail_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DelegatorRepository for MockRepository {
    async fn pool_summary(&self, _pool_id: &str) -> Result<PoolSummary, RepositoryError> {
        Ok(PoolSummary {
            live_delegators: self.delegators.len() as u64,
            live_stake: self.delegators.iter().map(|d| d.live_stake).sum(),
            active_stake: 0,
        })
    }

    async fn pool_metadata(&self, _pool_id: &str) -> Result<PoolMetadata, RepositoryError> {
        Ok(PoolMetadata::default())
    }

    async fn latest_epoch(&self) -> Result<Epoch, RepositoryError> {
        Ok(Epoch { epoch: LATEST_EPOCH })
    }

    async fn fetch_all_delegators(&self, _pool_id: &str) -> Result<Vec<Delegator>, RepositoryError> {
        Ok(self.delegators.clone())
    }

    async fn fetch_account_detail(
        &self,
        stake_address: &str,
    ) -> Result<AccountDetail, RepositoryError> {
        self.detail_calls
            .lock()
            .unwrap()
            .push(stake_address.to_string());
        if self.failing_details.contains(stake_address) {
            return Err(RepositoryError::Malformed {
                path: format!("accounts/{stake_address}"),
                reason: "injected failure".to_string(),
            });
        }
        Ok(self.details[stake_address].clone())
    }

    async fn fetch_related_addresses(
        &self,
        stake_address: &str,
    ) -> Result<Vec<String>, RepositoryError> {
        Ok(vec![format!("addr1_for_{stake_address}")])
    }
}

fn criteria() -> RaffleCriteria {
    RaffleCriteria::new(POOL, None, None, vec![]).unwrap()
}

fn engine_with_seed(
    repo: Arc<MockRepository>,
    criteria: RaffleCriteria,
    seed: u64,
) -> RaffleEngine<Arc<MockRepository>> {
    RaffleEngine::new(repo, criteria, StdRng::seed_from_u64(seed))
}

#[tokio::test]
async fn minimum_stake_filters_bulk_live_stake() {
    // B is below the 60 lovelace minimum: never selected, always discarded.
    for seed in 0..20 {
        let repo = Arc::new(MockRepository::new(&[("A", 100), ("B", 50), ("C", 200)]));
        let mut criteria = criteria();
        criteria.min_stake = Some(60);
        let mut engine = engine_with_seed(repo.clone(), criteria, seed);

        let result = engine.run(LATEST_EPOCH).await.unwrap();
        let winner = result.winner.expect("A or C must be selected");
        assert_ne!(winner.delegator.stake_address, "B");
        assert!(["A", "C"].contains(&winner.delegator.stake_address.as_str()));

        // B (index 1) is in the discard set iff it was drawn before the
        // winner; when it was drawn it must carry the cheap-filter reason
        // and must not have triggered a detail lookup.
        for attempt in &result.attempts {
            if attempt.stake_address == "B" {
                assert_eq!(attempt.reason, RejectionReason::BelowMinimumLiveStake);
                assert!(result.discarded.contains(&1));
            }
        }
        assert!(!repo.detail_calls().contains(&"B".to_string()));
    }
}

#[tokio::test]
async fn minimum_stake_discards_cover_whole_population_on_exhaustion() {
    // With the minimum above everyone, every index lands in the discard set
    // and no detail lookup is ever made.
    let repo = Arc::new(MockRepository::new(&[("A", 100), ("B", 50), ("C", 200)]));
    let mut criteria = criteria();
    criteria.min_stake = Some(1_000);
    let mut engine = engine_with_seed(repo.clone(), criteria, 5);

    let result = engine.run(LATEST_EPOCH).await.unwrap();
    assert!(result.is_exhausted());
    assert_eq!(result.discarded, (0..3).collect::<BTreeSet<usize>>());
    assert!(repo.detail_calls().is_empty());
}

#[tokio::test]
async fn excluded_address_is_rejected_without_detail_lookup() {
    for seed in 0..20 {
        let repo = Arc::new(MockRepository::new(&[("A", 100), ("B", 50), ("C", 200)]));
        let criteria = RaffleCriteria::new(POOL, None, None, vec!["A".to_string()]).unwrap();
        let mut engine = engine_with_seed(repo.clone(), criteria, seed);

        let result = engine.run(LATEST_EPOCH).await.unwrap();
        let winner = result.winner.expect("B or C must be selected");
        assert_ne!(winner.delegator.stake_address, "A");
        assert!(!repo.detail_calls().contains(&"A".to_string()));
    }
}

#[tokio::test]
async fn exclusion_applies_even_to_otherwise_perfect_candidate() {
    // A sole delegator that passes every threshold but is excluded: the run
    // exhausts without a single remote lookup.
    let repo = Arc::new(MockRepository::new(&[("A", 1_000_000)]));
    let criteria = RaffleCriteria::new(POOL, Some(100), Some(0), vec!["A".to_string()]).unwrap();
    let mut engine = engine_with_seed(repo.clone(), criteria, 9);

    let result = engine.run(LATEST_EPOCH).await.unwrap();
    assert!(result.is_exhausted());
    assert_eq!(result.attempts[0].reason, RejectionReason::ExcludedAddress);
    assert!(repo.detail_calls().is_empty());
}

#[tokio::test]
async fn pool_mismatch_everywhere_exhausts_with_full_discard_set() {
    let repo = Arc::new(
        MockRepository::new(&[("A", 100), ("B", 50), ("C", 200)])
            .with_detail("A", foreign_account())
            .with_detail("B", foreign_account())
            .with_detail("C", foreign_account()),
    );
    let mut engine = engine_with_seed(repo.clone(), criteria(), 31);

    let result = engine.run(LATEST_EPOCH).await.unwrap();
    assert!(result.is_exhausted());
    assert_eq!(result.discarded.len(), 3);
    assert!(result
        .attempts
        .iter()
        .all(|a| a.reason == RejectionReason::PoolMismatch));
    // Termination bound: one validation per delegator, no more.
    assert_eq!(repo.detail_calls().len(), 3);
}

#[tokio::test]
async fn detail_failure_aborts_run_without_discarding() {
    let repo = Arc::new(MockRepository::new(&[("A", 100)]).with_failing_detail("A"));
    let mut engine = engine_with_seed(repo.clone(), criteria(), 2);

    let err = engine.run(LATEST_EPOCH).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Malformed { .. }));
    assert!(err.to_string().contains("accounts/A"));

    // The failed attempt is not a policy rejection: nothing was discarded.
    assert!(engine.discarded().is_empty());
    assert!(engine.attempts().is_empty());
    assert_eq!(repo.detail_calls().len(), 1);
}

#[tokio::test]
async fn winner_gets_related_addresses() {
    let repo = Arc::new(MockRepository::new(&[("A", 100)]));
    let mut engine = engine_with_seed(repo.clone(), criteria(), 4);

    let result = engine.run(LATEST_EPOCH).await.unwrap();
    let winner = result.winner.unwrap();
    assert_eq!(winner.related_addresses, vec!["addr1_for_A".to_string()]);
}

#[tokio::test]
async fn every_rejection_grows_the_discard_set() {
    // Mixed rejection reasons across a larger population; the discard set
    // grows by exactly one per attempt and the run still terminates.
    let mut population: Vec<(String, u64)> = Vec::new();
    for i in 0..30 {
        population.push((format!("stake{i}"), if i % 3 == 0 { 10 } else { 100 }));
    }
    let refs: Vec<(&str, u64)> = population.iter().map(|(a, s)| (a.as_str(), *s)).collect();

    let mut repo = MockRepository::new(&refs);
    // Every third passing-stake account delegates elsewhere.
    for (i, (address, _)) in population.iter().enumerate() {
        if i % 3 == 1 {
            repo.details.insert(address.clone(), foreign_account());
        }
    }
    let repo = Arc::new(repo);

    let mut criteria = criteria();
    criteria.min_stake = Some(50);
    let mut engine = engine_with_seed(repo.clone(), criteria, 77);

    let result = engine.run(LATEST_EPOCH).await.unwrap();
    let winner = result.winner.expect("i % 3 == 2 accounts are eligible");
    assert_eq!(result.attempts.len(), result.discarded.len());
    assert!(!result.discarded.contains(&winner.index));
    assert!(result.discarded.len() < 30);
}

fn foreign_account() -> AccountDetail {
    AccountDetail {
        pool_id: Some("pool1other".to_string()),
        active_epoch: 0,
        controlled_amount: 1_000_000,
    }
}
