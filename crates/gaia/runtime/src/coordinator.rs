//! Coordinator: the serialized facade over every ledger
//!
//! All shared mutable state lives in one [`LedgerState`] behind a tokio
//! `RwLock`. Mutating operations queue on a separate writer mutex, so
//! writers are totally ordered. Each one runs against a staged copy of the
//! state; the copy replaces the live state only after the operation
//! succeeded and its journal entries were appended to the store. The write
//! lock is held just for that swap, so readers never wait on a writer's
//! journal I/O and always see the last committed state.

use crate::access::AccessControl;
use crate::allocation::AllocationLedger;
use crate::breaker::CircuitBreaker;
use crate::clock::{Clock, SystemClock};
use crate::config::CoordinatorConfig;
use crate::governance::GovernanceLedger;
use crate::oracle::OracleBroker;
use crate::stake::{StakeSource, StakeTable};
use crate::store::LedgerStore;
use chrono::{DateTime, Duration, Utc};
use gaia_types::{
    decode_oracle_amount, verify_chain, Action, ActorId, Allocation, BreakerState,
    CoordinatorError, CoordinatorResult, FulfillmentOutcome, JournalCursor, JournalEntry,
    LedgerEvent, OracleRequest, OwnerId, Proposal, ProposalEffect, ProposalId, ProposalState,
    Quantity, RejectReason, RequestId, Role, Stake, VoteRecord,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

/// Everything a mutating operation may touch
#[derive(Debug, Clone)]
struct LedgerState {
    access: AccessControl,
    breaker: CircuitBreaker,
    governance: GovernanceLedger,
    allocations: AllocationLedger,
    broker: OracleBroker,
    cursor: JournalCursor,
}

/// Summary of the coordinator's committed state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorStatus {
    pub paused: bool,
    pub proposals: usize,
    pub allocations: usize,
    pub pending_requests: usize,
    /// Sequence number of the last committed journal entry (0 if none)
    pub journal_head: u64,
}

/// Governance and adaptive resource allocation coordinator
pub struct Coordinator {
    state: RwLock<LedgerState>,
    writer: Mutex<()>,
    stake: Arc<dyn StakeSource>,
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
}

impl Coordinator {
    /// Create a coordinator using the wall clock and the configured stake table
    pub fn new(config: CoordinatorConfig, store: Arc<dyn LedgerStore>) -> Self {
        let stake = Arc::new(StakeTable::from(&config.stakes));
        let state = LedgerState {
            access: AccessControl::from_config(&config.access),
            breaker: CircuitBreaker::new(),
            governance: GovernanceLedger::new(config.governance),
            allocations: AllocationLedger::new(config.allocation),
            broker: OracleBroker::new(config.oracle),
            cursor: JournalCursor::default(),
        };

        Self {
            state: RwLock::new(state),
            writer: Mutex::new(()),
            stake,
            store,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the voting-weight source
    pub fn with_stake_source(mut self, stake: Arc<dyn StakeSource>) -> Self {
        self.stake = stake;
        self
    }

    /// Run `op` as one atomic, serialized step
    ///
    /// Writers queue on `writer`; the state lock is only taken to snapshot
    /// and to publish, never across the journal append.
    async fn commit<T, F>(&self, actor: Option<&ActorId>, op: F) -> CoordinatorResult<T>
    where
        F: FnOnce(&mut LedgerState, DateTime<Utc>, &mut Vec<LedgerEvent>) -> CoordinatorResult<T>,
    {
        let _writer = self.writer.lock().await;
        let now = self.clock.now();

        let mut staged = self.state.read().await.clone();
        let mut events = Vec::new();
        let value = op(&mut staged, now, &mut events)?;

        if !events.is_empty() {
            let entries: Vec<JournalEntry> = events
                .into_iter()
                .map(|event| staged.cursor.seal(actor.cloned(), event, now))
                .collect();
            if let Err(e) = self.store.append(&entries).await {
                if !self.batch_landed(&entries).await {
                    error!(error = %e, "Journal append failed; operation aborted");
                    return Err(CoordinatorError::Storage(e.to_string()));
                }
                warn!(error = %e, "Journal append reported failure but the batch is stored");
            }
            debug!(
                count = entries.len(),
                head = staged.cursor.next_sequence - 1,
                "Journal entries committed"
            );
        }

        *self.state.write().await = staged;
        Ok(value)
    }

    /// Whether the store's tail already holds `entries` after a failed append
    async fn batch_landed(&self, entries: &[JournalEntry]) -> bool {
        match self.store.entries().await {
            Ok(stored) => stored.ends_with(entries),
            Err(e) => {
                error!(error = %e, "Journal read-back failed");
                false
            }
        }
    }

    // --- Governance ---

    /// Submit a proposal; voting opens immediately
    pub async fn create_proposal(
        &self,
        caller: &ActorId,
        description: impl Into<String>,
        target_resource: OwnerId,
        payload: Vec<u8>,
        voting_window: Duration,
    ) -> CoordinatorResult<ProposalId> {
        let description = description.into();
        self.commit(Some(caller), |state, now, journal| {
            state.access.authorize(caller, &Action::CreateProposal)?;
            state.breaker.ensure_running()?;
            state.governance.create_proposal(
                caller,
                description,
                target_resource,
                payload,
                voting_window,
                now,
                journal,
            )
        })
        .await
    }

    /// Cast `voter`'s weighted vote
    pub async fn cast_vote(
        &self,
        caller: &ActorId,
        proposal_id: ProposalId,
        voter: &ActorId,
        support: bool,
        weight: Stake,
    ) -> CoordinatorResult<()> {
        let stake = Arc::clone(&self.stake);
        self.commit(Some(caller), |state, now, journal| {
            state.access.authorize(
                caller,
                &Action::CastVote {
                    voter: voter.clone(),
                },
            )?;
            state.breaker.ensure_running()?;
            state
                .governance
                .cast_vote(proposal_id, voter, support, weight, stake.as_ref(), now, journal)
        })
        .await
    }

    /// Decide a proposal whose voting window has closed
    pub async fn tally(
        &self,
        caller: &ActorId,
        proposal_id: ProposalId,
    ) -> CoordinatorResult<ProposalState> {
        self.commit(Some(caller), |state, now, journal| {
            state.access.authorize(caller, &Action::Tally)?;
            state.breaker.ensure_running()?;
            state.governance.tally(proposal_id, now, journal)
        })
        .await
    }

    /// Apply a passed proposal's effect to its target resource
    pub async fn execute_proposal(
        &self,
        caller: &ActorId,
        proposal_id: ProposalId,
    ) -> CoordinatorResult<()> {
        self.commit(Some(caller), |state, now, journal| {
            state.access.authorize(caller, &Action::ExecuteProposal)?;
            state.breaker.ensure_running()?;

            let LedgerState {
                governance,
                allocations,
                broker,
                ..
            } = state;
            governance.execute(proposal_id, now, journal, |target, effect, effects| {
                match effect {
                    ProposalEffect::Signal => Ok(()),
                    ProposalEffect::Allocate { amount } => allocations
                        .allocate(target, amount.value(), now, effects)
                        .map(|_| ()),
                    ProposalEffect::Rebalance { requested_amount } => {
                        broker.expire_stale_for(target, now, allocations, effects);
                        allocations
                            .request_rebalance(
                                target,
                                requested_amount.value(),
                                broker,
                                now,
                                effects,
                            )
                            .map(|_| ())
                    }
                }
            })
        })
        .await
    }

    // --- Resource allocation ---

    /// Create or increase an owner's allocation; returns the new balance
    pub async fn allocate(
        &self,
        caller: &ActorId,
        owner: &OwnerId,
        amount: f64,
    ) -> CoordinatorResult<Quantity> {
        self.commit(Some(caller), |state, now, journal| {
            state.access.authorize(
                caller,
                &Action::Allocate {
                    owner: owner.clone(),
                },
            )?;
            state.breaker.ensure_running()?;
            state.allocations.allocate(owner, amount, now, journal)
        })
        .await
    }

    /// Ask the oracle to correct an owner's allocation
    ///
    /// A stale request on the same owner is expired first.
    pub async fn request_rebalance(
        &self,
        caller: &ActorId,
        owner: &OwnerId,
        requested_amount: f64,
    ) -> CoordinatorResult<RequestId> {
        self.commit(Some(caller), |state, now, journal| {
            state.access.authorize(
                caller,
                &Action::RequestRebalance {
                    owner: owner.clone(),
                },
            )?;
            state.breaker.ensure_running()?;
            state
                .broker
                .expire_stale_for(owner, now, &mut state.allocations, journal);
            state.allocations.request_rebalance(
                owner,
                requested_amount,
                &mut state.broker,
                now,
                journal,
            )
        })
        .await
    }

    /// Current amount for `owner`; zero when unknown. Never blocked.
    pub async fn get_allocation(&self, owner: &OwnerId) -> f64 {
        self.state.read().await.allocations.get_allocation(owner)
    }

    pub async fn allocation(&self, owner: &OwnerId) -> Option<Allocation> {
        self.state.read().await.allocations.allocation(owner).cloned()
    }

    pub async fn allocations(&self) -> Vec<Allocation> {
        self.state.read().await.allocations.allocations().cloned().collect()
    }

    // --- Oracle ---

    /// Deliver an oracle fulfillment
    ///
    /// Rejections are logged and returned as an outcome, never as an error:
    /// the oracle has no caller waiting on the result.
    pub async fn fulfill(
        &self,
        request_id: RequestId,
        resolved_amount: f64,
    ) -> CoordinatorResult<FulfillmentOutcome> {
        self.commit(None, |state, now, journal| {
            if state.breaker.is_paused() {
                warn!(
                    request_id = %request_id,
                    resolved_amount,
                    "Oracle fulfillment rejected while paused"
                );
                return Ok(FulfillmentOutcome::Rejected {
                    request_id,
                    reason: RejectReason::SystemPaused,
                });
            }
            Ok(state
                .broker
                .fulfill(request_id, resolved_amount, &mut state.allocations, now, journal))
        })
        .await
    }

    /// Decode an opaque oracle payload, then deliver it as [`Self::fulfill`]
    pub async fn fulfill_encoded(
        &self,
        request_id: RequestId,
        payload: &[u8],
    ) -> CoordinatorResult<FulfillmentOutcome> {
        match decode_oracle_amount(payload) {
            Some(amount) => self.fulfill(request_id, amount).await,
            None => {
                warn!(
                    request_id = %request_id,
                    payload_len = payload.len(),
                    "Undecodable oracle payload dropped"
                );
                Ok(FulfillmentOutcome::Rejected {
                    request_id,
                    reason: RejectReason::MalformedPayload,
                })
            }
        }
    }

    /// Administrative expiry sweep; runs even while paused
    pub async fn expire_stale(&self, caller: &ActorId) -> CoordinatorResult<Vec<RequestId>> {
        self.commit(Some(caller), |state, now, journal| {
            state.access.authorize(caller, &Action::ExpireRequests)?;
            if state.breaker.is_paused() {
                state.access.authorize(caller, &Action::BypassBreaker)?;
            }
            Ok(state
                .broker
                .expire_stale(now, &mut state.allocations, journal))
        })
        .await
    }

    /// Background expiry sweep; does nothing while paused
    pub async fn sweep_expired(&self) -> CoordinatorResult<Vec<RequestId>> {
        self.commit(None, |state, now, journal| {
            if state.breaker.is_paused() {
                debug!("Expiry sweep skipped while paused");
                return Ok(Vec::new());
            }
            Ok(state
                .broker
                .expire_stale(now, &mut state.allocations, journal))
        })
        .await
    }

    pub async fn oracle_request(&self, request_id: RequestId) -> Option<OracleRequest> {
        self.state.read().await.broker.request(request_id).cloned()
    }

    pub async fn oracle_requests(&self) -> Vec<OracleRequest> {
        self.state.read().await.broker.requests().cloned().collect()
    }

    // --- Circuit breaker ---

    /// Halt all mutating operations. Idempotent.
    pub async fn pause(&self, caller: &ActorId, reason: impl Into<String>) -> CoordinatorResult<()> {
        let reason = reason.into();
        self.commit(Some(caller), |state, now, journal| {
            state.access.authorize(caller, &Action::Pause)?;
            state.breaker.pause(reason.clone(), caller, now);
            journal.push(LedgerEvent::Paused { reason });
            Ok(())
        })
        .await
    }

    /// Resume operation; administrators only
    pub async fn unpause(&self, caller: &ActorId) -> CoordinatorResult<()> {
        self.commit(Some(caller), |state, _now, journal| {
            state.access.authorize(caller, &Action::Unpause)?;
            if state.breaker.unpause(caller) {
                journal.push(LedgerEvent::Unpaused);
            }
            Ok(())
        })
        .await
    }

    pub async fn is_paused(&self) -> bool {
        self.state.read().await.breaker.is_paused()
    }

    pub async fn breaker_state(&self) -> BreakerState {
        self.state.read().await.breaker.state().clone()
    }

    // --- Access control ---

    /// Grant `role` to `actor`; allowed while paused
    pub async fn grant_role(
        &self,
        caller: &ActorId,
        actor: &ActorId,
        role: Role,
    ) -> CoordinatorResult<bool> {
        self.commit(Some(caller), |state, _now, journal| {
            state.access.authorize(caller, &Action::ManageRoles)?;
            let added = state.access.grant(actor.clone(), role);
            if added {
                info!(caller = %caller, actor = %actor, role = %role, "Role granted");
                journal.push(LedgerEvent::RoleGranted {
                    actor: actor.clone(),
                    role,
                });
            }
            Ok(added)
        })
        .await
    }

    /// Revoke `role` from `actor`; returns false if it was not held
    pub async fn revoke_role(
        &self,
        caller: &ActorId,
        actor: &ActorId,
        role: Role,
    ) -> CoordinatorResult<bool> {
        self.commit(Some(caller), |state, _now, journal| {
            state.access.authorize(caller, &Action::ManageRoles)?;
            let removed = state.access.revoke(actor, role);
            if removed {
                info!(caller = %caller, actor = %actor, role = %role, "Role revoked");
                journal.push(LedgerEvent::RoleRevoked {
                    actor: actor.clone(),
                    role,
                });
            }
            Ok(removed)
        })
        .await
    }

    pub async fn roles_of(&self, actor: &ActorId) -> Vec<Role> {
        self.state.read().await.access.roles_of(actor)
    }

    /// Check `caller` against the current role table without committing
    pub async fn authorize(&self, caller: &ActorId, action: &Action) -> CoordinatorResult<()> {
        self.state.read().await.access.authorize(caller, action)
    }

    // --- Queries ---

    pub async fn proposal(&self, proposal_id: ProposalId) -> Option<Proposal> {
        self.state.read().await.governance.proposal(proposal_id).cloned()
    }

    pub async fn proposals(&self) -> Vec<Proposal> {
        self.state.read().await.governance.proposals().cloned().collect()
    }

    pub async fn votes(&self, proposal_id: ProposalId) -> Vec<VoteRecord> {
        self.state.read().await.governance.votes_for(proposal_id)
    }

    /// Stake `voter` can still commit to new votes
    pub async fn available_stake(&self, voter: &ActorId) -> Stake {
        self.state
            .read()
            .await
            .governance
            .unlocked_stake(voter, self.stake.as_ref())
    }

    pub async fn locked_stake(&self, voter: &ActorId) -> Stake {
        self.state.read().await.governance.locked_stake(voter)
    }

    pub async fn status(&self) -> CoordinatorStatus {
        let state = self.state.read().await;
        CoordinatorStatus {
            paused: state.breaker.is_paused(),
            proposals: state.governance.proposal_count(),
            allocations: state.allocations.len(),
            pending_requests: state.broker.pending_count(),
            journal_head: state.cursor.next_sequence - 1,
        }
    }

    /// Every committed journal entry, read back from the store
    pub async fn journal(&self) -> CoordinatorResult<Vec<JournalEntry>> {
        self.store
            .entries()
            .await
            .map_err(|e| CoordinatorError::Storage(e.to_string()))
    }

    /// Read the journal back and check its hash chain
    pub async fn verify_journal(&self) -> CoordinatorResult<usize> {
        let entries = self.journal().await?;
        verify_chain(&entries).map_err(|e| CoordinatorError::Storage(e.to_string()))?;
        Ok(entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::AccessConfig;
    use crate::store::{InMemoryStore, StoreError, StoreResult};
    use async_trait::async_trait;
    use gaia_types::ErrorKind;
    use tokio::sync::Notify;

    struct FailingStore;

    #[async_trait]
    impl LedgerStore for FailingStore {
        async fn append(&self, _entries: &[JournalEntry]) -> StoreResult<()> {
            Err(StoreError::Unavailable("disk full".into()))
        }

        async fn entries(&self) -> StoreResult<Vec<JournalEntry>> {
            Ok(Vec::new())
        }
    }

    /// Persists every batch, then reports the append as failed
    #[derive(Default)]
    struct LossyAckStore {
        inner: InMemoryStore,
    }

    #[async_trait]
    impl LedgerStore for LossyAckStore {
        async fn append(&self, entries: &[JournalEntry]) -> StoreResult<()> {
            self.inner.append(entries).await?;
            Err(StoreError::Unavailable("acknowledgement lost".into()))
        }

        async fn entries(&self) -> StoreResult<Vec<JournalEntry>> {
            self.inner.entries().await
        }
    }

    /// Holds every append until released
    #[derive(Default)]
    struct GatedStore {
        entered: Notify,
        release: Notify,
        inner: InMemoryStore,
    }

    #[async_trait]
    impl LedgerStore for GatedStore {
        async fn append(&self, entries: &[JournalEntry]) -> StoreResult<()> {
            self.entered.notify_one();
            self.release.notified().await;
            self.inner.append(entries).await
        }

        async fn entries(&self) -> StoreResult<Vec<JournalEntry>> {
            self.inner.entries().await
        }
    }

    fn config() -> CoordinatorConfig {
        let mut config = CoordinatorConfig {
            access: AccessConfig {
                administrators: vec!["ops".into()],
                monitors: vec!["anomaly-monitor".into()],
                participants: vec!["alice".into(), "bob".into(), "owner-x".into()],
                oracles: vec!["price-oracle".into()],
            },
            ..CoordinatorConfig::default()
        };
        config.stakes.insert("alice".into(), 1000);
        config.stakes.insert("bob".into(), 1000);
        config
    }

    fn coordinator(store: Arc<dyn LedgerStore>) -> (Coordinator, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        let coordinator = Coordinator::new(config(), store).with_clock(clock.clone());
        (coordinator, clock)
    }

    fn ops() -> ActorId {
        ActorId::new("ops")
    }

    #[tokio::test]
    async fn test_storage_failure_leaves_no_trace() {
        let (coordinator, _) = coordinator(Arc::new(FailingStore));

        let err = coordinator
            .allocate(&ops(), &OwnerId::new("owner-x"), 100.0)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert_eq!(coordinator.get_allocation(&OwnerId::new("owner-x")).await, 0.0);
        assert!(coordinator.allocation(&OwnerId::new("owner-x")).await.is_none());
        assert_eq!(coordinator.status().await.journal_head, 0);

        let err = coordinator.pause(&ops(), "drill").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(!coordinator.is_paused().await);
    }

    #[tokio::test]
    async fn test_landed_batch_survives_lost_acknowledgement() {
        let (coordinator, _) = coordinator(Arc::new(LossyAckStore::default()));
        let owner = OwnerId::new("owner-x");

        coordinator.allocate(&ops(), &owner, 100.0).await.unwrap();
        coordinator.allocate(&ops(), &owner, 25.0).await.unwrap();

        assert_eq!(coordinator.get_allocation(&owner).await, 125.0);
        assert_eq!(coordinator.status().await.journal_head, 2);
        assert_eq!(coordinator.verify_journal().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_reads_proceed_during_pending_append() {
        let store = Arc::new(GatedStore::default());
        let (coordinator, _) = coordinator(store.clone());
        let coordinator = Arc::new(coordinator);
        let owner = OwnerId::new("owner-x");

        let writer = {
            let coordinator = coordinator.clone();
            let owner = owner.clone();
            tokio::spawn(async move { coordinator.allocate(&ops(), &owner, 100.0).await })
        };
        store.entered.notified().await;

        let read = tokio::time::timeout(std::time::Duration::from_millis(500), async {
            let balance = coordinator.get_allocation(&owner).await;
            let status = coordinator.status().await;
            (balance, status)
        })
        .await
        .expect("reads blocked behind the journal append");
        assert_eq!(read.0, 0.0);
        assert_eq!(read.1.journal_head, 0);

        store.release.notify_one();
        assert_eq!(writer.await.unwrap().unwrap().value(), 100.0);
        assert_eq!(coordinator.get_allocation(&owner).await, 100.0);
        assert_eq!(coordinator.status().await.journal_head, 1);
    }

    #[tokio::test]
    async fn test_failed_effect_aborts_execution() {
        let store = Arc::new(InMemoryStore::new());
        let (coordinator, clock) = coordinator(store);
        let owner = OwnerId::new("owner-x");
        let alice = ActorId::new("alice");

        coordinator.allocate(&ops(), &owner, 100.0).await.unwrap();

        let id = coordinator
            .create_proposal(
                &alice,
                "Rebalance owner-x",
                owner.clone(),
                br#"{"kind":"rebalance","requested_amount":120}"#.to_vec(),
                Duration::days(1),
            )
            .await
            .unwrap();
        coordinator
            .cast_vote(&alice, id, &alice, true, Stake::new(10))
            .await
            .unwrap();
        clock.advance(Duration::days(1));
        coordinator.request_rebalance(&ops(), &owner, 150.0).await.unwrap();
        coordinator.tally(&alice, id).await.unwrap();

        let err = coordinator.execute_proposal(&alice, id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RequestInFlight);
        let proposal = coordinator.proposal(id).await.unwrap();
        assert_eq!(proposal.state, ProposalState::Succeeded);
        assert_eq!(coordinator.locked_stake(&alice).await, Stake::new(10));
    }

    #[tokio::test]
    async fn test_execute_allocate_effect() {
        let store = Arc::new(InMemoryStore::new());
        let (coordinator, clock) = coordinator(store.clone());
        let owner = OwnerId::new("region-1");
        let alice = ActorId::new("alice");

        let id = coordinator
            .create_proposal(
                &alice,
                "Fund region-1",
                owner.clone(),
                br#"{"kind":"allocate","amount":250}"#.to_vec(),
                Duration::hours(1),
            )
            .await
            .unwrap();
        coordinator
            .cast_vote(&alice, id, &alice, true, Stake::new(600))
            .await
            .unwrap();
        assert_eq!(coordinator.available_stake(&alice).await, Stake::new(400));

        clock.advance(Duration::hours(1));
        assert_eq!(
            coordinator.tally(&alice, id).await.unwrap(),
            ProposalState::Succeeded
        );
        coordinator.execute_proposal(&alice, id).await.unwrap();

        assert_eq!(coordinator.get_allocation(&owner).await, 250.0);
        assert_eq!(coordinator.available_stake(&alice).await, Stake::new(1000));

        let err = coordinator.execute_proposal(&alice, id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExecuted);
        assert_eq!(coordinator.get_allocation(&owner).await, 250.0);

        // created, vote, tally, executed, allocated
        assert_eq!(coordinator.verify_journal().await.unwrap(), 5);
        assert_eq!(store.len().await, 5);
    }

    #[tokio::test]
    async fn test_lazy_expiry_before_rebalance() {
        let store = Arc::new(InMemoryStore::new());
        let (coordinator, clock) = coordinator(store);
        let owner = OwnerId::new("owner-x");

        coordinator.allocate(&ops(), &owner, 10.0).await.unwrap();
        let first = coordinator.request_rebalance(&ops(), &owner, 20.0).await.unwrap();
        clock.advance(Duration::hours(2));

        let second = coordinator.request_rebalance(&ops(), &owner, 30.0).await.unwrap();
        assert_eq!(second, first.next());

        let outcome = coordinator.fulfill(first, 99.0).await.unwrap();
        assert_eq!(outcome.reject_reason(), Some(RejectReason::Expired));
        assert_eq!(coordinator.get_allocation(&owner).await, 10.0);
    }

    #[tokio::test]
    async fn test_expiry_while_paused() {
        let store = Arc::new(InMemoryStore::new());
        let (coordinator, clock) = coordinator(store);
        let owner = OwnerId::new("owner-x");

        coordinator.allocate(&ops(), &owner, 10.0).await.unwrap();
        let id = coordinator.request_rebalance(&ops(), &owner, 20.0).await.unwrap();
        coordinator
            .pause(&ActorId::new("anomaly-monitor"), "sensor spike")
            .await
            .unwrap();
        clock.advance(Duration::hours(2));

        assert!(coordinator.sweep_expired().await.unwrap().is_empty());
        let err = coordinator
            .expire_stale(&ActorId::new("alice"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(coordinator.expire_stale(&ops()).await.unwrap(), vec![id]);
        assert!(!coordinator
            .allocation(&owner)
            .await
            .unwrap()
            .has_pending_request());
    }

    #[tokio::test]
    async fn test_fulfillment_waits_out_pause() {
        let store = Arc::new(InMemoryStore::new());
        let (coordinator, _) = coordinator(store);
        let owner = OwnerId::new("owner-x");

        coordinator.allocate(&ops(), &owner, 10.0).await.unwrap();
        let id = coordinator.request_rebalance(&ops(), &owner, 20.0).await.unwrap();
        coordinator.pause(&ops(), "maintenance").await.unwrap();

        let outcome = coordinator.fulfill(id, 15.0).await.unwrap();
        assert_eq!(outcome.reject_reason(), Some(RejectReason::SystemPaused));
        assert!(coordinator.oracle_request(id).await.unwrap().is_pending());

        coordinator.unpause(&ops()).await.unwrap();
        let outcome = coordinator.fulfill_encoded(id, b"15.5").await.unwrap();
        assert!(outcome.is_applied());
        assert_eq!(coordinator.get_allocation(&owner).await, 15.5);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_dropped() {
        let store = Arc::new(InMemoryStore::new());
        let (coordinator, _) = coordinator(store);
        let owner = OwnerId::new("owner-x");

        coordinator.allocate(&ops(), &owner, 10.0).await.unwrap();
        let id = coordinator.request_rebalance(&ops(), &owner, 20.0).await.unwrap();

        let outcome = coordinator.fulfill_encoded(id, b"lots").await.unwrap();
        assert_eq!(outcome.reject_reason(), Some(RejectReason::MalformedPayload));
        assert!(coordinator.oracle_request(id).await.unwrap().is_pending());
    }

    #[tokio::test]
    async fn test_role_management() {
        let store = Arc::new(InMemoryStore::new());
        let (coordinator, _) = coordinator(store);
        let carol = ActorId::new("carol");

        let err = coordinator
            .grant_role(&ActorId::new("alice"), &carol, Role::Participant)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        coordinator.pause(&ops(), "maintenance").await.unwrap();
        assert!(coordinator
            .grant_role(&ops(), &carol, Role::Participant)
            .await
            .unwrap());
        assert!(!coordinator
            .grant_role(&ops(), &carol, Role::Participant)
            .await
            .unwrap());
        assert_eq!(coordinator.roles_of(&carol).await, vec![Role::Participant]);

        let err = coordinator
            .revoke_role(&ActorId::new("alice"), &carol, Role::Participant)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        assert!(coordinator
            .revoke_role(&ops(), &carol, Role::Participant)
            .await
            .unwrap());
        assert!(!coordinator
            .revoke_role(&ops(), &carol, Role::Participant)
            .await
            .unwrap());
        assert!(coordinator.roles_of(&carol).await.is_empty());

        let events: Vec<&str> = coordinator
            .journal()
            .await
            .unwrap()
            .iter()
            .map(|entry| entry.event.name())
            .collect();
        assert_eq!(events, vec!["paused", "role_granted", "role_revoked"]);
    }

    #[tokio::test]
    async fn test_status_counts() {
        let store = Arc::new(InMemoryStore::new());
        let (coordinator, _) = coordinator(store);
        let owner = OwnerId::new("owner-x");

        coordinator.allocate(&ops(), &owner, 1.0).await.unwrap();
        coordinator.request_rebalance(&ops(), &owner, 2.0).await.unwrap();
        coordinator.unpause(&ops()).await.unwrap();

        let status = coordinator.status().await;
        assert!(!status.paused);
        assert_eq!(status.allocations, 1);
        assert_eq!(status.pending_requests, 1);
        assert_eq!(status.proposals, 0);
        // unpausing a running system records nothing
        assert_eq!(status.journal_head, 2);
    }
}
