//! Governance Ledger: proposal lifecycle and weighted voting
//!
//! Proposals are created straight into `Active`, collect at most one vote per
//! voter until their deadline, are tallied exactly once and, if they pass,
//! executed exactly once. Proposals and votes are never removed.
//!
//! Each cast vote locks the committed weight against the proposal. Locks on
//! the losing side are released at tally; locks on a passing side are
//! released when the proposal executes.

use crate::config::GovernanceConfig;
use crate::stake::StakeSource;
use chrono::{DateTime, Duration, Utc};
use gaia_types::{
    ActorId, CoordinatorError, CoordinatorResult, LedgerEvent, OwnerId, Proposal, ProposalEffect,
    ProposalId, ProposalState, Stake, VoteRecord,
};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// Owns proposals, votes and stake locks
#[derive(Debug, Clone)]
pub struct GovernanceLedger {
    config: GovernanceConfig,
    proposals: BTreeMap<ProposalId, Proposal>,
    votes: HashMap<ProposalId, BTreeMap<ActorId, VoteRecord>>,
    locks: HashMap<ActorId, BTreeMap<ProposalId, Stake>>,
    next_id: ProposalId,
}

impl GovernanceLedger {
    pub fn new(config: GovernanceConfig) -> Self {
        Self {
            config,
            proposals: BTreeMap::new(),
            votes: HashMap::new(),
            locks: HashMap::new(),
            next_id: ProposalId::first(),
        }
    }

    /// Submit a proposal and open it for votes
    #[allow(clippy::too_many_arguments)]
    pub fn create_proposal(
        &mut self,
        proposer: &ActorId,
        description: impl Into<String>,
        target_resource: OwnerId,
        payload: Vec<u8>,
        voting_window: Duration,
        now: DateTime<Utc>,
        journal: &mut Vec<LedgerEvent>,
    ) -> CoordinatorResult<ProposalId> {
        if voting_window <= Duration::zero() {
            return Err(CoordinatorError::InvalidInput(format!(
                "voting window must be positive, got {}s",
                voting_window.num_seconds()
            )));
        }
        let voting_deadline = now.checked_add_signed(voting_window).ok_or_else(|| {
            CoordinatorError::InvalidInput("voting window out of range".to_string())
        })?;
        let effect = ProposalEffect::decode(&payload)?;

        let id = self.next_id;
        let mut proposal = Proposal::new(
            id,
            proposer.clone(),
            description,
            target_resource,
            payload,
            effect,
            now,
            voting_deadline,
        );
        proposal.transition(ProposalState::Active)?;

        info!(
            proposal_id = %id,
            proposer = %proposer,
            target = %proposal.target_resource,
            effect = proposal.effect.name(),
            deadline = %voting_deadline,
            "Proposal created"
        );

        journal.push(LedgerEvent::ProposalCreated {
            proposal_id: id,
            proposer: proposer.clone(),
            target_resource: proposal.target_resource.clone(),
            effect: proposal.effect.clone(),
            voting_deadline,
        });

        self.proposals.insert(id, proposal);
        self.next_id = id.next();
        Ok(id)
    }

    /// Record a weighted vote and lock the committed stake
    #[allow(clippy::too_many_arguments)]
    pub fn cast_vote(
        &mut self,
        proposal_id: ProposalId,
        voter: &ActorId,
        support: bool,
        weight: Stake,
        stake: &dyn StakeSource,
        now: DateTime<Utc>,
        journal: &mut Vec<LedgerEvent>,
    ) -> CoordinatorResult<()> {
        let proposal = self
            .proposals
            .get(&proposal_id)
            .ok_or_else(|| CoordinatorError::proposal_not_found(proposal_id))?;

        if !proposal.state.accepts_votes() {
            return Err(CoordinatorError::InvalidState(format!(
                "proposal {} is {}, not Active",
                proposal_id, proposal.state
            )));
        }
        if !proposal.is_voting_open(now) {
            return Err(CoordinatorError::DeadlinePassed {
                proposal_id,
                deadline: proposal.voting_deadline,
            });
        }
        if self.has_voted(proposal_id, voter) {
            return Err(CoordinatorError::DuplicateVote {
                proposal_id,
                voter: voter.clone(),
            });
        }

        if weight.is_zero() {
            return Err(CoordinatorError::InvalidInput(
                "vote weight must be positive".to_string(),
            ));
        }
        let available = self.unlocked_stake(voter, stake);
        if weight > available {
            warn!(
                proposal_id = %proposal_id,
                voter = %voter,
                requested = weight.0,
                available = available.0,
                "Vote exceeds available stake"
            );
            return Err(CoordinatorError::InsufficientStake {
                requested: weight,
                available,
            });
        }

        if let Some(proposal) = self.proposals.get_mut(&proposal_id) {
            proposal.record_vote(support, weight);
        }
        self.votes.entry(proposal_id).or_default().insert(
            voter.clone(),
            VoteRecord {
                proposal_id,
                voter: voter.clone(),
                weight,
                support,
                cast_at: now,
            },
        );
        self.locks
            .entry(voter.clone())
            .or_default()
            .insert(proposal_id, weight);

        info!(
            proposal_id = %proposal_id,
            voter = %voter,
            support,
            weight = weight.0,
            "Vote cast"
        );

        journal.push(LedgerEvent::VoteCast {
            proposal_id,
            voter: voter.clone(),
            weight,
            support,
        });
        Ok(())
    }

    /// Close voting and decide the proposal
    pub fn tally(
        &mut self,
        proposal_id: ProposalId,
        now: DateTime<Utc>,
        journal: &mut Vec<LedgerEvent>,
    ) -> CoordinatorResult<ProposalState> {
        let tie_policy = self.config.tie_policy;
        let proposal = self
            .proposals
            .get_mut(&proposal_id)
            .ok_or_else(|| CoordinatorError::proposal_not_found(proposal_id))?;

        if proposal.state != ProposalState::Active {
            return Err(CoordinatorError::InvalidState(format!(
                "proposal {} is {}, only Active proposals can be tallied",
                proposal_id, proposal.state
            )));
        }
        if proposal.is_voting_open(now) {
            return Err(CoordinatorError::InvalidState(format!(
                "voting on proposal {} is open until {}",
                proposal_id, proposal.voting_deadline
            )));
        }

        let outcome = tie_policy.outcome(proposal.votes_for, proposal.votes_against);
        proposal.transition(outcome)?;
        proposal.decided_at = Some(now);

        let (votes_for, votes_against) = (proposal.votes_for, proposal.votes_against);

        info!(
            proposal_id = %proposal_id,
            outcome = %outcome,
            votes_for = votes_for.0,
            votes_against = votes_against.0,
            "Proposal tallied"
        );

        match outcome {
            // Winners stay locked until execution
            ProposalState::Succeeded => self.release_locks(proposal_id, |vote| !vote.support),
            // Failed is terminal: nothing is left to execute
            _ => self.release_locks(proposal_id, |_| true),
        }

        journal.push(LedgerEvent::ProposalTallied {
            proposal_id,
            outcome,
            votes_for,
            votes_against,
        });
        Ok(outcome)
    }

    /// Apply a passed proposal's effect exactly once
    ///
    /// `apply` receives the target resource and decoded effect. If it fails,
    /// the proposal stays `Succeeded` and nothing is recorded.
    pub fn execute<F>(
        &mut self,
        proposal_id: ProposalId,
        now: DateTime<Utc>,
        journal: &mut Vec<LedgerEvent>,
        apply: F,
    ) -> CoordinatorResult<()>
    where
        F: FnOnce(&OwnerId, &ProposalEffect, &mut Vec<LedgerEvent>) -> CoordinatorResult<()>,
    {
        let proposal = self
            .proposals
            .get(&proposal_id)
            .ok_or_else(|| CoordinatorError::proposal_not_found(proposal_id))?;

        match proposal.state {
            ProposalState::Succeeded => {}
            ProposalState::Executed => {
                return Err(CoordinatorError::AlreadyExecuted(proposal_id));
            }
            other => {
                return Err(CoordinatorError::InvalidState(format!(
                    "proposal {} is {}, only Succeeded proposals can be executed",
                    proposal_id, other
                )));
            }
        }

        let target = proposal.target_resource.clone();
        let effect = proposal.effect.clone();

        let mut effect_events = Vec::new();
        apply(&target, &effect, &mut effect_events)?;

        if let Some(proposal) = self.proposals.get_mut(&proposal_id) {
            proposal.transition(ProposalState::Executed)?;
            proposal.executed_at = Some(now);
        }
        self.release_locks(proposal_id, |_| true);

        info!(
            proposal_id = %proposal_id,
            target = %target,
            effect = effect.name(),
            "Proposal executed"
        );

        journal.push(LedgerEvent::ProposalExecuted {
            proposal_id,
            effect,
        });
        journal.extend(effect_events);
        Ok(())
    }

    fn release_locks(&mut self, proposal_id: ProposalId, release: impl Fn(&VoteRecord) -> bool) {
        let Some(votes) = self.votes.get(&proposal_id) else {
            return;
        };
        for vote in votes.values().filter(|vote| release(vote)) {
            if let Some(held) = self.locks.get_mut(&vote.voter) {
                if held.remove(&proposal_id).is_some() {
                    debug!(
                        proposal_id = %proposal_id,
                        voter = %vote.voter,
                        weight = vote.weight.0,
                        "Stake released"
                    );
                }
                if held.is_empty() {
                    self.locks.remove(&vote.voter);
                }
            }
        }
    }

    pub fn has_voted(&self, proposal_id: ProposalId, voter: &ActorId) -> bool {
        self.votes
            .get(&proposal_id)
            .map(|votes| votes.contains_key(voter))
            .unwrap_or(false)
    }

    /// Stake currently committed to undecided or unexecuted proposals
    pub fn locked_stake(&self, voter: &ActorId) -> Stake {
        self.locks
            .get(voter)
            .map(|held| held.values().copied().sum())
            .unwrap_or_default()
    }

    /// Stake the voter may still commit
    pub fn unlocked_stake(&self, voter: &ActorId, stake: &dyn StakeSource) -> Stake {
        stake
            .available_stake(voter)
            .saturating_sub(self.locked_stake(voter))
    }

    pub fn proposal(&self, proposal_id: ProposalId) -> Option<&Proposal> {
        self.proposals.get(&proposal_id)
    }

    pub fn proposals(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.values()
    }

    pub fn votes_for(&self, proposal_id: ProposalId) -> Vec<VoteRecord> {
        self.votes
            .get(&proposal_id)
            .map(|votes| votes.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn proposal_count(&self) -> usize {
        self.proposals.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stake::StakeTable;
    use gaia_types::{ErrorKind, Quantity, TiePolicy};

    fn stakes() -> StakeTable {
        StakeTable::new()
            .with_stake("alice", 500)
            .with_stake("bob", 300)
            .with_stake("carol", 300)
    }

    fn open_proposal(
        ledger: &mut GovernanceLedger,
        now: DateTime<Utc>,
        payload: &[u8],
    ) -> ProposalId {
        let mut journal = Vec::new();
        ledger
            .create_proposal(
                &ActorId::new("alice"),
                "Fund region-1 water",
                OwnerId::new("region-1"),
                payload.to_vec(),
                Duration::days(7),
                now,
                &mut journal,
            )
            .unwrap()
    }

    #[test]
    fn test_create_opens_voting() {
        let mut ledger = GovernanceLedger::new(GovernanceConfig::default());
        let now = Utc::now();
        let mut journal = Vec::new();

        let id = ledger
            .create_proposal(
                &ActorId::new("alice"),
                "Signal",
                OwnerId::new("region-1"),
                Vec::new(),
                Duration::days(7),
                now,
                &mut journal,
            )
            .unwrap();

        assert_eq!(id, ProposalId(1));
        let proposal = ledger.proposal(id).unwrap();
        assert_eq!(proposal.state, ProposalState::Active);
        assert_eq!(proposal.voting_deadline, now + Duration::days(7));
        assert_eq!(journal.len(), 1);

        let second = open_proposal(&mut ledger, now, b"");
        assert_eq!(second, ProposalId(2));
    }

    #[test]
    fn test_create_rejects_bad_window_and_payload() {
        let mut ledger = GovernanceLedger::new(GovernanceConfig::default());
        let mut journal = Vec::new();
        let alice = ActorId::new("alice");

        let err = ledger
            .create_proposal(
                &alice,
                "zero window",
                OwnerId::new("r"),
                Vec::new(),
                Duration::zero(),
                Utc::now(),
                &mut journal,
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = ledger
            .create_proposal(
                &alice,
                "garbage",
                OwnerId::new("r"),
                b"{not json".to_vec(),
                Duration::days(1),
                Utc::now(),
                &mut journal,
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(ledger.proposal_count(), 0);
        assert!(journal.is_empty());
    }

    #[test]
    fn test_vote_validation_order() {
        let mut ledger = GovernanceLedger::new(GovernanceConfig::default());
        let now = Utc::now();
        let id = open_proposal(&mut ledger, now, b"");
        let stakes = stakes();
        let alice = ActorId::new("alice");
        let mut journal = Vec::new();

        let err = ledger
            .cast_vote(ProposalId(99), &alice, true, Stake::new(1), &stakes, now, &mut journal)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = ledger
            .cast_vote(id, &alice, true, Stake::zero(), &stakes, now, &mut journal)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = ledger
            .cast_vote(id, &alice, true, Stake::new(501), &stakes, now, &mut journal)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientStake);

        ledger
            .cast_vote(id, &alice, true, Stake::new(500), &stakes, now, &mut journal)
            .unwrap();
        let err = ledger
            .cast_vote(id, &alice, false, Stake::new(1), &stakes, now, &mut journal)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateVote);

        // Weight is judged alongside stake, after the proposal checks
        let err = ledger
            .cast_vote(id, &alice, true, Stake::zero(), &stakes, now, &mut journal)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateVote);
        let err = ledger
            .cast_vote(ProposalId(99), &alice, true, Stake::zero(), &stakes, now, &mut journal)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let deadline = now + Duration::days(7);
        let err = ledger
            .cast_vote(id, &ActorId::new("bob"), false, Stake::new(1), &stakes, deadline, &mut journal)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeadlinePassed);
        let err = ledger
            .cast_vote(id, &ActorId::new("bob"), false, Stake::zero(), &stakes, deadline, &mut journal)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeadlinePassed);
    }

    #[test]
    fn test_locked_stake_limits_concurrent_votes() {
        let mut ledger = GovernanceLedger::new(GovernanceConfig::default());
        let now = Utc::now();
        let first = open_proposal(&mut ledger, now, b"");
        let second = open_proposal(&mut ledger, now, b"");
        let stakes = stakes();
        let bob = ActorId::new("bob");
        let mut journal = Vec::new();

        ledger
            .cast_vote(first, &bob, true, Stake::new(200), &stakes, now, &mut journal)
            .unwrap();
        assert_eq!(ledger.locked_stake(&bob), Stake::new(200));

        let err = ledger
            .cast_vote(second, &bob, true, Stake::new(101), &stakes, now, &mut journal)
            .unwrap_err();
        assert_eq!(
            err,
            CoordinatorError::InsufficientStake {
                requested: Stake::new(101),
                available: Stake::new(100),
            }
        );
        ledger
            .cast_vote(second, &bob, true, Stake::new(100), &stakes, now, &mut journal)
            .unwrap();
        assert!(ledger.unlocked_stake(&bob, &stakes).is_zero());
    }

    #[test]
    fn test_tally_succeeds_and_releases_losers() {
        let mut ledger = GovernanceLedger::new(GovernanceConfig::default());
        let now = Utc::now();
        let id = open_proposal(&mut ledger, now, b"");
        let stakes = stakes();
        let alice = ActorId::new("alice");
        let bob = ActorId::new("bob");
        let mut journal = Vec::new();

        ledger
            .cast_vote(id, &alice, true, Stake::new(500), &stakes, now, &mut journal)
            .unwrap();
        ledger
            .cast_vote(id, &bob, false, Stake::new(300), &stakes, now, &mut journal)
            .unwrap();

        let err = ledger.tally(id, now, &mut journal).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        let after = now + Duration::days(7);
        assert_eq!(
            ledger.tally(id, after, &mut journal).unwrap(),
            ProposalState::Succeeded
        );
        let proposal = ledger.proposal(id).unwrap();
        assert_eq!(proposal.votes_for, Stake::new(500));
        assert_eq!(proposal.decided_at, Some(after));

        assert_eq!(ledger.locked_stake(&alice), Stake::new(500));
        assert!(ledger.locked_stake(&bob).is_zero());

        let err = ledger.tally(id, after, &mut journal).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_tie_policy() {
        let now = Utc::now();
        let after = now + Duration::days(8);
        let stakes = stakes();

        for (policy, expected) in [
            (TiePolicy::Fail, ProposalState::Failed),
            (TiePolicy::Pass, ProposalState::Succeeded),
        ] {
            let mut ledger = GovernanceLedger::new(GovernanceConfig {
                tie_policy: policy,
                ..GovernanceConfig::default()
            });
            let id = open_proposal(&mut ledger, now, b"");
            let mut journal = Vec::new();
            ledger
                .cast_vote(id, &ActorId::new("bob"), true, Stake::new(300), &stakes, now, &mut journal)
                .unwrap();
            ledger
                .cast_vote(id, &ActorId::new("carol"), false, Stake::new(300), &stakes, now, &mut journal)
                .unwrap();
            assert_eq!(ledger.tally(id, after, &mut journal).unwrap(), expected);
        }
    }

    #[test]
    fn test_failed_proposal_releases_every_lock() {
        let now = Utc::now();
        let after = now + Duration::days(8);
        let stakes = stakes();
        let bob = ActorId::new("bob");
        let carol = ActorId::new("carol");

        let mut ledger = GovernanceLedger::new(GovernanceConfig::default());
        let id = open_proposal(&mut ledger, now, b"");
        let mut journal = Vec::new();
        ledger
            .cast_vote(id, &bob, true, Stake::new(100), &stakes, now, &mut journal)
            .unwrap();
        ledger
            .cast_vote(id, &carol, false, Stake::new(200), &stakes, now, &mut journal)
            .unwrap();
        assert_eq!(ledger.locked_stake(&carol), Stake::new(200));
        assert_eq!(ledger.tally(id, after, &mut journal).unwrap(), ProposalState::Failed);

        // The winning against side has no execution to wait for
        assert!(ledger.locked_stake(&bob).is_zero());
        assert!(ledger.locked_stake(&carol).is_zero());
        assert_eq!(ledger.unlocked_stake(&carol, &stakes), stakes.available_stake(&carol));
    }

    #[test]
    fn test_execute_once() {
        let mut ledger = GovernanceLedger::new(GovernanceConfig::default());
        let now = Utc::now();
        let id = open_proposal(&mut ledger, now, br#"{"kind":"allocate","amount":250}"#);
        let stakes = stakes();
        let alice = ActorId::new("alice");
        let mut journal = Vec::new();

        let err = ledger
            .execute(id, now, &mut journal, |_, _, _| Ok(()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        ledger
            .cast_vote(id, &alice, true, Stake::new(400), &stakes, now, &mut journal)
            .unwrap();
        ledger.tally(id, now + Duration::days(7), &mut journal).unwrap();

        let mut applied = Vec::new();
        ledger
            .execute(id, now, &mut journal, |target, effect, _| {
                applied.push((target.clone(), effect.clone()));
                Ok(())
            })
            .unwrap();
        assert_eq!(
            applied,
            vec![(
                OwnerId::new("region-1"),
                ProposalEffect::Allocate {
                    amount: Quantity::new(250.0).unwrap()
                }
            )]
        );
        assert_eq!(ledger.proposal(id).unwrap().state, ProposalState::Executed);
        assert!(ledger.locked_stake(&alice).is_zero());

        let err = ledger
            .execute(id, now, &mut journal, |_, _, _| Ok(()))
            .unwrap_err();
        assert_eq!(err, CoordinatorError::AlreadyExecuted(id));
    }

    #[test]
    fn test_failed_effect_keeps_proposal_succeeded() {
        let mut ledger = GovernanceLedger::new(GovernanceConfig::default());
        let now = Utc::now();
        let id = open_proposal(&mut ledger, now, b"");
        let stakes = stakes();
        let mut journal = Vec::new();
        ledger
            .cast_vote(id, &ActorId::new("alice"), true, Stake::new(1), &stakes, now, &mut journal)
            .unwrap();
        ledger.tally(id, now + Duration::days(7), &mut journal).unwrap();
        let recorded = journal.len();

        let err = ledger
            .execute(id, now, &mut journal, |_, _, _| {
                Err(CoordinatorError::InvalidState("effect refused".into()))
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(ledger.proposal(id).unwrap().state, ProposalState::Succeeded);
        assert_eq!(journal.len(), recorded);
    }
}
