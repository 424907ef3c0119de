//! Proposals and vote records: weighted collective decisions
//!
//! A proposal moves forward only:
//! `Pending → Active → {Succeeded, Failed}`, and `Succeeded → Executed`.
//! `Failed` and `Executed` are terminal. Proposals are never deleted.

use crate::{ActorId, CoordinatorError, CoordinatorResult, OwnerId, ProposalEffect, ProposalId, Stake};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a proposal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProposalState {
    /// Created, not yet open for votes
    #[default]
    Pending,
    /// Open for votes until the deadline
    Active,
    /// Tallied with a winning "for" side, awaiting execution
    Succeeded,
    /// Tallied without a winning "for" side
    Failed,
    /// Effect applied
    Executed,
}

impl ProposalState {
    /// Whether `next` is a legal forward step from this state
    pub fn can_transition_to(&self, next: ProposalState) -> bool {
        matches!(
            (self, next),
            (ProposalState::Pending, ProposalState::Active)
                | (ProposalState::Active, ProposalState::Succeeded)
                | (ProposalState::Active, ProposalState::Failed)
                | (ProposalState::Succeeded, ProposalState::Executed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProposalState::Failed | ProposalState::Executed)
    }

    pub fn accepts_votes(&self) -> bool {
        matches!(self, ProposalState::Active)
    }
}

impl std::fmt::Display for ProposalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProposalState::Pending => write!(f, "Pending"),
            ProposalState::Active => write!(f, "Active"),
            ProposalState::Succeeded => write!(f, "Succeeded"),
            ProposalState::Failed => write!(f, "Failed"),
            ProposalState::Executed => write!(f, "Executed"),
        }
    }
}

/// How a tally with `votes_for == votes_against` resolves
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TiePolicy {
    /// Ties fail
    #[default]
    Fail,
    /// Ties pass
    Pass,
}

impl TiePolicy {
    /// Deterministic tally outcome
    pub fn outcome(&self, votes_for: Stake, votes_against: Stake) -> ProposalState {
        if votes_for > votes_against {
            return ProposalState::Succeeded;
        }
        if votes_for == votes_against && *self == TiePolicy::Pass {
            return ProposalState::Succeeded;
        }
        ProposalState::Failed
    }
}

/// A governance item subject to weighted voting
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Proposal {
    /// Monotonic identifier
    pub id: ProposalId,
    /// Who submitted the proposal
    pub proposer: ActorId,
    /// Human-readable description
    pub description: String,
    /// The allocation owner the effect acts on
    pub target_resource: OwnerId,
    /// Raw payload as submitted
    pub payload: Vec<u8>,
    /// Effect decoded from the payload at submission time
    pub effect: ProposalEffect,
    /// When the proposal was submitted
    pub created_at: DateTime<Utc>,
    /// Votes are accepted strictly before this instant
    pub voting_deadline: DateTime<Utc>,
    /// Total weight in support
    pub votes_for: Stake,
    /// Total weight against
    pub votes_against: Stake,
    /// Current state
    pub state: ProposalState,
    /// When the tally ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
    /// When the effect was applied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executed_at: Option<DateTime<Utc>>,
}

impl Proposal {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ProposalId,
        proposer: ActorId,
        description: impl Into<String>,
        target_resource: OwnerId,
        payload: Vec<u8>,
        effect: ProposalEffect,
        created_at: DateTime<Utc>,
        voting_deadline: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            proposer,
            description: description.into(),
            target_resource,
            payload,
            effect,
            created_at,
            voting_deadline,
            votes_for: Stake::zero(),
            votes_against: Stake::zero(),
            state: ProposalState::Pending,
            decided_at: None,
            executed_at: None,
        }
    }

    /// Move to `next`, refusing any regression or skipped step
    pub fn transition(&mut self, next: ProposalState) -> CoordinatorResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(CoordinatorError::InvalidState(format!(
                "proposal {} cannot move from {} to {}",
                self.id, self.state, next
            )));
        }
        self.state = next;
        Ok(())
    }

    /// Add weight to one side of the tally
    pub fn record_vote(&mut self, support: bool, weight: Stake) {
        if support {
            self.votes_for = self.votes_for.saturating_add(weight);
        } else {
            self.votes_against = self.votes_against.saturating_add(weight);
        }
    }

    pub fn is_voting_open(&self, now: DateTime<Utc>) -> bool {
        now < self.voting_deadline
    }

    pub fn total_votes(&self) -> Stake {
        self.votes_for.saturating_add(self.votes_against)
    }
}

/// One voter's committed weight on one proposal
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub proposal_id: ProposalId,
    pub voter: ActorId,
    /// Stake committed (and locked) at cast time
    pub weight: Stake,
    pub support: bool,
    pub cast_at: DateTime<Utc>,
}
