//! Roles and gated actions

use crate::{ActorId, OwnerId};
use serde::{Deserialize, Serialize};

/// Role held by an actor
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Registered participant: proposes, votes, manages its own allocation
    Participant,
    /// Operator: breaker control, role management, maintenance
    Administrator,
    /// Anomaly-monitoring feed: may trip the breaker, nothing else
    Monitor,
    /// Off-chain data provider: delivers oracle fulfillments
    Oracle,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Participant => write!(f, "participant"),
            Role::Administrator => write!(f, "administrator"),
            Role::Monitor => write!(f, "monitor"),
            Role::Oracle => write!(f, "oracle"),
        }
    }
}

/// An operation subject to authorization
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    CreateProposal,
    CastVote { voter: ActorId },
    Tally,
    ExecuteProposal,
    Allocate { owner: OwnerId },
    RequestRebalance { owner: OwnerId },
    ExpireRequests,
    Pause,
    Unpause,
    BypassBreaker,
    ManageRoles,
    Fulfill,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::CreateProposal => write!(f, "create proposals"),
            Action::CastVote { voter } => write!(f, "vote as {}", voter),
            Action::Tally => write!(f, "tally proposals"),
            Action::ExecuteProposal => write!(f, "execute proposals"),
            Action::Allocate { owner } => write!(f, "allocate to {}", owner),
            Action::RequestRebalance { owner } => write!(f, "request a rebalance for {}", owner),
            Action::ExpireRequests => write!(f, "expire oracle requests"),
            Action::Pause => write!(f, "pause the system"),
            Action::Unpause => write!(f, "unpause the system"),
            Action::BypassBreaker => write!(f, "bypass the circuit breaker"),
            Action::ManageRoles => write!(f, "manage roles"),
            Action::Fulfill => write!(f, "deliver oracle fulfillments"),
        }
    }
}
