//! Error types for the coordinator
//!
//! Every caller-visible failure is one of a fixed set of kinds. Bindings
//! (HTTP, RPC, in-process) surface [`ErrorKind`] verbatim.

use crate::{ActorId, OwnerId, ProposalId, RequestId, Stake};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during coordinator operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordinatorError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Voting on proposal {proposal_id} closed at {deadline}")]
    DeadlinePassed {
        proposal_id: ProposalId,
        deadline: DateTime<Utc>,
    },

    #[error("Voter {voter} already voted on proposal {proposal_id}")]
    DuplicateVote {
        proposal_id: ProposalId,
        voter: ActorId,
    },

    #[error("Insufficient stake: requested {requested}, available {available}")]
    InsufficientStake { requested: Stake, available: Stake },

    #[error("Rebalance request {request_id} already in flight for {owner}")]
    RequestInFlight { owner: OwnerId, request_id: RequestId },

    #[error("Proposal {0} already executed")]
    AlreadyExecuted(ProposalId),

    #[error("System paused: {reason}")]
    SystemPaused { reason: String },

    #[error("Forbidden: {actor} may not {action}")]
    Forbidden { actor: ActorId, action: String },

    #[error("Storage failure: {0}")]
    Storage(String),
}

/// Result type for coordinator operations
pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

/// Stable, binding-independent name of an error
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    InvalidState,
    DeadlinePassed,
    DuplicateVote,
    InsufficientStake,
    RequestInFlight,
    AlreadyExecuted,
    SystemPaused,
    Forbidden,
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "InvalidInput",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::InvalidState => "InvalidState",
            ErrorKind::DeadlinePassed => "DeadlinePassed",
            ErrorKind::DuplicateVote => "DuplicateVote",
            ErrorKind::InsufficientStake => "InsufficientStake",
            ErrorKind::RequestInFlight => "RequestInFlight",
            ErrorKind::AlreadyExecuted => "AlreadyExecuted",
            ErrorKind::SystemPaused => "SystemPaused",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::Storage => "Storage",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CoordinatorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoordinatorError::InvalidInput(_) => ErrorKind::InvalidInput,
            CoordinatorError::NotFound(_) => ErrorKind::NotFound,
            CoordinatorError::InvalidState(_) => ErrorKind::InvalidState,
            CoordinatorError::DeadlinePassed { .. } => ErrorKind::DeadlinePassed,
            CoordinatorError::DuplicateVote { .. } => ErrorKind::DuplicateVote,
            CoordinatorError::InsufficientStake { .. } => ErrorKind::InsufficientStake,
            CoordinatorError::RequestInFlight { .. } => ErrorKind::RequestInFlight,
            CoordinatorError::AlreadyExecuted(_) => ErrorKind::AlreadyExecuted,
            CoordinatorError::SystemPaused { .. } => ErrorKind::SystemPaused,
            CoordinatorError::Forbidden { .. } => ErrorKind::Forbidden,
            CoordinatorError::Storage(_) => ErrorKind::Storage,
        }
    }

    pub fn proposal_not_found(id: ProposalId) -> Self {
        CoordinatorError::NotFound(format!("proposal {}", id))
    }

    pub fn allocation_not_found(owner: &OwnerId) -> Self {
        CoordinatorError::NotFound(format!("allocation for {}", owner))
    }
}
