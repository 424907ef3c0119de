//! Audit journal: one entry per committed mutation
//!
//! Entries are numbered from 1 and linked by blake3 hashes. Each entry's
//! hash covers the previous hash, its own sequence number and timestamp, and
//! the JSON encoding of its event, so any rewrite of history breaks the
//! chain from that point on.

use crate::{
    ActorId, OwnerId, ProposalEffect, ProposalId, ProposalState, Quantity, RequestId, Role, Stake,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// `prev_hash` of the first entry
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// A committed state change
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    ProposalCreated {
        proposal_id: ProposalId,
        proposer: ActorId,
        target_resource: OwnerId,
        effect: ProposalEffect,
        voting_deadline: DateTime<Utc>,
    },
    VoteCast {
        proposal_id: ProposalId,
        voter: ActorId,
        weight: Stake,
        support: bool,
    },
    ProposalTallied {
        proposal_id: ProposalId,
        outcome: ProposalState,
        votes_for: Stake,
        votes_against: Stake,
    },
    ProposalExecuted {
        proposal_id: ProposalId,
        effect: ProposalEffect,
    },
    Allocated {
        owner_id: OwnerId,
        amount: Quantity,
        balance: Quantity,
    },
    RebalanceRequested {
        request_id: RequestId,
        owner_id: OwnerId,
        requested_amount: Quantity,
        expires_at: DateTime<Utc>,
    },
    FulfillmentApplied {
        request_id: RequestId,
        owner_id: OwnerId,
        amount: Quantity,
    },
    RequestsExpired {
        request_ids: Vec<RequestId>,
    },
    Paused {
        reason: String,
    },
    Unpaused,
    RoleGranted {
        actor: ActorId,
        role: Role,
    },
    RoleRevoked {
        actor: ActorId,
        role: Role,
    },
}

impl LedgerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::ProposalCreated { .. } => "proposal_created",
            LedgerEvent::VoteCast { .. } => "vote_cast",
            LedgerEvent::ProposalTallied { .. } => "proposal_tallied",
            LedgerEvent::ProposalExecuted { .. } => "proposal_executed",
            LedgerEvent::Allocated { .. } => "allocated",
            LedgerEvent::RebalanceRequested { .. } => "rebalance_requested",
            LedgerEvent::FulfillmentApplied { .. } => "fulfillment_applied",
            LedgerEvent::RequestsExpired { .. } => "requests_expired",
            LedgerEvent::Paused { .. } => "paused",
            LedgerEvent::Unpaused => "unpaused",
            LedgerEvent::RoleGranted { .. } => "role_granted",
            LedgerEvent::RoleRevoked { .. } => "role_revoked",
        }
    }
}

/// A sealed, hash-linked journal record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub sequence: u64,
    pub entry_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    /// `None` for system-initiated changes (the expiry sweeper)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<ActorId>,
    pub event: LedgerEvent,
    pub prev_hash: String,
    pub hash: String,
}

impl JournalEntry {
    /// Recompute this entry's hash from its contents
    pub fn expected_hash(&self) -> String {
        compute_hash(&self.prev_hash, self.sequence, self.recorded_at, &self.event)
    }
}

/// Position of the journal head
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalCursor {
    pub next_sequence: u64,
    pub head_hash: String,
}

impl Default for JournalCursor {
    fn default() -> Self {
        Self {
            next_sequence: 1,
            head_hash: GENESIS_HASH.to_string(),
        }
    }
}

impl JournalCursor {
    /// Seal `event` as the next entry and advance the head
    pub fn seal(
        &mut self,
        actor: Option<ActorId>,
        event: LedgerEvent,
        recorded_at: DateTime<Utc>,
    ) -> JournalEntry {
        let hash = compute_hash(&self.head_hash, self.next_sequence, recorded_at, &event);
        let entry = JournalEntry {
            sequence: self.next_sequence,
            entry_id: Uuid::new_v4(),
            recorded_at,
            actor,
            event,
            prev_hash: self.head_hash.clone(),
            hash: hash.clone(),
        };
        self.next_sequence += 1;
        self.head_hash = hash;
        entry
    }
}

/// blake3 over `prev_hash || sequence || recorded_at || event`
pub fn compute_hash(
    prev_hash: &str,
    sequence: u64,
    recorded_at: DateTime<Utc>,
    event: &LedgerEvent,
) -> String {
    // Events hold only plain data; encoding cannot fail.
    let event_bytes = serde_json::to_vec(event).unwrap_or_default();

    let mut hasher = blake3::Hasher::new();
    hasher.update(prev_hash.as_bytes());
    hasher.update(&sequence.to_le_bytes());
    hasher.update(&recorded_at.timestamp_millis().to_le_bytes());
    hasher.update(&event_bytes);
    hasher.finalize().to_hex().to_string()
}

/// Integrity violations found while walking a journal
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JournalError {
    #[error("Sequence gap: expected {expected}, found {found}")]
    SequenceGap { expected: u64, found: u64 },

    #[error("Entry {sequence} does not link to its predecessor")]
    BrokenLink { sequence: u64 },

    #[error("Entry {sequence} hash does not match its contents")]
    HashMismatch { sequence: u64 },
}

/// Check that `entries` form one unbroken chain from genesis
pub fn verify_chain(entries: &[JournalEntry]) -> Result<(), JournalError> {
    let mut cursor = JournalCursor::default();
    for entry in entries {
        if entry.sequence != cursor.next_sequence {
            return Err(JournalError::SequenceGap {
                expected: cursor.next_sequence,
                found: entry.sequence,
            });
        }
        if entry.prev_hash != cursor.head_hash {
            return Err(JournalError::BrokenLink {
                sequence: entry.sequence,
            });
        }
        if entry.hash != entry.expected_hash() {
            return Err(JournalError::HashMismatch {
                sequence: entry.sequence,
            });
        }
        cursor.next_sequence += 1;
        cursor.head_hash = entry.hash.clone();
    }
    Ok(())
}
