//! Proposal effects
//!
//! A proposal payload is opaque to voters. The coordinator decodes it once,
//! at submission, into the effect it will apply to the proposal's target
//! resource when executed.

use crate::{CoordinatorError, CoordinatorResult, Quantity};
use serde::{Deserialize, Serialize};

/// What executing a passed proposal does to its target resource
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProposalEffect {
    /// No ledger effect; the decision itself is the outcome
    #[default]
    Signal,
    /// Increase the target's allocation
    Allocate { amount: Quantity },
    /// Ask the oracle to correct the target's allocation
    Rebalance { requested_amount: Quantity },
}

impl ProposalEffect {
    /// Decode a submitted payload
    ///
    /// An empty (or whitespace-only) payload is a signal proposal. Anything
    /// else must be a JSON effect object.
    pub fn decode(payload: &[u8]) -> CoordinatorResult<Self> {
        if payload.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(ProposalEffect::Signal);
        }
        serde_json::from_slice(payload).map_err(|e| {
            CoordinatorError::InvalidInput(format!("undecodable proposal payload: {}", e))
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProposalEffect::Signal => "signal",
            ProposalEffect::Allocate { .. } => "allocate",
            ProposalEffect::Rebalance { .. } => "rebalance",
        }
    }
}
