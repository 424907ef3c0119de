//! Voting-weight source
//!
//! The coordinator does not own stake balances. It asks a [`StakeSource`]
//! how much a voter holds and subtracts what is already locked in open votes.

use gaia_types::{ActorId, Stake};
use std::collections::HashMap;

/// External identity/stake collaborator
pub trait StakeSource: Send + Sync {
    /// Total stake held by `voter`, locked or not
    fn available_stake(&self, voter: &ActorId) -> Stake;
}

/// Fixed stake table
#[derive(Debug, Clone, Default)]
pub struct StakeTable {
    stakes: HashMap<ActorId, Stake>,
}

impl StakeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a voter's stake
    pub fn with_stake(mut self, voter: impl Into<String>, amount: u64) -> Self {
        self.stakes.insert(ActorId::new(voter), Stake::new(amount));
        self
    }

    pub fn len(&self) -> usize {
        self.stakes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stakes.is_empty()
    }
}

impl From<&HashMap<String, u64>> for StakeTable {
    fn from(stakes: &HashMap<String, u64>) -> Self {
        Self {
            stakes: stakes
                .iter()
                .map(|(voter, amount)| (ActorId::new(voter.clone()), Stake::new(*amount)))
                .collect(),
        }
    }
}

impl StakeSource for StakeTable {
    fn available_stake(&self, voter: &ActorId) -> Stake {
        self.stakes.get(voter).copied().unwrap_or_default()
    }
}
