//! Access control: role assignments and action authorization
//!
//! Administrators hold every privileged action. Participants act only within
//! their own identity: a participant votes as itself and manages the
//! allocation keyed by its own id. Monitors may trip the breaker and nothing
//! else. Oracles deliver fulfillments.

use crate::config::AccessConfig;
use gaia_types::{Action, ActorId, CoordinatorError, CoordinatorResult, Role};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// Role registry and policy
#[derive(Debug, Clone, Default)]
pub struct AccessControl {
    roles: HashMap<ActorId, BTreeSet<Role>>,
}

impl AccessControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed role assignments from configuration
    pub fn from_config(config: &AccessConfig) -> Self {
        let mut access = Self::new();
        let seeds = [
            (&config.administrators, Role::Administrator),
            (&config.monitors, Role::Monitor),
            (&config.participants, Role::Participant),
            (&config.oracles, Role::Oracle),
        ];
        for (actors, role) in seeds {
            for actor in actors {
                access.grant(ActorId::new(actor.clone()), role);
            }
        }
        access
    }

    /// Grant a role; returns false if the actor already held it
    pub fn grant(&mut self, actor: ActorId, role: Role) -> bool {
        let added = self.roles.entry(actor.clone()).or_default().insert(role);
        if added {
            debug!(actor = %actor, role = %role, "Role granted");
        }
        added
    }

    /// Revoke a role; returns false if the actor did not hold it
    pub fn revoke(&mut self, actor: &ActorId, role: Role) -> bool {
        let Some(held) = self.roles.get_mut(actor) else {
            return false;
        };
        let removed = held.remove(&role);
        if held.is_empty() {
            self.roles.remove(actor);
        }
        removed
    }

    pub fn has_role(&self, actor: &ActorId, role: Role) -> bool {
        self.roles
            .get(actor)
            .map(|held| held.contains(&role))
            .unwrap_or(false)
    }

    pub fn roles_of(&self, actor: &ActorId) -> Vec<Role> {
        self.roles
            .get(actor)
            .map(|held| held.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Check whether `actor` may perform `action`
    pub fn authorize(&self, actor: &ActorId, action: &Action) -> CoordinatorResult<()> {
        if self.permits(actor, action) {
            return Ok(());
        }
        warn!(actor = %actor, action = %action, "Action refused");
        Err(CoordinatorError::Forbidden {
            actor: actor.clone(),
            action: action.to_string(),
        })
    }

    fn permits(&self, actor: &ActorId, action: &Action) -> bool {
        let admin = self.has_role(actor, Role::Administrator);
        let participant = self.has_role(actor, Role::Participant);

        match action {
            Action::Pause => admin || self.has_role(actor, Role::Monitor),
            Action::Unpause
            | Action::BypassBreaker
            | Action::ExpireRequests
            | Action::ManageRoles => admin,
            Action::CreateProposal | Action::Tally | Action::ExecuteProposal => {
                admin || participant
            }
            Action::CastVote { voter } => participant && voter == actor,
            Action::Allocate { owner } | Action::RequestRebalance { owner } => {
                admin || (participant && owner.is_identity_of(actor))
            }
            Action::Fulfill => self.has_role(actor, Role::Oracle),
        }
    }
}
