//! Circuit breaker: global halt switch for mutating operations

use chrono::{DateTime, Utc};
use gaia_types::{ActorId, BreakerState, CoordinatorError, CoordinatorResult};
use tracing::{info, warn};

/// Process-wide pause flag
///
/// Initialized running. Pausing is idempotent and refreshes the reason and
/// timestamp; only an explicit unpause clears it.
#[derive(Debug, Clone, Default)]
pub struct CircuitBreaker {
    state: BreakerState,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause(&mut self, reason: impl Into<String>, actor: &ActorId, now: DateTime<Utc>) {
        let reason = reason.into();
        warn!(
            actor = %actor,
            reason = %reason,
            already_paused = self.state.paused,
            "Circuit breaker engaged"
        );
        self.state = BreakerState {
            paused: true,
            reason: Some(reason),
            since: Some(now),
            paused_by: Some(actor.clone()),
        };
    }

    /// Clear the pause; returns false if the system was already running
    pub fn unpause(&mut self, actor: &ActorId) -> bool {
        let was_paused = self.state.paused;
        if was_paused {
            info!(actor = %actor, "Circuit breaker released");
        }
        self.state = BreakerState::running();
        was_paused
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    /// Precondition for every mutating operation
    pub fn ensure_running(&self) -> CoordinatorResult<()> {
        if self.state.paused {
            return Err(CoordinatorError::SystemPaused {
                reason: self.state.reason_or_default(),
            });
        }
        Ok(())
    }

    pub fn state(&self) -> &BreakerState {
        &self.state
    }
}
