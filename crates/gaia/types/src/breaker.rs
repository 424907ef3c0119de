//! Circuit breaker state
//!
//! Process-wide, single instance. Starts running; pausing records who
//! paused and why.

use crate::ActorId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of the global halt switch
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BreakerState {
    pub paused: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused_by: Option<ActorId>,
}

impl BreakerState {
    pub fn running() -> Self {
        Self::default()
    }

    pub fn reason_or_default(&self) -> String {
        self.reason
            .clone()
            .unwrap_or_else(|| "circuit breaker active".to_string())
    }
}
