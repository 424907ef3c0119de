//! Application state for API handlers

use chrono::{DateTime, Utc};
use gaia_runtime::{AnomalyMonitor, Coordinator, OracleInbox};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The coordinator every route talks to
    pub coordinator: Arc<Coordinator>,

    /// Queue feeding oracle fulfillments to the pump task
    pub inbox: OracleInbox,

    /// Threshold detector for posted simulator signals
    pub monitor: Arc<AnomalyMonitor>,

    /// Daemon version
    pub version: String,

    /// Daemon start time
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(coordinator: Arc<Coordinator>, inbox: OracleInbox, monitor: AnomalyMonitor) -> Self {
        Self {
            coordinator,
            inbox,
            monitor: Arc::new(monitor),
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: Utc::now(),
        }
    }

    /// Uptime as a human readable string
    pub fn uptime(&self) -> String {
        let secs = (Utc::now() - self.started_at).num_seconds().max(0);
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
