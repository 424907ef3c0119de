//! Anomaly signal intake

use crate::api::extract::Caller;
use crate::api::state::AppState;
use crate::error::ApiResult;
use axum::{extract::State, Json};
use gaia_runtime::{AnomalySignals, MonitorReport};
use gaia_types::{Action, CoordinatorError, Role};

/// Evaluate a simulator sample; a breach pauses the coordinator
///
/// Only callers holding the monitor role may feed samples.
pub async fn post_signals(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(signals): Json<AnomalySignals>,
) -> ApiResult<Json<MonitorReport>> {
    let roles = state.coordinator.roles_of(&caller).await;
    if !roles.contains(&Role::Monitor) {
        tracing::warn!(caller = %caller, "Anomaly signals refused");
        return Err(CoordinatorError::Forbidden {
            actor: caller,
            action: Action::Pause.to_string(),
        }
        .into());
    }

    let report = state.monitor.observe(&state.coordinator, &signals).await?;
    Ok(Json(report))
}
