//! Circuit breaker handlers

use crate::api::extract::Caller;
use crate::api::state::AppState;
use crate::error::ApiResult;
use axum::{extract::State, Json};
use gaia_types::BreakerState;
use serde::Deserialize;

/// Pause request
#[derive(Debug, Deserialize)]
pub struct PauseRequest {
    pub reason: String,
}

/// Current breaker state
pub async fn get_breaker(State(state): State<AppState>) -> Json<BreakerState> {
    Json(state.coordinator.breaker_state().await)
}

/// Halt every mutation
pub async fn pause(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(request): Json<PauseRequest>,
) -> ApiResult<Json<BreakerState>> {
    state.coordinator.pause(&caller, request.reason).await?;
    Ok(Json(state.coordinator.breaker_state().await))
}

/// Resume normal operation
pub async fn unpause(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> ApiResult<Json<BreakerState>> {
    state.coordinator.unpause(&caller).await?;
    Ok(Json(state.coordinator.breaker_state().await))
}
