//! Oracle handlers

use crate::api::extract::Caller;
use crate::api::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use gaia_runtime::{Fulfillment, InboxError};
use gaia_types::{Action, OracleRequest, RequestId};
use serde::{Deserialize, Serialize};

/// Oracle fulfillment submission
#[derive(Debug, Deserialize)]
pub struct FulfillmentRequest {
    pub request_id: RequestId,
    /// Decimal text, a JSON number, or `{"amount": x}`
    pub payload: serde_json::Value,
}

/// Fulfillment acknowledgement
#[derive(Debug, Serialize, Deserialize)]
pub struct FulfillmentAccepted {
    pub request_id: RequestId,
    pub queued: bool,
}

/// Expire response
#[derive(Debug, Serialize, Deserialize)]
pub struct ExpireResponse {
    pub expired: Vec<RequestId>,
}

/// Queue an oracle response for delivery
///
/// Only oracles may submit. The outcome is not reported back: rejected
/// fulfillments are logged by the coordinator and leave no trace in the ledger.
pub async fn submit_fulfillment(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(request): Json<FulfillmentRequest>,
) -> ApiResult<(StatusCode, Json<FulfillmentAccepted>)> {
    state
        .coordinator
        .authorize(&caller, &Action::Fulfill)
        .await?;

    let payload = match request.payload {
        serde_json::Value::String(text) => text.into_bytes(),
        other => serde_json::to_vec(&other)
            .map_err(|e| ApiError::BadRequest(format!("Unencodable payload: {}", e)))?,
    };

    state
        .inbox
        .try_submit(Fulfillment {
            request_id: request.request_id,
            payload,
        })
        .map_err(|e| match e {
            InboxError::Full => ApiError::Unavailable("Fulfillment inbox is full".into()),
            InboxError::Closed => ApiError::Unavailable("Fulfillment inbox is closed".into()),
        })?;

    tracing::debug!(caller = %caller, request_id = %request.request_id, "Fulfillment queued");
    Ok((
        StatusCode::ACCEPTED,
        Json(FulfillmentAccepted {
            request_id: request.request_id,
            queued: true,
        }),
    ))
}

/// Expire every stale pending request
pub async fn expire_requests(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> ApiResult<Json<ExpireResponse>> {
    let expired = state.coordinator.expire_stale(&caller).await?;
    Ok(Json(ExpireResponse { expired }))
}

/// Get a specific oracle request
pub async fn get_oracle_request(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<OracleRequest>> {
    let request = state
        .coordinator
        .oracle_request(RequestId(id))
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Oracle request {} not found", id)))?;
    Ok(Json(request))
}
