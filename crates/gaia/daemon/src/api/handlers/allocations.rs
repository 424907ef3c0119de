//! Allocation handlers

use crate::api::extract::Caller;
use crate::api::state::AppState;
use crate::error::ApiResult;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use gaia_types::{Allocation, OwnerId, RequestId};
use serde::{Deserialize, Serialize};

/// Allocation view; unknown owners read as a zero balance
#[derive(Debug, Serialize, Deserialize)]
pub struct AllocationResponse {
    pub owner_id: OwnerId,
    pub amount: f64,
    pub pending_request_id: Option<RequestId>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Allocate request
#[derive(Debug, Deserialize)]
pub struct AllocateRequest {
    pub amount: f64,
}

/// Rebalance request
#[derive(Debug, Deserialize)]
pub struct RebalanceRequest {
    pub requested_amount: f64,
}

/// Rebalance response
#[derive(Debug, Serialize, Deserialize)]
pub struct RebalanceResponse {
    pub request_id: RequestId,
    pub owner_id: OwnerId,
}

/// List every allocation
pub async fn list_allocations(State(state): State<AppState>) -> Json<Vec<Allocation>> {
    Json(state.coordinator.allocations().await)
}

/// Read one owner's allocation
pub async fn get_allocation(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> Json<AllocationResponse> {
    let owner = OwnerId::new(owner);
    let response = match state.coordinator.allocation(&owner).await {
        Some(allocation) => AllocationResponse {
            owner_id: allocation.owner_id,
            amount: allocation.amount.value(),
            pending_request_id: allocation.pending_request_id,
            updated_at: Some(allocation.updated_at),
        },
        None => AllocationResponse {
            owner_id: owner,
            amount: 0.0,
            pending_request_id: None,
            updated_at: None,
        },
    };
    Json(response)
}

/// Create or increase an allocation
pub async fn allocate(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(owner): Path<String>,
    Json(request): Json<AllocateRequest>,
) -> ApiResult<Json<AllocationResponse>> {
    let owner = OwnerId::new(owner);
    state
        .coordinator
        .allocate(&caller, &owner, request.amount)
        .await?;

    tracing::info!(owner_id = %owner, caller = %caller, "Allocation updated via API");
    Ok(get_allocation(State(state), Path(owner.as_str().to_string())).await)
}

/// Ask the oracle to re-evaluate an owner's allocation
pub async fn request_rebalance(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(owner): Path<String>,
    Json(request): Json<RebalanceRequest>,
) -> ApiResult<(StatusCode, Json<RebalanceResponse>)> {
    let owner = OwnerId::new(owner);
    let request_id = state
        .coordinator
        .request_rebalance(&caller, &owner, request.requested_amount)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RebalanceResponse {
            request_id,
            owner_id: owner,
        }),
    ))
}
