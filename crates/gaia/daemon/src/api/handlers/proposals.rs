//! Proposal and voting handlers

use crate::api::extract::Caller;
use crate::api::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Duration;
use gaia_types::{
    ActorId, CoordinatorError, OwnerId, Proposal, ProposalId, ProposalState, Stake, VoteRecord,
};
use serde::{Deserialize, Serialize};

/// Longest voting window `chrono::Duration` can represent in seconds
const MAX_WINDOW_SECS: i64 = i64::MAX / 1000;

/// Create proposal request
#[derive(Debug, Deserialize)]
pub struct CreateProposalRequest {
    pub description: String,
    pub target_resource: OwnerId,
    /// Voting window in seconds
    pub voting_window_secs: i64,
    /// Effect to apply on execution; omitted means a signalling proposal
    #[serde(default)]
    pub effect: Option<serde_json::Value>,
}

/// Cast vote request
#[derive(Debug, Deserialize)]
pub struct CastVoteRequest {
    /// Defaults to the caller
    #[serde(default)]
    pub voter: Option<ActorId>,
    pub support: bool,
    pub weight: u64,
}

/// Tally response
#[derive(Debug, Serialize, Deserialize)]
pub struct TallyResponse {
    pub proposal_id: ProposalId,
    pub outcome: ProposalState,
    pub votes_for: Stake,
    pub votes_against: Stake,
}

/// List all proposals
pub async fn list_proposals(State(state): State<AppState>) -> Json<Vec<Proposal>> {
    Json(state.coordinator.proposals().await)
}

/// Get a specific proposal
pub async fn get_proposal(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<Proposal>> {
    let proposal = load_proposal(&state, ProposalId(id)).await?;
    Ok(Json(proposal))
}

/// Submit a proposal
pub async fn create_proposal(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(request): Json<CreateProposalRequest>,
) -> ApiResult<(StatusCode, Json<Proposal>)> {
    let payload = match &request.effect {
        Some(effect) => serde_json::to_vec(effect)
            .map_err(|e| ApiError::BadRequest(format!("Unencodable effect: {}", e)))?,
        None => Vec::new(),
    };

    let id = state
        .coordinator
        .create_proposal(
            &caller,
            request.description,
            request.target_resource,
            payload,
            Duration::seconds(request.voting_window_secs.min(MAX_WINDOW_SECS)),
        )
        .await?;

    let proposal = load_proposal(&state, id).await?;
    Ok((StatusCode::CREATED, Json(proposal)))
}

/// List the votes cast on a proposal
pub async fn list_votes(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<Vec<VoteRecord>>> {
    let id = ProposalId(id);
    load_proposal(&state, id).await?;
    Ok(Json(state.coordinator.votes(id).await))
}

/// Cast a weighted vote
pub async fn cast_vote(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<u64>,
    Json(request): Json<CastVoteRequest>,
) -> ApiResult<(StatusCode, Json<Proposal>)> {
    let id = ProposalId(id);
    let voter = request.voter.unwrap_or_else(|| caller.clone());

    state
        .coordinator
        .cast_vote(&caller, id, &voter, request.support, Stake::new(request.weight))
        .await?;

    let proposal = load_proposal(&state, id).await?;
    Ok((StatusCode::CREATED, Json(proposal)))
}

/// Decide a proposal whose voting window has closed
pub async fn tally_proposal(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<u64>,
) -> ApiResult<Json<TallyResponse>> {
    let id = ProposalId(id);
    let outcome = state.coordinator.tally(&caller, id).await?;
    let proposal = load_proposal(&state, id).await?;

    Ok(Json(TallyResponse {
        proposal_id: id,
        outcome,
        votes_for: proposal.votes_for,
        votes_against: proposal.votes_against,
    }))
}

/// Apply a passed proposal's effect
pub async fn execute_proposal(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<u64>,
) -> ApiResult<Json<Proposal>> {
    let id = ProposalId(id);
    state.coordinator.execute_proposal(&caller, id).await?;
    let proposal = load_proposal(&state, id).await?;
    Ok(Json(proposal))
}

async fn load_proposal(state: &AppState, id: ProposalId) -> ApiResult<Proposal> {
    state
        .coordinator
        .proposal(id)
        .await
        .ok_or_else(|| ApiError::from(CoordinatorError::proposal_not_found(id)))
}
