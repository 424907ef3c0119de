//! Role management

use crate::api::extract::Caller;
use crate::api::state::AppState;
use crate::error::ApiResult;
use axum::{
    extract::{Path, State},
    Json,
};
use gaia_types::{ActorId, Role};
use serde::{Deserialize, Serialize};

/// Grant role request
#[derive(Debug, Deserialize)]
pub struct GrantRoleRequest {
    pub actor: ActorId,
    pub role: Role,
}

/// Grant role response
#[derive(Debug, Serialize, Deserialize)]
pub struct GrantRoleResponse {
    pub actor: ActorId,
    pub roles: Vec<Role>,
    /// False if the actor already held the role
    pub granted: bool,
}

/// Grant a role to an actor
pub async fn grant_role(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(request): Json<GrantRoleRequest>,
) -> ApiResult<Json<GrantRoleResponse>> {
    let granted = state
        .coordinator
        .grant_role(&caller, &request.actor, request.role)
        .await?;

    Ok(Json(GrantRoleResponse {
        roles: state.coordinator.roles_of(&request.actor).await,
        actor: request.actor,
        granted,
    }))
}

/// Revoke role response
#[derive(Debug, Serialize, Deserialize)]
pub struct RevokeRoleResponse {
    pub actor: ActorId,
    pub roles: Vec<Role>,
    /// False if the actor did not hold the role
    pub revoked: bool,
}

/// Revoke a role from an actor
pub async fn revoke_role(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path((actor, role)): Path<(String, Role)>,
) -> ApiResult<Json<RevokeRoleResponse>> {
    let actor = ActorId::new(actor);
    let revoked = state.coordinator.revoke_role(&caller, &actor, role).await?;

    Ok(Json(RevokeRoleResponse {
        roles: state.coordinator.roles_of(&actor).await,
        actor,
        revoked,
    }))
}
