//! API Router configuration

use super::handlers;
use super::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the main API router
pub fn create_router(state: AppState, enable_cors: bool) -> Router {
    let api_routes = Router::new()
        // Health and status
        .route("/health", get(handlers::health_check))
        .route("/status", get(handlers::daemon_status))
        // Governance
        .route(
            "/proposals",
            get(handlers::list_proposals).post(handlers::create_proposal),
        )
        .route("/proposals/:id", get(handlers::get_proposal))
        .route(
            "/proposals/:id/votes",
            get(handlers::list_votes).post(handlers::cast_vote),
        )
        .route("/proposals/:id/tally", post(handlers::tally_proposal))
        .route("/proposals/:id/execute", post(handlers::execute_proposal))
        // Allocations
        .route("/allocations", get(handlers::list_allocations))
        .route(
            "/allocations/:owner",
            get(handlers::get_allocation).post(handlers::allocate),
        )
        .route(
            "/allocations/:owner/rebalance",
            post(handlers::request_rebalance),
        )
        // Oracle
        .route("/oracle/fulfillments", post(handlers::submit_fulfillment))
        .route("/oracle/expire", post(handlers::expire_requests))
        .route("/oracle/requests/:id", get(handlers::get_oracle_request))
        // Circuit breaker
        .route("/breaker", get(handlers::get_breaker))
        .route("/breaker/pause", post(handlers::pause))
        .route("/breaker/unpause", post(handlers::unpause))
        // Monitoring, roles, audit
        .route("/monitor/signals", post(handlers::post_signals))
        .route("/roles", post(handlers::grant_role))
        .route("/roles/:actor/:role", delete(handlers::revoke_role))
        .route("/journal", get(handlers::get_journal));

    let router = Router::new()
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http());

    let router = if enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    };

    router.with_state(state)
}
