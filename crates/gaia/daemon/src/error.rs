//! Error types for gaia-daemon

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use gaia_types::{CoordinatorError, ErrorKind};
use serde::Serialize;
use thiserror::Error;

/// Errors raised while starting or running the daemon
#[derive(Error, Debug)]
pub enum DaemonError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Store error: {0}")]
    Store(String),
}

pub type DaemonResult<T> = Result<T, DaemonError>;

/// Errors returned from HTTP handlers
#[derive(Error, Debug)]
pub enum ApiError {
    /// A coordinator operation failed
    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),

    #[error("Missing caller identity: {0}")]
    Unauthenticated(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// HTTP status for a coordinator error kind
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidState
        | ErrorKind::DeadlinePassed
        | ErrorKind::DuplicateVote
        | ErrorKind::RequestInFlight
        | ErrorKind::AlreadyExecuted => StatusCode::CONFLICT,
        ErrorKind::InsufficientStake => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::SystemPaused => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            ApiError::Coordinator(e) => {
                let kind = e.kind();
                if kind == ErrorKind::Storage {
                    tracing::error!(error = %e, "Coordinator storage failure");
                }
                (status_for(kind), kind.as_str().to_string())
            }
            ApiError::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, "Unauthenticated".into()),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "InvalidInput".into()),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound".into()),
            ApiError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "Unavailable".into()),
        };

        let message = match &self {
            ApiError::Coordinator(e) => e.to_string(),
            ApiError::Unauthenticated(m)
            | ApiError::BadRequest(m)
            | ApiError::NotFound(m)
            | ApiError::Unavailable(m) => m.clone(),
        };

        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gaia_types::{ActorId, ProposalId};

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorKind::InvalidInput), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::DuplicateVote), StatusCode::CONFLICT);
        assert_eq!(
            status_for(ErrorKind::InsufficientStake),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(ErrorKind::SystemPaused),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(status_for(ErrorKind::Forbidden), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_coordinator_error_response() {
        let err = ApiError::from(CoordinatorError::DuplicateVote {
            proposal_id: ProposalId(3),
            voter: ActorId::new("alice"),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
