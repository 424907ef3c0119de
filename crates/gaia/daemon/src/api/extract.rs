//! Caller identity extraction

use crate::error::ApiError;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use gaia_types::ActorId;

/// Header carrying the caller's identity
pub const ACTOR_HEADER: &str = "x-gaia-actor";

/// The authenticated caller of a mutating route
#[derive(Debug, Clone)]
pub struct Caller(pub ActorId);

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(ACTOR_HEADER)
            .ok_or_else(|| ApiError::Unauthenticated(format!("{} header is required", ACTOR_HEADER)))?;

        let actor = value
            .to_str()
            .map_err(|_| ApiError::BadRequest(format!("{} is not valid text", ACTOR_HEADER)))?
            .trim();
        if actor.is_empty() {
            return Err(ApiError::Unauthenticated(format!(
                "{} header is empty",
                ACTOR_HEADER
            )));
        }

        Ok(Caller(ActorId::new(actor)))
    }
}
