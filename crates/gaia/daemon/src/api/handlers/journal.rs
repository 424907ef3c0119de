//! Audit journal

use crate::api::state::AppState;
use crate::error::ApiResult;
use axum::{extract::State, Json};
use gaia_types::JournalEntry;
use serde::Serialize;

/// Journal dump with its verified length
#[derive(Debug, Serialize)]
pub struct JournalResponse {
    pub verified: usize,
    pub entries: Vec<JournalEntry>,
}

/// Read back and verify the journal
pub async fn get_journal(State(state): State<AppState>) -> ApiResult<Json<JournalResponse>> {
    let verified = state.coordinator.verify_journal().await?;
    let entries = state.coordinator.journal().await?;
    Ok(Json(JournalResponse { verified, entries }))
}
