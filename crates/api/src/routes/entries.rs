//! Entry routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use simplebank_core::ledger::LedgerError;
use simplebank_db::EntryRepository;
use simplebank_shared::types::EntryId;

use super::error_response;
use crate::AppState;

/// Creates the entry routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/entries/{entry_id}", get(get_entry))
}

/// GET `/entries/{entry_id}` - Fetch one entry.
async fn get_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<EntryId>,
) -> impl IntoResponse {
    match EntryRepository::new(state.db.as_ref()).get_entry(entry_id).await {
        Ok(entry) => (StatusCode::OK, Json(entry)).into_response(),
        Err(e) => error_response(LedgerError::from(e)),
    }
}
