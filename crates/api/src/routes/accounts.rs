//! Account routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use simplebank_core::ledger::{LedgerError, NewAccount, validate_new_account};
use simplebank_db::{AccountRepository, EntryRepository};
use simplebank_shared::types::{AccountId, CurrencyCode, PageRequest};
use tracing::info;

use super::error_response;
use crate::AppState;

/// Creates the account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", get(list_accounts).post(create_account))
        .route("/accounts/{account_id}", get(get_account))
        .route("/accounts/{account_id}/entries", get(list_account_entries))
}

/// Request body for opening an account.
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    /// Account holder.
    pub owner: String,
    /// Three-letter currency code.
    pub currency: String,
}

/// POST `/accounts` - Open an account with a zero balance.
async fn create_account(
    State(state): State<AppState>,
    Json(payload): Json<CreateAccountRequest>,
) -> impl IntoResponse {
    let currency = match CurrencyCode::parse(&payload.currency) {
        Ok(currency) => currency,
        Err(e) => return error_response(LedgerError::InvalidArgument(e.to_string())),
    };

    let input = NewAccount::with_zero_balance(payload.owner.trim(), currency);
    if let Err(e) = validate_new_account(&input) {
        return error_response(e);
    }

    match AccountRepository::new(state.db.as_ref())
        .create_account(&input)
        .await
    {
        Ok(account) => {
            info!(
                account_id = account.id,
                currency = %account.currency,
                "Account created"
            );
            (StatusCode::CREATED, Json(account)).into_response()
        }
        Err(e) => error_response(LedgerError::from(e)),
    }
}

/// GET `/accounts/{account_id}` - Fetch one account.
async fn get_account(
    State(state): State<AppState>,
    Path(account_id): Path<AccountId>,
) -> impl IntoResponse {
    match AccountRepository::new(state.db.as_ref())
        .get_account(account_id)
        .await
    {
        Ok(account) => (StatusCode::OK, Json(account)).into_response(),
        Err(e) => error_response(LedgerError::from(e)),
    }
}

/// GET `/accounts` - List accounts by ID, one page at a time.
async fn list_accounts(
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> impl IntoResponse {
    if let Err(e) = page.validate() {
        return error_response(e);
    }

    match AccountRepository::new(state.db.as_ref())
        .list_accounts(page.limit(), page.offset())
        .await
    {
        Ok(accounts) => (StatusCode::OK, Json(accounts)).into_response(),
        Err(e) => error_response(LedgerError::from(e)),
    }
}

/// GET `/accounts/{account_id}/entries` - List an account's entries.
async fn list_account_entries(
    State(state): State<AppState>,
    Path(account_id): Path<AccountId>,
    Query(page): Query<PageRequest>,
) -> impl IntoResponse {
    if let Err(e) = page.validate() {
        return error_response(e);
    }

    let db = state.db.as_ref();
    if let Err(e) = AccountRepository::new(db).get_account(account_id).await {
        return error_response(LedgerError::from(e));
    }

    match EntryRepository::new(db)
        .list_entries(account_id, page.limit(), page.offset())
        .await
    {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(e) => error_response(LedgerError::from(e)),
    }
}
