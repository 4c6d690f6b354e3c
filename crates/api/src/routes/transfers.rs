//! Transfer routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use simplebank_core::ledger::{LedgerError, TransferParams, validate_transfer};
use simplebank_db::{AccountRepository, TransferContext, TransferFilter, TransferRepository};
use simplebank_shared::types::{AccountId, CurrencyCode, PageRequest, TransferId};
use tracing::info;

use super::{error_response, request_id};
use crate::AppState;

/// Creates the transfer routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transfers", get(list_transfers).post(create_transfer))
        .route("/transfers/{transfer_id}", get(get_transfer))
}

/// Request body for a transfer.
#[derive(Debug, Deserialize)]
pub struct CreateTransferRequest {
    /// Account the money leaves.
    pub from_account_id: AccountId,
    /// Account the money arrives in.
    pub to_account_id: AccountId,
    /// Amount in minor currency units.
    pub amount: i64,
    /// Currency both accounts must hold.
    pub currency: String,
}

/// Query parameters for listing transfers.
#[derive(Debug, Deserialize)]
pub struct ListTransfersQuery {
    /// Only transfers leaving this account.
    pub from_account_id: Option<AccountId>,
    /// Only transfers arriving in this account.
    pub to_account_id: Option<AccountId>,
    /// Page number (1-indexed, default: 1).
    pub page_number: Option<u32>,
    /// Page size (default: 10, max: 100).
    pub page_size: Option<u32>,
}

/// POST `/transfers` - Move money between two accounts of the same currency.
async fn create_transfer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateTransferRequest>,
) -> impl IntoResponse {
    let currency = match CurrencyCode::parse(&payload.currency) {
        Ok(currency) => currency,
        Err(e) => return error_response(LedgerError::InvalidArgument(e.to_string())),
    };

    let params = TransferParams::new(
        payload.from_account_id,
        payload.to_account_id,
        payload.amount,
    );
    if let Err(e) = validate_transfer(&params) {
        return error_response(e);
    }

    for account_id in [params.from_account_id, params.to_account_id] {
        if let Err(response) = check_currency(&state, account_id, &currency).await {
            return response;
        }
    }

    let mut ctx = TransferContext::new().with_timeout(state.transfer_timeout);
    if let Some(id) = request_id(&headers) {
        ctx = ctx.with_trace_id(id);
    }

    match state.coordinator.execute_transfer(params, &ctx).await {
        Ok(result) => {
            info!(
                transfer_id = result.transfer.id,
                from_account_id = result.transfer.from_account_id,
                to_account_id = result.transfer.to_account_id,
                amount = result.transfer.amount,
                "Transfer created"
            );
            (StatusCode::CREATED, Json(result)).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// GET `/transfers/{transfer_id}` - Fetch one transfer record.
async fn get_transfer(
    State(state): State<AppState>,
    Path(transfer_id): Path<TransferId>,
) -> impl IntoResponse {
    match TransferRepository::new(state.db.as_ref())
        .get_transfer(transfer_id)
        .await
    {
        Ok(transfer) => (StatusCode::OK, Json(transfer)).into_response(),
        Err(e) => error_response(LedgerError::from(e)),
    }
}

/// GET `/transfers` - List transfer records, optionally filtered by account.
async fn list_transfers(
    State(state): State<AppState>,
    Query(query): Query<ListTransfersQuery>,
) -> impl IntoResponse {
    let defaults = PageRequest::default();
    let page = PageRequest::new(
        query.page_number.unwrap_or(defaults.page_number),
        query.page_size.unwrap_or(defaults.page_size),
    );
    if let Err(e) = page.validate() {
        return error_response(e);
    }

    let filter = TransferFilter {
        from_account_id: query.from_account_id,
        to_account_id: query.to_account_id,
    };

    match TransferRepository::new(state.db.as_ref())
        .list_transfers(filter, page.limit(), page.offset())
        .await
    {
        Ok(transfers) => (StatusCode::OK, Json(transfers)).into_response(),
        Err(e) => error_response(LedgerError::from(e)),
    }
}

/// Verifies that an account exists and holds `currency`.
async fn check_currency(
    state: &AppState,
    account_id: AccountId,
    currency: &CurrencyCode,
) -> Result<(), Response> {
    let account = AccountRepository::new(state.db.as_ref())
        .get_account(account_id)
        .await
        .map_err(|e| error_response(LedgerError::from(e)))?;

    if account.currency != currency.as_str() {
        let message = format!(
            "account {account_id} currency mismatch: {} vs {currency}",
            account.currency
        );
        return Err(error_response(LedgerError::InvalidArgument(message)));
    }
    Ok(())
}
