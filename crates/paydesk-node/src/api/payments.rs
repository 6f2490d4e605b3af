//! Payment and ledger endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use paydesk_core::PaymentRecord;
use paydesk_tracker::LedgerSummary;
use uuid::Uuid;

use super::{ApiError, ApiResult};
use crate::state::AppState;

/// Ask the gateway for the current state of a payment.
pub async fn get_payment(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> ApiResult<Json<PaymentRecord>> {
    let record = state.gateway.check_status(order_id).await?;
    Ok(Json(record))
}

/// Totals of the in-memory ledger.
pub async fn ledger_summary(State(state): State<AppState>) -> ApiResult<Json<LedgerSummary>> {
    let ledger = state.memory_ledger.as_ref().ok_or_else(|| {
        ApiError::new(StatusCode::NOT_FOUND, "sales are written to an external ledger")
    })?;
    Ok(Json(ledger.summary().await))
}
