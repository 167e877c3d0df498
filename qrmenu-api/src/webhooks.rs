use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use qrmenu_order::lifecycle::OrderError;
use qrmenu_order::models::PaymentStatus;

use crate::error::{repo_err, AppError};
use crate::state::AppState;

/// Payment-gateway callback. Only the status values are consumed here;
/// gateway-specific envelopes are unwrapped upstream.
#[derive(Debug, Deserialize)]
pub struct PaymentWebhook {
    pub order_id: i64,
    pub status: String,
    pub transaction_id: Option<String>,
}

/// POST /v1/webhooks/payments
pub async fn handle_payment_webhook(
    State(state): State<AppState>,
    Json(payload): Json<PaymentWebhook>,
) -> Result<StatusCode, AppError> {
    tracing::info!(order_id = payload.order_id, status = %payload.status, "payment webhook received");

    let requested: PaymentStatus = payload
        .status
        .parse()
        .map_err(|e: OrderError| AppError::ValidationError(e.to_string()))?;

    state
        .orders
        .update_payment(payload.order_id, requested, payload.transaction_id)
        .await
        .map_err(repo_err)?;

    Ok(StatusCode::OK)
}
