//! Vendor webhook endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Form;
use serde::Deserialize;

use crate::state::AppState;

/// Form body the vendor posts: just the payment id. The id is not
/// trusted for status; reconciliation fetches authoritative state back
/// from the vendor.
#[derive(Debug, Deserialize)]
pub struct WebhookNotification {
    pub id: String,
}

/// POST /api/v1/webhooks/mollie
///
/// Always answers 200 once the notification has been processed, whether
/// or not a matching local record existed; anything else triggers vendor
/// retry storms. Internal failures are logged for operators, never
/// surfaced to the vendor.
pub async fn mollie_webhook(
    State(state): State<AppState>,
    Form(notification): Form<WebhookNotification>,
) -> StatusCode {
    if notification.id.is_empty() {
        tracing::warn!("Webhook notification without a payment id");
        return StatusCode::OK;
    }

    if let Err(e) = state.payments.handle_webhook(&notification.id).await {
        tracing::error!(
            error = %e,
            vendor_payment_id = %notification.id,
            "Webhook reconciliation failed"
        );
    }
    StatusCode::OK
}
