//! Admin subscription management.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use obol_core::types::DbId;

use crate::error::AppResult;
use crate::state::AppState;

/// DELETE /api/v1/admin/subscriptions/{id}
///
/// Cancel the subscription at the vendor, then mark the local row.
pub async fn cancel_subscription(
    State(state): State<AppState>,
    Path(subscription_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    state.payments.cancel_subscription(subscription_id).await?;

    tracing::info!(subscription_id, "Subscription cancellation requested");

    Ok(StatusCode::NO_CONTENT)
}
