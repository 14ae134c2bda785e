//! Payment creation endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use obol_ledger::CreatePaymentArgs;
use serde_json::json;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/payments
///
/// Create a local transaction plus a vendor payment and return the
/// checkout URL. A vendor-side failure is not an exception: the donor is
/// told to try again and the open transaction stays behind for the logs.
pub async fn create_payment(
    State(state): State<AppState>,
    Json(args): Json<CreatePaymentArgs>,
) -> AppResult<impl IntoResponse> {
    match state.payments.create_payment(&args).await? {
        Some(created) => Ok((
            StatusCode::CREATED,
            Json(DataResponse { data: created }).into_response(),
        )),
        None => Ok((
            StatusCode::BAD_GATEWAY,
            Json(json!({
                "error": "Unable to start the payment, please try again.",
                "code": "PAYMENT_NOT_STARTED",
            }))
            .into_response(),
        )),
    }
}
