//! Admin endpoints driving the batch migration runner.
//!
//! A long migration sequence is driven incrementally by repeated batch
//! calls from a progress-reporting admin page rather than one unbounded
//! request.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Body for a batch request.
#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub batch_size: usize,
    #[serde(default)]
    pub offset: usize,
}

/// POST /api/v1/admin/migrations/batch
///
/// Run one slice of the pending migration list. Returns whether the run
/// is complete and the offset for the next call; a failed unit surfaces
/// its version.
pub async fn run_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> AppResult<impl IntoResponse> {
    if request.batch_size == 0 {
        return Err(AppError::BadRequest("batch_size must be at least 1".into()));
    }

    let outcome = state
        .migrations
        .run_batch(request.offset, request.batch_size)
        .await?;

    tracing::info!(
        offset = request.offset,
        batch_size = request.batch_size,
        completed = outcome.completed,
        "Migration batch finished"
    );

    Ok(Json(DataResponse { data: outcome }))
}

/// GET /api/v1/admin/migrations/status
///
/// Current/target schema version, pending unit count, and the busy flag
/// (callers suppress the "update available" prompt while busy).
pub async fn status(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let status = state.migrations.status().await?;
    Ok(Json(DataResponse { data: status }))
}
