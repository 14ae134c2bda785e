//! Admin transaction listing.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use obol_core::types::{DbId, RowMap};
use obol_db::repositories::TransactionRepo;
use serde::Deserialize;
use serde_json::json;

use crate::error::AppResult;
use crate::query::{clamp_limit, clamp_offset};
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for the transaction list.
#[derive(Debug, Deserialize)]
pub struct TransactionListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub campaign_id: Option<DbId>,
    pub donor_id: Option<DbId>,
    pub status: Option<String>,
}

/// GET /api/v1/admin/transactions
///
/// Paginated listing, most recent first, with optional equality filters.
pub async fn list_transactions(
    State(state): State<AppState>,
    Query(params): Query<TransactionListParams>,
) -> AppResult<impl IntoResponse> {
    let limit = clamp_limit(params.limit, 50, 200);
    let offset = clamp_offset(params.offset);

    let mut filters = RowMap::new();
    if let Some(campaign_id) = params.campaign_id {
        filters.insert("campaign_id".into(), json!(campaign_id));
    }
    if let Some(donor_id) = params.donor_id {
        filters.insert("donor_id".into(), json!(donor_id));
    }
    if let Some(status) = &params.status {
        filters.insert("status".into(), json!(status));
    }

    let transactions = TransactionRepo::new(state.pool.clone())
        .list(&filters, Some(limit), Some(offset))
        .await?;
    Ok(Json(DataResponse { data: transactions }))
}
