//! Campaign management endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use obol_core::campaign::validate_bounds;
use obol_core::error::CoreError;
use obol_core::types::DbId;
use obol_db::models::campaign::{NewCampaign, UpdateCampaign};
use obol_db::repositories::CampaignRepo;

use crate::error::{AppError, AppResult};
use crate::query::{clamp_limit, clamp_offset, PaginationParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/campaigns
///
/// Create a campaign. The min/max donation invariant is enforced here,
/// before anything reaches storage.
pub async fn create_campaign(
    State(state): State<AppState>,
    Json(input): Json<NewCampaign>,
) -> AppResult<impl IntoResponse> {
    if input.title.trim().is_empty() {
        return Err(AppError::BadRequest("title must not be empty".into()));
    }
    validate_bounds(
        input.minimum_donation.unwrap_or(1.0),
        input.maximum_donation,
    )
    .map_err(AppError::Core)?;

    let campaign = CampaignRepo::new(state.pool.clone()).create(&input).await?;

    tracing::info!(campaign_id = campaign.id, title = %campaign.title, "Campaign created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: campaign })))
}

/// GET /api/v1/campaigns
pub async fn list_campaigns(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let limit = clamp_limit(params.limit, 50, 200);
    let offset = clamp_offset(params.offset);

    let campaigns = CampaignRepo::new(state.pool.clone())
        .list(Some(limit), Some(offset))
        .await?;
    Ok(Json(DataResponse { data: campaigns }))
}

/// GET /api/v1/campaigns/{id}
pub async fn get_campaign(
    State(state): State<AppState>,
    Path(campaign_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let campaign = CampaignRepo::new(state.pool.clone())
        .get(campaign_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Campaign",
            id: campaign_id,
        }))?;
    Ok(Json(DataResponse { data: campaign }))
}

/// PUT /api/v1/campaigns/{id}
///
/// Apply a partial update. The bounds invariant is checked against the
/// merged result, not just the patch.
pub async fn update_campaign(
    State(state): State<AppState>,
    Path(campaign_id): Path<DbId>,
    Json(input): Json<UpdateCampaign>,
) -> AppResult<impl IntoResponse> {
    let repo = CampaignRepo::new(state.pool.clone());

    let existing = repo
        .get(campaign_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Campaign",
            id: campaign_id,
        }))?;
    let minimum = input.minimum_donation.unwrap_or(existing.minimum_donation);
    let maximum = input.maximum_donation.or(existing.maximum_donation);
    validate_bounds(minimum, maximum).map_err(AppError::Core)?;

    let updated = repo
        .update(campaign_id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Campaign",
            id: campaign_id,
        }))?;

    tracing::info!(campaign_id, "Campaign updated");

    Ok(Json(DataResponse { data: updated }))
}
