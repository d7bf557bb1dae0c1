//! Bag label lookups
//!
//! Labels are created by the workflow (`POST /api/services/:id/labels`);
//! here they are only read, scanned by code, or annotated.

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;
use washline_common::models::BagLabel;

use crate::db::labels::{self, LabelUpdate};
use crate::db::services;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// GET /api/services/:id/labels
pub async fn list_service_labels(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<BagLabel>>> {
    services::require_service(&state.db, id).await?;
    Ok(Json(labels::list_labels(&state.db, id).await?))
}

/// GET /api/labels/:id
pub async fn get_label(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<BagLabel>> {
    labels::get_label(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Bag label {}", id)))
}

/// GET /api/labels/code/:code
pub async fn get_label_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Json<BagLabel>> {
    labels::get_label_by_code(&state.db, &code)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Bag label with code {}", code)))
}

/// PUT /api/labels/:id
pub async fn update_label(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<LabelUpdate>,
) -> ApiResult<Json<BagLabel>> {
    Ok(Json(labels::update_label(&state.db, id, update).await?))
}
