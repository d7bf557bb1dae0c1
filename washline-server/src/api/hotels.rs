//! Hotel endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use washline_common::models::Hotel;

use crate::db::hotels::{self, HotelUpdate, NewHotel};
use crate::error::{ApiError, ApiResult};
use crate::pagination::{calculate_pagination, PageQuery, PageResponse, PAGE_SIZE};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct HotelQuery {
    #[serde(default)]
    pub active_only: bool,
}

/// GET /api/hotels?page=&active_only=
pub async fn list_hotels(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
    Query(query): Query<HotelQuery>,
) -> ApiResult<Json<PageResponse<Hotel>>> {
    let total = hotels::count_hotels(&state.db, query.active_only).await?;
    let pagination = calculate_pagination(total, page.page);
    let items =
        hotels::list_hotels(&state.db, query.active_only, PAGE_SIZE, pagination.offset).await?;

    Ok(Json(PageResponse::new(items, total, pagination)))
}

/// POST /api/hotels
pub async fn create_hotel(
    State(state): State<AppState>,
    Json(input): Json<NewHotel>,
) -> ApiResult<(StatusCode, Json<Hotel>)> {
    let hotel = hotels::insert_hotel(&state.db, input).await?;
    info!("Created hotel {} ({})", hotel.name, hotel.id);
    Ok((StatusCode::CREATED, Json(hotel)))
}

/// GET /api/hotels/:id
pub async fn get_hotel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Hotel>> {
    hotels::get_hotel(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Hotel {}", id)))
}

/// PUT /api/hotels/:id
pub async fn update_hotel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<HotelUpdate>,
) -> ApiResult<Json<Hotel>> {
    Ok(Json(hotels::update_hotel(&state.db, id, update).await?))
}

/// DELETE /api/hotels/:id
///
/// Hotels with guests or services answer 409; deactivate them instead.
pub async fn delete_hotel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    hotels::delete_hotel(&state.db, id).await?;
    info!("Deleted hotel {}", id);
    Ok(StatusCode::NO_CONTENT)
}
