//! Guest endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use washline_common::models::Guest;

use crate::db::guests::{self, GuestFilter, GuestUpdate, NewGuest};
use crate::error::{ApiError, ApiResult};
use crate::pagination::{calculate_pagination, PageQuery, PageResponse, PAGE_SIZE};
use crate::AppState;

/// GET /api/guests?hotel_id=&room_number=&page=
pub async fn list_guests(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
    Query(filter): Query<GuestFilter>,
) -> ApiResult<Json<PageResponse<Guest>>> {
    let total = guests::count_guests(&state.db, &filter).await?;
    let pagination = calculate_pagination(total, page.page);
    let items = guests::list_guests(&state.db, &filter, PAGE_SIZE, pagination.offset).await?;

    Ok(Json(PageResponse::new(items, total, pagination)))
}

/// POST /api/guests
pub async fn create_guest(
    State(state): State<AppState>,
    Json(input): Json<NewGuest>,
) -> ApiResult<(StatusCode, Json<Guest>)> {
    let guest = guests::insert_guest(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(guest)))
}

/// GET /api/guests/:id
pub async fn get_guest(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Guest>> {
    guests::get_guest(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Guest {}", id)))
}

/// PUT /api/guests/:id
pub async fn update_guest(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<GuestUpdate>,
) -> ApiResult<Json<Guest>> {
    Ok(Json(guests::update_guest(&state.db, id, update).await?))
}

/// DELETE /api/guests/:id
pub async fn delete_guest(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    guests::delete_guest(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
