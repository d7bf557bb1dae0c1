//! Service endpoints: CRUD plus one route per workflow step
//!
//! Workflow routes return 422 when the service's current status does not
//! allow the requested step.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use washline_common::models::{Service, StatusChange};

use crate::db::services::{self, ServiceEdit, ServiceFilter};
use crate::error::{ApiError, ApiResult};
use crate::pagination::{calculate_pagination, PageQuery, PageResponse, PAGE_SIZE};
use crate::workflow::{
    CompleteDeliveryRequest, DeliveryDecision, DeliveryOutcome, DeliveryStatus, LabelingOutcome,
    NewService, PartialDeliveryRequest, PickupRequest, StatusUpdateRequest,
};
use crate::AppState;

/// POST /api/services/:id/cancel request
#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    /// Missing and blank reasons are both rejected with 400
    #[serde(default)]
    pub reason: String,
}

/// GET /api/services?hotel_id=&status=&guest_id=&include_sub_services=&page=
pub async fn list_services(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
    Query(filter): Query<ServiceFilter>,
) -> ApiResult<Json<PageResponse<Service>>> {
    let total = services::count_services(&state.db, &filter).await?;
    let pagination = calculate_pagination(total, page.page);
    let items = services::list_services(&state.db, &filter, PAGE_SIZE, pagination.offset).await?;

    Ok(Json(PageResponse::new(items, total, pagination)))
}

/// POST /api/services
pub async fn create_service(
    State(state): State<AppState>,
    Json(input): Json<NewService>,
) -> ApiResult<(StatusCode, Json<Service>)> {
    let service = state.workflow.create_service(input).await?;
    Ok((StatusCode::CREATED, Json(service)))
}

/// GET /api/services/:id
pub async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Service>> {
    services::get_service(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Service {}", id)))
}

/// PUT /api/services/:id
///
/// Edits descriptive fields only; status moves through the workflow routes.
pub async fn update_service(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(edit): Json<ServiceEdit>,
) -> ApiResult<Json<Service>> {
    Ok(Json(services::update_service_details(&state.db, id, edit).await?))
}

/// DELETE /api/services/:id
pub async fn delete_service(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    services::delete_service(&state.db, id).await?;
    info!("Deleted service {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/services/:id/pickup
pub async fn register_pickup(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<PickupRequest>,
) -> ApiResult<Json<Service>> {
    Ok(Json(state.workflow.register_pickup(id, request).await?))
}

/// POST /api/services/:id/labels
pub async fn generate_labels(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<LabelingOutcome>)> {
    let outcome = state.workflow.generate_labels(id).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// POST /api/services/:id/process
pub async fn start_processing(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Service>> {
    Ok(Json(state.workflow.start_processing(id).await?))
}

/// POST /api/services/:id/decision
///
/// Body: `{"decision": "complete"}` or
/// `{"decision": "partial", "bags": [1, 2], "delivered_by": "..."}`
pub async fn decide_delivery(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(decision): Json<DeliveryDecision>,
) -> ApiResult<Json<DeliveryOutcome>> {
    Ok(Json(state.workflow.decide_delivery(id, decision).await?))
}

/// POST /api/services/:id/partial-delivery
pub async fn record_partial_delivery(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<PartialDeliveryRequest>,
) -> ApiResult<Json<DeliveryOutcome>> {
    Ok(Json(state.workflow.record_partial_delivery(id, request).await?))
}

/// POST /api/services/:id/ready
pub async fn mark_ready(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Service>> {
    Ok(Json(state.workflow.mark_ready_for_delivery(id).await?))
}

/// POST /api/services/:id/complete
pub async fn complete_delivery(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CompleteDeliveryRequest>,
) -> ApiResult<Json<DeliveryOutcome>> {
    Ok(Json(state.workflow.complete_delivery(id, request).await?))
}

/// POST /api/services/:id/cancel
pub async fn cancel_service(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CancelRequest>,
) -> ApiResult<Json<Service>> {
    Ok(Json(state.workflow.cancel_service(id, &request.reason).await?))
}

/// PUT /api/services/:id/status
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<StatusUpdateRequest>,
) -> ApiResult<Json<Service>> {
    Ok(Json(state.workflow.update_status(id, request).await?))
}

/// GET /api/services/:id/delivery-status
pub async fn delivery_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeliveryStatus>> {
    Ok(Json(state.workflow.delivery_status(id).await?))
}

/// GET /api/services/:id/history
pub async fn service_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<StatusChange>>> {
    Ok(Json(state.workflow.history(id).await?))
}

/// GET /api/services/:id/sub-services
pub async fn list_sub_services(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Service>>> {
    services::require_service(&state.db, id).await?;
    Ok(Json(services::list_sub_services(&state.db, id).await?))
}
