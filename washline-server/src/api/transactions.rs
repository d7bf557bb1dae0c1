//! Income and expense bookkeeping endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;
use washline_common::events::WashlineEvent;
use washline_common::models::Transaction;

use crate::db::transactions::{self, NewTransaction, TransactionFilter, TransactionUpdate};
use crate::error::{ApiError, ApiResult};
use crate::pagination::{calculate_pagination, PageQuery, PageResponse, PAGE_SIZE};
use crate::AppState;

/// GET /api/transactions?type=&hotel_id=&from=&to=&page=
pub async fn list_transactions(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
    Query(filter): Query<TransactionFilter>,
) -> ApiResult<Json<PageResponse<Transaction>>> {
    let total = transactions::count_transactions(&state.db, &filter).await?;
    let pagination = calculate_pagination(total, page.page);
    let items =
        transactions::list_transactions(&state.db, &filter, PAGE_SIZE, pagination.offset).await?;

    Ok(Json(PageResponse::new(items, total, pagination)))
}

/// POST /api/transactions
pub async fn create_transaction(
    State(state): State<AppState>,
    Json(input): Json<NewTransaction>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
    let transaction = transactions::create_transaction(&state.db, input).await?;
    info!(
        "Recorded {} of {} cents ({})",
        transaction.transaction_type.as_str(),
        transaction.amount_cents,
        transaction.category
    );

    state.event_bus.emit_lossy(WashlineEvent::TransactionRecorded {
        transaction_id: transaction.id,
        transaction_type: transaction.transaction_type,
        amount_cents: transaction.amount_cents,
        service_id: transaction.service_id,
        timestamp: transaction.created_at,
    });

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// GET /api/transactions/:id
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Transaction>> {
    transactions::get_transaction(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Transaction {}", id)))
}

/// PUT /api/transactions/:id
pub async fn update_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<TransactionUpdate>,
) -> ApiResult<Json<Transaction>> {
    Ok(Json(
        transactions::update_transaction(&state.db, id, update).await?,
    ))
}

/// DELETE /api/transactions/:id
pub async fn delete_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    transactions::delete_transaction(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
