//! Service database operations
//!
//! Status changes never go through `update_service_details`; they belong to
//! the workflow module, which writes whole rows with `save_service` inside a
//! write transaction.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool};
use uuid::Uuid;
use washline_common::models::{Service, ServicePriority, ServiceStatus};
use washline_common::{time, Error, Result};

use super::{clean_opt, parse_enum, parse_opt_uuid, parse_uuid, require_text};

/// Fields editable outside the workflow
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceEdit {
    pub guest_name: Option<String>,
    pub room_number: Option<String>,
    pub priority: Option<ServicePriority>,
    pub observations: Option<String>,
    pub internal_notes: Option<String>,
    pub estimated_pickup_at: Option<DateTime<Utc>>,
    pub estimated_delivery_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceFilter {
    pub hotel_id: Option<Uuid>,
    pub status: Option<ServiceStatus>,
    pub guest_id: Option<Uuid>,
    /// Delivery sub-services are hidden unless asked for
    #[serde(default)]
    pub include_sub_services: bool,
}

fn service_from_row(row: &SqliteRow) -> Result<Service> {
    let id: String = row.get("id");
    let hotel_id: String = row.get("hotel_id");
    let status: String = row.get("status");
    let priority: String = row.get("priority");
    let bag_count: i64 = row.get("bag_count");
    let delivered: String = row.get("delivered_bag_numbers");
    let percentage: i64 = row.get("partial_delivery_percentage");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    let delivered_bag_numbers: Vec<u32> = serde_json::from_str(&delivered).map_err(|e| {
        Error::Internal(format!("Failed to deserialize delivered_bag_numbers: {}", e))
    })?;

    Ok(Service {
        id: parse_uuid("service id", &id)?,
        hotel_id: parse_uuid("hotel_id", &hotel_id)?,
        guest_id: parse_opt_uuid("guest_id", row.get("guest_id"))?,
        guest_name: row.get("guest_name"),
        room_number: row.get("room_number"),
        status: parse_enum("status", &status, ServiceStatus::parse)?,
        priority: parse_enum("priority", &priority, ServicePriority::parse)?,
        bag_count: u32::try_from(bag_count)
            .map_err(|_| Error::Internal(format!("Invalid bag_count {}", bag_count)))?,
        weight_kg: row.get("weight_kg"),
        price_per_kg_cents: row.get("price_per_kg_cents"),
        total_price_cents: row.get("total_price_cents"),
        observations: row.get("observations"),
        internal_notes: row.get("internal_notes"),
        collector_name: row.get("collector_name"),
        delivered_by: row.get("delivered_by"),
        estimated_pickup_at: time::opt_from_db("estimated_pickup_at", row.get("estimated_pickup_at"))?,
        estimated_delivery_at: time::opt_from_db(
            "estimated_delivery_at",
            row.get("estimated_delivery_at"),
        )?,
        picked_up_at: time::opt_from_db("picked_up_at", row.get("picked_up_at"))?,
        labeled_at: time::opt_from_db("labeled_at", row.get("labeled_at"))?,
        processing_started_at: time::opt_from_db(
            "processing_started_at",
            row.get("processing_started_at"),
        )?,
        delivered_at: time::opt_from_db("delivered_at", row.get("delivered_at"))?,
        cancelled_at: time::opt_from_db("cancelled_at", row.get("cancelled_at"))?,
        cancellation_reason: row.get("cancellation_reason"),
        delivered_bag_numbers,
        partial_delivery_percentage: percentage.clamp(0, 100) as u8,
        parent_service_id: parse_opt_uuid("parent_service_id", row.get("parent_service_id"))?,
        created_at: time::from_db("created_at", &created_at)?,
        updated_at: time::from_db("updated_at", &updated_at)?,
    })
}

fn delivered_json(service: &Service) -> Result<String> {
    serde_json::to_string(&service.delivered_bag_numbers)
        .map_err(|e| Error::Internal(format!("Failed to serialize delivered_bag_numbers: {}", e)))
}

pub async fn insert_service<'e, E>(executor: E, service: &Service) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let delivered = delivered_json(service)?;

    sqlx::query(
        r#"
        INSERT INTO services (
            id, hotel_id, guest_id, guest_name, room_number, status, priority,
            bag_count, weight_kg, price_per_kg_cents, total_price_cents,
            observations, internal_notes, collector_name, delivered_by,
            estimated_pickup_at, estimated_delivery_at, picked_up_at, labeled_at,
            processing_started_at, delivered_at, cancelled_at, cancellation_reason,
            delivered_bag_numbers, partial_delivery_percentage, parent_service_id,
            created_at, updated_at
        ) VALUES (
            ?, ?, ?, ?, ?, ?, ?,
            ?, ?, ?, ?,
            ?, ?, ?, ?,
            ?, ?, ?, ?,
            ?, ?, ?, ?,
            ?, ?, ?,
            ?, ?
        )
        "#,
    )
    .bind(service.id.to_string())
    .bind(service.hotel_id.to_string())
    .bind(service.guest_id.map(|id| id.to_string()))
    .bind(&service.guest_name)
    .bind(&service.room_number)
    .bind(service.status.as_str())
    .bind(service.priority.as_str())
    .bind(service.bag_count as i64)
    .bind(service.weight_kg)
    .bind(service.price_per_kg_cents)
    .bind(service.total_price_cents)
    .bind(&service.observations)
    .bind(&service.internal_notes)
    .bind(&service.collector_name)
    .bind(&service.delivered_by)
    .bind(time::opt_to_db(&service.estimated_pickup_at))
    .bind(time::opt_to_db(&service.estimated_delivery_at))
    .bind(time::opt_to_db(&service.picked_up_at))
    .bind(time::opt_to_db(&service.labeled_at))
    .bind(time::opt_to_db(&service.processing_started_at))
    .bind(time::opt_to_db(&service.delivered_at))
    .bind(time::opt_to_db(&service.cancelled_at))
    .bind(&service.cancellation_reason)
    .bind(delivered)
    .bind(service.partial_delivery_percentage as i64)
    .bind(service.parent_service_id.map(|id| id.to_string()))
    .bind(time::to_db(&service.created_at))
    .bind(time::to_db(&service.updated_at))
    .execute(executor)
    .await?;

    Ok(())
}

/// Overwrite every mutable column of an existing service
pub async fn save_service<'e, E>(executor: E, service: &Service) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let delivered = delivered_json(service)?;

    let result = sqlx::query(
        r#"
        UPDATE services SET
            guest_id = ?, guest_name = ?, room_number = ?, status = ?, priority = ?,
            bag_count = ?, weight_kg = ?, price_per_kg_cents = ?, total_price_cents = ?,
            observations = ?, internal_notes = ?, collector_name = ?, delivered_by = ?,
            estimated_pickup_at = ?, estimated_delivery_at = ?, picked_up_at = ?,
            labeled_at = ?, processing_started_at = ?, delivered_at = ?, cancelled_at = ?,
            cancellation_reason = ?, delivered_bag_numbers = ?,
            partial_delivery_percentage = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(service.guest_id.map(|id| id.to_string()))
    .bind(&service.guest_name)
    .bind(&service.room_number)
    .bind(service.status.as_str())
    .bind(service.priority.as_str())
    .bind(service.bag_count as i64)
    .bind(service.weight_kg)
    .bind(service.price_per_kg_cents)
    .bind(service.total_price_cents)
    .bind(&service.observations)
    .bind(&service.internal_notes)
    .bind(&service.collector_name)
    .bind(&service.delivered_by)
    .bind(time::opt_to_db(&service.estimated_pickup_at))
    .bind(time::opt_to_db(&service.estimated_delivery_at))
    .bind(time::opt_to_db(&service.picked_up_at))
    .bind(time::opt_to_db(&service.labeled_at))
    .bind(time::opt_to_db(&service.processing_started_at))
    .bind(time::opt_to_db(&service.delivered_at))
    .bind(time::opt_to_db(&service.cancelled_at))
    .bind(&service.cancellation_reason)
    .bind(delivered)
    .bind(service.partial_delivery_percentage as i64)
    .bind(time::to_db(&service.updated_at))
    .bind(service.id.to_string())
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Service {}", service.id)));
    }
    Ok(())
}

pub async fn get_service<'e, E>(executor: E, id: Uuid) -> Result<Option<Service>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query("SELECT * FROM services WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(executor)
        .await?;

    row.as_ref().map(service_from_row).transpose()
}

pub async fn require_service<'e, E>(executor: E, id: Uuid) -> Result<Service>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    get_service(executor, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Service {}", id)))
}

const FILTER_CLAUSE: &str = "(?1 IS NULL OR hotel_id = ?1) \
     AND (?2 IS NULL OR status = ?2) \
     AND (?3 IS NULL OR guest_id = ?3) \
     AND (?4 = 1 OR parent_service_id IS NULL)";

pub async fn count_services(pool: &SqlitePool, filter: &ServiceFilter) -> Result<i64> {
    let total = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM services WHERE {}",
        FILTER_CLAUSE
    ))
    .bind(filter.hotel_id.map(|id| id.to_string()))
    .bind(filter.status.map(|s| s.as_str()))
    .bind(filter.guest_id.map(|id| id.to_string()))
    .bind(filter.include_sub_services)
    .fetch_one(pool)
    .await?;
    Ok(total)
}

/// Newest first
pub async fn list_services(
    pool: &SqlitePool,
    filter: &ServiceFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Service>> {
    let rows = sqlx::query(&format!(
        "SELECT * FROM services WHERE {} ORDER BY created_at DESC LIMIT ?5 OFFSET ?6",
        FILTER_CLAUSE
    ))
    .bind(filter.hotel_id.map(|id| id.to_string()))
    .bind(filter.status.map(|s| s.as_str()))
    .bind(filter.guest_id.map(|id| id.to_string()))
    .bind(filter.include_sub_services)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    rows.iter().map(service_from_row).collect()
}

/// Delivery sub-services of `parent_id`, oldest first
pub async fn list_sub_services<'e, E>(executor: E, parent_id: Uuid) -> Result<Vec<Service>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(
        "SELECT * FROM services WHERE parent_service_id = ? ORDER BY created_at, rowid",
    )
    .bind(parent_id.to_string())
    .fetch_all(executor)
    .await?;

    rows.iter().map(service_from_row).collect()
}

/// Apply `edit` to the descriptive columns of a service
///
/// Status, bag ledger and price columns are left alone, so a workflow step
/// committed meanwhile is never rolled back. Terminal services are refused.
pub async fn update_service_details(
    pool: &SqlitePool,
    id: Uuid,
    edit: ServiceEdit,
) -> Result<Service> {
    let mut tx = pool.begin_with("BEGIN IMMEDIATE").await?;

    let mut service = require_service(&mut *tx, id).await?;
    if service.status.is_terminal() {
        return Err(terminal_edit_error(&service));
    }

    if let Some(name) = edit.guest_name {
        service.guest_name = require_text("guest_name", &name)?;
    }
    if let Some(room) = edit.room_number {
        service.room_number = require_text("room_number", &room)?;
    }
    if let Some(priority) = edit.priority {
        service.priority = priority;
    }
    if edit.observations.is_some() {
        service.observations = clean_opt(edit.observations);
    }
    if edit.internal_notes.is_some() {
        service.internal_notes = clean_opt(edit.internal_notes);
    }
    if edit.estimated_pickup_at.is_some() {
        service.estimated_pickup_at = edit.estimated_pickup_at;
    }
    if edit.estimated_delivery_at.is_some() {
        service.estimated_delivery_at = edit.estimated_delivery_at;
    }
    service.updated_at = time::now();

    let result = sqlx::query(
        r#"
        UPDATE services SET
            guest_name = ?, room_number = ?, priority = ?, observations = ?,
            internal_notes = ?, estimated_pickup_at = ?, estimated_delivery_at = ?,
            updated_at = ?
        WHERE id = ? AND status NOT IN ('COMPLETED', 'CANCELLED')
        "#,
    )
    .bind(&service.guest_name)
    .bind(&service.room_number)
    .bind(service.priority.as_str())
    .bind(&service.observations)
    .bind(&service.internal_notes)
    .bind(time::opt_to_db(&service.estimated_pickup_at))
    .bind(time::opt_to_db(&service.estimated_delivery_at))
    .bind(time::to_db(&service.updated_at))
    .bind(id.to_string())
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        let current = require_service(&mut *tx, id).await?;
        return Err(terminal_edit_error(&current));
    }

    let updated = require_service(&mut *tx, id).await?;
    tx.commit().await?;
    Ok(updated)
}

fn terminal_edit_error(service: &Service) -> Error {
    Error::Conflict(format!(
        "Service {} is {} and can no longer be edited",
        service.id, service.status
    ))
}

/// Delete a service that never got going
///
/// Labels and history rows go with it (`ON DELETE CASCADE`).
pub async fn delete_service(pool: &SqlitePool, id: Uuid) -> Result<()> {
    let service = require_service(pool, id).await?;

    if !matches!(
        service.status,
        ServiceStatus::PendingPickup | ServiceStatus::Cancelled
    ) || service.is_sub_service()
    {
        return Err(Error::Conflict(format!(
            "Service {} is {}; only pending or cancelled services can be deleted",
            id, service.status
        )));
    }

    sqlx::query("DELETE FROM services WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}
