//! Bag label database operations

use serde::Deserialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqliteConnection, SqlitePool};
use uuid::Uuid;
use washline_common::models::{BagLabel, LabelStatus};
use washline_common::{time, Error, Result};

use super::{clean_opt, parse_enum, parse_uuid};

/// Only the notes are editable; label status follows the service workflow
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabelUpdate {
    pub notes: Option<String>,
}

fn label_from_row(row: &SqliteRow) -> Result<BagLabel> {
    let id: String = row.get("id");
    let service_id: String = row.get("service_id");
    let hotel_id: String = row.get("hotel_id");
    let bag_number: i64 = row.get("bag_number");
    let status: String = row.get("status");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(BagLabel {
        id: parse_uuid("label id", &id)?,
        service_id: parse_uuid("service_id", &service_id)?,
        hotel_id: parse_uuid("hotel_id", &hotel_id)?,
        bag_number: u32::try_from(bag_number)
            .map_err(|_| Error::Internal(format!("Invalid bag_number {}", bag_number)))?,
        code: row.get("code"),
        status: parse_enum("label status", &status, LabelStatus::parse)?,
        notes: row.get("notes"),
        created_at: time::from_db("created_at", &created_at)?,
        updated_at: time::from_db("updated_at", &updated_at)?,
    })
}

/// Insert freshly generated labels
///
/// A code already taken by another service is reported as `Conflict`.
pub async fn insert_labels(conn: &mut SqliteConnection, labels: &[BagLabel]) -> Result<()> {
    for label in labels {
        let inserted = sqlx::query(
            r#"
            INSERT INTO bag_labels (
                id, service_id, hotel_id, bag_number, code, status, notes, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(label.id.to_string())
        .bind(label.service_id.to_string())
        .bind(label.hotel_id.to_string())
        .bind(label.bag_number as i64)
        .bind(&label.code)
        .bind(label.status.as_str())
        .bind(&label.notes)
        .bind(time::to_db(&label.created_at))
        .bind(time::to_db(&label.updated_at))
        .execute(&mut *conn)
        .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(Error::Conflict(format!(
                    "Label code {} is already in use",
                    label.code
                )));
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

pub async fn count_labels<'e, E>(executor: E, service_id: Uuid) -> Result<i64>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM bag_labels WHERE service_id = ?")
        .bind(service_id.to_string())
        .fetch_one(executor)
        .await?;
    Ok(count)
}

/// Labels of a service ordered by bag number
pub async fn list_labels<'e, E>(executor: E, service_id: Uuid) -> Result<Vec<BagLabel>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query("SELECT * FROM bag_labels WHERE service_id = ? ORDER BY bag_number")
        .bind(service_id.to_string())
        .fetch_all(executor)
        .await?;

    rows.iter().map(label_from_row).collect()
}

pub async fn get_label(pool: &SqlitePool, id: Uuid) -> Result<Option<BagLabel>> {
    let row = sqlx::query("SELECT * FROM bag_labels WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(label_from_row).transpose()
}

pub async fn get_label_by_code(pool: &SqlitePool, code: &str) -> Result<Option<BagLabel>> {
    let row = sqlx::query("SELECT * FROM bag_labels WHERE code = ?")
        .bind(code)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(label_from_row).transpose()
}

/// Set the status of every label of a service
pub async fn set_status_for_service<'e, E>(
    executor: E,
    service_id: Uuid,
    status: LabelStatus,
) -> Result<u64>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE bag_labels SET status = ?, updated_at = ? WHERE service_id = ?")
        .bind(status.as_str())
        .bind(time::to_db(&time::now()))
        .bind(service_id.to_string())
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

/// Set the status of the labels on specific bags
pub async fn set_status_for_bags(
    conn: &mut SqliteConnection,
    service_id: Uuid,
    bags: &[u32],
    status: LabelStatus,
) -> Result<()> {
    let now = time::to_db(&time::now());
    for bag in bags {
        sqlx::query(
            "UPDATE bag_labels SET status = ?, updated_at = ? WHERE service_id = ? AND bag_number = ?",
        )
        .bind(status.as_str())
        .bind(&now)
        .bind(service_id.to_string())
        .bind(*bag as i64)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub async fn update_label(pool: &SqlitePool, id: Uuid, update: LabelUpdate) -> Result<BagLabel> {
    let mut label = get_label(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Bag label {}", id)))?;

    label.notes = clean_opt(update.notes);
    label.updated_at = time::now();

    sqlx::query("UPDATE bag_labels SET notes = ?, updated_at = ? WHERE id = ?")
        .bind(&label.notes)
        .bind(time::to_db(&label.updated_at))
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(label)
}
