//! Service status history

use sqlx::{Row, Sqlite};
use uuid::Uuid;
use washline_common::models::{ServiceStatus, StatusChange};
use washline_common::{time, Result};

use super::{parse_enum, parse_uuid};

pub async fn record_change<'e, E>(
    executor: E,
    service_id: Uuid,
    from_status: Option<ServiceStatus>,
    to_status: ServiceStatus,
    note: Option<&str>,
) -> Result<StatusChange>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let change = StatusChange {
        id: Uuid::new_v4(),
        service_id,
        from_status,
        to_status,
        note: note.map(str::to_string),
        changed_at: time::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO service_status_history (id, service_id, from_status, to_status, note, changed_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(change.id.to_string())
    .bind(service_id.to_string())
    .bind(from_status.map(|s| s.as_str()))
    .bind(to_status.as_str())
    .bind(&change.note)
    .bind(time::to_db(&change.changed_at))
    .execute(executor)
    .await?;

    Ok(change)
}

/// Oldest first
pub async fn list_changes<'e, E>(executor: E, service_id: Uuid) -> Result<Vec<StatusChange>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(
        "SELECT * FROM service_status_history WHERE service_id = ? ORDER BY changed_at, rowid",
    )
    .bind(service_id.to_string())
    .fetch_all(executor)
    .await?;

    rows.iter()
        .map(|row| {
            let id: String = row.get("id");
            let from_status: Option<String> = row.get("from_status");
            let to_status: String = row.get("to_status");
            let changed_at: String = row.get("changed_at");

            Ok(StatusChange {
                id: parse_uuid("history id", &id)?,
                service_id,
                from_status: from_status
                    .map(|s| parse_enum("from_status", &s, ServiceStatus::parse))
                    .transpose()?,
                to_status: parse_enum("to_status", &to_status, ServiceStatus::parse)?,
                note: row.get("note"),
                changed_at: time::from_db("changed_at", &changed_at)?,
            })
        })
        .collect()
}
