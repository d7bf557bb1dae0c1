//! Guest database operations

use serde::Deserialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool};
use uuid::Uuid;
use washline_common::models::Guest;
use washline_common::{time, Error, Result};

use super::{clean_opt, parse_uuid, require_text};

#[derive(Debug, Clone, Deserialize)]
pub struct NewGuest {
    pub hotel_id: Uuid,
    pub name: String,
    pub room_number: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuestUpdate {
    pub name: Option<String>,
    pub room_number: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuestFilter {
    pub hotel_id: Option<Uuid>,
    pub room_number: Option<String>,
}

fn guest_from_row(row: &SqliteRow) -> Result<Guest> {
    let id: String = row.get("id");
    let hotel_id: String = row.get("hotel_id");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(Guest {
        id: parse_uuid("guest id", &id)?,
        hotel_id: parse_uuid("hotel_id", &hotel_id)?,
        name: row.get("name"),
        room_number: row.get("room_number"),
        phone: row.get("phone"),
        email: row.get("email"),
        created_at: time::from_db("created_at", &created_at)?,
        updated_at: time::from_db("updated_at", &updated_at)?,
    })
}

pub async fn insert_guest(pool: &SqlitePool, input: NewGuest) -> Result<Guest> {
    let name = require_text("name", &input.name)?;
    let room_number = require_text("room_number", &input.room_number)?;
    super::hotels::require_hotel(pool, input.hotel_id).await?;

    let now = time::now();
    let guest = Guest {
        id: Uuid::new_v4(),
        hotel_id: input.hotel_id,
        name,
        room_number,
        phone: clean_opt(input.phone),
        email: clean_opt(input.email),
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO guests (id, hotel_id, name, room_number, phone, email, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(guest.id.to_string())
    .bind(guest.hotel_id.to_string())
    .bind(&guest.name)
    .bind(&guest.room_number)
    .bind(&guest.phone)
    .bind(&guest.email)
    .bind(time::to_db(&guest.created_at))
    .bind(time::to_db(&guest.updated_at))
    .execute(pool)
    .await?;

    Ok(guest)
}

pub async fn get_guest<'e, E>(executor: E, id: Uuid) -> Result<Option<Guest>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query("SELECT * FROM guests WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(executor)
        .await?;

    row.as_ref().map(guest_from_row).transpose()
}

pub async fn require_guest<'e, E>(executor: E, id: Uuid) -> Result<Guest>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    get_guest(executor, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Guest {}", id)))
}

const FILTER_CLAUSE: &str = "(?1 IS NULL OR hotel_id = ?1) AND (?2 IS NULL OR room_number = ?2)";

pub async fn count_guests(pool: &SqlitePool, filter: &GuestFilter) -> Result<i64> {
    let total = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM guests WHERE {}", FILTER_CLAUSE))
        .bind(filter.hotel_id.map(|id| id.to_string()))
        .bind(&filter.room_number)
        .fetch_one(pool)
        .await?;
    Ok(total)
}

pub async fn list_guests(
    pool: &SqlitePool,
    filter: &GuestFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Guest>> {
    let rows = sqlx::query(&format!(
        "SELECT * FROM guests WHERE {} ORDER BY room_number, name LIMIT ?3 OFFSET ?4",
        FILTER_CLAUSE
    ))
    .bind(filter.hotel_id.map(|id| id.to_string()))
    .bind(&filter.room_number)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    rows.iter().map(guest_from_row).collect()
}

pub async fn update_guest(pool: &SqlitePool, id: Uuid, update: GuestUpdate) -> Result<Guest> {
    let mut guest = require_guest(pool, id).await?;

    if let Some(name) = update.name {
        guest.name = require_text("name", &name)?;
    }
    if let Some(room) = update.room_number {
        guest.room_number = require_text("room_number", &room)?;
    }
    if update.phone.is_some() {
        guest.phone = clean_opt(update.phone);
    }
    if update.email.is_some() {
        guest.email = clean_opt(update.email);
    }
    guest.updated_at = time::now();

    sqlx::query(
        "UPDATE guests SET name = ?, room_number = ?, phone = ?, email = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&guest.name)
    .bind(&guest.room_number)
    .bind(&guest.phone)
    .bind(&guest.email)
    .bind(time::to_db(&guest.updated_at))
    .bind(id.to_string())
    .execute(pool)
    .await?;

    Ok(guest)
}

/// Delete a guest with no active services
///
/// Finished services keep their guest name and room; only the link is cleared.
pub async fn delete_guest(pool: &SqlitePool, id: Uuid) -> Result<()> {
    require_guest(pool, id).await?;

    let active: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM services WHERE guest_id = ? AND status NOT IN ('COMPLETED', 'CANCELLED')",
    )
    .bind(id.to_string())
    .fetch_one(pool)
    .await?;

    if active > 0 {
        return Err(Error::Conflict(format!(
            "Guest {} has {} active services",
            id, active
        )));
    }

    sqlx::query("DELETE FROM guests WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}
