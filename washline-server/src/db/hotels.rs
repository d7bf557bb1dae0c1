//! Hotel database operations

use serde::Deserialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool};
use uuid::Uuid;
use washline_common::db::settings::{get_setting_i64, DEFAULT_PRICE_PER_KG_CENTS};
use washline_common::models::Hotel;
use washline_common::{time, Error, Result};

use super::{clean_opt, parse_uuid, require_text};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewHotel {
    pub name: String,
    pub address: Option<String>,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Falls back to the `default_price_per_kg_cents` setting
    pub price_per_kg_cents: Option<i64>,
}

/// Partial update; absent fields keep their value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HotelUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub price_per_kg_cents: Option<i64>,
    pub active: Option<bool>,
}

fn hotel_from_row(row: &SqliteRow) -> Result<Hotel> {
    let id: String = row.get("id");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(Hotel {
        id: parse_uuid("hotel id", &id)?,
        name: row.get("name"),
        address: row.get("address"),
        contact_person: row.get("contact_person"),
        phone: row.get("phone"),
        email: row.get("email"),
        price_per_kg_cents: row.get("price_per_kg_cents"),
        active: row.get::<i64, _>("active") != 0,
        created_at: time::from_db("created_at", &created_at)?,
        updated_at: time::from_db("updated_at", &updated_at)?,
    })
}

fn check_rate(price_per_kg_cents: i64) -> Result<()> {
    if price_per_kg_cents < 0 {
        return Err(Error::InvalidInput(format!(
            "price_per_kg_cents cannot be negative, got {}",
            price_per_kg_cents
        )));
    }
    Ok(())
}

pub async fn insert_hotel(pool: &SqlitePool, input: NewHotel) -> Result<Hotel> {
    let name = require_text("name", &input.name)?;
    let price_per_kg_cents = match input.price_per_kg_cents {
        Some(rate) => rate,
        None => get_setting_i64(pool, DEFAULT_PRICE_PER_KG_CENTS, 350).await?,
    };
    check_rate(price_per_kg_cents)?;

    let now = time::now();
    let hotel = Hotel {
        id: Uuid::new_v4(),
        name,
        address: clean_opt(input.address),
        contact_person: clean_opt(input.contact_person),
        phone: clean_opt(input.phone),
        email: clean_opt(input.email),
        price_per_kg_cents,
        active: true,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO hotels (
            id, name, address, contact_person, phone, email,
            price_per_kg_cents, active, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
        "#,
    )
    .bind(hotel.id.to_string())
    .bind(&hotel.name)
    .bind(&hotel.address)
    .bind(&hotel.contact_person)
    .bind(&hotel.phone)
    .bind(&hotel.email)
    .bind(hotel.price_per_kg_cents)
    .bind(time::to_db(&hotel.created_at))
    .bind(time::to_db(&hotel.updated_at))
    .execute(pool)
    .await?;

    Ok(hotel)
}

pub async fn get_hotel<'e, E>(executor: E, id: Uuid) -> Result<Option<Hotel>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query("SELECT * FROM hotels WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(executor)
        .await?;

    row.as_ref().map(hotel_from_row).transpose()
}

pub async fn require_hotel<'e, E>(executor: E, id: Uuid) -> Result<Hotel>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    get_hotel(executor, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Hotel {}", id)))
}

pub async fn count_hotels(pool: &SqlitePool, active_only: bool) -> Result<i64> {
    let total = sqlx::query_scalar("SELECT COUNT(*) FROM hotels WHERE (? = 0 OR active = 1)")
        .bind(active_only)
        .fetch_one(pool)
        .await?;
    Ok(total)
}

pub async fn list_hotels(
    pool: &SqlitePool,
    active_only: bool,
    limit: i64,
    offset: i64,
) -> Result<Vec<Hotel>> {
    let rows = sqlx::query(
        "SELECT * FROM hotels WHERE (? = 0 OR active = 1) ORDER BY name LIMIT ? OFFSET ?",
    )
    .bind(active_only)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    rows.iter().map(hotel_from_row).collect()
}

pub async fn update_hotel(pool: &SqlitePool, id: Uuid, update: HotelUpdate) -> Result<Hotel> {
    let mut hotel = require_hotel(pool, id).await?;

    if let Some(name) = update.name {
        hotel.name = require_text("name", &name)?;
    }
    if update.address.is_some() {
        hotel.address = clean_opt(update.address);
    }
    if update.contact_person.is_some() {
        hotel.contact_person = clean_opt(update.contact_person);
    }
    if update.phone.is_some() {
        hotel.phone = clean_opt(update.phone);
    }
    if update.email.is_some() {
        hotel.email = clean_opt(update.email);
    }
    if let Some(rate) = update.price_per_kg_cents {
        check_rate(rate)?;
        hotel.price_per_kg_cents = rate;
    }
    if let Some(active) = update.active {
        hotel.active = active;
    }
    hotel.updated_at = time::now();

    sqlx::query(
        r#"
        UPDATE hotels SET
            name = ?, address = ?, contact_person = ?, phone = ?, email = ?,
            price_per_kg_cents = ?, active = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&hotel.name)
    .bind(&hotel.address)
    .bind(&hotel.contact_person)
    .bind(&hotel.phone)
    .bind(&hotel.email)
    .bind(hotel.price_per_kg_cents)
    .bind(hotel.active)
    .bind(time::to_db(&hotel.updated_at))
    .bind(id.to_string())
    .execute(pool)
    .await?;

    Ok(hotel)
}

/// Delete a hotel that has neither services nor guests
pub async fn delete_hotel(pool: &SqlitePool, id: Uuid) -> Result<()> {
    require_hotel(pool, id).await?;

    let (services, guests): (i64, i64) = sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM services WHERE hotel_id = ?1),
            (SELECT COUNT(*) FROM guests WHERE hotel_id = ?1)
        "#,
    )
    .bind(id.to_string())
    .fetch_one(pool)
    .await?;

    if services > 0 || guests > 0 {
        return Err(Error::Conflict(format!(
            "Hotel {} still has {} services and {} guests; deactivate it instead",
            id, services, guests
        )));
    }

    sqlx::query("DELETE FROM hotels WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}
