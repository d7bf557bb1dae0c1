//! Database initialization
//!
//! Opening a database is idempotent: tables are created with
//! `CREATE TABLE IF NOT EXISTS`, migrations run only when the recorded
//! schema version is behind, and default settings are inserted only when
//! missing.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Open (creating if needed) the database at `db_path` and bring its schema up to date
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Foreign keys are a per-connection pragma, so set them on the connect options
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;
    Ok(pool)
}

/// Single-connection in-memory database with the full schema
///
/// The pool never recycles its connection; an in-memory database lives
/// exactly as long as the connection that created it.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;
    Ok(pool)
}

/// Create tables, run migrations and seed default settings
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_settings_table(pool).await?;
    create_hotels_table(pool).await?;
    create_guests_table(pool).await?;
    create_services_table(pool).await?;
    create_bag_labels_table(pool).await?;
    create_transactions_table(pool).await?;
    create_status_history_table(pool).await?;

    crate::db::migrations::run_migrations(pool).await?;
    crate::db::settings::init_default_settings(pool).await?;

    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_hotels_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS hotels (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            address TEXT,
            contact_person TEXT,
            phone TEXT,
            email TEXT,
            price_per_kg_cents INTEGER NOT NULL DEFAULT 0 CHECK (price_per_kg_cents >= 0),
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_guests_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS guests (
            id TEXT PRIMARY KEY,
            hotel_id TEXT NOT NULL REFERENCES hotels(id),
            name TEXT NOT NULL,
            room_number TEXT NOT NULL,
            phone TEXT,
            email TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_services_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS services (
            id TEXT PRIMARY KEY,
            hotel_id TEXT NOT NULL REFERENCES hotels(id),
            guest_id TEXT REFERENCES guests(id) ON DELETE SET NULL,
            guest_name TEXT NOT NULL,
            room_number TEXT NOT NULL,
            status TEXT NOT NULL,
            priority TEXT NOT NULL DEFAULT 'NORMAL',
            bag_count INTEGER NOT NULL CHECK (bag_count >= 0),
            weight_kg REAL,
            price_per_kg_cents INTEGER NOT NULL DEFAULT 0,
            total_price_cents INTEGER,
            observations TEXT,
            internal_notes TEXT,
            collector_name TEXT,
            delivered_by TEXT,
            estimated_pickup_at TEXT,
            estimated_delivery_at TEXT,
            picked_up_at TEXT,
            labeled_at TEXT,
            processing_started_at TEXT,
            delivered_at TEXT,
            cancelled_at TEXT,
            cancellation_reason TEXT,
            delivered_bag_numbers TEXT NOT NULL DEFAULT '[]',
            partial_delivery_percentage INTEGER NOT NULL DEFAULT 0,
            parent_service_id TEXT REFERENCES services(id) ON DELETE CASCADE,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_bag_labels_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bag_labels (
            id TEXT PRIMARY KEY,
            service_id TEXT NOT NULL REFERENCES services(id) ON DELETE CASCADE,
            hotel_id TEXT NOT NULL REFERENCES hotels(id),
            bag_number INTEGER NOT NULL CHECK (bag_number >= 1),
            code TEXT NOT NULL UNIQUE,
            status TEXT NOT NULL,
            notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (service_id, bag_number)
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_transactions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            id TEXT PRIMARY KEY,
            transaction_type TEXT NOT NULL,
            category TEXT NOT NULL,
            amount_cents INTEGER NOT NULL CHECK (amount_cents > 0),
            payment_method TEXT NOT NULL,
            description TEXT,
            hotel_id TEXT REFERENCES hotels(id) ON DELETE SET NULL,
            service_id TEXT REFERENCES services(id) ON DELETE SET NULL,
            occurred_at TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_status_history_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS service_status_history (
            id TEXT PRIMARY KEY,
            service_id TEXT NOT NULL REFERENCES services(id) ON DELETE CASCADE,
            from_status TEXT,
            to_status TEXT NOT NULL,
            note TEXT,
            changed_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}
