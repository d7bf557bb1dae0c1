//! Database schema migrations
//!
//! Versioned, idempotent migrations tracked in `schema_version`. Tables are
//! created with their current shape by `init`; migrations cover anything
//! `CREATE TABLE IF NOT EXISTS` cannot express, such as indexes.
//!
//! Never modify an existing migration. Add a new one and bump
//! `CURRENT_SCHEMA_VERSION`.

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Increment this when adding new migrations
const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Returns 0 if no version has been recorded yet
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='schema_version'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("✓ Migration v1 completed");
    }

    Ok(())
}

/// Migration v1: lookup indexes for the common list filters
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v1: Add lookup indexes");

    for statement in [
        "CREATE INDEX IF NOT EXISTS idx_services_hotel ON services(hotel_id)",
        "CREATE INDEX IF NOT EXISTS idx_services_status ON services(status)",
        "CREATE INDEX IF NOT EXISTS idx_services_parent ON services(parent_service_id)",
        "CREATE INDEX IF NOT EXISTS idx_guests_hotel ON guests(hotel_id)",
        "CREATE INDEX IF NOT EXISTS idx_labels_service ON bag_labels(service_id)",
        "CREATE INDEX IF NOT EXISTS idx_history_service ON service_status_history(service_id)",
        "CREATE INDEX IF NOT EXISTS idx_transactions_occurred ON transactions(occurred_at)",
    ] {
        sqlx::query(statement).execute(pool).await?;
    }

    Ok(())
}
