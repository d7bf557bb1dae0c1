//! Runtime settings stored in the `settings` table

use crate::Result;
use sqlx::{Sqlite, SqlitePool};
use tracing::{info, warn};

pub const DEFAULT_PRICE_PER_KG_CENTS: &str = "default_price_per_kg_cents";
pub const MAX_BAGS_PER_SERVICE: &str = "max_bags_per_service";

const DEFAULTS: &[(&str, &str)] = &[
    (DEFAULT_PRICE_PER_KG_CENTS, "350"),
    (MAX_BAGS_PER_SERVICE, "50"),
];

/// Insert any missing default settings; existing values are left alone
pub async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    let mut inserted = 0;
    for (key, value) in DEFAULTS {
        let result = sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(pool)
            .await?;
        inserted += result.rows_affected();
    }

    if inserted > 0 {
        info!("Initialized {} default settings", inserted);
    }
    Ok(())
}

pub async fn get_setting<'e, E>(executor: E, key: &str) -> Result<Option<String>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(executor)
            .await?;
    Ok(value.flatten())
}

/// Integer setting with a built-in fallback for missing or unparsable values
pub async fn get_setting_i64<'e, E>(executor: E, key: &str, default: i64) -> Result<i64>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    match get_setting(executor, key).await? {
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(v) => Ok(v),
            Err(_) => {
                warn!("Setting {} has non-integer value {:?}; using {}", key, raw, default);
                Ok(default)
            }
        },
        None => Ok(default),
    }
}
