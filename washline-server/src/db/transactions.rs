//! Income/expense transaction database operations

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool};
use uuid::Uuid;
use washline_common::models::{PaymentMethod, Transaction, TransactionType};
use washline_common::{time, Error, Result};

use super::{clean_opt, parse_enum, parse_opt_uuid, parse_uuid, require_text};

#[derive(Debug, Clone, Deserialize)]
pub struct NewTransaction {
    pub transaction_type: TransactionType,
    pub category: String,
    pub amount_cents: i64,
    pub payment_method: PaymentMethod,
    pub description: Option<String>,
    pub hotel_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    /// Defaults to now
    pub occurred_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionUpdate {
    pub category: Option<String>,
    pub amount_cents: Option<i64>,
    pub payment_method: Option<PaymentMethod>,
    pub description: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionFilter {
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    pub hotel_id: Option<Uuid>,
    /// Inclusive lower bound on `occurred_at`
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `occurred_at`
    pub to: Option<DateTime<Utc>>,
}

fn transaction_from_row(row: &SqliteRow) -> Result<Transaction> {
    let id: String = row.get("id");
    let transaction_type: String = row.get("transaction_type");
    let payment_method: String = row.get("payment_method");
    let occurred_at: String = row.get("occurred_at");
    let created_at: String = row.get("created_at");

    Ok(Transaction {
        id: parse_uuid("transaction id", &id)?,
        transaction_type: parse_enum(
            "transaction_type",
            &transaction_type,
            TransactionType::parse,
        )?,
        category: row.get("category"),
        amount_cents: row.get("amount_cents"),
        payment_method: parse_enum("payment_method", &payment_method, PaymentMethod::parse)?,
        description: row.get("description"),
        hotel_id: parse_opt_uuid("hotel_id", row.get("hotel_id"))?,
        service_id: parse_opt_uuid("service_id", row.get("service_id"))?,
        occurred_at: time::from_db("occurred_at", &occurred_at)?,
        created_at: time::from_db("created_at", &created_at)?,
    })
}

fn check_amount(amount_cents: i64) -> Result<()> {
    if amount_cents <= 0 {
        return Err(Error::InvalidInput(format!(
            "amount_cents must be positive, got {}",
            amount_cents
        )));
    }
    Ok(())
}

/// Validate and build a transaction without touching the database
pub fn build_transaction(input: NewTransaction) -> Result<Transaction> {
    check_amount(input.amount_cents)?;
    let now = time::now();
    Ok(Transaction {
        id: Uuid::new_v4(),
        transaction_type: input.transaction_type,
        category: require_text("category", &input.category)?,
        amount_cents: input.amount_cents,
        payment_method: input.payment_method,
        description: clean_opt(input.description),
        hotel_id: input.hotel_id,
        service_id: input.service_id,
        occurred_at: input.occurred_at.unwrap_or(now),
        created_at: now,
    })
}

pub async fn insert_transaction<'e, E>(executor: E, transaction: &Transaction) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO transactions (
            id, transaction_type, category, amount_cents, payment_method,
            description, hotel_id, service_id, occurred_at, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(transaction.id.to_string())
    .bind(transaction.transaction_type.as_str())
    .bind(&transaction.category)
    .bind(transaction.amount_cents)
    .bind(transaction.payment_method.as_str())
    .bind(&transaction.description)
    .bind(transaction.hotel_id.map(|id| id.to_string()))
    .bind(transaction.service_id.map(|id| id.to_string()))
    .bind(time::to_db(&transaction.occurred_at))
    .bind(time::to_db(&transaction.created_at))
    .execute(executor)
    .await?;

    Ok(())
}

/// Validate references, then insert
pub async fn create_transaction(pool: &SqlitePool, input: NewTransaction) -> Result<Transaction> {
    let transaction = build_transaction(input)?;

    if let Some(hotel_id) = transaction.hotel_id {
        super::hotels::require_hotel(pool, hotel_id).await?;
    }
    if let Some(service_id) = transaction.service_id {
        super::services::require_service(pool, service_id).await?;
    }

    insert_transaction(pool, &transaction).await?;
    Ok(transaction)
}

pub async fn get_transaction(pool: &SqlitePool, id: Uuid) -> Result<Option<Transaction>> {
    let row = sqlx::query("SELECT * FROM transactions WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(transaction_from_row).transpose()
}

pub async fn list_for_service<'e, E>(executor: E, service_id: Uuid) -> Result<Vec<Transaction>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query("SELECT * FROM transactions WHERE service_id = ? ORDER BY occurred_at")
        .bind(service_id.to_string())
        .fetch_all(executor)
        .await?;

    rows.iter().map(transaction_from_row).collect()
}

// Timestamps are compared as RFC 3339 text, which orders correctly for UTC values
const FILTER_CLAUSE: &str = "(?1 IS NULL OR transaction_type = ?1) \
     AND (?2 IS NULL OR hotel_id = ?2) \
     AND (?3 IS NULL OR occurred_at >= ?3) \
     AND (?4 IS NULL OR occurred_at < ?4)";

pub async fn count_transactions(pool: &SqlitePool, filter: &TransactionFilter) -> Result<i64> {
    let total = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM transactions WHERE {}",
        FILTER_CLAUSE
    ))
    .bind(filter.transaction_type.map(|t| t.as_str()))
    .bind(filter.hotel_id.map(|id| id.to_string()))
    .bind(time::opt_to_db(&filter.from))
    .bind(time::opt_to_db(&filter.to))
    .fetch_one(pool)
    .await?;
    Ok(total)
}

/// Newest first
pub async fn list_transactions(
    pool: &SqlitePool,
    filter: &TransactionFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Transaction>> {
    let rows = sqlx::query(&format!(
        "SELECT * FROM transactions WHERE {} ORDER BY occurred_at DESC LIMIT ?5 OFFSET ?6",
        FILTER_CLAUSE
    ))
    .bind(filter.transaction_type.map(|t| t.as_str()))
    .bind(filter.hotel_id.map(|id| id.to_string()))
    .bind(time::opt_to_db(&filter.from))
    .bind(time::opt_to_db(&filter.to))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    rows.iter().map(transaction_from_row).collect()
}

pub async fn update_transaction(
    pool: &SqlitePool,
    id: Uuid,
    update: TransactionUpdate,
) -> Result<Transaction> {
    let mut transaction = get_transaction(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Transaction {}", id)))?;

    if let Some(category) = update.category {
        transaction.category = require_text("category", &category)?;
    }
    if let Some(amount) = update.amount_cents {
        check_amount(amount)?;
        transaction.amount_cents = amount;
    }
    if let Some(method) = update.payment_method {
        transaction.payment_method = method;
    }
    if update.description.is_some() {
        transaction.description = clean_opt(update.description);
    }
    if let Some(occurred_at) = update.occurred_at {
        transaction.occurred_at = occurred_at;
    }

    sqlx::query(
        r#"
        UPDATE transactions SET
            category = ?, amount_cents = ?, payment_method = ?, description = ?, occurred_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&transaction.category)
    .bind(transaction.amount_cents)
    .bind(transaction.payment_method.as_str())
    .bind(&transaction.description)
    .bind(time::to_db(&transaction.occurred_at))
    .bind(id.to_string())
    .execute(pool)
    .await?;

    Ok(transaction)
}

pub async fn delete_transaction(pool: &SqlitePool, id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM transactions WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Transaction {}", id)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn income(amount_cents: i64) -> NewTransaction {
        NewTransaction {
            transaction_type: TransactionType::Income,
            category: " laundry_service ".to_string(),
            amount_cents,
            payment_method: PaymentMethod::Cash,
            description: Some("".to_string()),
            hotel_id: None,
            service_id: None,
            occurred_at: None,
        }
    }

    #[test]
    fn test_build_transaction_normalizes_text() {
        let t = build_transaction(income(1200)).unwrap();
        assert_eq!(t.category, "laundry_service");
        assert_eq!(t.description, None);
        assert_eq!(t.occurred_at, t.created_at);
    }

    #[test]
    fn test_build_transaction_rejects_non_positive_amount() {
        assert!(matches!(build_transaction(income(0)), Err(Error::InvalidInput(_))));
        assert!(matches!(build_transaction(income(-5)), Err(Error::InvalidInput(_))));
    }
}
