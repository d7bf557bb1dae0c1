//! Timestamp utilities
//!
//! Timestamps are persisted as RFC 3339 text.

use crate::{Error, Result};
use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a timestamp for storage
pub fn to_db(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

/// Format an optional timestamp for storage
pub fn opt_to_db(ts: &Option<DateTime<Utc>>) -> Option<String> {
    ts.as_ref().map(to_db)
}

/// Parse a stored timestamp
pub fn from_db(field: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Failed to parse {}: {}", field, e)))
}

/// Parse an optional stored timestamp
pub fn opt_from_db(field: &str, value: Option<String>) -> Result<Option<DateTime<Utc>>> {
    value.map(|v| from_db(field, &v)).transpose()
}
