//! Per-table database operations
//!
//! Single-statement functions are generic over `sqlx::Executor` so they run
//! against the pool or inside a workflow transaction alike.

pub mod guests;
pub mod history;
pub mod hotels;
pub mod labels;
pub mod services;
pub mod transactions;

use uuid::Uuid;
use washline_common::{Error, Result};

pub(crate) fn parse_uuid(field: &str, value: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| Error::Internal(format!("Failed to parse {} {:?}: {}", field, value, e)))
}

pub(crate) fn parse_opt_uuid(field: &str, value: Option<String>) -> Result<Option<Uuid>> {
    value.map(|v| parse_uuid(field, &v)).transpose()
}

/// Map a stored enum name through its `parse` function
pub(crate) fn parse_enum<T>(field: &str, value: &str, parse: fn(&str) -> Option<T>) -> Result<T> {
    parse(value).ok_or_else(|| Error::Internal(format!("Unknown {} {:?}", field, value)))
}

/// Trim a free-text field, mapping blank input to `None`
pub(crate) fn clean_opt(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trim a required text field
pub(crate) fn require_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text_trims() {
        assert_eq!(require_text("name", "  Ana ").unwrap(), "Ana");
        assert!(require_text("name", "   ").is_err());
    }

    #[test]
    fn test_clean_opt_blank_is_none() {
        assert_eq!(clean_opt(Some("  ".to_string())), None);
        assert_eq!(clean_opt(Some(" x ".to_string())), Some("x".to_string()));
        assert_eq!(clean_opt(None), None);
    }

    #[test]
    fn test_parse_uuid_error_names_field() {
        let err = parse_uuid("hotel_id", "nope").unwrap_err();
        assert!(err.to_string().contains("hotel_id"));
    }
}
