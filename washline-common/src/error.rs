//! Common error types for Washline

use crate::models::ServiceStatus;
use thiserror::Error;

/// Common result type for Washline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the library and the HTTP service
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation conflicts with existing state (duplicate, still referenced)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Status change not present in the transition table
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: ServiceStatus,
        to: ServiceStatus,
    },

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
