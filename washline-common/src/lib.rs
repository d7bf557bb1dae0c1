//! # Washline Common Library
//!
//! Shared code for the Washline laundry service including:
//! - Database bootstrap, schema and migrations
//! - Domain models (hotels, guests, services, bag labels, transactions)
//! - Service status workflow (transition table, bag ledger, pricing, label codes)
//! - Event types and EventBus
//! - Configuration loading

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod models;
pub mod time;
pub mod workflow;

pub use error::{Error, Result};
pub use models::ServiceStatus;
