//! Database bootstrap, schema and migrations

pub mod init;
pub mod migrations;
pub mod settings;

pub use init::{connect_in_memory, create_schema, init_database};
pub use migrations::run_migrations;
