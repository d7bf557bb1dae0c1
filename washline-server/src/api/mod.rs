//! HTTP API handlers for washline-server

pub mod guests;
pub mod health;
pub mod hotels;
pub mod labels;
pub mod services;
pub mod sse;
pub mod transactions;

pub use guests::{create_guest, delete_guest, get_guest, list_guests, update_guest};
pub use health::health_routes;
pub use hotels::{create_hotel, delete_hotel, get_hotel, list_hotels, update_hotel};
pub use labels::{get_label, get_label_by_code, list_service_labels, update_label};
pub use services::{
    cancel_service, complete_delivery, create_service, decide_delivery, delete_service,
    delivery_status, generate_labels, get_service, list_services, list_sub_services, mark_ready,
    record_partial_delivery, register_pickup, service_history, start_processing, update_service,
    update_status,
};
pub use sse::event_stream;
pub use transactions::{
    create_transaction, delete_transaction, get_transaction, list_transactions,
    update_transaction,
};
