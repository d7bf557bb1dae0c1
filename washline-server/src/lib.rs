//! washline-server library - hotel laundry pickup and delivery backend
//!
//! Routes live under `/api`; `/health` and `/events` sit at the top level.

use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use washline_common::events::EventBus;

pub mod api;
pub mod db;
pub mod error;
pub mod pagination;
pub mod workflow;

pub use error::{ApiError, ApiResult};
pub use workflow::ServiceWorkflow;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Event broadcaster for SSE clients
    pub event_bus: EventBus,
    /// Status workflow, sharing the pool and bus above
    pub workflow: ServiceWorkflow,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, event_bus: EventBus) -> Self {
        let workflow = ServiceWorkflow::new(db.clone(), event_bus.clone());
        Self {
            db,
            event_bus,
            workflow,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post, put};

    let api = Router::new()
        // Hotels
        .route("/hotels", get(api::list_hotels).post(api::create_hotel))
        .route(
            "/hotels/:id",
            get(api::get_hotel)
                .put(api::update_hotel)
                .delete(api::delete_hotel),
        )
        // Guests
        .route("/guests", get(api::list_guests).post(api::create_guest))
        .route(
            "/guests/:id",
            get(api::get_guest)
                .put(api::update_guest)
                .delete(api::delete_guest),
        )
        // Services
        .route("/services", get(api::list_services).post(api::create_service))
        .route(
            "/services/:id",
            get(api::get_service)
                .put(api::update_service)
                .delete(api::delete_service),
        )
        // Service workflow
        .route("/services/:id/pickup", post(api::register_pickup))
        .route(
            "/services/:id/labels",
            get(api::list_service_labels).post(api::generate_labels),
        )
        .route("/services/:id/process", post(api::start_processing))
        .route("/services/:id/decision", post(api::decide_delivery))
        .route(
            "/services/:id/partial-delivery",
            post(api::record_partial_delivery),
        )
        .route("/services/:id/ready", post(api::mark_ready))
        .route("/services/:id/complete", post(api::complete_delivery))
        .route("/services/:id/cancel", post(api::cancel_service))
        .route("/services/:id/status", put(api::update_status))
        .route("/services/:id/delivery-status", get(api::delivery_status))
        .route("/services/:id/history", get(api::service_history))
        .route("/services/:id/sub-services", get(api::list_sub_services))
        // Bag labels
        .route("/labels/code/:code", get(api::get_label_by_code))
        .route("/labels/:id", get(api::get_label).put(api::update_label))
        // Transactions
        .route(
            "/transactions",
            get(api::list_transactions).post(api::create_transaction),
        )
        .route(
            "/transactions/:id",
            get(api::get_transaction)
                .put(api::update_transaction)
                .delete(api::delete_transaction),
        );

    Router::new()
        .nest("/api", api)
        .route("/events", get(api::event_stream))
        .merge(api::health_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
