//! Shared helpers for washline-server integration tests

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower::ServiceExt;
use washline_common::db::connect_in_memory;
use washline_common::events::EventBus;
use washline_server::{build_router, AppState};

pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
    pub event_bus: EventBus,
}

/// Router over a fresh in-memory database
pub async fn test_app() -> TestApp {
    let db = connect_in_memory().await.unwrap();
    let event_bus = EventBus::new(100);
    let state = AppState::new(db.clone(), event_bus.clone());

    TestApp {
        router: build_router(state),
        db,
        event_bus,
    }
}

impl TestApp {
    /// Send a request and decode the JSON response (`Value::Null` when empty)
    pub async fn request(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request("GET", uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request("POST", uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request("PUT", uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request("DELETE", uri, None).await
    }

    /// Hotel charging `price_per_kg_cents`
    pub async fn create_hotel(&self, name: &str, price_per_kg_cents: i64) -> String {
        let (status, body) = self
            .post(
                "/api/hotels",
                json!({ "name": name, "price_per_kg_cents": price_per_kg_cents }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create hotel: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    pub async fn create_guest(&self, hotel_id: &str, name: &str, room: &str) -> String {
        let (status, body) = self
            .post(
                "/api/guests",
                json!({ "hotel_id": hotel_id, "name": name, "room_number": room }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create guest: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    pub async fn create_service(&self, hotel_id: &str, room: &str, bag_count: u32) -> String {
        let (status, body) = self
            .post(
                "/api/services",
                json!({
                    "hotel_id": hotel_id,
                    "guest_name": "Ana Souza",
                    "room_number": room,
                    "bag_count": bag_count,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create service: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    /// Drive a new service through pickup, labelling and processing
    pub async fn service_in_process(&self, hotel_id: &str, bag_count: u32, weight_kg: f64) -> String {
        let id = self.create_service(hotel_id, "101", bag_count).await;

        let (status, body) = self
            .post(
                &format!("/api/services/{}/pickup", id),
                json!({ "weight_kg": weight_kg, "collector_name": "Carlos" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "pickup: {}", body);

        let (status, body) = self.post(&format!("/api/services/{}/labels", id), json!({})).await;
        assert_eq!(status, StatusCode::CREATED, "labels: {}", body);

        let (status, body) = self.post(&format!("/api/services/{}/process", id), json!({})).await;
        assert_eq!(status, StatusCode::OK, "process: {}", body);

        id
    }
}
