//! Integration tests for washline-server CRUD endpoints
//!
//! Tests cover:
//! - Health endpoint
//! - Hotels, guests, services, labels and transactions CRUD
//! - Error status codes and the JSON error envelope
//! - Pagination envelope and list filters

mod helpers;

use axum::http::StatusCode;
use helpers::test_app;
use serde_json::json;
use uuid::Uuid;
use washline_common::workflow::label_code;

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app().await;

    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "washline-server");
    assert!(body["version"].is_string());
}

// =============================================================================
// Hotels
// =============================================================================

#[tokio::test]
async fn test_hotel_defaults_to_configured_rate() {
    let app = test_app().await;

    let (status, body) = app
        .post("/api/hotels", json!({ "name": "  Hotel Atlântico  " }))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Hotel Atlântico");
    assert_eq!(body["price_per_kg_cents"], 350);
    assert_eq!(body["active"], true);
}

#[tokio::test]
async fn test_hotel_get_update_and_list() {
    let app = test_app().await;
    let id = app.create_hotel("Grand Plaza", 420).await;

    let (status, body) = app.get(&format!("/api/hotels/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price_per_kg_cents"], 420);

    let (status, body) = app
        .put(
            &format!("/api/hotels/{}", id),
            json!({ "price_per_kg_cents": 500, "contact_person": "Marta" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price_per_kg_cents"], 500);
    assert_eq!(body["contact_person"], "Marta");
    assert_eq!(body["name"], "Grand Plaza");

    app.create_hotel("Beira Mar", 300).await;
    let (status, body) = app.get("/api/hotels").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["page"], 1);
    assert_eq!(body["page_size"], 50);
    assert_eq!(body["total_pages"], 1);
    // Sorted by name
    assert_eq!(body["items"][0]["name"], "Beira Mar");
}

#[tokio::test]
async fn test_inactive_hotels_filtered() {
    let app = test_app().await;
    let id = app.create_hotel("Closed Inn", 300).await;
    app.create_hotel("Open Inn", 300).await;

    let (status, _) = app
        .put(&format!("/api/hotels/{}", id), json!({ "active": false }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get("/api/hotels?active_only=true").await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["name"], "Open Inn");

    let (_, body) = app.get("/api/hotels").await;
    assert_eq!(body["total"], 2);
}

#[tokio::test]
async fn test_hotel_validation_errors() {
    let app = test_app().await;

    let (status, body) = app.post("/api/hotels", json!({ "name": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, _) = app
        .post("/api/hotels", json!({ "name": "Cheap", "price_per_kg_cents": -1 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_hotel_is_404() {
    let app = test_app().await;

    let (status, body) = app.get(&format!("/api/hotels/{}", Uuid::new_v4())).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert!(body["error"]["message"].is_string());
}

#[tokio::test]
async fn test_hotel_delete_rules() {
    let app = test_app().await;
    let busy = app.create_hotel("Busy Hotel", 350).await;
    app.create_guest(&busy, "Ana", "12").await;

    let (status, body) = app.delete(&format!("/api/hotels/{}", busy)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let empty = app.create_hotel("Empty Hotel", 350).await;
    let (status, _) = app.delete(&format!("/api/hotels/{}", empty)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&format!("/api/hotels/{}", empty)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Guests
// =============================================================================

#[tokio::test]
async fn test_guest_requires_existing_hotel() {
    let app = test_app().await;

    let (status, _) = app
        .post(
            "/api/guests",
            json!({ "hotel_id": Uuid::new_v4(), "name": "Ana", "room_number": "12" }),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_guest_filters() {
    let app = test_app().await;
    let hotel_a = app.create_hotel("Hotel A", 350).await;
    let hotel_b = app.create_hotel("Hotel B", 350).await;
    app.create_guest(&hotel_a, "Ana", "101").await;
    app.create_guest(&hotel_a, "Bruno", "102").await;
    app.create_guest(&hotel_b, "Clara", "101").await;

    let (_, body) = app.get(&format!("/api/guests?hotel_id={}", hotel_a)).await;
    assert_eq!(body["total"], 2);

    let (_, body) = app.get("/api/guests?room_number=101").await;
    assert_eq!(body["total"], 2);

    let (_, body) = app
        .get(&format!("/api/guests?hotel_id={}&room_number=101", hotel_b))
        .await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["name"], "Clara");
}

#[tokio::test]
async fn test_guest_update() {
    let app = test_app().await;
    let hotel = app.create_hotel("Hotel A", 350).await;
    let guest = app.create_guest(&hotel, "Ana", "101").await;

    let (status, body) = app
        .put(
            &format!("/api/guests/{}", guest),
            json!({ "room_number": "305", "phone": "+55 11 5555-0000" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["room_number"], "305");
    assert_eq!(body["phone"], "+55 11 5555-0000");
    assert_eq!(body["name"], "Ana");
}

#[tokio::test]
async fn test_guest_with_active_service_cannot_be_deleted() {
    let app = test_app().await;
    let hotel = app.create_hotel("Hotel A", 350).await;
    let guest = app.create_guest(&hotel, "Ana", "101").await;

    let (status, _) = app
        .post(
            "/api/services",
            json!({ "hotel_id": hotel, "guest_id": guest, "bag_count": 2 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app.delete(&format!("/api/guests/{}", guest)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let lonely = app.create_guest(&hotel, "Bruno", "102").await;
    let (status, _) = app.delete(&format!("/api/guests/{}", lonely)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

// =============================================================================
// Services
// =============================================================================

#[tokio::test]
async fn test_service_takes_name_and_room_from_guest() {
    let app = test_app().await;
    let hotel = app.create_hotel("Hotel A", 350).await;
    let guest = app.create_guest(&hotel, "Ana Souza", "214").await;

    let (status, body) = app
        .post(
            "/api/services",
            json!({ "hotel_id": hotel, "guest_id": guest, "bag_count": 3, "priority": "URGENT" }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "PENDING_PICKUP");
    assert_eq!(body["guest_name"], "Ana Souza");
    assert_eq!(body["room_number"], "214");
    assert_eq!(body["priority"], "URGENT");
    assert_eq!(body["bag_count"], 3);
    assert_eq!(body["price_per_kg_cents"], 350);
    assert!(body["total_price_cents"].is_null());
    assert_eq!(body["partial_delivery_percentage"], 0);
}

#[tokio::test]
async fn test_service_validation() {
    let app = test_app().await;
    let hotel = app.create_hotel("Hotel A", 350).await;
    let other = app.create_hotel("Hotel B", 350).await;
    let stranger = app.create_guest(&other, "Clara", "9").await;

    // Guest from another hotel
    let (status, _) = app
        .post(
            "/api/services",
            json!({ "hotel_id": hotel, "guest_id": stranger, "bag_count": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // No guest and no room
    let (status, _) = app
        .post(
            "/api/services",
            json!({ "hotel_id": hotel, "guest_name": "Ana", "bag_count": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for bag_count in [0, 51] {
        let (status, _) = app
            .post(
                "/api/services",
                json!({
                    "hotel_id": hotel,
                    "guest_name": "Ana",
                    "room_number": "1",
                    "bag_count": bag_count,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "bag_count {}", bag_count);
    }

    let (status, _) = app
        .post(
            "/api/services",
            json!({
                "hotel_id": Uuid::new_v4(),
                "guest_name": "Ana",
                "room_number": "1",
                "bag_count": 1,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_inactive_hotel_rejects_new_services() {
    let app = test_app().await;
    let hotel = app.create_hotel("Hotel A", 350).await;
    app.put(&format!("/api/hotels/{}", hotel), json!({ "active": false }))
        .await;

    let (status, _) = app
        .post(
            "/api/services",
            json!({ "hotel_id": hotel, "guest_name": "Ana", "room_number": "1", "bag_count": 1 }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_service_list_filters() {
    let app = test_app().await;
    let hotel_a = app.create_hotel("Hotel A", 350).await;
    let hotel_b = app.create_hotel("Hotel B", 350).await;
    app.create_service(&hotel_a, "1", 1).await;
    app.create_service(&hotel_a, "2", 1).await;
    app.service_in_process(&hotel_b, 2, 1.0).await;

    let (_, body) = app.get(&format!("/api/services?hotel_id={}", hotel_a)).await;
    assert_eq!(body["total"], 2);

    let (_, body) = app.get("/api/services?status=IN_PROCESS").await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["hotel_id"], hotel_b.as_str());

    let (_, body) = app.get("/api/services?status=PENDING_PICKUP").await;
    assert_eq!(body["total"], 2);
}

#[tokio::test]
async fn test_service_details_edit() {
    let app = test_app().await;
    let hotel = app.create_hotel("Hotel A", 350).await;
    let id = app.create_service(&hotel, "101", 2).await;

    let (status, body) = app
        .put(
            &format!("/api/services/{}", id),
            json!({ "room_number": "102", "priority": "HIGH", "internal_notes": "Stain on shirt" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["room_number"], "102");
    assert_eq!(body["priority"], "HIGH");
    assert_eq!(body["internal_notes"], "Stain on shirt");
    assert_eq!(body["status"], "PENDING_PICKUP");
}

#[tokio::test]
async fn test_service_edit_keeps_delivery_progress() {
    let app = test_app().await;
    let hotel = app.create_hotel("Hotel A", 350).await;
    let id = app.service_in_process(&hotel, 3, 2.0).await;

    let (status, body) = app
        .post(
            &format!("/api/services/{}/partial-delivery", id),
            json!({ "bags": [1] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "partial delivery: {}", body);

    let (status, body) = app
        .put(
            &format!("/api/services/{}", id),
            json!({ "observations": "Leave at reception" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "edit: {}", body);
    assert_eq!(body["observations"], "Leave at reception");
    assert_eq!(body["status"], "PARTIAL_DELIVERY");
    assert_eq!(body["delivered_bag_numbers"], json!([1]));
    assert_eq!(body["total_price_cents"], 700);

    let (_, body) = app.get(&format!("/api/services/{}/delivery-status", id)).await;
    assert_eq!(body["delivered_bags"], json!([1]));
    assert_eq!(body["remaining_bags"], json!([2, 3]));

    let (status, body) = app
        .post(&format!("/api/services/{}/complete", id), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK, "complete: {}", body);

    let (status, body) = app
        .put(&format!("/api/services/{}", id), json!({ "room_number": "999" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (_, body) = app.get(&format!("/api/services/{}", id)).await;
    assert_eq!(body["room_number"], "101");
    assert_eq!(body["status"], "COMPLETED");
}

#[tokio::test]
async fn test_service_delete_rules() {
    let app = test_app().await;
    let hotel = app.create_hotel("Hotel A", 350).await;

    let pending = app.create_service(&hotel, "101", 2).await;
    let (status, _) = app.delete(&format!("/api/services/{}", pending)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&format!("/api/services/{}", pending)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let running = app.service_in_process(&hotel, 2, 1.0).await;
    let (status, _) = app.delete(&format!("/api/services/{}", running)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

// =============================================================================
// Labels
// =============================================================================

#[tokio::test]
async fn test_label_lookup_and_notes() {
    let app = test_app().await;
    let hotel = app.create_hotel("Grand Plaza", 350).await;
    let service = app.service_in_process(&hotel, 2, 1.0).await;

    let (status, labels) = app.get(&format!("/api/services/{}/labels", service)).await;
    assert_eq!(status, StatusCode::OK);
    let labels = labels.as_array().unwrap().clone();
    assert_eq!(labels.len(), 2);

    let code = labels[1]["code"].as_str().unwrap().to_string();
    assert!(code.starts_with("GRA-"), "unexpected code {}", code);
    assert!(code.ends_with("-02/02"), "unexpected code {}", code);

    let (status, body) = app.get(&format!("/api/labels/code/{}", code)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bag_number"], 2);
    assert_eq!(body["status"], "PROCESSING");

    let label_id = labels[0]["id"].as_str().unwrap();
    let (status, body) = app
        .put(&format!("/api/labels/{}", label_id), json!({ "notes": "Delicate" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notes"], "Delicate");

    let (status, body) = app.get(&format!("/api/labels/{}", label_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notes"], "Delicate");

    let (status, _) = app.get("/api/labels/code/NOPE-000000-000000-01/01").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_label_code_taken_by_another_service_is_conflict() {
    let app = test_app().await;
    let hotel = app.create_hotel("Grand Plaza", 350).await;
    let first = app.service_in_process(&hotel, 1, 1.0).await;

    let second = app.create_service(&hotel, "202", 1).await;
    let (status, body) = app
        .post(
            &format!("/api/services/{}/pickup", second),
            json!({ "weight_kg": 1.0, "collector_name": "Carlos" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "pickup: {}", body);

    // Give the first service's label the code the second one is about to get
    let second_id: Uuid = second.parse().unwrap();
    let today = chrono::Utc::now().date_naive();
    let code = label_code("Grand Plaza", second_id, today, 1, 1);
    sqlx::query("UPDATE bag_labels SET code = ? WHERE service_id = ?")
        .bind(&code)
        .bind(&first)
        .execute(&app.db)
        .await
        .unwrap();

    let (status, body) = app
        .post(&format!("/api/services/{}/labels", second), json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "labels: {}", body);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (_, body) = app.get(&format!("/api/services/{}", second)).await;
    assert_eq!(body["status"], "PICKED_UP");
    let (_, labels) = app.get(&format!("/api/services/{}/labels", second)).await;
    assert_eq!(labels.as_array().unwrap().len(), 0);
}

// =============================================================================
// Transactions
// =============================================================================

#[tokio::test]
async fn test_transaction_crud() {
    let app = test_app().await;

    let (status, body) = app
        .post(
            "/api/transactions",
            json!({
                "transaction_type": "EXPENSE",
                "category": "detergent",
                "amount_cents": 4590,
                "payment_method": "CARD",
                "description": "20L detergent",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_str().unwrap().to_string();
    assert_eq!(body["transaction_type"], "EXPENSE");

    let (status, body) = app
        .put(
            &format!("/api/transactions/{}", id),
            json!({ "amount_cents": 4990 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["amount_cents"], 4990);
    assert_eq!(body["category"], "detergent");

    let (status, _) = app.delete(&format!("/api/transactions/{}", id)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&format!("/api/transactions/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.delete(&format!("/api/transactions/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_transaction_validation() {
    let app = test_app().await;

    let (status, _) = app
        .post(
            "/api/transactions",
            json!({
                "transaction_type": "INCOME",
                "category": "misc",
                "amount_cents": 0,
                "payment_method": "CASH",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/api/transactions",
            json!({
                "transaction_type": "INCOME",
                "category": "misc",
                "amount_cents": 100,
                "payment_method": "CASH",
                "hotel_id": Uuid::new_v4(),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_transaction_filters() {
    let app = test_app().await;
    let hotel = app.create_hotel("Hotel A", 350).await;

    for (kind, amount, hotel_id, when) in [
        ("INCOME", 1000, Some(hotel.as_str()), "2026-03-01T10:00:00Z"),
        ("EXPENSE", 200, None, "2026-03-05T10:00:00Z"),
        ("EXPENSE", 300, None, "2026-04-02T10:00:00Z"),
    ] {
        let (status, _) = app
            .post(
                "/api/transactions",
                json!({
                    "transaction_type": kind,
                    "category": "misc",
                    "amount_cents": amount,
                    "payment_method": "CASH",
                    "hotel_id": hotel_id,
                    "occurred_at": when,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, body) = app.get("/api/transactions?type=EXPENSE").await;
    assert_eq!(body["total"], 2);
    // Newest first
    assert_eq!(body["items"][0]["amount_cents"], 300);

    let (_, body) = app.get(&format!("/api/transactions?hotel_id={}", hotel)).await;
    assert_eq!(body["total"], 1);

    let (_, body) = app
        .get("/api/transactions?from=2026-03-01T00:00:00Z&to=2026-04-01T00:00:00Z")
        .await;
    assert_eq!(body["total"], 2);
}

// =============================================================================
// Event stream
// =============================================================================

#[tokio::test]
async fn test_event_stream_is_sse() {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    let app = test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/events").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().starts_with("text/event-stream"));
}

// =============================================================================
// File-backed database
// =============================================================================

#[tokio::test]
async fn test_file_database_survives_restart() {
    use tempfile::TempDir;
    use washline_common::db::init_database;
    use washline_common::events::EventBus;
    use washline_server::{build_router, AppState};

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("washline.db");

    let db = init_database(&db_path).await.unwrap();
    let app = helpers::TestApp {
        router: build_router(AppState::new(db.clone(), EventBus::new(10))),
        db: db.clone(),
        event_bus: EventBus::new(10),
    };
    let hotel = app.create_hotel("Persistent Inn", 380).await;
    let service = app.service_in_process(&hotel, 2, 1.0).await;
    db.close().await;

    let db = init_database(&db_path).await.unwrap();
    let app = helpers::TestApp {
        router: build_router(AppState::new(db.clone(), EventBus::new(10))),
        db,
        event_bus: EventBus::new(10),
    };

    let (status, body) = app.get(&format!("/api/services/{}", service)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "IN_PROCESS");
    assert_eq!(body["total_price_cents"], 380);
}
