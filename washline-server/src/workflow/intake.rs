//! Intake half of the workflow: creation, pickup, labelling, processing, cancellation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use tracing::{info, warn};
use uuid::Uuid;
use washline_common::db::settings::{get_setting_i64, MAX_BAGS_PER_SERVICE};
use washline_common::events::WashlineEvent;
use washline_common::models::{BagLabel, LabelStatus, Service, ServicePriority, ServiceStatus};
use washline_common::workflow::{calculate_price, label_code, validate_transition};
use washline_common::{time, Error, Result};

use super::{apply_transition, load_for_update, ServiceWorkflow};
use crate::db;
use crate::db::{clean_opt, require_text};

#[derive(Debug, Clone, Deserialize)]
pub struct NewService {
    pub hotel_id: Uuid,
    pub guest_id: Option<Uuid>,
    /// Defaults to the linked guest's name
    pub guest_name: Option<String>,
    /// Defaults to the linked guest's room
    pub room_number: Option<String>,
    /// Bags announced by the guest; confirmed at pickup
    pub bag_count: u32,
    #[serde(default)]
    pub priority: ServicePriority,
    pub observations: Option<String>,
    pub estimated_pickup_at: Option<DateTime<Utc>>,
    pub estimated_delivery_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PickupRequest {
    /// Actual bag count; keeps the announced count when absent
    pub bag_count: Option<u32>,
    pub weight_kg: f64,
    pub collector_name: String,
    pub observations: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LabelingOutcome {
    pub service: Service,
    pub labels: Vec<BagLabel>,
}

async fn check_bag_count(conn: &mut SqliteConnection, bag_count: u32) -> Result<()> {
    let max = get_setting_i64(&mut *conn, MAX_BAGS_PER_SERVICE, 50).await?;
    if bag_count == 0 || i64::from(bag_count) > max {
        return Err(Error::InvalidInput(format!(
            "bag_count must be between 1 and {}, got {}",
            max, bag_count
        )));
    }
    Ok(())
}

impl ServiceWorkflow {
    /// Register a new service waiting for pickup
    pub async fn create_service(&self, input: NewService) -> Result<Service> {
        let mut tx = self.begin_write().await?;

        let hotel = db::hotels::require_hotel(&mut *tx, input.hotel_id).await?;
        if !hotel.active {
            return Err(Error::InvalidInput(format!(
                "Hotel {} is inactive",
                hotel.name
            )));
        }

        let guest = match input.guest_id {
            Some(guest_id) => {
                let guest = db::guests::require_guest(&mut *tx, guest_id).await?;
                if guest.hotel_id != hotel.id {
                    return Err(Error::InvalidInput(format!(
                        "Guest {} does not belong to hotel {}",
                        guest_id, hotel.id
                    )));
                }
                Some(guest)
            }
            None => None,
        };

        let guest_name = match (input.guest_name, &guest) {
            (Some(name), _) => require_text("guest_name", &name)?,
            (None, Some(guest)) => guest.name.clone(),
            (None, None) => return Err(Error::InvalidInput("guest_name is required".to_string())),
        };
        let room_number = match (input.room_number, &guest) {
            (Some(room), _) => require_text("room_number", &room)?,
            (None, Some(guest)) => guest.room_number.clone(),
            (None, None) => {
                return Err(Error::InvalidInput("room_number is required".to_string()))
            }
        };

        check_bag_count(&mut tx, input.bag_count).await?;

        let now = time::now();
        let service = Service {
            id: Uuid::new_v4(),
            hotel_id: hotel.id,
            guest_id: guest.map(|g| g.id),
            guest_name,
            room_number,
            status: ServiceStatus::PendingPickup,
            priority: input.priority,
            bag_count: input.bag_count,
            weight_kg: None,
            price_per_kg_cents: hotel.price_per_kg_cents,
            total_price_cents: None,
            observations: clean_opt(input.observations),
            internal_notes: None,
            collector_name: None,
            delivered_by: None,
            estimated_pickup_at: input.estimated_pickup_at,
            estimated_delivery_at: input.estimated_delivery_at,
            picked_up_at: None,
            labeled_at: None,
            processing_started_at: None,
            delivered_at: None,
            cancelled_at: None,
            cancellation_reason: None,
            delivered_bag_numbers: Vec::new(),
            partial_delivery_percentage: 0,
            parent_service_id: None,
            created_at: now,
            updated_at: now,
        };

        db::services::insert_service(&mut *tx, &service).await?;
        db::history::record_change(
            &mut *tx,
            service.id,
            None,
            ServiceStatus::PendingPickup,
            Some("Service created"),
        )
        .await?;
        tx.commit().await?;

        info!(
            "Created service {} for room {} at {}",
            service.id, service.room_number, hotel.name
        );
        self.publish(vec![WashlineEvent::ServiceCreated {
            service_id: service.id,
            hotel_id: service.hotel_id,
            room_number: service.room_number.clone(),
            timestamp: now,
        }]);

        Ok(service)
    }

    /// Confirm bag count and weight at pickup; prices the service
    pub async fn register_pickup(&self, id: Uuid, request: PickupRequest) -> Result<Service> {
        let mut tx = self.begin_write().await?;
        let mut events = Vec::new();

        let mut service = load_for_update(&mut tx, id).await?;
        validate_transition(service.status, ServiceStatus::PickedUp)?;

        let collector = require_text("collector_name", &request.collector_name)?;
        let bag_count = request.bag_count.unwrap_or(service.bag_count);
        check_bag_count(&mut tx, bag_count).await?;
        let total = calculate_price(request.weight_kg, service.price_per_kg_cents)?;

        if bag_count != service.bag_count {
            info!(
                "Service {}: announced {} bags, picked up {}",
                id, service.bag_count, bag_count
            );
        }

        service.bag_count = bag_count;
        service.weight_kg = Some(request.weight_kg);
        service.total_price_cents = Some(total);
        service.collector_name = Some(collector);
        if request.observations.is_some() {
            service.observations = clean_opt(request.observations);
        }
        service.picked_up_at = Some(time::now());

        apply_transition(&mut tx, &mut service, ServiceStatus::PickedUp, None, &mut events).await?;
        tx.commit().await?;
        self.publish(events);

        Ok(service)
    }

    /// Create one label per bag and mark the service LABELED
    pub async fn generate_labels(&self, id: Uuid) -> Result<LabelingOutcome> {
        let mut tx = self.begin_write().await?;
        let mut events = Vec::new();

        let mut service = load_for_update(&mut tx, id).await?;
        validate_transition(service.status, ServiceStatus::Labeled)?;

        let existing = db::labels::count_labels(&mut *tx, id).await?;
        if existing > 0 {
            return Err(Error::Conflict(format!(
                "Service {} already has {} labels",
                id, existing
            )));
        }

        let hotel = db::hotels::require_hotel(&mut *tx, service.hotel_id).await?;
        let now = time::now();
        let today = now.date_naive();

        let labels: Vec<BagLabel> = (1..=service.bag_count)
            .map(|bag_number| BagLabel {
                id: Uuid::new_v4(),
                service_id: service.id,
                hotel_id: service.hotel_id,
                bag_number,
                code: label_code(&hotel.name, service.id, today, bag_number, service.bag_count),
                status: LabelStatus::Labeled,
                notes: None,
                created_at: now,
                updated_at: now,
            })
            .collect();

        db::labels::insert_labels(&mut tx, &labels).await?;
        service.labeled_at = Some(now);

        apply_transition(&mut tx, &mut service, ServiceStatus::Labeled, None, &mut events).await?;
        events.push(WashlineEvent::BagLabelsGenerated {
            service_id: service.id,
            label_count: service.bag_count,
            timestamp: now,
        });
        tx.commit().await?;
        self.publish(events);

        Ok(LabelingOutcome { service, labels })
    }

    /// Laundry enters the washing process
    pub async fn start_processing(&self, id: Uuid) -> Result<Service> {
        let mut tx = self.begin_write().await?;
        let mut events = Vec::new();

        let mut service = load_for_update(&mut tx, id).await?;
        validate_transition(service.status, ServiceStatus::InProcess)?;

        let labelled = db::labels::count_labels(&mut *tx, id).await?;
        if labelled != i64::from(service.bag_count) {
            return Err(Error::Conflict(format!(
                "Service {} has {} labels for {} bags",
                id, labelled, service.bag_count
            )));
        }

        db::labels::set_status_for_service(&mut *tx, id, LabelStatus::Processing).await?;
        service.processing_started_at = Some(time::now());

        apply_transition(&mut tx, &mut service, ServiceStatus::InProcess, None, &mut events).await?;
        tx.commit().await?;
        self.publish(events);

        Ok(service)
    }

    /// Cancel a service that has not started processing
    pub async fn cancel_service(&self, id: Uuid, reason: &str) -> Result<Service> {
        let reason = require_text("reason", reason)?;

        let mut tx = self.begin_write().await?;
        let mut events = Vec::new();

        let mut service = load_for_update(&mut tx, id).await?;
        validate_transition(service.status, ServiceStatus::Cancelled)?;

        service.cancelled_at = Some(time::now());
        service.cancellation_reason = Some(reason.clone());

        apply_transition(
            &mut tx,
            &mut service,
            ServiceStatus::Cancelled,
            Some(&reason),
            &mut events,
        )
        .await?;
        tx.commit().await?;

        warn!("Service {} cancelled: {}", id, reason);
        self.publish(events);

        Ok(service)
    }
}
