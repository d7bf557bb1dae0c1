//! Database models

mod status;

pub use status::{LabelStatus, PaymentMethod, ServicePriority, ServiceStatus, TransactionType};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotel {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Laundry rate charged to this hotel
    pub price_per_kg_cents: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guest {
    pub id: Uuid,
    pub hotel_id: Uuid,
    pub name: String,
    pub room_number: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A laundry job, or a delivery sub-service when `parent_service_id` is set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub hotel_id: Uuid,
    pub guest_id: Option<Uuid>,
    pub guest_name: String,
    pub room_number: String,
    pub status: ServiceStatus,
    pub priority: ServicePriority,
    pub bag_count: u32,
    pub weight_kg: Option<f64>,
    /// Hotel rate at the time the service was created
    pub price_per_kg_cents: i64,
    pub total_price_cents: Option<i64>,
    pub observations: Option<String>,
    pub internal_notes: Option<String>,
    pub collector_name: Option<String>,
    pub delivered_by: Option<String>,
    pub estimated_pickup_at: Option<DateTime<Utc>>,
    pub estimated_delivery_at: Option<DateTime<Utc>>,
    pub picked_up_at: Option<DateTime<Utc>>,
    pub labeled_at: Option<DateTime<Utc>>,
    pub processing_started_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    /// Sorted bag numbers already handed back to the guest
    pub delivered_bag_numbers: Vec<u32>,
    pub partial_delivery_percentage: u8,
    pub parent_service_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Service {
    pub fn is_sub_service(&self) -> bool {
        self.parent_service_id.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BagLabel {
    pub id: Uuid,
    pub service_id: Uuid,
    pub hotel_id: Uuid,
    pub bag_number: u32,
    pub code: String,
    pub status: LabelStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub transaction_type: TransactionType,
    pub category: String,
    pub amount_cents: i64,
    pub payment_method: PaymentMethod,
    pub description: Option<String>,
    pub hotel_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// One row of a service's status history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub id: Uuid,
    pub service_id: Uuid,
    pub from_status: Option<ServiceStatus>,
    pub to_status: ServiceStatus,
    pub note: Option<String>,
    pub changed_at: DateTime<Utc>,
}
