//! Event types and EventBus
//!
//! Workflow operations announce what they changed so connected front ends can
//! refresh without polling. Events are serialized as-is for SSE transmission.

use crate::models::{ServiceStatus, TransactionType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WashlineEvent {
    /// New service registered, waiting for pickup
    ServiceCreated {
        service_id: Uuid,
        hotel_id: Uuid,
        room_number: String,
        timestamp: DateTime<Utc>,
    },

    /// Service moved along the workflow
    ServiceStatusChanged {
        service_id: Uuid,
        old_status: ServiceStatus,
        new_status: ServiceStatus,
        timestamp: DateTime<Utc>,
    },

    /// Labels printed for every bag of a service
    BagLabelsGenerated {
        service_id: Uuid,
        label_count: u32,
        timestamp: DateTime<Utc>,
    },

    /// A batch of bags went out as a delivery sub-service
    PartialDeliveryRecorded {
        service_id: Uuid,
        sub_service_id: Uuid,
        bags: Vec<u32>,
        delivered_count: u32,
        remaining_count: u32,
        percentage: u8,
        timestamp: DateTime<Utc>,
    },

    TransactionRecorded {
        transaction_id: Uuid,
        transaction_type: TransactionType,
        amount_cents: i64,
        service_id: Option<Uuid>,
        timestamp: DateTime<Utc>,
    },
}

impl WashlineEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            WashlineEvent::ServiceCreated { .. } => "ServiceCreated",
            WashlineEvent::ServiceStatusChanged { .. } => "ServiceStatusChanged",
            WashlineEvent::BagLabelsGenerated { .. } => "BagLabelsGenerated",
            WashlineEvent::PartialDeliveryRecorded { .. } => "PartialDeliveryRecorded",
            WashlineEvent::TransactionRecorded { .. } => "TransactionRecorded",
        }
    }
}

/// Broadcast channel shared by all HTTP handlers
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<WashlineEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// Slow subscribers lose the oldest events once `capacity` is exceeded.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<WashlineEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: WashlineEvent) {
        let _ = self.tx.send(event);
    }
}
