//! Service workflow orchestration
//!
//! Each operation runs in one SQLite transaction: load the service, check the
//! move against the transition table, write the service row plus whatever
//! else the step touches (labels, sub-services, income), record history,
//! commit. Events are emitted only after the commit succeeds.

mod delivery;
mod intake;

pub use delivery::{
    CompleteDeliveryRequest, DeliveryDecision, DeliveryOutcome, DeliveryStatus,
    PartialDeliveryRequest,
};
pub use intake::{LabelingOutcome, NewService, PickupRequest};

use serde::Deserialize;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{debug, info};
use uuid::Uuid;
use washline_common::events::{EventBus, WashlineEvent};
use washline_common::models::{Service, ServiceStatus, StatusChange};
use washline_common::workflow::validate_transition;
use washline_common::{time, Error, Result};

use crate::db;

/// Generic status change request (`PUT /api/services/:id/status`)
#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: ServiceStatus,
    pub note: Option<String>,
    /// Required when cancelling
    pub reason: Option<String>,
    pub delivered_by: Option<String>,
}

#[derive(Clone)]
pub struct ServiceWorkflow {
    db: SqlitePool,
    events: EventBus,
}

impl ServiceWorkflow {
    pub fn new(db: SqlitePool, events: EventBus) -> Self {
        Self { db, events }
    }

    /// Start a transaction holding the database write lock
    ///
    /// A deferred transaction that reads first and writes later fails with
    /// SQLITE_BUSY when another writer got there in between; taking the lock
    /// up front makes concurrent steps on one service wait their turn instead.
    async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.db.begin_with("BEGIN IMMEDIATE").await?)
    }

    fn publish(&self, events: Vec<WashlineEvent>) {
        for event in events {
            debug!("Emitting {}", event.event_type());
            self.events.emit_lossy(event);
        }
    }

    /// Validate `target` against the transition table, then run the matching operation
    ///
    /// PICKED_UP and PARTIAL_DELIVERY need data this request does not carry
    /// (weight, bag numbers) and are refused with `InvalidInput`.
    pub async fn update_status(&self, id: Uuid, request: StatusUpdateRequest) -> Result<Service> {
        let service = db::services::require_service(&self.db, id).await?;
        if service.is_sub_service() {
            return Err(sub_service_error(id));
        }
        validate_transition(service.status, request.status)?;

        match request.status {
            ServiceStatus::PickedUp => Err(Error::InvalidInput(
                "PICKED_UP requires weight and bag count; use the pickup operation".to_string(),
            )),
            ServiceStatus::PartialDelivery => Err(Error::InvalidInput(
                "PARTIAL_DELIVERY requires the delivered bag numbers; use the partial delivery operation"
                    .to_string(),
            )),
            ServiceStatus::Labeled => Ok(self.generate_labels(id).await?.service),
            ServiceStatus::InProcess => self.start_processing(id).await,
            ServiceStatus::ReadyForDelivery => self.mark_ready_for_delivery(id).await,
            ServiceStatus::Completed => {
                let request = CompleteDeliveryRequest {
                    delivered_by: request.delivered_by,
                    notes: request.note,
                };
                Ok(self.complete_delivery(id, request).await?.service)
            }
            ServiceStatus::Cancelled => {
                let reason = request.reason.or(request.note).unwrap_or_default();
                self.cancel_service(id, &reason).await
            }
            // No edge leads back to PENDING_PICKUP, so validation already failed
            ServiceStatus::PendingPickup => Err(Error::InvalidTransition {
                from: service.status,
                to: ServiceStatus::PendingPickup,
            }),
        }
    }

    /// Status changes of a service, oldest first
    pub async fn history(&self, id: Uuid) -> Result<Vec<StatusChange>> {
        db::services::require_service(&self.db, id).await?;
        db::history::list_changes(&self.db, id).await
    }
}

fn sub_service_error(id: Uuid) -> Error {
    Error::InvalidInput(format!(
        "Service {} is a delivery record and does not follow the workflow",
        id
    ))
}

/// Load a top-level service inside a transaction
async fn load_for_update(conn: &mut SqliteConnection, id: Uuid) -> Result<Service> {
    let service = db::services::require_service(&mut *conn, id).await?;
    if service.is_sub_service() {
        return Err(sub_service_error(id));
    }
    Ok(service)
}

/// Move `service` to `to`, persist the whole row and log the change
async fn apply_transition(
    conn: &mut SqliteConnection,
    service: &mut Service,
    to: ServiceStatus,
    note: Option<&str>,
    events: &mut Vec<WashlineEvent>,
) -> Result<()> {
    let from = service.status;
    validate_transition(from, to)?;

    let now = time::now();
    service.status = to;
    service.updated_at = now;

    db::services::save_service(&mut *conn, service).await?;
    db::history::record_change(&mut *conn, service.id, Some(from), to, note).await?;

    info!("Service {} status {} -> {}", service.id, from, to);
    events.push(WashlineEvent::ServiceStatusChanged {
        service_id: service.id,
        old_status: from,
        new_status: to,
        timestamp: now,
    });
    Ok(())
}
