//! Delivery half of the workflow
//!
//! Once laundry is processed the operator decides between delivering
//! everything at once and delivering some bags now. Every batch of bags that
//! leaves after a partial delivery is stored as a sub-service (a COMPLETED
//! child row carrying exactly those bags), and the parent's delivered set is
//! the union of its children's.

use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use tracing::info;
use uuid::Uuid;
use washline_common::events::WashlineEvent;
use washline_common::models::{
    LabelStatus, PaymentMethod, Service, ServiceStatus, Transaction, TransactionType,
};
use washline_common::workflow::{prorate_batch, validate_transition, BagLedger};
use washline_common::{time, Error, Result};

use super::{apply_transition, load_for_update, sub_service_error, ServiceWorkflow};
use crate::db;
use crate::db::clean_opt;
use crate::db::transactions::{build_transaction, NewTransaction};

pub const SERVICE_INCOME_CATEGORY: &str = "laundry_service";

/// Choice made once processing is finished
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum DeliveryDecision {
    /// Everything goes out together; the service waits in READY_FOR_DELIVERY
    Complete,
    /// Deliver the listed bags now
    Partial(PartialDeliveryRequest),
}

#[derive(Debug, Clone, Deserialize)]
pub struct PartialDeliveryRequest {
    pub bags: Vec<u32>,
    pub delivered_by: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompleteDeliveryRequest {
    pub delivered_by: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeliveryOutcome {
    pub service: Service,
    /// Present when a batch of bags was recorded as a sub-service
    pub sub_service: Option<Service>,
    /// Present when the service reached COMPLETED with a price
    pub income: Option<Transaction>,
}

/// Bag-level delivery progress of a service
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryStatus {
    pub service_id: Uuid,
    pub status: ServiceStatus,
    pub bag_count: u32,
    pub delivered_bags: Vec<u32>,
    pub remaining_bags: Vec<u32>,
    pub delivered_count: u32,
    pub remaining_count: u32,
    pub percentage: u8,
    pub sub_services: Vec<Service>,
}

fn ledger_for(service: &Service) -> Result<BagLedger> {
    BagLedger::with_delivered(
        service.bag_count,
        service.delivered_bag_numbers.iter().copied(),
    )
}

/// Record `bags` (already validated against the ledger) as a sub-service of `parent`
///
/// `ledger` already includes `bags`. Batch prices come from the running
/// total, so the children always add up to the parent total.
async fn record_batch(
    conn: &mut SqliteConnection,
    parent: &mut Service,
    ledger: &BagLedger,
    bags: Vec<u32>,
    delivered_by: Option<String>,
    notes: Option<String>,
    events: &mut Vec<WashlineEvent>,
) -> Result<Service> {
    let earlier = db::services::list_sub_services(&mut *conn, parent.id).await?;
    let batch_size = bags.len() as u32;

    let delivered_before = ledger.delivered_count() - batch_size;
    let price = parent
        .total_price_cents
        .map(|total| prorate_batch(total, delivered_before, batch_size, parent.bag_count));

    let now = time::now();
    let sub = Service {
        id: Uuid::new_v4(),
        status: ServiceStatus::Completed,
        bag_count: batch_size,
        weight_kg: None,
        total_price_cents: price,
        observations: notes,
        internal_notes: None,
        delivered_by: delivered_by.clone(),
        delivered_at: Some(now),
        cancelled_at: None,
        cancellation_reason: None,
        delivered_bag_numbers: bags.clone(),
        partial_delivery_percentage: 100,
        parent_service_id: Some(parent.id),
        created_at: now,
        updated_at: now,
        ..parent.clone()
    };

    db::services::insert_service(&mut *conn, &sub).await?;
    let note = format!(
        "Delivery {} of service {}: bags {:?}",
        earlier.len() + 1,
        parent.id,
        bags
    );
    db::history::record_change(&mut *conn, sub.id, None, ServiceStatus::Completed, Some(&note))
        .await?;
    db::labels::set_status_for_bags(conn, parent.id, &bags, LabelStatus::Delivered).await?;

    parent.delivered_bag_numbers = ledger.delivered_bags();
    parent.partial_delivery_percentage = ledger.percentage();
    if delivered_by.is_some() {
        parent.delivered_by = delivered_by;
    }

    info!(
        "Service {}: delivered bags {:?} ({}/{} bags, {}%)",
        parent.id,
        bags,
        ledger.delivered_count(),
        ledger.bag_count(),
        ledger.percentage()
    );
    events.push(WashlineEvent::PartialDeliveryRecorded {
        service_id: parent.id,
        sub_service_id: sub.id,
        bags,
        delivered_count: ledger.delivered_count(),
        remaining_count: ledger.remaining_count(),
        percentage: ledger.percentage(),
        timestamp: now,
    });

    Ok(sub)
}

/// Close out a service whose bags have all been handed over
///
/// Books the service price as income charged to the hotel account.
async fn finish_service(
    conn: &mut SqliteConnection,
    service: &mut Service,
    note: Option<&str>,
    events: &mut Vec<WashlineEvent>,
) -> Result<Option<Transaction>> {
    let now = time::now();
    service.delivered_bag_numbers = (1..=service.bag_count).collect();
    service.partial_delivery_percentage = 100;
    service.delivered_at = Some(now);

    db::labels::set_status_for_service(&mut *conn, service.id, LabelStatus::Delivered).await?;
    apply_transition(conn, service, ServiceStatus::Completed, note, events).await?;

    let income = match service.total_price_cents {
        Some(amount) if amount > 0 => {
            let transaction = build_transaction(NewTransaction {
                transaction_type: TransactionType::Income,
                category: SERVICE_INCOME_CATEGORY.to_string(),
                amount_cents: amount,
                payment_method: PaymentMethod::Credit,
                description: Some(format!(
                    "Laundry service room {} ({} bags)",
                    service.room_number, service.bag_count
                )),
                hotel_id: Some(service.hotel_id),
                service_id: Some(service.id),
                occurred_at: Some(now),
            })?;
            db::transactions::insert_transaction(&mut *conn, &transaction).await?;
            events.push(WashlineEvent::TransactionRecorded {
                transaction_id: transaction.id,
                transaction_type: transaction.transaction_type,
                amount_cents: transaction.amount_cents,
                service_id: transaction.service_id,
                timestamp: now,
            });
            Some(transaction)
        }
        _ => None,
    };

    Ok(income)
}

impl ServiceWorkflow {
    /// Apply the operator's delivery decision for a processed service
    pub async fn decide_delivery(
        &self,
        id: Uuid,
        decision: DeliveryDecision,
    ) -> Result<DeliveryOutcome> {
        let service = db::services::require_service(&self.db, id).await?;
        if service.is_sub_service() {
            return Err(sub_service_error(id));
        }
        let target = match &decision {
            DeliveryDecision::Complete => ServiceStatus::ReadyForDelivery,
            DeliveryDecision::Partial(_) => ServiceStatus::PartialDelivery,
        };
        if service.status != ServiceStatus::InProcess {
            return Err(Error::InvalidTransition {
                from: service.status,
                to: target,
            });
        }

        match decision {
            DeliveryDecision::Complete => Ok(DeliveryOutcome {
                service: self.mark_ready_for_delivery(id).await?,
                sub_service: None,
                income: None,
            }),
            DeliveryDecision::Partial(request) => self.record_partial_delivery(id, request).await,
        }
    }

    /// Deliver some bags now
    ///
    /// Ends in COMPLETED when the batch holds the last outstanding bags,
    /// otherwise in PARTIAL_DELIVERY.
    pub async fn record_partial_delivery(
        &self,
        id: Uuid,
        request: PartialDeliveryRequest,
    ) -> Result<DeliveryOutcome> {
        let mut tx = self.begin_write().await?;
        let mut events = Vec::new();

        let mut service = load_for_update(&mut tx, id).await?;
        validate_transition(service.status, ServiceStatus::PartialDelivery)?;

        let mut ledger = ledger_for(&service)?;
        let bags = ledger.record_delivery(&request.bags)?;
        let note = format!("Delivered bags {:?}", bags);

        let sub = record_batch(
            &mut tx,
            &mut service,
            &ledger,
            bags,
            clean_opt(request.delivered_by),
            clean_opt(request.notes),
            &mut events,
        )
        .await?;

        let income = if ledger.is_complete() {
            finish_service(&mut tx, &mut service, Some(&note), &mut events).await?
        } else {
            apply_transition(
                &mut tx,
                &mut service,
                ServiceStatus::PartialDelivery,
                Some(&note),
                &mut events,
            )
            .await?;
            None
        };

        tx.commit().await?;
        self.publish(events);

        Ok(DeliveryOutcome {
            service,
            sub_service: Some(sub),
            income,
        })
    }

    /// Everything processed; waiting to go out in one trip
    pub async fn mark_ready_for_delivery(&self, id: Uuid) -> Result<Service> {
        let mut tx = self.begin_write().await?;
        let mut events = Vec::new();

        let mut service = load_for_update(&mut tx, id).await?;
        apply_transition(
            &mut tx,
            &mut service,
            ServiceStatus::ReadyForDelivery,
            None,
            &mut events,
        )
        .await?;
        tx.commit().await?;
        self.publish(events);

        Ok(service)
    }

    /// Deliver every outstanding bag and complete the service
    ///
    /// After earlier partial deliveries the outstanding bags become one more
    /// sub-service so the delivery history stays complete.
    pub async fn complete_delivery(
        &self,
        id: Uuid,
        request: CompleteDeliveryRequest,
    ) -> Result<DeliveryOutcome> {
        let mut tx = self.begin_write().await?;
        let mut events = Vec::new();

        let mut service = load_for_update(&mut tx, id).await?;
        validate_transition(service.status, ServiceStatus::Completed)?;

        let delivered_by = clean_opt(request.delivered_by);
        let notes = clean_opt(request.notes);

        let mut ledger = ledger_for(&service)?;
        let had_partial = ledger.delivered_count() > 0;
        let remaining = ledger.deliver_remaining();

        let sub = if had_partial && !remaining.is_empty() {
            Some(
                record_batch(
                    &mut tx,
                    &mut service,
                    &ledger,
                    remaining,
                    delivered_by,
                    notes.clone(),
                    &mut events,
                )
                .await?,
            )
        } else {
            if delivered_by.is_some() {
                service.delivered_by = delivered_by;
            }
            None
        };

        let income = finish_service(&mut tx, &mut service, notes.as_deref(), &mut events).await?;
        tx.commit().await?;
        self.publish(events);

        Ok(DeliveryOutcome {
            service,
            sub_service: sub,
            income,
        })
    }

    pub async fn delivery_status(&self, id: Uuid) -> Result<DeliveryStatus> {
        let service = db::services::require_service(&self.db, id).await?;
        let ledger = ledger_for(&service)?;
        let sub_services = db::services::list_sub_services(&self.db, id).await?;

        Ok(DeliveryStatus {
            service_id: service.id,
            status: service.status,
            bag_count: service.bag_count,
            delivered_bags: ledger.delivered_bags(),
            remaining_bags: ledger.remaining_bags(),
            delivered_count: ledger.delivered_count(),
            remaining_count: ledger.remaining_count(),
            percentage: ledger.percentage(),
            sub_services,
        })
    }
}
