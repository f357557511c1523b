use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use couture_core::AggregateId;
use couture_events::EventEnvelope;
use couture_orders::{
    CustomOrderDetails, CustomerInfo, OrderEvent, OrderId, OrderItem, OrderNumber, OrderStatus,
    PaymentInfo, PaymentStatus, Priority, ShippingAddress, StatusHistoryItem,
};
use couture_pricing::Totals;

use crate::read_model::KeyedStore;

/// Query-side view of an order, kept current by [`OrdersProjection`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReadModel {
    pub order_id: OrderId,
    pub order_number: OrderNumber,
    pub customer: CustomerInfo,
    pub shipping_address: ShippingAddress,
    pub items: Vec<OrderItem>,
    pub payment: PaymentInfo,
    pub pricing: Totals,
    pub status: OrderStatus,
    pub history: Vec<StatusHistoryItem>,
    pub custom: Option<CustomOrderDetails>,
    pub priority: Priority,
    pub placed_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum OrderProjectionError {
    #[error("failed to deserialize order event: {0}")]
    Deserialize(String),
    #[error("event order_id does not match envelope aggregate_id")]
    StreamMismatch,
    #[error("non-monotonic sequence number (last={last}, found={found})")]
    NonMonotonicSequence { last: u64, found: u64 },
    #[error("event for unknown order arrived before its placement event")]
    MissingOrder,
}

/// Projects order events into [`OrderReadModel`]s, with a secondary index
/// from order number to order id for the public tracking endpoint.
#[derive(Debug)]
pub struct OrdersProjection<S>
where
    S: KeyedStore<OrderId, OrderReadModel>,
{
    store: S,
    numbers: RwLock<HashMap<String, OrderId>>,
    cursors: RwLock<HashMap<AggregateId, u64>>,
}

impl<S> OrdersProjection<S>
where
    S: KeyedStore<OrderId, OrderReadModel>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            numbers: RwLock::new(HashMap::new()),
            cursors: RwLock::new(HashMap::new()),
        }
    }

    fn get_cursor(&self, aggregate_id: AggregateId) -> u64 {
        match self.cursors.read() {
            Ok(cursors) => *cursors.get(&aggregate_id).unwrap_or(&0),
            Err(_) => 0,
        }
    }

    fn update_cursor(&self, aggregate_id: AggregateId, seq: u64) {
        if let Ok(mut cursors) = self.cursors.write() {
            cursors.insert(aggregate_id, seq);
        }
    }

    pub fn get(&self, order_id: &OrderId) -> Option<OrderReadModel> {
        self.store.get(order_id)
    }

    /// Lookup for the public tracking endpoint. The raw string never matching
    /// an existing order (malformed numbers included) is simply `None`.
    pub fn get_by_number(&self, order_number: &str) -> Option<OrderReadModel> {
        let id = *self.numbers.read().ok()?.get(order_number)?;
        self.store.get(&id)
    }

    /// All orders, most recently placed first.
    pub fn list(&self) -> Vec<OrderReadModel> {
        let mut all = self.store.list();
        all.sort_by(|a, b| b.placed_at.cmp(&a.placed_at));
        all
    }

    pub fn apply_envelope(
        &self,
        envelope: &EventEnvelope<JsonValue>,
    ) -> Result<(), OrderProjectionError> {
        if envelope.aggregate_type() != "orders.order" {
            return Ok(());
        }

        let aggregate_id = envelope.aggregate_id();
        let seq = envelope.sequence_number();

        let last = self.get_cursor(aggregate_id);
        if seq == 0 {
            return Err(OrderProjectionError::NonMonotonicSequence { last, found: seq });
        }
        // Already applied: redelivery from the at-least-once bus.
        if seq <= last {
            return Ok(());
        }
        if seq != last + 1 && last != 0 {
            return Err(OrderProjectionError::NonMonotonicSequence { last, found: seq });
        }

        let ev: OrderEvent = serde_json::from_value(envelope.payload().clone())
            .map_err(|e| OrderProjectionError::Deserialize(e.to_string()))?;

        let order_id = match &ev {
            OrderEvent::OrderPlaced(e) => e.order_id,
            OrderEvent::PaymentVerified(e) => e.order_id,
            OrderEvent::PaymentRejected(e) => e.order_id,
            OrderEvent::StatusChanged(e) => e.order_id,
        };
        if order_id.0 != aggregate_id {
            return Err(OrderProjectionError::StreamMismatch);
        }

        match ev {
            OrderEvent::OrderPlaced(e) => {
                let rm = OrderReadModel {
                    order_id: e.order_id,
                    order_number: e.order_number.clone(),
                    customer: e.customer,
                    shipping_address: e.shipping_address,
                    items: e.items,
                    payment: PaymentInfo::pending(e.payment),
                    pricing: e.pricing,
                    status: OrderStatus::PendingPayment,
                    history: vec![StatusHistoryItem {
                        status: OrderStatus::PendingPayment,
                        at: e.occurred_at,
                        actor: "customer".to_string(),
                        note: None,
                    }],
                    custom: e.custom,
                    priority: e.priority,
                    placed_at: e.occurred_at,
                };
                if let Ok(mut numbers) = self.numbers.write() {
                    numbers.insert(e.order_number.as_str().to_string(), e.order_id);
                }
                self.store.upsert(e.order_id, rm);
            }
            OrderEvent::PaymentVerified(e) => {
                let mut rm = self
                    .store
                    .get(&e.order_id)
                    .ok_or(OrderProjectionError::MissingOrder)?;
                rm.payment.status = PaymentStatus::Verified;
                rm.payment.verified_by = Some(e.verified_by.clone());
                rm.payment.verified_at = Some(e.occurred_at);
                rm.status = OrderStatus::PaymentVerified;
                rm.history.push(StatusHistoryItem {
                    status: OrderStatus::PaymentVerified,
                    at: e.occurred_at,
                    actor: e.verified_by,
                    note: e.amount_mismatch.map(|m| {
                        format!(
                            "receipt amount {} differs from order total {}",
                            m.submitted, m.expected
                        )
                    }),
                });
                self.store.upsert(e.order_id, rm);
            }
            OrderEvent::PaymentRejected(e) => {
                let mut rm = self
                    .store
                    .get(&e.order_id)
                    .ok_or(OrderProjectionError::MissingOrder)?;
                rm.payment.status = PaymentStatus::Failed;
                rm.history.push(StatusHistoryItem {
                    status: OrderStatus::PendingPayment,
                    at: e.occurred_at,
                    actor: e.rejected_by,
                    note: Some(format!("payment rejected: {}", e.reason)),
                });
                self.store.upsert(e.order_id, rm);
            }
            OrderEvent::StatusChanged(e) => {
                let mut rm = self
                    .store
                    .get(&e.order_id)
                    .ok_or(OrderProjectionError::MissingOrder)?;
                rm.status = e.to;
                if e.to == OrderStatus::Refunded {
                    rm.payment.status = PaymentStatus::Refunded;
                }
                rm.history.push(StatusHistoryItem {
                    status: e.to,
                    at: e.occurred_at,
                    actor: e.actor,
                    note: match (e.note, &e.override_reason) {
                        (Some(note), Some(reason)) => Some(format!("{note} (override: {reason})")),
                        (None, Some(reason)) => Some(format!("override: {reason}")),
                        (note, None) => note,
                    },
                });
                self.store.upsert(e.order_id, rm);
            }
        }

        self.update_cursor(aggregate_id, seq);
        Ok(())
    }

    /// Wipe and replay, for deterministic rebuilds from the event store.
    pub fn rebuild_from_scratch(
        &self,
        envelopes: impl IntoIterator<Item = EventEnvelope<JsonValue>>,
    ) -> Result<(), OrderProjectionError> {
        self.store.clear();
        if let Ok(mut numbers) = self.numbers.write() {
            numbers.clear();
        }
        if let Ok(mut cursors) = self.cursors.write() {
            cursors.clear();
        }

        let mut envs: Vec<_> = envelopes.into_iter().collect();
        envs.sort_by_key(|e| (*e.aggregate_id().as_uuid(), e.sequence_number()));

        for env in &envs {
            self.apply_envelope(env)?;
        }
        Ok(())
    }
}
