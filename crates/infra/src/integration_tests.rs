//! End-to-end tests over the dispatcher, event store, bus, and projection.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value as JsonValue;

use couture_catalog::ProductId;
use couture_core::{AggregateId, DomainError, ExpectedVersion};
use couture_events::{EventBus, EventEnvelope, InMemoryEventBus, Subscription};
use couture_inventory::{InMemoryStockLevels, StockLevels};
use couture_orders::{
    CustomerInfo, Order, OrderCommand, OrderId, OrderItem, OrderNumber, OrderStatus,
    PaymentDetails, PaymentMethod, PaymentStatus, PlaceOrder, Priority, ShippingAddress,
    UpdateStatus, VerifyPayment,
};
use couture_pricing::Totals;

use crate::command_dispatcher::{CommandDispatcher, DispatchError};
use crate::event_store::{EventStore, InMemoryEventStore};
use crate::order_numbers::OrderNumberAllocator;
use crate::projections::orders::{OrderReadModel, OrdersProjection};
use crate::read_model::InMemoryKeyedStore;

type Bus = InMemoryEventBus<EventEnvelope<JsonValue>>;
type Dispatcher = CommandDispatcher<Arc<InMemoryEventStore>, Arc<Bus>>;
type Projection = OrdersProjection<InMemoryKeyedStore<OrderId, OrderReadModel>>;

struct Harness {
    store: Arc<InMemoryEventStore>,
    dispatcher: Dispatcher,
    projection: Projection,
    feed: Subscription<EventEnvelope<JsonValue>>,
    numbers: OrderNumberAllocator,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(InMemoryEventStore::new());
        let bus = Arc::new(Bus::new());
        let feed = bus.subscribe();
        Self {
            store: store.clone(),
            dispatcher: CommandDispatcher::new(store, bus),
            projection: OrdersProjection::new(InMemoryKeyedStore::new()),
            feed,
            numbers: OrderNumberAllocator::new(),
        }
    }

    fn drain_into_projection(&self) {
        while let Ok(envelope) = self.feed.try_recv() {
            self.projection.apply_envelope(&envelope).unwrap();
        }
    }

    fn place(&self, order_id: OrderId) -> OrderNumber {
        let number = self.numbers.next();
        self.dispatcher
            .dispatch(
                order_id.0,
                "orders.order",
                OrderCommand::PlaceOrder(PlaceOrder {
                    order_id,
                    order_number: number.clone(),
                    items: vec![OrderItem {
                        product_id: ProductId::new(AggregateId::new()),
                        title: "Chiffon formal suit".to_string(),
                        unit_price: 5_000,
                        image: None,
                        quantity: 2,
                        customizations: None,
                    }],
                    customer: CustomerInfo {
                        name: "Ayesha Khan".to_string(),
                        email: "ayesha@example.com".to_string(),
                        phone: "+92 300 1234567".to_string(),
                    },
                    shipping_address: ShippingAddress {
                        line1: "14-B Gulberg III".to_string(),
                        city: "Lahore".to_string(),
                        province: "Punjab".to_string(),
                        postal_code: None,
                    },
                    payment: PaymentDetails {
                        method: PaymentMethod::BankTransfer,
                        transaction_id: Some("TXN-1".to_string()),
                        receipt_reference: Some("receipts/1.jpg".to_string()),
                        advance_amount: None,
                    },
                    pricing: Totals::compute(10_000, 0, 0),
                    custom: None,
                    priority: Priority::Normal,
                    occurred_at: Utc::now(),
                }),
                |id| Order::empty(OrderId::new(id)),
            )
            .unwrap();
        number
    }

    fn verify(&self, order_id: OrderId) -> Vec<crate::event_store::StoredEvent> {
        self.dispatcher
            .dispatch(
                order_id.0,
                "orders.order",
                OrderCommand::VerifyPayment(VerifyPayment {
                    order_id,
                    verified_by: "admin@lahorecouture.pk".to_string(),
                    amount: None,
                    occurred_at: Utc::now(),
                }),
                |id| Order::empty(OrderId::new(id)),
            )
            .unwrap()
    }

    fn update_status(&self, order_id: OrderId, to: OrderStatus) -> Result<(), DispatchError> {
        self.dispatcher
            .dispatch(
                order_id.0,
                "orders.order",
                OrderCommand::UpdateStatus(UpdateStatus {
                    order_id,
                    to,
                    actor: "admin@lahorecouture.pk".to_string(),
                    note: None,
                    override_reason: None,
                    occurred_at: Utc::now(),
                }),
                |id| Order::empty(OrderId::new(id)),
            )
            .map(|_| ())
    }
}

#[test]
fn placed_order_flows_through_to_the_read_model() {
    let h = Harness::new();
    let order_id = OrderId::new(AggregateId::new());
    let number = h.place(order_id);
    h.drain_into_projection();

    let rm = h.projection.get_by_number(number.as_str()).unwrap();
    assert_eq!(rm.status, OrderStatus::PendingPayment);
    assert_eq!(rm.payment.status, PaymentStatus::Pending);
    assert_eq!(rm.pricing.total, 10_500);
    assert_eq!(rm.history.len(), 1);
}

#[test]
fn verification_and_status_chain_update_the_read_model() {
    let h = Harness::new();
    let order_id = OrderId::new(AggregateId::new());
    h.place(order_id);
    h.verify(order_id);
    h.update_status(order_id, OrderStatus::InProgress).unwrap();
    h.update_status(order_id, OrderStatus::Dispatched).unwrap();
    h.drain_into_projection();

    let rm = h.projection.get(&order_id).unwrap();
    assert_eq!(rm.status, OrderStatus::Dispatched);
    assert_eq!(rm.payment.status, PaymentStatus::Verified);
    assert_eq!(rm.history.len(), 4);
}

#[test]
fn status_update_before_verification_is_refused() {
    let h = Harness::new();
    let order_id = OrderId::new(AggregateId::new());
    h.place(order_id);

    let err = h.update_status(order_id, OrderStatus::InProgress).unwrap_err();
    match err {
        DispatchError::Domain(DomainError::PaymentNotVerified(msg)) => {
            assert!(msg.contains("payment"), "{msg}");
        }
        other => panic!("expected payment gate, got {other:?}"),
    }

    // Nothing was appended.
    assert_eq!(h.store.load_stream(order_id.0).unwrap().len(), 1);
}

#[test]
fn re_verification_appends_and_publishes_nothing() {
    let h = Harness::new();
    let order_id = OrderId::new(AggregateId::new());
    h.place(order_id);

    assert_eq!(h.verify(order_id).len(), 1);
    assert!(h.verify(order_id).is_empty());

    assert_eq!(h.store.load_stream(order_id.0).unwrap().len(), 2);
    h.drain_into_projection();
    assert_eq!(h.projection.get(&order_id).unwrap().history.len(), 2);
}

#[test]
fn stale_writer_gets_a_concurrency_conflict() {
    let h = Harness::new();
    let order_id = OrderId::new(AggregateId::new());
    h.place(order_id);
    h.verify(order_id);

    // A second admin acting on a snapshot from before the verification:
    // their expected version no longer matches the stream.
    let stale = crate::event_store::UncommittedEvent {
        event_id: uuid::Uuid::now_v7(),
        aggregate_id: order_id.0,
        aggregate_type: "orders.order".to_string(),
        event_type: "orders.status_changed".to_string(),
        event_version: 1,
        occurred_at: Utc::now(),
        payload: serde_json::json!({}),
    };
    let err = h
        .store
        .append(vec![stale], ExpectedVersion::Exact(1))
        .unwrap_err();
    assert!(matches!(
        err,
        crate::event_store::EventStoreError::Concurrency(_)
    ));
}

#[test]
fn redelivered_envelopes_do_not_double_apply() {
    let h = Harness::new();
    let order_id = OrderId::new(AggregateId::new());
    h.place(order_id);

    let envelope = h.feed.try_recv().unwrap();
    h.projection.apply_envelope(&envelope).unwrap();
    h.projection.apply_envelope(&envelope).unwrap();

    assert_eq!(h.projection.get(&order_id).unwrap().history.len(), 1);
    assert_eq!(h.projection.list().len(), 1);
}

#[test]
fn rebuild_from_the_store_matches_incremental_application() {
    let h = Harness::new();
    let a = OrderId::new(AggregateId::new());
    let b = OrderId::new(AggregateId::new());
    h.place(a);
    h.place(b);
    h.verify(a);
    h.update_status(a, OrderStatus::InProgress).unwrap();
    h.drain_into_projection();

    let rebuilt: Projection = OrdersProjection::new(InMemoryKeyedStore::new());
    let envelopes = h
        .store
        .load_all()
        .unwrap()
        .iter()
        .map(|e| e.to_envelope())
        .collect::<Vec<_>>();
    rebuilt.rebuild_from_scratch(envelopes).unwrap();

    assert_eq!(rebuilt.get(&a), h.projection.get(&a));
    assert_eq!(rebuilt.get(&b), h.projection.get(&b));
    assert_eq!(rebuilt.list().len(), 2);
}

#[test]
fn last_unit_admits_exactly_one_of_two_competing_checkouts() {
    // The authoritative decrement happens before dispatch; whichever checkout
    // loses the stock commit never reaches the event store.
    let h = Harness::new();
    let stock = Arc::new(InMemoryStockLevels::new());
    let product = ProductId::new(AggregateId::new());
    stock.set_on_hand(product, 1);

    let now = Utc::now();
    let mut placed = 0;
    for _ in 0..2 {
        if stock.commit(None, product, 1, now).is_ok() {
            let order_id = OrderId::new(AggregateId::new());
            h.place(order_id);
            placed += 1;
        }
    }

    assert_eq!(placed, 1);
    assert_eq!(stock.on_hand(product), 0);
    h.drain_into_projection();
    assert_eq!(h.projection.list().len(), 1);
}
