use std::{convert::Infallible, sync::Arc, time::Duration};

use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::Value as JsonValue;
use tokio::sync::broadcast;
use tokio_stream::{StreamExt, wrappers::BroadcastStream};

use couture_cart::{CartEngine, Discount, NullCartSync, PromoCode, SessionCartStore};
use couture_catalog::{InMemoryCatalog, Product, ProductId};
use couture_core::{AggregateId, DomainError};
use couture_events::{EventBus, EventEnvelope, InMemoryEventBus};
use couture_infra::{
    CityShippingRates, InMemoryKeyedStore, InMemoryPromoStore, LogNotifier, NotificationKind,
    OrderNotification, OrderNumberAllocator, OrderNotifier, OrderReadModel, OrdersProjection,
    command_dispatcher::{CommandDispatcher, DispatchError},
    event_store::{InMemoryEventStore, StoredEvent},
    notify_best_effort,
};
use couture_inventory::InMemoryStockLevels;
use couture_orders::{OrderEvent, OrderId, OrderNumber};

type Bus = InMemoryEventBus<EventEnvelope<JsonValue>>;
type Projection = OrdersProjection<InMemoryKeyedStore<OrderId, OrderReadModel>>;

/// Realtime message broadcast to admin dashboards via SSE.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RealtimeMessage {
    pub topic: String,
    pub payload: serde_json::Value,
}

/// Everything the HTTP handlers need, wired once at startup.
pub struct AppServices {
    dispatcher: CommandDispatcher<Arc<InMemoryEventStore>, Arc<Bus>>,
    orders_projection: Arc<Projection>,
    cart: CartEngine,
    catalog: Arc<InMemoryCatalog>,
    stock: Arc<InMemoryStockLevels>,
    promos: Arc<InMemoryPromoStore>,
    shipping: Arc<CityShippingRates>,
    numbers: OrderNumberAllocator,
    realtime_tx: broadcast::Sender<RealtimeMessage>,
}

/// Build the in-memory service graph: event store + bus + dispatcher, the
/// orders projection fed by a background bus subscriber, and the cart engine
/// over seeded demo catalog/stock/promo data.
pub fn build_services() -> AppServices {
    let store = Arc::new(InMemoryEventStore::new());
    let bus: Arc<Bus> = Arc::new(InMemoryEventBus::new());
    let dispatcher = CommandDispatcher::new(store.clone(), bus.clone());

    let orders_projection: Arc<Projection> =
        Arc::new(OrdersProjection::new(InMemoryKeyedStore::new()));

    let catalog = Arc::new(InMemoryCatalog::new());
    let stock = Arc::new(InMemoryStockLevels::new());
    let promos = Arc::new(InMemoryPromoStore::new());
    let shipping = Arc::new(CityShippingRates::standard());
    seed_demo_data(&catalog, &stock, &promos);

    let cart = CartEngine::new(
        Arc::new(SessionCartStore::new()),
        catalog.clone(),
        stock.clone(),
        promos.clone(),
        shipping.clone(),
        Arc::new(NullCartSync),
    );

    // Realtime channel (SSE): lossy broadcast, no backpressure on the core.
    let (realtime_tx, _realtime_rx) = broadcast::channel::<RealtimeMessage>(256);

    let notifier: Arc<dyn OrderNotifier> = Arc::new(LogNotifier);

    // Background subscriber: bus -> projection -> notifications + SSE.
    {
        let sub = bus.subscribe();
        let orders_projection = orders_projection.clone();
        let realtime_tx = realtime_tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match sub.recv() {
                Ok(env) => {
                    if env.aggregate_type() != "orders.order" {
                        continue;
                    }

                    if let Err(e) = orders_projection.apply_envelope(&env) {
                        tracing::warn!("projection apply failed: {e}");
                        continue;
                    }

                    if let Some(order) = orders_projection.get(&OrderId::new(env.aggregate_id())) {
                        notify_for_envelope(notifier.as_ref(), &order, env.payload());
                    }

                    let _ = realtime_tx.send(RealtimeMessage {
                        topic: "orders.projection_updated".to_string(),
                        payload: serde_json::json!({
                            "kind": "projection_update",
                            "order_id": env.aggregate_id().to_string(),
                            "sequence_number": env.sequence_number(),
                        }),
                    });
                }
                Err(_) => break,
            }
        });
    }

    AppServices {
        dispatcher,
        orders_projection,
        cart,
        catalog,
        stock,
        promos,
        shipping,
        numbers: OrderNumberAllocator::new(),
        realtime_tx,
    }
}

/// Map a committed order event to its customer notification, best-effort.
fn notify_for_envelope(
    notifier: &dyn OrderNotifier,
    order: &OrderReadModel,
    payload: &JsonValue,
) {
    let ev: OrderEvent = match serde_json::from_value(payload.clone()) {
        Ok(ev) => ev,
        Err(e) => {
            tracing::warn!("unreadable order event on bus: {e}");
            return;
        }
    };

    let kind = match ev {
        OrderEvent::OrderPlaced(_) => NotificationKind::OrderPlaced,
        OrderEvent::PaymentVerified(_) => NotificationKind::PaymentVerified,
        OrderEvent::PaymentRejected(e) => NotificationKind::PaymentRejected { reason: e.reason },
        OrderEvent::StatusChanged(e) => NotificationKind::StatusChanged { to: e.to },
    };

    notify_best_effort(
        notifier,
        &OrderNotification {
            order_number: order.order_number.clone(),
            recipient: order.customer.email.clone(),
            kind,
        },
    );
}

fn seed_demo_data(
    catalog: &InMemoryCatalog,
    stock: &InMemoryStockLevels,
    promos: &InMemoryPromoStore,
) {
    let seed = [
        ("Embroidered lawn suit", 5_000u64, 25i64),
        ("Chiffon formal suit", 8_500, 12),
        ("Silk bridal lehenga", 45_000, 3),
    ];
    for (title, unit_price, on_hand) in seed {
        let id = ProductId::new(AggregateId::new());
        catalog.insert(Product {
            id,
            title: title.to_string(),
            unit_price,
            image: None,
        });
        stock.set_on_hand(id, on_hand);
    }

    let now = Utc::now();
    promos.insert(PromoCode {
        code: "TEST10".to_string(),
        discount: Discount::Percentage(10),
        valid_from: now - ChronoDuration::days(1),
        valid_until: now + ChronoDuration::days(365),
    });
    promos.insert(PromoCode {
        code: "EID500".to_string(),
        discount: Discount::Fixed(500),
        valid_from: now - ChronoDuration::days(1),
        valid_until: now + ChronoDuration::days(365),
    });
}

impl AppServices {
    pub fn dispatch<A>(
        &self,
        aggregate_id: AggregateId,
        aggregate_type: &str,
        command: A::Command,
        make_aggregate: impl FnOnce(AggregateId) -> A,
    ) -> Result<Vec<StoredEvent>, DispatchError>
    where
        A: couture_core::Aggregate<Error = DomainError>,
        A::Event: couture_events::Event + serde::Serialize + serde::de::DeserializeOwned,
    {
        self.dispatcher
            .dispatch::<A>(aggregate_id, aggregate_type, command, make_aggregate)
    }

    pub fn orders_get(&self, order_id: &OrderId) -> Option<OrderReadModel> {
        self.orders_projection.get(order_id)
    }

    pub fn orders_get_by_number(&self, order_number: &str) -> Option<OrderReadModel> {
        self.orders_projection.get_by_number(order_number)
    }

    pub fn orders_list(&self) -> Vec<OrderReadModel> {
        self.orders_projection.list()
    }

    pub fn cart(&self) -> &CartEngine {
        &self.cart
    }

    pub fn catalog(&self) -> &InMemoryCatalog {
        &self.catalog
    }

    pub fn stock(&self) -> &InMemoryStockLevels {
        &self.stock
    }

    pub fn promos(&self) -> &InMemoryPromoStore {
        &self.promos
    }

    pub fn shipping(&self) -> &CityShippingRates {
        &self.shipping
    }

    pub fn next_order_number(&self) -> OrderNumber {
        self.numbers.next()
    }

    pub fn realtime_tx(&self) -> &broadcast::Sender<RealtimeMessage> {
        &self.realtime_tx
    }
}

/// Build the SSE stream of realtime messages (used by `/api/v1/admin/stream`).
pub fn realtime_sse_stream(
    services: Arc<AppServices>,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = services.realtime_tx().subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(m) => {
            let data = serde_json::to_string(&m.payload).unwrap_or_else(|_| "{}".to_string());
            Some(Ok(SseEvent::default().event(m.topic).data(data)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
