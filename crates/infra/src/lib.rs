//! Infrastructure: event store, command dispatch, projections, and the
//! in-memory adapters behind the domain's storage-shaped traits.

pub mod command_dispatcher;
pub mod event_store;
pub mod notifier;
pub mod order_numbers;
pub mod projections;
pub mod promo_store;
pub mod read_model;
pub mod shipping;

#[cfg(test)]
mod integration_tests;

pub use command_dispatcher::{CommandDispatcher, DispatchError};
pub use event_store::{EventStore, EventStoreError, InMemoryEventStore, StoredEvent, UncommittedEvent};
pub use notifier::{
    LogNotifier, NotificationKind, OrderNotification, OrderNotifier, RecordingNotifier,
    notify_best_effort,
};
pub use order_numbers::OrderNumberAllocator;
pub use projections::orders::{OrderReadModel, OrdersProjection};
pub use promo_store::InMemoryPromoStore;
pub use read_model::{InMemoryKeyedStore, KeyedStore};
pub use shipping::CityShippingRates;
