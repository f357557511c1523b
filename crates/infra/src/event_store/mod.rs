//! Append-only event store boundary.
//!
//! Defines the storage-agnostic interface for appending and loading event
//! streams. The dispatcher publishes after append, so the store itself stays
//! ignorant of the bus.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryEventStore;
pub use r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};
