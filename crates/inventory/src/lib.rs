//! Stock safety for the storefront.
//!
//! Cart-time checks are **advisory only** (no reservation). A short-lived
//! reservation is taken when a checkout session begins, and the authoritative
//! decrement happens exactly once, atomically, at order creation.

pub mod guard;

pub use guard::{InMemoryStockLevels, RESERVATION_TTL, StockLevels};
