//! Cart engine: session-scoped line items, totals, promo codes, shipping.
//!
//! One source of truth per session (a store with change subscriptions), no
//! implicit globals. Every mutation recomputes the canonical totals from
//! `couture-pricing` and fires a best-effort server sync that never blocks or
//! rolls back the local mutation.

pub mod cart;
pub mod engine;
pub mod promo;
pub mod store;
pub mod sync;

pub use cart::{Cart, CartItem, LineItemId, MAX_LINE_QTY, MIN_LINE_QTY};
pub use engine::{CartEngine, ShippingRates};
pub use promo::{AppliedPromo, Discount, PromoCode, PromoCodeResolver};
pub use store::{CartChanged, SessionCartStore};
pub use sync::{CartSync, CartSyncError, NullCartSync};
