use thiserror::Error;

use crate::cart::Cart;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartSyncError {
    #[error("cart sync failed: {0}")]
    Unavailable(String),
}

/// Best-effort server-side cart persistence.
///
/// Fired after every local mutation. Failures are logged and flagged on the
/// cart; they never roll the mutation back and are never surfaced to the
/// shopper. Client and server cart state may diverge until the next full
/// fetch; that divergence is tolerated, not treated as corruption.
pub trait CartSync: Send + Sync {
    fn sync(&self, cart: &Cart) -> Result<(), CartSyncError>;
}

impl<S> CartSync for std::sync::Arc<S>
where
    S: CartSync + ?Sized,
{
    fn sync(&self, cart: &Cart) -> Result<(), CartSyncError> {
        (**self).sync(cart)
    }
}

/// No-op sync for tests/dev.
#[derive(Debug, Default)]
pub struct NullCartSync;

impl CartSync for NullCartSync {
    fn sync(&self, _cart: &Cart) -> Result<(), CartSyncError> {
        Ok(())
    }
}
