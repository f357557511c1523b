use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};

use couture_catalog::ProductId;
use couture_core::{DomainError, DomainResult, SessionId};

/// How long a checkout-intent reservation holds stock before it lapses.
pub const RESERVATION_TTL: Duration = Duration::from_secs(15 * 60);

/// Stock availability seam.
///
/// Semantics:
/// - `check_availability` is advisory (cart time); it never holds stock.
/// - `reserve` takes a short-lived hold when a checkout session starts;
///   expired holds are released lazily on the next lock acquisition.
/// - `commit` is the single authoritative decrement at order creation:
///   a conditional "decrement if available >= requested" under one write
///   lock, never a read-then-write pair. Under concurrent checkouts for the
///   last unit, exactly one commit succeeds.
pub trait StockLevels: Send + Sync {
    /// Units on hand minus active reservations, at `now`.
    fn available(&self, product: ProductId, now: DateTime<Utc>) -> i64;

    /// Advisory check. Returns current availability or `InsufficientStock`.
    fn check_availability(
        &self,
        product: ProductId,
        qty: i64,
        now: DateTime<Utc>,
    ) -> DomainResult<i64>;

    /// Hold `qty` units for a checkout session until the TTL lapses.
    /// Re-reserving for the same session replaces the previous hold.
    fn reserve(
        &self,
        session: SessionId,
        product: ProductId,
        qty: i64,
        now: DateTime<Utc>,
    ) -> DomainResult<()>;

    /// Drop a session's hold (checkout abandoned). Idempotent.
    fn release(&self, session: SessionId, product: ProductId);

    /// Atomically consume `qty` units at order creation.
    ///
    /// A hold by `session` (if any) is consumed as part of the commit.
    fn commit(
        &self,
        session: Option<SessionId>,
        product: ProductId,
        qty: i64,
        now: DateTime<Utc>,
    ) -> DomainResult<()>;

    /// Return `qty` committed units to the shelf.
    ///
    /// Compensation for a commit whose order never came into being; callers
    /// must only restock quantities they previously committed.
    fn restock(&self, product: ProductId, qty: i64);
}

impl<S> StockLevels for Arc<S>
where
    S: StockLevels + ?Sized,
{
    fn available(&self, product: ProductId, now: DateTime<Utc>) -> i64 {
        (**self).available(product, now)
    }

    fn check_availability(
        &self,
        product: ProductId,
        qty: i64,
        now: DateTime<Utc>,
    ) -> DomainResult<i64> {
        (**self).check_availability(product, qty, now)
    }

    fn reserve(
        &self,
        session: SessionId,
        product: ProductId,
        qty: i64,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        (**self).reserve(session, product, qty, now)
    }

    fn release(&self, session: SessionId, product: ProductId) {
        (**self).release(session, product)
    }

    fn commit(
        &self,
        session: Option<SessionId>,
        product: ProductId,
        qty: i64,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        (**self).commit(session, product, qty, now)
    }

    fn restock(&self, product: ProductId, qty: i64) {
        (**self).restock(product, qty)
    }
}

#[derive(Debug, Clone, Copy)]
struct Reservation {
    qty: i64,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct StockRecord {
    on_hand: i64,
    reservations: HashMap<SessionId, Reservation>,
}

impl StockRecord {
    fn purge_expired(&mut self, now: DateTime<Utc>) {
        self.reservations.retain(|_, r| r.expires_at > now);
    }

    fn reserved_excluding(&self, session: Option<SessionId>) -> i64 {
        self.reservations
            .iter()
            .filter(|(s, _)| Some(**s) != session)
            .map(|(_, r)| r.qty)
            .sum()
    }
}

/// In-memory stock ledger.
///
/// Interior mutability behind a single `RwLock`; the commit path holds the
/// write lock for the whole check-and-decrement, which is what makes it
/// atomic under concurrent checkouts.
#[derive(Debug, Default)]
pub struct InMemoryStockLevels {
    records: RwLock<HashMap<ProductId, StockRecord>>,
}

impl InMemoryStockLevels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or correct the on-hand count for a product.
    pub fn set_on_hand(&self, product: ProductId, on_hand: i64) {
        if let Ok(mut map) = self.records.write() {
            map.entry(product).or_default().on_hand = on_hand;
        }
    }

    pub fn on_hand(&self, product: ProductId) -> i64 {
        self.records
            .read()
            .ok()
            .and_then(|m| m.get(&product).map(|r| r.on_hand))
            .unwrap_or(0)
    }
}

impl StockLevels for InMemoryStockLevels {
    fn available(&self, product: ProductId, now: DateTime<Utc>) -> i64 {
        let mut map = match self.records.write() {
            Ok(m) => m,
            Err(_) => return 0,
        };
        let Some(record) = map.get_mut(&product) else {
            return 0;
        };
        record.purge_expired(now);
        record.on_hand - record.reserved_excluding(None)
    }

    fn check_availability(
        &self,
        product: ProductId,
        qty: i64,
        now: DateTime<Utc>,
    ) -> DomainResult<i64> {
        let available = self.available(product, now);
        if qty > available {
            return Err(DomainError::insufficient_stock(available.max(0)));
        }
        Ok(available)
    }

    fn reserve(
        &self,
        session: SessionId,
        product: ProductId,
        qty: i64,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if qty <= 0 {
            return Err(DomainError::validation("reservation qty must be positive"));
        }

        let mut map = self
            .records
            .write()
            .map_err(|_| DomainError::conflict("stock ledger lock poisoned"))?;
        let record = map.entry(product).or_default();
        record.purge_expired(now);

        let available = record.on_hand - record.reserved_excluding(Some(session));
        if qty > available {
            return Err(DomainError::insufficient_stock(available.max(0)));
        }

        let expires_at = now + chrono::Duration::from_std(RESERVATION_TTL).unwrap_or_default();
        record
            .reservations
            .insert(session, Reservation { qty, expires_at });
        Ok(())
    }

    fn release(&self, session: SessionId, product: ProductId) {
        if let Ok(mut map) = self.records.write() {
            if let Some(record) = map.get_mut(&product) {
                record.reservations.remove(&session);
            }
        }
    }

    fn commit(
        &self,
        session: Option<SessionId>,
        product: ProductId,
        qty: i64,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if qty <= 0 {
            return Err(DomainError::validation("commit qty must be positive"));
        }

        let mut map = self
            .records
            .write()
            .map_err(|_| DomainError::conflict("stock ledger lock poisoned"))?;
        let record = map.entry(product).or_default();
        record.purge_expired(now);

        // The committing session's own hold does not count against it.
        if let Some(s) = session {
            record.reservations.remove(&s);
        }

        let available = record.on_hand - record.reserved_excluding(None);
        if qty > available {
            return Err(DomainError::insufficient_stock(available.max(0)));
        }

        record.on_hand -= qty;
        Ok(())
    }

    fn restock(&self, product: ProductId, qty: i64) {
        if qty <= 0 {
            return;
        }
        if let Ok(mut map) = self.records.write() {
            map.entry(product).or_default().on_hand += qty;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use couture_core::AggregateId;
    use std::sync::Arc;

    fn product() -> ProductId {
        ProductId::new(AggregateId::new())
    }

    #[test]
    fn advisory_check_reports_available() {
        let stock = InMemoryStockLevels::new();
        let p = product();
        stock.set_on_hand(p, 3);

        let now = Utc::now();
        assert_eq!(stock.check_availability(p, 2, now).unwrap(), 3);

        let err = stock.check_availability(p, 5, now).unwrap_err();
        assert_eq!(err, DomainError::InsufficientStock { available: 3 });
    }

    #[test]
    fn unknown_product_has_zero_stock() {
        let stock = InMemoryStockLevels::new();
        let err = stock.check_availability(product(), 1, Utc::now()).unwrap_err();
        assert_eq!(err, DomainError::InsufficientStock { available: 0 });
    }

    #[test]
    fn reservation_holds_stock_until_ttl() {
        let stock = InMemoryStockLevels::new();
        let p = product();
        stock.set_on_hand(p, 2);

        let now = Utc::now();
        let buyer = SessionId::new();
        stock.reserve(buyer, p, 2, now).unwrap();

        // Another session sees nothing left while the hold is active.
        let other = SessionId::new();
        assert_eq!(
            stock.reserve(other, p, 1, now).unwrap_err(),
            DomainError::InsufficientStock { available: 0 }
        );

        // After the TTL lapses, the hold no longer counts.
        let later = now + chrono::Duration::from_std(RESERVATION_TTL).unwrap()
            + chrono::Duration::seconds(1);
        stock.reserve(other, p, 1, later).unwrap();
    }

    #[test]
    fn re_reserving_replaces_previous_hold() {
        let stock = InMemoryStockLevels::new();
        let p = product();
        stock.set_on_hand(p, 3);

        let now = Utc::now();
        let buyer = SessionId::new();
        stock.reserve(buyer, p, 3, now).unwrap();
        // Shrinking the hold frees stock rather than stacking a second hold.
        stock.reserve(buyer, p, 1, now).unwrap();

        assert_eq!(stock.available(p, now), 2);
    }

    #[test]
    fn commit_consumes_own_reservation() {
        let stock = InMemoryStockLevels::new();
        let p = product();
        stock.set_on_hand(p, 1);

        let now = Utc::now();
        let buyer = SessionId::new();
        stock.reserve(buyer, p, 1, now).unwrap();

        stock.commit(Some(buyer), p, 1, now).unwrap();
        assert_eq!(stock.on_hand(p), 0);
        assert_eq!(stock.available(p, now), 0);
    }

    #[test]
    fn commit_without_reservation_is_conditional() {
        let stock = InMemoryStockLevels::new();
        let p = product();
        stock.set_on_hand(p, 1);

        let now = Utc::now();
        stock.commit(None, p, 1, now).unwrap();
        assert_eq!(
            stock.commit(None, p, 1, now).unwrap_err(),
            DomainError::InsufficientStock { available: 0 }
        );
    }

    #[test]
    fn restock_returns_committed_units_to_the_shelf() {
        let stock = InMemoryStockLevels::new();
        let p = product();
        stock.set_on_hand(p, 3);

        let now = Utc::now();
        stock.commit(None, p, 3, now).unwrap();
        assert_eq!(stock.on_hand(p), 0);

        stock.restock(p, 3);
        assert_eq!(stock.on_hand(p), 3);
        stock.commit(None, p, 3, now).unwrap();

        // Non-positive quantities are ignored.
        stock.restock(p, 0);
        stock.restock(p, -2);
        assert_eq!(stock.on_hand(p), 0);
    }

    #[test]
    fn concurrent_commits_for_last_unit_admit_exactly_one() {
        let stock = Arc::new(InMemoryStockLevels::new());
        let p = product();
        stock.set_on_hand(p, 1);

        let now = Utc::now();
        let mut handles = Vec::new();
        for _ in 0..8 {
            let stock = stock.clone();
            handles.push(std::thread::spawn(move || {
                stock.commit(None, p, 1, now).is_ok()
            }));
        }

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap_or(false))
            .filter(|ok| *ok)
            .count();

        assert_eq!(successes, 1);
        assert_eq!(stock.on_hand(p), 0);
    }
}
