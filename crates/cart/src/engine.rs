use std::sync::Arc;

use chrono::{DateTime, Utc};

use couture_catalog::{ProductCatalog, ProductId};
use couture_core::{DomainError, DomainResult, SessionId};
use couture_inventory::StockLevels;
use couture_pricing::Totals;

use crate::cart::{Cart, CartItem, LineItemId, MAX_LINE_QTY, MIN_LINE_QTY};
use crate::promo::{AppliedPromo, PromoCodeResolver};
use crate::store::SessionCartStore;
use crate::sync::CartSync;

/// Shipping rate lookup seam (external collaborator, keyed by city).
pub trait ShippingRates: Send + Sync {
    fn rate_for(&self, city: &str) -> u64;
}

impl<R> ShippingRates for Arc<R>
where
    R: ShippingRates + ?Sized,
{
    fn rate_for(&self, city: &str) -> u64 {
        (**self).rate_for(city)
    }
}

/// Cart operations over the session store.
///
/// Each operation loads the session's cart, applies the mutation, recomputes
/// the canonical totals, stores the result, and fires a best-effort sync.
/// Stock checks here are advisory; the authoritative decrement happens at
/// order creation.
pub struct CartEngine {
    store: Arc<SessionCartStore>,
    catalog: Arc<dyn ProductCatalog>,
    stock: Arc<dyn StockLevels>,
    promos: Arc<dyn PromoCodeResolver>,
    shipping: Arc<dyn ShippingRates>,
    sync: Arc<dyn CartSync>,
}

impl CartEngine {
    pub fn new(
        store: Arc<SessionCartStore>,
        catalog: Arc<dyn ProductCatalog>,
        stock: Arc<dyn StockLevels>,
        promos: Arc<dyn PromoCodeResolver>,
        shipping: Arc<dyn ShippingRates>,
        sync: Arc<dyn CartSync>,
    ) -> Self {
        Self {
            store,
            catalog,
            stock,
            promos,
            shipping,
            sync,
        }
    }

    pub fn get(&self, session_id: SessionId) -> Cart {
        self.store.get(session_id)
    }

    /// Add `qty` of a product, merging into an existing line when the
    /// (product, customizations) key matches.
    pub fn add_item(
        &self,
        session_id: SessionId,
        product_id: ProductId,
        qty: u32,
        customizations: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Cart> {
        check_qty_bounds(qty)?;

        let product = self.catalog.get(product_id).ok_or(DomainError::NotFound)?;

        let mut cart = self.store.get(session_id);

        let desired_for_product = u64::from(cart.quantity_of(product_id)) + u64::from(qty);
        self.stock
            .check_availability(product_id, desired_for_product as i64, now)?;

        let key = (product_id, customizations.as_deref());
        match cart.items.iter_mut().find(|i| i.merge_key() == key) {
            Some(line) => {
                let merged = line.quantity + qty;
                check_qty_bounds(merged)?;
                line.quantity = merged;
            }
            None => cart.items.push(CartItem {
                id: LineItemId::new(),
                product_id,
                title: product.title,
                unit_price: product.unit_price,
                quantity: qty,
                customizations,
            }),
        }

        Ok(self.commit(cart))
    }

    /// Remove a line. Idempotent: removing an absent line is a no-op.
    pub fn remove_item(&self, session_id: SessionId, item_id: LineItemId) -> Cart {
        let mut cart = self.store.get(session_id);
        let before = cart.items.len();
        cart.items.retain(|i| i.id != item_id);

        if cart.items.len() == before {
            return cart;
        }
        self.commit(cart)
    }

    /// Set a line's quantity. Zero removes the line.
    pub fn update_quantity(
        &self,
        session_id: SessionId,
        item_id: LineItemId,
        qty: u32,
        now: DateTime<Utc>,
    ) -> DomainResult<Cart> {
        if qty == 0 {
            return Ok(self.remove_item(session_id, item_id));
        }
        check_qty_bounds(qty)?;

        let mut cart = self.store.get(session_id);
        let product_id = cart.find_line(item_id).ok_or(DomainError::NotFound)?.product_id;

        let others: u64 = cart
            .items
            .iter()
            .filter(|i| i.product_id == product_id && i.id != item_id)
            .map(|i| u64::from(i.quantity))
            .sum();
        self.stock
            .check_availability(product_id, (others + u64::from(qty)) as i64, now)?;

        if let Some(line) = cart.items.iter_mut().find(|i| i.id == item_id) {
            line.quantity = qty;
        }

        Ok(self.commit(cart))
    }

    /// Apply a promo code. Resolution failure leaves the cart unchanged.
    pub fn apply_promo_code(
        &self,
        session_id: SessionId,
        code: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Cart> {
        let promo = self.promos.resolve(code, now)?;

        let mut cart = self.store.get(session_id);
        cart.promo = Some(AppliedPromo {
            code: promo.code,
            discount: promo.discount,
        });

        Ok(self.commit(cart))
    }

    /// Look up the shipping rate for the destination city and recompute.
    pub fn calculate_shipping(&self, session_id: SessionId, city: &str) -> Cart {
        let mut cart = self.store.get(session_id);
        cart.totals.shipping = self.shipping.rate_for(city);
        self.commit(cart)
    }

    /// Reset the cart entirely, including promo and discount.
    pub fn clear(&self, session_id: SessionId) -> Cart {
        self.commit(Cart::empty(session_id))
    }

    /// Recompute totals, fire the best-effort sync, and store the cart.
    ///
    /// A sync failure flags the cart and is logged; the local mutation is
    /// never rolled back and the shopper never sees the error.
    fn commit(&self, mut cart: Cart) -> Cart {
        let subtotal = cart.subtotal();
        let discount = cart
            .promo
            .as_ref()
            .map(|p| p.discount.amount_off(subtotal))
            .unwrap_or(0);
        cart.totals = Totals::compute(subtotal, cart.totals.shipping, discount);

        match self.sync.sync(&cart) {
            Ok(()) => cart.sync_flagged = false,
            Err(e) => {
                tracing::warn!(session_id = %cart.session_id, error = %e, "cart sync failed");
                cart.sync_flagged = true;
            }
        }

        self.store.put(cart.clone());
        cart
    }
}

fn check_qty_bounds(qty: u32) -> DomainResult<()> {
    if !(MIN_LINE_QTY..=MAX_LINE_QTY).contains(&qty) {
        return Err(DomainError::QuantityOutOfRange {
            min: MIN_LINE_QTY,
            max: MAX_LINE_QTY,
        });
    }
    Ok(())
}
