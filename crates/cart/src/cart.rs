use core::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use couture_catalog::ProductId;
use couture_core::{DomainError, SessionId};
use couture_pricing::Totals;

use crate::promo::AppliedPromo;

/// Lowest quantity a cart line may carry.
pub const MIN_LINE_QTY: u32 = 1;
/// Highest quantity a cart line may carry.
pub const MAX_LINE_QTY: u32 = 99;

/// Identifier of a single cart line.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineItemId(Uuid);

impl LineItemId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for LineItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for LineItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for LineItemId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid =
            Uuid::from_str(s).map_err(|e| DomainError::invalid_id(format!("LineItemId: {e}")))?;
        Ok(Self(uuid))
    }
}

/// One line in a cart.
///
/// `unit_price` and `title` are snapshots taken from the catalog when the
/// line was added. `customizations` is an opaque serialized key; two adds of
/// the same product merge only when their keys match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: LineItemId,
    pub product_id: ProductId,
    pub title: String,
    pub unit_price: u64,
    pub quantity: u32,
    pub customizations: Option<String>,
}

impl CartItem {
    pub fn line_total(&self) -> u64 {
        self.unit_price * u64::from(self.quantity)
    }

    /// Dedupe key for line merging.
    pub fn merge_key(&self) -> (ProductId, Option<&str>) {
        (self.product_id, self.customizations.as_deref())
    }
}

/// A shopper's cart.
///
/// `totals` is always recomputed from the lines by the engine, never edited
/// in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub session_id: SessionId,
    pub items: Vec<CartItem>,
    pub promo: Option<AppliedPromo>,
    pub totals: Totals,
    /// Set when the last best-effort server sync failed. Never shown to the
    /// shopper; cleared by the next successful sync.
    pub sync_flagged: bool,
}

impl Cart {
    pub fn empty(session_id: SessionId) -> Self {
        Self {
            session_id,
            items: Vec::new(),
            promo: None,
            totals: Totals::default(),
            sync_flagged: false,
        }
    }

    pub fn subtotal(&self) -> u64 {
        self.items.iter().map(CartItem::line_total).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn find_line(&self, id: LineItemId) -> Option<&CartItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Quantity of a product already in the cart (across all lines).
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.items
            .iter()
            .filter(|i| i.product_id == product_id)
            .map(|i| i.quantity)
            .sum()
    }
}
