use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use couture_core::AggregateId;

/// Product identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub AggregateId);

impl ProductId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Catalog view of a product.
///
/// `unit_price` is in the smallest currency unit (whole rupees for PKR).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub unit_price: u64,
    pub image: Option<String>,
}

/// Read seam over the product catalog.
pub trait ProductCatalog: Send + Sync {
    fn get(&self, id: ProductId) -> Option<Product>;
}

impl<C> ProductCatalog for Arc<C>
where
    C: ProductCatalog + ?Sized,
{
    fn get(&self, id: ProductId) -> Option<Product> {
        (**self).get(id)
    }
}

/// In-memory catalog for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, product: Product) {
        if let Ok(mut map) = self.products.write() {
            map.insert(product.id, product);
        }
    }

    /// All products, sorted by title for stable listings.
    pub fn list(&self) -> Vec<Product> {
        let mut all: Vec<Product> = self
            .products
            .read()
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default();
        all.sort_by(|a, b| a.title.cmp(&b.title));
        all
    }
}

impl ProductCatalog for InMemoryCatalog {
    fn get(&self, id: ProductId) -> Option<Product> {
        self.products.read().ok()?.get(&id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_get() {
        let catalog = InMemoryCatalog::new();
        let id = ProductId::new(AggregateId::new());
        catalog.insert(Product {
            id,
            title: "Embroidered kurta".to_string(),
            unit_price: 5000,
            image: None,
        });

        let p = catalog.get(id).unwrap();
        assert_eq!(p.title, "Embroidered kurta");
        assert_eq!(p.unit_price, 5000);
    }

    #[test]
    fn unknown_product_is_none() {
        let catalog = InMemoryCatalog::new();
        assert!(catalog.get(ProductId::new(AggregateId::new())).is_none());
    }
}
