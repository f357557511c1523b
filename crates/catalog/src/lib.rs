//! Product catalog collaborator.
//!
//! The catalog is the source of truth for product title/price/image. Orders
//! snapshot this data at creation time so later catalog edits never
//! retroactively change a placed order.

pub mod product;

pub use product::{InMemoryCatalog, Product, ProductCatalog, ProductId};
