//! Supporting order value types: customer info, line snapshots, history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use couture_catalog::ProductId;
use couture_pricing::CustomSelection;

use crate::status::OrderStatus;

/// Customer contact details captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Delivery address. Postal code is optional, many addresses here lack one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub line1: String,
    pub city: String,
    pub province: String,
    pub postal_code: Option<String>,
}

/// Immutable snapshot of a purchased line.
///
/// Title and unit price are copied from the catalog at placement time so later
/// catalog edits never change what an existing order shows or charges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub title: String,
    pub unit_price: u64,
    pub image: Option<String>,
    pub quantity: u32,
    pub customizations: Option<String>,
}

impl OrderItem {
    pub fn line_total(&self) -> u64 {
        self.unit_price * u64::from(self.quantity)
    }
}

/// One entry in the order's append-only status audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHistoryItem {
    pub status: OrderStatus,
    pub at: DateTime<Utc>,
    /// Who caused the entry: "customer", "system", or an admin identifier.
    pub actor: String,
    pub note: Option<String>,
}

/// Production priority. Rush orders jump the tailoring queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    Normal,
    Rush,
}

/// Details attached to a custom tailoring order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomOrderDetails {
    pub selection: CustomSelection,
    pub design_idea: String,
    /// Quote shown to the customer before placement, in rupees.
    pub estimated_price: u64,
}
