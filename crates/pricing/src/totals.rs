use serde::{Deserialize, Serialize};

/// Sales tax rate: 5%, rounded half-up to the nearest rupee.
pub const TAX_RATE_PERCENT: u64 = 5;

/// Monetary breakdown of a cart or order.
///
/// All amounts are in the smallest currency unit (whole rupees).
/// Invariant: `total = max(0, subtotal + tax - discount) + shipping`.
/// The discount is applied before shipping; shipping is never discounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: u64,
    pub tax: u64,
    pub shipping: u64,
    pub discount: u64,
    pub total: u64,
}

impl Totals {
    /// Compute the canonical breakdown from its inputs.
    pub fn compute(subtotal: u64, shipping: u64, discount: u64) -> Self {
        let tax = tax_on(subtotal);
        let total = (subtotal + tax).saturating_sub(discount) + shipping;
        Self {
            subtotal,
            tax,
            shipping,
            discount,
            total,
        }
    }
}

/// 5% tax on a subtotal, rounded half-up.
pub fn tax_on(subtotal: u64) -> u64 {
    (subtotal * TAX_RATE_PERCENT + 50) / 100
}
