use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use couture_core::DomainResult;

/// Discount descriptor returned by promo code resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "type", content = "value")]
pub enum Discount {
    /// Percentage off the subtotal (0..=100).
    Percentage(u32),
    /// Fixed amount off, in rupees.
    Fixed(u64),
}

impl Discount {
    /// Rupees off a given subtotal (unclamped; the totals formula clamps).
    pub fn amount_off(self, subtotal: u64) -> u64 {
        match self {
            Discount::Percentage(pct) => subtotal * u64::from(pct.min(100)) / 100,
            Discount::Fixed(amount) => amount,
        }
    }
}

/// A redeemable promo code with its validity window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoCode {
    pub code: String,
    pub discount: Discount,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}

/// A promo applied to a cart. The discount descriptor is kept so amounts can
/// be recomputed as the cart changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedPromo {
    pub code: String,
    pub discount: Discount,
}

/// Promo code lookup seam (external collaborator).
///
/// `resolve` fails with `InvalidPromoCode` for unknown, expired, or not yet
/// valid codes; the engine leaves the cart unchanged on failure.
pub trait PromoCodeResolver: Send + Sync {
    fn resolve(&self, code: &str, now: DateTime<Utc>) -> DomainResult<PromoCode>;
}

impl<R> PromoCodeResolver for std::sync::Arc<R>
where
    R: PromoCodeResolver + ?Sized,
{
    fn resolve(&self, code: &str, now: DateTime<Utc>) -> DomainResult<PromoCode> {
        (**self).resolve(code, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_discount_on_subtotal() {
        assert_eq!(Discount::Percentage(10).amount_off(10_000), 1_000);
        assert_eq!(Discount::Percentage(0).amount_off(10_000), 0);
    }

    #[test]
    fn percentage_above_100_is_capped() {
        assert_eq!(Discount::Percentage(250).amount_off(10_000), 10_000);
    }

    #[test]
    fn fixed_discount_ignores_subtotal() {
        assert_eq!(Discount::Fixed(500).amount_off(10_000), 500);
        assert_eq!(Discount::Fixed(500).amount_off(100), 500);
    }
}
