use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use couture_cart::{PromoCode, PromoCodeResolver};
use couture_core::{DomainError, DomainResult};

/// Promo code registry backing [`PromoCodeResolver`].
///
/// Lookups are case-insensitive on the code; the stored casing is what shows
/// up on the cart.
#[derive(Debug, Default)]
pub struct InMemoryPromoStore {
    codes: RwLock<HashMap<String, PromoCode>>,
}

impl InMemoryPromoStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, promo: PromoCode) {
        if let Ok(mut codes) = self.codes.write() {
            codes.insert(promo.code.to_ascii_uppercase(), promo);
        }
    }
}

impl PromoCodeResolver for InMemoryPromoStore {
    fn resolve(&self, code: &str, now: DateTime<Utc>) -> DomainResult<PromoCode> {
        let codes = self
            .codes
            .read()
            .map_err(|_| DomainError::invalid_promo_code(code))?;

        let promo = codes
            .get(&code.to_ascii_uppercase())
            .ok_or_else(|| DomainError::invalid_promo_code(code))?;

        if now < promo.valid_from {
            return Err(DomainError::invalid_promo_code(format!(
                "{code} is not yet valid"
            )));
        }
        if now > promo.valid_until {
            return Err(DomainError::invalid_promo_code(format!("{code} has expired")));
        }

        Ok(promo.clone())
    }
}
