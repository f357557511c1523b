use std::collections::HashMap;

use couture_cart::ShippingRates;

/// Flat per-city shipping rate table with a fallback for everywhere else.
///
/// City matching is case- and whitespace-insensitive.
#[derive(Debug)]
pub struct CityShippingRates {
    rates: HashMap<String, u64>,
    default_rate: u64,
}

impl CityShippingRates {
    pub fn new(default_rate: u64) -> Self {
        Self {
            rates: HashMap::new(),
            default_rate,
        }
    }

    /// The standard delivery zones: free within Lahore, flat rates elsewhere.
    pub fn standard() -> Self {
        let mut table = Self::new(500);
        table.set_rate("Lahore", 0);
        table.set_rate("Karachi", 300);
        table.set_rate("Islamabad", 250);
        table.set_rate("Rawalpindi", 250);
        table.set_rate("Faisalabad", 200);
        table.set_rate("Multan", 200);
        table
    }

    pub fn set_rate(&mut self, city: &str, rate: u64) {
        self.rates.insert(normalize(city), rate);
    }
}

fn normalize(city: &str) -> String {
    city.trim().to_ascii_lowercase()
}

impl ShippingRates for CityShippingRates {
    fn rate_for(&self, city: &str) -> u64 {
        self.rates
            .get(&normalize(city))
            .copied()
            .unwrap_or(self.default_rate)
    }
}
