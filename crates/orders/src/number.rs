use core::str::FromStr;

use serde::{Deserialize, Serialize};

use couture_core::DomainError;

/// Human-readable unique order identifier, format `LC-YYYY-NNNN`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Format an order number from a year and a per-year sequence.
    pub fn new(year: i32, seq: u32) -> Self {
        Self(format!("LC-{year:04}-{seq:04}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for OrderNumber {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('-');
        let prefix = parts.next();
        let year = parts.next();
        let seq = parts.next();

        let valid = matches!(
            (prefix, year, seq, parts.next()),
            (Some("LC"), Some(y), Some(n), None)
                if y.len() == 4
                    && y.chars().all(|c| c.is_ascii_digit())
                    && !n.is_empty()
                    && n.chars().all(|c| c.is_ascii_digit())
        );

        if !valid {
            return Err(DomainError::validation(format!(
                "order number must look like LC-YYYY-NNNN, got '{s}'"
            )));
        }

        Ok(Self(s.to_string()))
    }
}
