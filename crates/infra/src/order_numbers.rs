use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{Datelike, Utc};

use couture_orders::OrderNumber;

/// Allocates sequential order numbers, one counter per calendar year.
///
/// The counter resets implicitly at the year boundary: `LC-2026-0001` follows
/// `LC-2025-0983`.
#[derive(Debug, Default)]
pub struct OrderNumberAllocator {
    counters: Mutex<HashMap<i32, u32>>,
}

impl OrderNumberAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a year's counter, e.g. when resuming from a rebuilt read
    /// model. `last_seq` is the highest sequence already issued.
    pub fn seed(&self, year: i32, last_seq: u32) {
        if let Ok(mut counters) = self.counters.lock() {
            let entry = counters.entry(year).or_insert(0);
            *entry = (*entry).max(last_seq);
        }
    }

    pub fn next(&self) -> OrderNumber {
        self.next_for_year(Utc::now().year())
    }

    fn next_for_year(&self, year: i32) -> OrderNumber {
        let mut counters = match self.counters.lock() {
            Ok(c) => c,
            Err(poisoned) => poisoned.into_inner(),
        };
        let counter = counters.entry(year).or_insert(0);
        *counter += 1;
        OrderNumber::new(year, *counter)
    }
}
