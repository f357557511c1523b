//! Pure pricing arithmetic.
//!
//! Two things live here and nowhere else:
//! - the canonical cart totals formula (`totals`), and
//! - the bespoke-tailoring price estimator (`estimate`).
//!
//! Both the live preview and the authoritative submission path call the same
//! functions; any divergence between a previewed and a stored price is a
//! correctness bug.

pub mod estimate;
pub mod totals;

pub use estimate::{CustomSelection, Fabric, FabricSource, ServiceType, estimate};
pub use totals::{Totals, tax_on};
