use serde::{Deserialize, Serialize};

/// Tailoring service tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceType {
    Standard,
    Premium,
    Bridal,
}

impl ServiceType {
    /// Fixed base stitching charge for the tier, in rupees.
    pub fn base_charge(self) -> u64 {
        match self {
            ServiceType::Standard => 2_500,
            ServiceType::Premium => 4_500,
            ServiceType::Bridal => 12_000,
        }
    }
}

/// Who supplies the fabric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FabricSource {
    /// Fabric from the platform's own range; its price is part of the estimate.
    Platform,
    /// Customer ships or drops off their own fabric; no fabric charge.
    Customer,
}

/// A fabric from the platform range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fabric {
    pub name: String,
    /// Price per outfit, in rupees.
    pub price: u64,
}

/// The customer's bespoke-order selection, as priced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomSelection {
    pub service_type: ServiceType,
    pub fabric_source: FabricSource,
    pub selected_fabric: Option<Fabric>,
    pub rush_order: bool,
    /// Length of the free-text design brief, in characters.
    pub design_idea_len: usize,
}

/// Surcharge for rush turnaround, in rupees.
pub const RUSH_FEE: u64 = 1_500;

/// Design briefs longer than this signal non-trivial custom work.
pub const COMPLEXITY_THRESHOLD: usize = 280;

/// Flat surcharge for complex design briefs, in rupees.
pub const COMPLEXITY_SURCHARGE: u64 = 1_000;

/// Estimate the price of a bespoke tailoring request.
///
/// Pure and deterministic: base stitching charge, plus the fabric price when
/// the platform supplies the fabric, plus the rush fee and the complexity
/// surcharge when they apply. The live preview and the order submission path
/// must both call this function; the stored `estimated_price` on a custom
/// order equals what the customer previewed.
pub fn estimate(selection: &CustomSelection) -> u64 {
    let mut price = selection.service_type.base_charge();

    if selection.fabric_source == FabricSource::Platform {
        if let Some(fabric) = &selection.selected_fabric {
            price += fabric.price;
        }
    }

    if selection.rush_order {
        price += RUSH_FEE;
    }

    if selection.design_idea_len > COMPLEXITY_THRESHOLD {
        price += COMPLEXITY_SURCHARGE;
    }

    price
}
