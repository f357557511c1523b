use axum::http::StatusCode;
use serde::Deserialize;

use couture_orders::{CustomerInfo, PaymentDetails, PaymentMethod, ShippingAddress};
use couture_pricing::{Fabric, FabricSource, ServiceType};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct AddCartItemRequest {
    pub product_id: String,
    pub quantity: u32,
    pub customizations: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartItemRequest {
    pub item_id: String,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct RemoveCartItemRequest {
    pub item_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ApplyPromoRequest {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct ShippingRequest {
    pub city: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutItemRequest {
    pub product_id: String,
    pub quantity: u32,
    pub customizations: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub method: String,
    pub transaction_id: Option<String>,
    pub receipt_reference: Option<String>,
    pub advance_amount: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<CheckoutItemRequest>,
    pub customer: CustomerInfo,
    pub shipping_address: ShippingAddress,
    pub payment: PaymentRequest,
    pub promo_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EstimateRequest {
    pub service_type: String,
    pub fabric_source: String,
    pub selected_fabric: Option<Fabric>,
    #[serde(default)]
    pub rush_order: bool,
    #[serde(default)]
    pub design_idea: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCustomOrderRequest {
    #[serde(flatten)]
    pub selection: EstimateRequest,
    pub customer: CustomerInfo,
    pub shipping_address: ShippingAddress,
    pub payment: PaymentRequest,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    pub note: Option<String>,
    #[serde(rename = "override")]
    pub override_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub verified: bool,
    pub transaction_id: Option<String>,
    pub amount: Option<u64>,
    pub verification_notes: Option<String>,
}

// -------------------------
// Parsing helpers
// -------------------------

pub fn parse_payment_method(s: &str) -> Result<PaymentMethod, axum::response::Response> {
    match s {
        "bank-transfer" => Ok(PaymentMethod::BankTransfer),
        "jazzcash" => Ok(PaymentMethod::Jazzcash),
        "easypaisa" => Ok(PaymentMethod::Easypaisa),
        "cod" => Ok(PaymentMethod::Cod),
        other => Err(errors::json_error(
            StatusCode::BAD_REQUEST,
            format!(
                "invalid payment method '{other}': must be one of bank-transfer, jazzcash, easypaisa, cod"
            ),
        )),
    }
}

pub fn parse_service_type(s: &str) -> Result<ServiceType, axum::response::Response> {
    match s {
        "standard" => Ok(ServiceType::Standard),
        "premium" => Ok(ServiceType::Premium),
        "bridal" => Ok(ServiceType::Bridal),
        other => Err(errors::json_error(
            StatusCode::BAD_REQUEST,
            format!("invalid service type '{other}': must be one of standard, premium, bridal"),
        )),
    }
}

pub fn parse_fabric_source(s: &str) -> Result<FabricSource, axum::response::Response> {
    match s {
        "platform" => Ok(FabricSource::Platform),
        "customer" => Ok(FabricSource::Customer),
        other => Err(errors::json_error(
            StatusCode::BAD_REQUEST,
            format!("invalid fabric source '{other}': must be platform or customer"),
        )),
    }
}

impl PaymentRequest {
    /// Parse into the domain payment submission.
    pub fn into_details(self) -> Result<PaymentDetails, axum::response::Response> {
        let method = parse_payment_method(&self.method)?;
        Ok(PaymentDetails {
            method,
            transaction_id: self.transaction_id,
            receipt_reference: self.receipt_reference,
            advance_amount: self.advance_amount,
        })
    }
}
