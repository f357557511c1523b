use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use chrono::Utc;

use couture_cart::ShippingRates;
use couture_core::AggregateId;
use couture_orders::{
    CustomOrderDetails, Order, OrderCommand, OrderId, PlaceOrder, Priority,
};
use couture_pricing::{CustomSelection, Totals, estimate};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// Live price preview for the bespoke-order form. Same pricing function as
/// the submission path, so the preview always equals the stored estimate.
pub async fn estimate_custom_order(
    Json(body): Json<dto::EstimateRequest>,
) -> axum::response::Response {
    let selection = match selection_from_request(&body) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "success": true,
            "estimated_price": estimate(&selection),
        })),
    )
        .into_response()
}

pub async fn create_custom_order(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateCustomOrderRequest>,
) -> axum::response::Response {
    let now = Utc::now();

    let selection = match selection_from_request(&body.selection) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let estimated_price = estimate(&selection);

    let payment = match body.payment.into_details() {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let shipping = services.shipping().rate_for(&body.shipping_address.city);
    let pricing = Totals::compute(estimated_price, shipping, 0);

    let priority = if selection.rush_order {
        Priority::Rush
    } else {
        Priority::Normal
    };

    let order_id = OrderId::new(AggregateId::new());
    let order_number = services.next_order_number();

    let cmd = OrderCommand::PlaceOrder(PlaceOrder {
        order_id,
        order_number: order_number.clone(),
        items: Vec::new(),
        customer: body.customer,
        shipping_address: body.shipping_address,
        payment,
        pricing,
        custom: Some(CustomOrderDetails {
            selection,
            design_idea: body.selection.design_idea,
            estimated_price,
        }),
        priority,
        occurred_at: now,
    });

    if let Err(e) = services.dispatch::<Order>(order_id.0, "orders.order", cmd, |id| {
        Order::empty(OrderId::new(id))
    }) {
        return errors::dispatch_error_to_response(e);
    }

    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "success": true,
            "order_id": order_id.to_string(),
            "order_number": order_number.as_str(),
            "estimated_price": estimated_price,
        })),
    )
        .into_response()
}

fn selection_from_request(
    body: &dto::EstimateRequest,
) -> Result<CustomSelection, axum::response::Response> {
    let service_type = dto::parse_service_type(&body.service_type)?;
    let fabric_source = dto::parse_fabric_source(&body.fabric_source)?;

    Ok(CustomSelection {
        service_type,
        fabric_source,
        selected_fabric: body.selected_fabric.clone(),
        rush_order: body.rush_order,
        design_idea_len: body.design_idea.chars().count(),
    })
}
