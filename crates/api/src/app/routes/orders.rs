use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::Utc;

use couture_cart::{PromoCodeResolver, ShippingRates};
use couture_catalog::{ProductCatalog, ProductId};
use couture_core::{AggregateId, SessionId};
use couture_inventory::StockLevels;
use couture_orders::{Order, OrderCommand, OrderId, OrderItem, PlaceOrder, Priority};
use couture_pricing::Totals;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// Guest checkout: validate, price, decrement stock, and place the order.
pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    Json(body): Json<dto::CreateOrderRequest>,
) -> axum::response::Response {
    let now = Utc::now();

    // Checkout may carry the shopper's cart session; it is optional here,
    // unlike on the cart routes.
    let session: Option<SessionId> = headers
        .get("x-session-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| raw.parse().ok());

    let items = match resolve_items(&services, &body.items) {
        Ok(items) => items,
        Err(resp) => return resp,
    };

    let payment = match body.payment.into_details() {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let subtotal: u64 = items.iter().map(OrderItem::line_total).sum();
    let discount = match &body.promo_code {
        Some(code) => match services.promos().resolve(code, now) {
            Ok(promo) => promo.discount.amount_off(subtotal),
            Err(e) => return errors::domain_error_to_response(e),
        },
        None => 0,
    };
    let shipping = services.shipping().rate_for(&body.shipping_address.city);
    let pricing = Totals::compute(subtotal, shipping, discount);

    // Authoritative stock decrement. Advisory checks first so a multi-line
    // order fails before any line is consumed.
    let mut wanted: HashMap<ProductId, i64> = HashMap::new();
    for item in &items {
        *wanted.entry(item.product_id).or_insert(0) += i64::from(item.quantity);
    }
    for (&product_id, &qty) in &wanted {
        if let Err(e) = services.stock().check_availability(product_id, qty, now) {
            return errors::domain_error_to_response(e);
        }
    }
    let mut taken: Vec<(ProductId, i64)> = Vec::with_capacity(wanted.len());
    for (&product_id, &qty) in &wanted {
        if let Err(e) = services.stock().commit(session, product_id, qty, now) {
            for &(p, q) in &taken {
                services.stock().restock(p, q);
            }
            return errors::domain_error_to_response(e);
        }
        taken.push((product_id, qty));
    }

    let order_id = OrderId::new(AggregateId::new());
    let order_number = services.next_order_number();

    let cmd = OrderCommand::PlaceOrder(PlaceOrder {
        order_id,
        order_number: order_number.clone(),
        items,
        customer: body.customer,
        shipping_address: body.shipping_address,
        payment,
        pricing,
        custom: None,
        priority: Priority::Normal,
        occurred_at: now,
    });

    let committed = match services.dispatch::<Order>(order_id.0, "orders.order", cmd, |id| {
        Order::empty(OrderId::new(id))
    }) {
        Ok(c) => c,
        Err(e) => {
            // The decrement above must not outlive a failed placement.
            for &(p, q) in &taken {
                services.stock().restock(p, q);
            }
            return errors::dispatch_error_to_response(e);
        }
    };

    // The order now owns the purchase; the session cart has served its purpose.
    if let Some(session) = session {
        services.cart().clear(session);
    }

    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "success": true,
            "order": {
                "order_id": order_id.to_string(),
                "order_number": order_number.as_str(),
                "status": "pending-payment",
                "pricing": pricing,
                "events_committed": committed.len(),
            },
        })),
    )
        .into_response()
}

/// Public order tracking by order number. No auth: the number itself is the
/// capability, and the response exposes only status and timeline.
pub async fn track_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(order_number): Path<String>,
) -> axum::response::Response {
    match services.orders_get_by_number(&order_number) {
        Some(order) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "order_number": order.order_number.as_str(),
                "current_status": order.status.as_str(),
                "timeline": order.history,
            })),
        )
            .into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "order not found"),
    }
}

/// Snapshot catalog data onto order lines so later price changes never touch
/// placed orders.
fn resolve_items(
    services: &AppServices,
    requested: &[dto::CheckoutItemRequest],
) -> Result<Vec<OrderItem>, axum::response::Response> {
    let mut items = Vec::with_capacity(requested.len());

    for line in requested {
        let product_agg: AggregateId = line.product_id.parse().map_err(|_| {
            errors::json_error(StatusCode::BAD_REQUEST, "invalid product id")
        })?;
        let product_id = ProductId::new(product_agg);

        let product = services.catalog().get(product_id).ok_or_else(|| {
            errors::json_error(
                StatusCode::BAD_REQUEST,
                format!("unknown product: {}", line.product_id),
            )
        })?;

        items.push(OrderItem {
            product_id,
            title: product.title,
            unit_price: product.unit_price,
            image: product.image,
            quantity: line.quantity,
            customizations: line.customizations.clone(),
        });
    }

    Ok(items)
}
