use axum::{
    Router,
    routing::{get, post, put},
};

pub mod admin;
pub mod cart;
pub mod common;
pub mod custom;
pub mod orders;
pub mod system;

/// Router for the public storefront surface (no auth; carts are scoped by
/// the `x-session-id` header).
pub fn storefront_router() -> Router {
    Router::new()
        .route("/api/products", get(system::list_products))
        .route("/api/orders", post(orders::create_order))
        .route("/api/orders/track/:order_number", get(orders::track_order))
        .route("/api/v1/orders/custom", post(custom::create_custom_order))
        .route("/api/v1/orders/custom/estimate", post(custom::estimate_custom_order))
        .nest("/api/cart", cart::router())
}

/// Router for authenticated back-office endpoints (mounted under
/// `/api/v1/admin` behind the JWT middleware).
pub fn admin_router() -> Router {
    Router::new()
        .route("/orders", get(admin::list_orders))
        .route("/orders/:id", get(admin::get_order))
        .route("/orders/:id/status", put(admin::update_order_status))
        .route("/orders/:id/verify-payment", post(admin::verify_payment))
        .route("/stream", get(system::stream))
}
