use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use chrono::Utc;

use couture_cart::{Cart, LineItemId};
use couture_catalog::ProductId;
use couture_core::AggregateId;

use crate::app::routes::common::session_from_headers;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(get_cart).delete(clear_cart))
        .route("/add", post(add_item))
        .route("/update", put(update_quantity))
        .route("/remove", delete(remove_item))
        .route("/promo", post(apply_promo))
        .route("/shipping", post(calculate_shipping))
}

fn cart_response(cart: Cart) -> axum::response::Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({"success": true, "cart": cart})),
    )
        .into_response()
}

pub async fn get_cart(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
) -> axum::response::Response {
    let session = match session_from_headers(&headers) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    cart_response(services.cart().get(session))
}

pub async fn add_item(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    Json(body): Json<dto::AddCartItemRequest>,
) -> axum::response::Response {
    let session = match session_from_headers(&headers) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let product_agg: AggregateId = match body.product_id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid product id"),
    };

    match services.cart().add_item(
        session,
        ProductId::new(product_agg),
        body.quantity,
        body.customizations,
        Utc::now(),
    ) {
        Ok(cart) => cart_response(cart),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_quantity(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    Json(body): Json<dto::UpdateCartItemRequest>,
) -> axum::response::Response {
    let session = match session_from_headers(&headers) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let item_id: LineItemId = match body.item_id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid cart item id"),
    };

    match services
        .cart()
        .update_quantity(session, item_id, body.quantity, Utc::now())
    {
        Ok(cart) => cart_response(cart),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn remove_item(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    Json(body): Json<dto::RemoveCartItemRequest>,
) -> axum::response::Response {
    let session = match session_from_headers(&headers) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let item_id: LineItemId = match body.item_id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid cart item id"),
    };

    cart_response(services.cart().remove_item(session, item_id))
}

pub async fn apply_promo(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    Json(body): Json<dto::ApplyPromoRequest>,
) -> axum::response::Response {
    let session = match session_from_headers(&headers) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match services
        .cart()
        .apply_promo_code(session, &body.code, Utc::now())
    {
        Ok(cart) => cart_response(cart),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn calculate_shipping(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    Json(body): Json<dto::ShippingRequest>,
) -> axum::response::Response {
    let session = match session_from_headers(&headers) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    cart_response(services.cart().calculate_shipping(session, &body.city))
}

pub async fn clear_cart(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
) -> axum::response::Response {
    let session = match session_from_headers(&headers) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    cart_response(services.cart().clear(session))
}
