use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use couture_auth::Permission;
use couture_core::AggregateId;
use couture_orders::{
    Order, OrderCommand, OrderId, OrderStatus, RejectPayment, UpdateStatus, VerifyPayment,
};

use crate::app::routes::common::CmdAuth;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
) -> impl IntoResponse {
    Json(serde_json::json!({
        "success": true,
        "orders": services.orders_list(),
    }))
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let agg: AggregateId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid order id"),
    };

    match services.orders_get(&OrderId::new(agg)) {
        Some(order) => (
            StatusCode::OK,
            Json(serde_json::json!({"success": true, "order": order})),
        )
            .into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "order not found"),
    }
}

pub async fn update_order_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateStatusRequest>,
) -> axum::response::Response {
    let agg: AggregateId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid order id"),
    };
    let order_id = OrderId::new(agg);

    let to: OrderStatus = match body.status.parse() {
        Ok(s) => s,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let cmd = OrderCommand::UpdateStatus(UpdateStatus {
        order_id,
        to,
        actor: principal.principal_id().to_string(),
        note: body.note,
        override_reason: body.override_reason,
        occurred_at: Utc::now(),
    });

    let cmd_auth = CmdAuth {
        inner: cmd,
        required: vec![Permission::new("orders.update_status")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, e.to_string());
    }

    let committed = match services.dispatch::<Order>(agg, "orders.order", cmd_auth.inner, |id| {
        Order::empty(OrderId::new(id))
    }) {
        Ok(c) => c,
        Err(e) => return errors::dispatch_error_to_response(e),
    };

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "success": true,
            "order_id": agg.to_string(),
            "status": to.as_str(),
            "events_committed": committed.len(),
        })),
    )
        .into_response()
}

/// Approve or reject a submitted payment. Approval is idempotent: verifying
/// an already-verified payment commits nothing and still succeeds.
pub async fn verify_payment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::VerifyPaymentRequest>,
) -> axum::response::Response {
    let agg: AggregateId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid order id"),
    };
    let order_id = OrderId::new(agg);
    let actor = principal.principal_id().to_string();

    let cmd = if body.verified {
        OrderCommand::VerifyPayment(VerifyPayment {
            order_id,
            verified_by: actor,
            amount: body.amount,
            occurred_at: Utc::now(),
        })
    } else {
        OrderCommand::RejectPayment(RejectPayment {
            order_id,
            rejected_by: actor,
            reason: body
                .verification_notes
                .clone()
                .unwrap_or_else(|| "payment verification failed".to_string()),
            occurred_at: Utc::now(),
        })
    };

    let cmd_auth = CmdAuth {
        inner: cmd,
        required: vec![Permission::new("orders.verify_payment")],
    };
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd_auth) {
        return errors::json_error(StatusCode::FORBIDDEN, e.to_string());
    }

    let committed = match services.dispatch::<Order>(agg, "orders.order", cmd_auth.inner, |id| {
        Order::empty(OrderId::new(id))
    }) {
        Ok(c) => c,
        Err(e) => return errors::dispatch_error_to_response(e),
    };

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "success": true,
            "order_id": agg.to_string(),
            "events_committed": committed.len(),
        })),
    )
        .into_response()
}
