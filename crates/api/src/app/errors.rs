use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use couture_core::DomainError;
use couture_infra::command_dispatcher::DispatchError;

/// Uniform error body: `{"success": false, "message": ...}`.
pub fn json_error(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "success": false,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let status = match &err {
        DomainError::Validation(_)
        | DomainError::QuantityOutOfRange { .. }
        | DomainError::PaymentNotVerified(_)
        | DomainError::InvalidTransition(_)
        | DomainError::InvalidPromoCode(_)
        | DomainError::MissingPaymentProof(_)
        | DomainError::InvalidPaymentMethod(_)
        | DomainError::InvalidId(_)
        | DomainError::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
        DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::NotFound => StatusCode::NOT_FOUND,
        DomainError::Forbidden => StatusCode::FORBIDDEN,
        DomainError::Unauthorized => StatusCode::UNAUTHORIZED,
    };
    json_error(status, err.to_string())
}

pub fn dispatch_error_to_response(err: DispatchError) -> axum::response::Response {
    match err {
        DispatchError::Concurrency(msg) => json_error(StatusCode::CONFLICT, msg),
        DispatchError::Domain(e) => domain_error_to_response(e),
        DispatchError::Deserialize(msg) => json_error(StatusCode::INTERNAL_SERVER_ERROR, msg),
        DispatchError::Store(e) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, format!("{e:?}"))
        }
        DispatchError::Publish(msg) => json_error(StatusCode::BAD_GATEWAY, msg),
    }
}
