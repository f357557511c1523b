use std::sync::Arc;

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, sse::Event as SseEvent},
};

use crate::app::services::{self, AppServices};

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> impl IntoResponse {
    Json(serde_json::json!({
        "success": true,
        "products": services.catalog().list(),
    }))
}

pub async fn stream(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Sse<impl tokio_stream::Stream<Item = Result<SseEvent, std::convert::Infallible>>>
{
    services::realtime_sse_stream(services)
}
