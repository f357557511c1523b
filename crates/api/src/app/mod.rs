//! HTTP API application wiring (axum router + service wiring).
//!
//! Layout:
//! - `services.rs`: infrastructure wiring (event store/bus, projection,
//!   dispatcher, cart engine, demo seed data)
//! - `routes/`: HTTP routes + handlers (one file per surface area)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent `{"success": false, "message"}` error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(jwt_secret: String) -> Router {
    let jwt = Arc::new(couture_auth::Hs256JwtValidator::new(jwt_secret.into_bytes()));
    let auth_state = middleware::AuthState { jwt };

    let services = Arc::new(services::build_services());

    // Back-office routes: JWT required, roles checked per command.
    let admin = routes::admin_router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::storefront_router())
        .nest("/api/v1/admin", admin)
        .layer(Extension(services))
        .layer(ServiceBuilder::new())
}
