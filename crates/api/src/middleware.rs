use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use couture_auth::JwtValidator;

use crate::app::errors::json_error;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
}

/// Bearer-token gate for the admin surface. Rejections carry the same
/// `{"success": false, "message": ...}` body as every other error response.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let token = match extract_bearer(req.headers()) {
        Ok(token) => token,
        Err(message) => return json_error(StatusCode::UNAUTHORIZED, message),
    };

    let claims = match state.jwt.validate(token, Utc::now()) {
        Ok(claims) => claims,
        Err(e) => return json_error(StatusCode::UNAUTHORIZED, e.to_string()),
    };

    req.extensions_mut()
        .insert(PrincipalContext::new(claims.sub, claims.roles.clone()));

    next.run(req).await
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, &'static str> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or("missing authorization header")?;

    let header = header
        .to_str()
        .map_err(|_| "malformed authorization header")?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or("authorization header must use the Bearer scheme")?;

    let token = header.trim();
    if token.is_empty() {
        return Err("empty bearer token");
    }

    Ok(token)
}
