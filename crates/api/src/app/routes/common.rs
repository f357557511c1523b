use axum::http::{HeaderMap, StatusCode};

use couture_auth::{CommandAuthorization, Permission};
use couture_core::SessionId;

use crate::app::errors;

/// Small helper wrapper to associate required permissions with a command.
pub struct CmdAuth<C> {
    pub inner: C,
    pub required: Vec<Permission>,
}

impl<C> CommandAuthorization for CmdAuth<C> {
    fn required_permissions(&self) -> &[Permission] {
        &self.required
    }
}

/// Resolve the shopper's session from the `x-session-id` header.
///
/// The client generates the UUID once and sends it on every cart request;
/// a missing or malformed header is a 400, never a silent fresh session.
pub fn session_from_headers(headers: &HeaderMap) -> Result<SessionId, axum::response::Response> {
    let raw = headers
        .get("x-session-id")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            errors::json_error(StatusCode::BAD_REQUEST, "x-session-id header is required")
        })?;

    raw.parse::<SessionId>().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "x-session-id must be a UUID")
    })
}
