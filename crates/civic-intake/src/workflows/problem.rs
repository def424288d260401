//! JSON error bodies shared by the intake and management routers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use tracing::error;

use crate::backend::BackendError;
use crate::workflows::application::validation::{localize_all, FieldError};
use crate::workflows::application::WizardStep;
use crate::workflows::lookups::Locale;

/// Where the browser goes when the session provider has to issue a new token.
pub const SIGN_IN_PATH: &str = "/auth/signin";

fn origin(status: StatusCode) -> &'static str {
    if status.is_client_error() {
        "client"
    } else {
        "server"
    }
}

pub(crate) fn problem(status: StatusCode, message: impl Into<String>) -> Response {
    let body = json!({
        "status": status.as_u16(),
        "origin": origin(status),
        "error": message.into(),
    });
    (status, Json(body)).into_response()
}

pub(crate) fn unauthorized() -> Response {
    let body = json!({
        "status": StatusCode::UNAUTHORIZED.as_u16(),
        "origin": "client",
        "error": "authentication required",
        "signIn": SIGN_IN_PATH,
    });
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

/// Map a backend failure onto the status the caller should render.
pub(crate) fn backend_failure(err: &BackendError) -> Response {
    if err.is_unauthorized() {
        return unauthorized();
    }

    match err {
        BackendError::Http { status, body, .. } => {
            let status = StatusCode::from_u16(*status)
                .ok()
                .filter(|status| status.is_client_error() || status.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY);
            if status.is_server_error() {
                error!(status = status.as_u16(), "backend server error");
            }
            let payload = json!({
                "status": status.as_u16(),
                "origin": origin(status),
                "error": err.to_string(),
                "details": body.clone().unwrap_or(Value::Null),
            });
            (status, Json(payload)).into_response()
        }
        BackendError::Transport(_) | BackendError::Decode(_) => {
            error!(error = %err, "backend call failed");
            problem(StatusCode::BAD_GATEWAY, err.to_string())
        }
    }
}

pub(crate) fn validation_failed(
    step: Option<WizardStep>,
    errors: &[FieldError],
    locale: Locale,
) -> Response {
    let mut body = json!({
        "status": StatusCode::UNPROCESSABLE_ENTITY.as_u16(),
        "origin": "client",
        "error": "validation failed",
        "errors": localize_all(errors, locale),
    });
    if let Some(step) = step {
        body["step"] = json!(step);
    }
    (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
}
