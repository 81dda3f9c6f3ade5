use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};
use serde_json::json;

use clinic_auth::AuthzError;

use crate::config::ApiConfig;

/// Map a gate failure to HTTP.
///
/// Denials carry no structured body: the reason is logged, never returned.
pub fn authz_error_to_response(err: AuthzError, config: &ApiConfig) -> Response {
    match err {
        AuthzError::Unauthenticated => Redirect::to(&config.login_path).into_response(),
        AuthzError::Forbidden { .. } => (
            StatusCode::FORBIDDEN,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            config.access_denied_message.clone(),
        )
            .into_response(),
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
