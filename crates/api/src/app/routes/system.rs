use std::sync::Arc;

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::app::services::AppServices;
use crate::authz;
use crate::context::RequestSession;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// GET /whoami - the hydrated principal of the current session
pub async fn whoami(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(mut request): Extension<RequestSession>,
) -> Response {
    if let Err(res) = authz::require_login(&services, &mut request) {
        return res;
    }
    Json(request.session.principal()).into_response()
}
