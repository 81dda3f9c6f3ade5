use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use clinic_auth::Session;

use crate::app::services::AppServices;
use crate::context::{RequestSession, session_id_from_headers};

/// Load the identity session named by the session cookie into request extensions.
///
/// A missing, malformed or unknown cookie yields an anonymous session; the
/// authorization guard decides what that means for the route.
pub async fn session_middleware(
    State(services): State<Arc<AppServices>>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let request_session = match session_id_from_headers(req.headers()) {
        Some(id) => match services.sessions.load(id) {
            Ok(Some(principal)) => RequestSession::new(Some(id), Session::authenticated(principal)),
            Ok(None) => {
                tracing::debug!(session_id = %id, "unknown session cookie");
                RequestSession::default()
            }
            Err(e) => {
                tracing::error!(session_id = %id, error = %e, "failed to load session");
                return Err(StatusCode::INTERNAL_SERVER_ERROR);
            }
        },
        None => RequestSession::default(),
    };

    req.extensions_mut().insert(request_session);

    Ok(next.run(req).await)
}
