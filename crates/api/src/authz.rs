//! API-side authorization guard.
//!
//! Runs the gate against the request's session and turns its typed result
//! into HTTP. Handlers call this before doing any work.

use axum::response::Response;

use clinic_auth::{Ability, AuthzContext, AuthzError};

use crate::app::{errors, services::AppServices};
use crate::context::RequestSession;

/// Enforce `ability` for the current request.
///
/// Unauthenticated sessions are redirected to the login path, denials become a
/// plain 403. A principal re-hydrated along the way is written back to the store.
pub fn authorize_request(
    services: &AppServices,
    request: &mut RequestSession,
    ability: impl Into<Ability>,
    ctx: &AuthzContext,
) -> Result<(), Response> {
    let result = services.gate.authorize(&mut request.session, ability, ctx);
    persist_if_modified(services, request);
    result.map_err(|e| errors::authz_error_to_response(e, &services.config))
}

/// Non-enforcing check for UI gating. Still requires a logged-in session.
pub fn allows_request(
    services: &AppServices,
    request: &mut RequestSession,
    ability: impl Into<Ability>,
    ctx: &AuthzContext,
) -> Result<bool, Response> {
    if let Err(e) = services.gate.check(&mut request.session) {
        return Err(errors::authz_error_to_response(e, &services.config));
    }
    let allowed = services.gate.allows(&mut request.session, ability, ctx);
    persist_if_modified(services, request);
    Ok(allowed)
}

/// Only authentication, no ability.
pub fn require_login(services: &AppServices, request: &mut RequestSession) -> Result<(), Response> {
    let result = services.gate.check(&mut request.session).map(|_| ());
    persist_if_modified(services, request);
    result.map_err(|e: AuthzError| errors::authz_error_to_response(e, &services.config))
}

fn persist_if_modified(services: &AppServices, request: &RequestSession) {
    if !request.session.is_modified() {
        return;
    }
    let (Some(id), Some(principal)) = (request.id, request.session.principal()) else {
        return;
    };
    // A failed write only costs another registry lookup on the next request.
    if let Err(e) = services.sessions.save(id, principal.clone()) {
        tracing::warn!(session_id = %id, error = %e, "failed to persist hydrated session");
    }
}
