//! RBAC audit endpoints for authorization debugging.
//!
//! These answer "why was this request denied?" without reproducing the
//! request: they list the compiled-in table and replay a decision.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;

use clinic_auth::{AuthzContext, Principal, RbacRegistry, Role, Session};
use clinic_core::UserId;

use crate::app::routes::ability_and_context;
use crate::app::{errors, services::AppServices};
use crate::authz;
use crate::context::RequestSession;

pub const RBAC_READ: &str = "rbac.read";

const AS_USER: &str = "as_user";
const AS_ROLE: &str = "as_role";

pub fn router() -> Router {
    Router::new()
        .route("/roles", get(list_roles))
        .route("/roles/:name", get(get_role))
        .route("/permissions", get(list_permissions))
        .route("/explain", get(explain))
}

fn guard(services: &AppServices, request: &mut RequestSession) -> Result<(), Response> {
    authz::authorize_request(services, request, RBAC_READ, &AuthzContext::new())
}

/// GET /rbac/roles - all roles and their permissions
pub async fn list_roles(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(mut request): Extension<RequestSession>,
) -> Response {
    if let Err(res) = guard(&services, &mut request) {
        return res;
    }

    let registry = RbacRegistry::from_table(services.gate.table());
    let roles: Vec<_> = registry.roles.into_values().collect();

    (StatusCode::OK, Json(serde_json::json!({ "roles": roles }))).into_response()
}

/// GET /rbac/roles/:name
pub async fn get_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(mut request): Extension<RequestSession>,
    Path(name): Path<String>,
) -> Response {
    if let Err(res) = guard(&services, &mut request) {
        return res;
    }

    let mut registry = RbacRegistry::from_table(services.gate.table());
    match registry.roles.remove(&name) {
        Some(role) => (StatusCode::OK, Json(role)).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "role_not_found", format!("unknown role '{name}'")),
    }
}

/// GET /rbac/permissions
pub async fn list_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(mut request): Extension<RequestSession>,
) -> Response {
    if let Err(res) = guard(&services, &mut request) {
        return res;
    }

    let registry = RbacRegistry::from_table(services.gate.table());
    let permissions: Vec<_> = registry.permissions.into_values().collect();

    (StatusCode::OK, Json(serde_json::json!({ "permissions": permissions }))).into_response()
}

/// GET /rbac/explain?ability=…[&as_user=…][&as_role=…]&<context>
///
/// Without `as_*` the caller's own session is explained. With `as_role`, a
/// principal holding that role is evaluated instead, ownership lookups
/// included; `as_user` picks its user id and defaults to the caller's.
pub async fn explain(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(mut request): Extension<RequestSession>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(res) = guard(&services, &mut request) {
        return res;
    }

    let as_user = params.get(AS_USER).cloned();
    let as_role = params.get(AS_ROLE).cloned();
    let (ability, ctx) = match ability_and_context(params, &[AS_USER, AS_ROLE]) {
        Ok(parts) => parts,
        Err(res) => return res,
    };

    if as_user.is_none() && as_role.is_none() {
        let explanation = services.gate.explain(&mut request.session, ability, &ctx);
        return (StatusCode::OK, Json(explanation)).into_response();
    }

    let mut subject = match impersonated_session(&services, &request, as_user.as_deref(), as_role) {
        Ok(session) => session,
        Err(res) => return res,
    };
    let explanation = services.gate.explain(&mut subject, ability, &ctx);
    (StatusCode::OK, Json(explanation)).into_response()
}

fn impersonated_session(
    services: &AppServices,
    request: &RequestSession,
    as_user: Option<&str>,
    as_role: Option<String>,
) -> Result<Session, Response> {
    // `guard` already rejected anonymous callers.
    let Some(caller) = request.session.principal() else {
        return Err(errors::authz_error_to_response(
            clinic_auth::AuthzError::Unauthenticated,
            &services.config,
        ));
    };

    let user_id = match as_user {
        Some(raw) => raw
            .parse::<UserId>()
            .map_err(|e| errors::json_error(StatusCode::BAD_REQUEST, "invalid_user_id", e.to_string()))?,
        None => caller.id,
    };

    // Users carry no role of their own here; replaying one needs the role spelled out.
    let Some(role_name) = as_role else {
        return Err(errors::json_error(
            StatusCode::BAD_REQUEST,
            "missing_role",
            "as_role is required with as_user",
        ));
    };

    let role_id = services
        .roles
        .id_of(&role_name)
        .map_err(|e| errors::json_error(StatusCode::SERVICE_UNAVAILABLE, "registry_unavailable", e.to_string()))?
        .ok_or_else(|| {
            errors::json_error(StatusCode::BAD_REQUEST, "unknown_role", format!("unknown role '{role_name}'"))
        })?;

    Ok(Session::authenticated(Principal::with_role(
        user_id,
        role_id,
        Role::new(role_name),
        Utc::now(),
    )))
}
