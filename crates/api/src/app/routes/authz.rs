//! UI gating: ask whether the current user may do something without enforcing it.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;

use crate::app::routes::ability_and_context;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::RequestSession;

#[derive(Debug, Serialize)]
pub struct AllowsResponse {
    pub ability: String,
    pub allowed: bool,
}

pub fn router() -> Router {
    Router::new().route("/allows", get(allows))
}

/// GET /authz/allows?ability=…&<context> - never 403s
pub async fn allows(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(mut request): Extension<RequestSession>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let (ability, ctx) = match ability_and_context(params, &[]) {
        Ok(parts) => parts,
        Err(res) => return res,
    };

    match authz::allows_request(&services, &mut request, ability.clone(), &ctx) {
        Ok(allowed) => Json(AllowsResponse { ability, allowed }).into_response(),
        Err(res) => res,
    }
}
