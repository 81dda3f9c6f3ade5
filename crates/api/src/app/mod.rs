//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: the gate and its in-memory collaborators
//! - `routes/`: HTTP routes + handlers
//! - `errors.rs`: typed authorization results to HTTP

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::middleware;

pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(services: Arc<services::AppServices>) -> Router {
    let sessioned = Router::new()
        .route("/whoami", get(routes::system::whoami))
        .nest("/rbac", routes::rbac::router())
        .nest("/authz", routes::authz::router())
        .layer(Extension(services.clone()))
        .layer(axum::middleware::from_fn_with_state(
            services,
            middleware::session_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(sessioned)
        .layer(ServiceBuilder::new())
}
