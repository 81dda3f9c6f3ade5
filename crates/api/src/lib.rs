//! HTTP API: session loading, authorization guards, and RBAC audit routes.
//!
//! Turns the gate's typed results into HTTP: a login redirect when nobody is
//! signed in, a plain 403 when the policy denies.

pub mod app;
pub mod authz;
pub mod config;
pub mod context;
pub mod middleware;
pub mod session_store;
