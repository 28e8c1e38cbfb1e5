pub mod auth;
pub mod handlers;

use axum::{middleware, routing::get, Router};
use std::sync::Arc;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::admission::TokenBucket;
use crate::audit::AuditStore;

/// State shared by admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub store: Arc<dyn AuditStore>,
    pub bucket: Arc<TokenBucket>,
    pub api_key: String,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/admission", get(get_admission))
        .route("/admin/audit/{request_id}", get(get_audit_record))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
