use crate::features::admin::handlers;
use crate::features::admin::services::AdminService;
use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;

/// Public admin routes (no authentication required)
pub fn public_routes(service: Arc<AdminService>) -> Router {
    Router::new()
        .route("/api/admin/auth/sign-in", post(handlers::sign_in))
        .with_state(service)
}

/// Admin panel routes; each handler enforces its own role guard
pub fn protected_routes(service: Arc<AdminService>) -> Router {
    Router::new()
        .route(
            "/api/admin/admins",
            get(handlers::list_admins).post(handlers::create_admin),
        )
        .route(
            "/api/admin/admins/{id}",
            patch(handlers::update_admin).delete(handlers::delete_admin),
        )
        .route(
            "/api/admin/restore-requests",
            get(handlers::list_restore_requests),
        )
        .route(
            "/api/admin/restore-requests/{id}/approve",
            post(handlers::approve_restore),
        )
        .route(
            "/api/admin/restore-requests/{id}/reject",
            post(handlers::reject_restore),
        )
        .route("/api/admin/blocked-files", get(handlers::list_blocked_files))
        .route(
            "/api/admin/blocked-files/{id}/unblock",
            post(handlers::unblock_file),
        )
        .route("/api/admin/audit-logs", get(handlers::list_audit_logs))
        .route("/api/admin/users", get(handlers::list_users))
        .route(
            "/api/admin/users/{id}/status",
            patch(handlers::set_user_status),
        )
        .with_state(service)
}
