use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::features::recycle_bin::handlers::{confirm_restore, list_bin, purge, request_restore};
use crate::features::recycle_bin::services::RecycleBinService;

pub fn routes(service: Arc<RecycleBinService>) -> Router {
    Router::new()
        .route("/api/recycle-bin", get(list_bin))
        .route("/api/recycle-bin/{id}", delete(purge))
        .route("/api/recycle-bin/{id}/restore-request", post(request_restore))
        .route("/api/recycle-bin/{id}/confirm", post(confirm_restore))
        .with_state(service)
}
