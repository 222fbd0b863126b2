use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::features::shares::handlers::{
    leave_share, list_file_shares, list_share_candidates, list_shared_with_me, revoke_share,
    share_file, verify_shared_pin,
};
use crate::features::shares::services::ShareService;

pub fn routes(service: Arc<ShareService>) -> Router {
    Router::new()
        .route(
            "/api/files/{id}/shares",
            post(share_file).get(list_file_shares),
        )
        .route("/api/files/{id}/shares/{user_id}", delete(revoke_share))
        .route("/api/files/{id}/share-candidates", get(list_share_candidates))
        .route("/api/shares", get(list_shared_with_me))
        .route("/api/shares/{file_id}", delete(leave_share))
        .route("/api/shares/{file_id}/access", post(verify_shared_pin))
        .with_state(service)
}
