use crate::features::users::handlers::{
    deactivate_account, get_profile, profile_handler::MAX_AVATAR_SIZE, set_pin, update_profile,
    upload_avatar,
};
use crate::features::users::services::UserProfileService;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

pub fn routes(service: Arc<UserProfileService>) -> Router {
    Router::new()
        .route("/api/users/me", get(get_profile).patch(update_profile))
        .route(
            "/api/users/me/avatar",
            // Room for the multipart framing around the image
            post(upload_avatar).layer(DefaultBodyLimit::max(MAX_AVATAR_SIZE + 64 * 1024)),
        )
        .route("/api/users/me/pin", put(set_pin))
        .route("/api/users/me/deactivate", post(deactivate_account))
        .with_state(service)
}
