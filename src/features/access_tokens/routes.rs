use axum::{routing::post, Router};
use std::sync::Arc;

use crate::features::access_tokens::handlers::{issue_token, validate_token};
use crate::features::access_tokens::services::AccessTokenService;

/// Token validation is public: the token itself is the credential
pub fn public_routes(service: Arc<AccessTokenService>) -> Router {
    Router::new()
        .route("/api/tokens/validate", post(validate_token))
        .with_state(service)
}

pub fn protected_routes(service: Arc<AccessTokenService>) -> Router {
    Router::new()
        .route("/api/tokens", post(issue_token))
        .with_state(service)
}
