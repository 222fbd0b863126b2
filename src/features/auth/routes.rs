use crate::features::auth::handlers;
use crate::features::auth::services::AuthService;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Public auth routes (no authentication required)
pub fn public_routes(service: Arc<AuthService>) -> Router {
    Router::new()
        .route("/api/auth/sign-up", post(handlers::sign_up))
        .route("/api/auth/sign-in", post(handlers::sign_in))
        .with_state(service)
}

/// Protected auth routes (require a session token)
pub fn protected_routes(service: Arc<AuthService>) -> Router {
    Router::new()
        .route("/api/auth/me", get(handlers::get_me))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::middleware::auth_middleware;
    use crate::shared::test_helpers::{lazy_pool, test_user, test_validator};
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;

    fn server() -> TestServer {
        let validator = Arc::new(test_validator());
        let service = Arc::new(AuthService::new(lazy_pool(), Arc::clone(&validator)));

        let app = Router::new()
            .merge(public_routes(Arc::clone(&service)))
            .merge(
                protected_routes(service).route_layer(axum::middleware::from_fn_with_state(
                    validator,
                    auth_middleware,
                )),
            );

        TestServer::new(app).unwrap()
    }

    #[tokio::test]
    async fn test_sign_up_rejects_invalid_payload() {
        let response = server()
            .post("/api/auth/sign-up")
            .json(&json!({
                "email": "not-an-email",
                "password": "short",
                "password_confirmation": "different",
                "username": "a",
                "phone": "x"
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_sign_in_rejects_malformed_json() {
        let response = server()
            .post("/api/auth/sign-in")
            .content_type("application/json")
            .text("{not json")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_me_requires_session() {
        let response = server().get("/api/auth/me").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_me_rejects_foreign_signature() {
        let other = crate::features::auth::JwtValidator::new(&crate::core::config::AuthConfig {
            session_secret: "another-secret".to_string(),
            session_ttl: std::time::Duration::from_secs(3600),
            jwt_leeway: std::time::Duration::from_secs(0),
        });
        let session = other.issue(&test_user()).unwrap();

        let response = server()
            .get("/api/auth/me")
            .authorization_bearer(session.token)
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}
