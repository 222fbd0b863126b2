//! Authorization guards for user and admin sessions.
//!
//! Users and admins authenticate against different tables, so a user session never
//! satisfies an admin guard and vice versa.
//!
//! Admin roles (from highest to lowest):
//! - Admin: primary administrator, manages other admins
//! - Senior Admin: approves restores, unblocks files, changes account status
//! - Junior Admin: read-only access to the admin panel

use crate::core::error::AppError;
use crate::features::admin::models::AdminRole;
use crate::features::auth::model::AuthenticatedUser;
use axum::{extract::FromRequestParts, http::request::Parts};

fn principal(parts: &Parts) -> Result<&AuthenticatedUser, AppError> {
    parts
        .extensions
        .get::<AuthenticatedUser>()
        .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))
}

fn admin_with(
    parts: &Parts,
    allowed: fn(AdminRole) -> bool,
) -> Result<(AuthenticatedUser, AdminRole), AppError> {
    let user = principal(parts)?;
    let role = user
        .admin_role()
        .ok_or_else(|| AppError::Forbidden("Admin access required".to_string()))?;

    if !allowed(role) {
        return Err(AppError::Forbidden(format!(
            "Role '{}' is not allowed to perform this action",
            role
        )));
    }

    Ok((user.clone(), role))
}

/// Guard for regular user sessions.
///
/// # Example
/// ```ignore
/// pub async fn handler(RequireUser(user): RequireUser) { ... }
/// ```
pub struct RequireUser(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = principal(parts)?;

        if !user.is_user() {
            return Err(AppError::Forbidden("User account required".to_string()));
        }

        Ok(RequireUser(user.clone()))
    }
}

/// Guard for any admin role, used by read-only admin endpoints.
pub struct RequireAdmin(pub AuthenticatedUser, pub AdminRole);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let (user, role) = admin_with(parts, |_| true)?;
        Ok(RequireAdmin(user, role))
    }
}

/// Guard for Admin or Senior Admin.
///
/// Use this for restore decisions, unblock OTPs and account status changes.
pub struct RequireSeniorAdmin(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireSeniorAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let (user, _) = admin_with(parts, |role| role.can_moderate())?;
        Ok(RequireSeniorAdmin(user))
    }
}

/// Guard for the primary Admin role only.
pub struct RequirePrimaryAdmin(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequirePrimaryAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let (user, _) = admin_with(parts, |role| role.can_manage_admins())?;
        Ok(RequirePrimaryAdmin(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{test_admin, test_user, with_principal};
    use axum::http::{Request, StatusCode};
    use axum::{routing::post, Router};
    use axum_test::TestServer;
    use uuid::Uuid;

    fn parts_with(user: Option<AuthenticatedUser>) -> Parts {
        let (mut parts, _) = Request::new(()).into_parts();
        if let Some(user) = user {
            parts.extensions.insert(user);
        }
        parts
    }

    fn admin(role: AdminRole) -> AuthenticatedUser {
        AuthenticatedUser::admin(Uuid::new_v4(), "a@example.com".into(), role)
    }

    #[tokio::test]
    async fn test_require_user() {
        let user = AuthenticatedUser::user(Uuid::new_v4(), "u@example.com".into());
        assert!(RequireUser::from_request_parts(&mut parts_with(Some(user)), &())
            .await
            .is_ok());

        let mut parts = parts_with(Some(admin(AdminRole::Admin)));
        let err = RequireUser::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = RequireUser::from_request_parts(&mut parts_with(None), &())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_require_senior_admin() {
        for (role, allowed) in [
            (AdminRole::Admin, true),
            (AdminRole::SeniorAdmin, true),
            (AdminRole::JuniorAdmin, false),
        ] {
            let mut parts = parts_with(Some(admin(role)));
            let result = RequireSeniorAdmin::from_request_parts(&mut parts, &()).await;
            assert_eq!(result.is_ok(), allowed, "role {}", role);
        }
    }

    #[tokio::test]
    async fn test_require_primary_admin() {
        let mut parts = parts_with(Some(admin(AdminRole::Admin)));
        assert!(RequirePrimaryAdmin::from_request_parts(&mut parts, &())
            .await
            .is_ok());
        assert!(RequirePrimaryAdmin::from_request_parts(
            &mut parts_with(Some(admin(AdminRole::SeniorAdmin))),
            &()
        )
        .await
        .is_err());
    }

    #[tokio::test]
    async fn test_require_admin_rejects_user_session() {
        let user = AuthenticatedUser::user(Uuid::new_v4(), "u@example.com".into());
        assert!(RequireAdmin::from_request_parts(&mut parts_with(Some(user)), &())
            .await
            .is_err());
    }

    async fn moderate(RequireSeniorAdmin(_admin): RequireSeniorAdmin) -> StatusCode {
        StatusCode::NO_CONTENT
    }

    async fn manage(RequirePrimaryAdmin(_admin): RequirePrimaryAdmin) -> StatusCode {
        StatusCode::NO_CONTENT
    }

    fn guarded_router() -> Router {
        Router::new()
            .route("/moderate", post(moderate))
            .route("/manage", post(manage))
    }

    #[tokio::test]
    async fn test_guards_in_router() {
        let junior = TestServer::new(with_principal(
            guarded_router(),
            test_admin(AdminRole::JuniorAdmin),
        ))
        .unwrap();
        junior
            .post("/moderate")
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let senior = TestServer::new(with_principal(
            guarded_router(),
            test_admin(AdminRole::SeniorAdmin),
        ))
        .unwrap();
        senior
            .post("/moderate")
            .await
            .assert_status(StatusCode::NO_CONTENT);
        senior
            .post("/manage")
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let user = TestServer::new(with_principal(guarded_router(), test_user())).unwrap();
        user.post("/moderate")
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_guard_without_session_is_unauthorized() {
        let server = TestServer::new(guarded_router()).unwrap();
        server
            .post("/manage")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
