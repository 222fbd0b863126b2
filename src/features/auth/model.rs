use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::admin::models::AdminRole;
use crate::shared::constants::ROLE_USER;

/// Which table a session principal lives in; also the `actor_kind` of audit entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "actor_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    User,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: String,
    pub kind: PrincipalKind,
    pub roles: Vec<String>,
}

impl AuthenticatedUser {
    pub fn user(id: Uuid, email: String) -> Self {
        Self {
            id,
            email,
            kind: PrincipalKind::User,
            roles: vec![ROLE_USER.to_string()],
        }
    }

    pub fn admin(id: Uuid, email: String, role: AdminRole) -> Self {
        Self {
            id,
            email,
            kind: PrincipalKind::Admin,
            roles: vec![role.as_str().to_string()],
        }
    }

    /// Check if user has a specific role
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_user(&self) -> bool {
        self.kind == PrincipalKind::User
    }

    /// Highest admin role carried by the session, if this is an admin session
    pub fn admin_role(&self) -> Option<AdminRole> {
        if self.kind != PrincipalKind::Admin {
            return None;
        }
        [
            AdminRole::Admin,
            AdminRole::SeniorAdmin,
            AdminRole::JuniorAdmin,
        ]
        .into_iter()
        .find(|role| self.has_role(role.as_str()))
    }
}

/// Claims of a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub email: String,
    pub kind: PrincipalKind,
    #[serde(default)]
    pub roles: Vec<String>,
    pub iat: i64,
    pub exp: i64,
}

impl From<SessionClaims> for AuthenticatedUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            kind: claims.kind,
            roles: claims.roles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_has_no_admin_role() {
        let user = AuthenticatedUser::user(Uuid::new_v4(), "u@example.com".into());
        assert!(user.is_user());
        assert!(user.has_role(ROLE_USER));
        assert_eq!(user.admin_role(), None);
    }

    #[test]
    fn test_admin_role_resolution() {
        let admin = AuthenticatedUser::admin(
            Uuid::new_v4(),
            "a@example.com".into(),
            AdminRole::SeniorAdmin,
        );
        assert!(!admin.is_user());
        assert_eq!(admin.admin_role(), Some(AdminRole::SeniorAdmin));
    }

    #[test]
    fn test_role_string_on_user_session_is_not_admin() {
        let mut forged = AuthenticatedUser::user(Uuid::new_v4(), "u@example.com".into());
        forged.roles.push(AdminRole::Admin.as_str().to_string());
        assert_eq!(forged.admin_role(), None);
    }
}
