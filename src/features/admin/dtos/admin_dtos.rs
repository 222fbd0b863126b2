use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::admin::models::{Admin, AdminRole};
use crate::features::files::models::FileStatus;
use crate::features::users::models::AccountStatus;
use crate::shared::validation::USERNAME_REGEX;

// =============================================================================
// ADMIN ACCOUNTS
// =============================================================================

/// Admin account without its password hash
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminDto {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: AdminRole,
    pub assign_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<Admin> for AdminDto {
    fn from(admin: Admin) -> Self {
        Self {
            id: admin.id,
            username: admin.username,
            email: admin.email,
            role: admin.role,
            assign_date: admin.assign_date,
            created_at: admin.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAdminDto {
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    #[validate(regex(
        path = *USERNAME_REGEX,
        message = "Username may only contain letters, digits and underscores"
    ))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub password_confirmation: String,

    pub role: AdminRole,

    /// Defaults to now
    pub assign_date: Option<DateTime<Utc>>,
}

/// Omitted fields are left unchanged
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateAdminDto {
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    #[validate(regex(
        path = *USERNAME_REGEX,
        message = "Username may only contain letters, digits and underscores"
    ))]
    pub username: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub role: Option<AdminRole>,

    pub assign_date: Option<DateTime<Utc>>,
}

/// Session token returned by admin sign-in
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminSessionResponseDto {
    pub access_token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub admin: AdminDto,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminDeletedDto {
    pub id: Uuid,
    pub deleted: bool,
}

// =============================================================================
// MODERATION
// =============================================================================

/// File that went through the PIN lock / unblock flow
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct BlockedFileDto {
    pub id: Uuid,
    pub file_name: String,
    pub owner_id: Uuid,
    pub owner_username: String,
    pub owner_email: String,
    /// Raw file status; `active` means unblocked, `deleted` means the unblock failed
    pub status: FileStatus,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateAccountStatusDto {
    pub account_status: AccountStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(password: &str, confirmation: &str) -> CreateAdminDto {
        CreateAdminDto {
            username: "ops_lead".into(),
            email: "ops@example.com".into(),
            password: password.into(),
            password_confirmation: confirmation.into(),
            role: AdminRole::SeniorAdmin,
            assign_date: None,
        }
    }

    #[test]
    fn test_create_admin_validation() {
        assert!(create("long-enough", "long-enough").validate().is_ok());
        assert!(create("short", "short").validate().is_err());
        assert!(create("long-enough", "different!").validate().is_err());
    }

    #[test]
    fn test_create_admin_accepts_generated_accounts() {
        use fake::faker::internet::en::{Password, SafeEmail};
        use fake::Fake;

        for _ in 0..20 {
            let password: String = Password(8..32).fake();
            let dto = CreateAdminDto {
                email: SafeEmail().fake(),
                ..create(&password, &password)
            };
            assert!(dto.validate().is_ok(), "{:?}", dto.email);
        }
    }

    #[test]
    fn test_update_admin_allows_empty_patch() {
        let dto = UpdateAdminDto {
            username: None,
            email: None,
            role: None,
            assign_date: None,
        };
        assert!(dto.validate().is_ok());

        let bad = UpdateAdminDto {
            email: Some("nope".into()),
            ..dto
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_role_deserializes_from_display_name() {
        let dto: UpdateAccountStatusDto =
            serde_json::from_str(r#"{"account_status": "inactive"}"#).unwrap();
        assert_eq!(dto.account_status, AccountStatus::Inactive);

        let role: AdminRole = serde_json::from_str(r#""Junior Admin""#).unwrap();
        assert_eq!(role, AdminRole::JuniorAdmin);
    }
}
