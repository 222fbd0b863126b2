use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::auth::model::AuthenticatedUser;
use crate::features::users::dtos::UserProfileDto;
use crate::shared::validation::{PHONE_REGEX, USERNAME_REGEX};

/// Request DTO for user registration
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SignUpRequestDto {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub password_confirmation: String,

    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    #[validate(regex(
        path = *USERNAME_REGEX,
        message = "Username may only contain letters, digits and underscores"
    ))]
    pub username: String,

    #[validate(regex(path = *PHONE_REGEX, message = "Invalid phone number"))]
    pub phone: String,
}

/// Request DTO for user and admin sign-in
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SignInRequestDto {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Session token returned by sign-up and sign-in
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionResponseDto {
    pub access_token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserProfileDto,
}

/// Identity behind the current session
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MeResponseDto {
    pub principal: AuthenticatedUser,
    /// Present for user sessions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfileDto>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> SignUpRequestDto {
        SignUpRequestDto {
            email: "alice@example.com".into(),
            password: "s3cret-pass".into(),
            password_confirmation: "s3cret-pass".into(),
            username: "alice".into(),
            phone: "081234567890".into(),
        }
    }

    #[test]
    fn test_sign_up_valid() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_sign_up_password_rules() {
        let mut dto = valid();
        dto.password_confirmation = "different".into();
        assert!(dto.validate().is_err());

        let mut dto = valid();
        dto.password = "short".into();
        dto.password_confirmation = "short".into();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_sign_up_requires_email() {
        let mut dto = valid();
        dto.email = "not-an-email".into();
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
    }
}
