use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::users::models::{AccountStatus, UserProfile};
use crate::shared::validation::{PHONE_REGEX, PIN_REGEX, USERNAME_REGEX};

/// Profile as returned to its owner
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfileDto {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub avatar: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub account_status: AccountStatus,
    /// Whether an access PIN has been set
    pub has_pin: bool,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl From<UserProfile> for UserProfileDto {
    fn from(profile: UserProfile) -> Self {
        Self {
            has_pin: profile.has_pin(),
            id: profile.id,
            username: profile.username,
            email: profile.email,
            phone: profile.phone,
            avatar: profile.avatar,
            website: profile.website,
            address: profile.address,
            account_status: profile.account_status,
            created_at: profile.created_at,
            last_updated: profile.last_updated,
        }
    }
}

/// Request DTO for updating the caller's profile; omitted fields are left unchanged
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileDto {
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    #[validate(regex(
        path = *USERNAME_REGEX,
        message = "Username may only contain letters, digits and underscores"
    ))]
    pub username: Option<String>,

    #[validate(regex(path = *PHONE_REGEX, message = "Invalid phone number"))]
    pub phone: Option<String>,

    #[validate(url(message = "Website must be a valid URL"))]
    pub website: Option<String>,

    #[validate(length(max = 255, message = "Address must not exceed 255 characters"))]
    pub address: Option<String>,

    pub account_status: Option<AccountStatus>,
}

/// Request DTO for setting the access PIN
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SetPinDto {
    #[validate(regex(path = *PIN_REGEX, message = "PIN must be exactly 6 digits"))]
    pub pin: String,

    #[validate(must_match(other = "pin", message = "PINs do not match"))]
    pub confirm_pin: String,
}

/// Request DTO for deactivating the caller's account
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct DeactivateAccountDto {
    #[validate(regex(path = *PIN_REGEX, message = "PIN must be exactly 6 digits"))]
    pub pin: String,
}

/// Outcome of a deactivation attempt
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeactivateAccountResponseDto {
    pub deactivated: bool,
    /// Attempts left before the 24 hour lock, present on a wrong PIN
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_attempts: Option<i32>,
    /// Set when this attempt triggered the lock
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_until: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_pin_requires_matching_digits() {
        let ok = SetPinDto {
            pin: "123456".into(),
            confirm_pin: "123456".into(),
        };
        assert!(ok.validate().is_ok());

        let mismatch = SetPinDto {
            pin: "123456".into(),
            confirm_pin: "654321".into(),
        };
        assert!(mismatch.validate().is_err());

        let short = SetPinDto {
            pin: "1234".into(),
            confirm_pin: "1234".into(),
        };
        assert!(short.validate().is_err());
    }

    #[test]
    fn test_update_profile_validation() {
        let dto = UpdateProfileDto {
            username: Some("bad name".into()),
            phone: None,
            website: None,
            address: None,
            account_status: None,
        };
        assert!(dto.validate().is_err());

        let dto = UpdateProfileDto {
            username: Some("good_name".into()),
            phone: Some("+62 812 3456 789".into()),
            website: Some("https://example.com".into()),
            address: None,
            account_status: Some(AccountStatus::Active),
        };
        assert!(dto.validate().is_ok());
    }
}
