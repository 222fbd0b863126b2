use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::access_tokens::ttl::TtlInput;

/// Request DTO for issuing a file access token
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueTokenDto {
    pub file_id: Uuid,
    /// Recipient of the token; defaults to the caller. Other users must hold a live share.
    pub user_id: Option<Uuid>,
    /// `"<n>h|m|s"` or milliseconds; defaults to the configured TTL
    pub ttl: Option<TtlInput>,
}

/// A freshly issued access token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssuedTokenDto {
    pub token: String,
    pub file_id: Uuid,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ValidateTokenDto {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenValidationDto {
    pub file_id: Uuid,
}
