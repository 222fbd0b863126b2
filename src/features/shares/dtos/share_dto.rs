use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::access_tokens::dtos::IssuedTokenDto;
use crate::features::shares::models::{IncomingShareRow, OutgoingShareRow, RecipientRow};
use crate::shared::validation::PIN_REGEX;

/// Request DTO for sharing a file with other users
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ShareFileDto {
    #[validate(length(min = 1, max = 50, message = "Between 1 and 50 recipients are required"))]
    pub recipients: Vec<Uuid>,

    /// PIN the recipients must enter to open the file
    #[validate(regex(path = *PIN_REGEX, message = "PIN must be exactly 6 digits"))]
    pub pin: String,

    /// When the share and its access tokens stop working
    pub expires_at: DateTime<Utc>,
}

/// Per-recipient outcome of a share request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShareRecipientResultDto {
    pub user_id: Uuid,
    pub shared: bool,
    /// Whether the invitation email went out
    pub notified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ShareRecipientResultDto {
    pub fn failed(user_id: Uuid, error: impl Into<String>) -> Self {
        Self {
            user_id,
            shared: false,
            notified: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShareFileResponseDto {
    pub file_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub results: Vec<ShareRecipientResultDto>,
}

impl ShareFileResponseDto {
    pub fn shared_count(&self) -> usize {
        self.results.iter().filter(|r| r.shared).count()
    }
}

/// A file someone shared with the caller
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IncomingShareDto {
    pub file_id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub file_size: i64,
    pub owner_id: Uuid,
    pub owner_username: String,
    pub owner_email: String,
    pub expires_at: DateTime<Utc>,
    pub shared_at: DateTime<Utc>,
}

impl From<IncomingShareRow> for IncomingShareDto {
    fn from(row: IncomingShareRow) -> Self {
        Self {
            file_id: row.file_id,
            file_name: row.file_name,
            content_type: row.content_type,
            file_size: row.file_size,
            owner_id: row.owner_id,
            owner_username: row.owner_username,
            owner_email: row.owner_email,
            expires_at: row.expires_at,
            shared_at: row.created_at,
        }
    }
}

/// A recipient of one of the caller's files
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OutgoingShareDto {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
    pub shared_at: DateTime<Utc>,
}

impl From<OutgoingShareRow> for OutgoingShareDto {
    fn from(row: OutgoingShareRow) -> Self {
        Self {
            user_id: row.shared_with_user_id,
            username: row.username,
            email: row.email,
            expires_at: row.expires_at,
            shared_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShareCandidateDto {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

impl From<RecipientRow> for ShareCandidateDto {
    fn from(row: RecipientRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
        }
    }
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ShareCandidatesQuery {
    /// Substring of a username or user id
    pub search: Option<String>,
}

/// Outcome of a recipient's PIN check
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SharedAccessDto {
    pub granted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_attempts: Option<i32>,
    /// The share was withdrawn after too many wrong PINs
    pub share_removed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access: Option<IssuedTokenDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShareRemovedDto {
    pub file_id: Uuid,
    pub user_id: Uuid,
    pub removed: bool,
}
