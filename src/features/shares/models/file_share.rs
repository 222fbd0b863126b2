use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for `file_shares`
#[derive(Debug, Clone, FromRow)]
pub struct FileShare {
    pub id: Uuid,
    pub file_id: Uuid,
    pub shared_with_user_id: Uuid,
    pub pin: String,
    pub pin_attempts: i32,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl FileShare {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Share addressed to the caller, joined with file and owner details
#[derive(Debug, Clone, FromRow)]
pub struct IncomingShareRow {
    pub file_id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub file_size: i64,
    pub owner_id: Uuid,
    pub owner_username: String,
    pub owner_email: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Share on one of the caller's files, joined with the recipient
#[derive(Debug, Clone, FromRow)]
pub struct OutgoingShareRow {
    pub shared_with_user_id: Uuid,
    pub username: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Minimal user record for recipient lookups and the share picker
#[derive(Debug, Clone, FromRow)]
pub struct RecipientRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}
