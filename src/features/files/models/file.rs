use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// File status enum matching database enum
///
/// ```text
/// active --3 wrong PINs--> blocked --OTP sent--> otp_sent --OTP ok--> active
///                                                  |
///                                                  +--OTP wrong/expired--> deleted
/// active --owner delete--> deleted --restore confirmed--> active
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "file_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Active,
    Deleted,
    Blocked,
    OtpSent,
}

impl FileStatus {
    /// PIN entry is only offered on active files
    pub fn accepts_pin(self) -> bool {
        self == FileStatus::Active
    }

    /// An unblock OTP may be (re)sent
    pub fn can_request_unblock(self) -> bool {
        matches!(self, FileStatus::Blocked | FileStatus::OtpSent)
    }

    /// Statuses that appear in the owner's library
    pub fn in_library(self) -> bool {
        self != FileStatus::Deleted
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileStatus::Active => write!(f, "active"),
            FileStatus::Deleted => write!(f, "deleted"),
            FileStatus::Blocked => write!(f, "blocked"),
            FileStatus::OtpSent => write!(f, "otp_sent"),
        }
    }
}

/// Database model for files
#[derive(Debug, Clone, FromRow)]
pub struct File {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_name: String,
    pub file_key: String,
    pub content_type: String,
    pub file_size: i64,
    pub scan_id: Option<String>,
    pub status: FileStatus,
    pub pin_attempts: i32,
    pub last_pin_attempt: Option<DateTime<Utc>>,
    pub unblock_otp: Option<String>,
    pub unblock_otp_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl File {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}
