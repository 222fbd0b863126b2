use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Restore workflow state of a recycle-bin entry
///
/// ```text
/// deleted ----------> restore_requested --approve--> restore_approved --OTP ok--> (row removed, file active)
///    ^                   |       ^                          |
///    |                reject     |                       OTP wrong/expired --> file purged
///    |                   v       |
///    +------------ restore_rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "recycle_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RecycleStatus {
    Deleted,
    RestoreRequested,
    RestoreApproved,
    RestoreRejected,
}

impl RecycleStatus {
    /// The owner may (re)request a restore
    pub fn can_request_restore(self) -> bool {
        matches!(self, RecycleStatus::Deleted | RecycleStatus::RestoreRejected)
    }

    /// Pending an administrator decision
    pub fn awaits_review(self) -> bool {
        self == RecycleStatus::RestoreRequested
    }

    /// An OTP has been issued and can be confirmed
    pub fn awaits_confirmation(self) -> bool {
        self == RecycleStatus::RestoreApproved
    }
}

impl std::fmt::Display for RecycleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecycleStatus::Deleted => write!(f, "deleted"),
            RecycleStatus::RestoreRequested => write!(f, "restore_requested"),
            RecycleStatus::RestoreApproved => write!(f, "restore_approved"),
            RecycleStatus::RestoreRejected => write!(f, "restore_rejected"),
        }
    }
}

/// Database model for `recycle_bin`
#[derive(Debug, Clone, FromRow)]
pub struct RecycleBinEntry {
    pub id: Uuid,
    pub file_id: Uuid,
    pub deleted_at: DateTime<Utc>,
    pub status: RecycleStatus,
    pub otp: Option<String>,
    pub otp_expiry: Option<DateTime<Utc>>,
}

/// Entry joined with its file and the file's owner
#[derive(Debug, Clone, FromRow)]
pub struct RecycleBinRow {
    pub id: Uuid,
    pub file_id: Uuid,
    pub file_name: String,
    pub file_size: i64,
    pub owner_id: Uuid,
    pub owner_username: String,
    pub owner_email: String,
    pub status: RecycleStatus,
    pub deleted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restore_request_allowed_from_deleted_and_rejected() {
        assert!(RecycleStatus::Deleted.can_request_restore());
        assert!(RecycleStatus::RestoreRejected.can_request_restore());
        assert!(!RecycleStatus::RestoreRequested.can_request_restore());
        assert!(!RecycleStatus::RestoreApproved.can_request_restore());
    }

    #[test]
    fn test_review_and_confirmation_states() {
        assert!(RecycleStatus::RestoreRequested.awaits_review());
        assert!(!RecycleStatus::Deleted.awaits_review());
        assert!(RecycleStatus::RestoreApproved.awaits_confirmation());
        assert!(!RecycleStatus::RestoreRequested.awaits_confirmation());
    }

    #[test]
    fn test_display_matches_serde() {
        for status in [
            RecycleStatus::Deleted,
            RecycleStatus::RestoreRequested,
            RecycleStatus::RestoreApproved,
            RecycleStatus::RestoreRejected,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status));
        }
    }
}
