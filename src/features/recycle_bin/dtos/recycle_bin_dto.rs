use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::recycle_bin::models::{RecycleBinRow, RecycleStatus};

/// Recycle-bin entry with file and owner details
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecycleBinEntryDto {
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

impl From<RecycleBinRow> for RecycleBinEntryDto {
    fn from(row: RecycleBinRow) -> Self {
        Self {
            id: row.id,
            file_id: row.file_id,
            file_name: row.file_name,
            file_size: row.file_size,
            owner_id: row.owner_id,
            owner_username: row.owner_username,
            owner_email: row.owner_email,
            status: row.status,
            deleted_at: row.deleted_at,
        }
    }
}

/// New state of an entry after a workflow step
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RestoreStatusDto {
    pub id: Uuid,
    pub status: RecycleStatus,
    /// Set when a restore OTP has just been issued
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp_expires_at: Option<DateTime<Utc>>,
}

/// Outcome of confirming a restore OTP
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RestoreOutcomeDto {
    pub file_id: Uuid,
    /// `true` when the file is back in the library; `false` means it was permanently deleted
    pub restored: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PurgeResponseDto {
    pub file_id: Uuid,
    pub purged: bool,
}
