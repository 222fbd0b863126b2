use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::auth::model::PrincipalKind;

/// Every state change that lands in the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    FileUploaded,
    FileReplaced,
    FileDeleted,
    FilePurged,
    PinFailed,
    FileBlocked,
    UnblockOtpSent,
    FileUnblocked,
    UnblockFailed,
    FileShared,
    ShareRemoved,
    SharedPinFailed,
    RestoreRequested,
    RestoreApproved,
    RestoreRejected,
    FileRestored,
    RestoreFailed,
    TokenIssued,
    AccountDeactivated,
    AccountStatusChanged,
    AdminCreated,
    AdminUpdated,
    AdminDeleted,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::FileUploaded => "file_uploaded",
            AuditAction::FileReplaced => "file_replaced",
            AuditAction::FileDeleted => "file_deleted",
            AuditAction::FilePurged => "file_purged",
            AuditAction::PinFailed => "pin_failed",
            AuditAction::FileBlocked => "file_blocked",
            AuditAction::UnblockOtpSent => "unblock_otp_sent",
            AuditAction::FileUnblocked => "file_unblocked",
            AuditAction::UnblockFailed => "unblock_failed",
            AuditAction::FileShared => "file_shared",
            AuditAction::ShareRemoved => "share_removed",
            AuditAction::SharedPinFailed => "shared_pin_failed",
            AuditAction::RestoreRequested => "restore_requested",
            AuditAction::RestoreApproved => "restore_approved",
            AuditAction::RestoreRejected => "restore_rejected",
            AuditAction::FileRestored => "file_restored",
            AuditAction::RestoreFailed => "restore_failed",
            AuditAction::TokenIssued => "token_issued",
            AuditAction::AccountDeactivated => "account_deactivated",
            AuditAction::AccountStatusChanged => "account_status_changed",
            AuditAction::AdminCreated => "admin_created",
            AuditAction::AdminUpdated => "admin_updated",
            AuditAction::AdminDeleted => "admin_deleted",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who performed an audited action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub kind: PrincipalKind,
}

impl Actor {
    pub fn user(id: Uuid) -> Self {
        Self {
            id,
            kind: PrincipalKind::User,
        }
    }

    pub fn admin(id: Uuid) -> Self {
        Self {
            id,
            kind: PrincipalKind::Admin,
        }
    }
}

/// Audit entry joined with display names for the admin panel
#[derive(Debug, Clone, FromRow)]
pub struct AuditLogRow {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub actor_kind: PrincipalKind,
    pub actor_name: Option<String>,
    pub action: String,
    pub file_id: Option<Uuid>,
    pub file_name: Option<String>,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_names_match_serde() {
        for action in [
            AuditAction::FileBlocked,
            AuditAction::UnblockOtpSent,
            AuditAction::RestoreFailed,
            AuditAction::AdminDeleted,
        ] {
            let json = serde_json::to_string(&action).unwrap();
            assert_eq!(json, format!("\"{}\"", action.as_str()));
        }
    }
}
