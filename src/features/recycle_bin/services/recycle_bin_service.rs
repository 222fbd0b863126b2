use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::audit::{Actor, AuditAction, AuditService};
use crate::features::files::models::File;
use crate::features::files::FileService;
use crate::features::recycle_bin::dtos::{
    PurgeResponseDto, RecycleBinEntryDto, RestoreOutcomeDto, RestoreStatusDto,
};
use crate::features::recycle_bin::models::{RecycleBinEntry, RecycleBinRow, RecycleStatus};
use crate::modules::email::Mailer;
use crate::shared::security::{generate_otp, OtpOutcome};
use crate::shared::templates::OtpPurpose;
use crate::shared::types::PaginationQuery;

const ENTRY_COLUMNS: &str = r#"
    b.id,
    b.file_id,
    f.file_name,
    f.file_size,
    u.id AS owner_id,
    u.username AS owner_username,
    u.email AS owner_email,
    b.status,
    b.deleted_at
"#;

/// Recycle bin listing and the restore workflow
pub struct RecycleBinService {
    pool: PgPool,
    files: Arc<FileService>,
    mailer: Arc<Mailer>,
    audit: Arc<AuditService>,
}

impl RecycleBinService {
    pub fn new(
        pool: PgPool,
        files: Arc<FileService>,
        mailer: Arc<Mailer>,
        audit: Arc<AuditService>,
    ) -> Self {
        Self {
            pool,
            files,
            mailer,
            audit,
        }
    }

    async fn fetch_entry(&self, entry_id: Uuid) -> Result<RecycleBinEntry> {
        sqlx::query_as::<_, RecycleBinEntry>("SELECT * FROM recycle_bin WHERE id = $1")
            .bind(entry_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Recycle bin entry not found".to_string()))
    }

    /// Entry plus its file, checking that `owner_id` owns the file
    async fn find_owned(&self, owner_id: Uuid, entry_id: Uuid) -> Result<(RecycleBinEntry, File)> {
        let entry = self.fetch_entry(entry_id).await?;
        let file = self.files.find_owned(owner_id, entry.file_id).await?;
        Ok((entry, file))
    }

    fn illegal_transition(entry: &RecycleBinEntry, action: &str) -> AppError {
        AppError::Conflict(format!(
            "Cannot {} a recycle bin entry in status {}",
            action, entry.status
        ))
    }

    /// Caller's bin, newest deletion first
    pub async fn list_bin(
        &self,
        owner_id: Uuid,
        params: &PaginationQuery,
    ) -> Result<(Vec<RecycleBinEntryDto>, i64)> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM recycle_bin b
            JOIN files f ON f.id = b.file_id
            WHERE f.user_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, RecycleBinRow>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM recycle_bin b
            JOIN files f ON f.id = b.file_id
            JOIN user_profiles u ON u.id = f.user_id
            WHERE f.user_id = $1
            ORDER BY b.deleted_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(owner_id)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    /// Restore queue for administrators, oldest request first
    pub async fn list_restore_requests(
        &self,
        params: &PaginationQuery,
    ) -> Result<(Vec<RecycleBinEntryDto>, i64)> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM recycle_bin WHERE status = 'restore_requested'",
        )
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, RecycleBinRow>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM recycle_bin b
            JOIN files f ON f.id = b.file_id
            JOIN user_profiles u ON u.id = f.user_id
            WHERE b.status = 'restore_requested'
            ORDER BY b.deleted_at ASC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    /// `deleted | restore_rejected -> restore_requested`
    pub async fn request_restore(
        &self,
        owner_id: Uuid,
        entry_id: Uuid,
    ) -> Result<RestoreStatusDto> {
        let (entry, file) = self.find_owned(owner_id, entry_id).await?;
        if !entry.status.can_request_restore() {
            return Err(Self::illegal_transition(&entry, "request a restore for"));
        }

        let moved = sqlx::query(
            r#"
            UPDATE recycle_bin
            SET status = 'restore_requested'
            WHERE id = $1 AND status IN ('deleted', 'restore_rejected')
            "#,
        )
        .bind(entry.id)
        .execute(&self.pool)
        .await?;

        if moved.rows_affected() == 0 {
            return Err(Self::illegal_transition(&entry, "request a restore for"));
        }

        info!("Restore requested: entry={}, file={}", entry.id, file.id);
        self.audit
            .record(
                Actor::user(owner_id),
                AuditAction::RestoreRequested,
                Some(file.id),
                None,
            )
            .await;

        Ok(RestoreStatusDto {
            id: entry.id,
            status: RecycleStatus::RestoreRequested,
            otp_expires_at: None,
        })
    }

    /// `restore_requested -> restore_approved`, emailing the owner a restore OTP.
    /// Nothing changes if the email cannot be sent.
    pub async fn approve_restore(
        &self,
        admin_id: Uuid,
        entry_id: Uuid,
    ) -> Result<RestoreStatusDto> {
        let entry = self.fetch_entry(entry_id).await?;
        if !entry.status.awaits_review() {
            return Err(Self::illegal_transition(&entry, "approve"));
        }

        let file = self.files.fetch_file(entry.file_id).await?;
        let owner_email =
            sqlx::query_scalar::<_, String>("SELECT email FROM user_profiles WHERE id = $1")
                .bind(file.user_id)
                .fetch_one(&self.pool)
                .await?;

        let otp = generate_otp();
        let expires_at = Utc::now() + self.files.otp_ttl();

        self.mailer
            .send_otp(
                &owner_email,
                OtpPurpose::Restore,
                &file.file_name,
                &self.mailer.recycle_bin_link(),
                &otp,
            )
            .await?;

        let moved = sqlx::query(
            r#"
            UPDATE recycle_bin
            SET status = 'restore_approved', otp = $2, otp_expiry = $3
            WHERE id = $1 AND status = 'restore_requested'
            "#,
        )
        .bind(entry.id)
        .bind(&otp)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        if moved.rows_affected() == 0 {
            return Err(Self::illegal_transition(&entry, "approve"));
        }

        info!("Restore approved: entry={}, by admin={}", entry.id, admin_id);
        self.audit
            .record(
                Actor::admin(admin_id),
                AuditAction::RestoreApproved,
                Some(file.id),
                None,
            )
            .await;

        Ok(RestoreStatusDto {
            id: entry.id,
            status: RecycleStatus::RestoreApproved,
            otp_expires_at: Some(expires_at),
        })
    }

    /// `restore_requested -> restore_rejected`
    pub async fn reject_restore(&self, admin_id: Uuid, entry_id: Uuid) -> Result<RestoreStatusDto> {
        let entry = self.fetch_entry(entry_id).await?;
        if !entry.status.awaits_review() {
            return Err(Self::illegal_transition(&entry, "reject"));
        }

        let moved = sqlx::query(
            r#"
            UPDATE recycle_bin
            SET status = 'restore_rejected'
            WHERE id = $1 AND status = 'restore_requested'
            "#,
        )
        .bind(entry.id)
        .execute(&self.pool)
        .await?;

        if moved.rows_affected() == 0 {
            return Err(Self::illegal_transition(&entry, "reject"));
        }

        info!("Restore rejected: entry={}, by admin={}", entry.id, admin_id);
        self.audit
            .record(
                Actor::admin(admin_id),
                AuditAction::RestoreRejected,
                Some(entry.file_id),
                None,
            )
            .await;

        Ok(RestoreStatusDto {
            id: entry.id,
            status: RecycleStatus::RestoreRejected,
            otp_expires_at: None,
        })
    }

    /// Confirm the restore OTP. A wrong or expired code permanently deletes the file.
    pub async fn confirm_restore(
        &self,
        owner_id: Uuid,
        entry_id: Uuid,
        otp: &str,
    ) -> Result<RestoreOutcomeDto> {
        let (entry, file) = self.find_owned(owner_id, entry_id).await?;
        if !entry.status.awaits_confirmation() {
            return Err(Self::illegal_transition(&entry, "confirm"));
        }

        let outcome = OtpOutcome::check(entry.otp.as_deref(), entry.otp_expiry, otp, Utc::now());

        if outcome.is_valid() {
            let mut tx = self.pool.begin().await?;

            let removed = sqlx::query(
                "DELETE FROM recycle_bin WHERE id = $1 AND status = 'restore_approved' AND otp = $2",
            )
            .bind(entry.id)
            .bind(entry.otp.as_deref())
            .execute(&mut *tx)
            .await?;

            if removed.rows_affected() == 0 {
                return Err(AppError::Conflict("Code has already been used".to_string()));
            }

            sqlx::query(
                r#"
                UPDATE files
                SET status = 'active', pin_attempts = 0, updated_at = NOW()
                WHERE id = $1 AND status = 'deleted'
                "#,
            )
            .bind(file.id)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;

            info!("File restored: id={}", file.id);
            self.audit
                .record(
                    Actor::user(owner_id),
                    AuditAction::FileRestored,
                    Some(file.id),
                    None,
                )
                .await;

            return Ok(RestoreOutcomeDto {
                file_id: file.id,
                restored: true,
            });
        }

        // Burn the code first so a concurrent confirm cannot reuse it
        let claimed = sqlx::query(
            r#"
            UPDATE recycle_bin
            SET otp = NULL, otp_expiry = NULL
            WHERE id = $1 AND status = 'restore_approved' AND otp IS NOT NULL
            "#,
        )
        .bind(entry.id)
        .execute(&self.pool)
        .await?;

        if claimed.rows_affected() == 0 {
            return Err(AppError::Conflict("Code has already been used".to_string()));
        }

        self.files.destroy(&file).await?;
        warn!(
            "Restore failed ({:?}), file permanently deleted: id={}",
            outcome, file.id
        );
        self.audit
            .record(
                Actor::user(owner_id),
                AuditAction::RestoreFailed,
                Some(file.id),
                Some(file.file_name.clone()),
            )
            .await;

        Ok(RestoreOutcomeDto {
            file_id: file.id,
            restored: false,
        })
    }

    /// Permanently delete a file from the caller's bin
    pub async fn purge(&self, owner_id: Uuid, entry_id: Uuid) -> Result<PurgeResponseDto> {
        let (_, file) = self.find_owned(owner_id, entry_id).await?;

        self.files.destroy(&file).await?;
        self.audit
            .record(
                Actor::user(owner_id),
                AuditAction::FilePurged,
                Some(file.id),
                Some(file.file_name.clone()),
            )
            .await;

        Ok(PurgeResponseDto {
            file_id: file.id,
            purged: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::email::mock::RecordingSender;
    use crate::shared::test_helpers::TestServices;

    async fn deleted_file(svc: &TestServices) -> (Uuid, Uuid, Uuid) {
        let owner = svc.user(Some("482913")).await;
        let file_id = svc.upload(owner).await;
        let entry_id = svc
            .files
            .delete_file(owner, file_id)
            .await
            .unwrap()
            .recycle_bin_id;
        (owner, file_id, entry_id)
    }

    async fn restore_otp(pool: &PgPool, entry_id: Uuid) -> String {
        sqlx::query_scalar::<_, String>("SELECT otp FROM recycle_bin WHERE id = $1")
            .bind(entry_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    fn is_conflict<T>(result: Result<T>) -> bool {
        matches!(result, Err(AppError::Conflict(_)))
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_illegal_restore_transitions_conflict(pool: PgPool) {
        let svc = TestServices::new(pool);
        let admin = Uuid::new_v4();
        let (owner, file_id, entry_id) = deleted_file(&svc).await;

        assert!(is_conflict(svc.bin.approve_restore(admin, entry_id).await));
        assert!(is_conflict(svc.bin.reject_restore(admin, entry_id).await));
        assert!(is_conflict(svc.bin.confirm_restore(owner, entry_id, "123456").await));

        svc.bin.request_restore(owner, entry_id).await.unwrap();
        assert_eq!(svc.bin_status(file_id).await.as_deref(), Some("restore_requested"));
        assert!(is_conflict(svc.bin.request_restore(owner, entry_id).await));
        assert!(is_conflict(svc.bin.confirm_restore(owner, entry_id, "123456").await));

        svc.bin.reject_restore(admin, entry_id).await.unwrap();
        assert_eq!(svc.bin_status(file_id).await.as_deref(), Some("restore_rejected"));
        assert!(is_conflict(svc.bin.approve_restore(admin, entry_id).await));

        // A rejected request may be raised again
        let again = svc.bin.request_restore(owner, entry_id).await.unwrap();
        assert_eq!(again.status, RecycleStatus::RestoreRequested);
        assert_eq!(svc.file_status(file_id).await.as_deref(), Some("deleted"));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_approve_emails_code_and_confirm_restores(pool: PgPool) {
        let svc = TestServices::new(pool);
        let (owner, file_id, entry_id) = deleted_file(&svc).await;

        svc.bin.request_restore(owner, entry_id).await.unwrap();
        let approved = svc.bin.approve_restore(Uuid::new_v4(), entry_id).await.unwrap();
        assert_eq!(approved.status, RecycleStatus::RestoreApproved);
        assert!(approved.otp_expires_at.is_some());

        let otp = restore_otp(&svc.pool, entry_id).await;
        let sent = svc.sender.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].html.contains(otp.trim()));

        let outcome = svc.bin.confirm_restore(owner, entry_id, &otp).await.unwrap();
        assert!(outcome.restored);
        assert_eq!(svc.file_status(file_id).await.as_deref(), Some("active"));
        assert_eq!(svc.bin_status(file_id).await, None);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_restore_code_mismatch_deletes_file(pool: PgPool) {
        let svc = TestServices::new(pool);
        let (owner, file_id, entry_id) = deleted_file(&svc).await;
        let key = svc.files.fetch_file(file_id).await.unwrap().file_key;

        svc.bin.request_restore(owner, entry_id).await.unwrap();
        svc.bin.approve_restore(Uuid::new_v4(), entry_id).await.unwrap();

        let otp = restore_otp(&svc.pool, entry_id).await;
        let wrong = if otp.trim() == "111111" {
            "222222"
        } else {
            "111111"
        };
        let outcome = svc.bin.confirm_restore(owner, entry_id, wrong).await.unwrap();

        assert!(!outcome.restored);
        assert_eq!(svc.file_status(file_id).await, None);
        assert_eq!(svc.bin_status(file_id).await, None);
        assert!(!svc.store.contains(&key));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_failed_approval_email_leaves_request_pending(pool: PgPool) {
        let svc = TestServices::new(pool);
        let (owner, file_id, entry_id) = deleted_file(&svc).await;
        svc.bin.request_restore(owner, entry_id).await.unwrap();

        let mailer = Arc::new(Mailer::new(
            Arc::new(RecordingSender {
                fail: true,
                ..Default::default()
            }),
            "https://app.example.com",
            std::time::Duration::from_secs(600),
        ));
        let bin = RecycleBinService::new(
            svc.pool.clone(),
            svc.files.clone(),
            mailer,
            Arc::new(AuditService::new(svc.pool.clone())),
        );

        assert!(bin.approve_restore(Uuid::new_v4(), entry_id).await.is_err());
        assert_eq!(svc.bin_status(file_id).await.as_deref(), Some("restore_requested"));
    }
}
