use chrono::{Duration, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::config::{AppConfig, SecurityConfig};
use crate::core::error::{AppError, Result};
use crate::features::access_tokens::AccessTokenService;
use crate::features::audit::{Actor, AuditAction, AuditService};
use crate::features::files::dtos::{
    AccessGrantDto, DeleteFileResponseDto, FileResponseDto, ScanStatusDto, ScanSubmittedDto,
    UnblockRequestedDto,
};
use crate::features::files::models::{File, FileStatus};
use crate::modules::email::Mailer;
use crate::modules::scanner::ScanPipeline;
use crate::modules::storage::{file_key, sanitize_file_name, ObjectStore};
use crate::shared::security::{codes_match, generate_otp, OtpOutcome, PinOutcome};
use crate::shared::templates::OtpPurpose;
use crate::shared::types::PaginationQuery;

/// Upload pipeline, PIN/OTP gate, soft delete and download
pub struct FileService {
    pool: PgPool,
    storage: Arc<dyn ObjectStore>,
    scanner: ScanPipeline,
    mailer: Arc<Mailer>,
    tokens: Arc<AccessTokenService>,
    audit: Arc<AuditService>,
    security: SecurityConfig,
    max_file_size: usize,
}

impl FileService {
    pub fn new(
        pool: PgPool,
        storage: Arc<dyn ObjectStore>,
        scanner: ScanPipeline,
        mailer: Arc<Mailer>,
        tokens: Arc<AccessTokenService>,
        audit: Arc<AuditService>,
        security: SecurityConfig,
    ) -> Self {
        Self {
            pool,
            storage,
            scanner,
            mailer,
            tokens,
            audit,
            security,
            max_file_size: AppConfig::DEFAULT_MAX_FILE_SIZE,
        }
    }

    pub fn with_max_file_size(mut self, max_file_size: usize) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    pub async fn fetch_file(&self, file_id: Uuid) -> Result<File> {
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE id = $1")
            .bind(file_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))
    }

    /// Load a file and check that `owner_id` owns it
    pub async fn find_owned(&self, owner_id: Uuid, file_id: Uuid) -> Result<File> {
        let file = self.fetch_file(file_id).await?;
        if !file.is_owned_by(owner_id) {
            return Err(AppError::Forbidden(
                "You do not have access to this file".to_string(),
            ));
        }
        Ok(file)
    }

    // =========================================================================
    // UPLOAD AND SCAN
    // =========================================================================

    /// Scan, store and register a new file
    pub async fn upload_file(
        &self,
        owner_id: Uuid,
        data: Vec<u8>,
        file_name: &str,
        content_type: &str,
    ) -> Result<FileResponseDto> {
        let file_name = sanitize_file_name(file_name);
        let file_size = data.len() as i64;

        let scan_id = self.scanner.scan(&file_name, data.clone()).await?;

        let key = file_key(owner_id, &file_name);
        self.storage.upload(&key, &data, content_type).await?;

        let inserted = sqlx::query_as::<_, File>(
            r#"
            INSERT INTO files (user_id, file_name, file_key, content_type, file_size, scan_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(owner_id)
        .bind(&file_name)
        .bind(&key)
        .bind(content_type)
        .bind(file_size)
        .bind(&scan_id)
        .fetch_one(&self.pool)
        .await;

        let file = match inserted {
            Ok(file) => file,
            Err(e) => {
                self.discard_object(&key).await;
                return Err(e.into());
            }
        };

        info!(
            "File uploaded: id={}, owner={}, size={}",
            file.id, owner_id, file_size
        );
        self.audit
            .record(
                Actor::user(owner_id),
                AuditAction::FileUploaded,
                Some(file.id),
                Some(file.file_name.clone()),
            )
            .await;

        Ok(file.into())
    }

    /// Swap the content of an active file after a clean scan
    pub async fn replace_file(
        &self,
        owner_id: Uuid,
        file_id: Uuid,
        data: Vec<u8>,
        file_name: &str,
        content_type: &str,
    ) -> Result<FileResponseDto> {
        let current = self.find_owned(owner_id, file_id).await?;
        if current.status != FileStatus::Active {
            return Err(AppError::Conflict(format!(
                "Only active files can be replaced (file is {})",
                current.status
            )));
        }

        let file_name = sanitize_file_name(file_name);
        let file_size = data.len() as i64;
        let scan_id = self.scanner.scan(&file_name, data.clone()).await?;

        let key = file_key(owner_id, &file_name);
        self.storage.upload(&key, &data, content_type).await?;

        let updated = sqlx::query_as::<_, File>(
            r#"
            UPDATE files
            SET file_name = $2, file_key = $3, content_type = $4, file_size = $5,
                scan_id = $6, updated_at = NOW()
            WHERE id = $1 AND status = 'active'
            RETURNING *
            "#,
        )
        .bind(file_id)
        .bind(&file_name)
        .bind(&key)
        .bind(content_type)
        .bind(file_size)
        .bind(&scan_id)
        .fetch_optional(&self.pool)
        .await;

        let file = match updated {
            Ok(Some(file)) => file,
            Ok(None) => {
                self.discard_object(&key).await;
                return Err(AppError::Conflict(
                    "File changed state during replacement".to_string(),
                ));
            }
            Err(e) => {
                self.discard_object(&key).await;
                return Err(e.into());
            }
        };

        if current.file_key != key {
            self.discard_object(&current.file_key).await;
        }

        info!("File replaced: id={}, size={}", file.id, file_size);
        self.audit
            .record(
                Actor::user(owner_id),
                AuditAction::FileReplaced,
                Some(file.id),
                Some(format!("{} -> {}", current.file_name, file.file_name)),
            )
            .await;

        Ok(file.into())
    }

    pub async fn start_scan(&self, file_name: &str, data: Vec<u8>) -> Result<ScanSubmittedDto> {
        let scan_id = self
            .scanner
            .submit(&sanitize_file_name(file_name), data)
            .await?;
        Ok(ScanSubmittedDto { scan_id })
    }

    pub async fn check_scan(&self, scan_id: &str) -> Result<ScanStatusDto> {
        let analysis = self.scanner.analysis(scan_id).await?;
        Ok(ScanStatusDto::new(scan_id.to_string(), analysis))
    }

    // =========================================================================
    // LIBRARY
    // =========================================================================

    /// Owner's files that are not in the recycle bin, newest first
    pub async fn list_library(
        &self,
        owner_id: Uuid,
        params: &PaginationQuery,
    ) -> Result<(Vec<FileResponseDto>, i64)> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM files WHERE user_id = $1 AND status <> 'deleted'",
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        let files = sqlx::query_as::<_, File>(
            r#"
            SELECT * FROM files
            WHERE user_id = $1 AND status <> 'deleted'
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(owner_id)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((files.into_iter().map(Into::into).collect(), total))
    }

    pub async fn get_file(&self, owner_id: Uuid, file_id: Uuid) -> Result<FileResponseDto> {
        let file = self.find_owned(owner_id, file_id).await?;
        if !file.status.in_library() {
            return Err(AppError::NotFound(
                "File is in the recycle bin".to_string(),
            ));
        }
        Ok(file.into())
    }

    // =========================================================================
    // PIN / OTP GATE
    // =========================================================================

    /// Check the owner's PIN before opening a file
    pub async fn verify_pin(
        &self,
        owner_id: Uuid,
        file_id: Uuid,
        pin: &str,
    ) -> Result<AccessGrantDto> {
        let file = self.find_owned(owner_id, file_id).await?;
        if !file.status.accepts_pin() {
            return Err(AppError::Conflict(format!(
                "File is {} and does not accept a PIN",
                file.status
            )));
        }

        let stored_pin = sqlx::query_scalar::<_, Option<String>>(
            "SELECT pin FROM user_profiles WHERE id = $1",
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?
        .flatten()
        .ok_or_else(|| {
            AppError::BadRequest("Set an access PIN before opening files".to_string())
        })?;

        if codes_match(stored_pin.trim(), pin) {
            sqlx::query("UPDATE files SET pin_attempts = 0 WHERE id = $1")
                .bind(file.id)
                .execute(&self.pool)
                .await?;

            let ttl = self.tokens.resolve_ttl(None)?;
            let access = self
                .tokens
                .issue(file.id, owner_id, ttl, Actor::user(owner_id))
                .await?;
            return Ok(AccessGrantDto::granted(FileStatus::Active, access));
        }

        self.record_pin_failure(&file, owner_id).await
    }

    /// Count a wrong PIN; the attempt that reaches the limit blocks the file
    async fn record_pin_failure(&self, file: &File, owner_id: Uuid) -> Result<AccessGrantDto> {
        let failures = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE files
            SET pin_attempts = pin_attempts + 1, last_pin_attempt = NOW()
            WHERE id = $1 AND status = 'active'
            RETURNING pin_attempts
            "#,
        )
        .bind(file.id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::Conflict("File is no longer active".to_string()))?;

        self.audit
            .record(
                Actor::user(owner_id),
                AuditAction::PinFailed,
                Some(file.id),
                Some(format!("attempt {}", failures)),
            )
            .await;

        match PinOutcome::evaluate(false, failures - 1, self.security.max_pin_attempts) {
            PinOutcome::Denied { remaining } => {
                Ok(AccessGrantDto::denied(FileStatus::Active, Some(remaining)))
            }
            _ => {
                let blocked = sqlx::query(
                    r#"
                    UPDATE files
                    SET status = 'blocked', pin_attempts = 0, updated_at = NOW()
                    WHERE id = $1 AND status = 'active'
                    "#,
                )
                .bind(file.id)
                .execute(&self.pool)
                .await?;

                if blocked.rows_affected() > 0 {
                    self.tokens.revoke_for_file(file.id, None).await?;
                    warn!("File blocked after repeated wrong PINs: id={}", file.id);
                    self.audit
                        .record(
                            Actor::user(owner_id),
                            AuditAction::FileBlocked,
                            Some(file.id),
                            None,
                        )
                        .await;
                }

                Ok(AccessGrantDto::denied(FileStatus::Blocked, Some(0)))
            }
        }
    }

    /// Owner asks for an unblock code
    pub async fn request_unblock(
        &self,
        owner_id: Uuid,
        file_id: Uuid,
    ) -> Result<UnblockRequestedDto> {
        let file = self.find_owned(owner_id, file_id).await?;
        self.send_unblock_otp(file, Actor::user(owner_id)).await
    }

    /// An administrator sends the unblock code to the owner of any blocked file
    pub async fn admin_request_unblock(
        &self,
        admin_id: Uuid,
        file_id: Uuid,
    ) -> Result<UnblockRequestedDto> {
        let file = self.fetch_file(file_id).await?;
        self.send_unblock_otp(file, Actor::admin(admin_id)).await
    }

    async fn send_unblock_otp(&self, file: File, actor: Actor) -> Result<UnblockRequestedDto> {
        if !file.status.can_request_unblock() {
            return Err(AppError::Conflict(format!(
                "File is {} and cannot be unblocked",
                file.status
            )));
        }

        let owner_email =
            sqlx::query_scalar::<_, String>("SELECT email FROM user_profiles WHERE id = $1")
                .bind(file.user_id)
                .fetch_one(&self.pool)
                .await?;

        let otp = generate_otp();
        let expires_at = Utc::now() + self.otp_ttl();

        // Nothing is stored unless the owner actually received the code
        self.mailer
            .send_otp(
                &owner_email,
                OtpPurpose::Unblock,
                &file.file_name,
                &self.mailer.file_link(file.id),
                &otp,
            )
            .await?;

        let updated = sqlx::query(
            r#"
            UPDATE files
            SET status = 'otp_sent', unblock_otp = $2, unblock_otp_expiry = $3, updated_at = NOW()
            WHERE id = $1 AND status IN ('blocked', 'otp_sent')
            "#,
        )
        .bind(file.id)
        .bind(&otp)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::Conflict(
                "File changed state while sending the code".to_string(),
            ));
        }

        info!("Unblock OTP sent: file_id={}", file.id);
        self.audit
            .record(actor, AuditAction::UnblockOtpSent, Some(file.id), None)
            .await;

        Ok(UnblockRequestedDto {
            file_id: file.id,
            status: FileStatus::OtpSent,
            otp_expires_at: expires_at,
        })
    }

    /// Confirm the unblock code. A wrong or expired code sends the file to the recycle bin.
    pub async fn verify_unblock_otp(
        &self,
        owner_id: Uuid,
        file_id: Uuid,
        otp: &str,
    ) -> Result<AccessGrantDto> {
        let file = self.find_owned(owner_id, file_id).await?;
        if file.status != FileStatus::OtpSent {
            return Err(AppError::Conflict(format!(
                "File is {} and has no pending unblock code",
                file.status
            )));
        }

        let outcome = OtpOutcome::check(
            file.unblock_otp.as_deref(),
            file.unblock_otp_expiry,
            otp,
            Utc::now(),
        );

        if outcome.is_valid() {
            let unblocked = sqlx::query(
                r#"
                UPDATE files
                SET status = 'active', unblock_otp = NULL, unblock_otp_expiry = NULL,
                    pin_attempts = 0, updated_at = NOW()
                WHERE id = $1 AND status = 'otp_sent' AND unblock_otp = $2
                "#,
            )
            .bind(file.id)
            .bind(file.unblock_otp.as_deref())
            .execute(&self.pool)
            .await?;

            if unblocked.rows_affected() == 0 {
                return Err(AppError::Conflict("Code has already been used".to_string()));
            }

            info!("File unblocked: id={}", file.id);
            self.audit
                .record(
                    Actor::user(owner_id),
                    AuditAction::FileUnblocked,
                    Some(file.id),
                    None,
                )
                .await;

            let ttl = self.tokens.resolve_ttl(None)?;
            let access = self
                .tokens
                .issue(file.id, owner_id, ttl, Actor::user(owner_id))
                .await?;
            return Ok(AccessGrantDto::granted(FileStatus::Active, access));
        }

        self.move_to_bin(file.id, FileStatus::OtpSent).await?;
        warn!(
            "Unblock failed ({:?}), file moved to recycle bin: id={}",
            outcome, file.id
        );
        self.audit
            .record(
                Actor::user(owner_id),
                AuditAction::UnblockFailed,
                Some(file.id),
                Some(format!("{:?}", outcome).to_lowercase()),
            )
            .await;

        Ok(AccessGrantDto::denied(FileStatus::Deleted, None))
    }

    // =========================================================================
    // DELETE AND DOWNLOAD
    // =========================================================================

    /// Soft delete into the recycle bin
    pub async fn delete_file(
        &self,
        owner_id: Uuid,
        file_id: Uuid,
    ) -> Result<DeleteFileResponseDto> {
        let file = self.find_owned(owner_id, file_id).await?;
        if file.status == FileStatus::Deleted {
            return Err(AppError::Conflict(
                "File is already in the recycle bin".to_string(),
            ));
        }

        let recycle_bin_id = self.move_to_bin(file.id, file.status).await?;

        info!("File moved to recycle bin: id={}", file.id);
        self.audit
            .record(
                Actor::user(owner_id),
                AuditAction::FileDeleted,
                Some(file.id),
                Some(file.file_name),
            )
            .await;

        Ok(DeleteFileResponseDto {
            deleted: true,
            recycle_bin_id,
        })
    }

    /// Mark the file deleted and open its recycle-bin entry in one transaction.
    /// Outstanding access tokens are revoked afterwards.
    async fn move_to_bin(&self, file_id: Uuid, expected: FileStatus) -> Result<Uuid> {
        let mut tx = self.pool.begin().await?;

        let moved = sqlx::query(
            r#"
            UPDATE files
            SET status = 'deleted', unblock_otp = NULL, unblock_otp_expiry = NULL,
                pin_attempts = 0, updated_at = NOW()
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(file_id)
        .bind(expected)
        .execute(&mut *tx)
        .await?;

        if moved.rows_affected() == 0 {
            return Err(AppError::Conflict(
                "File changed state, try again".to_string(),
            ));
        }

        let entry_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO recycle_bin (file_id) VALUES ($1) RETURNING id",
        )
        .bind(file_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        self.tokens.revoke_for_file(file_id, None).await?;
        Ok(entry_id)
    }

    /// Fetch the bytes of an active file with a token issued to the caller for it
    pub async fn download(
        &self,
        user_id: Uuid,
        file_id: Uuid,
        token: &str,
    ) -> Result<(File, Vec<u8>)> {
        let (token_file, token_user) = self.tokens.validate(token).await?;
        if token_file != file_id || token_user != user_id {
            return Err(AppError::Forbidden(
                "Token was not issued to you for this file".to_string(),
            ));
        }

        let file = self.fetch_file(file_id).await?;
        if file.status != FileStatus::Active {
            return Err(AppError::Conflict(format!(
                "File is {} and cannot be downloaded",
                file.status
            )));
        }

        let data = self.storage.download(&file.file_key).await?;
        info!("File downloaded: id={}, by={}", file.id, user_id);

        Ok((file, data))
    }

    /// Remove the stored object and the row. Shares, tokens and the bin entry cascade.
    pub async fn destroy(&self, file: &File) -> Result<()> {
        self.storage.delete(&file.file_key).await?;

        sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(file.id)
            .execute(&self.pool)
            .await?;

        info!("File permanently deleted: id={}", file.id);
        Ok(())
    }

    pub fn otp_ttl(&self) -> Duration {
        Duration::from_std(self.security.otp_ttl).unwrap_or_else(|_| Duration::minutes(10))
    }

    async fn discard_object(&self, key: &str) {
        if let Err(e) = self.storage.delete(key).await {
            warn!("Failed to remove orphaned object {}: {}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::TestServices;

    async fn unblock_otp(pool: &PgPool, file_id: Uuid) -> Option<String> {
        sqlx::query_scalar::<_, Option<String>>("SELECT unblock_otp FROM files WHERE id = $1")
            .bind(file_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn block(svc: &TestServices, owner: Uuid, file_id: Uuid) {
        for _ in 0..3 {
            svc.files.verify_pin(owner, file_id, "000000").await.unwrap();
        }
    }

    fn wrong_code(code: &str) -> &'static str {
        if code == "111111" {
            "222222"
        } else {
            "111111"
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_third_wrong_pin_blocks_file_and_revokes_tokens(pool: PgPool) {
        let svc = TestServices::new(pool);
        let owner = svc.user(Some("482913")).await;
        let file_id = svc.upload(owner).await;

        let granted = svc.files.verify_pin(owner, file_id, "482913").await.unwrap();
        let token = granted.access.unwrap().token;
        assert!(svc.tokens.validate(&token).await.is_ok());

        let first = svc.files.verify_pin(owner, file_id, "000000").await.unwrap();
        assert!(!first.granted);
        assert_eq!(first.remaining_attempts, Some(2));

        let second = svc.files.verify_pin(owner, file_id, "000000").await.unwrap();
        assert_eq!(second.remaining_attempts, Some(1));
        assert_eq!(svc.file_status(file_id).await.as_deref(), Some("active"));

        let third = svc.files.verify_pin(owner, file_id, "000000").await.unwrap();
        assert_eq!(third.status, FileStatus::Blocked);
        assert_eq!(third.remaining_attempts, Some(0));

        let file = svc.files.fetch_file(file_id).await.unwrap();
        assert_eq!(file.status, FileStatus::Blocked);
        assert_eq!(file.pin_attempts, 0);
        assert!(svc.tokens.validate(&token).await.is_err());

        let after = svc.files.verify_pin(owner, file_id, "482913").await;
        assert!(matches!(after, Err(AppError::Conflict(_))));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_correct_pin_resets_failure_count(pool: PgPool) {
        let svc = TestServices::new(pool);
        let owner = svc.user(Some("482913")).await;
        let file_id = svc.upload(owner).await;

        svc.files.verify_pin(owner, file_id, "000000").await.unwrap();
        svc.files.verify_pin(owner, file_id, "000000").await.unwrap();
        assert!(svc.files.verify_pin(owner, file_id, "482913").await.unwrap().granted);

        let next = svc.files.verify_pin(owner, file_id, "000000").await.unwrap();
        assert_eq!(next.remaining_attempts, Some(2));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_wrong_unblock_otp_moves_file_to_bin(pool: PgPool) {
        let svc = TestServices::new(pool);
        let owner = svc.user(Some("482913")).await;
        let file_id = svc.upload(owner).await;
        block(&svc, owner, file_id).await;

        let sent = svc.files.request_unblock(owner, file_id).await.unwrap();
        assert_eq!(sent.status, FileStatus::OtpSent);
        assert_eq!(svc.sender.sent.lock().unwrap().len(), 1);

        let otp = unblock_otp(&svc.pool, file_id).await.unwrap();
        let result = svc
            .files
            .verify_unblock_otp(owner, file_id, wrong_code(&otp))
            .await
            .unwrap();

        assert!(!result.granted);
        assert_eq!(result.status, FileStatus::Deleted);
        assert_eq!(svc.file_status(file_id).await.as_deref(), Some("deleted"));
        assert_eq!(unblock_otp(&svc.pool, file_id).await, None);
        assert_eq!(svc.bin_status(file_id).await.as_deref(), Some("deleted"));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_expired_unblock_otp_moves_file_to_bin(pool: PgPool) {
        let svc = TestServices::new(pool);
        let owner = svc.user(Some("482913")).await;
        let file_id = svc.upload(owner).await;
        block(&svc, owner, file_id).await;
        svc.files.request_unblock(owner, file_id).await.unwrap();

        sqlx::query(
            "UPDATE files SET unblock_otp_expiry = NOW() - INTERVAL '1 minute' WHERE id = $1",
        )
        .bind(file_id)
        .execute(&svc.pool)
        .await
        .unwrap();

        let otp = unblock_otp(&svc.pool, file_id).await.unwrap();
        let result = svc.files.verify_unblock_otp(owner, file_id, &otp).await.unwrap();

        assert_eq!(result.status, FileStatus::Deleted);
        assert_eq!(unblock_otp(&svc.pool, file_id).await, None);
        assert_eq!(svc.bin_status(file_id).await.as_deref(), Some("deleted"));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_correct_unblock_otp_reactivates_file(pool: PgPool) {
        let svc = TestServices::new(pool);
        let owner = svc.user(Some("482913")).await;
        let file_id = svc.upload(owner).await;
        block(&svc, owner, file_id).await;
        svc.files.request_unblock(owner, file_id).await.unwrap();

        let otp = unblock_otp(&svc.pool, file_id).await.unwrap();
        let result = svc.files.verify_unblock_otp(owner, file_id, &otp).await.unwrap();

        assert!(result.granted);
        assert_eq!(svc.file_status(file_id).await.as_deref(), Some("active"));
        assert_eq!(unblock_otp(&svc.pool, file_id).await, None);
        assert_eq!(svc.bin_status(file_id).await, None);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_soft_delete_writes_status_and_bin_row(pool: PgPool) {
        let svc = TestServices::new(pool);
        let owner = svc.user(Some("482913")).await;
        let file_id = svc.upload(owner).await;
        let token = svc
            .files
            .verify_pin(owner, file_id, "482913")
            .await
            .unwrap()
            .access
            .unwrap()
            .token;

        let deleted = svc.files.delete_file(owner, file_id).await.unwrap();
        assert!(deleted.deleted);

        let entry_id =
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM recycle_bin WHERE file_id = $1")
                .bind(file_id)
                .fetch_one(&svc.pool)
                .await
                .unwrap();
        assert_eq!(entry_id, deleted.recycle_bin_id);
        assert_eq!(svc.file_status(file_id).await.as_deref(), Some("deleted"));
        assert!(svc.tokens.validate(&token).await.is_err());

        let again = svc.files.delete_file(owner, file_id).await;
        assert!(matches!(again, Err(AppError::Conflict(_))));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_download_requires_token_for_caller(pool: PgPool) {
        let svc = TestServices::new(pool);
        let owner = svc.user(Some("482913")).await;
        let other = svc.user(None).await;
        let file_id = svc.upload(owner).await;

        let token = svc
            .files
            .verify_pin(owner, file_id, "482913")
            .await
            .unwrap()
            .access
            .unwrap()
            .token;

        let (file, data) = svc.files.download(owner, file_id, &token).await.unwrap();
        assert_eq!(data, b"quarterly numbers");
        assert!(svc.store.contains(&file.file_key));

        let stolen = svc.files.download(other, file_id, &token).await;
        assert!(matches!(stolen, Err(AppError::Forbidden(_))));
    }
}
