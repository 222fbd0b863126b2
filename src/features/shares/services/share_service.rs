use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use sqlx::PgPool;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::config::SecurityConfig;
use crate::core::database::conflict_on_unique;
use crate::core::error::{AppError, Result};
use crate::features::access_tokens::AccessTokenService;
use crate::features::audit::{Actor, AuditAction, AuditService};
use crate::features::files::models::{File, FileStatus};
use crate::features::files::FileService;
use crate::features::shares::dtos::{
    IncomingShareDto, OutgoingShareDto, ShareCandidateDto, ShareFileDto, ShareFileResponseDto,
    ShareRecipientResultDto, ShareRemovedDto, SharedAccessDto,
};
use crate::features::shares::models::{FileShare, IncomingShareRow, OutgoingShareRow, RecipientRow};
use crate::modules::email::Mailer;
use crate::shared::constants::MAX_ACCESS_TOKEN_TTL_SECS;
use crate::shared::security::{codes_match, PinOutcome};
use crate::shared::types::PaginationQuery;

/// Why a recipient was skipped before any write
fn precheck_recipient(
    recipient_id: Uuid,
    owner_id: Uuid,
    known: &HashSet<Uuid>,
    already_shared: &HashSet<Uuid>,
) -> Option<&'static str> {
    if recipient_id == owner_id {
        Some("Cannot share a file with yourself")
    } else if !known.contains(&recipient_id) {
        Some("User not found")
    } else if already_shared.contains(&recipient_id) {
        Some("File is already shared with this user")
    } else {
        None
    }
}

/// Dedupe while keeping the caller's order
fn unique_recipients(recipients: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    recipients
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect()
}

/// File sharing between users, gated by a per-share PIN
pub struct ShareService {
    pool: PgPool,
    files: Arc<FileService>,
    tokens: Arc<AccessTokenService>,
    mailer: Arc<Mailer>,
    audit: Arc<AuditService>,
    security: SecurityConfig,
}

impl ShareService {
    pub fn new(
        pool: PgPool,
        files: Arc<FileService>,
        tokens: Arc<AccessTokenService>,
        mailer: Arc<Mailer>,
        audit: Arc<AuditService>,
        security: SecurityConfig,
    ) -> Self {
        Self {
            pool,
            files,
            tokens,
            mailer,
            audit,
            security,
        }
    }

    /// Share an active file with several users at once. Recipients are processed
    /// concurrently and failures are reported per recipient.
    pub async fn share_file(
        &self,
        owner_id: Uuid,
        file_id: Uuid,
        dto: ShareFileDto,
    ) -> Result<ShareFileResponseDto> {
        let file = self.files.find_owned(owner_id, file_id).await?;
        if file.status != FileStatus::Active {
            return Err(AppError::Conflict(format!(
                "File is {} and cannot be shared",
                file.status
            )));
        }

        let now = Utc::now();
        if dto.expires_at <= now {
            return Err(AppError::Validation(
                "Share expiry must be in the future".to_string(),
            ));
        }
        if dto.expires_at - now > Duration::seconds(MAX_ACCESS_TOKEN_TTL_SECS) {
            return Err(AppError::Validation(
                "Shares may last at most 30 days".to_string(),
            ));
        }

        let recipients = unique_recipients(&dto.recipients);

        let sender =
            sqlx::query_scalar::<_, String>("SELECT username FROM user_profiles WHERE id = $1")
                .bind(owner_id)
                .fetch_one(&self.pool)
                .await?;

        let users = sqlx::query_as::<_, RecipientRow>(
            "SELECT id, username, email FROM user_profiles WHERE id = ANY($1)",
        )
        .bind(&recipients)
        .fetch_all(&self.pool)
        .await?;

        let already_shared: HashSet<Uuid> = sqlx::query_scalar::<_, Uuid>(
            "SELECT shared_with_user_id FROM file_shares WHERE file_id = $1 AND shared_with_user_id = ANY($2)",
        )
        .bind(file.id)
        .bind(&recipients)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .collect();

        let known: HashSet<Uuid> = users.iter().map(|u| u.id).collect();

        let mut results = Vec::with_capacity(recipients.len());
        let mut pending = Vec::new();
        for recipient_id in &recipients {
            match precheck_recipient(*recipient_id, owner_id, &known, &already_shared) {
                Some(reason) => {
                    results.push(ShareRecipientResultDto::failed(*recipient_id, reason))
                }
                None => {
                    if let Some(user) = users.iter().find(|u| u.id == *recipient_id) {
                        pending.push(user);
                    }
                }
            }
        }

        let outcomes = join_all(
            pending
                .into_iter()
                .map(|user| self.share_with(&file, user, &dto.pin, dto.expires_at, &sender)),
        )
        .await;
        results.extend(outcomes);

        let response = ShareFileResponseDto {
            file_id: file.id,
            expires_at: dto.expires_at,
            results,
        };
        info!(
            "File shared: id={}, recipients={}, succeeded={}",
            file.id,
            recipients.len(),
            response.shared_count()
        );

        Ok(response)
    }

    /// Token, share row, then invitation for one recipient
    async fn share_with(
        &self,
        file: &File,
        recipient: &RecipientRow,
        pin: &str,
        expires_at: DateTime<Utc>,
        sender: &str,
    ) -> ShareRecipientResultDto {
        let owner = Actor::user(file.user_id);
        let ttl = expires_at - Utc::now();

        let access = match self.tokens.issue(file.id, recipient.id, ttl, owner).await {
            Ok(access) => access,
            Err(e) => {
                warn!("Token issue failed for share {} -> {}: {}", file.id, recipient.id, e);
                return ShareRecipientResultDto::failed(
                    recipient.id,
                    "Could not issue access token",
                );
            }
        };

        let inserted = sqlx::query(
            r#"
            INSERT INTO file_shares (file_id, shared_with_user_id, pin, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(file.id)
        .bind(recipient.id)
        .bind(pin)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "File is already shared with this user"));

        if let Err(e) = inserted {
            // Only this call's token; a concurrent share may already hold a live one
            if let Err(revoke_err) = self.tokens.revoke_token(&access.token).await {
                warn!("Failed to revoke token after share insert failure: {}", revoke_err);
            }
            let reason = match e {
                AppError::Conflict(msg) => msg,
                other => {
                    warn!("Share insert failed for {} -> {}: {}", file.id, recipient.id, other);
                    "Could not save share".to_string()
                }
            };
            return ShareRecipientResultDto::failed(recipient.id, reason);
        }

        self.audit
            .record(
                owner,
                AuditAction::FileShared,
                Some(file.id),
                Some(format!("with user {}", recipient.id)),
            )
            .await;

        let link = self.mailer.share_link(file.id, &access.token);
        let notified = match self
            .mailer
            .send_invite(&recipient.email, sender, &file.file_name, &link, expires_at)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!("Invite email failed for share {} -> {}: {}", file.id, recipient.id, e);
                false
            }
        };

        ShareRecipientResultDto {
            user_id: recipient.id,
            shared: true,
            notified,
            error: (!notified).then(|| "Invitation email could not be sent".to_string()),
        }
    }

    /// Live shares addressed to the caller
    pub async fn list_shared_with_me(
        &self,
        user_id: Uuid,
        params: &PaginationQuery,
    ) -> Result<(Vec<IncomingShareDto>, i64)> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM file_shares s
            JOIN files f ON f.id = s.file_id
            WHERE s.shared_with_user_id = $1 AND s.expires_at > NOW() AND f.status = 'active'
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, IncomingShareRow>(
            r#"
            SELECT
                f.id AS file_id,
                f.file_name,
                f.content_type,
                f.file_size,
                o.id AS owner_id,
                o.username AS owner_username,
                o.email AS owner_email,
                s.expires_at,
                s.created_at
            FROM file_shares s
            JOIN files f ON f.id = s.file_id
            JOIN user_profiles o ON o.id = f.user_id
            WHERE s.shared_with_user_id = $1 AND s.expires_at > NOW() AND f.status = 'active'
            ORDER BY s.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    async fn find_share(&self, file_id: Uuid, user_id: Uuid) -> Result<FileShare> {
        sqlx::query_as::<_, FileShare>(
            "SELECT * FROM file_shares WHERE file_id = $1 AND shared_with_user_id = $2",
        )
        .bind(file_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("File is not shared with you".to_string()))
    }

    /// Recipient enters the share PIN. The attempt that reaches the limit removes the share.
    pub async fn verify_shared_pin(
        &self,
        user_id: Uuid,
        file_id: Uuid,
        pin: &str,
    ) -> Result<SharedAccessDto> {
        let share = self.find_share(file_id, user_id).await?;
        let now = Utc::now();
        if share.is_expired(now) {
            return Err(AppError::Forbidden("Share has expired".to_string()));
        }

        let file = self.files.fetch_file(file_id).await?;
        if file.status != FileStatus::Active {
            return Err(AppError::Conflict(format!(
                "File is {} and cannot be accessed",
                file.status
            )));
        }

        if codes_match(share.pin.trim(), pin) {
            sqlx::query("UPDATE file_shares SET pin_attempts = 0 WHERE id = $1")
                .bind(share.id)
                .execute(&self.pool)
                .await?;

            let ttl = self.tokens.resolve_ttl(None)?.min(share.expires_at - now);
            let access = self
                .tokens
                .issue(file.id, user_id, ttl, Actor::user(user_id))
                .await?;

            return Ok(SharedAccessDto {
                granted: true,
                remaining_attempts: None,
                share_removed: false,
                access: Some(access),
            });
        }

        let failures = sqlx::query_scalar::<_, i32>(
            "UPDATE file_shares SET pin_attempts = pin_attempts + 1 WHERE id = $1 RETURNING pin_attempts",
        )
        .bind(share.id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("File is not shared with you".to_string()))?;

        self.audit
            .record(
                Actor::user(user_id),
                AuditAction::SharedPinFailed,
                Some(file.id),
                Some(format!("attempt {}", failures)),
            )
            .await;

        match PinOutcome::evaluate(false, failures - 1, self.security.max_pin_attempts) {
            PinOutcome::Denied { remaining } => Ok(SharedAccessDto {
                granted: false,
                remaining_attempts: Some(remaining),
                share_removed: false,
                access: None,
            }),
            _ => {
                self.remove_share(file.id, user_id, Actor::user(user_id)).await?;
                warn!(
                    "Share removed after repeated wrong PINs: file={}, user={}",
                    file.id, user_id
                );
                Ok(SharedAccessDto {
                    granted: false,
                    remaining_attempts: Some(0),
                    share_removed: true,
                    access: None,
                })
            }
        }
    }

    /// Delete the share and revoke the recipient's tokens for the file
    async fn remove_share(&self, file_id: Uuid, user_id: Uuid, actor: Actor) -> Result<bool> {
        let removed = sqlx::query(
            "DELETE FROM file_shares WHERE file_id = $1 AND shared_with_user_id = $2",
        )
        .bind(file_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if removed.rows_affected() == 0 {
            return Ok(false);
        }

        self.tokens.revoke_for_file(file_id, Some(user_id)).await?;
        self.audit
            .record(
                actor,
                AuditAction::ShareRemoved,
                Some(file_id),
                Some(format!("user {}", user_id)),
            )
            .await;

        Ok(true)
    }

    /// Recipient drops a share
    pub async fn leave_share(&self, user_id: Uuid, file_id: Uuid) -> Result<ShareRemovedDto> {
        if !self.remove_share(file_id, user_id, Actor::user(user_id)).await? {
            return Err(AppError::NotFound("File is not shared with you".to_string()));
        }

        info!("Share left: file={}, user={}", file_id, user_id);
        Ok(ShareRemovedDto {
            file_id,
            user_id,
            removed: true,
        })
    }

    /// Recipients of one of the caller's files
    pub async fn list_file_shares(
        &self,
        owner_id: Uuid,
        file_id: Uuid,
    ) -> Result<Vec<OutgoingShareDto>> {
        let file = self.files.find_owned(owner_id, file_id).await?;

        let rows = sqlx::query_as::<_, OutgoingShareRow>(
            r#"
            SELECT s.shared_with_user_id, u.username, u.email, s.expires_at, s.created_at
            FROM file_shares s
            JOIN user_profiles u ON u.id = s.shared_with_user_id
            WHERE s.file_id = $1
            ORDER BY s.created_at DESC
            "#,
        )
        .bind(file.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Owner withdraws a share
    pub async fn revoke_share(
        &self,
        owner_id: Uuid,
        file_id: Uuid,
        user_id: Uuid,
    ) -> Result<ShareRemovedDto> {
        let file = self.files.find_owned(owner_id, file_id).await?;

        if !self.remove_share(file.id, user_id, Actor::user(owner_id)).await? {
            return Err(AppError::NotFound(
                "File is not shared with this user".to_string(),
            ));
        }

        info!("Share revoked: file={}, user={}", file.id, user_id);
        Ok(ShareRemovedDto {
            file_id: file.id,
            user_id,
            removed: true,
        })
    }

    /// Users the file could still be shared with
    pub async fn list_share_candidates(
        &self,
        owner_id: Uuid,
        file_id: Uuid,
        search: Option<&str>,
    ) -> Result<Vec<ShareCandidateDto>> {
        let file = self.files.find_owned(owner_id, file_id).await?;
        let search = search.map(str::trim).filter(|s| !s.is_empty());

        let rows = sqlx::query_as::<_, RecipientRow>(
            r#"
            SELECT u.id, u.username, u.email
            FROM user_profiles u
            WHERE u.id <> $1
              AND NOT EXISTS (
                  SELECT 1 FROM file_shares s
                  WHERE s.file_id = $2 AND s.shared_with_user_id = u.id
              )
              AND ($3::text IS NULL
                   OR u.username ILIKE '%' || $3 || '%'
                   OR u.id::text ILIKE '%' || $3 || '%')
            ORDER BY u.username
            LIMIT 50
            "#,
        )
        .bind(owner_id)
        .bind(file.id)
        .bind(search)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::TestServices;

    #[test]
    fn test_unique_recipients_keeps_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(unique_recipients(&[a, b, a, b, a]), vec![a, b]);
    }

    #[test]
    fn test_precheck_recipient() {
        let owner = Uuid::new_v4();
        let known_user = Uuid::new_v4();
        let shared_user = Uuid::new_v4();
        let known: HashSet<Uuid> = [owner, known_user, shared_user].into_iter().collect();
        let shared: HashSet<Uuid> = [shared_user].into_iter().collect();

        assert_eq!(precheck_recipient(known_user, owner, &known, &shared), None);
        assert_eq!(
            precheck_recipient(owner, owner, &known, &shared),
            Some("Cannot share a file with yourself")
        );
        assert_eq!(
            precheck_recipient(Uuid::new_v4(), owner, &known, &shared),
            Some("User not found")
        );
        assert_eq!(
            precheck_recipient(shared_user, owner, &known, &shared),
            Some("File is already shared with this user")
        );
    }

    async fn share_one(svc: &TestServices, owner: Uuid, file_id: Uuid, recipient: Uuid) {
        let dto = ShareFileDto {
            recipients: vec![recipient],
            pin: "654321".to_string(),
            expires_at: Utc::now() + Duration::days(1),
        };
        let response = svc.shares.share_file(owner, file_id, dto).await.unwrap();
        assert_eq!(response.shared_count(), 1);
    }

    async fn live_tokens(pool: &PgPool, file_id: Uuid, user_id: Uuid) -> Vec<String> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT token FROM file_access_tokens
            WHERE file_id = $1 AND user_id = $2 AND revoked_at IS NULL
            "#,
        )
        .bind(file_id)
        .bind(user_id)
        .fetch_all(pool)
        .await
        .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_share_issues_token_and_sends_invite(pool: PgPool) {
        let svc = TestServices::new(pool);
        let owner = svc.user(Some("482913")).await;
        let recipient = svc.user(None).await;
        let file_id = svc.upload(owner).await;

        share_one(&svc, owner, file_id, recipient).await;

        let tokens = live_tokens(&svc.pool, file_id, recipient).await;
        assert_eq!(tokens.len(), 1);
        let sent = svc.sender.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].html.contains(&urlencoding::encode(&tokens[0]).to_string()));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_third_wrong_shared_pin_removes_share(pool: PgPool) {
        let svc = TestServices::new(pool);
        let owner = svc.user(Some("482913")).await;
        let recipient = svc.user(None).await;
        let file_id = svc.upload(owner).await;
        share_one(&svc, owner, file_id, recipient).await;

        let first = svc.shares.verify_shared_pin(recipient, file_id, "000000").await.unwrap();
        assert_eq!(first.remaining_attempts, Some(2));
        assert!(!first.share_removed);

        let second = svc.shares.verify_shared_pin(recipient, file_id, "000000").await.unwrap();
        assert_eq!(second.remaining_attempts, Some(1));

        let third = svc.shares.verify_shared_pin(recipient, file_id, "000000").await.unwrap();
        assert!(third.share_removed);
        assert_eq!(third.remaining_attempts, Some(0));

        let shares = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM file_shares WHERE file_id = $1 AND shared_with_user_id = $2",
        )
        .bind(file_id)
        .bind(recipient)
        .fetch_one(&svc.pool)
        .await
        .unwrap();
        assert_eq!(shares, 0);
        assert!(live_tokens(&svc.pool, file_id, recipient).await.is_empty());

        let after = svc.shares.verify_shared_pin(recipient, file_id, "654321").await;
        assert!(matches!(after, Err(AppError::NotFound(_))));
        assert_eq!(svc.file_status(file_id).await.as_deref(), Some("active"));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_correct_shared_pin_grants_access(pool: PgPool) {
        let svc = TestServices::new(pool);
        let owner = svc.user(Some("482913")).await;
        let recipient = svc.user(None).await;
        let file_id = svc.upload(owner).await;
        share_one(&svc, owner, file_id, recipient).await;

        let granted = svc.shares.verify_shared_pin(recipient, file_id, "654321").await.unwrap();
        let token = granted.access.unwrap().token;
        let (_, data) = svc.files.download(recipient, file_id, &token).await.unwrap();
        assert_eq!(data, b"quarterly numbers");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_losing_duplicate_share_keeps_existing_token(pool: PgPool) {
        let svc = TestServices::new(pool);
        let owner = svc.user(Some("482913")).await;
        let recipient_id = svc.user(None).await;
        let file_id = svc.upload(owner).await;
        share_one(&svc, owner, file_id, recipient_id).await;
        let existing = live_tokens(&svc.pool, file_id, recipient_id).await;

        // A concurrent call that passed the precheck before the first insert landed
        let file = svc.files.fetch_file(file_id).await.unwrap();
        let recipient = RecipientRow {
            id: recipient_id,
            username: "racer".to_string(),
            email: "racer@example.com".to_string(),
        };
        let result = svc
            .shares
            .share_with(&file, &recipient, "111111", Utc::now() + Duration::hours(1), "owner")
            .await;

        assert!(!result.shared);
        assert_eq!(
            result.error.as_deref(),
            Some("File is already shared with this user")
        );
        assert_eq!(live_tokens(&svc.pool, file_id, recipient_id).await, existing);
        assert!(svc.tokens.validate(&existing[0]).await.is_ok());
    }
}
