use chrono::{Duration, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::core::config::AccessTokenConfig;
use crate::core::error::{AppError, Result};
use crate::features::access_tokens::codec::{invalid_token, AccessTokenCodec};
use crate::features::access_tokens::dtos::{IssueTokenDto, IssuedTokenDto};
use crate::features::access_tokens::models::AccessTokenRow;
use crate::features::access_tokens::ttl::{parse_ttl, TtlInput};
use crate::features::audit::{Actor, AuditAction, AuditService};
use crate::features::files::models::{File, FileStatus};
use crate::features::shares::models::FileShare;

/// Issues, validates and revokes file access tokens
pub struct AccessTokenService {
    pool: PgPool,
    codec: AccessTokenCodec,
    default_ttl: TtlInput,
    audit: Arc<AuditService>,
}

impl AccessTokenService {
    pub fn new(pool: PgPool, config: &AccessTokenConfig, audit: Arc<AuditService>) -> Self {
        Self {
            pool,
            codec: AccessTokenCodec::new(&config.secret),
            default_ttl: TtlInput::Text(config.default_ttl.clone()),
            audit,
        }
    }

    /// Requested TTL, or the configured default
    pub fn resolve_ttl(&self, requested: Option<&TtlInput>) -> Result<Duration> {
        parse_ttl(requested.unwrap_or(&self.default_ttl))
    }

    /// Sign a token for `(file_id, user_id)` and persist it
    pub async fn issue(
        &self,
        file_id: Uuid,
        user_id: Uuid,
        ttl: Duration,
        issued_by: Actor,
    ) -> Result<IssuedTokenDto> {
        let (token, expires_at) = self.codec.encode(file_id, user_id, ttl, Utc::now())?;

        sqlx::query(
            r#"
            INSERT INTO file_access_tokens (token, file_id, user_id, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&token)
        .bind(file_id)
        .bind(user_id)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        info!(
            "Access token issued: file_id={}, user_id={}, expires_at={}",
            file_id, user_id, expires_at
        );
        self.audit
            .record(
                issued_by,
                AuditAction::TokenIssued,
                Some(file_id),
                Some(format!("for user {}", user_id)),
            )
            .await;

        Ok(IssuedTokenDto {
            token,
            file_id,
            user_id,
            expires_at,
        })
    }

    /// `POST /api/tokens`: the owner issues a token for themself or for a share recipient
    pub async fn issue_on_request(
        &self,
        caller_id: Uuid,
        dto: IssueTokenDto,
    ) -> Result<IssuedTokenDto> {
        let file = sqlx::query_as::<_, File>("SELECT * FROM files WHERE id = $1")
            .bind(dto.file_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        if !file.is_owned_by(caller_id) {
            return Err(AppError::Forbidden(
                "Only the owner can issue tokens for this file".to_string(),
            ));
        }
        if file.status != FileStatus::Active {
            return Err(AppError::Conflict(format!(
                "File is {} and cannot be accessed",
                file.status
            )));
        }

        let mut ttl = self.resolve_ttl(dto.ttl.as_ref())?;
        let target = dto.user_id.unwrap_or(caller_id);

        if target != caller_id {
            let share = sqlx::query_as::<_, FileShare>(
                "SELECT * FROM file_shares WHERE file_id = $1 AND shared_with_user_id = $2",
            )
            .bind(file.id)
            .bind(target)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                AppError::Forbidden("File is not shared with this user".to_string())
            })?;

            let now = Utc::now();
            if share.is_expired(now) {
                return Err(AppError::Forbidden("Share has expired".to_string()));
            }
            ttl = ttl.min(share.expires_at - now);
        }

        self.issue(file.id, target, ttl, Actor::user(caller_id)).await
    }

    /// Check signature, expiry and the stored row. Returns `(file_id, user_id)`.
    pub async fn validate(&self, token: &str) -> Result<(Uuid, Uuid)> {
        let claims = self.codec.decode(token)?;

        let row = sqlx::query_as::<_, AccessTokenRow>(
            r#"
            SELECT * FROM file_access_tokens
            WHERE token = $1 AND revoked_at IS NULL AND expires_at > NOW()
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(invalid_token)?;

        if row.file_id != claims.file_id || row.user_id != claims.user_id {
            return Err(invalid_token());
        }

        Ok((row.file_id, row.user_id))
    }

    /// Revoke a single token. Returns whether it was still live.
    pub async fn revoke_token(&self, token: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE file_access_tokens
            SET revoked_at = NOW()
            WHERE token = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Revoke outstanding tokens for a file, optionally only those of one user
    pub async fn revoke_for_file(&self, file_id: Uuid, user_id: Option<Uuid>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE file_access_tokens
            SET revoked_at = NOW()
            WHERE file_id = $1
              AND revoked_at IS NULL
              AND ($2::uuid IS NULL OR user_id = $2)
            "#,
        )
        .bind(file_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            info!(
                "Revoked {} access token(s) for file_id={}",
                result.rows_affected(),
                file_id
            );
        }

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::TestServices;

    #[sqlx::test(migrations = "./migrations")]
    async fn test_revoke_token_leaves_siblings_live(pool: PgPool) {
        let svc = TestServices::new(pool);
        let owner = svc.user(Some("482913")).await;
        let file_id = svc.upload(owner).await;

        let ttl = Duration::minutes(5);
        let first = svc.tokens.issue(file_id, owner, ttl, Actor::user(owner)).await.unwrap();
        let second = svc.tokens.issue(file_id, owner, ttl, Actor::user(owner)).await.unwrap();

        assert!(svc.tokens.revoke_token(&first.token).await.unwrap());
        assert!(!svc.tokens.revoke_token(&first.token).await.unwrap());

        assert!(svc.tokens.validate(&first.token).await.is_err());
        assert_eq!(svc.tokens.validate(&second.token).await.unwrap(), (file_id, owner));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_negative_millis_ttl_rejected_on_request(pool: PgPool) {
        let svc = TestServices::new(pool);
        let owner = svc.user(Some("482913")).await;
        let file_id = svc.upload(owner).await;

        let result = svc
            .tokens
            .issue_on_request(
                owner,
                IssueTokenDto {
                    file_id,
                    user_id: None,
                    ttl: Some(TtlInput::Millis(i64::MIN)),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
