use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::config::SecurityConfig;
use crate::core::database::conflict_on_unique;
use crate::core::error::{AppError, Result};
use crate::features::audit::{Actor, AuditAction, AuditService};
use crate::features::users::dtos::{
    DeactivateAccountResponseDto, UpdateProfileDto, UserProfileDto,
};
use crate::features::users::models::{AccountStatus, UserProfile};
use crate::modules::storage::{avatar_key, ObjectStore};
use crate::shared::security::{codes_match, lockout_active, PinOutcome};

/// Profile, PIN and account lifecycle for signed-in users
pub struct UserProfileService {
    pool: PgPool,
    storage: Arc<dyn ObjectStore>,
    audit: Arc<AuditService>,
    security: SecurityConfig,
}

impl UserProfileService {
    pub fn new(
        pool: PgPool,
        storage: Arc<dyn ObjectStore>,
        audit: Arc<AuditService>,
        security: SecurityConfig,
    ) -> Self {
        Self {
            pool,
            storage,
            audit,
            security,
        }
    }

    async fn fetch(&self, user_id: Uuid) -> Result<UserProfile> {
        sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User profile not found".to_string()))
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<UserProfileDto> {
        Ok(self.fetch(user_id).await?.into())
    }

    /// Apply the fields present in `dto`
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        dto: UpdateProfileDto,
    ) -> Result<UserProfileDto> {
        let before = self.fetch(user_id).await?;

        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            UPDATE user_profiles
            SET username = COALESCE($2, username),
                phone = COALESCE($3, phone),
                website = COALESCE($4, website),
                address = COALESCE($5, address),
                account_status = COALESCE($6, account_status),
                last_updated = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(dto.username.as_deref().map(str::trim))
        .bind(dto.phone.as_deref().map(str::trim))
        .bind(dto.website.as_deref())
        .bind(dto.address.as_deref())
        .bind(dto.account_status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Username already taken"))?;

        if profile.account_status != before.account_status {
            info!(
                "Account status changed: user={}, {} -> {}",
                user_id, before.account_status, profile.account_status
            );
            self.audit
                .record(
                    Actor::user(user_id),
                    AuditAction::AccountStatusChanged,
                    None,
                    Some(profile.account_status.to_string()),
                )
                .await;
        }

        Ok(profile.into())
    }

    /// Store a new avatar and drop the previous object
    pub async fn upload_avatar(
        &self,
        user_id: Uuid,
        data: Vec<u8>,
        file_name: &str,
        content_type: &str,
    ) -> Result<UserProfileDto> {
        if !content_type.starts_with("image/") {
            return Err(AppError::BadRequest(
                "Avatar must be an image".to_string(),
            ));
        }

        let before = self.fetch(user_id).await?;
        let key = avatar_key(user_id, file_name);
        self.storage.upload(&key, &data, content_type).await?;

        let profile = sqlx::query_as::<_, UserProfile>(
            "UPDATE user_profiles SET avatar = $2, last_updated = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(user_id)
        .bind(&key)
        .fetch_one(&self.pool)
        .await?;

        if let Some(old) = before.avatar.filter(|old| *old != key) {
            if let Err(e) = self.storage.delete(&old).await {
                warn!("Failed to remove previous avatar {}: {}", old, e);
            }
        }

        info!("Avatar updated: user={}", user_id);
        Ok(profile.into())
    }

    pub async fn set_pin(&self, user_id: Uuid, pin: &str) -> Result<UserProfileDto> {
        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            UPDATE user_profiles
            SET pin = $2, pin_attempts = 0, last_pin_attempt = NULL, last_updated = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(pin)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User profile not found".to_string()))?;

        info!("Access PIN set: user={}", user_id);
        Ok(profile.into())
    }

    fn lockout(&self) -> Duration {
        Duration::from_std(self.security.pin_lockout).unwrap_or_else(|_| Duration::hours(24))
    }

    /// PIN-gated account deactivation with a lockout after repeated failures
    pub async fn deactivate_account(
        &self,
        user_id: Uuid,
        pin: &str,
    ) -> Result<DeactivateAccountResponseDto> {
        let profile = self.fetch(user_id).await?;
        let stored_pin = profile
            .pin
            .as_deref()
            .ok_or_else(|| AppError::BadRequest("No access PIN has been set".to_string()))?;

        let now = Utc::now();
        let max_attempts = self.security.max_pin_attempts;
        if lockout_active(
            profile.pin_attempts,
            profile.last_pin_attempt,
            max_attempts,
            self.lockout(),
            now,
        ) {
            let until = locked_until(profile.last_pin_attempt, self.lockout(), now);
            return Err(AppError::RateLimitExceeded(format!(
                "Too many wrong PINs. Try again after {}",
                until.format("%Y-%m-%d %H:%M UTC")
            )));
        }

        if codes_match(stored_pin.trim(), pin) {
            sqlx::query(
                r#"
                UPDATE user_profiles
                SET account_status = 'inactive', pin_attempts = 0, last_updated = NOW()
                WHERE id = $1
                "#,
            )
            .bind(user_id)
            .execute(&self.pool)
            .await?;

            info!("Account deactivated: user={}", user_id);
            self.audit
                .record(
                    Actor::user(user_id),
                    AuditAction::AccountDeactivated,
                    None,
                    None,
                )
                .await;

            return Ok(DeactivateAccountResponseDto {
                deactivated: true,
                remaining_attempts: None,
                locked_until: None,
            });
        }

        // A counter left at the limit by an expired lockout starts over
        let failures = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE user_profiles
            SET pin_attempts = CASE WHEN pin_attempts >= $2 THEN 1 ELSE pin_attempts + 1 END,
                last_pin_attempt = NOW()
            WHERE id = $1
            RETURNING pin_attempts
            "#,
        )
        .bind(user_id)
        .bind(max_attempts)
        .fetch_one(&self.pool)
        .await?;

        match PinOutcome::evaluate(false, failures - 1, max_attempts) {
            PinOutcome::Denied { remaining } => Ok(DeactivateAccountResponseDto {
                deactivated: false,
                remaining_attempts: Some(remaining),
                locked_until: None,
            }),
            _ => {
                warn!("Account PIN locked: user={}", user_id);
                Ok(DeactivateAccountResponseDto {
                    deactivated: false,
                    remaining_attempts: Some(0),
                    locked_until: Some(now + self.lockout()),
                })
            }
        }
    }

    /// All accounts, for the admin panel
    pub async fn list_users(&self, offset: i64, limit: i64) -> Result<(Vec<UserProfileDto>, i64)> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM user_profiles")
            .fetch_one(&self.pool)
            .await?;

        let profiles = sqlx::query_as::<_, UserProfile>(
            "SELECT * FROM user_profiles ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((profiles.into_iter().map(Into::into).collect(), total))
    }

    /// Administrative status change
    pub async fn set_account_status(
        &self,
        admin_id: Uuid,
        user_id: Uuid,
        status: AccountStatus,
    ) -> Result<UserProfileDto> {
        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            UPDATE user_profiles
            SET account_status = $2, last_updated = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        info!(
            "Account status set by admin: user={}, status={}, admin={}",
            user_id, status, admin_id
        );
        self.audit
            .record(
                Actor::admin(admin_id),
                AuditAction::AccountStatusChanged,
                None,
                Some(format!("user {} -> {}", user_id, status)),
            )
            .await;

        Ok(profile.into())
    }
}

fn locked_until(
    last_attempt: Option<DateTime<Utc>>,
    lockout: Duration,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    last_attempt.unwrap_or(now) + lockout
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locked_until_counts_from_last_attempt() {
        let now = Utc::now();
        let last = now - Duration::hours(3);
        assert_eq!(
            locked_until(Some(last), Duration::hours(24), now),
            last + Duration::hours(24)
        );
        assert_eq!(locked_until(None, Duration::hours(24), now), now + Duration::hours(24));
    }
}
