use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::core::config::BootstrapAdminConfig;
use crate::core::database::conflict_on_unique;
use crate::core::error::{AppError, Result};
use crate::features::admin::dtos::*;
use crate::features::admin::models::{Admin, AdminRole};
use crate::features::audit::dtos::AuditLogDto;
use crate::features::audit::{Actor, AuditAction, AuditService};
use crate::features::auth::dtos::SignInRequestDto;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::password::{hash_password, verify_password};
use crate::features::auth::JwtValidator;
use crate::features::files::dtos::UnblockRequestedDto;
use crate::features::files::FileService;
use crate::features::recycle_bin::dtos::{RecycleBinEntryDto, RestoreStatusDto};
use crate::features::recycle_bin::RecycleBinService;
use crate::features::users::dtos::UserProfileDto;
use crate::features::users::models::AccountStatus;
use crate::features::users::UserProfileService;
use crate::shared::types::PaginationQuery;

/// Admin panel: admin accounts plus moderation over the other features
pub struct AdminService {
    pool: PgPool,
    validator: Arc<JwtValidator>,
    files: Arc<FileService>,
    recycle_bin: Arc<RecycleBinService>,
    users: Arc<UserProfileService>,
    audit: Arc<AuditService>,
}

impl AdminService {
    pub fn new(
        pool: PgPool,
        validator: Arc<JwtValidator>,
        files: Arc<FileService>,
        recycle_bin: Arc<RecycleBinService>,
        users: Arc<UserProfileService>,
        audit: Arc<AuditService>,
    ) -> Self {
        Self {
            pool,
            validator,
            files,
            recycle_bin,
            users,
            audit,
        }
    }

    // =========================================================================
    // AUTH
    // =========================================================================

    pub async fn sign_in(&self, dto: SignInRequestDto) -> Result<AdminSessionResponseDto> {
        let email = dto.email.trim().to_lowercase();

        let admin = sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE email = $1")
            .bind(&email)
            .fetch_optional(&self.pool)
            .await?;

        let admin = match admin {
            Some(a) if verify_password(&a.password_hash, &dto.password) => a,
            _ => return Err(AppError::Unauthorized("Invalid credentials".to_string())),
        };

        let principal = AuthenticatedUser::admin(admin.id, admin.email.clone(), admin.role);
        let session = self.validator.issue(&principal)?;

        info!("Admin signed in: id={}, role={}", admin.id, admin.role);

        Ok(AdminSessionResponseDto {
            access_token: session.token,
            token_type: "Bearer".to_string(),
            expires_at: session.expires_at,
            admin: admin.into(),
        })
    }

    /// Create the first primary admin from configuration when the table is empty
    pub async fn seed_bootstrap_admin(&self, config: &BootstrapAdminConfig) -> Result<()> {
        let Some((email, password)) = config.credentials() else {
            return Ok(());
        };

        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admins")
            .fetch_one(&self.pool)
            .await?;
        if count > 0 {
            return Ok(());
        }

        let email = email.trim().to_lowercase();
        let username = email.split('@').next().unwrap_or("admin").to_string();
        let password_hash = hash_password(password)?;

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO admins (username, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&username)
        .bind(&email)
        .bind(&password_hash)
        .bind(AdminRole::Admin)
        .fetch_one(&self.pool)
        .await?;

        info!("Bootstrap admin created: id={}, email={}", id, email);
        Ok(())
    }

    // =========================================================================
    // ADMIN ACCOUNTS
    // =========================================================================

    pub async fn list_admins(&self) -> Result<Vec<AdminDto>> {
        let admins = sqlx::query_as::<_, Admin>("SELECT * FROM admins ORDER BY assign_date DESC")
            .fetch_all(&self.pool)
            .await?;

        Ok(admins.into_iter().map(Into::into).collect())
    }

    pub async fn create_admin(&self, actor_id: Uuid, dto: CreateAdminDto) -> Result<AdminDto> {
        let email = dto.email.trim().to_lowercase();
        let username = dto.username.trim().to_string();

        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM admins WHERE email = $1 OR username = $2)",
        )
        .bind(&email)
        .bind(&username)
        .fetch_one(&self.pool)
        .await?;

        if taken {
            return Err(AppError::Conflict(
                "Email or username is already used by another admin".to_string(),
            ));
        }

        let password_hash = hash_password(&dto.password)?;

        let admin = sqlx::query_as::<_, Admin>(
            r#"
            INSERT INTO admins (username, email, password_hash, role, assign_date)
            VALUES ($1, $2, $3, $4, COALESCE($5, NOW()))
            RETURNING *
            "#,
        )
        .bind(&username)
        .bind(&email)
        .bind(&password_hash)
        .bind(dto.role)
        .bind(dto.assign_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Email or username is already used by another admin"))?;

        info!("Admin created: id={}, role={}", admin.id, admin.role);
        self.audit
            .record(
                Actor::admin(actor_id),
                AuditAction::AdminCreated,
                None,
                Some(format!("{} ({})", admin.username, admin.role)),
            )
            .await;

        Ok(admin.into())
    }

    pub async fn update_admin(
        &self,
        actor_id: Uuid,
        admin_id: Uuid,
        dto: UpdateAdminDto,
    ) -> Result<AdminDto> {
        let demotes = dto.role.is_some_and(|role| role != AdminRole::Admin);
        if demotes && actor_id == admin_id {
            return Err(AppError::BadRequest(
                "You cannot change your own role".to_string(),
            ));
        }

        let username = dto.username.as_deref().map(str::trim);
        let email = dto.email.as_deref().map(|e| e.trim().to_lowercase());

        if let Some(username) = username {
            let taken = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM admins WHERE username = $1 AND id <> $2)",
            )
            .bind(username)
            .bind(admin_id)
            .fetch_one(&self.pool)
            .await?;

            if taken {
                return Err(AppError::Conflict("Username is already taken".to_string()));
            }
        }

        let updated = sqlx::query_as::<_, Admin>(
            r#"
            UPDATE admins
            SET username = COALESCE($2, username),
                email = COALESCE($3, email),
                role = COALESCE($4, role),
                assign_date = COALESCE($5, assign_date)
            WHERE id = $1
              AND ($4::admin_role IS NULL
                   OR $4 = 'Admin'
                   OR role <> 'Admin'
                   OR EXISTS (SELECT 1 FROM admins WHERE role = 'Admin' AND id <> $1))
            RETURNING *
            "#,
        )
        .bind(admin_id)
        .bind(username)
        .bind(email)
        .bind(dto.role)
        .bind(dto.assign_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Email or username is already used by another admin"))?;

        let Some(admin) = updated else {
            let exists =
                sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM admins WHERE id = $1)")
                    .bind(admin_id)
                    .fetch_one(&self.pool)
                    .await?;

            // The row exists, so the demotion would have left no primary Admin
            return Err(if exists {
                AppError::Conflict("At least one Admin must remain".to_string())
            } else {
                AppError::NotFound("Admin not found".to_string())
            });
        };

        info!("Admin updated: id={}", admin.id);
        self.audit
            .record(
                Actor::admin(actor_id),
                AuditAction::AdminUpdated,
                None,
                Some(format!("{} ({})", admin.username, admin.role)),
            )
            .await;

        Ok(admin.into())
    }

    pub async fn delete_admin(&self, actor_id: Uuid, admin_id: Uuid) -> Result<AdminDeletedDto> {
        if actor_id == admin_id {
            return Err(AppError::BadRequest(
                "You cannot delete your own account".to_string(),
            ));
        }

        let username = sqlx::query_scalar::<_, String>(
            "DELETE FROM admins WHERE id = $1 RETURNING username",
        )
        .bind(admin_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Admin not found".to_string()))?;

        info!("Admin deleted: id={}", admin_id);
        self.audit
            .record(
                Actor::admin(actor_id),
                AuditAction::AdminDeleted,
                None,
                Some(username),
            )
            .await;

        Ok(AdminDeletedDto {
            id: admin_id,
            deleted: true,
        })
    }

    // =========================================================================
    // RESTORE QUEUE
    // =========================================================================

    pub async fn list_restore_requests(
        &self,
        params: &PaginationQuery,
    ) -> Result<(Vec<RecycleBinEntryDto>, i64)> {
        self.recycle_bin.list_restore_requests(params).await
    }

    pub async fn approve_restore(
        &self,
        admin_id: Uuid,
        entry_id: Uuid,
    ) -> Result<RestoreStatusDto> {
        self.recycle_bin.approve_restore(admin_id, entry_id).await
    }

    pub async fn reject_restore(&self, admin_id: Uuid, entry_id: Uuid) -> Result<RestoreStatusDto> {
        self.recycle_bin.reject_restore(admin_id, entry_id).await
    }

    // =========================================================================
    // BLOCKED FILES
    // =========================================================================

    /// Files currently locked, plus those that were locked at some point and have
    /// since been unblocked or sent to the recycle bin
    pub async fn list_blocked_files(
        &self,
        params: &PaginationQuery,
    ) -> Result<(Vec<BlockedFileDto>, i64)> {
        const FILTER: &str = r#"
            f.status IN ('blocked', 'otp_sent')
            OR EXISTS (
                SELECT 1 FROM audit_logs a
                WHERE a.file_id = f.id AND a.action = 'file_blocked'
            )
        "#;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM files f WHERE {FILTER}"
        ))
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, BlockedFileDto>(&format!(
            r#"
            SELECT
                f.id,
                f.file_name,
                u.id AS owner_id,
                u.username AS owner_username,
                u.email AS owner_email,
                f.status,
                f.updated_at
            FROM files f
            JOIN user_profiles u ON u.id = f.user_id
            WHERE {FILTER}
            ORDER BY f.updated_at DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    pub async fn unblock_file(&self, admin_id: Uuid, file_id: Uuid) -> Result<UnblockRequestedDto> {
        self.files.admin_request_unblock(admin_id, file_id).await
    }

    // =========================================================================
    // AUDIT AND USERS
    // =========================================================================

    pub async fn list_audit_logs(
        &self,
        params: &PaginationQuery,
    ) -> Result<(Vec<AuditLogDto>, i64)> {
        self.audit.list(params).await
    }

    pub async fn list_users(&self, params: &PaginationQuery) -> Result<(Vec<UserProfileDto>, i64)> {
        self.users.list_users(params.offset(), params.limit()).await
    }

    pub async fn set_user_status(
        &self,
        admin_id: Uuid,
        user_id: Uuid,
        status: AccountStatus,
    ) -> Result<UserProfileDto> {
        self.users.set_account_status(admin_id, user_id, status).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::TestServices;

    fn role_change(role: AdminRole) -> UpdateAdminDto {
        UpdateAdminDto {
            username: None,
            email: None,
            role: Some(role),
            assign_date: None,
        }
    }

    async fn role_of(pool: &PgPool, admin_id: Uuid) -> AdminRole {
        sqlx::query_scalar::<_, AdminRole>("SELECT role FROM admins WHERE id = $1")
            .bind(admin_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_admin_cannot_change_own_role(pool: PgPool) {
        let svc = TestServices::new(pool);
        let primary = svc.admin(AdminRole::Admin).await;

        let result = svc
            .admins
            .update_admin(primary, primary, role_change(AdminRole::JuniorAdmin))
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert_eq!(role_of(&svc.pool, primary).await, AdminRole::Admin);

        let renamed = svc
            .admins
            .update_admin(
                primary,
                primary,
                UpdateAdminDto {
                    username: Some("chief_admin".to_string()),
                    ..role_change(AdminRole::Admin)
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.username, "chief_admin");
        assert_eq!(renamed.role, AdminRole::Admin);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_demoting_another_admin_keeps_one_primary(pool: PgPool) {
        let svc = TestServices::new(pool);
        let primary = svc.admin(AdminRole::Admin).await;
        let other = svc.admin(AdminRole::Admin).await;

        let demoted = svc
            .admins
            .update_admin(primary, other, role_change(AdminRole::SeniorAdmin))
            .await
            .unwrap();
        assert_eq!(demoted.role, AdminRole::SeniorAdmin);

        // A session issued before the caller lost the Admin role
        sqlx::query("UPDATE admins SET role = 'Junior Admin' WHERE id = $1")
            .bind(primary)
            .execute(&svc.pool)
            .await
            .unwrap();
        sqlx::query("UPDATE admins SET role = 'Admin' WHERE id = $1")
            .bind(other)
            .execute(&svc.pool)
            .await
            .unwrap();

        let last = svc
            .admins
            .update_admin(primary, other, role_change(AdminRole::JuniorAdmin))
            .await;
        assert!(matches!(last, Err(AppError::Conflict(_))));
        assert_eq!(role_of(&svc.pool, other).await, AdminRole::Admin);

        let missing = svc
            .admins
            .update_admin(primary, Uuid::new_v4(), role_change(AdminRole::JuniorAdmin))
            .await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }
}
