use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::admin::dtos::*;
use crate::features::admin::services::AdminService;
use crate::features::audit::dtos::AuditLogDto;
use crate::features::auth::dtos::SignInRequestDto;
use crate::features::auth::guards::{RequireAdmin, RequirePrimaryAdmin, RequireSeniorAdmin};
use crate::features::files::dtos::UnblockRequestedDto;
use crate::features::recycle_bin::dtos::{RecycleBinEntryDto, RestoreStatusDto};
use crate::features::users::dtos::UserProfileDto;
use crate::shared::types::{ApiResponse, PaginationQuery};

// =============================================================================
// AUTH
// =============================================================================

/// Sign in as an administrator
#[utoipa::path(
    post,
    path = "/api/admin/auth/sign-in",
    request_body = SignInRequestDto,
    responses(
        (status = 200, description = "Sign-in successful", body = ApiResponse<AdminSessionResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "admin"
)]
pub async fn sign_in(
    State(service): State<Arc<AdminService>>,
    AppJson(dto): AppJson<SignInRequestDto>,
) -> Result<Json<ApiResponse<AdminSessionResponseDto>>> {
    dto.validate()?;

    let session = service.sign_in(dto).await?;
    Ok(Json(ApiResponse::success(Some(session), None, None)))
}

// =============================================================================
// ADMIN ACCOUNTS
// =============================================================================

/// List all administrators (primary admin only)
#[utoipa::path(
    get,
    path = "/api/admin/admins",
    tag = "admin",
    responses(
        (status = 200, description = "Admins retrieved successfully", body = ApiResponse<Vec<AdminDto>>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Primary admin role required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_admins(
    RequirePrimaryAdmin(_admin): RequirePrimaryAdmin,
    State(service): State<Arc<AdminService>>,
) -> Result<Json<ApiResponse<Vec<AdminDto>>>> {
    let admins = service.list_admins().await?;
    Ok(Json(ApiResponse::success(Some(admins), None, None)))
}

/// Create an administrator (primary admin only)
#[utoipa::path(
    post,
    path = "/api/admin/admins",
    tag = "admin",
    request_body = CreateAdminDto,
    responses(
        (status = 201, description = "Admin created successfully", body = ApiResponse<AdminDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Primary admin role required"),
        (status = 409, description = "Email or username already used")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_admin(
    RequirePrimaryAdmin(admin): RequirePrimaryAdmin,
    State(service): State<Arc<AdminService>>,
    AppJson(dto): AppJson<CreateAdminDto>,
) -> Result<(StatusCode, Json<ApiResponse<AdminDto>>)> {
    dto.validate()?;

    let created = service.create_admin(admin.id, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(created),
            Some("Admin created successfully".to_string()),
            None,
        )),
    ))
}

/// Update an administrator (primary admin only)
#[utoipa::path(
    patch,
    path = "/api/admin/admins/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Admin ID")),
    request_body = UpdateAdminDto,
    responses(
        (status = 200, description = "Admin updated successfully", body = ApiResponse<AdminDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Primary admin role required"),
        (status = 404, description = "Admin not found"),
        (status = 409, description = "Email or username already used")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_admin(
    RequirePrimaryAdmin(admin): RequirePrimaryAdmin,
    State(service): State<Arc<AdminService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateAdminDto>,
) -> Result<Json<ApiResponse<AdminDto>>> {
    dto.validate()?;

    let updated = service.update_admin(admin.id, id, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(updated),
        Some("Admin updated successfully".to_string()),
        None,
    )))
}

/// Delete an administrator (primary admin only, never self)
#[utoipa::path(
    delete,
    path = "/api/admin/admins/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Admin ID")),
    responses(
        (status = 200, description = "Admin deleted successfully", body = ApiResponse<AdminDeletedDto>),
        (status = 400, description = "Cannot delete own account"),
        (status = 403, description = "Primary admin role required"),
        (status = 404, description = "Admin not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_admin(
    RequirePrimaryAdmin(admin): RequirePrimaryAdmin,
    State(service): State<Arc<AdminService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AdminDeletedDto>>> {
    let deleted = service.delete_admin(admin.id, id).await?;
    Ok(Json(ApiResponse::success(Some(deleted), None, None)))
}

// =============================================================================
// RESTORE QUEUE
// =============================================================================

/// List recycle bin entries waiting for an admin decision
#[utoipa::path(
    get,
    path = "/api/admin/restore-requests",
    tag = "admin",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Restore requests retrieved successfully", body = ApiResponse<Vec<RecycleBinEntryDto>>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Admin role required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_restore_requests(
    RequireAdmin(_admin, _role): RequireAdmin,
    State(service): State<Arc<AdminService>>,
    Query(params): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<RecycleBinEntryDto>>>> {
    let (entries, total) = service.list_restore_requests(&params).await?;
    Ok(Json(ApiResponse::paginated(entries, total)))
}

/// Approve a restore request and email the owner a confirmation OTP
#[utoipa::path(
    post,
    path = "/api/admin/restore-requests/{id}/approve",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Recycle bin entry ID")),
    responses(
        (status = 200, description = "Restore approved", body = ApiResponse<RestoreStatusDto>),
        (status = 403, description = "Senior admin role required"),
        (status = 404, description = "Entry not found"),
        (status = 409, description = "No pending restore request"),
        (status = 502, description = "OTP email could not be sent")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn approve_restore(
    RequireSeniorAdmin(admin): RequireSeniorAdmin,
    State(service): State<Arc<AdminService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RestoreStatusDto>>> {
    let status = service.approve_restore(admin.id, id).await?;
    Ok(Json(ApiResponse::success(
        Some(status),
        Some("Restore approved, OTP sent to the owner".to_string()),
        None,
    )))
}

/// Reject a restore request
#[utoipa::path(
    post,
    path = "/api/admin/restore-requests/{id}/reject",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Recycle bin entry ID")),
    responses(
        (status = 200, description = "Restore rejected", body = ApiResponse<RestoreStatusDto>),
        (status = 403, description = "Senior admin role required"),
        (status = 404, description = "Entry not found"),
        (status = 409, description = "No pending restore request")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn reject_restore(
    RequireSeniorAdmin(admin): RequireSeniorAdmin,
    State(service): State<Arc<AdminService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RestoreStatusDto>>> {
    let status = service.reject_restore(admin.id, id).await?;
    Ok(Json(ApiResponse::success(Some(status), None, None)))
}

// =============================================================================
// BLOCKED FILES
// =============================================================================

/// List files that are or were blocked after failed PIN attempts
#[utoipa::path(
    get,
    path = "/api/admin/blocked-files",
    tag = "admin",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Blocked files retrieved successfully", body = ApiResponse<Vec<BlockedFileDto>>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Admin role required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_blocked_files(
    RequireAdmin(_admin, _role): RequireAdmin,
    State(service): State<Arc<AdminService>>,
    Query(params): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<BlockedFileDto>>>> {
    let (files, total) = service.list_blocked_files(&params).await?;
    Ok(Json(ApiResponse::paginated(files, total)))
}

/// Send the owner of a blocked file an unblock OTP
#[utoipa::path(
    post,
    path = "/api/admin/blocked-files/{id}/unblock",
    tag = "admin",
    params(("id" = Uuid, Path, description = "File ID")),
    responses(
        (status = 200, description = "Unblock OTP sent", body = ApiResponse<UnblockRequestedDto>),
        (status = 403, description = "Senior admin role required"),
        (status = 404, description = "File not found"),
        (status = 409, description = "File is not blocked"),
        (status = 502, description = "OTP email could not be sent")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn unblock_file(
    RequireSeniorAdmin(admin): RequireSeniorAdmin,
    State(service): State<Arc<AdminService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UnblockRequestedDto>>> {
    let requested = service.unblock_file(admin.id, id).await?;
    Ok(Json(ApiResponse::success(
        Some(requested),
        Some("Unblock OTP sent to the owner".to_string()),
        None,
    )))
}

// =============================================================================
// AUDIT AND USERS
// =============================================================================

/// Read the audit trail, newest first
#[utoipa::path(
    get,
    path = "/api/admin/audit-logs",
    tag = "admin",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Audit entries retrieved successfully", body = ApiResponse<Vec<AuditLogDto>>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Admin role required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_audit_logs(
    RequireAdmin(_admin, _role): RequireAdmin,
    State(service): State<Arc<AdminService>>,
    Query(params): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<AuditLogDto>>>> {
    let (entries, total) = service.list_audit_logs(&params).await?;
    Ok(Json(ApiResponse::paginated(entries, total)))
}

/// List user accounts
#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "admin",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Users retrieved successfully", body = ApiResponse<Vec<UserProfileDto>>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Admin role required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_users(
    RequireAdmin(_admin, _role): RequireAdmin,
    State(service): State<Arc<AdminService>>,
    Query(params): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<UserProfileDto>>>> {
    let (users, total) = service.list_users(&params).await?;
    Ok(Json(ApiResponse::paginated(users, total)))
}

/// Activate or deactivate a user account
#[utoipa::path(
    patch,
    path = "/api/admin/users/{id}/status",
    tag = "admin",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateAccountStatusDto,
    responses(
        (status = 200, description = "Account status updated", body = ApiResponse<UserProfileDto>),
        (status = 403, description = "Senior admin role required"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn set_user_status(
    RequireSeniorAdmin(admin): RequireSeniorAdmin,
    State(service): State<Arc<AdminService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateAccountStatusDto>,
) -> Result<Json<ApiResponse<UserProfileDto>>> {
    let profile = service
        .set_user_status(admin.id, id, dto.account_status)
        .await?;
    Ok(Json(ApiResponse::success(Some(profile), None, None)))
}
