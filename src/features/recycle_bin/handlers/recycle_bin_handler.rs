use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::auth::guards::RequireUser;
use crate::features::files::dtos::VerifyOtpDto;
use crate::features::recycle_bin::dtos::{
    PurgeResponseDto, RecycleBinEntryDto, RestoreOutcomeDto, RestoreStatusDto,
};
use crate::features::recycle_bin::services::RecycleBinService;
use crate::shared::types::{ApiResponse, PaginationQuery};

/// List the caller's recycle bin
#[utoipa::path(
    get,
    path = "/api/recycle-bin",
    tag = "recycle-bin",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Recycle bin entries", body = ApiResponse<Vec<RecycleBinEntryDto>>),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_bin(
    RequireUser(user): RequireUser,
    State(service): State<Arc<RecycleBinService>>,
    Query(params): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<RecycleBinEntryDto>>>> {
    let (items, total) = service.list_bin(user.id, &params).await?;
    Ok(Json(ApiResponse::paginated(items, total)))
}

/// Ask an administrator to restore a file
#[utoipa::path(
    post,
    path = "/api/recycle-bin/{id}/restore-request",
    tag = "recycle-bin",
    params(("id" = Uuid, Path, description = "Recycle bin entry ID")),
    responses(
        (status = 200, description = "Restore requested", body = ApiResponse<RestoreStatusDto>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Entry not found"),
        (status = 409, description = "A restore is already pending or approved")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn request_restore(
    RequireUser(user): RequireUser,
    State(service): State<Arc<RecycleBinService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RestoreStatusDto>>> {
    let status = service.request_restore(user.id, id).await?;
    Ok(Json(ApiResponse::success(
        Some(status),
        Some("Restore requested".to_string()),
        None,
    )))
}

/// Confirm a restore with the emailed code
///
/// A wrong or expired code permanently deletes the file.
#[utoipa::path(
    post,
    path = "/api/recycle-bin/{id}/confirm",
    tag = "recycle-bin",
    params(("id" = Uuid, Path, description = "Recycle bin entry ID")),
    request_body = VerifyOtpDto,
    responses(
        (status = 200, description = "Code checked", body = ApiResponse<RestoreOutcomeDto>),
        (status = 400, description = "Code is not 6 digits"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Entry not found"),
        (status = 409, description = "Restore has not been approved")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn confirm_restore(
    RequireUser(user): RequireUser,
    State(service): State<Arc<RecycleBinService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<VerifyOtpDto>,
) -> Result<Json<ApiResponse<RestoreOutcomeDto>>> {
    dto.validate()?;

    let outcome = service.confirm_restore(user.id, id, &dto.otp).await?;
    let message = if outcome.restored {
        "File restored"
    } else {
        "Invalid or expired code, the file has been permanently deleted"
    };

    Ok(Json(ApiResponse::success(
        Some(outcome),
        Some(message.to_string()),
        None,
    )))
}

/// Permanently delete a file from the recycle bin
#[utoipa::path(
    delete,
    path = "/api/recycle-bin/{id}",
    tag = "recycle-bin",
    params(("id" = Uuid, Path, description = "Recycle bin entry ID")),
    responses(
        (status = 200, description = "File permanently deleted", body = ApiResponse<PurgeResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Entry not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn purge(
    RequireUser(user): RequireUser,
    State(service): State<Arc<RecycleBinService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<PurgeResponseDto>>> {
    let result = service.purge(user.id, id).await?;
    Ok(Json(ApiResponse::success(
        Some(result),
        Some("File permanently deleted".to_string()),
        None,
    )))
}
