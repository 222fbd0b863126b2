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
use crate::features::auth::guards::RequireUser;
use crate::features::files::dtos::VerifyPinDto;
use crate::features::shares::dtos::{
    IncomingShareDto, OutgoingShareDto, ShareCandidateDto, ShareCandidatesQuery, ShareFileDto,
    ShareFileResponseDto, ShareRemovedDto, SharedAccessDto,
};
use crate::features::shares::services::ShareService;
use crate::shared::types::{ApiResponse, PaginationQuery};

/// Share a file with other users
///
/// Each recipient gets an access token, a share row and an invitation email.
/// Recipients are handled independently; the response lists the outcome of each.
#[utoipa::path(
    post,
    path = "/api/files/{id}/shares",
    tag = "shares",
    params(("id" = Uuid, Path, description = "File ID")),
    request_body = ShareFileDto,
    responses(
        (status = 201, description = "Share processed", body = ApiResponse<ShareFileResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "File not found"),
        (status = 409, description = "File is not active")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn share_file(
    RequireUser(user): RequireUser,
    State(service): State<Arc<ShareService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<ShareFileDto>,
) -> Result<(StatusCode, Json<ApiResponse<ShareFileResponseDto>>)> {
    dto.validate()?;

    let response = service.share_file(user.id, id, dto).await?;
    let message = format!(
        "Shared with {} of {} recipient(s)",
        response.shared_count(),
        response.results.len()
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(response), Some(message), None)),
    ))
}

/// List the recipients of a file
#[utoipa::path(
    get,
    path = "/api/files/{id}/shares",
    tag = "shares",
    params(("id" = Uuid, Path, description = "File ID")),
    responses(
        (status = 200, description = "Recipients", body = ApiResponse<Vec<OutgoingShareDto>>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_file_shares(
    RequireUser(user): RequireUser,
    State(service): State<Arc<ShareService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<OutgoingShareDto>>>> {
    let shares = service.list_file_shares(user.id, id).await?;
    Ok(Json(ApiResponse::success(Some(shares), None, None)))
}

/// Withdraw a share
#[utoipa::path(
    delete,
    path = "/api/files/{id}/shares/{user_id}",
    tag = "shares",
    params(
        ("id" = Uuid, Path, description = "File ID"),
        ("user_id" = Uuid, Path, description = "Recipient user ID")
    ),
    responses(
        (status = 200, description = "Share removed", body = ApiResponse<ShareRemovedDto>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "File or share not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn revoke_share(
    RequireUser(user): RequireUser,
    State(service): State<Arc<ShareService>>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<ShareRemovedDto>>> {
    let removed = service.revoke_share(user.id, id, user_id).await?;
    Ok(Json(ApiResponse::success(Some(removed), None, None)))
}

/// Users the file can still be shared with
#[utoipa::path(
    get,
    path = "/api/files/{id}/share-candidates",
    tag = "shares",
    params(("id" = Uuid, Path, description = "File ID"), ShareCandidatesQuery),
    responses(
        (status = 200, description = "Candidates", body = ApiResponse<Vec<ShareCandidateDto>>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_share_candidates(
    RequireUser(user): RequireUser,
    State(service): State<Arc<ShareService>>,
    Path(id): Path<Uuid>,
    Query(query): Query<ShareCandidatesQuery>,
) -> Result<Json<ApiResponse<Vec<ShareCandidateDto>>>> {
    let candidates = service
        .list_share_candidates(user.id, id, query.search.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(Some(candidates), None, None)))
}

/// Files shared with the caller
#[utoipa::path(
    get,
    path = "/api/shares",
    tag = "shares",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Incoming shares", body = ApiResponse<Vec<IncomingShareDto>>),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_shared_with_me(
    RequireUser(user): RequireUser,
    State(service): State<Arc<ShareService>>,
    Query(params): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<IncomingShareDto>>>> {
    let (items, total) = service.list_shared_with_me(user.id, &params).await?;
    Ok(Json(ApiResponse::paginated(items, total)))
}

/// Open a shared file with the share PIN
#[utoipa::path(
    post,
    path = "/api/shares/{file_id}/access",
    tag = "shares",
    params(("file_id" = Uuid, Path, description = "Shared file ID")),
    request_body = VerifyPinDto,
    responses(
        (status = 200, description = "PIN checked", body = ApiResponse<SharedAccessDto>),
        (status = 400, description = "PIN is not 6 digits"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Share has expired"),
        (status = 404, description = "File is not shared with the caller"),
        (status = 409, description = "File is not active")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn verify_shared_pin(
    RequireUser(user): RequireUser,
    State(service): State<Arc<ShareService>>,
    Path(file_id): Path<Uuid>,
    AppJson(dto): AppJson<VerifyPinDto>,
) -> Result<Json<ApiResponse<SharedAccessDto>>> {
    dto.validate()?;

    let access = service.verify_shared_pin(user.id, file_id, &dto.pin).await?;
    Ok(Json(ApiResponse::success(Some(access), None, None)))
}

/// Leave a share
#[utoipa::path(
    delete,
    path = "/api/shares/{file_id}",
    tag = "shares",
    params(("file_id" = Uuid, Path, description = "Shared file ID")),
    responses(
        (status = 200, description = "Share left", body = ApiResponse<ShareRemovedDto>),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "File is not shared with the caller")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn leave_share(
    RequireUser(user): RequireUser,
    State(service): State<Arc<ShareService>>,
    Path(file_id): Path<Uuid>,
) -> Result<Json<ApiResponse<ShareRemovedDto>>> {
    let removed = service.leave_share(user.id, file_id).await?;
    Ok(Json(ApiResponse::success(Some(removed), None, None)))
}
