use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::auth::guards::RequireUser;
use crate::features::files::dtos::UploadFileDto;
use crate::features::files::handlers::read_upload;
use crate::features::users::dtos::{
    DeactivateAccountDto, DeactivateAccountResponseDto, SetPinDto, UpdateProfileDto,
    UserProfileDto,
};
use crate::features::users::services::UserProfileService;
use crate::shared::types::ApiResponse;
use axum::{
    extract::{Multipart, State},
    Json,
};
use std::sync::Arc;
use validator::Validate;

/// Largest accepted avatar image
pub const MAX_AVATAR_SIZE: usize = 2 * 1024 * 1024;

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Profile retrieved successfully", body = ApiResponse<UserProfileDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_profile(
    RequireUser(user): RequireUser,
    State(service): State<Arc<UserProfileService>>,
) -> Result<Json<ApiResponse<UserProfileDto>>> {
    let profile = service.get_profile(user.id).await?;
    Ok(Json(ApiResponse::success(Some(profile), None, None)))
}

#[utoipa::path(
    patch,
    path = "/api/users/me",
    request_body = UpdateProfileDto,
    responses(
        (status = 200, description = "Profile updated successfully", body = ApiResponse<UserProfileDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Username already taken")
    ),
    tag = "users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_profile(
    RequireUser(user): RequireUser,
    State(service): State<Arc<UserProfileService>>,
    AppJson(dto): AppJson<UpdateProfileDto>,
) -> Result<Json<ApiResponse<UserProfileDto>>> {
    dto.validate()?;

    let profile = service.update_profile(user.id, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(profile),
        Some("Profile updated successfully".to_string()),
        None,
    )))
}

/// Upload a new avatar image
#[utoipa::path(
    post,
    path = "/api/users/me/avatar",
    request_body(
        content = UploadFileDto,
        content_type = "multipart/form-data",
    ),
    responses(
        (status = 200, description = "Avatar updated", body = ApiResponse<UserProfileDto>),
        (status = 400, description = "Missing file, too large or not an image"),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Storage unavailable")
    ),
    tag = "users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_avatar(
    RequireUser(user): RequireUser,
    State(service): State<Arc<UserProfileService>>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<UserProfileDto>>> {
    let upload = read_upload(multipart, MAX_AVATAR_SIZE).await?;

    let profile = service
        .upload_avatar(user.id, upload.data, &upload.file_name, &upload.content_type)
        .await?;
    Ok(Json(ApiResponse::success(Some(profile), None, None)))
}

/// Set or change the access PIN
#[utoipa::path(
    put,
    path = "/api/users/me/pin",
    request_body = SetPinDto,
    responses(
        (status = 200, description = "PIN updated", body = ApiResponse<UserProfileDto>),
        (status = 400, description = "PIN is not 6 digits or the confirmation differs"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn set_pin(
    RequireUser(user): RequireUser,
    State(service): State<Arc<UserProfileService>>,
    AppJson(dto): AppJson<SetPinDto>,
) -> Result<Json<ApiResponse<UserProfileDto>>> {
    dto.validate()?;

    let profile = service.set_pin(user.id, &dto.pin).await?;
    Ok(Json(ApiResponse::success(
        Some(profile),
        Some("PIN updated".to_string()),
        None,
    )))
}

/// Deactivate the account after confirming the PIN
///
/// Three wrong PINs lock deactivation for 24 hours.
#[utoipa::path(
    post,
    path = "/api/users/me/deactivate",
    request_body = DeactivateAccountDto,
    responses(
        (status = 200, description = "PIN checked", body = ApiResponse<DeactivateAccountResponseDto>),
        (status = 400, description = "PIN is not 6 digits or no PIN has been set"),
        (status = 401, description = "Unauthorized"),
        (status = 429, description = "Locked after too many wrong PINs")
    ),
    tag = "users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn deactivate_account(
    RequireUser(user): RequireUser,
    State(service): State<Arc<UserProfileService>>,
    AppJson(dto): AppJson<DeactivateAccountDto>,
) -> Result<Json<ApiResponse<DeactivateAccountResponseDto>>> {
    dto.validate()?;

    let result = service.deactivate_account(user.id, &dto.pin).await?;
    Ok(Json(ApiResponse::success(Some(result), None, None)))
}
