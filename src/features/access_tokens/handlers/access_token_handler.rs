use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use validator::Validate;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::access_tokens::dtos::{
    IssueTokenDto, IssuedTokenDto, TokenValidationDto, ValidateTokenDto,
};
use crate::features::access_tokens::services::AccessTokenService;
use crate::features::auth::guards::RequireUser;
use crate::shared::types::ApiResponse;

/// Issue a file access token
///
/// The owner may issue a token for themself or for a user the file is shared with.
/// Share-recipient tokens never outlive the share.
#[utoipa::path(
    post,
    path = "/api/tokens",
    tag = "tokens",
    request_body = IssueTokenDto,
    responses(
        (status = 201, description = "Token issued", body = ApiResponse<IssuedTokenDto>),
        (status = 400, description = "Invalid TTL"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the owner, or no live share for the target user"),
        (status = 404, description = "File not found"),
        (status = 409, description = "File is not active")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn issue_token(
    RequireUser(user): RequireUser,
    State(service): State<Arc<AccessTokenService>>,
    AppJson(dto): AppJson<IssueTokenDto>,
) -> Result<(StatusCode, Json<ApiResponse<IssuedTokenDto>>)> {
    let issued = service.issue_on_request(user.id, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(issued), None, None)),
    ))
}

/// Validate a file access token
#[utoipa::path(
    post,
    path = "/api/tokens/validate",
    tag = "tokens",
    request_body = ValidateTokenDto,
    responses(
        (status = 200, description = "Token is valid", body = ApiResponse<TokenValidationDto>),
        (status = 401, description = "Invalid or expired token")
    )
)]
pub async fn validate_token(
    State(service): State<Arc<AccessTokenService>>,
    AppJson(dto): AppJson<ValidateTokenDto>,
) -> Result<Json<ApiResponse<TokenValidationDto>>> {
    dto.validate()?;

    let (file_id, _) = service.validate(&dto.token).await?;
    Ok(Json(ApiResponse::success(
        Some(TokenValidationDto { file_id }),
        None,
        None,
    )))
}
