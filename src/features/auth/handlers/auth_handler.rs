use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::auth::dtos::{
    MeResponseDto, SessionResponseDto, SignInRequestDto, SignUpRequestDto,
};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::services::AuthService;
use crate::shared::types::ApiResponse;
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use validator::Validate;

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/auth/sign-up",
    request_body = SignUpRequestDto,
    responses(
        (status = 201, description = "User registered successfully", body = ApiResponse<SessionResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email or username already registered")
    ),
    tag = "auth"
)]
pub async fn sign_up(
    State(service): State<Arc<AuthService>>,
    AppJson(dto): AppJson<SignUpRequestDto>,
) -> Result<(StatusCode, Json<ApiResponse<SessionResponseDto>>)> {
    dto.validate()?;

    let session = service.sign_up(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(session), None, None)),
    ))
}

/// Sign in with email and password
#[utoipa::path(
    post,
    path = "/api/auth/sign-in",
    request_body = SignInRequestDto,
    responses(
        (status = 200, description = "Sign-in successful", body = ApiResponse<SessionResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account is inactive")
    ),
    tag = "auth"
)]
pub async fn sign_in(
    State(service): State<Arc<AuthService>>,
    AppJson(dto): AppJson<SignInRequestDto>,
) -> Result<Json<ApiResponse<SessionResponseDto>>> {
    dto.validate()?;

    let session = service.sign_in(dto).await?;
    Ok(Json(ApiResponse::success(Some(session), None, None)))
}

/// Get current authenticated principal
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current principal retrieved successfully", body = ApiResponse<MeResponseDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "auth",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_me(
    user: AuthenticatedUser,
    State(service): State<Arc<AuthService>>,
) -> Result<Json<ApiResponse<MeResponseDto>>> {
    let me = service.me(user).await?;
    Ok(Json(ApiResponse::success(Some(me), None, None)))
}
