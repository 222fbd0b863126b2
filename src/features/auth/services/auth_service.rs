use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

use crate::core::database::conflict_on_unique;
use crate::core::error::{AppError, Result};
use crate::features::auth::dtos::{
    MeResponseDto, SessionResponseDto, SignInRequestDto, SignUpRequestDto,
};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::password::{hash_password, verify_password};
use crate::features::auth::JwtValidator;
use crate::features::users::models::UserProfile;

/// Service for user sign-up, sign-in and session introspection
pub struct AuthService {
    pool: PgPool,
    validator: Arc<JwtValidator>,
}

impl AuthService {
    pub fn new(pool: PgPool, validator: Arc<JwtValidator>) -> Self {
        Self { pool, validator }
    }

    /// Register a new user and open a session
    pub async fn sign_up(&self, dto: SignUpRequestDto) -> Result<SessionResponseDto> {
        let email = dto.email.trim().to_lowercase();
        let username = dto.username.trim().to_string();

        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM user_profiles WHERE email = $1 OR username = $2)",
        )
        .bind(&email)
        .bind(&username)
        .fetch_one(&self.pool)
        .await?;

        if taken {
            return Err(AppError::Conflict(
                "Email or username is already registered".to_string(),
            ));
        }

        let password_hash = hash_password(&dto.password)?;

        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO user_profiles (username, email, phone, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&username)
        .bind(&email)
        .bind(dto.phone.trim())
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Email or username is already registered"))?;

        info!("User registered: id={}", profile.id);

        self.open_session(profile)
    }

    /// Sign in with email and password
    pub async fn sign_in(&self, dto: SignInRequestDto) -> Result<SessionResponseDto> {
        let email = dto.email.trim().to_lowercase();

        let profile =
            sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles WHERE email = $1")
                .bind(&email)
                .fetch_optional(&self.pool)
                .await?;

        // Same error for unknown email and wrong password
        let profile = match profile {
            Some(p) if verify_password(&p.password_hash, &dto.password) => p,
            _ => return Err(AppError::Unauthorized("Invalid credentials".to_string())),
        };

        if !profile.is_active() {
            return Err(AppError::Forbidden("Account is inactive".to_string()));
        }

        self.open_session(profile)
    }

    /// Describe the caller; user sessions include their profile
    pub async fn me(&self, user: AuthenticatedUser) -> Result<MeResponseDto> {
        let profile = if user.is_user() {
            let profile =
                sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles WHERE id = $1")
                    .bind(user.id)
                    .fetch_optional(&self.pool)
                    .await?
                    .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
            Some(profile.into())
        } else {
            None
        };

        Ok(MeResponseDto {
            principal: user,
            profile,
        })
    }

    fn open_session(&self, profile: UserProfile) -> Result<SessionResponseDto> {
        let principal = AuthenticatedUser::user(profile.id, profile.email.clone());
        let session = self.validator.issue(&principal)?;

        Ok(SessionResponseDto {
            access_token: session.token,
            token_type: "Bearer".to_string(),
            expires_at: session.expires_at,
            user: profile.into(),
        })
    }
}
