use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for `file_access_tokens`
#[derive(Debug, Clone, FromRow)]
pub struct AccessTokenRow {
    pub id: Uuid,
    pub token: String,
    pub file_id: Uuid,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Signed payload of a file access token
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenClaims {
    pub file_id: Uuid,
    pub user_id: Uuid,
    pub iat: i64,
    pub exp: i64,
    /// Keeps token strings unique when two are issued in the same second
    pub jti: Uuid,
}
