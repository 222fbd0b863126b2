use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::core::error::AppError;
use crate::features::access_tokens::models::AccessTokenClaims;

/// HS256 signer/verifier for file access tokens
pub struct AccessTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl AccessTokenCodec {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn encode(
        &self,
        file_id: Uuid,
        user_id: Uuid,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<(String, DateTime<Utc>), AppError> {
        let expires_at = now + ttl;
        let claims = AccessTokenClaims {
            file_id,
            user_id,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign access token: {}", e)))?;

        // Stored expiry matches the signed `exp` to the second
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .unwrap_or(expires_at);

        Ok((token, expires_at))
    }

    /// Verify signature and expiry
    pub fn decode(&self, token: &str) -> Result<AccessTokenClaims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| invalid_token())
    }
}

pub fn invalid_token() -> AppError {
    AppError::Unauthorized("Invalid or expired token".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let codec = AccessTokenCodec::new("file-secret");
        let (file_id, user_id) = (Uuid::new_v4(), Uuid::new_v4());
        let now = Utc::now();

        let (token, expires_at) = codec
            .encode(file_id, user_id, Duration::minutes(5), now)
            .unwrap();
        assert_eq!(expires_at.timestamp(), (now + Duration::minutes(5)).timestamp());

        let claims = codec.decode(&token).unwrap();
        assert_eq!(claims.file_id, file_id);
        assert_eq!(claims.user_id, user_id);
    }

    #[test]
    fn test_wire_claims_are_camel_case() {
        let codec = AccessTokenCodec::new("file-secret");
        let (token, _) = codec
            .encode(Uuid::new_v4(), Uuid::new_v4(), Duration::minutes(1), Utc::now())
            .unwrap();

        let payload = token.split('.').nth(1).unwrap();
        let json =
            base64::Engine::decode(&base64::prelude::BASE64_URL_SAFE_NO_PAD, payload).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert!(value.get("fileId").is_some());
        assert!(value.get("userId").is_some());
    }

    #[test]
    fn test_two_tokens_for_same_pair_differ() {
        let codec = AccessTokenCodec::new("file-secret");
        let (f, u, now) = (Uuid::new_v4(), Uuid::new_v4(), Utc::now());
        let (a, _) = codec.encode(f, u, Duration::minutes(1), now).unwrap();
        let (b, _) = codec.encode(f, u, Duration::minutes(1), now).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_expired_token_rejected() {
        let codec = AccessTokenCodec::new("file-secret");
        let issued = Utc::now() - Duration::hours(1);
        let (token, _) = codec
            .encode(Uuid::new_v4(), Uuid::new_v4(), Duration::minutes(1), issued)
            .unwrap();
        assert!(matches!(codec.decode(&token), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let (token, _) = AccessTokenCodec::new("a")
            .encode(Uuid::new_v4(), Uuid::new_v4(), Duration::minutes(1), Utc::now())
            .unwrap();
        assert!(AccessTokenCodec::new("b").decode(&token).is_err());
    }
}
