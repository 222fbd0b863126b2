use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::model::{AuthenticatedUser, SessionClaims};
use crate::core::config::AuthConfig;
use crate::core::error::AppError;

/// A freshly issued session token
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and validates HS256 session tokens for users and admins
pub struct JwtValidator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    session_ttl: Duration,
    leeway: u64,
}

impl JwtValidator {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.session_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.session_secret.as_bytes()),
            session_ttl: Duration::seconds(config.session_ttl.as_secs() as i64),
            leeway: config.jwt_leeway.as_secs(),
        }
    }

    pub fn issue(&self, principal: &AuthenticatedUser) -> Result<SessionToken, AppError> {
        let now = Utc::now();
        let expires_at = now + self.session_ttl;
        let claims = SessionClaims {
            sub: principal.id,
            email: principal.email.clone(),
            kind: principal.kind,
            roles: principal.roles.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign session token: {}", e)))?;

        Ok(SessionToken { token, expires_at })
    }

    pub fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.leeway;
        validation.validate_exp = true;

        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| AppError::Auth(e.to_string()))?;

        Ok(token_data.claims.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::admin::models::AdminRole;
    use std::time::Duration as StdDuration;
    use uuid::Uuid;

    fn validator(secret: &str) -> JwtValidator {
        JwtValidator::new(&AuthConfig {
            session_secret: secret.to_string(),
            session_ttl: StdDuration::from_secs(3600),
            jwt_leeway: StdDuration::from_secs(0),
        })
    }

    #[test]
    fn test_issue_then_validate() {
        let v = validator("session-secret");
        let admin = AuthenticatedUser::admin(
            Uuid::new_v4(),
            "root@example.com".into(),
            AdminRole::Admin,
        );

        let session = v.issue(&admin).unwrap();
        assert!(session.expires_at > Utc::now());

        let decoded = v.validate_token(&session.token).unwrap();
        assert_eq!(decoded.id, admin.id);
        assert_eq!(decoded.admin_role(), Some(AdminRole::Admin));
    }

    #[test]
    fn test_rejects_token_signed_with_other_secret() {
        let user = AuthenticatedUser::user(Uuid::new_v4(), "u@example.com".into());
        let token = validator("secret-a").issue(&user).unwrap().token;

        let err = validator("secret-b").validate_token(&token).unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
    }

    #[test]
    fn test_rejects_expired_token() {
        let v = validator("session-secret");
        let past = Utc::now() - Duration::hours(2);
        let claims = SessionClaims {
            sub: Uuid::new_v4(),
            email: "u@example.com".into(),
            kind: crate::features::auth::model::PrincipalKind::User,
            roles: vec![],
            iat: past.timestamp(),
            exp: (past + Duration::minutes(5)).timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &v.encoding_key).unwrap();

        assert!(v.validate_token(&token).is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(validator("s").validate_token("not-a-jwt").is_err());
    }
}
