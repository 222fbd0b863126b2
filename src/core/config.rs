use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub access_token: AccessTokenConfig,
    pub security: SecurityConfig,
    pub scanner: ScannerConfig,
    pub email: EmailConfig,
    pub swagger: SwaggerConfig,
    pub minio: MinIOConfig,
    pub bootstrap_admin: BootstrapAdminConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_file_size: usize,
    /// Base URL of the web client, used to build links inside emails
    pub frontend_url: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

/// Session token settings (user and admin sign-in)
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub session_secret: String,
    pub session_ttl: Duration,
    pub jwt_leeway: Duration,
}

/// Settings for file access tokens (share links, direct file links)
#[derive(Clone, Debug)]
pub struct AccessTokenConfig {
    pub secret: String,
    /// Default TTL in the `<n>h|m|s` notation
    pub default_ttl: String,
}

/// PIN and OTP policy
#[derive(Clone, Debug)]
pub struct SecurityConfig {
    pub otp_ttl: Duration,
    pub max_pin_attempts: i32,
    pub pin_lockout: Duration,
}

/// Malware scanning API settings
#[derive(Clone, Debug)]
pub struct ScannerConfig {
    pub api_key: String,
    pub base_url: String,
    pub poll_attempts: u32,
    pub poll_interval: Duration,
}

/// Transactional email API settings
#[derive(Clone, Debug)]
pub struct EmailConfig {
    pub api_key: String,
    pub base_url: String,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

/// MinIO/S3 storage configuration for file uploads
#[derive(Debug, Clone)]
pub struct MinIOConfig {
    /// MinIO/S3 endpoint URL
    pub endpoint: String,
    /// Access key for authentication
    pub access_key: String,
    /// Secret key for authentication
    pub secret_key: String,
    /// Bucket name for storing files
    pub bucket: String,
    /// AWS region (for S3 compatibility)
    pub region: String,
}

/// Optional primary admin seeded on an empty `admins` table
#[derive(Debug, Clone, Default)]
pub struct BootstrapAdminConfig {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            auth: AuthConfig::from_env()?,
            access_token: AccessTokenConfig::from_env()?,
            security: SecurityConfig::from_env()?,
            scanner: ScannerConfig::from_env()?,
            email: EmailConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
            minio: MinIOConfig::from_env()?,
            bootstrap_admin: BootstrapAdminConfig::from_env(),
        })
    }
}

/// Read an env var and parse it, falling back to `default` when unset
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T, String> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| format!("{} must be a valid number", key)),
        Err(_) => Ok(default),
    }
}

fn required_env(key: &str) -> Result<String, String> {
    env::var(key)
        .ok()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("{} environment variable is required", key))
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl AppConfig {
    pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024; // 10MB

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_env::<u16>("PORT", 3000)?;

        let cors_allowed_origins =
            parse_origins(&env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string()));

        let max_file_size = parse_env("MAX_FILE_SIZE", Self::DEFAULT_MAX_FILE_SIZE)?;

        let frontend_url = env::var("FRONTEND_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            max_file_size,
            frontend_url,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        Ok(Self {
            url,
            max_connections: parse_env("DB_MAX_CONNECTIONS", Self::DEFAULT_MAX_CONNECTIONS)?,
            min_connections: parse_env("DB_MIN_CONNECTIONS", Self::DEFAULT_MIN_CONNECTIONS)?,
            acquire_timeout_secs: parse_env(
                "DB_ACQUIRE_TIMEOUT_SECS",
                Self::DEFAULT_ACQUIRE_TIMEOUT_SECS,
            )?,
            idle_timeout_secs: parse_env("DB_IDLE_TIMEOUT_SECS", Self::DEFAULT_IDLE_TIMEOUT_SECS)?,
            max_lifetime_secs: parse_env("DB_MAX_LIFETIME_SECS", Self::DEFAULT_MAX_LIFETIME_SECS)?,
        })
    }
}

impl AuthConfig {
    const DEFAULT_SESSION_TTL_SECS: u64 = 12 * 3600;
    const DEFAULT_JWT_LEEWAY_SECS: u64 = 60;

    pub fn from_env() -> Result<Self, String> {
        let session_secret = required_env("SESSION_SECRET")?;

        Ok(Self {
            session_secret,
            session_ttl: Duration::from_secs(parse_env(
                "SESSION_TTL_SECS",
                Self::DEFAULT_SESSION_TTL_SECS,
            )?),
            jwt_leeway: Duration::from_secs(parse_env(
                "JWT_LEEWAY",
                Self::DEFAULT_JWT_LEEWAY_SECS,
            )?),
        })
    }
}

impl AccessTokenConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            secret: required_env("ACCESS_TOKEN_SECRET")?,
            default_ttl: env::var("ACCESS_TOKEN_DEFAULT_TTL").unwrap_or_else(|_| "1h".to_string()),
        })
    }
}

impl SecurityConfig {
    const DEFAULT_OTP_TTL_SECS: u64 = 600;
    const DEFAULT_MAX_PIN_ATTEMPTS: i32 = 3;
    const DEFAULT_PIN_LOCKOUT_SECS: u64 = 24 * 3600;

    pub fn from_env() -> Result<Self, String> {
        let max_pin_attempts = parse_env("MAX_PIN_ATTEMPTS", Self::DEFAULT_MAX_PIN_ATTEMPTS)?;
        if max_pin_attempts < 1 {
            return Err("MAX_PIN_ATTEMPTS must be at least 1".to_string());
        }

        Ok(Self {
            otp_ttl: Duration::from_secs(parse_env("OTP_TTL_SECS", Self::DEFAULT_OTP_TTL_SECS)?),
            max_pin_attempts,
            pin_lockout: Duration::from_secs(parse_env(
                "PIN_LOCKOUT_SECS",
                Self::DEFAULT_PIN_LOCKOUT_SECS,
            )?),
        })
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            otp_ttl: Duration::from_secs(Self::DEFAULT_OTP_TTL_SECS),
            max_pin_attempts: Self::DEFAULT_MAX_PIN_ATTEMPTS,
            pin_lockout: Duration::from_secs(Self::DEFAULT_PIN_LOCKOUT_SECS),
        }
    }
}

impl ScannerConfig {
    const DEFAULT_POLL_ATTEMPTS: u32 = 10;
    const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;

    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            api_key: required_env("VIRUSTOTAL_API_KEY")?,
            base_url: env::var("VIRUSTOTAL_BASE_URL")
                .unwrap_or_else(|_| "https://www.virustotal.com/api/v3".to_string())
                .trim_end_matches('/')
                .to_string(),
            poll_attempts: parse_env("SCAN_POLL_ATTEMPTS", Self::DEFAULT_POLL_ATTEMPTS)?.max(1),
            poll_interval: Duration::from_millis(parse_env(
                "SCAN_POLL_INTERVAL_MS",
                Self::DEFAULT_POLL_INTERVAL_MS,
            )?),
        })
    }
}

impl EmailConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            api_key: required_env("RESEND_API_KEY")?,
            base_url: env::var("RESEND_BASE_URL")
                .unwrap_or_else(|_| "https://api.resend.com".to_string())
                .trim_end_matches('/')
                .to_string(),
            from: env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "SecuredTrans <noreply@securedtrans.site>".to_string()),
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "SecuredTrans API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "API documentation for SecuredTrans".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

impl MinIOConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            endpoint: env::var("MINIO_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:9000".to_string()),
            access_key: env::var("MINIO_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".to_string()),
            secret_key: env::var("MINIO_SECRET_KEY").unwrap_or_else(|_| "minioadmin".to_string()),
            bucket: env::var("MINIO_BUCKET").unwrap_or_else(|_| "securedtrans-files".to_string()),
            region: env::var("MINIO_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
        })
    }
}

impl BootstrapAdminConfig {
    pub fn from_env() -> Self {
        Self {
            email: env::var("BOOTSTRAP_ADMIN_EMAIL").ok().filter(|s| !s.is_empty()),
            password: env::var("BOOTSTRAP_ADMIN_PASSWORD")
                .ok()
                .filter(|s| !s.is_empty()),
        }
    }

    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.email, &self.password) {
            (Some(email), Some(password)) => Some((email.as_str(), password.as_str())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins_trims_and_drops_empty() {
        let origins = parse_origins(" http://a.test , ,http://b.test,");
        assert_eq!(origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let value = parse_env::<u32>("SECUREDTRANS_TEST_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_swagger_credentials_require_both_parts() {
        let mut swagger = SwaggerConfig {
            username: Some("docs".to_string()),
            password: None,
            title: String::new(),
            version: String::new(),
            description: String::new(),
        };
        assert!(swagger.credentials().is_none());

        swagger.password = Some("secret".to_string());
        assert_eq!(swagger.credentials().as_deref(), Some("docs:secret"));
    }

    #[test]
    fn test_bootstrap_admin_credentials() {
        let cfg = BootstrapAdminConfig {
            email: Some("root@securedtrans.site".to_string()),
            password: Some("correct horse".to_string()),
        };
        assert_eq!(
            cfg.credentials(),
            Some(("root@securedtrans.site", "correct horse"))
        );
        assert!(BootstrapAdminConfig::default().credentials().is_none());
    }

    #[test]
    fn test_security_defaults() {
        let security = SecurityConfig::default();
        assert_eq!(security.max_pin_attempts, 3);
        assert_eq!(security.otp_ttl, Duration::from_secs(600));
        assert_eq!(security.pin_lockout, Duration::from_secs(86400));
    }
}
