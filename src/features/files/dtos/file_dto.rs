use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::access_tokens::dtos::IssuedTokenDto;
use crate::features::files::models::{File, FileStatus};
use crate::modules::scanner::{ScanAnalysis, ScanVerdict};
use crate::shared::validation::PIN_REGEX;

/// Upload file request DTO for OpenAPI documentation
/// Note: This struct is for Swagger UI documentation only.
/// The actual handler uses axum's Multipart extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadFileDto {
    /// The file to upload. Any content type; the malware scan decides.
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
}

/// File metadata as shown in the owner's library
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FileResponseDto {
    pub id: Uuid,
    pub file_name: String,
    pub content_type: String,
    /// Size of the file in bytes
    pub file_size: i64,
    pub status: FileStatus,
    /// Consecutive wrong PINs since the last success
    pub pin_attempts: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<File> for FileResponseDto {
    fn from(file: File) -> Self {
        Self {
            id: file.id,
            file_name: file.file_name,
            content_type: file.content_type,
            file_size: file.file_size,
            status: file.status,
            pin_attempts: file.pin_attempts,
            created_at: file.created_at,
            updated_at: file.updated_at,
        }
    }
}

/// Request DTO for the PIN gate
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct VerifyPinDto {
    #[validate(regex(path = *PIN_REGEX, message = "PIN must be exactly 6 digits"))]
    #[schema(example = "123456")]
    pub pin: String,
}

/// Request DTO for confirming an emailed one-time code
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct VerifyOtpDto {
    #[validate(regex(path = *PIN_REGEX, message = "OTP must be exactly 6 digits"))]
    #[schema(example = "482913")]
    pub otp: String,
}

/// Outcome of a PIN or OTP check
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccessGrantDto {
    pub granted: bool,
    /// File status after this attempt
    pub status: FileStatus,
    /// Attempts left before the file locks; present on a wrong PIN
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_attempts: Option<i32>,
    /// Present when access was granted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access: Option<IssuedTokenDto>,
}

impl AccessGrantDto {
    pub fn granted(status: FileStatus, access: IssuedTokenDto) -> Self {
        Self {
            granted: true,
            status,
            remaining_attempts: None,
            access: Some(access),
        }
    }

    pub fn denied(status: FileStatus, remaining_attempts: Option<i32>) -> Self {
        Self {
            granted: false,
            status,
            remaining_attempts,
            access: None,
        }
    }
}

/// Response after an unblock OTP has been emailed
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UnblockRequestedDto {
    pub file_id: Uuid,
    pub status: FileStatus,
    pub otp_expires_at: DateTime<Utc>,
}

/// Response DTO for delete operations
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteFileResponseDto {
    pub deleted: bool,
    /// Recycle bin entry holding the file
    pub recycle_bin_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct DownloadQuery {
    /// Access token issued to the caller for this file
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScanSubmittedDto {
    pub scan_id: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScanStatusDto {
    pub scan_id: String,
    /// Raw scanner status, e.g. `queued` or `completed`
    pub status: String,
    /// Engines that flagged the file
    pub malicious: u64,
    pub verdict: ScanVerdict,
}

impl ScanStatusDto {
    pub fn new(scan_id: String, analysis: ScanAnalysis) -> Self {
        Self {
            verdict: analysis.verdict(),
            scan_id,
            status: analysis.status,
            malicious: analysis.malicious,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_dto_validation() {
        assert!(VerifyPinDto { pin: "000123".into() }.validate().is_ok());
        assert!(VerifyPinDto { pin: "12345".into() }.validate().is_err());
        assert!(VerifyPinDto { pin: "12345a".into() }.validate().is_err());
        assert!(VerifyOtpDto { otp: "1234567".into() }.validate().is_err());
    }

    #[test]
    fn test_denied_grant_omits_access() {
        let dto = AccessGrantDto::denied(FileStatus::Active, Some(2));
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["granted"], false);
        assert_eq!(json["remaining_attempts"], 2);
        assert!(json.get("access").is_none());
    }

    #[test]
    fn test_scan_status_reports_verdict() {
        let dto = ScanStatusDto::new(
            "abc".into(),
            ScanAnalysis {
                status: "completed".into(),
                malicious: 0,
            },
        );
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["verdict"], "safe");
        assert_eq!(json["status"], "completed");
    }
}
