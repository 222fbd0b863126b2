use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::guards::RequireUser;
use crate::features::files::dtos::{
    AccessGrantDto, DeleteFileResponseDto, DownloadQuery, FileResponseDto, ScanStatusDto,
    ScanSubmittedDto, UnblockRequestedDto, UploadFileDto, VerifyOtpDto, VerifyPinDto,
};
use crate::features::files::services::FileService;
use crate::shared::types::{ApiResponse, PaginationQuery};

/// The `file` part of a multipart upload
pub struct UploadedFile {
    pub data: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
}

/// Read the `file` field of a multipart form, enforcing the size limit
pub async fn read_upload(mut multipart: Multipart, max_size: usize) -> Result<UploadedFile> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        if field.name() != Some("file") {
            debug!("Ignoring unknown field: {:?}", field.name());
            continue;
        }

        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let file_name = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unnamed".to_string());

        let data = field.bytes().await.map_err(|e| {
            debug!("Failed to read file bytes: {}", e);
            AppError::BadRequest(format!("Failed to read file data: {}", e))
        })?;

        if data.is_empty() {
            return Err(AppError::BadRequest("File is empty".to_string()));
        }
        if data.len() > max_size {
            return Err(AppError::BadRequest(format!(
                "File too large. Maximum size is {} bytes ({} MB)",
                max_size,
                max_size / 1024 / 1024
            )));
        }

        return Ok(UploadedFile {
            data: data.to_vec(),
            file_name,
            content_type,
        });
    }

    Err(AppError::BadRequest("File is required".to_string()))
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 UTF-8 name
fn content_disposition(file_name: &str) -> HeaderValue {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let value = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(file_name)
    );

    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

/// Upload a file
///
/// The bytes are scanned for malware first; only a clean, completed scan is stored.
#[utoipa::path(
    post,
    path = "/api/files/upload",
    tag = "files",
    request_body(
        content = UploadFileDto,
        content_type = "multipart/form-data",
        description = "Multipart form with a single `file` part",
    ),
    responses(
        (status = 201, description = "File uploaded successfully", body = ApiResponse<FileResponseDto>),
        (status = 400, description = "Missing file, too large, scan not completed or file deemed unsafe"),
        (status = 401, description = "Authentication required"),
        (status = 413, description = "File too large"),
        (status = 502, description = "Scanner or storage unavailable")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_file(
    RequireUser(user): RequireUser,
    State(service): State<Arc<FileService>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<FileResponseDto>>)> {
    let upload = read_upload(multipart, service.max_file_size()).await?;

    let file = service
        .upload_file(user.id, upload.data, &upload.file_name, &upload.content_type)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(file),
            Some("File uploaded successfully".to_string()),
            None,
        )),
    ))
}

/// List the caller's library
#[utoipa::path(
    get,
    path = "/api/files",
    tag = "files",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Files retrieved successfully", body = ApiResponse<Vec<FileResponseDto>>),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_files(
    RequireUser(user): RequireUser,
    State(service): State<Arc<FileService>>,
    Query(params): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<FileResponseDto>>>> {
    let (files, total) = service.list_library(user.id, &params).await?;
    Ok(Json(ApiResponse::paginated(files, total)))
}

/// Get file metadata
#[utoipa::path(
    get,
    path = "/api/files/{id}",
    tag = "files",
    params(("id" = Uuid, Path, description = "File ID")),
    responses(
        (status = 200, description = "File retrieved successfully", body = ApiResponse<FileResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_file(
    RequireUser(user): RequireUser,
    State(service): State<Arc<FileService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<FileResponseDto>>> {
    let file = service.get_file(user.id, id).await?;
    Ok(Json(ApiResponse::success(Some(file), None, None)))
}

/// Replace the content of a file
#[utoipa::path(
    put,
    path = "/api/files/{id}",
    tag = "files",
    params(("id" = Uuid, Path, description = "File ID")),
    request_body(
        content = UploadFileDto,
        content_type = "multipart/form-data",
    ),
    responses(
        (status = 200, description = "File replaced successfully", body = ApiResponse<FileResponseDto>),
        (status = 400, description = "Missing file, scan not completed or file deemed unsafe"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "File not found"),
        (status = 409, description = "File is not active")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn replace_file(
    RequireUser(user): RequireUser,
    State(service): State<Arc<FileService>>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<FileResponseDto>>> {
    let upload = read_upload(multipart, service.max_file_size()).await?;

    let file = service
        .replace_file(
            user.id,
            id,
            upload.data,
            &upload.file_name,
            &upload.content_type,
        )
        .await?;

    Ok(Json(ApiResponse::success(
        Some(file),
        Some("File replaced successfully".to_string()),
        None,
    )))
}

/// Move a file to the recycle bin
#[utoipa::path(
    delete,
    path = "/api/files/{id}",
    tag = "files",
    params(("id" = Uuid, Path, description = "File ID")),
    responses(
        (status = 200, description = "File moved to the recycle bin", body = ApiResponse<DeleteFileResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "File not found"),
        (status = 409, description = "File is already deleted")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_file(
    RequireUser(user): RequireUser,
    State(service): State<Arc<FileService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeleteFileResponseDto>>> {
    let result = service.delete_file(user.id, id).await?;
    Ok(Json(ApiResponse::success(
        Some(result),
        Some("File moved to the recycle bin".to_string()),
        None,
    )))
}

/// Open a file with the access PIN
///
/// A wrong PIN is not an error: the response reports the attempts left. The attempt
/// that reaches the limit blocks the file.
#[utoipa::path(
    post,
    path = "/api/files/{id}/access",
    tag = "files",
    params(("id" = Uuid, Path, description = "File ID")),
    request_body = VerifyPinDto,
    responses(
        (status = 200, description = "PIN checked", body = ApiResponse<AccessGrantDto>),
        (status = 400, description = "PIN is not 6 digits or no PIN has been set"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "File not found"),
        (status = 409, description = "File is not active")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn verify_pin(
    RequireUser(user): RequireUser,
    State(service): State<Arc<FileService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<VerifyPinDto>,
) -> Result<Json<ApiResponse<AccessGrantDto>>> {
    dto.validate()?;

    let grant = service.verify_pin(user.id, id, &dto.pin).await?;
    Ok(Json(ApiResponse::success(Some(grant), None, None)))
}

/// Email an unblock code for a blocked file
#[utoipa::path(
    post,
    path = "/api/files/{id}/unblock",
    tag = "files",
    params(("id" = Uuid, Path, description = "File ID")),
    responses(
        (status = 200, description = "Unblock code sent", body = ApiResponse<UnblockRequestedDto>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "File not found"),
        (status = 409, description = "File is not blocked"),
        (status = 502, description = "Email could not be sent")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn request_unblock(
    RequireUser(user): RequireUser,
    State(service): State<Arc<FileService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UnblockRequestedDto>>> {
    let result = service.request_unblock(user.id, id).await?;
    Ok(Json(ApiResponse::success(
        Some(result),
        Some("Unblock code sent to your email".to_string()),
        None,
    )))
}

/// Confirm the unblock code
///
/// A wrong or expired code moves the file to the recycle bin.
#[utoipa::path(
    post,
    path = "/api/files/{id}/unblock/verify",
    tag = "files",
    params(("id" = Uuid, Path, description = "File ID")),
    request_body = VerifyOtpDto,
    responses(
        (status = 200, description = "Code checked", body = ApiResponse<AccessGrantDto>),
        (status = 400, description = "Code is not 6 digits"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "File not found"),
        (status = 409, description = "No pending unblock code")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn verify_unblock(
    RequireUser(user): RequireUser,
    State(service): State<Arc<FileService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<VerifyOtpDto>,
) -> Result<Json<ApiResponse<AccessGrantDto>>> {
    dto.validate()?;

    let grant = service.verify_unblock_otp(user.id, id, &dto.otp).await?;
    Ok(Json(ApiResponse::success(Some(grant), None, None)))
}

/// Download a file with an access token issued to the caller
#[utoipa::path(
    get,
    path = "/api/files/{id}/download",
    tag = "files",
    params(("id" = Uuid, Path, description = "File ID"), DownloadQuery),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 401, description = "Invalid or expired token"),
        (status = 403, description = "Token not issued to the caller for this file"),
        (status = 409, description = "File is not active")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn download_file(
    RequireUser(user): RequireUser,
    State(service): State<Arc<FileService>>,
    Path(id): Path<Uuid>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response> {
    let (file, data) = service.download(user.id, id, &query.token).await?;

    let content_type = HeaderValue::from_str(&file.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, content_disposition(&file.file_name)),
        ],
        data,
    )
        .into_response())
}

/// Submit a file for scanning without storing it
#[utoipa::path(
    post,
    path = "/api/scans",
    tag = "scans",
    request_body(
        content = UploadFileDto,
        content_type = "multipart/form-data",
    ),
    responses(
        (status = 202, description = "Scan submitted", body = ApiResponse<ScanSubmittedDto>),
        (status = 400, description = "Missing or oversized file"),
        (status = 401, description = "Authentication required"),
        (status = 502, description = "Scanner unavailable")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn start_scan(
    RequireUser(_user): RequireUser,
    State(service): State<Arc<FileService>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<ScanSubmittedDto>>)> {
    let upload = read_upload(multipart, service.max_file_size()).await?;
    let submitted = service.start_scan(&upload.file_name, upload.data).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::success(Some(submitted), None, None)),
    ))
}

/// Current verdict of a scan
#[utoipa::path(
    get,
    path = "/api/scans/{scan_id}",
    tag = "scans",
    params(("scan_id" = String, Path, description = "Scan ID returned by the scanner")),
    responses(
        (status = 200, description = "Scan status", body = ApiResponse<ScanStatusDto>),
        (status = 401, description = "Authentication required"),
        (status = 502, description = "Scanner unavailable")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn check_scan(
    RequireUser(_user): RequireUser,
    State(service): State<Arc<FileService>>,
    Path(scan_id): Path<String>,
) -> Result<Json<ApiResponse<ScanStatusDto>>> {
    let status = service.check_scan(&scan_id).await?;
    Ok(Json(ApiResponse::success(Some(status), None, None)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_ascii() {
        let value = content_disposition("report 2024.pdf");
        assert_eq!(
            value.to_str().unwrap(),
            "attachment; filename=\"report 2024.pdf\"; filename*=UTF-8''report%202024.pdf"
        );
    }

    #[test]
    fn test_content_disposition_escapes_quotes_and_unicode() {
        let value = content_disposition("a\"b\u{e9}.txt");
        let text = value.to_str().unwrap();
        assert!(text.starts_with("attachment; filename=\"a_b_.txt\""));
        assert!(text.ends_with("filename*=UTF-8''a%22b%C3%A9.txt"));
    }
}
