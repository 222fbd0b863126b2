use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::files::handlers::{
    check_scan, delete_file, download_file, get_file, list_files, replace_file, request_unblock,
    start_scan, upload_file, verify_pin, verify_unblock,
};
use crate::features::files::services::FileService;

/// Headroom over the file size for multipart framing
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Create routes for the files feature
pub fn routes(file_service: Arc<FileService>) -> Router {
    let body_limit = DefaultBodyLimit::max(file_service.max_file_size() + MULTIPART_OVERHEAD);

    Router::new()
        .route("/api/files/upload", post(upload_file))
        .route("/api/files", get(list_files))
        .route(
            "/api/files/{id}",
            get(get_file).put(replace_file).delete(delete_file),
        )
        .route("/api/files/{id}/access", post(verify_pin))
        .route("/api/files/{id}/unblock", post(request_unblock))
        .route("/api/files/{id}/unblock/verify", post(verify_unblock))
        .route("/api/files/{id}/download", get(download_file))
        .route("/api/scans", post(start_scan))
        .route("/api/scans/{scan_id}", get(check_scan))
        .layer(body_limit)
        .with_state(file_service)
}
