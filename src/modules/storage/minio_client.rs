//! MinIO/S3-compatible storage client
//!
//! Holds uploaded files and avatars in a single private bucket.
//! Uses rust-s3 crate for lightweight S3 operations.

use async_trait::async_trait;
use chrono::Utc;
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::config::MinIOConfig;
use crate::core::error::AppError;
use crate::modules::storage::ObjectStore;
use crate::shared::constants::{AVATARS_PREFIX, FILES_PREFIX};

/// MinIO/S3-compatible storage client
pub struct MinIOClient {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    endpoint: String,
}

impl MinIOClient {
    /// Create a new MinIO client and make sure the bucket exists
    pub async fn new(config: MinIOConfig) -> Result<Self, AppError> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Failed to create MinIO credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Internal(format!("Failed to create MinIO bucket: {}", e)))?;

        // Path-style URLs for MinIO (http://endpoint/bucket instead of http://bucket.endpoint)
        bucket.set_path_style();

        let client = Self {
            bucket,
            region,
            credentials,
            endpoint: config.endpoint,
        };

        client.ensure_bucket_exists().await;

        info!(
            "MinIO client initialized for endpoint: {}, bucket: {}",
            client.endpoint,
            client.bucket.name()
        );

        Ok(client)
    }

    /// Create the bucket if missing. Failures are logged; uploads surface real problems.
    async fn ensure_bucket_exists(&self) {
        let result = Bucket::create_with_path_style(
            &self.bucket.name(),
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await;

        match result {
            Ok(_) => info!("Bucket '{}' created successfully", self.bucket.name()),
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                    || error_str.contains("already own it")
                {
                    debug!("Bucket '{}' already exists", self.bucket.name());
                } else {
                    warn!(
                        "Could not create bucket '{}': {}. Assuming it exists.",
                        self.bucket.name(),
                        e
                    );
                }
            }
        }
    }
}

#[async_trait]
impl ObjectStore for MinIOClient {
    async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> Result<(), AppError> {
        self.bucket
            .put_object_with_content_type(key, data, content_type)
            .await
            .map_err(|e| storage_error("upload", key, e))?;

        debug!("Uploaded object '{}' to bucket '{}'", key, self.bucket.name());
        Ok(())
    }

    async fn download(&self, key: &str) -> Result<Vec<u8>, AppError> {
        let response = self
            .bucket
            .get_object(key)
            .await
            .map_err(|e| storage_error("download", key, e))?;

        Ok(response.to_vec())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.bucket
            .delete_object(key)
            .await
            .map_err(|e| storage_error("delete", key, e))?;

        debug!("Deleted object '{}' from bucket '{}'", key, self.bucket.name());
        Ok(())
    }
}

fn storage_error(op: &str, key: &str, e: s3::error::S3Error) -> AppError {
    AppError::ExternalServiceError(format!("Failed to {} object '{}': {}", op, key, e))
}

/// Object key for an uploaded file: `files/{owner}/{timestamp}_{name}`
pub fn file_key(owner_id: Uuid, file_name: &str) -> String {
    format!(
        "{}/{}/{}_{}",
        FILES_PREFIX,
        owner_id,
        Utc::now().timestamp_millis(),
        sanitize_file_name(file_name)
    )
}

/// Object key for an avatar: `avatars/{owner}/{timestamp}_{name}`
pub fn avatar_key(owner_id: Uuid, file_name: &str) -> String {
    format!(
        "{}/{}/{}_{}",
        AVATARS_PREFIX,
        owner_id,
        Utc::now().timestamp_millis(),
        sanitize_file_name(file_name)
    )
}

/// Keep object keys flat and printable
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .rsplit(&['/', '\\'][..])
        .next()
        .unwrap_or(name)
        .chars()
        .map(|c| if c.is_control() { '_' } else { c })
        .collect();

    if cleaned.trim().is_empty() || cleaned == "." || cleaned == ".." {
        "unnamed".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_key_layout() {
        let owner = Uuid::new_v4();
        let key = file_key(owner, "report.pdf");
        let prefix = format!("files/{}/", owner);
        assert!(key.starts_with(&prefix));
        assert!(key.ends_with("_report.pdf"));

        let stamp = key[prefix.len()..].split('_').next().unwrap();
        assert!(stamp.parse::<i64>().is_ok());
    }

    #[test]
    fn test_avatar_key_layout() {
        let owner = Uuid::new_v4();
        assert!(avatar_key(owner, "me.png").starts_with(&format!("avatars/{}/", owner)));
    }

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\docs\\a.txt"), "a.txt");
        assert_eq!(sanitize_file_name("a\nb.txt"), "a_b.txt");
        assert_eq!(sanitize_file_name(".."), "unnamed");
        assert_eq!(sanitize_file_name(""), "unnamed");
    }
}
