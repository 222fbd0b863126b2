//! Storage module for file management
//!
//! Provides a MinIO/S3-compatible storage client for uploaded files and avatars.

mod minio_client;

pub use minio_client::{avatar_key, file_key, sanitize_file_name, MinIOClient};

use async_trait::async_trait;

use crate::core::error::AppError;

/// Object storage used by the file and profile services
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload bytes under `key`
    async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> Result<(), AppError>;

    async fn download(&self, key: &str) -> Result<Vec<u8>, AppError>;

    async fn delete(&self, key: &str) -> Result<(), AppError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Keeps objects in a map
    #[derive(Default)]
    pub struct MemoryStore {
        pub objects: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl MemoryStore {
        pub fn contains(&self, key: &str) -> bool {
            self.objects.lock().unwrap().contains_key(key)
        }
    }

    #[async_trait]
    impl ObjectStore for MemoryStore {
        async fn upload(
            &self,
            key: &str,
            data: &[u8],
            _content_type: &str,
        ) -> Result<(), AppError> {
            self.objects
                .lock()
                .unwrap()
                .insert(key.to_string(), data.to_vec());
            Ok(())
        }

        async fn download(&self, key: &str) -> Result<Vec<u8>, AppError> {
            self.objects
                .lock()
                .unwrap()
                .get(key)
                .cloned()
                .ok_or_else(|| AppError::NotFound(format!("No object '{}'", key)))
        }

        async fn delete(&self, key: &str) -> Result<(), AppError> {
            self.objects.lock().unwrap().remove(key);
            Ok(())
        }
    }
}
