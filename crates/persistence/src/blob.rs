//! Filesystem blob store for complaint images and resolution proofs.

use std::path::{Path, PathBuf};

use domain::errors::StoreError;
use domain::services::BlobStore;
use shared::validation::{sanitize_file_name, validate_blob_reference};
use tracing::{debug, info};
use uuid::Uuid;

/// Stores each blob as a single file named `<uuid>-<sanitized name>`.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, reference: &str) -> Result<PathBuf, StoreError> {
        validate_blob_reference(reference)
            .map_err(|_| StoreError::Backend(format!("invalid blob reference: {}", reference)))?;
        Ok(self.root.join(reference))
    }
}

#[async_trait::async_trait]
impl BlobStore for FsBlobStore {
    async fn upload(&self, bytes: &[u8], name: &str) -> Result<String, StoreError> {
        let file_name = sanitize_file_name(name).unwrap_or_else(|| "upload".to_string());
        let reference = format!("{}-{}", Uuid::new_v4(), file_name);
        let path = self.path_for(&reference)?;

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StoreError::Backend(format!("create blob dir: {}", e)))?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| StoreError::Backend(format!("write blob: {}", e)))?;

        info!(reference = %reference, size = bytes.len(), "Blob stored");
        Ok(reference)
    }

    async fn fetch(&self, reference: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(reference)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(reference = %reference, "Blob not found");
                Ok(None)
            }
            Err(e) => Err(StoreError::Backend(format!("read blob: {}", e))),
        }
    }
}
