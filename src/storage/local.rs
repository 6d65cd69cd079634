use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::{
    error::{AppError, Result},
    storage::{Bucket, ObjectStorage, UploadedFile},
};

/// Stores objects as files under `<root>/<bucket>/<key>`.
pub struct LocalObjectStorage {
    root: PathBuf,
    public_base_url: String,
    max_file_size: usize,
}

impl LocalObjectStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>, max_file_size: usize) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
            max_file_size,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, bucket: Bucket, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains('/') || key.contains('\\') || key.starts_with('.') {
            return Err(AppError::Storage(format!("Invalid object key: {}", key)));
        }
        Ok(self.root.join(bucket.name()).join(key))
    }

    fn validate(&self, bucket: Bucket, file: &UploadedFile) -> Result<()> {
        if file.data.len() > self.max_file_size {
            return Err(AppError::Validation(format!(
                "{} is too large (max {} MB)",
                file.file_name,
                self.max_file_size / (1024 * 1024)
            )));
        }

        let allowed = bucket.allowed_extensions();
        match file.extension() {
            Some(ext) if allowed.contains(&ext.as_str()) => Ok(()),
            _ => Err(AppError::Validation(format!(
                "Invalid file type for {}. Allowed: {}",
                file.file_name,
                allowed.join(", ")
            ))),
        }
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn upload(&self, bucket: Bucket, key: &str, file: &UploadedFile) -> Result<()> {
        self.validate(bucket, file)?;
        let path = self.object_path(bucket, key)?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).await.map_err(|e| {
                AppError::Storage(format!("Failed to create bucket directory: {}", e))
            })?;
        }

        let mut out = fs::File::create(&path).await.map_err(|e| {
            AppError::Storage(format!("Failed to create object: {}", e))
        })?;

        out.write_all(&file.data).await.map_err(|e| {
            AppError::Storage(format!("Failed to write object: {}", e))
        })?;
        out.flush().await.map_err(|e| {
            AppError::Storage(format!("Failed to write object: {}", e))
        })?;

        tracing::debug!("Stored {} bytes at {}/{}", file.data.len(), bucket.name(), key);
        Ok(())
    }

    fn public_url(&self, bucket: Bucket, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.public_base_url.trim_end_matches('/'),
            bucket.name(),
            key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn scratch_storage() -> LocalObjectStorage {
        let root = std::env::temp_dir().join(format!("noticeboard-storage-{}", Uuid::new_v4()));
        LocalObjectStorage::new(root, "/storage/", 1024)
    }

    fn pdf(size: usize) -> UploadedFile {
        UploadedFile {
            file_name: "handbook.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            data: vec![7; size],
        }
    }

    #[tokio::test]
    async fn upload_writes_under_bucket_dir() {
        let storage = scratch_storage();
        storage.upload(Bucket::NoticeAttachments, "abc.pdf", &pdf(10)).await.unwrap();

        let written = fs::read(storage.root().join("notice-attachments").join("abc.pdf")).await.unwrap();
        assert_eq!(written.len(), 10);
        assert_eq!(
            storage.public_url(Bucket::NoticeAttachments, "abc.pdf"),
            "/storage/notice-attachments/abc.pdf"
        );

        let _ = fs::remove_dir_all(storage.root()).await;
    }

    #[tokio::test]
    async fn rejects_oversized_and_wrong_type() {
        let storage = scratch_storage();
        let too_big = storage.upload(Bucket::NoticeAttachments, "big.pdf", &pdf(2048)).await;
        assert!(matches!(too_big, Err(AppError::Validation(_))));

        let banner = storage.upload(Bucket::NoticeBanners, "x.pdf", &pdf(10)).await;
        assert!(matches!(banner, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn refuses_path_traversal_keys() {
        let storage = scratch_storage();
        let result = storage.upload(Bucket::NoticeAttachments, "../escape.pdf", &pdf(10)).await;
        assert!(matches!(result, Err(AppError::Storage(_))));
    }
}
