//! Object storage for notice banners and attachments.
//!
//! Objects live in named buckets under randomized keys; callers only ever
//! hold the public URL returned after a successful upload.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;

pub mod local;

pub use local::LocalObjectStorage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    NoticeBanners,
    NoticeAttachments,
}

impl Bucket {
    pub fn name(self) -> &'static str {
        match self {
            Bucket::NoticeBanners => "notice-banners",
            Bucket::NoticeAttachments => "notice-attachments",
        }
    }

    pub fn allowed_extensions(self) -> &'static [&'static str] {
        match self {
            Bucket::NoticeBanners => &["jpg", "jpeg", "png", "gif", "webp"],
            Bucket::NoticeAttachments => &["pdf", "doc", "docx", "jpg", "jpeg", "png", "mp4", "mov"],
        }
    }
}

/// A file received from the authoring form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.file_name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_lowercase())
    }
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(&self, bucket: Bucket, key: &str, file: &UploadedFile) -> Result<()>;
    fn public_url(&self, bucket: Bucket, key: &str) -> String;
}

/// Random object key that keeps the original extension.
pub fn object_key(file: &UploadedFile) -> String {
    match file.extension() {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
        None => Uuid::new_v4().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            content_type: "application/octet-stream".to_string(),
            data: vec![0; 4],
        }
    }

    #[test]
    fn keys_are_random_and_keep_extension() {
        let a = object_key(&file("Timetable.PDF"));
        let b = object_key(&file("Timetable.PDF"));
        assert_ne!(a, b);
        assert!(a.ends_with(".pdf"));
    }

    #[test]
    fn dotfiles_have_no_extension() {
        assert_eq!(file(".env").extension(), None);
        assert_eq!(file("README").extension(), None);
        assert_eq!(file("notes.final.docx").extension().as_deref(), Some("docx"));
    }
}
