use std::sync::Arc;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    config::{AttachmentFailurePolicy, ListingConfig},
    domain::*,
    error::{AppError, Result},
    repository::NoticeRepository,
    service::role_resolver::ResolvedRole,
    storage::{object_key, Bucket, ObjectStorage, UploadedFile},
};

pub const REQUIRED_FIELDS_MESSAGE: &str = "Title and content are required";

/// Everything the authoring form sends in one submission.
#[derive(Debug, Clone)]
pub struct NoticeSubmission {
    pub draft: NoticeDraft,
    pub action: SubmissionAction,
    pub banner: Option<UploadedFile>,
    pub attachments: Vec<UploadedFile>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FailedUpload {
    pub file_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReport {
    pub notice: Notice,
    pub failed_uploads: Vec<FailedUpload>,
}

pub struct NoticeService {
    notices: Arc<dyn NoticeRepository>,
    storage: Arc<dyn ObjectStorage>,
    attachment_policy: AttachmentFailurePolicy,
    listing: ListingConfig,
}

impl NoticeService {
    pub fn new(
        notices: Arc<dyn NoticeRepository>,
        storage: Arc<dyn ObjectStorage>,
        attachment_policy: AttachmentFailurePolicy,
        listing: ListingConfig,
    ) -> Self {
        Self { notices, storage, attachment_policy, listing }
    }

    /// Validates, uploads the files, then inserts exactly one notice.
    ///
    /// Validation happens before any upload or insert. Title and content are
    /// stored exactly as submitted; whitespace only matters for the emptiness
    /// check. Files already stored are left in place if a later step fails.
    pub async fn submit(&self, author_id: Uuid, submission: NoticeSubmission) -> Result<SubmissionReport> {
        let NoticeSubmission { draft, action, banner, attachments } = submission;

        if draft.title.trim().is_empty() || draft.content.trim().is_empty() {
            return Err(AppError::Validation(REQUIRED_FIELDS_MESSAGE.to_string()));
        }

        let mut failed_uploads = Vec::new();
        let mut stored_urls = Vec::new();

        let banner_url = match banner {
            Some(file) => {
                let url = self
                    .upload_or_report(Bucket::NoticeBanners, &file, &mut failed_uploads)
                    .await
                    .inspect_err(|_| warn_orphaned(&stored_urls))?;
                stored_urls.extend(url.clone());
                url
            }
            None => None,
        };

        let mut stored_attachments = Vec::with_capacity(attachments.len());
        for file in &attachments {
            let uploaded = self
                .upload_or_report(Bucket::NoticeAttachments, file, &mut failed_uploads)
                .await
                .inspect_err(|_| warn_orphaned(&stored_urls))?;
            if let Some(url) = uploaded {
                stored_urls.push(url.clone());
                stored_attachments.push(Attachment {
                    name: file.file_name.clone(),
                    url,
                    mime_type: file.content_type.clone(),
                    size: file.size(),
                });
            }
        }

        let target_audience = if draft.target_audience.is_empty() {
            default_audience()
        } else {
            draft.target_audience
        };

        let now = Utc::now();
        let notice = Notice {
            id: Uuid::new_v4(),
            title: draft.title,
            content: draft.content,
            category: draft.category,
            priority: draft.priority,
            status: action.into(),
            author_id,
            banner_url,
            attachments: stored_attachments,
            target_audience,
            publish_at: draft.publish_at,
            expire_at: draft.expire_at,
            archived: false,
            views: 0,
            view_count: 0,
            created_at: now,
            updated_at: now,
        };

        let notice = match self.notices.create(notice).await {
            Ok(notice) => notice,
            Err(e) => {
                warn_orphaned(&stored_urls);
                return Err(e);
            }
        };

        tracing::info!(
            "Notice {} created as {} by {} ({} attachment(s), {} failed upload(s))",
            notice.id,
            notice.status.as_str(),
            author_id,
            notice.attachments.len(),
            failed_uploads.len()
        );

        Ok(SubmissionReport { notice, failed_uploads })
    }

    async fn upload_or_report(
        &self,
        bucket: Bucket,
        file: &UploadedFile,
        failed: &mut Vec<FailedUpload>,
    ) -> Result<Option<String>> {
        let key = object_key(file);
        match self.storage.upload(bucket, &key, file).await {
            Ok(()) => Ok(Some(self.storage.public_url(bucket, &key))),
            Err(e) => {
                tracing::warn!("Failed to upload {} to {}: {}", file.file_name, bucket.name(), e);
                match self.attachment_policy {
                    AttachmentFailurePolicy::SkipFailed => {
                        failed.push(FailedUpload {
                            file_name: file.file_name.clone(),
                            reason: e.to_string(),
                        });
                        Ok(None)
                    }
                    AttachmentFailurePolicy::Abort => Err(e),
                }
            }
        }
    }

    /// Approved, non-archived notices. Newest first unless the query asks otherwise.
    ///
    /// Without a limit every approved notice is returned; a requested limit
    /// is clamped to the configured maximum.
    pub async fn list_approved(&self, query: &NoticeQuery) -> Result<Vec<Notice>> {
        let limit = query.limit.map(|l| l.clamp(1, self.listing.max_limit));
        self.notices.list_approved(query, limit).await
    }

    /// Fetches a notice for display and counts the view.
    ///
    /// Anything not yet approved is only visible to its author and reviewers.
    pub async fn view(&self, id: Uuid, viewer: Option<(Uuid, ResolvedRole)>) -> Result<Notice> {
        let notice = self.find(id).await?;

        if !notice.is_visible_to(viewer.map(|(user_id, role)| (user_id, role.tier))) {
            return Err(AppError::NotFound("Notice not found".to_string()));
        }
        if notice.status != NoticeStatus::Approved {
            return Ok(notice);
        }

        self.notices.increment_views(id).await?;
        Ok(Notice {
            views: notice.views + 1,
            view_count: notice.view_count + 1,
            ..notice
        })
    }

    pub async fn find(&self, id: Uuid) -> Result<Notice> {
        self.notices
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Notice not found".to_string()))
    }

    pub async fn list_mine(&self, author_id: Uuid) -> Result<Vec<Notice>> {
        self.notices.list_by_author(author_id).await
    }

    /// Moves the author's own draft (or rejected notice) into review.
    pub async fn submit_for_review(&self, id: Uuid, author_id: Uuid) -> Result<Notice> {
        let notice = self.find(id).await?;
        if notice.author_id != author_id {
            return Err(AppError::Forbidden);
        }

        // A rejected notice goes back through draft before review.
        if notice.status == NoticeStatus::Rejected {
            self.notices.update_status(id, NoticeStatus::Draft).await?;
        } else if !notice.status.can_transition_to(NoticeStatus::Pending) {
            return Err(AppError::BadRequest(format!(
                "A {} notice cannot be submitted for review",
                notice.status.as_str()
            )));
        }

        self.notices.update_status(id, NoticeStatus::Pending).await
    }

    pub async fn delete(&self, id: Uuid, user_id: Uuid, role: ResolvedRole) -> Result<()> {
        let notice = self.find(id).await?;
        if notice.author_id != user_id && !role.tier.is_admin() {
            return Err(AppError::Forbidden);
        }

        self.notices.delete(id).await?;
        tracing::info!("Notice {} deleted by {}", id, user_id);
        Ok(())
    }

    pub async fn stats(&self, author_id: Option<Uuid>) -> Result<NoticeStats> {
        self.notices.stats(author_id).await
    }
}

fn warn_orphaned(stored_urls: &[String]) {
    if !stored_urls.is_empty() {
        tracing::warn!("Notice submission failed after upload; orphaned objects: {:?}", stored_urls);
    }
}
