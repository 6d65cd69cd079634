use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::*,
    error::{AppError, Result},
    repository::{EngagementRepository, NoticeRepository},
    service::role_resolver::ResolvedRole,
};

pub struct EngagementService {
    repo: Arc<dyn EngagementRepository>,
    notices: Arc<dyn NoticeRepository>,
}

impl EngagementService {
    pub fn new(repo: Arc<dyn EngagementRepository>, notices: Arc<dyn NoticeRepository>) -> Self {
        Self { repo, notices }
    }

    /// Same visibility rule as viewing the notice: a hidden notice is a 404.
    async fn require_visible(&self, notice_id: Uuid, viewer: Option<(Uuid, ResolvedRole)>) -> Result<Notice> {
        self.notices
            .find_by_id(notice_id)
            .await?
            .filter(|n| n.is_visible_to(viewer.map(|(id, role)| (id, role.tier))))
            .ok_or_else(|| AppError::NotFound("Notice not found".to_string()))
    }

    pub async fn toggle_like(&self, notice_id: Uuid, user_id: Uuid, role: ResolvedRole) -> Result<ToggleOutcome> {
        self.require_visible(notice_id, Some((user_id, role))).await?;
        self.repo.toggle_like(notice_id, user_id).await
    }

    pub async fn toggle_bookmark(&self, notice_id: Uuid, user_id: Uuid, role: ResolvedRole) -> Result<ToggleOutcome> {
        self.require_visible(notice_id, Some((user_id, role))).await?;
        self.repo.toggle_bookmark(notice_id, user_id).await
    }

    pub async fn bookmarks(&self, user_id: Uuid, role: ResolvedRole) -> Result<Vec<Notice>> {
        let mut notices = Vec::new();
        for id in self.repo.bookmarked_notice_ids(user_id).await? {
            // Deleted notices, and ones no longer visible to the user, drop out.
            if let Some(notice) = self.notices.find_by_id(id).await? {
                if notice.is_visible_to(Some((user_id, role.tier))) {
                    notices.push(notice);
                }
            }
        }
        Ok(notices)
    }

    pub async fn comment(
        &self,
        notice_id: Uuid,
        user_id: Uuid,
        role: ResolvedRole,
        request: CreateCommentRequest,
    ) -> Result<Comment> {
        let content = request.content.trim().to_string();
        if content.is_empty() {
            return Err(AppError::Validation("Comment cannot be empty".to_string()));
        }
        self.require_visible(notice_id, Some((user_id, role))).await?;

        if let Some(parent_id) = request.parent_id {
            let parent = self.repo.find_comment(parent_id).await?
                .ok_or_else(|| AppError::NotFound("Parent comment not found".to_string()))?;
            if parent.notice_id != notice_id {
                return Err(AppError::BadRequest("Reply must be on the same notice".to_string()));
            }
        }

        self.repo
            .create_comment(notice_id, user_id, CreateCommentRequest { content, parent_id: request.parent_id })
            .await
    }

    pub async fn comments(&self, notice_id: Uuid, viewer: Option<(Uuid, ResolvedRole)>) -> Result<Vec<Comment>> {
        self.require_visible(notice_id, viewer).await?;
        self.repo.list_comments(notice_id).await
    }

    pub async fn delete_comment(&self, id: Uuid, user_id: Uuid, role: ResolvedRole) -> Result<()> {
        let comment = self.repo.find_comment(id).await?
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;
        if comment.user_id != user_id && !role.tier.is_admin() {
            return Err(AppError::Forbidden);
        }
        self.repo.delete_comment(id).await
    }
}
