use std::sync::Arc;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::{
    domain::*,
    error::{AppError, Result},
    repository::{ApprovalRepository, AuditRepository, NoticeRepository, NotificationRepository},
    service::role_resolver::ResolvedRole,
};

pub struct ApprovalService {
    notices: Arc<dyn NoticeRepository>,
    approvals: Arc<dyn ApprovalRepository>,
    notifications: Arc<dyn NotificationRepository>,
    audit: Arc<dyn AuditRepository>,
}

impl ApprovalService {
    pub fn new(
        notices: Arc<dyn NoticeRepository>,
        approvals: Arc<dyn ApprovalRepository>,
        notifications: Arc<dyn NotificationRepository>,
        audit: Arc<dyn AuditRepository>,
    ) -> Self {
        Self { notices, approvals, notifications, audit }
    }

    pub async fn pending(&self) -> Result<Vec<Notice>> {
        self.notices.list_by_status(NoticeStatus::Pending).await
    }

    pub async fn history(&self, notice_id: Uuid) -> Result<Vec<NoticeApproval>> {
        self.approvals.list_for_notice(notice_id).await
    }

    pub async fn approve(&self, notice_id: Uuid, reviewer: Uuid, role: ResolvedRole, request: ReviewRequest) -> Result<Notice> {
        self.decide(notice_id, reviewer, role, ApprovalDecision::Approved, request).await
    }

    pub async fn reject(&self, notice_id: Uuid, reviewer: Uuid, role: ResolvedRole, request: ReviewRequest) -> Result<Notice> {
        self.decide(notice_id, reviewer, role, ApprovalDecision::Rejected, request).await
    }

    async fn decide(
        &self,
        notice_id: Uuid,
        reviewer: Uuid,
        role: ResolvedRole,
        decision: ApprovalDecision,
        request: ReviewRequest,
    ) -> Result<Notice> {
        if !role.tier.can_review_notices() {
            return Err(AppError::Forbidden);
        }

        let notice = self.notices.find_by_id(notice_id).await?
            .ok_or_else(|| AppError::NotFound("Notice not found".to_string()))?;

        let target = decision.target_status();
        // Admins may move a notice from any state.
        if !role.tier.is_admin() && !notice.status.can_transition_to(target) {
            return Err(AppError::BadRequest(format!(
                "Cannot move a {} notice to {}",
                notice.status.as_str(),
                target.as_str()
            )));
        }

        let comments = blank_to_none(request.comments);
        let now = Utc::now();
        self.approvals
            .create(NoticeApproval {
                id: Uuid::new_v4(),
                notice_id,
                approver_id: reviewer,
                approval_level: role.role.approval_level(),
                status: decision,
                comments: comments.clone(),
                approved_at: Some(now),
                created_at: now,
            })
            .await?;

        let updated = self.notices.update_status(notice_id, target).await?;

        self.audit
            .record(
                NewAuditLog::new(reviewer, &format!("notice_{}", decision.as_str()), "notice", notice_id)
                    .with_details(json!({
                        "from": notice.status.as_str(),
                        "to": target.as_str(),
                        "comments": comments,
                    })),
            )
            .await?;

        self.notify_author(&updated, decision, comments.as_deref()).await?;
        if decision == ApprovalDecision::Approved {
            self.notify_subscribers(&updated).await?;
        }

        tracing::info!("Notice {} {} by {}", notice_id, decision.as_str(), reviewer);
        Ok(updated)
    }

    async fn notify_author(&self, notice: &Notice, decision: ApprovalDecision, comments: Option<&str>) -> Result<()> {
        let (title, mut message) = match decision {
            ApprovalDecision::Approved => (
                "Notice approved",
                format!("Your notice \"{}\" has been approved and published.", notice.title),
            ),
            ApprovalDecision::Rejected => (
                "Notice rejected",
                format!("Your notice \"{}\" was rejected.", notice.title),
            ),
        };
        if let Some(comments) = comments {
            message.push_str(&format!(" Reviewer comments: {}", comments));
        }

        self.notifications
            .create(NewNotification {
                user_id: notice.author_id,
                title: title.to_string(),
                message,
                notification_type: format!("notice_{}", decision.as_str()),
                reference_id: Some(notice.id),
            })
            .await?;
        Ok(())
    }

    async fn notify_subscribers(&self, notice: &Notice) -> Result<()> {
        let subscribers = self.notifications.subscribers_for_category(notice.category).await?;
        for user_id in subscribers.into_iter().filter(|id| *id != notice.author_id) {
            self.notifications
                .create(NewNotification {
                    user_id,
                    title: format!("New {} notice", notice.category.label()),
                    message: notice.title.clone(),
                    notification_type: "new_notice".to_string(),
                    reference_id: Some(notice.id),
                })
                .await?;
        }
        Ok(())
    }

    /// Marks approved notices past their expiry as expired.
    pub async fn expire_due(&self, actor: Uuid) -> Result<Vec<Notice>> {
        let due = self.notices.list_expirable(Utc::now()).await?;
        let mut expired = Vec::with_capacity(due.len());

        for notice in due {
            expired.push(self.notices.update_status(notice.id, NoticeStatus::Expired).await?);
        }

        if !expired.is_empty() {
            tracing::info!("Expired {} notice(s)", expired.len());
            self.audit
                .record(
                    NewAuditLog::new(actor, "notices_expired", "notice", expired.len())
                        .with_details(json!({
                            "ids": expired.iter().map(|n| n.id).collect::<Vec<_>>(),
                        })),
                )
                .await?;
        }

        Ok(expired)
    }
}
