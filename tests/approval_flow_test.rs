mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use noticeboard::{
    config::RoleLookupFailurePolicy,
    domain::{
        AppRole, CreateCommentRequest, CreateSubscriptionRequest, NoticeCategory, NoticeStatus,
        ReviewRequest,
    },
    error::AppError,
    repository::{
        AuditRepository, NoticeRepository, RoleRepository, SqliteApprovalRepository,
        SqliteAuditRepository, SqliteEngagementRepository, SqliteNoticeRepository,
        SqliteNotificationRepository, SqliteRoleRepository,
    },
    service::{ApprovalService, EngagementService, NotificationService, ResolvedRole, RoleResolver},
};
use sqlx::SqlitePool;

use common::{insert_profile, notice, test_pool};

struct Fixture {
    pool: SqlitePool,
    notices: Arc<SqliteNoticeRepository>,
    approvals: ApprovalService,
    notifications: NotificationService,
    resolver: RoleResolver,
    roles: Arc<SqliteRoleRepository>,
}

async fn fixture() -> anyhow::Result<Fixture> {
    let pool = test_pool().await?;
    let notices = Arc::new(SqliteNoticeRepository::new(pool.clone()));
    let notification_repo = Arc::new(SqliteNotificationRepository::new(pool.clone()));
    let roles = Arc::new(SqliteRoleRepository::new(pool.clone()));

    Ok(Fixture {
        approvals: ApprovalService::new(
            notices.clone(),
            Arc::new(SqliteApprovalRepository::new(pool.clone())),
            notification_repo.clone(),
            Arc::new(SqliteAuditRepository::new(pool.clone())),
        ),
        notifications: NotificationService::new(notification_repo),
        resolver: RoleResolver::new(roles.clone(), RoleLookupFailurePolicy::DefaultToStudent),
        notices,
        roles,
        pool,
    })
}

impl Fixture {
    async fn user(&self, email: &str, role: AppRole) -> anyhow::Result<(uuid::Uuid, ResolvedRole)> {
        let profile = insert_profile(&self.pool, email).await?;
        self.roles.assign(profile.id, role, None).await?;
        Ok((profile.id, self.resolver.resolve(profile.id).await?))
    }
}

#[tokio::test]
async fn approving_publishes_and_notifies() -> anyhow::Result<()> {
    let fx = fixture().await?;
    let (author, _) = fx.user("author@uni.test", AppRole::Faculty).await?;
    let (reviewer, reviewer_role) = fx.user("dean@uni.test", AppRole::Dean).await?;
    let (subscriber, _) = fx.user("student@uni.test", AppRole::Student).await?;

    fx.notifications
        .subscribe(subscriber, CreateSubscriptionRequest { category: Some(NoticeCategory::Academic), department: None })
        .await?;

    let mut pending = notice(author, "Exam timetable", NoticeStatus::Pending, Utc::now());
    pending.category = NoticeCategory::Academic;
    let pending = fx.notices.create(pending).await?;

    let queue = fx.approvals.pending().await?;
    assert_eq!(queue.len(), 1);

    let approved = fx.approvals
        .approve(pending.id, reviewer, reviewer_role, ReviewRequest { comments: Some("Looks good".to_string()) })
        .await?;
    assert_eq!(approved.status, NoticeStatus::Approved);

    let history = fx.approvals.history(pending.id).await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].approver_id, reviewer);
    assert_eq!(history[0].approval_level, 1);
    assert_eq!(history[0].comments.as_deref(), Some("Looks good"));

    let author_inbox = fx.notifications.list(author).await?;
    assert_eq!(author_inbox.len(), 1);
    assert_eq!(author_inbox[0].notification_type, "notice_approved");
    assert_eq!(author_inbox[0].reference_id, Some(pending.id));

    let subscriber_inbox = fx.notifications.list(subscriber).await?;
    assert_eq!(subscriber_inbox.len(), 1);
    assert_eq!(subscriber_inbox[0].notification_type, "new_notice");

    fx.notifications.mark_read(subscriber_inbox[0].id, subscriber).await?;
    assert!(fx.notifications.list(subscriber).await?[0].read);
    let foreign = fx.notifications.mark_read(subscriber_inbox[0].id, author).await;
    assert!(matches!(foreign, Err(AppError::NotFound(_))));

    let audit = SqliteAuditRepository::new(fx.pool.clone()).list_recent(5).await?;
    assert_eq!(audit[0].action, "notice_approved");
    Ok(())
}

#[tokio::test]
async fn staff_follow_transitions_but_admins_override() -> anyhow::Result<()> {
    let fx = fixture().await?;
    let (author, _) = fx.user("author@uni.test", AppRole::Staff).await?;
    let (staff, staff_role) = fx.user("registrar@uni.test", AppRole::Registrar).await?;
    let (admin, admin_role) = fx.user("admin@uni.test", AppRole::Admin).await?;
    let (student, student_role) = fx.user("student@uni.test", AppRole::Student).await?;

    let draft = fx.notices.create(notice(author, "Draft", NoticeStatus::Draft, Utc::now())).await?;

    let by_staff = fx.approvals.approve(draft.id, staff, staff_role, ReviewRequest::default()).await;
    assert!(matches!(by_staff, Err(AppError::BadRequest(_))));

    let by_student = fx.approvals.reject(draft.id, student, student_role, ReviewRequest::default()).await;
    assert!(matches!(by_student, Err(AppError::Forbidden)));

    let by_admin = fx.approvals.approve(draft.id, admin, admin_role, ReviewRequest::default()).await?;
    assert_eq!(by_admin.status, NoticeStatus::Approved);
    assert_eq!(fx.approvals.history(draft.id).await?[0].approval_level, 2);

    let pending = fx.notices.create(notice(author, "Pending", NoticeStatus::Pending, Utc::now())).await?;
    let rejected = fx.approvals
        .reject(pending.id, staff, staff_role, ReviewRequest { comments: Some("  ".to_string()) })
        .await?;
    assert_eq!(rejected.status, NoticeStatus::Rejected);
    assert_eq!(fx.approvals.history(pending.id).await?[0].comments, None);
    Ok(())
}

#[tokio::test]
async fn expiry_sweep_only_touches_overdue_approved_notices() -> anyhow::Result<()> {
    let fx = fixture().await?;
    let (author, _) = fx.user("author@uni.test", AppRole::Staff).await?;
    let (admin, _) = fx.user("admin@uni.test", AppRole::Admin).await?;
    let now = Utc::now();

    let mut overdue = notice(author, "Overdue", NoticeStatus::Approved, now - Duration::days(3));
    overdue.expire_at = Some(now - Duration::hours(1));
    let overdue = fx.notices.create(overdue).await?;

    let mut pending = notice(author, "Pending but old", NoticeStatus::Pending, now - Duration::days(3));
    pending.expire_at = Some(now - Duration::hours(1));
    let pending = fx.notices.create(pending).await?;

    let expired = fx.approvals.expire_due(admin).await?;
    assert_eq!(expired.iter().map(|n| n.id).collect::<Vec<_>>(), vec![overdue.id]);
    assert_eq!(expired[0].status, NoticeStatus::Expired);

    let untouched = fx.notices.find_by_id(pending.id).await?.expect("notice exists");
    assert_eq!(untouched.status, NoticeStatus::Pending);

    assert!(fx.approvals.expire_due(admin).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn likes_bookmarks_and_comments() -> anyhow::Result<()> {
    let fx = fixture().await?;
    let (author, author_role) = fx.user("author@uni.test", AppRole::Staff).await?;
    let (reader, reader_role) = fx.user("reader@uni.test", AppRole::Student).await?;
    let (other, other_role) = fx.user("other@uni.test", AppRole::Student).await?;
    let (admin, admin_role) = fx.user("admin@uni.test", AppRole::Admin).await?;

    let engagement = EngagementService::new(
        Arc::new(SqliteEngagementRepository::new(fx.pool.clone())),
        fx.notices.clone(),
    );
    let posted = fx.notices.create(notice(author, "Library hours", NoticeStatus::Approved, Utc::now())).await?;

    let liked = engagement.toggle_like(posted.id, reader, reader_role).await?;
    assert!(liked.active);
    assert_eq!(liked.count, 1);
    let unliked = engagement.toggle_like(posted.id, reader, reader_role).await?;
    assert!(!unliked.active);
    assert_eq!(unliked.count, 0);

    engagement.toggle_bookmark(posted.id, reader, reader_role).await?;
    let saved = engagement.bookmarks(reader, reader_role).await?;
    assert_eq!(saved.iter().map(|n| n.id).collect::<Vec<_>>(), vec![posted.id]);

    let empty = engagement
        .comment(posted.id, reader, reader_role, CreateCommentRequest { content: "  ".to_string(), parent_id: None })
        .await;
    assert!(matches!(empty, Err(AppError::Validation(_))));

    let question = engagement
        .comment(posted.id, reader, reader_role, CreateCommentRequest { content: "Open on Sunday?".to_string(), parent_id: None })
        .await?;
    let answer = engagement
        .comment(posted.id, author, author_role, CreateCommentRequest { content: "No".to_string(), parent_id: Some(question.id) })
        .await?;
    assert_eq!(answer.parent_id, Some(question.id));
    assert_eq!(engagement.comments(posted.id, None).await?.len(), 2);

    let not_theirs = engagement.delete_comment(question.id, other, other_role).await;
    assert!(matches!(not_theirs, Err(AppError::Forbidden)));

    engagement.delete_comment(answer.id, admin, admin_role).await?;
    engagement.delete_comment(question.id, reader, reader_role).await?;
    assert!(engagement.comments(posted.id, None).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn hidden_notices_reject_engagement_from_students() -> anyhow::Result<()> {
    let fx = fixture().await?;
    let (author, author_role) = fx.user("author@uni.test", AppRole::Staff).await?;
    let (student, student_role) = fx.user("student@uni.test", AppRole::Student).await?;

    let engagement = EngagementService::new(
        Arc::new(SqliteEngagementRepository::new(fx.pool.clone())),
        fx.notices.clone(),
    );
    let pending = fx.notices.create(notice(author, "Secret draft", NoticeStatus::Pending, Utc::now())).await?;

    let bookmark = engagement.toggle_bookmark(pending.id, student, student_role).await;
    assert!(matches!(bookmark, Err(AppError::NotFound(_))));
    let like = engagement.toggle_like(pending.id, student, student_role).await;
    assert!(matches!(like, Err(AppError::NotFound(_))));
    let comment = engagement
        .comment(pending.id, student, student_role, CreateCommentRequest { content: "Leak?".to_string(), parent_id: None })
        .await;
    assert!(matches!(comment, Err(AppError::NotFound(_))));
    let listed = engagement.comments(pending.id, Some((student, student_role))).await;
    assert!(matches!(listed, Err(AppError::NotFound(_))));
    assert!(matches!(engagement.comments(pending.id, None).await, Err(AppError::NotFound(_))));

    // The author can still work with it, and a bookmark taken while it was
    // approved disappears once it leaves the board.
    engagement
        .comment(pending.id, author, author_role, CreateCommentRequest { content: "Note to self".to_string(), parent_id: None })
        .await?;
    assert_eq!(engagement.comments(pending.id, Some((author, author_role))).await?.len(), 1);

    let posted = fx.notices.create(notice(author, "Library hours", NoticeStatus::Approved, Utc::now())).await?;
    engagement.toggle_bookmark(posted.id, student, student_role).await?;
    assert_eq!(engagement.bookmarks(student, student_role).await?.len(), 1);
    fx.notices.update_status(posted.id, NoticeStatus::Expired).await?;
    assert!(engagement.bookmarks(student, student_role).await?.is_empty());
    Ok(())
}
