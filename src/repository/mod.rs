use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use uuid::Uuid;
use crate::domain::*;
use crate::error::{AppError, Result};

pub mod profile_repository;
pub mod role_repository;
pub mod department_repository;
pub mod notice_repository;
pub mod approval_repository;
pub mod engagement_repository;
pub mod notification_repository;
pub mod audit_repository;

pub use profile_repository::SqliteProfileRepository;
pub use role_repository::SqliteRoleRepository;
pub use department_repository::SqliteDepartmentRepository;
pub use notice_repository::SqliteNoticeRepository;
pub use approval_repository::SqliteApprovalRepository;
pub use engagement_repository::SqliteEngagementRepository;
pub use notification_repository::SqliteNotificationRepository;
pub use audit_repository::SqliteAuditRepository;

/// Identity-side fields needed to create a profile row.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn create(&self, profile: NewProfile) -> Result<Profile>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Profile>>;
    async fn list(&self) -> Result<Vec<Profile>>;
    async fn update(&self, id: Uuid, update: UpdateProfileRequest) -> Result<Profile>;
    async fn delete(&self, id: Uuid) -> Result<()>;
    async fn count(&self) -> Result<i64>;
    async fn password_hash(&self, email: &str) -> Result<Option<(Uuid, String)>>;
}

#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn find_role(&self, user_id: Uuid) -> Result<Option<AppRole>>;
    /// Inserts or replaces the single role row of a user.
    async fn assign(&self, user_id: Uuid, role: AppRole, assigned_by: Option<Uuid>) -> Result<RoleAssignment>;
    async fn list_all(&self) -> Result<Vec<RoleAssignment>>;
    async fn count_distinct_roles(&self) -> Result<i64>;
}

#[async_trait]
pub trait DepartmentRepository: Send + Sync {
    async fn create(&self, request: CreateDepartmentRequest) -> Result<Department>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Department>>;
    async fn find_by_name(&self, name: &str) -> Result<Option<Department>>;
    async fn list(&self) -> Result<Vec<Department>>;
    async fn update(&self, id: Uuid, update: UpdateDepartmentRequest) -> Result<Department>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait NoticeRepository: Send + Sync {
    async fn create(&self, notice: Notice) -> Result<Notice>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Notice>>;
    async fn list_approved(&self, query: &NoticeQuery, limit: Option<i64>) -> Result<Vec<Notice>>;
    async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<Notice>>;
    async fn list_by_status(&self, status: NoticeStatus) -> Result<Vec<Notice>>;
    async fn list_expirable(&self, now: DateTime<Utc>) -> Result<Vec<Notice>>;
    async fn update_status(&self, id: Uuid, status: NoticeStatus) -> Result<Notice>;
    async fn increment_views(&self, id: Uuid) -> Result<()>;
    async fn delete(&self, id: Uuid) -> Result<()>;
    async fn stats(&self, author_id: Option<Uuid>) -> Result<NoticeStats>;
}

#[async_trait]
pub trait ApprovalRepository: Send + Sync {
    async fn create(&self, approval: NoticeApproval) -> Result<NoticeApproval>;
    async fn list_for_notice(&self, notice_id: Uuid) -> Result<Vec<NoticeApproval>>;
}

#[async_trait]
pub trait EngagementRepository: Send + Sync {
    async fn toggle_like(&self, notice_id: Uuid, user_id: Uuid) -> Result<ToggleOutcome>;
    async fn toggle_bookmark(&self, notice_id: Uuid, user_id: Uuid) -> Result<ToggleOutcome>;
    async fn bookmarked_notice_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>>;
    async fn create_comment(&self, notice_id: Uuid, user_id: Uuid, request: CreateCommentRequest) -> Result<Comment>;
    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>>;
    async fn list_comments(&self, notice_id: Uuid) -> Result<Vec<Comment>>;
    async fn delete_comment(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: NewNotification) -> Result<Notification>;
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>>;
    /// Returns false when no notification with that id belongs to the user.
    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<bool>;
    async fn create_subscription(&self, user_id: Uuid, request: CreateSubscriptionRequest) -> Result<NotificationSubscription>;
    async fn list_subscriptions(&self, user_id: Uuid) -> Result<Vec<NotificationSubscription>>;
    async fn delete_subscription(&self, id: Uuid, user_id: Uuid) -> Result<bool>;
    async fn subscribers_for_category(&self, category: NoticeCategory) -> Result<Vec<Uuid>>;
}

#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn record(&self, entry: NewAuditLog) -> Result<AuditLog>;
    async fn list_recent(&self, limit: i64) -> Result<Vec<AuditLog>>;
}

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| AppError::Database(e.to_string()))
}

pub(crate) fn parse_optional_uuid(s: Option<String>) -> Result<Option<Uuid>> {
    s.as_deref().map(parse_uuid).transpose()
}

pub(crate) fn to_utc(dt: NaiveDateTime) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(dt, Utc)
}

/// Stored enum values that fail to parse mean the row is corrupt, not that
/// the caller sent bad input.
pub(crate) fn parse_column<T>(value: &str) -> Result<T>
where
    T: std::str::FromStr<Err = AppError>,
{
    value.parse::<T>().map_err(|e| AppError::Database(e.to_string()))
}
