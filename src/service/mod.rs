pub mod role_resolver;
pub mod notice_service;
pub mod approval_service;
pub mod department_service;
pub mod user_service;
pub mod engagement_service;
pub mod notification_service;

use std::sync::Arc;
use sqlx::SqlitePool;
use crate::repository::*;
use crate::auth::AuthService;
use crate::config::Settings;
use crate::storage::ObjectStorage;

pub use role_resolver::{ResolvedRole, RoleResolver};
pub use notice_service::{FailedUpload, NoticeService, NoticeSubmission, SubmissionReport};
pub use approval_service::ApprovalService;
pub use department_service::DepartmentService;
pub use user_service::UserService;
pub use engagement_service::EngagementService;
pub use notification_service::NotificationService;

pub struct ServiceContext {
    pub auth_service: Arc<AuthService>,
    pub role_resolver: Arc<RoleResolver>,
    pub notice_service: Arc<NoticeService>,
    pub approval_service: Arc<ApprovalService>,
    pub department_service: Arc<DepartmentService>,
    pub user_service: Arc<UserService>,
    pub engagement_service: Arc<EngagementService>,
    pub notification_service: Arc<NotificationService>,
    pub profile_repo: Arc<dyn ProfileRepository>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(
        db_pool: SqlitePool,
        storage: Arc<dyn ObjectStorage>,
        settings: &Settings,
    ) -> Self {
        let profile_repo: Arc<dyn ProfileRepository> = Arc::new(SqliteProfileRepository::new(db_pool.clone()));
        let role_repo: Arc<dyn RoleRepository> = Arc::new(SqliteRoleRepository::new(db_pool.clone()));
        let department_repo = Arc::new(SqliteDepartmentRepository::new(db_pool.clone()));
        let notice_repo: Arc<dyn NoticeRepository> = Arc::new(SqliteNoticeRepository::new(db_pool.clone()));
        let approval_repo = Arc::new(SqliteApprovalRepository::new(db_pool.clone()));
        let engagement_repo = Arc::new(SqliteEngagementRepository::new(db_pool.clone()));
        let notification_repo: Arc<dyn NotificationRepository> = Arc::new(SqliteNotificationRepository::new(db_pool.clone()));
        let audit_repo: Arc<dyn AuditRepository> = Arc::new(SqliteAuditRepository::new(db_pool.clone()));

        let auth_service = Arc::new(AuthService::new(
            db_pool.clone(),
            profile_repo.clone(),
            role_repo.clone(),
            settings.auth.session_duration_hours,
        ));

        let role_resolver = Arc::new(RoleResolver::new(
            role_repo.clone(),
            settings.policy.role_lookup_failure,
        ));
        let notice_service = Arc::new(NoticeService::new(
            notice_repo.clone(),
            storage,
            settings.policy.attachment_upload_failure,
            settings.listing.clone(),
        ));
        let approval_service = Arc::new(ApprovalService::new(
            notice_repo.clone(),
            approval_repo,
            notification_repo.clone(),
            audit_repo.clone(),
        ));
        let department_service = Arc::new(DepartmentService::new(department_repo, audit_repo.clone()));
        let user_service = Arc::new(UserService::new(
            auth_service.clone(),
            profile_repo.clone(),
            role_repo,
            notice_repo.clone(),
            audit_repo,
        ));
        let engagement_service = Arc::new(EngagementService::new(engagement_repo, notice_repo));
        let notification_service = Arc::new(NotificationService::new(notification_repo));

        Self {
            auth_service,
            role_resolver,
            notice_service,
            approval_service,
            department_service,
            user_service,
            engagement_service,
            notification_service,
            profile_repo,
            db_pool,
        }
    }
}
