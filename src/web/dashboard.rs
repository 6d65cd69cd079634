use askama::Template;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Extension,
};

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{AdminStats, AuditLog, NoticeQuery, NoticeStats, RoleTier},
    error::Result,
    web::templates::{cards, HtmlTemplate, NoticeCard, UserInfo},
};

const STUDENT_FEED_LIMIT: i64 = 6;
const RECENT_AUDIT_ENTRIES: i64 = 10;

#[derive(Template)]
#[template(path = "dashboard/admin.html")]
pub struct AdminDashboardTemplate {
    pub current_user: Option<UserInfo>,
    pub stats: AdminStats,
    pub pending: Vec<NoticeCard>,
    pub recent_activity: Vec<AuditEntry>,
}

pub struct AuditEntry {
    pub action: String,
    pub entity: String,
    pub at: String,
}

impl From<&AuditLog> for AuditEntry {
    fn from(log: &AuditLog) -> Self {
        Self {
            action: log.action.replace('_', " "),
            entity: match &log.entity_id {
                Some(id) => format!("{} {}", log.entity_type, id),
                None => log.entity_type.clone(),
            },
            at: log.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "dashboard/staff.html")]
pub struct StaffDashboardTemplate {
    pub current_user: Option<UserInfo>,
    pub stats: NoticeStats,
    pub my_notices: Vec<NoticeCard>,
    pub review_queue: Vec<NoticeCard>,
}

#[derive(Template)]
#[template(path = "dashboard/student.html")]
pub struct StudentDashboardTemplate {
    pub current_user: Option<UserInfo>,
    pub notices: Vec<NoticeCard>,
    pub unread: usize,
}

/// Picks the dashboard for the caller's tier.
pub async fn dashboard_page(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Response> {
    let current_user = Some(UserInfo::from(&user));
    let ctx = &state.service_context;

    let response = match user.tier() {
        RoleTier::Admin => {
            let stats = ctx.user_service.admin_stats().await?;
            let pending = ctx.approval_service.pending().await?;
            let recent_activity = ctx.user_service
                .audit_log(RECENT_AUDIT_ENTRIES)
                .await?
                .iter()
                .map(AuditEntry::from)
                .collect();

            HtmlTemplate(AdminDashboardTemplate {
                current_user,
                stats,
                pending: cards(&pending),
                recent_activity,
            })
            .into_response()
        }
        RoleTier::Staff => {
            let stats = ctx.notice_service.stats(Some(user.id())).await?;
            let mine = ctx.notice_service.list_mine(user.id()).await?;
            let queue = ctx.approval_service.pending().await?;

            HtmlTemplate(StaffDashboardTemplate {
                current_user,
                stats,
                my_notices: cards(&mine),
                review_queue: cards(&queue),
            })
            .into_response()
        }
        RoleTier::Student => {
            let query = NoticeQuery {
                limit: Some(STUDENT_FEED_LIMIT),
                ..Default::default()
            };
            let notices = ctx.notice_service.list_approved(&query).await?;
            let unread = ctx.notification_service
                .list(user.id())
                .await?
                .iter()
                .filter(|n| !n.read)
                .count();

            HtmlTemplate(StudentDashboardTemplate {
                current_user,
                notices: cards(&notices),
                unread,
            })
            .into_response()
        }
    };

    Ok(response)
}
