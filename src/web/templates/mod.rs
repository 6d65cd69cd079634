pub mod auth;

use askama::Template;
use axum::{
    response::{Html, IntoResponse, Response},
    http::StatusCode,
};

use crate::{
    api::middleware::auth::CurrentUser,
    domain::{plain_text_excerpt, Notice},
};

const EXCERPT_CHARS: usize = 180;

#[derive(Debug, Clone)]
pub struct UserInfo {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub tier: String,
}

impl From<&CurrentUser> for UserInfo {
    fn from(user: &CurrentUser) -> Self {
        Self {
            id: user.profile.id.to_string(),
            full_name: user.profile.full_name.clone(),
            email: user.profile.email.clone(),
            role: user.role.role.to_string(),
            tier: user.role.tier.as_str().to_string(),
        }
    }
}

/// What a notice card on the board and dashboards shows.
#[derive(Debug, Clone)]
pub struct NoticeCard {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    pub category: String,
    pub priority: String,
    pub status: String,
    pub banner_url: Option<String>,
    pub attachment_count: usize,
    pub views: i64,
    pub created_at: String,
}

impl From<&Notice> for NoticeCard {
    fn from(notice: &Notice) -> Self {
        Self {
            id: notice.id.to_string(),
            title: notice.title.clone(),
            excerpt: plain_text_excerpt(&notice.content, EXCERPT_CHARS),
            category: notice.category.label().to_string(),
            priority: notice.priority.as_str().to_string(),
            status: notice.status.as_str().to_string(),
            banner_url: notice.banner_url.clone(),
            attachment_count: notice.attachments.len(),
            views: notice.view_count,
            created_at: notice.created_at.format("%b %-d, %Y").to_string(),
        }
    }
}

pub fn cards(notices: &[Notice]) -> Vec<NoticeCard> {
    notices.iter().map(NoticeCard::from).collect()
}

// Make askama templates work with axum
pub struct HtmlTemplate<T>(pub T);

impl<T> IntoResponse for HtmlTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => {
                tracing::error!("Failed to render template: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to render template: {}", err),
                ).into_response()
            }
        }
    }
}
