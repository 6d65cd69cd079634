use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt::Display, str::FromStr};
use uuid::Uuid;

use super::RoleTier;
use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub category: NoticeCategory,
    pub priority: NoticePriority,
    pub status: NoticeStatus,
    pub author_id: Uuid,
    pub banner_url: Option<String>,
    pub attachments: Vec<Attachment>,
    pub target_audience: Vec<String>,
    pub publish_at: Option<DateTime<Utc>>,
    pub expire_at: Option<DateTime<Utc>>,
    pub archived: bool,
    pub views: i64,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Notice {
    /// Approved notices are public. Anything else is only visible to its
    /// author and to reviewers.
    pub fn is_visible_to(&self, viewer: Option<(Uuid, RoleTier)>) -> bool {
        if self.status == NoticeStatus::Approved {
            return true;
        }
        match viewer {
            Some((user_id, tier)) => user_id == self.author_id || tier.can_review_notices(),
            None => false,
        }
    }
}

/// Descriptor for a file stored in the attachments bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeCategory {
    Academic,
    Administration,
    StudentAffairs,
    Events,
    Announcements,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticePriority {
    Urgent,
    Normal,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
    Expired,
}

/// The two statuses an author can pick when saving the authoring form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionAction {
    Draft,
    Pending,
}

impl NoticeCategory {
    pub const ALL: [NoticeCategory; 6] = [
        NoticeCategory::Academic,
        NoticeCategory::Administration,
        NoticeCategory::StudentAffairs,
        NoticeCategory::Events,
        NoticeCategory::Announcements,
        NoticeCategory::General,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NoticeCategory::Academic => "academic",
            NoticeCategory::Administration => "administration",
            NoticeCategory::StudentAffairs => "student_affairs",
            NoticeCategory::Events => "events",
            NoticeCategory::Announcements => "announcements",
            NoticeCategory::General => "general",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NoticeCategory::Academic => "Academic",
            NoticeCategory::Administration => "Administration",
            NoticeCategory::StudentAffairs => "Student Affairs",
            NoticeCategory::Events => "Events",
            NoticeCategory::Announcements => "Announcements",
            NoticeCategory::General => "General",
        }
    }
}

impl Default for NoticeCategory {
    fn default() -> Self {
        NoticeCategory::General
    }
}

impl FromStr for NoticeCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NoticeCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid notice category: {}", s)))
    }
}

impl NoticePriority {
    pub fn as_str(self) -> &'static str {
        match self {
            NoticePriority::Urgent => "urgent",
            NoticePriority::Normal => "normal",
            NoticePriority::Low => "low",
        }
    }
}

impl Default for NoticePriority {
    fn default() -> Self {
        NoticePriority::Normal
    }
}

impl FromStr for NoticePriority {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "urgent" => Ok(NoticePriority::Urgent),
            "normal" => Ok(NoticePriority::Normal),
            "low" => Ok(NoticePriority::Low),
            _ => Err(AppError::BadRequest(format!("Invalid notice priority: {}", s))),
        }
    }
}

impl NoticeStatus {
    pub const ALL: [NoticeStatus; 5] = [
        NoticeStatus::Draft,
        NoticeStatus::Pending,
        NoticeStatus::Approved,
        NoticeStatus::Rejected,
        NoticeStatus::Expired,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NoticeStatus::Draft => "draft",
            NoticeStatus::Pending => "pending",
            NoticeStatus::Approved => "approved",
            NoticeStatus::Rejected => "rejected",
            NoticeStatus::Expired => "expired",
        }
    }

    /// Regular lifecycle moves. Admin overrides bypass this table.
    pub fn can_transition_to(self, next: NoticeStatus) -> bool {
        matches!(
            (self, next),
            (NoticeStatus::Draft, NoticeStatus::Pending)
                | (NoticeStatus::Pending, NoticeStatus::Approved)
                | (NoticeStatus::Pending, NoticeStatus::Rejected)
                | (NoticeStatus::Rejected, NoticeStatus::Draft)
                | (NoticeStatus::Approved, NoticeStatus::Expired)
        )
    }
}

impl FromStr for NoticeStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NoticeStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid notice status: {}", s)))
    }
}

impl From<SubmissionAction> for NoticeStatus {
    fn from(action: SubmissionAction) -> Self {
        match action {
            SubmissionAction::Draft => NoticeStatus::Draft,
            SubmissionAction::Pending => NoticeStatus::Pending,
        }
    }
}

impl FromStr for SubmissionAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(SubmissionAction::Draft),
            "pending" | "submit" => Ok(SubmissionAction::Pending),
            _ => Err(AppError::BadRequest(format!("Invalid submission action: {}", s))),
        }
    }
}

/// Form state of the authoring view, before any file has been uploaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoticeDraft {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub category: NoticeCategory,
    #[serde(default)]
    pub priority: NoticePriority,
    pub publish_at: Option<DateTime<Utc>>,
    pub expire_at: Option<DateTime<Utc>>,
    #[serde(default = "default_audience")]
    pub target_audience: Vec<String>,
}

pub fn default_audience() -> Vec<String> {
    vec!["all".to_string()]
}

impl Default for NoticeDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            category: NoticeCategory::default(),
            priority: NoticePriority::default(),
            publish_at: None,
            expire_at: None,
            target_audience: default_audience(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NoticeSort {
    #[default]
    Newest,
    Oldest,
    MostViewed,
}

/// Filters for the approved listing. Empty query-string values mean "not set".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoticeQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub category: Option<NoticeCategory>,
    #[serde(default)]
    pub sort: NoticeSort,
    pub search: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub limit: Option<i64>,
}

fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoticeStats {
    pub total: i64,
    pub draft: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    pub expired: i64,
    pub total_views: i64,
}

/// Flattens rich-text HTML into a plain excerpt for notice cards.
pub fn plain_text_excerpt(html: &str, max_chars: usize) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => {
                in_tag = true;
                text.push(' ');
            }
            '>' => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }

    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">");
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let mut excerpt: String = collapsed.chars().take(max_chars).collect();
    excerpt.push('…');
    excerpt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_is_one_directional() {
        assert!(NoticeStatus::Draft.can_transition_to(NoticeStatus::Pending));
        assert!(NoticeStatus::Pending.can_transition_to(NoticeStatus::Approved));
        assert!(NoticeStatus::Pending.can_transition_to(NoticeStatus::Rejected));
        assert!(NoticeStatus::Approved.can_transition_to(NoticeStatus::Expired));
        assert!(!NoticeStatus::Approved.can_transition_to(NoticeStatus::Pending));
        assert!(!NoticeStatus::Draft.can_transition_to(NoticeStatus::Approved));
        assert!(!NoticeStatus::Expired.can_transition_to(NoticeStatus::Approved));
    }

    #[test]
    fn submission_action_maps_to_status() {
        assert_eq!(NoticeStatus::from(SubmissionAction::Draft), NoticeStatus::Draft);
        assert_eq!(NoticeStatus::from(SubmissionAction::Pending), NoticeStatus::Pending);
    }

    #[test]
    fn attachment_serializes_mime_as_type() {
        let attachment = Attachment {
            name: "syllabus.pdf".to_string(),
            url: "/storage/notice-attachments/abc.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            size: 1024,
        };
        let value = serde_json::to_value(&attachment).unwrap();
        assert_eq!(value["type"], "application/pdf");
    }

    #[test]
    fn excerpt_strips_markup() {
        let html = "<h1>Exam</h1><p>Hall&nbsp;B &amp; C</p>";
        assert_eq!(plain_text_excerpt(html, 100), "Exam Hall B & C");
        assert_eq!(plain_text_excerpt("<p>abcdef</p>", 3), "abc…");
    }

    #[test]
    fn blank_filters_are_unset() {
        let query: NoticeQuery = serde_json::from_str(r#"{"category":"","limit":" ","sort":"oldest"}"#).unwrap();
        assert!(query.category.is_none());
        assert!(query.limit.is_none());
        assert_eq!(query.sort, NoticeSort::Oldest);

        let query: NoticeQuery = serde_json::from_str(r#"{"category":"events","limit":"5"}"#).unwrap();
        assert_eq!(query.category, Some(NoticeCategory::Events));
        assert_eq!(query.limit, Some(5));
    }

    #[test]
    fn unapproved_notices_are_hidden_from_other_students() {
        let author = Uuid::new_v4();
        let mut notice = Notice {
            id: Uuid::new_v4(),
            title: "Budget draft".to_string(),
            content: "<p>tbd</p>".to_string(),
            category: NoticeCategory::Administration,
            priority: NoticePriority::Normal,
            status: NoticeStatus::Pending,
            author_id: author,
            banner_url: None,
            attachments: Vec::new(),
            target_audience: default_audience(),
            publish_at: None,
            expire_at: None,
            archived: false,
            views: 0,
            view_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(!notice.is_visible_to(None));
        assert!(!notice.is_visible_to(Some((Uuid::new_v4(), RoleTier::Student))));
        assert!(notice.is_visible_to(Some((author, RoleTier::Student))));
        assert!(notice.is_visible_to(Some((Uuid::new_v4(), RoleTier::Staff))));

        notice.status = NoticeStatus::Approved;
        assert!(notice.is_visible_to(None));
    }

    #[test]
    fn category_parse_rejects_unknown() {
        assert_eq!("student_affairs".parse::<NoticeCategory>().unwrap(), NoticeCategory::StudentAffairs);
        assert!("sports".parse::<NoticeCategory>().is_err());
    }
}
