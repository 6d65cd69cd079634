use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{
        Notice, NoticeCategory, NoticeDraft, NoticePriority, NoticeQuery, NoticeStats,
        SubmissionAction,
    },
    error::{AppError, Result},
    service::{NoticeSubmission, SubmissionReport},
    storage::UploadedFile,
};

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<NoticeQuery>,
) -> Result<Json<Vec<Notice>>> {
    let notices = state.service_context.notice_service
        .list_approved(&query)
        .await?;

    Ok(Json(notices))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: Option<Extension<CurrentUser>>,
) -> Result<Json<Notice>> {
    let viewer = user.map(|Extension(u)| (u.id(), u.role));
    let notice = state.service_context.notice_service
        .view(id, viewer)
        .await?;

    Ok(Json(notice))
}

pub async fn mine(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<Notice>>> {
    let notices = state.service_context.notice_service
        .list_mine(user.id())
        .await?;

    Ok(Json(notices))
}

#[derive(Debug, Serialize)]
pub struct MyStats {
    pub drafts: i64,
    pub pending: i64,
    pub published: i64,
    pub total_views: i64,
    #[serde(flatten)]
    pub all: NoticeStats,
}

pub async fn my_stats(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<MyStats>> {
    let stats = state.service_context.notice_service
        .stats(Some(user.id()))
        .await?;

    Ok(Json(MyStats {
        drafts: stats.draft,
        pending: stats.pending,
        published: stats.approved,
        total_views: stats.total_views,
        all: stats,
    }))
}

/// Multipart authoring form.
///
/// Text fields: `title`, `content`, `category`, `priority`, `publish_at`,
/// `expire_at`, `target_audience` (repeatable or comma separated) and
/// `action` (`draft` or `pending`). File fields: `banner` and `attachments`
/// (repeatable).
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SubmissionReport>)> {
    let submission = read_submission(multipart).await?;

    let report = state.service_context.notice_service
        .submit(user.id(), submission)
        .await?;

    Ok((StatusCode::CREATED, Json(report)))
}

pub async fn submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Notice>> {
    let notice = state.service_context.notice_service
        .submit_for_review(id, user.id())
        .await?;

    Ok(Json(notice))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
) -> Result<StatusCode> {
    state.service_context.notice_service
        .delete(id, user.id(), user.role)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn read_submission(mut multipart: Multipart) -> Result<NoticeSubmission> {
    let mut draft = NoticeDraft {
        target_audience: Vec::new(),
        ..Default::default()
    };
    let mut action = SubmissionAction::Draft;
    let mut banner = None;
    let mut attachments = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid form data: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "banner" || name == "attachments" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read {}: {}", file_name, e)))?;

            // Browsers send an empty part for an unused file input.
            if file_name.is_empty() && data.is_empty() {
                continue;
            }

            let file = UploadedFile { file_name, content_type, data: data.to_vec() };
            if name == "banner" {
                banner = Some(file);
            } else {
                attachments.push(file);
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read {}: {}", name, e)))?;

        match name.as_str() {
            "title" => draft.title = value,
            "content" => draft.content = value,
            "category" if !value.is_empty() => draft.category = value.parse::<NoticeCategory>()?,
            "priority" if !value.is_empty() => draft.priority = value.parse::<NoticePriority>()?,
            "publish_at" => draft.publish_at = parse_form_datetime(&value)?,
            "expire_at" => draft.expire_at = parse_form_datetime(&value)?,
            "target_audience" => draft.target_audience.extend(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(str::to_string),
            ),
            "action" => action = value.parse()?,
            _ => tracing::debug!("Ignoring unknown form field {}", name),
        }
    }

    Ok(NoticeSubmission { draft, action, banner, attachments })
}

/// Accepts RFC 3339 or the `datetime-local` input format (taken as UTC).
fn parse_form_datetime(value: &str) -> Result<Option<DateTime<Utc>>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .map(|dt| Some(dt.and_utc()))
        .map_err(|_| AppError::BadRequest(format!("Invalid date: {}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_datetimes_accept_both_formats() {
        let local = parse_form_datetime("2025-03-01T09:30").unwrap().unwrap();
        let rfc = parse_form_datetime("2025-03-01T09:30:00Z").unwrap().unwrap();
        assert_eq!(local, rfc);
        assert_eq!(parse_form_datetime("  ").unwrap(), None);
        assert!(parse_form_datetime("next tuesday").is_err());
    }
}
