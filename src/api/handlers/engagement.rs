use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{Comment, CreateCommentRequest, Notice, ToggleOutcome},
    error::Result,
};

pub async fn toggle_like(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ToggleOutcome>> {
    let outcome = state.service_context.engagement_service
        .toggle_like(id, user.id(), user.role)
        .await?;

    Ok(Json(outcome))
}

pub async fn toggle_bookmark(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ToggleOutcome>> {
    let outcome = state.service_context.engagement_service
        .toggle_bookmark(id, user.id(), user.role)
        .await?;

    Ok(Json(outcome))
}

pub async fn bookmarks(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<Notice>>> {
    let notices = state.service_context.engagement_service
        .bookmarks(user.id(), user.role)
        .await?;

    Ok(Json(notices))
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: Option<Extension<CurrentUser>>,
) -> Result<Json<Vec<Comment>>> {
    let viewer = user.map(|Extension(u)| (u.id(), u.role));
    let comments = state.service_context.engagement_service.comments(id, viewer).await?;
    Ok(Json(comments))
}

pub async fn create_comment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>)> {
    let comment = state.service_context.engagement_service
        .comment(id, user.id(), user.role, req)
        .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
) -> Result<StatusCode> {
    state.service_context.engagement_service
        .delete_comment(id, user.id(), user.role)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
