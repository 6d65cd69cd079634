use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{Notice, NoticeApproval, ReviewRequest},
    error::Result,
};

pub async fn pending(State(state): State<AppState>) -> Result<Json<Vec<Notice>>> {
    let notices = state.service_context.approval_service.pending().await?;
    Ok(Json(notices))
}

pub async fn approve(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
    body: Option<Json<ReviewRequest>>,
) -> Result<Json<Notice>> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let notice = state.service_context.approval_service
        .approve(id, user.id(), user.role, request)
        .await?;

    Ok(Json(notice))
}

pub async fn reject(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
    body: Option<Json<ReviewRequest>>,
) -> Result<Json<Notice>> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let notice = state.service_context.approval_service
        .reject(id, user.id(), user.role, request)
        .await?;

    Ok(Json(notice))
}

pub async fn history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<NoticeApproval>>> {
    let approvals = state.service_context.approval_service.history(id).await?;
    Ok(Json(approvals))
}
