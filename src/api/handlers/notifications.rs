use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{CreateSubscriptionRequest, Notification, NotificationSubscription},
    error::Result,
};

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<Notification>>> {
    let notifications = state.service_context.notification_service
        .list(user.id())
        .await?;

    Ok(Json(notifications))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
) -> Result<StatusCode> {
    state.service_context.notification_service
        .mark_read(id, user.id())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_subscriptions(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<NotificationSubscription>>> {
    let subscriptions = state.service_context.notification_service
        .subscriptions(user.id())
        .await?;

    Ok(Json(subscriptions))
}

pub async fn subscribe(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateSubscriptionRequest>,
) -> Result<(StatusCode, Json<NotificationSubscription>)> {
    let subscription = state.service_context.notification_service
        .subscribe(user.id(), req)
        .await?;

    Ok((StatusCode::CREATED, Json(subscription)))
}

pub async fn unsubscribe(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
) -> Result<StatusCode> {
    state.service_context.notification_service
        .unsubscribe(id, user.id())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
