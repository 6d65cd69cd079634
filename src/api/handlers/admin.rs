//! Admin-only management endpoints.
//!
//! Every mutation on the department and user tables answers with the
//! re-fetched table, so clients never patch their copy locally.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{
        AdminStats, AppRole, AuditLog, Confirmation, CreateDepartmentRequest, CreateUserRequest,
        Department, Notice, UpdateDepartmentRequest, UpdateProfileRequest, UserWithRole,
    },
    error::Result,
};

#[derive(Debug, Deserialize)]
pub struct ConfirmParams {
    pub confirm: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct AuditLogQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: AppRole,
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<AdminStats>> {
    let stats = state.service_context.user_service.admin_stats().await?;
    Ok(Json(stats))
}

pub async fn audit_log(
    State(state): State<AppState>,
    Query(query): Query<AuditLogQuery>,
) -> Result<Json<Vec<AuditLog>>> {
    let entries = state.service_context.user_service
        .audit_log(query.limit.unwrap_or(100))
        .await?;

    Ok(Json(entries))
}

pub async fn check_expired(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<Notice>>> {
    let expired = state.service_context.approval_service
        .expire_due(user.id())
        .await?;

    Ok(Json(expired))
}

pub async fn list_departments(State(state): State<AppState>) -> Result<Json<Vec<Department>>> {
    let departments = state.service_context.department_service.list().await?;
    Ok(Json(departments))
}

pub async fn create_department(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateDepartmentRequest>,
) -> Result<(StatusCode, Json<Vec<Department>>)> {
    let service = &state.service_context.department_service;
    service.create(user.id(), req).await?;

    Ok((StatusCode::CREATED, Json(service.list().await?)))
}

pub async fn update_department(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<UpdateDepartmentRequest>,
) -> Result<Json<Vec<Department>>> {
    let service = &state.service_context.department_service;
    service.update(user.id(), id, req).await?;

    Ok(Json(service.list().await?))
}

pub async fn delete_department(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ConfirmParams>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<Department>>> {
    let service = &state.service_context.department_service;
    service
        .delete(user.id(), id, Confirmation::from_flag(params.confirm))
        .await?;

    Ok(Json(service.list().await?))
}

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserWithRole>>> {
    let users = state.service_context.user_service.list().await?;
    Ok(Json(users))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserWithRole>> {
    let user = state.service_context.user_service.get(id).await?;
    Ok(Json(user))
}

pub async fn create_user(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<Vec<UserWithRole>>)> {
    let service = &state.service_context.user_service;
    service.create(user.id(), req).await?;

    Ok((StatusCode::CREATED, Json(service.list().await?)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<Vec<UserWithRole>>> {
    let service = &state.service_context.user_service;
    service.update_profile(user.id(), id, req).await?;

    Ok(Json(service.list().await?))
}

pub async fn update_user_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<Json<Vec<UserWithRole>>> {
    let service = &state.service_context.user_service;
    service.update_role(user.id(), id, req.role).await?;

    Ok(Json(service.list().await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ConfirmParams>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<UserWithRole>>> {
    let service = &state.service_context.user_service;
    service
        .delete(user.id(), id, Confirmation::from_flag(params.confirm))
        .await?;

    Ok(Json(service.list().await?))
}
