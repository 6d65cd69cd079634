use std::collections::HashMap;
use std::sync::Arc;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::AuthService,
    domain::*,
    error::{AppError, Result},
    repository::{AuditRepository, NoticeRepository, ProfileRepository, RoleRepository},
};

/// Admin-side management of accounts and their roles.
pub struct UserService {
    auth: Arc<AuthService>,
    profiles: Arc<dyn ProfileRepository>,
    roles: Arc<dyn RoleRepository>,
    notices: Arc<dyn NoticeRepository>,
    audit: Arc<dyn AuditRepository>,
}

impl UserService {
    pub fn new(
        auth: Arc<AuthService>,
        profiles: Arc<dyn ProfileRepository>,
        roles: Arc<dyn RoleRepository>,
        notices: Arc<dyn NoticeRepository>,
        audit: Arc<dyn AuditRepository>,
    ) -> Self {
        Self { auth, profiles, roles, notices, audit }
    }

    /// Signs the account up, fills in the profile, then sets the requested role.
    pub async fn create(&self, actor: Uuid, request: CreateUserRequest) -> Result<UserWithRole> {
        request.validate()?;

        let profile = self.auth
            .sign_up(SignUpRequest {
                email: request.email,
                password: request.password,
                full_name: request.full_name,
            })
            .await?;

        let department = blank_to_none(request.department);
        let faculty = blank_to_none(request.faculty);
        let profile = if department.is_some() || faculty.is_some() {
            self.profiles
                .update(profile.id, UpdateProfileRequest {
                    department,
                    faculty,
                    ..Default::default()
                })
                .await?
        } else {
            profile
        };

        let assignment = self.roles.assign(profile.id, request.role, Some(actor)).await?;

        self.audit
            .record(
                NewAuditLog::new(actor, "user_created", "user", profile.id)
                    .with_details(json!({ "email": profile.email, "role": assignment.role })),
            )
            .await?;

        Ok(UserWithRole { profile, role: Some(assignment.role) })
    }

    /// Newest accounts first, each joined with its role.
    pub async fn list(&self) -> Result<Vec<UserWithRole>> {
        let profiles = self.profiles.list().await?;
        let roles: HashMap<Uuid, AppRole> = self.roles
            .list_all()
            .await?
            .into_iter()
            .map(|a| (a.user_id, a.role))
            .collect();

        Ok(profiles
            .into_iter()
            .map(|profile| {
                let role = roles.get(&profile.id).copied();
                UserWithRole { profile, role }
            })
            .collect())
    }

    pub async fn get(&self, id: Uuid) -> Result<UserWithRole> {
        let profile = self.profiles.find_by_id(id).await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        let role = self.roles.find_role(id).await?;
        Ok(UserWithRole { profile, role })
    }

    pub async fn update_role(&self, actor: Uuid, id: Uuid, role: AppRole) -> Result<RoleAssignment> {
        if self.profiles.find_by_id(id).await?.is_none() {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        let previous = self.roles.find_role(id).await?;
        let assignment = self.roles.assign(id, role, Some(actor)).await?;

        self.audit
            .record(
                NewAuditLog::new(actor, "role_updated", "user", id)
                    .with_details(json!({ "from": previous, "to": role })),
            )
            .await?;

        tracing::info!("Role of {} set to {} by {}", id, role, actor);
        Ok(assignment)
    }

    pub async fn update_profile(&self, actor: Uuid, id: Uuid, update: UpdateProfileRequest) -> Result<Profile> {
        let profile = self.profiles.update(id, update).await?;
        self.audit
            .record(NewAuditLog::new(actor, "user_updated", "user", id))
            .await?;
        Ok(profile)
    }

    /// Nothing is deleted unless the caller confirmed.
    pub async fn delete(&self, actor: Uuid, id: Uuid, confirmation: Confirmation) -> Result<()> {
        if confirmation == Confirmation::Cancelled {
            return Err(AppError::ConfirmationRequired(
                "Deleting a user must be confirmed".to_string(),
            ));
        }
        if actor == id {
            return Err(AppError::BadRequest("You cannot delete your own account".to_string()));
        }

        self.auth.delete_user(id).await?;
        self.audit
            .record(NewAuditLog::new(actor, "user_deleted", "user", id))
            .await?;

        tracing::info!("User {} deleted by {}", id, actor);
        Ok(())
    }

    pub async fn admin_stats(&self) -> Result<AdminStats> {
        let notices = self.notices.stats(None).await?;
        Ok(AdminStats {
            total_users: self.profiles.count().await?,
            total_notices: notices.total,
            pending_approvals: notices.pending,
            active_roles: self.roles.count_distinct_roles().await?,
        })
    }

    pub async fn audit_log(&self, limit: i64) -> Result<Vec<AuditLog>> {
        self.audit.list_recent(limit.clamp(1, 500)).await
    }
}
