use std::sync::Arc;
use uuid::Uuid;

use crate::{
    config::RoleLookupFailurePolicy,
    domain::{AppRole, RoleTier},
    error::{AppError, Result},
    repository::RoleRepository,
};

/// The role a request runs with, after the failure policy has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRole {
    pub role: AppRole,
    pub tier: RoleTier,
    /// True when the stored role could not be read and the fallback was used.
    pub defaulted: bool,
}

impl ResolvedRole {
    fn stored(role: AppRole) -> Self {
        Self { role, tier: role.tier(), defaulted: false }
    }

    fn fallback() -> Self {
        Self {
            role: AppRole::Student,
            tier: RoleTier::Student,
            defaulted: true,
        }
    }
}

pub struct RoleResolver {
    roles: Arc<dyn RoleRepository>,
    policy: RoleLookupFailurePolicy,
}

impl RoleResolver {
    pub fn new(roles: Arc<dyn RoleRepository>, policy: RoleLookupFailurePolicy) -> Self {
        Self { roles, policy }
    }

    /// One lookup per call; nothing is cached across requests.
    pub async fn resolve(&self, user_id: Uuid) -> Result<ResolvedRole> {
        let failure = match self.roles.find_role(user_id).await {
            Ok(Some(role)) => return Ok(ResolvedRole::stored(role)),
            Ok(None) => "no role assigned".to_string(),
            Err(e) => e.to_string(),
        };

        tracing::warn!("Role lookup failed for user {}: {}", user_id, failure);

        match self.policy {
            RoleLookupFailurePolicy::DefaultToStudent => Ok(ResolvedRole::fallback()),
            RoleLookupFailurePolicy::Deny => Err(AppError::Forbidden),
        }
    }
}
