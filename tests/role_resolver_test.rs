mod common;

use std::sync::Arc;

use noticeboard::{
    config::RoleLookupFailurePolicy,
    domain::{AppRole, RoleTier},
    error::AppError,
    repository::{RoleRepository, SqliteRoleRepository},
    service::RoleResolver,
};
use uuid::Uuid;

use common::{insert_profile, test_pool, FailingRoleRepository, FixedRoleRepository};

#[tokio::test]
async fn lookup_failure_falls_back_to_student() -> anyhow::Result<()> {
    let resolver = RoleResolver::new(Arc::new(FailingRoleRepository), RoleLookupFailurePolicy::DefaultToStudent);

    let resolved = resolver.resolve(Uuid::new_v4()).await?;
    assert_eq!(resolved.role, AppRole::Student);
    assert_eq!(resolved.tier, RoleTier::Student);
    assert!(resolved.defaulted);
    Ok(())
}

#[tokio::test]
async fn missing_role_row_falls_back_to_student() -> anyhow::Result<()> {
    let resolver = RoleResolver::new(Arc::new(FixedRoleRepository(None)), RoleLookupFailurePolicy::DefaultToStudent);

    let resolved = resolver.resolve(Uuid::new_v4()).await?;
    assert_eq!(resolved.tier, RoleTier::Student);
    assert!(resolved.defaulted);
    Ok(())
}

#[tokio::test]
async fn deny_policy_refuses_instead_of_defaulting() {
    let resolver = RoleResolver::new(Arc::new(FailingRoleRepository), RoleLookupFailurePolicy::Deny);

    let result = resolver.resolve(Uuid::new_v4()).await;
    assert!(matches!(result, Err(AppError::Forbidden)));
}

#[tokio::test]
async fn stored_roles_map_to_their_tier() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let roles = Arc::new(SqliteRoleRepository::new(pool.clone()));
    let resolver = RoleResolver::new(roles.clone(), RoleLookupFailurePolicy::DefaultToStudent);

    for (email, role, tier) in [
        ("admin@uni.test", AppRole::Admin, RoleTier::Admin),
        ("registrar@uni.test", AppRole::Registrar, RoleTier::Staff),
        ("guild@uni.test", AppRole::GuildLeader, RoleTier::Staff),
        ("student@uni.test", AppRole::Student, RoleTier::Student),
    ] {
        let profile = insert_profile(&pool, email).await?;
        roles.assign(profile.id, role, None).await?;

        let resolved = resolver.resolve(profile.id).await?;
        assert_eq!(resolved.role, role);
        assert_eq!(resolved.tier, tier);
        assert!(!resolved.defaulted);
    }
    Ok(())
}

#[tokio::test]
async fn reassigning_replaces_the_single_role() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let roles = SqliteRoleRepository::new(pool.clone());
    let admin = insert_profile(&pool, "admin@uni.test").await?;
    let user = insert_profile(&pool, "user@uni.test").await?;

    roles.assign(user.id, AppRole::Student, None).await?;
    let updated = roles.assign(user.id, AppRole::Dean, Some(admin.id)).await?;

    assert_eq!(updated.role, AppRole::Dean);
    assert_eq!(updated.assigned_by, Some(admin.id));
    assert_eq!(roles.find_role(user.id).await?, Some(AppRole::Dean));
    assert_eq!(roles.list_all().await?.len(), 1);
    Ok(())
}
