mod common;

use std::sync::Arc;

use noticeboard::{
    auth::AuthService,
    domain::{AppRole, Confirmation, CreateDepartmentRequest, CreateUserRequest, UpdateDepartmentRequest},
    error::AppError,
    repository::{
        AuditRepository, ProfileRepository, RoleRepository, SqliteAuditRepository,
        SqliteDepartmentRepository, SqliteNoticeRepository, SqliteProfileRepository,
        SqliteRoleRepository,
    },
    service::{DepartmentService, UserService},
};
use sqlx::SqlitePool;
use uuid::Uuid;

use common::{insert_profile, test_pool, CountingDepartmentRepository};

fn user_service(pool: &SqlitePool) -> UserService {
    let profiles: Arc<dyn ProfileRepository> = Arc::new(SqliteProfileRepository::new(pool.clone()));
    let roles: Arc<dyn RoleRepository> = Arc::new(SqliteRoleRepository::new(pool.clone()));
    let auth = Arc::new(AuthService::new(pool.clone(), profiles.clone(), roles.clone(), 24));

    UserService::new(
        auth,
        profiles,
        roles,
        Arc::new(SqliteNoticeRepository::new(pool.clone())),
        Arc::new(SqliteAuditRepository::new(pool.clone())),
    )
}

fn department_service(pool: &SqlitePool) -> DepartmentService {
    DepartmentService::new(
        Arc::new(SqliteDepartmentRepository::new(pool.clone())),
        Arc::new(SqliteAuditRepository::new(pool.clone())),
    )
}

fn new_user(email: &str, role: AppRole) -> CreateUserRequest {
    CreateUserRequest {
        email: email.to_string(),
        password: "correct horse battery".to_string(),
        full_name: "Jamie Rivera".to_string(),
        department: Some("Computer Science".to_string()),
        faculty: Some("  ".to_string()),
        role,
    }
}

#[tokio::test]
async fn cancelled_department_delete_never_reaches_the_store() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let repo = Arc::new(CountingDepartmentRepository::default());
    let service = DepartmentService::new(repo.clone(), Arc::new(SqliteAuditRepository::new(pool.clone())));
    let admin = insert_profile(&pool, "admin@uni.test").await?;

    let result = service.delete(admin.id, Uuid::new_v4(), Confirmation::Cancelled).await;
    assert!(matches!(result, Err(AppError::ConfirmationRequired(_))));
    assert_eq!(repo.delete_count(), 0);

    service.delete(admin.id, Uuid::new_v4(), Confirmation::Confirmed).await?;
    assert_eq!(repo.delete_count(), 1);
    Ok(())
}

#[tokio::test]
async fn departments_are_validated_sorted_and_unique() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let service = department_service(&pool);
    let admin = insert_profile(&pool, "admin@uni.test").await?;

    let blank = service
        .create(admin.id, CreateDepartmentRequest { name: "   ".to_string(), code: None, faculty: None })
        .await;
    assert!(matches!(blank, Err(AppError::Validation(_))));

    let physics = service
        .create(admin.id, CreateDepartmentRequest {
            name: "Physics".to_string(),
            code: Some("".to_string()),
            faculty: Some("Science".to_string()),
        })
        .await?;
    assert_eq!(physics.code, None);

    service
        .create(admin.id, CreateDepartmentRequest { name: "Economics".to_string(), code: Some("ECON".to_string()), faculty: None })
        .await?;

    let duplicate = service
        .create(admin.id, CreateDepartmentRequest { name: "physics".to_string(), code: None, faculty: None })
        .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let names: Vec<_> = service.list().await?.into_iter().map(|d| d.name).collect();
    assert_eq!(names, vec!["Economics", "Physics"]);

    let renamed = service
        .update(admin.id, physics.id, UpdateDepartmentRequest { name: Some("Applied Physics".to_string()), ..Default::default() })
        .await?;
    assert_eq!(renamed.name, "Applied Physics");

    let cancelled = service.delete(admin.id, physics.id, Confirmation::Cancelled).await;
    assert!(matches!(cancelled, Err(AppError::ConfirmationRequired(_))));
    assert_eq!(service.list().await?.len(), 2);

    service.delete(admin.id, physics.id, Confirmation::Confirmed).await?;
    assert_eq!(service.list().await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn admin_creates_lists_and_deletes_users() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let service = user_service(&pool);
    let admin = insert_profile(&pool, "admin@uni.test").await?;

    let created = service.create(admin.id, new_user("Dean@Uni.test", AppRole::Dean)).await?;
    assert_eq!(created.profile.email, "dean@uni.test");
    assert_eq!(created.profile.department.as_deref(), Some("Computer Science"));
    assert_eq!(created.profile.faculty, None);
    assert_eq!(created.role, Some(AppRole::Dean));

    let duplicate = service.create(admin.id, new_user("dean@uni.test", AppRole::Staff)).await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let users = service.list().await?;
    assert_eq!(users.len(), 2);
    let listed = users.iter().find(|u| u.profile.id == created.profile.id).expect("listed");
    assert_eq!(listed.role, Some(AppRole::Dean));
    let bare = users.iter().find(|u| u.profile.id == admin.id).expect("listed");
    assert_eq!(bare.role, None);

    let cancelled = service.delete(admin.id, created.profile.id, Confirmation::Cancelled).await;
    assert!(matches!(cancelled, Err(AppError::ConfirmationRequired(_))));
    assert_eq!(service.list().await?.len(), 2);

    service.delete(admin.id, created.profile.id, Confirmation::Confirmed).await?;
    assert_eq!(service.list().await?.len(), 1);

    let roles = SqliteRoleRepository::new(pool.clone());
    assert_eq!(roles.find_role(created.profile.id).await?, None);
    Ok(())
}

#[tokio::test]
async fn role_changes_record_who_assigned_them() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let service = user_service(&pool);
    let admin = insert_profile(&pool, "admin@uni.test").await?;
    let created = service.create(admin.id, new_user("student@uni.test", AppRole::Student)).await?;

    let assignment = service.update_role(admin.id, created.profile.id, AppRole::CommunicationOfficer).await?;
    assert_eq!(assignment.role, AppRole::CommunicationOfficer);
    assert_eq!(assignment.assigned_by, Some(admin.id));

    let missing = service.update_role(admin.id, Uuid::new_v4(), AppRole::Admin).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let audit = SqliteAuditRepository::new(pool.clone());
    let actions: Vec<_> = audit.list_recent(10).await?.into_iter().map(|e| e.action).collect();
    assert!(actions.contains(&"user_created".to_string()));
    assert!(actions.contains(&"role_updated".to_string()));

    let stats = service.admin_stats().await?;
    assert_eq!(stats.total_users, 2);
    assert_eq!(stats.active_roles, 1);
    Ok(())
}

#[tokio::test]
async fn admins_cannot_delete_themselves() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let service = user_service(&pool);
    let admin = insert_profile(&pool, "admin@uni.test").await?;

    let result = service.delete(admin.id, admin.id, Confirmation::Confirmed).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));
    Ok(())
}
