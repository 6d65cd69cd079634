use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{AppRole, RoleAssignment},
    error::{AppError, Result},
    repository::{parse_column, parse_optional_uuid, parse_uuid, to_utc, RoleRepository},
};

#[derive(FromRow)]
struct RoleRow {
    id: String,
    user_id: String,
    role: String,
    assigned_by: Option<String>,
    assigned_at: NaiveDateTime,
}

pub struct SqliteRoleRepository {
    pool: SqlitePool,
}

impl SqliteRoleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_assignment(row: RoleRow) -> Result<RoleAssignment> {
        Ok(RoleAssignment {
            id: parse_uuid(&row.id)?,
            user_id: parse_uuid(&row.user_id)?,
            role: parse_column(&row.role)?,
            assigned_by: parse_optional_uuid(row.assigned_by)?,
            assigned_at: to_utc(row.assigned_at),
        })
    }
}

#[async_trait]
impl RoleRepository for SqliteRoleRepository {
    async fn find_role(&self, user_id: Uuid) -> Result<Option<AppRole>> {
        let role = sqlx::query_scalar::<_, String>(
            "SELECT role FROM user_roles WHERE user_id = ?"
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        role.as_deref().map(parse_column).transpose()
    }

    async fn assign(&self, user_id: Uuid, role: AppRole, assigned_by: Option<Uuid>) -> Result<RoleAssignment> {
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO user_roles (id, user_id, role, assigned_by, assigned_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                role = excluded.role,
                assigned_by = excluded.assigned_by,
                assigned_at = excluded.assigned_at
            "#
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id.to_string())
        .bind(role.as_str())
        .bind(assigned_by.map(|id| id.to_string()))
        .bind(now)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query_as::<_, RoleRow>(
            "SELECT id, user_id, role, assigned_by, assigned_at FROM user_roles WHERE user_id = ?"
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::Database("Failed to retrieve role assignment".to_string()))?;

        Self::row_to_assignment(row)
    }

    async fn list_all(&self) -> Result<Vec<RoleAssignment>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            "SELECT id, user_id, role, assigned_by, assigned_at FROM user_roles"
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_assignment)
            .collect()
    }

    async fn count_distinct_roles(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(DISTINCT role) FROM user_roles")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
