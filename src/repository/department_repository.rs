use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{blank_to_none, CreateDepartmentRequest, Department, UpdateDepartmentRequest},
    error::{AppError, Result},
    repository::{parse_uuid, to_utc, DepartmentRepository},
};

#[derive(FromRow)]
struct DepartmentRow {
    id: String,
    name: String,
    code: Option<String>,
    faculty: Option<String>,
    created_at: NaiveDateTime,
}

pub struct SqliteDepartmentRepository {
    pool: SqlitePool,
}

impl SqliteDepartmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_department(row: DepartmentRow) -> Result<Department> {
        Ok(Department {
            id: parse_uuid(&row.id)?,
            name: row.name,
            code: row.code,
            faculty: row.faculty,
            created_at: to_utc(row.created_at),
        })
    }

    fn map_write_error(e: sqlx::Error) -> AppError {
        match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict("A department with that name already exists".to_string())
            }
            other => AppError::Database(other.to_string()),
        }
    }
}

#[async_trait]
impl DepartmentRepository for SqliteDepartmentRepository {
    async fn create(&self, request: CreateDepartmentRequest) -> Result<Department> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO departments (id, name, code, faculty, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#
        )
        .bind(id.to_string())
        .bind(request.name.trim())
        .bind(blank_to_none(request.code))
        .bind(blank_to_none(request.faculty))
        .bind(Utc::now().naive_utc())
        .execute(&self.pool)
        .await
        .map_err(Self::map_write_error)?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created department".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Department>> {
        let row = sqlx::query_as::<_, DepartmentRow>(
            "SELECT id, name, code, faculty, created_at FROM departments WHERE id = ?"
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_department).transpose()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Department>> {
        let row = sqlx::query_as::<_, DepartmentRow>(
            "SELECT id, name, code, faculty, created_at FROM departments WHERE name = ? COLLATE NOCASE"
        )
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_department).transpose()
    }

    async fn list(&self) -> Result<Vec<Department>> {
        let rows = sqlx::query_as::<_, DepartmentRow>(
            "SELECT id, name, code, faculty, created_at FROM departments ORDER BY name"
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_department)
            .collect()
    }

    async fn update(&self, id: Uuid, update: UpdateDepartmentRequest) -> Result<Department> {
        let existing = self.find_by_id(id).await?
            .ok_or_else(|| AppError::NotFound("Department not found".to_string()))?;

        let name = update.name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or(existing.name);
        let code = match update.code {
            Some(c) => blank_to_none(Some(c)),
            None => existing.code,
        };
        let faculty = match update.faculty {
            Some(f) => blank_to_none(Some(f)),
            None => existing.faculty,
        };

        sqlx::query("UPDATE departments SET name = ?, code = ?, faculty = ? WHERE id = ?")
            .bind(&name)
            .bind(&code)
            .bind(&faculty)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(Self::map_write_error)?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated department".to_string())
        })
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM departments WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Department not found".to_string()));
        }

        Ok(())
    }
}
