use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{blank_to_none, Profile, UpdateProfileRequest},
    error::{AppError, Result},
    repository::{parse_uuid, to_utc, NewProfile, ProfileRepository},
};

#[derive(FromRow)]
struct ProfileRow {
    id: String,
    email: String,
    full_name: String,
    department: Option<String>,
    faculty: Option<String>,
    student_code: Option<String>,
    avatar_url: Option<String>,
    mfa_enabled: i32,
    mfa_secret: Option<String>,
    notification_preferences: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

const PROFILE_COLUMNS: &str = r#"
    id, email, full_name, department, faculty, student_code, avatar_url,
    mfa_enabled, mfa_secret, notification_preferences, created_at, updated_at
"#;

pub struct SqliteProfileRepository {
    pool: SqlitePool,
}

impl SqliteProfileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_profile(row: ProfileRow) -> Result<Profile> {
        let notification_preferences = row
            .notification_preferences
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| AppError::Database(format!("Invalid notification preferences: {}", e)))?;

        Ok(Profile {
            id: parse_uuid(&row.id)?,
            email: row.email,
            full_name: row.full_name,
            department: row.department,
            faculty: row.faculty,
            student_code: row.student_code,
            avatar_url: row.avatar_url,
            mfa_enabled: row.mfa_enabled != 0,
            mfa_secret: row.mfa_secret,
            notification_preferences,
            created_at: to_utc(row.created_at),
            updated_at: to_utc(row.updated_at),
        })
    }
}

#[async_trait]
impl ProfileRepository for SqliteProfileRepository {
    async fn create(&self, profile: NewProfile) -> Result<Profile> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO profiles (id, email, full_name, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(id.to_string())
        .bind(profile.email.trim().to_lowercase())
        .bind(profile.full_name.trim())
        .bind(&profile.password_hash)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict("Email already registered".to_string())
            }
            other => AppError::Database(other.to_string()),
        })?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created profile".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {} FROM profiles WHERE id = ?",
            PROFILE_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_profile).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {} FROM profiles WHERE email = ?",
            PROFILE_COLUMNS
        ))
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_profile).transpose()
    }

    async fn list(&self) -> Result<Vec<Profile>> {
        let rows = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {} FROM profiles ORDER BY created_at DESC",
            PROFILE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_profile)
            .collect()
    }

    async fn update(&self, id: Uuid, update: UpdateProfileRequest) -> Result<Profile> {
        let existing = self.find_by_id(id).await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        // A present-but-blank field clears the column.
        let full_name = update.full_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or(existing.full_name);
        let department = match update.department {
            Some(v) => blank_to_none(Some(v)),
            None => existing.department,
        };
        let faculty = match update.faculty {
            Some(v) => blank_to_none(Some(v)),
            None => existing.faculty,
        };
        let student_code = match update.student_code {
            Some(v) => blank_to_none(Some(v)),
            None => existing.student_code,
        };
        let avatar_url = match update.avatar_url {
            Some(v) => blank_to_none(Some(v)),
            None => existing.avatar_url,
        };

        sqlx::query(
            r#"
            UPDATE profiles
            SET full_name = ?, department = ?, faculty = ?,
                student_code = ?, avatar_url = ?, updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(&full_name)
        .bind(&department)
        .bind(&faculty)
        .bind(&student_code)
        .bind(&avatar_url)
        .bind(Utc::now().naive_utc())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated profile".to_string())
        })
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM profiles WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        Ok(())
    }

    async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM profiles")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn password_hash(&self, email: &str) -> Result<Option<(Uuid, String)>> {
        let row = sqlx::query_as::<_, (String, String)>(
            "SELECT id, password_hash FROM profiles WHERE email = ?"
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some((id, hash)) => Ok(Some((parse_uuid(&id)?, hash))),
            None => Ok(None),
        }
    }
}
