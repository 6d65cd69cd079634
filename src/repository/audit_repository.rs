use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{AuditLog, NewAuditLog},
    error::{AppError, Result},
    repository::{parse_optional_uuid, parse_uuid, to_utc, AuditRepository},
};

#[derive(FromRow)]
struct AuditRow {
    id: String,
    user_id: Option<String>,
    action: String,
    entity_type: String,
    entity_id: Option<String>,
    details: Option<String>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    created_at: NaiveDateTime,
}

pub struct SqliteAuditRepository {
    pool: SqlitePool,
}

impl SqliteAuditRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_log(row: AuditRow) -> Result<AuditLog> {
        let details = row
            .details
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| AppError::Database(format!("Invalid audit details: {}", e)))?;

        Ok(AuditLog {
            id: parse_uuid(&row.id)?,
            user_id: parse_optional_uuid(row.user_id)?,
            action: row.action,
            entity_type: row.entity_type,
            entity_id: row.entity_id,
            details,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            created_at: to_utc(row.created_at),
        })
    }
}

#[async_trait]
impl AuditRepository for SqliteAuditRepository {
    async fn record(&self, entry: NewAuditLog) -> Result<AuditLog> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let details = entry.details.as_ref().map(|d| d.to_string());

        sqlx::query(
            r#"
            INSERT INTO audit_logs (id, user_id, action, entity_type, entity_id, details, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(id.to_string())
        .bind(entry.user_id.map(|u| u.to_string()))
        .bind(&entry.action)
        .bind(&entry.entity_type)
        .bind(&entry.entity_id)
        .bind(&details)
        .bind(now.naive_utc())
        .execute(&self.pool)
        .await?;

        Ok(AuditLog {
            id,
            user_id: entry.user_id,
            action: entry.action,
            entity_type: entry.entity_type,
            entity_id: entry.entity_id,
            details: entry.details,
            ip_address: None,
            user_agent: None,
            created_at: now,
        })
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<AuditLog>> {
        let rows = sqlx::query_as::<_, AuditRow>(
            r#"
            SELECT id, user_id, action, entity_type, entity_id, details,
                   ip_address, user_agent, created_at
            FROM audit_logs
            ORDER BY created_at DESC
            LIMIT ?
            "#
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_log)
            .collect()
    }
}
