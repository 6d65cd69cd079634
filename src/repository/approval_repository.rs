use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{ApprovalDecision, NoticeApproval},
    error::{AppError, Result},
    repository::{parse_uuid, to_utc, ApprovalRepository},
};

#[derive(FromRow)]
struct ApprovalRow {
    id: String,
    notice_id: String,
    approver_id: String,
    approval_level: i32,
    status: String,
    comments: Option<String>,
    approved_at: Option<NaiveDateTime>,
    created_at: NaiveDateTime,
}

pub struct SqliteApprovalRepository {
    pool: SqlitePool,
}

impl SqliteApprovalRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_approval(row: ApprovalRow) -> Result<NoticeApproval> {
        let status = match row.status.as_str() {
            "approved" => ApprovalDecision::Approved,
            "rejected" => ApprovalDecision::Rejected,
            other => return Err(AppError::Database(format!("Invalid approval status: {}", other))),
        };

        Ok(NoticeApproval {
            id: parse_uuid(&row.id)?,
            notice_id: parse_uuid(&row.notice_id)?,
            approver_id: parse_uuid(&row.approver_id)?,
            approval_level: row.approval_level,
            status,
            comments: row.comments,
            approved_at: row.approved_at.map(to_utc),
            created_at: to_utc(row.created_at),
        })
    }
}

#[async_trait]
impl ApprovalRepository for SqliteApprovalRepository {
    async fn create(&self, approval: NoticeApproval) -> Result<NoticeApproval> {
        sqlx::query(
            r#"
            INSERT INTO notice_approvals (
                id, notice_id, approver_id, approval_level, status,
                comments, approved_at, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(approval.id.to_string())
        .bind(approval.notice_id.to_string())
        .bind(approval.approver_id.to_string())
        .bind(approval.approval_level)
        .bind(approval.status.as_str())
        .bind(&approval.comments)
        .bind(approval.approved_at.map(|dt| dt.naive_utc()))
        .bind(approval.created_at.naive_utc())
        .execute(&self.pool)
        .await?;

        Ok(approval)
    }

    async fn list_for_notice(&self, notice_id: Uuid) -> Result<Vec<NoticeApproval>> {
        let rows = sqlx::query_as::<_, ApprovalRow>(
            r#"
            SELECT id, notice_id, approver_id, approval_level, status,
                   comments, approved_at, created_at
            FROM notice_approvals
            WHERE notice_id = ?
            ORDER BY created_at ASC
            "#
        )
        .bind(notice_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_approval)
            .collect()
    }
}
