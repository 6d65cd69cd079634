use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{Comment, CreateCommentRequest, ToggleOutcome},
    error::{AppError, Result},
    repository::{parse_optional_uuid, parse_uuid, to_utc, EngagementRepository},
};

#[derive(FromRow)]
struct CommentRow {
    id: String,
    notice_id: String,
    user_id: String,
    parent_id: Option<String>,
    content: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

/// Tables holding one row per (notice, user) pair.
#[derive(Clone, Copy)]
enum PairTable {
    Likes,
    Bookmarks,
}

impl PairTable {
    fn name(self) -> &'static str {
        match self {
            PairTable::Likes => "notice_likes",
            PairTable::Bookmarks => "notice_bookmarks",
        }
    }
}

pub struct SqliteEngagementRepository {
    pool: SqlitePool,
}

impl SqliteEngagementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_comment(row: CommentRow) -> Result<Comment> {
        Ok(Comment {
            id: parse_uuid(&row.id)?,
            notice_id: parse_uuid(&row.notice_id)?,
            user_id: parse_uuid(&row.user_id)?,
            parent_id: parse_optional_uuid(row.parent_id)?,
            content: row.content,
            created_at: to_utc(row.created_at),
            updated_at: to_utc(row.updated_at),
        })
    }

    async fn toggle(&self, table: PairTable, notice_id: Uuid, user_id: Uuid) -> Result<ToggleOutcome> {
        let notice_id_str = notice_id.to_string();
        let user_id_str = user_id.to_string();
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query(&format!(
            "DELETE FROM {} WHERE notice_id = ? AND user_id = ?",
            table.name()
        ))
        .bind(&notice_id_str)
        .bind(&user_id_str)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if removed == 0 {
            sqlx::query(&format!(
                "INSERT INTO {} (id, notice_id, user_id, created_at) VALUES (?, ?, ?, ?)",
                table.name()
            ))
            .bind(Uuid::new_v4().to_string())
            .bind(&notice_id_str)
            .bind(&user_id_str)
            .bind(Utc::now().naive_utc())
            .execute(&mut *tx)
            .await?;
        }

        let count = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM {} WHERE notice_id = ?",
            table.name()
        ))
        .bind(&notice_id_str)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(ToggleOutcome {
            active: removed == 0,
            count,
        })
    }
}

#[async_trait]
impl EngagementRepository for SqliteEngagementRepository {
    async fn toggle_like(&self, notice_id: Uuid, user_id: Uuid) -> Result<ToggleOutcome> {
        self.toggle(PairTable::Likes, notice_id, user_id).await
    }

    async fn toggle_bookmark(&self, notice_id: Uuid, user_id: Uuid) -> Result<ToggleOutcome> {
        self.toggle(PairTable::Bookmarks, notice_id, user_id).await
    }

    async fn bookmarked_notice_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT notice_id FROM notice_bookmarks WHERE user_id = ? ORDER BY created_at DESC"
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        ids.iter().map(|id| parse_uuid(id)).collect()
    }

    async fn create_comment(&self, notice_id: Uuid, user_id: Uuid, request: CreateCommentRequest) -> Result<Comment> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO comments (id, notice_id, user_id, parent_id, content, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(id.to_string())
        .bind(notice_id.to_string())
        .bind(user_id.to_string())
        .bind(request.parent_id.map(|p| p.to_string()))
        .bind(request.content.trim())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.find_comment(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created comment".to_string())
        })
    }

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT id, notice_id, user_id, parent_id, content, created_at, updated_at
            FROM comments WHERE id = ?
            "#
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_comment).transpose()
    }

    async fn list_comments(&self, notice_id: Uuid) -> Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT id, notice_id, user_id, parent_id, content, created_at, updated_at
            FROM comments
            WHERE notice_id = ?
            ORDER BY created_at ASC
            "#
        )
        .bind(notice_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_comment)
            .collect()
    }

    async fn delete_comment(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
