use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{Attachment, Notice, NoticeQuery, NoticeSort, NoticeStats, NoticeStatus},
    error::{AppError, Result},
    repository::{parse_column, parse_uuid, to_utc, NoticeRepository},
};

#[derive(FromRow)]
struct NoticeRow {
    id: String,
    title: String,
    content: String,
    category: String,
    priority: String,
    status: String,
    author_id: String,
    banner_url: Option<String>,
    attachments: Option<String>,
    target_audience: Option<String>,
    publish_at: Option<NaiveDateTime>,
    expire_at: Option<NaiveDateTime>,
    archived: i32,
    views: i64,
    view_count: i64,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

const NOTICE_COLUMNS: &str = r#"
    id, title, content, category, priority, status, author_id, banner_url,
    attachments, target_audience, publish_at, expire_at, archived, views,
    view_count, created_at, updated_at
"#;

pub struct SqliteNoticeRepository {
    pool: SqlitePool,
}

impl SqliteNoticeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_notice(row: NoticeRow) -> Result<Notice> {
        let attachments: Vec<Attachment> = match row.attachments.as_deref() {
            Some(json) => serde_json::from_str(json)
                .map_err(|e| AppError::Database(format!("Invalid attachments column: {}", e)))?,
            None => Vec::new(),
        };
        let target_audience: Vec<String> = match row.target_audience.as_deref() {
            Some(json) => serde_json::from_str(json)
                .map_err(|e| AppError::Database(format!("Invalid target_audience column: {}", e)))?,
            None => Vec::new(),
        };

        Ok(Notice {
            id: parse_uuid(&row.id)?,
            title: row.title,
            content: row.content,
            category: parse_column(&row.category)?,
            priority: parse_column(&row.priority)?,
            status: parse_column(&row.status)?,
            author_id: parse_uuid(&row.author_id)?,
            banner_url: row.banner_url,
            attachments,
            target_audience,
            publish_at: row.publish_at.map(to_utc),
            expire_at: row.expire_at.map(to_utc),
            archived: row.archived != 0,
            views: row.views,
            view_count: row.view_count,
            created_at: to_utc(row.created_at),
            updated_at: to_utc(row.updated_at),
        })
    }

    fn json_or_null<T: serde::Serialize>(items: &[T]) -> Result<Option<String>> {
        if items.is_empty() {
            return Ok(None);
        }
        serde_json::to_string(items)
            .map(Some)
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    fn order_clause(sort: NoticeSort) -> &'static str {
        match sort {
            NoticeSort::Newest => " ORDER BY created_at DESC, id DESC",
            NoticeSort::Oldest => " ORDER BY created_at ASC, id ASC",
            NoticeSort::MostViewed => " ORDER BY view_count DESC, created_at DESC",
        }
    }

    async fn fetch_where_status(&self, status: NoticeStatus, order: &str) -> Result<Vec<Notice>> {
        let rows = sqlx::query_as::<_, NoticeRow>(&format!(
            "SELECT {} FROM notices WHERE status = ?{}",
            NOTICE_COLUMNS, order
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_notice)
            .collect()
    }
}

#[async_trait]
impl NoticeRepository for SqliteNoticeRepository {
    async fn create(&self, notice: Notice) -> Result<Notice> {
        let attachments = Self::json_or_null(&notice.attachments)?;
        let target_audience = Self::json_or_null(&notice.target_audience)?;

        sqlx::query(
            r#"
            INSERT INTO notices (
                id, title, content, category, priority, status, author_id,
                banner_url, attachments, target_audience, publish_at, expire_at,
                archived, views, view_count, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(notice.id.to_string())
        .bind(&notice.title)
        .bind(&notice.content)
        .bind(notice.category.as_str())
        .bind(notice.priority.as_str())
        .bind(notice.status.as_str())
        .bind(notice.author_id.to_string())
        .bind(&notice.banner_url)
        .bind(attachments)
        .bind(target_audience)
        .bind(notice.publish_at.map(|dt| dt.naive_utc()))
        .bind(notice.expire_at.map(|dt| dt.naive_utc()))
        .bind(if notice.archived { 1i32 } else { 0i32 })
        .bind(notice.views)
        .bind(notice.view_count)
        .bind(notice.created_at.naive_utc())
        .bind(notice.updated_at.naive_utc())
        .execute(&self.pool)
        .await?;

        self.find_by_id(notice.id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created notice".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Notice>> {
        let row = sqlx::query_as::<_, NoticeRow>(&format!(
            "SELECT {} FROM notices WHERE id = ?",
            NOTICE_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_notice).transpose()
    }

    async fn list_approved(&self, query: &NoticeQuery, limit: Option<i64>) -> Result<Vec<Notice>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM notices WHERE status = ",
            NOTICE_COLUMNS
        ));
        builder.push_bind(NoticeStatus::Approved.as_str());
        builder.push(" AND archived = 0");

        if let Some(category) = query.category {
            builder.push(" AND category = ");
            builder.push_bind(category.as_str());
        }

        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search.to_lowercase());
            builder.push(" AND (LOWER(title) LIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR LOWER(content) LIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }

        builder.push(Self::order_clause(query.sort));
        if let Some(limit) = limit {
            builder.push(" LIMIT ");
            builder.push_bind(limit);
        }

        let rows = builder
            .build_query_as::<NoticeRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(Self::row_to_notice)
            .collect()
    }

    async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<Notice>> {
        let rows = sqlx::query_as::<_, NoticeRow>(&format!(
            "SELECT {} FROM notices WHERE author_id = ? ORDER BY created_at DESC",
            NOTICE_COLUMNS
        ))
        .bind(author_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_notice)
            .collect()
    }

    async fn list_by_status(&self, status: NoticeStatus) -> Result<Vec<Notice>> {
        // Review queues are worked oldest-first.
        self.fetch_where_status(status, " ORDER BY created_at ASC").await
    }

    async fn list_expirable(&self, now: DateTime<Utc>) -> Result<Vec<Notice>> {
        let rows = sqlx::query_as::<_, NoticeRow>(&format!(
            r#"
            SELECT {} FROM notices
            WHERE status = ? AND expire_at IS NOT NULL AND expire_at <= ?
            ORDER BY expire_at ASC
            "#,
            NOTICE_COLUMNS
        ))
        .bind(NoticeStatus::Approved.as_str())
        .bind(now.naive_utc())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_notice)
            .collect()
    }

    async fn update_status(&self, id: Uuid, status: NoticeStatus) -> Result<Notice> {
        let result = sqlx::query("UPDATE notices SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now().naive_utc())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Notice not found".to_string()));
        }

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated notice".to_string())
        })
    }

    async fn increment_views(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE notices SET views = views + 1, view_count = view_count + 1 WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM notices WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Notice not found".to_string()));
        }

        Ok(())
    }

    async fn stats(&self, author_id: Option<Uuid>) -> Result<NoticeStats> {
        let rows = sqlx::query_as::<_, (String, i64, i64)>(
            r#"
            SELECT status, COUNT(*), COALESCE(SUM(view_count), 0)
            FROM notices
            WHERE (?1 IS NULL OR author_id = ?1)
            GROUP BY status
            "#
        )
        .bind(author_id.map(|id| id.to_string()))
        .fetch_all(&self.pool)
        .await?;

        let mut stats = NoticeStats::default();
        for (status, count, views) in rows {
            match parse_column::<NoticeStatus>(&status)? {
                NoticeStatus::Draft => stats.draft = count,
                NoticeStatus::Pending => stats.pending = count,
                NoticeStatus::Approved => stats.approved = count,
                NoticeStatus::Rejected => stats.rejected = count,
                NoticeStatus::Expired => stats.expired = count,
            }
            stats.total += count;
            stats.total_views += views;
        }

        Ok(stats)
    }
}
