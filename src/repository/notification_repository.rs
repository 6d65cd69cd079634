use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{
        CreateSubscriptionRequest, NewNotification, NoticeCategory, Notification,
        NotificationSubscription, blank_to_none,
    },
    error::{AppError, Result},
    repository::{parse_column, parse_optional_uuid, parse_uuid, to_utc, NotificationRepository},
};

#[derive(FromRow)]
struct NotificationRow {
    id: String,
    user_id: String,
    title: String,
    message: String,
    #[sqlx(rename = "type")]
    notification_type: String,
    reference_id: Option<String>,
    read: i32,
    created_at: NaiveDateTime,
}

#[derive(FromRow)]
struct SubscriptionRow {
    id: String,
    user_id: String,
    category: Option<String>,
    department: Option<String>,
    subscribed: i32,
    created_at: NaiveDateTime,
}

pub struct SqliteNotificationRepository {
    pool: SqlitePool,
}

impl SqliteNotificationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_notification(row: NotificationRow) -> Result<Notification> {
        Ok(Notification {
            id: parse_uuid(&row.id)?,
            user_id: parse_uuid(&row.user_id)?,
            title: row.title,
            message: row.message,
            notification_type: row.notification_type,
            reference_id: parse_optional_uuid(row.reference_id)?,
            read: row.read != 0,
            created_at: to_utc(row.created_at),
        })
    }

    fn row_to_subscription(row: SubscriptionRow) -> Result<NotificationSubscription> {
        Ok(NotificationSubscription {
            id: parse_uuid(&row.id)?,
            user_id: parse_uuid(&row.user_id)?,
            category: row.category.as_deref().map(parse_column).transpose()?,
            department: row.department,
            subscribed: row.subscribed != 0,
            created_at: to_utc(row.created_at),
        })
    }

    async fn find_subscription(&self, id: Uuid) -> Result<Option<NotificationSubscription>> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, user_id, category, department, subscribed, created_at
            FROM notification_subscriptions WHERE id = ?
            "#
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_subscription).transpose()
    }
}

#[async_trait]
impl NotificationRepository for SqliteNotificationRepository {
    async fn create(&self, notification: NewNotification) -> Result<Notification> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, title, message, type, reference_id, read, created_at)
            VALUES (?, ?, ?, ?, ?, ?, 0, ?)
            "#
        )
        .bind(id.to_string())
        .bind(notification.user_id.to_string())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.notification_type)
        .bind(notification.reference_id.map(|r| r.to_string()))
        .bind(Utc::now().naive_utc())
        .execute(&self.pool)
        .await?;

        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, user_id, title, message, type, reference_id, read, created_at
            FROM notifications WHERE id = ?
            "#
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::Database("Failed to retrieve created notification".to_string()))?;

        Self::row_to_notification(row)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, user_id, title, message, type, reference_id, read, created_at
            FROM notifications
            WHERE user_id = ?
            ORDER BY created_at DESC
            "#
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_notification)
            .collect()
    }

    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("UPDATE notifications SET read = 1 WHERE id = ? AND user_id = ?")
            .bind(id.to_string())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_subscription(&self, user_id: Uuid, request: CreateSubscriptionRequest) -> Result<NotificationSubscription> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO notification_subscriptions (id, user_id, category, department, subscribed, created_at)
            VALUES (?, ?, ?, ?, 1, ?)
            "#
        )
        .bind(id.to_string())
        .bind(user_id.to_string())
        .bind(request.category.map(|c| c.as_str()))
        .bind(blank_to_none(request.department))
        .bind(Utc::now().naive_utc())
        .execute(&self.pool)
        .await?;

        self.find_subscription(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created subscription".to_string())
        })
    }

    async fn list_subscriptions(&self, user_id: Uuid) -> Result<Vec<NotificationSubscription>> {
        let rows = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, user_id, category, department, subscribed, created_at
            FROM notification_subscriptions
            WHERE user_id = ?
            ORDER BY created_at ASC
            "#
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_subscription)
            .collect()
    }

    async fn delete_subscription(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notification_subscriptions WHERE id = ? AND user_id = ?")
            .bind(id.to_string())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn subscribers_for_category(&self, category: NoticeCategory) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT user_id FROM notification_subscriptions
            WHERE subscribed = 1 AND category = ?
            "#
        )
        .bind(category.as_str())
        .fetch_all(&self.pool)
        .await?;

        ids.iter().map(|id| parse_uuid(id)).collect()
    }
}
