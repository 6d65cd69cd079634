use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::*,
    error::{AppError, Result},
    repository::NotificationRepository,
};

pub struct NotificationService {
    repo: Arc<dyn NotificationRepository>,
}

impl NotificationService {
    pub fn new(repo: Arc<dyn NotificationRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        self.repo.list_for_user(user_id).await
    }

    pub async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<()> {
        if !self.repo.mark_read(id, user_id).await? {
            return Err(AppError::NotFound("Notification not found".to_string()));
        }
        Ok(())
    }

    pub async fn subscribe(&self, user_id: Uuid, request: CreateSubscriptionRequest) -> Result<NotificationSubscription> {
        let request = CreateSubscriptionRequest {
            category: request.category,
            department: blank_to_none(request.department),
        };
        if request.category.is_none() && request.department.is_none() {
            return Err(AppError::Validation("Choose a category or a department".to_string()));
        }
        self.repo.create_subscription(user_id, request).await
    }

    pub async fn subscriptions(&self, user_id: Uuid) -> Result<Vec<NotificationSubscription>> {
        self.repo.list_subscriptions(user_id).await
    }

    pub async fn unsubscribe(&self, id: Uuid, user_id: Uuid) -> Result<()> {
        if !self.repo.delete_subscription(id, user_id).await? {
            return Err(AppError::NotFound("Subscription not found".to_string()));
        }
        Ok(())
    }
}
