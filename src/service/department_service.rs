use std::sync::Arc;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    domain::*,
    error::{AppError, Result},
    repository::{AuditRepository, DepartmentRepository},
};

pub struct DepartmentService {
    repo: Arc<dyn DepartmentRepository>,
    audit: Arc<dyn AuditRepository>,
}

impl DepartmentService {
    pub fn new(repo: Arc<dyn DepartmentRepository>, audit: Arc<dyn AuditRepository>) -> Self {
        Self { repo, audit }
    }

    pub async fn list(&self) -> Result<Vec<Department>> {
        self.repo.list().await
    }

    pub async fn create(&self, actor: Uuid, request: CreateDepartmentRequest) -> Result<Department> {
        let request = CreateDepartmentRequest {
            name: request.name.trim().to_string(),
            code: blank_to_none(request.code),
            faculty: blank_to_none(request.faculty),
        };
        request.validate()?;

        if self.repo.find_by_name(&request.name).await?.is_some() {
            return Err(AppError::Conflict("Department already exists".to_string()));
        }

        let department = self.repo.create(request).await?;
        self.audit
            .record(
                NewAuditLog::new(actor, "department_created", "department", department.id)
                    .with_details(json!({ "name": department.name })),
            )
            .await?;

        Ok(department)
    }

    pub async fn update(&self, actor: Uuid, id: Uuid, update: UpdateDepartmentRequest) -> Result<Department> {
        if let Some(name) = update.name.as_deref() {
            let name = name.trim();
            if name.is_empty() {
                return Err(AppError::Validation("Department name is required".to_string()));
            }
            if let Some(existing) = self.repo.find_by_name(name).await? {
                if existing.id != id {
                    return Err(AppError::Conflict("Department already exists".to_string()));
                }
            }
        }

        let department = self.repo.update(id, update).await?;
        self.audit
            .record(NewAuditLog::new(actor, "department_updated", "department", id))
            .await?;

        Ok(department)
    }

    /// Nothing is deleted unless the caller confirmed.
    pub async fn delete(&self, actor: Uuid, id: Uuid, confirmation: Confirmation) -> Result<()> {
        if confirmation == Confirmation::Cancelled {
            return Err(AppError::ConfirmationRequired(
                "Deleting a department must be confirmed".to_string(),
            ));
        }

        self.repo.delete(id).await?;
        self.audit
            .record(NewAuditLog::new(actor, "department_deleted", "department", id))
            .await?;

        tracing::info!("Department {} deleted by {}", id, actor);
        Ok(())
    }
}
