use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::NoticeStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoticeApproval {
    pub id: Uuid,
    pub notice_id: Uuid,
    pub approver_id: Uuid,
    pub approval_level: i32,
    pub status: ApprovalDecision,
    pub comments: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    Approved,
    Rejected,
}

impl ApprovalDecision {
    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalDecision::Approved => "approved",
            ApprovalDecision::Rejected => "rejected",
        }
    }

    pub fn target_status(self) -> NoticeStatus {
        match self {
            ApprovalDecision::Approved => NoticeStatus::Approved,
            ApprovalDecision::Rejected => NoticeStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub comments: Option<String>,
}
