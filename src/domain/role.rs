use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use crate::error::AppError;

/// The closed set of roles a user can hold. Every user holds exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppRole {
    Admin,
    Principal,
    Registrar,
    Dean,
    DepartmentHead,
    GuildLeader,
    AdmissionsOfficer,
    CommunicationOfficer,
    Faculty,
    Staff,
    Student,
}

/// Access tier a role grants. Dashboards and permissions key off the tier,
/// never off the individual role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleTier {
    Admin,
    Staff,
    Student,
}

impl AppRole {
    pub const ALL: [AppRole; 11] = [
        AppRole::Admin,
        AppRole::Principal,
        AppRole::Registrar,
        AppRole::Dean,
        AppRole::DepartmentHead,
        AppRole::GuildLeader,
        AppRole::AdmissionsOfficer,
        AppRole::CommunicationOfficer,
        AppRole::Faculty,
        AppRole::Staff,
        AppRole::Student,
    ];

    pub fn tier(self) -> RoleTier {
        match self {
            AppRole::Admin => RoleTier::Admin,
            AppRole::Principal
            | AppRole::Registrar
            | AppRole::Dean
            | AppRole::DepartmentHead
            | AppRole::GuildLeader
            | AppRole::AdmissionsOfficer
            | AppRole::CommunicationOfficer
            | AppRole::Faculty
            | AppRole::Staff => RoleTier::Staff,
            AppRole::Student => RoleTier::Student,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AppRole::Admin => "admin",
            AppRole::Principal => "principal",
            AppRole::Registrar => "registrar",
            AppRole::Dean => "dean",
            AppRole::DepartmentHead => "department_head",
            AppRole::GuildLeader => "guild_leader",
            AppRole::AdmissionsOfficer => "admissions_officer",
            AppRole::CommunicationOfficer => "communication_officer",
            AppRole::Faculty => "faculty",
            AppRole::Staff => "staff",
            AppRole::Student => "student",
        }
    }

    /// Level recorded on approval rows. Admin decisions sit above staff ones.
    pub fn approval_level(self) -> i32 {
        match self.tier() {
            RoleTier::Admin => 2,
            RoleTier::Staff => 1,
            RoleTier::Student => 0,
        }
    }
}

impl Default for AppRole {
    fn default() -> Self {
        AppRole::Student
    }
}

impl fmt::Display for AppRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AppRole::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid role: {}", s)))
    }
}

impl RoleTier {
    pub fn is_admin(self) -> bool {
        matches!(self, RoleTier::Admin)
    }

    /// Staff-like and admin users write notices and review submissions.
    pub fn can_author_notices(self) -> bool {
        match self {
            RoleTier::Admin | RoleTier::Staff => true,
            RoleTier::Student => false,
        }
    }

    pub fn can_review_notices(self) -> bool {
        self.can_author_notices()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RoleTier::Admin => "admin",
            RoleTier::Staff => "staff",
            RoleTier::Student => "student",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: AppRole,
    pub assigned_by: Option<Uuid>,
    pub assigned_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_table_matches_role_set() {
        let staff: Vec<_> = AppRole::ALL
            .into_iter()
            .filter(|r| r.tier() == RoleTier::Staff)
            .collect();
        assert_eq!(staff.len(), 9);
        assert!(!staff.contains(&AppRole::Admin));
        assert!(!staff.contains(&AppRole::Student));
        assert_eq!(AppRole::Admin.tier(), RoleTier::Admin);
        assert_eq!(AppRole::Student.tier(), RoleTier::Student);
    }

    #[test]
    fn role_strings_round_trip() {
        for role in AppRole::ALL {
            assert_eq!(role.as_str().parse::<AppRole>().unwrap(), role);
        }
        assert!("superuser".parse::<AppRole>().is_err());
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&AppRole::DepartmentHead).unwrap();
        assert_eq!(json, "\"department_head\"");
    }

    #[test]
    fn students_cannot_author() {
        assert!(!RoleTier::Student.can_author_notices());
        assert!(RoleTier::Staff.can_review_notices());
        assert!(RoleTier::Admin.is_admin());
    }
}
