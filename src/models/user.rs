//! User profile and credential models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Role {
    Student,
    Faculty,
    Admin,
}

impl Role {
    /// Staff may review and approve bookings.
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Faculty | Role::Admin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Faculty => "faculty",
            Role::Admin => "admin",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "student" => Some(Role::Student),
            "faculty" => Some(Role::Faculty),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum AccountStatus {
    Active,
    Suspended,
    Pending,
}

impl AccountStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Suspended => "suspended",
            AccountStatus::Pending => "pending",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "active" => Some(AccountStatus::Active),
            "suspended" => Some(AccountStatus::Suspended),
            "pending" => Some(AccountStatus::Pending),
            _ => None,
        }
    }
}

/// User profile stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Profile {
    /// User ID (also used as document ID)
    pub user_id: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub student_id: Option<String>,
    /// Class document this user belongs to
    pub class_id: Option<String>,
    #[serde(default)]
    pub is_representative: bool,
    pub role: Role,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

/// Login credentials, keyed by normalized e-mail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub user_id: String,
    pub email: String,
    /// Argon2id PHC string
    pub password_hash: String,
}

/// Lower-case and trim an e-mail address for lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staff_roles() {
        assert!(!Role::Student.is_staff());
        assert!(Role::Faculty.is_staff());
        assert!(Role::Admin.is_staff());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Rep@College.EDU "), "rep@college.edu");
    }

    #[test]
    fn test_role_and_status_parse() {
        assert_eq!(Role::parse("faculty"), Some(Role::Faculty));
        assert_eq!(Role::parse("owner"), None);
        assert_eq!(AccountStatus::parse("suspended"), Some(AccountStatus::Suspended));
        assert_eq!(AccountStatus::parse("banned"), None);
    }
}
