//! Caller roles.

use serde::{Deserialize, Serialize};

/// Role carried in the access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Teacher,
    Admin,
}

impl Role {
    /// Staff may manage courses and live sessions.
    pub fn is_staff(&self) -> bool {
        matches!(self, Self::Teacher | Self::Admin)
    }

    /// Admins see and manage every session; teachers only their own.
    pub fn can_manage_all_sessions(&self) -> bool {
        matches!(self, Self::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Admin => "admin",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staff_roles() {
        assert!(!Role::Student.is_staff());
        assert!(Role::Teacher.is_staff());
        assert!(Role::Admin.is_staff());
        assert!(!Role::Teacher.can_manage_all_sessions());
        assert!(Role::Admin.can_manage_all_sessions());
    }

    #[test]
    fn test_role_deserializes_lowercase() {
        let role: Role = serde_json::from_str("\"teacher\"").unwrap();
        assert_eq!(role, Role::Teacher);
    }
}
