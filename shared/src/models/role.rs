//! User roles

use serde::{Deserialize, Serialize};

/// Account role. Stored as lowercase TEXT in the users table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Customer placing orders
    Student,
    /// Canteen operator managing a menu and incoming orders
    Partner,
    /// Platform administrator
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Partner => "partner",
            Self::Admin => "admin",
        }
    }

    /// Parse from a DB column value. Returns `None` for unknown values.
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "student" => Some(Self::Student),
            "partner" => Some(Self::Partner),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip() {
        for role in [Role::Student, Role::Partner, Role::Admin] {
            assert_eq!(Role::from_db(role.as_str()), Some(role));
        }
        assert_eq!(Role::from_db("superuser"), None);
    }

    #[test]
    fn test_role_serde() {
        assert_eq!(serde_json::to_string(&Role::Student).unwrap(), "\"student\"");
        let role: Role = serde_json::from_str("\"partner\"").unwrap();
        assert_eq!(role, Role::Partner);
    }
}
