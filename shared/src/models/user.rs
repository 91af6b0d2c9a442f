//! User model

use serde::{Deserialize, Serialize};

/// User row. Accounts are never hard-deleted, only deactivated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    /// Role: student | partner | admin
    pub role: String,
    pub is_active: bool,
    /// Partner accounts require admin approval before acting
    pub is_approved: bool,
    pub email_verified: bool,
    /// Accounts created before mandatory verification are exempt
    pub grandfathered: bool,
    /// Owned canteen (partners only)
    pub canteen_id: Option<String>,
    pub created_at: i64,
}

/// Public view of a user, safe to return from the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPublic {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub is_approved: bool,
    pub email_verified: bool,
    pub canteen_id: Option<String>,
    pub created_at: i64,
}

impl From<&User> for UserPublic {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.clone(),
            name: u.name.clone(),
            email: u.email.clone(),
            phone: u.phone.clone(),
            role: u.role.clone(),
            is_active: u.is_active,
            is_approved: u.is_approved,
            email_verified: u.email_verified,
            canteen_id: u.canteen_id.clone(),
            created_at: u.created_at,
        }
    }
}

impl User {
    /// Whether this user still has to complete email verification
    pub fn verification_required(&self) -> bool {
        !self.email_verified && !self.grandfathered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email_verified: bool, grandfathered: bool) -> User {
        User {
            id: "u1".into(),
            name: "Test".into(),
            email: "t@campus.edu".into(),
            phone: None,
            hashed_password: "x".into(),
            role: "student".into(),
            is_active: true,
            is_approved: false,
            email_verified,
            grandfathered,
            canteen_id: None,
            created_at: 0,
        }
    }

    #[test]
    fn test_verification_required() {
        assert!(user(false, false).verification_required());
        assert!(!user(true, false).verification_required());
        // Grandfathered accounts are exempt even when unverified
        assert!(!user(false, true).verification_required());
    }

    #[test]
    fn test_public_view_has_no_password() {
        let u = user(true, false);
        let json = serde_json::to_string(&UserPublic::from(&u)).unwrap();
        assert!(!json.contains("hashed_password"));
    }
}
