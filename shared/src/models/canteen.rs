//! Canteen model

use serde::{Deserialize, Serialize};

/// Canteen row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Canteen {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub is_open: bool,
    /// Partner user operating this canteen
    pub owner_id: Option<String>,
    pub created_at: i64,
}

/// Create canteen payload (admin)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanteenCreate {
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub owner_id: Option<String>,
}

/// Update canteen payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanteenUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub is_open: Option<bool>,
    pub owner_id: Option<String>,
}
