//! Menu item model

use serde::{Deserialize, Serialize};

/// Menu item row. Price is stored as REAL; all arithmetic goes
/// through `money::to_decimal` before use.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MenuItem {
    pub id: String,
    pub canteen_id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: f64,
    pub is_available: bool,
    pub created_at: i64,
}

/// Create menu item payload (partner)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItemCreate {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: f64,
}

/// Update menu item payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItemUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub is_available: Option<bool>,
}
