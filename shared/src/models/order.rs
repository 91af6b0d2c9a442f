//! Order model and status state machine

use serde::{Deserialize, Serialize};

/// Order lifecycle status. Stored as lowercase TEXT.
///
/// The normal path is a fixed forward sequence; `cancelled` is reachable
/// from any non-terminal status under role-specific rules, and admins may
/// override to any status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Gateway payment outstanding; not yet visible to the canteen
    Pending,
    Placed,
    Confirmed,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Placed => "placed",
            Self::Confirmed => "confirmed",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse from a DB column value. Returns `None` for unknown values.
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "placed" => Some(Self::Placed),
            "confirmed" => Some(Self::Confirmed),
            "preparing" => Some(Self::Preparing),
            "ready" => Some(Self::Ready),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Next status along the normal forward sequence
    pub fn next_step(&self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::Placed),
            Self::Placed => Some(Self::Confirmed),
            Self::Confirmed => Some(Self::Preparing),
            Self::Preparing => Some(Self::Ready),
            Self::Ready => Some(Self::Completed),
            Self::Completed | Self::Cancelled => None,
        }
    }

    /// Whether `to` is exactly one step forward from this status
    pub fn is_forward_step(&self, to: Self) -> bool {
        self.next_step() == Some(to)
    }

    /// Terminal statuses admit no further transitions (except admin override)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Customers and partners may cancel only in this early window
    pub fn in_cancel_window(&self) -> bool {
        matches!(self, Self::Placed | Self::Confirmed)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment status. Separate axis from order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Refunded => "refunded",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "paid" => Some(Self::Paid),
            "refunded" => Some(Self::Refunded),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order row. Monetary totals are fixed at creation and never recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: String,
    /// Human-readable number (CC-YYYYMMDD-XXXXXX), distinct from id
    pub order_number: String,
    pub user_id: String,
    pub canteen_id: String,
    pub item_total: f64,
    pub tax: f64,
    pub delivery_fee: f64,
    pub total_amount: f64,
    pub status: String,
    pub payment_status: String,
    /// Reference returned by the payment gateway, when one is in play
    pub gateway_order_id: Option<String>,
    pub special_instructions: Option<String>,
    pub cancel_reason: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Order line item. Name and unit price are snapshots taken at order
/// creation so later menu edits do not rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: String,
    pub menu_item_id: String,
    pub name: String,
    pub unit_price: f64,
    pub quantity: i64,
    pub line_total: f64,
}

/// Order with its line items, as returned by detail endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}
