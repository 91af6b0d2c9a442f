//! Data models
//!
//! Shared between the server and frontend (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All entity IDs are UUID strings; timestamps are Unix milliseconds.

pub mod canteen;
pub mod menu_item;
pub mod order;
pub mod otp;
pub mod role;
pub mod user;

// Re-exports
pub use canteen::*;
pub use menu_item::*;
pub use order::*;
pub use otp::*;
pub use role::*;
pub use user::*;
