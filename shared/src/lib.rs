//! Shared types for Canteen Connect
//!
//! Common types used by the server and any future clients: error codes,
//! API response structures, domain models, and money helpers.

pub mod error;
pub mod models;
pub mod money;
pub mod util;

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use models::{OrderStatus, OtpPurpose, PaymentStatus, Role};
