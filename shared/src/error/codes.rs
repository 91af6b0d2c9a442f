//! Unified error codes for Canteen Connect
//!
//! This module defines all error codes used across the server and frontend.
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Verification (OTP) errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Menu errors
//! - 7xxx: Canteen errors
//! - 8xxx: User errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Refresh token is invalid or revoked
    RefreshTokenInvalid = 1005,
    /// Account is disabled
    AccountDisabled = 1006,
    /// Partner account not yet approved
    AccountNotApproved = 1007,
    /// Email not verified
    EmailNotVerified = 1008,
    /// Password too short
    PasswordTooShort = 1009,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Specific role required
    RoleRequired = 2002,
    /// Admin role required
    AdminRequired = 2003,

    // ==================== 3xxx: Verification ====================
    /// No pending verification code
    VerificationCodeNotFound = 3001,
    /// Verification code expired
    VerificationCodeExpired = 3002,
    /// Verification code invalid
    VerificationCodeInvalid = 3003,
    /// Too many verification attempts
    TooManyAttempts = 3004,
    /// Resend requested during cooldown
    ResendCooldown = 3005,
    /// Resend limit reached for this code
    ResendLimitReached = 3006,
    /// Code delivery failed
    DeliveryFailed = 3007,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order is empty
    OrderEmpty = 4002,
    /// Order has already been completed
    OrderAlreadyCompleted = 4003,
    /// Order has already been cancelled
    OrderAlreadyCancelled = 4004,
    /// Invalid status transition
    InvalidStatusTransition = 4005,
    /// Cancellation window has closed
    CancelWindowClosed = 4006,

    // ==================== 5xxx: Payment ====================
    /// Payment processing failed
    PaymentFailed = 5001,
    /// Payment signature verification failed
    PaymentSignatureInvalid = 5002,
    /// Order is not paid
    OrderNotPaid = 5003,
    /// Payment has already been refunded
    PaymentAlreadyRefunded = 5004,
    /// Payment gateway request failed
    PaymentGatewayError = 5005,
    /// Refund not allowed in current state
    RefundNotAllowed = 5006,

    // ==================== 6xxx: Menu ====================
    /// Menu item not found
    MenuItemNotFound = 6001,
    /// Menu item is unavailable
    MenuItemUnavailable = 6002,
    /// Menu item belongs to a different canteen
    MenuItemWrongCanteen = 6003,
    /// Menu item has invalid price
    MenuItemInvalidPrice = 6004,

    // ==================== 7xxx: Canteen ====================
    /// Canteen not found
    CanteenNotFound = 7001,
    /// Canteen is closed
    CanteenClosed = 7002,
    /// Canteen name already exists
    CanteenNameExists = 7003,
    /// Not the owner of this canteen
    NotCanteenOwner = 7004,

    // ==================== 8xxx: User ====================
    /// User not found
    UserNotFound = 8001,
    /// Email already registered
    EmailAlreadyRegistered = 8002,
    /// User is not a partner
    UserNotPartner = 8003,
    /// Cannot modify own account this way
    CannotModifySelf = 8004,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Operation timeout
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
    /// Too many requests
    RateLimited = 9006,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::RefreshTokenInvalid => "Refresh token is invalid or revoked",
            ErrorCode::AccountDisabled => "Account is disabled",
            ErrorCode::AccountNotApproved => "Partner account is awaiting approval",
            ErrorCode::EmailNotVerified => "Email not verified",
            ErrorCode::PasswordTooShort => "Password must be at least 8 characters",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::RoleRequired => "Specific role is required",
            ErrorCode::AdminRequired => "Administrator role is required",

            // Verification
            ErrorCode::VerificationCodeNotFound => "No pending verification code",
            ErrorCode::VerificationCodeExpired => "Verification code has expired",
            ErrorCode::VerificationCodeInvalid => "Invalid verification code",
            ErrorCode::TooManyAttempts => "Too many attempts",
            ErrorCode::ResendCooldown => "Please wait before requesting another code",
            ErrorCode::ResendLimitReached => "Resend limit reached",
            ErrorCode::DeliveryFailed => "Failed to deliver verification code",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderEmpty => "Order is empty",
            ErrorCode::OrderAlreadyCompleted => "Order has already been completed",
            ErrorCode::OrderAlreadyCancelled => "Order has already been cancelled",
            ErrorCode::InvalidStatusTransition => "Invalid order status transition",
            ErrorCode::CancelWindowClosed => "Order can no longer be cancelled",

            // Payment
            ErrorCode::PaymentFailed => "Payment processing failed",
            ErrorCode::PaymentSignatureInvalid => "Payment signature verification failed",
            ErrorCode::OrderNotPaid => "Order is not paid",
            ErrorCode::PaymentAlreadyRefunded => "Payment has already been refunded",
            ErrorCode::PaymentGatewayError => "Payment gateway request failed",
            ErrorCode::RefundNotAllowed => "Refund is not allowed in the current state",

            // Menu
            ErrorCode::MenuItemNotFound => "Menu item not found",
            ErrorCode::MenuItemUnavailable => "Menu item is unavailable",
            ErrorCode::MenuItemWrongCanteen => "Menu item belongs to a different canteen",
            ErrorCode::MenuItemInvalidPrice => "Menu item has invalid price",

            // Canteen
            ErrorCode::CanteenNotFound => "Canteen not found",
            ErrorCode::CanteenClosed => "Canteen is closed",
            ErrorCode::CanteenNameExists => "Canteen name already exists",
            ErrorCode::NotCanteenOwner => "Not the owner of this canteen",

            // User
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::EmailAlreadyRegistered => "Email already registered",
            ErrorCode::UserNotPartner => "User is not a partner",
            ErrorCode::CannotModifySelf => "Cannot modify own account this way",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::RateLimited => "Too many requests, try again later",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1005 => Ok(ErrorCode::RefreshTokenInvalid),
            1006 => Ok(ErrorCode::AccountDisabled),
            1007 => Ok(ErrorCode::AccountNotApproved),
            1008 => Ok(ErrorCode::EmailNotVerified),
            1009 => Ok(ErrorCode::PasswordTooShort),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::RoleRequired),
            2003 => Ok(ErrorCode::AdminRequired),

            // Verification
            3001 => Ok(ErrorCode::VerificationCodeNotFound),
            3002 => Ok(ErrorCode::VerificationCodeExpired),
            3003 => Ok(ErrorCode::VerificationCodeInvalid),
            3004 => Ok(ErrorCode::TooManyAttempts),
            3005 => Ok(ErrorCode::ResendCooldown),
            3006 => Ok(ErrorCode::ResendLimitReached),
            3007 => Ok(ErrorCode::DeliveryFailed),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderEmpty),
            4003 => Ok(ErrorCode::OrderAlreadyCompleted),
            4004 => Ok(ErrorCode::OrderAlreadyCancelled),
            4005 => Ok(ErrorCode::InvalidStatusTransition),
            4006 => Ok(ErrorCode::CancelWindowClosed),

            // Payment
            5001 => Ok(ErrorCode::PaymentFailed),
            5002 => Ok(ErrorCode::PaymentSignatureInvalid),
            5003 => Ok(ErrorCode::OrderNotPaid),
            5004 => Ok(ErrorCode::PaymentAlreadyRefunded),
            5005 => Ok(ErrorCode::PaymentGatewayError),
            5006 => Ok(ErrorCode::RefundNotAllowed),

            // Menu
            6001 => Ok(ErrorCode::MenuItemNotFound),
            6002 => Ok(ErrorCode::MenuItemUnavailable),
            6003 => Ok(ErrorCode::MenuItemWrongCanteen),
            6004 => Ok(ErrorCode::MenuItemInvalidPrice),

            // Canteen
            7001 => Ok(ErrorCode::CanteenNotFound),
            7002 => Ok(ErrorCode::CanteenClosed),
            7003 => Ok(ErrorCode::CanteenNameExists),
            7004 => Ok(ErrorCode::NotCanteenOwner),

            // User
            8001 => Ok(ErrorCode::UserNotFound),
            8002 => Ok(ErrorCode::EmailAlreadyRegistered),
            8003 => Ok(ErrorCode::UserNotPartner),
            8004 => Ok(ErrorCode::CannotModifySelf),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),
            9006 => Ok(ErrorCode::RateLimited),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        // General
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::Unknown.code(), 1);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::NotFound.code(), 3);
        assert_eq!(ErrorCode::AlreadyExists.code(), 4);

        // Auth
        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::InvalidCredentials.code(), 1002);
        assert_eq!(ErrorCode::TokenExpired.code(), 1003);
        assert_eq!(ErrorCode::TokenInvalid.code(), 1004);
        assert_eq!(ErrorCode::RefreshTokenInvalid.code(), 1005);

        // Permission
        assert_eq!(ErrorCode::PermissionDenied.code(), 2001);
        assert_eq!(ErrorCode::RoleRequired.code(), 2002);
        assert_eq!(ErrorCode::AdminRequired.code(), 2003);

        // Verification
        assert_eq!(ErrorCode::VerificationCodeNotFound.code(), 3001);
        assert_eq!(ErrorCode::VerificationCodeExpired.code(), 3002);
        assert_eq!(ErrorCode::VerificationCodeInvalid.code(), 3003);
        assert_eq!(ErrorCode::TooManyAttempts.code(), 3004);
        assert_eq!(ErrorCode::ResendCooldown.code(), 3005);
        assert_eq!(ErrorCode::ResendLimitReached.code(), 3006);

        // Order
        assert_eq!(ErrorCode::OrderNotFound.code(), 4001);
        assert_eq!(ErrorCode::OrderEmpty.code(), 4002);
        assert_eq!(ErrorCode::InvalidStatusTransition.code(), 4005);
        assert_eq!(ErrorCode::CancelWindowClosed.code(), 4006);

        // Payment
        assert_eq!(ErrorCode::PaymentFailed.code(), 5001);
        assert_eq!(ErrorCode::PaymentSignatureInvalid.code(), 5002);
        assert_eq!(ErrorCode::PaymentAlreadyRefunded.code(), 5004);

        // Menu
        assert_eq!(ErrorCode::MenuItemNotFound.code(), 6001);
        assert_eq!(ErrorCode::MenuItemUnavailable.code(), 6002);

        // Canteen
        assert_eq!(ErrorCode::CanteenNotFound.code(), 7001);
        assert_eq!(ErrorCode::CanteenClosed.code(), 7002);

        // User
        assert_eq!(ErrorCode::UserNotFound.code(), 8001);
        assert_eq!(ErrorCode::EmailAlreadyRegistered.code(), 8002);

        // System
        assert_eq!(ErrorCode::InternalError.code(), 9001);
        assert_eq!(ErrorCode::DatabaseError.code(), 9002);
        assert_eq!(ErrorCode::RateLimited.code(), 9006);
    }

    #[test]
    fn test_is_success() {
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::Unknown.is_success());
        assert!(!ErrorCode::NotFound.is_success());
        assert!(!ErrorCode::InternalError.is_success());
    }

    #[test]
    fn test_try_from_valid() {
        assert_eq!(ErrorCode::try_from(0), Ok(ErrorCode::Success));
        assert_eq!(ErrorCode::try_from(1001), Ok(ErrorCode::NotAuthenticated));
        assert_eq!(ErrorCode::try_from(4001), Ok(ErrorCode::OrderNotFound));
        assert_eq!(
            ErrorCode::try_from(5002),
            Ok(ErrorCode::PaymentSignatureInvalid)
        );
        assert_eq!(ErrorCode::try_from(9001), Ok(ErrorCode::InternalError));
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(999), Err(InvalidErrorCode(999)));
        assert_eq!(ErrorCode::try_from(10000), Err(InvalidErrorCode(10000)));
        assert_eq!(ErrorCode::try_from(1234), Err(InvalidErrorCode(1234)));
    }

    #[test]
    fn test_serialize() {
        let code = ErrorCode::NotFound;
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "3");

        let code = ErrorCode::OrderNotFound;
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "4001");
    }

    #[test]
    fn test_deserialize() {
        let code: ErrorCode = serde_json::from_str("0").unwrap();
        assert_eq!(code, ErrorCode::Success);

        let code: ErrorCode = serde_json::from_str("4001").unwrap();
        assert_eq!(code, ErrorCode::OrderNotFound);

        let code: ErrorCode = serde_json::from_str("3002").unwrap();
        assert_eq!(code, ErrorCode::VerificationCodeExpired);
    }

    #[test]
    fn test_deserialize_invalid() {
        let result: Result<ErrorCode, _> = serde_json::from_str("999");
        assert!(result.is_err());

        let result: Result<ErrorCode, _> = serde_json::from_str("10000");
        assert!(result.is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ErrorCode::Success), "0");
        assert_eq!(format!("{}", ErrorCode::NotFound), "3");
        assert_eq!(format!("{}", ErrorCode::OrderNotFound), "4001");
    }

    #[test]
    fn test_message() {
        assert_eq!(ErrorCode::NotFound.message(), "Resource not found");
        assert_eq!(ErrorCode::OrderNotFound.message(), "Order not found");
        assert_eq!(
            ErrorCode::ResendCooldown.message(),
            "Please wait before requesting another code"
        );
        assert_eq!(ErrorCode::InternalError.message(), "Internal server error");
    }

    #[test]
    fn test_roundtrip() {
        let codes = [
            ErrorCode::Success,
            ErrorCode::NotAuthenticated,
            ErrorCode::PermissionDenied,
            ErrorCode::VerificationCodeInvalid,
            ErrorCode::OrderNotFound,
            ErrorCode::PaymentSignatureInvalid,
            ErrorCode::CanteenClosed,
            ErrorCode::InternalError,
        ];

        for code in codes {
            let json = serde_json::to_string(&code).unwrap();
            let parsed: ErrorCode = serde_json::from_str(&json).unwrap();
            assert_eq!(code, parsed);
        }
    }
}
