//! One-time verification codes

use serde::{Deserialize, Serialize};

/// What a verification code is for. One active code per contact+purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    /// Verify email after registration (successful verify also logs in)
    Registration,
    /// Passwordless login for an already-verified account
    Login,
    /// Forgot-password flow
    PasswordReset,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registration => "registration",
            Self::Login => "login",
            Self::PasswordReset => "password_reset",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "registration" => Some(Self::Registration),
            "login" => Some(Self::Login),
            "password_reset" => Some(Self::PasswordReset),
            _ => None,
        }
    }

    /// Purposes that issue a token pair on successful verification
    pub fn issues_tokens(&self) -> bool {
        matches!(self, Self::Registration | Self::Login)
    }
}

impl std::fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored verification code row. The code itself is kept only as an
/// argon2 hash; the clear value exists in transit to the user and nowhere
/// else.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OtpCode {
    pub contact: String,
    pub purpose: String,
    pub code: String,
    pub attempts: i64,
    pub resend_count: i64,
    pub expires_at: i64,
    pub last_sent_at: i64,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purpose_roundtrip() {
        for p in [
            OtpPurpose::Registration,
            OtpPurpose::Login,
            OtpPurpose::PasswordReset,
        ] {
            assert_eq!(OtpPurpose::from_db(p.as_str()), Some(p));
        }
        assert_eq!(OtpPurpose::from_db("mfa"), None);
    }

    #[test]
    fn test_issues_tokens() {
        assert!(OtpPurpose::Registration.issues_tokens());
        assert!(OtpPurpose::Login.issues_tokens());
        assert!(!OtpPurpose::PasswordReset.issues_tokens());
    }
}
