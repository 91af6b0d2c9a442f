//! One-time verification codes
//!
//! Codes are 6 digits, argon2-hashed at rest, and expire after 5 minutes.
//! One live code per contact+purpose: sending again regenerates the code
//! and resets the attempt counter, while the resend counter carries
//! forward so the per-session cap holds across regenerated codes.

pub mod delivery;

pub use delivery::CodeDelivery;

use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::OtpPurpose;
use shared::util::{generate_code, hash_password, now_millis, verify_password};
use sqlx::SqlitePool;

use crate::db;

const OTP_TTL_MS: i64 = 5 * 60 * 1000;
const RESEND_COOLDOWN_MS: i64 = 60 * 1000;
const MAX_ATTEMPTS: i64 = 5;
const MAX_RESENDS: i64 = 5;

/// Verification state for a contact+purpose, safe to expose to clients
/// (never includes the code).
#[derive(Debug, Serialize)]
pub struct OtpStatus {
    pub pending: bool,
    pub attempts_remaining: i64,
    pub resends_remaining: i64,
    pub expires_at: Option<i64>,
    pub cooldown_secs: i64,
}

#[derive(Clone)]
pub struct OtpService {
    pool: SqlitePool,
    delivery: CodeDelivery,
}

impl OtpService {
    pub fn new(pool: SqlitePool, delivery: CodeDelivery) -> Self {
        Self { pool, delivery }
    }

    /// Generate and deliver a code. The first send for a contact+purpose
    /// starts the resend counter at zero; every later send counts as a
    /// resend and is subject to the cooldown and the cap.
    pub async fn send(&self, contact: &str, purpose: OtpPurpose) -> Result<(), AppError> {
        let now = now_millis();
        let existing = db::otp_codes::find(&self.pool, contact, purpose.as_str()).await?;

        let resend_count = match &existing {
            Some(row) => {
                let since_last = now - row.last_sent_at;
                if since_last < RESEND_COOLDOWN_MS {
                    // Round up so "1ms left" reports 1s, not 0
                    let remaining = (RESEND_COOLDOWN_MS - since_last + 999) / 1000;
                    return Err(AppError::new(ErrorCode::ResendCooldown)
                        .with_detail("retry_after_secs", remaining));
                }
                if row.resend_count >= MAX_RESENDS {
                    return Err(AppError::new(ErrorCode::ResendLimitReached));
                }
                row.resend_count + 1
            }
            None => 0,
        };

        let code = generate_code();
        let code_hash = hash_password(&code).map_err(|e| {
            tracing::error!("Code hashing failed: {e}");
            AppError::new(ErrorCode::InternalError)
        })?;

        // Deliver before persisting: a failed delivery must leave any
        // previous code, its attempt counter and its cooldown untouched
        self.delivery.deliver(contact, &code, purpose).await?;

        db::otp_codes::upsert(
            &self.pool,
            contact,
            purpose.as_str(),
            &code_hash,
            resend_count,
            now + OTP_TTL_MS,
            now,
        )
        .await?;

        Ok(())
    }

    /// Check a submitted code. Consumes the code on success; counts the
    /// attempt on failure.
    pub async fn verify(
        &self,
        contact: &str,
        purpose: OtpPurpose,
        code: &str,
    ) -> Result<(), AppError> {
        let row = db::otp_codes::find(&self.pool, contact, purpose.as_str())
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::VerificationCodeNotFound))?;

        if row.expires_at < now_millis() {
            db::otp_codes::delete(&self.pool, contact, purpose.as_str()).await?;
            return Err(AppError::new(ErrorCode::VerificationCodeExpired));
        }

        if row.attempts >= MAX_ATTEMPTS {
            return Err(AppError::new(ErrorCode::TooManyAttempts));
        }

        // Count the attempt before checking the code
        db::otp_codes::increment_attempts(&self.pool, contact, purpose.as_str()).await?;

        if !verify_password(code, &row.code) {
            let remaining = MAX_ATTEMPTS - row.attempts - 1;
            return Err(AppError::new(ErrorCode::VerificationCodeInvalid)
                .with_detail("attempts_remaining", remaining));
        }

        db::otp_codes::delete(&self.pool, contact, purpose.as_str()).await?;
        Ok(())
    }

    /// Current verification state, for client UI (countdown timers etc.)
    pub async fn status(&self, contact: &str, purpose: OtpPurpose) -> Result<OtpStatus, AppError> {
        let now = now_millis();
        let row = db::otp_codes::find(&self.pool, contact, purpose.as_str()).await?;

        Ok(match row {
            Some(row) if row.expires_at >= now => OtpStatus {
                pending: true,
                attempts_remaining: (MAX_ATTEMPTS - row.attempts).max(0),
                resends_remaining: (MAX_RESENDS - row.resend_count).max(0),
                expires_at: Some(row.expires_at),
                cooldown_secs: ((row.last_sent_at + RESEND_COOLDOWN_MS - now).max(0) + 999) / 1000,
            },
            _ => OtpStatus {
                pending: false,
                attempts_remaining: MAX_ATTEMPTS,
                resends_remaining: MAX_RESENDS,
                expires_at: None,
                cooldown_secs: 0,
            },
        })
    }
}
