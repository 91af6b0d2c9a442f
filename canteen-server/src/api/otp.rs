//! Verification code endpoints

use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::{OtpPurpose, Role};
use validator::Validate;

use crate::db;
use crate::otp::OtpStatus;
use crate::state::AppState;

use super::auth::{TokenResponse, issue_tokens};
use super::{ApiResult, validate};

fn parse_purpose(value: &str) -> Result<OtpPurpose, AppError> {
    OtpPurpose::from_db(value)
        .ok_or_else(|| AppError::invalid_request(format!("Unknown purpose '{value}'")))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendCodeRequest {
    #[validate(email(message = "Invalid email address"))]
    pub contact: String,
    /// registration | login | password_reset
    pub purpose: String,
}

/// POST /api/otp/send (also /api/otp/resend)
///
/// The response never reveals whether the contact maps to an account;
/// cooldown and resend-cap errors still surface so clients can show a
/// countdown.
pub async fn send_code(
    State(state): State<AppState>,
    Json(req): Json<SendCodeRequest>,
) -> ApiResult<serde_json::Value> {
    validate(&req)?;
    let contact = req.contact.trim().to_lowercase();
    let purpose = parse_purpose(&req.purpose)?;

    // Codes are only generated for accounts that exist; the reply is
    // identical either way so the route cannot be used for enumeration
    if db::users::find_by_email(&state.pool, &contact).await?.is_some() {
        state.otp.send(&contact, purpose).await?;
    }

    Ok(Json(serde_json::json!({
        "message": "If the contact is registered, a code has been sent"
    })))
}

#[derive(Debug, Serialize)]
pub struct VerifyCodeResponse {
    pub verified: bool,
    /// Present for purposes that log the user in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<TokenResponse>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyCodeRequest {
    #[validate(email(message = "Invalid email address"))]
    pub contact: String,
    pub purpose: String,
    #[validate(length(equal = 6, message = "Code must be 6 digits"))]
    pub code: String,
}

/// POST /api/otp/verify
pub async fn verify_code(
    State(state): State<AppState>,
    Json(req): Json<VerifyCodeRequest>,
) -> ApiResult<VerifyCodeResponse> {
    validate(&req)?;
    let contact = req.contact.trim().to_lowercase();
    let purpose = parse_purpose(&req.purpose)?;

    // Password-reset codes are consumed by the reset-password route so the
    // code and the new password land in one request
    if purpose == OtpPurpose::PasswordReset {
        return Err(AppError::invalid_request(
            "Use the reset-password route for password_reset codes",
        ));
    }

    state.otp.verify(&contact, purpose, &req.code).await?;

    if purpose == OtpPurpose::Registration {
        db::users::mark_email_verified(&state.pool, &contact).await?;
    }

    let tokens = if purpose.issues_tokens() {
        let user = db::users::find_by_email(&state.pool, &contact)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

        if !user.is_active {
            return Err(AppError::new(ErrorCode::AccountDisabled));
        }
        // Passwordless login is for verified accounts only
        if purpose == OtpPurpose::Login && user.verification_required() {
            return Err(AppError::new(ErrorCode::EmailNotVerified));
        }
        if user.role == Role::Partner.as_str() && !user.is_approved {
            return Err(AppError::new(ErrorCode::AccountNotApproved));
        }

        Some(issue_tokens(&state, &user).await?)
    } else {
        None
    };

    tracing::info!(contact = %contact, purpose = %purpose.as_str(), "Verification code accepted");
    Ok(Json(VerifyCodeResponse {
        verified: true,
        tokens,
    }))
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub purpose: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerificationStatusResponse {
    pub email_verified: bool,
    pub verification_required: bool,
    #[serde(flatten)]
    pub code: OtpStatus,
}

/// GET /api/otp/status?purpose=...
///
/// Reports the caller's own verification state plus any pending code for
/// the given purpose (default registration), so clients can drive
/// countdown and resend UI.
pub async fn code_status(
    State(state): State<AppState>,
    Extension(current): Extension<crate::auth::CurrentUser>,
    Query(query): Query<StatusQuery>,
) -> ApiResult<VerificationStatusResponse> {
    let purpose = match query.purpose.as_deref() {
        Some(p) => parse_purpose(p)?,
        None => OtpPurpose::Registration,
    };

    let user = db::users::find_by_email(&state.pool, &current.email)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    let code = state.otp.status(&current.email, purpose).await?;

    Ok(Json(VerificationStatusResponse {
        email_verified: user.email_verified,
        verification_required: user.verification_required(),
        code,
    }))
}
