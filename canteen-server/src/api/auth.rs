//! Authentication endpoints: register, login, token refresh, profile
//! and password management

use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::{OtpPurpose, Role, UserPublic};
use shared::util::{hash_password, now_millis, verify_password};
use validator::Validate;

use crate::auth::CurrentUser;
use crate::db;
use crate::state::AppState;

use super::{ApiResult, validate};

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    pub user: UserPublic,
}

pub(super) async fn issue_tokens(
    state: &AppState,
    user: &shared::models::User,
) -> Result<TokenResponse, AppError> {
    let role = Role::from_db(&user.role)
        .ok_or_else(|| AppError::internal(format!("Unknown role in user row: {}", user.role)))?;
    let access_token =
        state
            .jwt
            .generate_token(&user.id, &user.email, role, user.canteen_id.as_deref())?;
    let refresh_token = db::refresh_tokens::create(&state.pool, &user.id).await?;

    Ok(TokenResponse {
        access_token,
        refresh_token,
        token_type: "Bearer",
        expires_in: state.jwt.config.expiration_minutes * 60,
        user: UserPublic::from(user),
    })
}

// ── Registration ──

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 7, max = 20, message = "Invalid phone number"))]
    pub phone: Option<String>,
    /// student (default) or partner; admin accounts are seeded, never registered
    pub role: Option<String>,
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<serde_json::Value> {
    validate(&req)?;
    let email = req.email.trim().to_lowercase();

    let role = match req.role.as_deref() {
        None | Some("student") => Role::Student,
        Some("partner") => Role::Partner,
        Some(other) => {
            return Err(AppError::invalid_request(format!(
                "Role '{other}' cannot be self-registered"
            )));
        }
    };

    if db::users::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::new(ErrorCode::EmailAlreadyRegistered));
    }

    let hashed = hash_password(&req.password).map_err(|e| {
        tracing::error!("Password hashing failed: {e}");
        AppError::new(ErrorCode::InternalError)
    })?;
    let id = uuid::Uuid::new_v4().to_string();

    db::users::insert(
        &state.pool,
        &db::users::NewUser {
            id: &id,
            name: req.name.trim(),
            email: &email,
            phone: req.phone.as_deref(),
            hashed_password: &hashed,
            role: role.as_str(),
            // Partners wait for admin approval
            is_approved: role == Role::Student,
            created_at: now_millis(),
        },
    )
    .await?;

    // Verification code is best-effort here; the client can hit the resend
    // route if delivery hiccups
    if let Err(e) = state.otp.send(&email, OtpPurpose::Registration).await {
        tracing::warn!(email = %email, "Registration code delivery failed: {}", e.message);
    }

    tracing::info!(user_id = %id, role = %role, "User registered");

    Ok(Json(serde_json::json!({
        "user_id": id,
        "message": "Registered. Check your inbox for a verification code.",
    })))
}

// ── Login ──

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// POST /api/auth/login
///
/// Responds after a fixed minimum delay so timing does not reveal whether
/// the email exists.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<TokenResponse> {
    let started = tokio::time::Instant::now();
    let result = login_inner(&state, req).await;
    let elapsed = started.elapsed();
    let floor = std::time::Duration::from_millis(state.config.auth_fixed_delay_ms);
    if elapsed < floor {
        tokio::time::sleep(floor - elapsed).await;
    }
    result.map(Json)
}

async fn login_inner(state: &AppState, req: LoginRequest) -> Result<TokenResponse, AppError> {
    validate(&req)?;
    let email = req.email.trim().to_lowercase();

    let user = db::users::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(AppError::invalid_credentials)?;

    if !verify_password(&req.password, &user.hashed_password) {
        return Err(AppError::invalid_credentials());
    }

    if !user.is_active {
        return Err(AppError::new(ErrorCode::AccountDisabled));
    }
    if user.verification_required() {
        return Err(AppError::new(ErrorCode::EmailNotVerified));
    }
    if user.role == Role::Partner.as_str() && !user.is_approved {
        return Err(AppError::new(ErrorCode::AccountNotApproved));
    }

    let tokens = issue_tokens(state, &user).await?;
    tracing::info!(user_id = %user.id, "User logged in");
    Ok(tokens)
}

// ── Token refresh and logout ──

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<TokenResponse> {
    let (user_id, new_refresh) = db::refresh_tokens::rotate(&state.pool, &req.refresh_token)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::RefreshTokenInvalid))?;

    let user = db::users::find_by_id(&state.pool, &user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::RefreshTokenInvalid))?;
    if !user.is_active {
        return Err(AppError::new(ErrorCode::AccountDisabled));
    }

    let role = Role::from_db(&user.role)
        .ok_or_else(|| AppError::internal(format!("Unknown role in user row: {}", user.role)))?;
    let access_token =
        state
            .jwt
            .generate_token(&user.id, &user.email, role, user.canteen_id.as_deref())?;

    Ok(Json(TokenResponse {
        access_token,
        refresh_token: new_refresh,
        token_type: "Bearer",
        expires_in: state.jwt.config.expiration_minutes * 60,
        user: UserPublic::from(&user),
    }))
}

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: Option<String>,
    /// Revoke every session, not just this one
    #[serde(default)]
    pub everywhere: bool,
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<LogoutRequest>,
) -> ApiResult<serde_json::Value> {
    if req.everywhere {
        db::refresh_tokens::revoke_all(&state.pool, &user.user_id).await?;
    } else if let Some(token) = &req.refresh_token {
        db::refresh_tokens::revoke(&state.pool, token).await?;
    }
    Ok(Json(serde_json::json!({ "message": "Logged out" })))
}

// ── Profile ──

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<UserPublic> {
    let user = db::users::find_by_id(&state.pool, &current.user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    Ok(Json(UserPublic::from(&user)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(length(min = 7, max = 20, message = "Invalid phone number"))]
    pub phone: Option<String>,
}

/// PUT /api/auth/profile
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<UserPublic> {
    validate(&req)?;
    db::users::update_profile(&state.pool, &current.user_id, req.name.trim(), req.phone.as_deref())
        .await?;

    let user = db::users::find_by_id(&state.pool, &current.user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    Ok(Json(UserPublic::from(&user)))
}

// ── Password management ──

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

/// POST /api/auth/change-password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<serde_json::Value> {
    validate(&req)?;

    let user = db::users::find_by_id(&state.pool, &current.user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

    if !verify_password(&req.current_password, &user.hashed_password) {
        return Err(AppError::invalid_credentials());
    }

    let hashed = hash_password(&req.new_password).map_err(|e| {
        tracing::error!("Password hashing failed: {e}");
        AppError::new(ErrorCode::InternalError)
    })?;
    db::users::update_password(&state.pool, &user.id, &hashed).await?;

    // Changing the password kills every open session
    db::refresh_tokens::revoke_all(&state.pool, &user.id).await?;

    Ok(Json(serde_json::json!({ "message": "Password changed" })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

/// POST /api/auth/forgot-password
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> ApiResult<serde_json::Value> {
    validate(&req)?;
    let email = req.email.trim().to_lowercase();

    // Always return OK to prevent email enumeration
    if db::users::find_by_email(&state.pool, &email).await?.is_some()
        && let Err(e) = state.otp.send(&email, OtpPurpose::PasswordReset).await
    {
        tracing::warn!(email = %email, "Reset code delivery failed: {}", e.message);
    }

    Ok(Json(serde_json::json!({
        "message": "If the email exists, a reset code has been sent"
    })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(equal = 6, message = "Code must be 6 digits"))]
    pub code: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

/// POST /api/auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<serde_json::Value> {
    validate(&req)?;
    let email = req.email.trim().to_lowercase();

    state
        .otp
        .verify(&email, OtpPurpose::PasswordReset, &req.code)
        .await?;

    let user = db::users::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

    let hashed = hash_password(&req.new_password).map_err(|e| {
        tracing::error!("Password hashing failed: {e}");
        AppError::new(ErrorCode::InternalError)
    })?;
    db::users::update_password(&state.pool, &user.id, &hashed).await?;
    db::refresh_tokens::revoke_all(&state.pool, &user.id).await?;

    tracing::info!(user_id = %user.id, "Password reset via verification code");
    Ok(Json(serde_json::json!({ "message": "Password has been reset" })))
}
