//! Admin endpoints: user management, canteen management, refunds

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{Canteen, CanteenCreate, CanteenUpdate, OrderStatus, PaymentStatus, Role, UserPublic};
use shared::util::now_millis;

use crate::auth::{Action, CurrentUser, policy};
use crate::db;
use crate::state::AppState;

use super::ApiResult;

// ── Users ──

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Vec<UserPublic>> {
    policy::require(user.role, Action::ManageUsers)?;
    let users = db::users::list(&state.pool).await?;
    Ok(Json(users.iter().map(UserPublic::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

/// PUT /api/admin/users/{id}/active
pub async fn set_user_active(
    State(state): State<AppState>,
    Extension(admin): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(req): Json<SetActiveRequest>,
) -> ApiResult<UserPublic> {
    policy::require(admin.role, Action::ManageUsers)?;
    if id == admin.user_id {
        return Err(AppError::new(ErrorCode::CannotModifySelf));
    }

    let user = db::users::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

    db::users::set_active(&state.pool, &user.id, req.is_active).await?;
    if !req.is_active {
        // A disabled account loses its sessions immediately
        db::refresh_tokens::revoke_all(&state.pool, &user.id).await?;
    }
    tracing::info!(user_id = %user.id, is_active = req.is_active, "User active flag changed");

    let user = db::users::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    Ok(Json(UserPublic::from(&user)))
}

#[derive(Debug, Deserialize)]
pub struct ApprovePartnerRequest {
    pub canteen_id: String,
}

/// POST /api/admin/users/{id}/approve
///
/// Approves a partner account and ties it to the canteen it operates.
pub async fn approve_partner(
    State(state): State<AppState>,
    Extension(admin): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(req): Json<ApprovePartnerRequest>,
) -> ApiResult<UserPublic> {
    policy::require(admin.role, Action::ManageUsers)?;

    let user = db::users::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    if user.role != Role::Partner.as_str() {
        return Err(AppError::new(ErrorCode::UserNotPartner));
    }

    let canteen = db::canteens::find_by_id(&state.pool, &req.canteen_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CanteenNotFound))?;

    db::users::approve_partner(&state.pool, &user.id, &canteen.id).await?;
    db::canteens::update(
        &state.pool,
        &canteen.id,
        &CanteenUpdate {
            name: None,
            description: None,
            location: None,
            is_open: None,
            owner_id: Some(user.id.clone()),
        },
    )
    .await?;
    tracing::info!(user_id = %user.id, canteen_id = %canteen.id, "Partner approved");

    let user = db::users::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    Ok(Json(UserPublic::from(&user)))
}

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: String,
}

/// PUT /api/admin/users/{id}/role
pub async fn set_user_role(
    State(state): State<AppState>,
    Extension(admin): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(req): Json<SetRoleRequest>,
) -> ApiResult<UserPublic> {
    policy::require(admin.role, Action::ManageUsers)?;
    if id == admin.user_id {
        return Err(AppError::new(ErrorCode::CannotModifySelf));
    }

    let role = Role::from_db(&req.role)
        .ok_or_else(|| AppError::invalid_request(format!("Unknown role '{}'", req.role)))?;

    let user = db::users::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

    db::users::set_role(&state.pool, &user.id, role.as_str()).await?;
    // Role changes invalidate tokens carrying the old role claim
    db::refresh_tokens::revoke_all(&state.pool, &user.id).await?;
    tracing::info!(user_id = %user.id, role = %role, "User role changed");

    let user = db::users::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    Ok(Json(UserPublic::from(&user)))
}

// ── Canteens ──

/// POST /api/admin/canteens
pub async fn create_canteen(
    State(state): State<AppState>,
    Extension(admin): Extension<CurrentUser>,
    Json(payload): Json<CanteenCreate>,
) -> ApiResult<Canteen> {
    policy::require(admin.role, Action::ManageCanteens)?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Canteen name is required"));
    }
    if db::canteens::name_exists(&state.pool, name).await? {
        return Err(AppError::new(ErrorCode::CanteenNameExists));
    }

    let id = uuid::Uuid::new_v4().to_string();
    let payload = CanteenCreate {
        name: name.to_string(),
        ..payload
    };
    db::canteens::insert(&state.pool, &id, &payload, now_millis()).await?;

    let canteen = db::canteens::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CanteenNotFound))?;
    tracing::info!(canteen_id = %id, name = %canteen.name, "Canteen created");
    Ok(Json(canteen))
}

/// PUT /api/admin/canteens/{id}
pub async fn update_canteen(
    State(state): State<AppState>,
    Extension(admin): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<CanteenUpdate>,
) -> ApiResult<Canteen> {
    policy::require(admin.role, Action::ManageCanteens)?;

    let canteen = db::canteens::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CanteenNotFound))?;

    if let Some(name) = &payload.name
        && name != &canteen.name
        && db::canteens::name_exists(&state.pool, name).await?
    {
        return Err(AppError::new(ErrorCode::CanteenNameExists));
    }

    db::canteens::update(&state.pool, &id, &payload).await?;

    let canteen = db::canteens::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CanteenNotFound))?;
    Ok(Json(canteen))
}

// ── Refunds ──

/// POST /api/orders/{id}/refund
///
/// Refunds are an explicit admin action, only for cancelled paid orders.
pub async fn refund_order(
    State(state): State<AppState>,
    Extension(admin): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<serde_json::Value> {
    policy::require(admin.role, Action::RefundOrder)?;

    let order = db::orders::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

    match PaymentStatus::from_db(&order.payment_status) {
        Some(PaymentStatus::Paid) => {}
        Some(PaymentStatus::Refunded) => {
            return Err(AppError::new(ErrorCode::PaymentAlreadyRefunded));
        }
        _ => return Err(AppError::new(ErrorCode::OrderNotPaid)),
    }
    if order.status != OrderStatus::Cancelled.as_str() {
        return Err(AppError::new(ErrorCode::RefundNotAllowed)
            .with_detail("status", order.status.clone()));
    }

    db::orders::mark_refunded(&state.pool, &order.id, now_millis()).await?;
    tracing::info!(order_id = %order.id, admin_id = %admin.user_id, "Order refunded");

    Ok(Json(serde_json::json!({
        "order_id": order.id,
        "payment_status": "refunded",
    })))
}
