//! Canteen catalog and partner menu management

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{Canteen, MenuItem, MenuItemCreate, MenuItemUpdate};
use shared::money;
use shared::util::now_millis;

use crate::auth::{Action, CurrentUser, policy};
use crate::db;
use crate::state::AppState;

use super::ApiResult;

// ── Public catalog ──

/// GET /api/canteens
pub async fn list_canteens(State(state): State<AppState>) -> ApiResult<Vec<Canteen>> {
    Ok(Json(db::canteens::list(&state.pool).await?))
}

/// GET /api/canteens/{id}
pub async fn get_canteen(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Canteen> {
    let canteen = db::canteens::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CanteenNotFound))?;
    Ok(Json(canteen))
}

#[derive(Debug, Deserialize)]
pub struct MenuQuery {
    pub category: Option<String>,
}

/// GET /api/canteens/{id}/menu?category=...
pub async fn canteen_menu(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<MenuQuery>,
) -> ApiResult<Vec<MenuItem>> {
    if db::canteens::find_by_id(&state.pool, &id).await?.is_none() {
        return Err(AppError::new(ErrorCode::CanteenNotFound));
    }
    let items = db::menu_items::list_by_canteen(&state.pool, &id, query.category.as_deref()).await?;
    Ok(Json(items))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

/// GET /api/menu/search?q=...
pub async fn search_menu(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Vec<MenuItem>> {
    let term = query.q.trim();
    if term.is_empty() {
        return Err(AppError::invalid_request("Search term is required"));
    }
    Ok(Json(db::menu_items::search(&state.pool, term).await?))
}

// ── Partner menu management ──

/// The canteen this partner may manage. Admins have no canteen of their
/// own, so menu writes go through the partner routes only.
fn owned_canteen(user: &CurrentUser) -> Result<&str, AppError> {
    policy::require(user.role, Action::ManageMenu)?;
    user.canteen_id
        .as_deref()
        .ok_or_else(|| AppError::new(ErrorCode::NotCanteenOwner))
}

/// POST /api/my-canteen/menu
pub async fn create_menu_item(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<MenuItemCreate>,
) -> ApiResult<MenuItem> {
    let canteen_id = owned_canteen(&user)?;
    if payload.name.trim().is_empty() {
        return Err(AppError::validation("Item name is required"));
    }
    money::validate_price(payload.price)?;

    let id = uuid::Uuid::new_v4().to_string();
    db::menu_items::insert(&state.pool, &id, canteen_id, &payload, now_millis()).await?;

    let item = db::menu_items::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::MenuItemNotFound))?;
    tracing::info!(canteen_id = %canteen_id, item_id = %id, "Menu item created");
    Ok(Json(item))
}

/// PUT /api/my-canteen/menu/{id}
pub async fn update_menu_item(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<MenuItemUpdate>,
) -> ApiResult<MenuItem> {
    let canteen_id = owned_canteen(&user)?;

    let item = db::menu_items::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::MenuItemNotFound))?;
    if item.canteen_id != canteen_id {
        return Err(AppError::new(ErrorCode::NotCanteenOwner));
    }
    if let Some(price) = payload.price {
        money::validate_price(price)?;
    }
    if let Some(name) = &payload.name
        && name.trim().is_empty()
    {
        return Err(AppError::validation("Item name cannot be empty"));
    }

    db::menu_items::update(&state.pool, &id, &payload).await?;

    let item = db::menu_items::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::MenuItemNotFound))?;
    Ok(Json(item))
}
