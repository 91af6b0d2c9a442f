//! Order endpoints: creation, payment confirmation, lifecycle
//! transitions, scoped reads and the status event stream

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{Extension, Json};
use futures::Stream;
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::{Order, OrderDetail, OrderStatus, Role};
use shared::money;
use shared::util::{generate_code, now_millis};
use tokio::sync::broadcast;
use validator::Validate;

use crate::auth::{Action, CurrentUser, policy};
use crate::db;
use crate::notify::OrderEvent;
use crate::payment;
use crate::state::AppState;

use super::{ApiResult, validate};

fn new_order_number() -> String {
    format!(
        "CC-{}-{}",
        chrono::Utc::now().format("%Y%m%d"),
        generate_code()
    )
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Parse the stored status column; an unknown value means a corrupt row
fn status_of(order: &Order) -> Result<OrderStatus, AppError> {
    OrderStatus::from_db(&order.status)
        .ok_or_else(|| AppError::internal(format!("Unknown order status '{}'", order.status)))
}

fn can_view(user: &CurrentUser, order: &Order) -> bool {
    match user.role {
        Role::Admin => true,
        Role::Partner => user.canteen_id.as_deref() == Some(order.canteen_id.as_str()),
        Role::Student => order.user_id == user.user_id,
    }
}

fn publish_status(state: &AppState, order: &Order) {
    state.notifier.publish(OrderEvent {
        order_id: order.id.clone(),
        order_number: order.order_number.clone(),
        user_id: order.user_id.clone(),
        canteen_id: order.canteen_id.clone(),
        status: order.status.clone(),
    });
}

async fn load_detail(state: &AppState, order: Order) -> Result<OrderDetail, AppError> {
    let items = db::orders::items(&state.pool, &order.id).await?;
    Ok(OrderDetail { order, items })
}

// ── Creation and payment ──

// Serialize: the length validator on `items` echoes the value into the
// error params
#[derive(Debug, Deserialize, Serialize)]
pub struct OrderLineRequest {
    pub menu_item_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub canteen_id: String,
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    pub items: Vec<OrderLineRequest>,
    #[validate(length(max = 500, message = "Instructions too long"))]
    pub special_instructions: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    #[serde(flatten)]
    pub detail: OrderDetail,
    /// Present when a gateway is configured; drives client-side checkout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_order_id: Option<String>,
    pub amount_minor: i64,
    pub currency: &'static str,
}

/// POST /api/orders
///
/// Prices are read from the menu rows, never from the client. With a
/// gateway configured the order starts `pending` and waits for payment;
/// without one it is placed directly and the dev-confirm route stands in
/// for the payment step.
pub async fn create_order(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateOrderRequest>,
) -> ApiResult<CreateOrderResponse> {
    policy::require(user.role, Action::CreateOrder)?;
    validate(&req)?;

    let canteen = db::canteens::find_by_id(&state.pool, &req.canteen_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CanteenNotFound))?;
    if !canteen.is_open {
        return Err(AppError::new(ErrorCode::CanteenClosed));
    }

    let ids: Vec<String> = req.items.iter().map(|l| l.menu_item_id.clone()).collect();
    let menu_rows = db::menu_items::find_many(&state.pool, &ids).await?;

    let mut lines = Vec::with_capacity(req.items.len());
    let mut line_totals = Vec::with_capacity(req.items.len());
    for line in &req.items {
        let item = menu_rows
            .iter()
            .find(|m| m.id == line.menu_item_id)
            .ok_or_else(|| {
                AppError::new(ErrorCode::MenuItemNotFound)
                    .with_detail("menu_item_id", line.menu_item_id.clone())
            })?;
        if item.canteen_id != req.canteen_id {
            return Err(AppError::new(ErrorCode::MenuItemWrongCanteen)
                .with_detail("menu_item_id", item.id.clone()));
        }
        if !item.is_available {
            return Err(AppError::new(ErrorCode::MenuItemUnavailable)
                .with_detail("menu_item_id", item.id.clone()));
        }
        money::validate_quantity(line.quantity)?;
        money::validate_price(item.price)?;

        let line_total = money::line_total(item.price, line.quantity);
        line_totals.push(line_total);
        lines.push(db::orders::NewOrderItem {
            menu_item_id: &item.id,
            name: &item.name,
            unit_price: item.price,
            quantity: line.quantity,
            line_total,
        });
    }

    let totals = money::order_totals(&line_totals);
    let order_id = uuid::Uuid::new_v4().to_string();
    let now = now_millis();

    // The order number is date + 6 random digits; a collision retry
    // regenerates both the number and, when in play, the gateway receipt
    let mut attempts = 0;
    loop {
        let order_number = new_order_number();

        let (status, gateway_order_id) = if state.config.gateway_enabled() {
            let gw = state
                .gateway
                .create_order(totals.total_amount, &order_number)
                .await?;
            (OrderStatus::Pending, Some(gw))
        } else {
            (OrderStatus::Placed, None)
        };

        let insert = db::orders::insert(
            &state.pool,
            &db::orders::NewOrder {
                id: &order_id,
                order_number: &order_number,
                user_id: &user.user_id,
                canteen_id: &req.canteen_id,
                item_total: totals.item_total,
                tax: totals.tax,
                delivery_fee: totals.delivery_fee,
                total_amount: totals.total_amount,
                status: status.as_str(),
                gateway_order_id: gateway_order_id.as_deref(),
                special_instructions: req.special_instructions.as_deref(),
                created_at: now,
            },
            &lines,
        )
        .await;

        match insert {
            Ok(()) => break,
            Err(e) if is_unique_violation(&e) && attempts < 2 => {
                attempts += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }

    let order = db::orders::find_by_id(&state.pool, &order_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    tracing::info!(
        order_id = %order.id,
        order_number = %order.order_number,
        total = order.total_amount,
        status = %order.status,
        "Order created"
    );

    if order.status == OrderStatus::Placed.as_str() {
        publish_status(&state, &order);
    }

    let gateway_order_id = order.gateway_order_id.clone();
    let amount_minor = money::to_minor_units(order.total_amount);
    let detail = load_detail(&state, order).await?;

    Ok(Json(CreateOrderResponse {
        detail,
        gateway_order_id,
        amount_minor,
        currency: "INR",
    }))
}

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub signature: String,
}

/// POST /api/orders/verify-payment
///
/// Replaying a verification for an already-paid order is a no-op success.
pub async fn verify_payment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<VerifyPaymentRequest>,
) -> ApiResult<serde_json::Value> {
    let order = db::orders::find_by_gateway_order_id(&state.pool, &req.gateway_order_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    if !can_view(&user, &order) {
        return Err(AppError::new(ErrorCode::PermissionDenied));
    }

    state.gateway.verify_payment_signature(
        &req.gateway_order_id,
        &req.gateway_payment_id,
        &req.signature,
    )?;

    let advanced = db::orders::mark_paid(&state.pool, &order.id, now_millis()).await?;
    let order = db::orders::find_by_id(&state.pool, &order.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    if advanced {
        tracing::info!(order_id = %order.id, payment_id = %req.gateway_payment_id, "Payment verified");
        publish_status(&state, &order);
    }

    Ok(Json(serde_json::json!({
        "order_id": order.id,
        "status": order.status,
        "payment_status": order.payment_status,
    })))
}

/// POST /api/orders/{id}/dev-confirm
///
/// Marks an order paid without a gateway. The route is only registered
/// outside production.
pub async fn dev_confirm(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<serde_json::Value> {
    let order = db::orders::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    if !can_view(&user, &order) {
        return Err(AppError::new(ErrorCode::PermissionDenied));
    }

    let advanced = db::orders::mark_paid(&state.pool, &id, now_millis()).await?;
    let order = db::orders::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    if advanced {
        tracing::info!(order_id = %order.id, "Order marked paid (dev confirm)");
        publish_status(&state, &order);
    }

    Ok(Json(serde_json::json!({
        "order_id": order.id,
        "status": order.status,
        "payment_status": order.payment_status,
    })))
}

/// POST /api/payments/webhook
///
/// Raw body for HMAC verification. Events look like
/// `{"id": "...", "event": "payment.captured", "payload": {"order_id": "...", "payment_id": "..."}}`.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let secret = &state.config.payment_webhook_secret;
    if secret.is_empty() {
        tracing::warn!("Webhook received but no webhook secret is configured");
        return StatusCode::BAD_REQUEST;
    }

    let sig_header = match headers.get("x-webhook-signature").and_then(|v| v.to_str().ok()) {
        Some(s) => s,
        None => {
            tracing::warn!("Missing webhook signature header");
            return StatusCode::BAD_REQUEST;
        }
    };

    if let Err(e) = payment::verify_webhook_signature(&body, sig_header, secret) {
        tracing::warn!(error = e, "Webhook signature verification failed");
        return StatusCode::BAD_REQUEST;
    }

    let event: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(%e, "Failed to parse webhook JSON");
            return StatusCode::BAD_REQUEST;
        }
    };

    let event_type = event["event"].as_str().unwrap_or("");
    let event_id = match event["id"].as_str() {
        Some(id) => id,
        None => {
            tracing::warn!("Webhook event missing id");
            return StatusCode::BAD_REQUEST;
        }
    };

    // Idempotency: INSERT first, check rows_affected
    match db::webhook_events::record(&state.pool, event_id, event_type, now_millis()).await {
        Ok(false) => {
            tracing::info!(event_id = event_id, "Duplicate webhook event, skipping");
            return StatusCode::OK;
        }
        Err(e) => {
            tracing::error!(%e, "DB error recording webhook event");
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
        Ok(true) => {}
    }

    match event_type {
        "payment.captured" => handle_payment_captured(&state, &event).await,
        _ => {
            tracing::debug!(event_type = event_type, "Unhandled webhook event type");
            StatusCode::OK
        }
    }
}

async fn handle_payment_captured(state: &AppState, event: &serde_json::Value) -> StatusCode {
    let gateway_order_id = match event["payload"]["order_id"].as_str() {
        Some(s) => s,
        None => {
            tracing::warn!("payment.captured missing payload.order_id");
            return StatusCode::OK;
        }
    };

    let order = match db::orders::find_by_gateway_order_id(&state.pool, gateway_order_id).await {
        Ok(Some(o)) => o,
        Ok(None) => {
            tracing::warn!(gateway_order_id = gateway_order_id, "No order for gateway reference");
            return StatusCode::OK;
        }
        Err(e) => {
            tracing::error!(%e, "DB error finding order for webhook");
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
    };

    match db::orders::mark_paid(&state.pool, &order.id, now_millis()).await {
        Ok(true) => {
            if let Ok(Some(order)) = db::orders::find_by_id(&state.pool, &order.id).await {
                tracing::info!(order_id = %order.id, "Order paid via webhook");
                publish_status(state, &order);
            }
            StatusCode::OK
        }
        Ok(false) => StatusCode::OK, // already paid
        Err(e) => {
            tracing::error!(%e, "Failed to mark order paid");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

// ── Lifecycle ──

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub status: OrderStatus,
}

/// PUT /api/orders/{id}/status
///
/// Partners move their canteen's orders exactly one step forward; admins
/// may set any status, which is logged as an override.
pub async fn transition_order(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(req): Json<TransitionRequest>,
) -> ApiResult<Order> {
    let order = db::orders::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    let current = status_of(&order)?;
    let target = req.status;

    if user.role == Role::Admin {
        if current != target {
            tracing::warn!(
                order_id = %order.id,
                from = %current,
                to = %target,
                admin_id = %user.user_id,
                "Admin status override"
            );
        }
    } else {
        policy::require(user.role, Action::TransitionOrder)?;
        if user.canteen_id.as_deref() != Some(order.canteen_id.as_str()) {
            return Err(AppError::new(ErrorCode::NotCanteenOwner));
        }
        match current {
            OrderStatus::Completed => return Err(AppError::new(ErrorCode::OrderAlreadyCompleted)),
            OrderStatus::Cancelled => return Err(AppError::new(ErrorCode::OrderAlreadyCancelled)),
            // pending -> placed belongs to the payment step
            OrderStatus::Pending => {
                return Err(AppError::with_message(
                    ErrorCode::InvalidStatusTransition,
                    "Order is awaiting payment",
                ));
            }
            _ => {}
        }
        if !current.is_forward_step(target) {
            return Err(AppError::new(ErrorCode::InvalidStatusTransition)
                .with_detail("from", current.as_str())
                .with_detail("to", target.as_str()));
        }
    }

    db::orders::update_status(&state.pool, &id, target.as_str(), now_millis()).await?;
    let order = db::orders::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    publish_status(&state, &order);

    Ok(Json(order))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CancelRequest {
    #[validate(length(max = 500, message = "Reason too long"))]
    pub reason: Option<String>,
}

/// POST /api/orders/{id}/cancel
pub async fn cancel_order(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(req): Json<CancelRequest>,
) -> ApiResult<Order> {
    validate(&req)?;

    let order = db::orders::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    let current = status_of(&order)?;

    match current {
        OrderStatus::Completed => return Err(AppError::new(ErrorCode::OrderAlreadyCompleted)),
        OrderStatus::Cancelled => return Err(AppError::new(ErrorCode::OrderAlreadyCancelled)),
        _ => {}
    }

    match user.role {
        Role::Admin => {} // any non-terminal order
        Role::Student => {
            policy::require(user.role, Action::CancelOwnOrder)?;
            if order.user_id != user.user_id {
                return Err(AppError::new(ErrorCode::PermissionDenied));
            }
            if !current.in_cancel_window() {
                return Err(AppError::new(ErrorCode::CancelWindowClosed)
                    .with_detail("status", current.as_str()));
            }
        }
        Role::Partner => {
            policy::require(user.role, Action::CancelCanteenOrder)?;
            if user.canteen_id.as_deref() != Some(order.canteen_id.as_str()) {
                return Err(AppError::new(ErrorCode::NotCanteenOwner));
            }
            if !current.in_cancel_window() {
                return Err(AppError::new(ErrorCode::CancelWindowClosed)
                    .with_detail("status", current.as_str()));
            }
        }
    }

    db::orders::cancel(&state.pool, &id, req.reason.as_deref(), now_millis()).await?;
    let order = db::orders::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    tracing::info!(order_id = %order.id, by = %user.user_id, "Order cancelled");
    publish_status(&state, &order);

    Ok(Json(order))
}

// ── Reads ──

/// GET /api/orders
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Vec<Order>> {
    let orders = match user.role {
        Role::Admin => db::orders::list_all(&state.pool).await?,
        Role::Partner => {
            policy::require(user.role, Action::ViewCanteenOrders)?;
            let canteen_id = user
                .canteen_id
                .as_deref()
                .ok_or_else(|| AppError::new(ErrorCode::NotCanteenOwner))?;
            db::orders::list_by_canteen(&state.pool, canteen_id).await?
        }
        Role::Student => {
            policy::require(user.role, Action::ViewOwnOrders)?;
            db::orders::list_by_user(&state.pool, &user.user_id).await?
        }
    };
    Ok(Json(orders))
}

/// GET /api/orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<OrderDetail> {
    let order = db::orders::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    if !can_view(&user, &order) {
        return Err(AppError::new(ErrorCode::PermissionDenied));
    }
    Ok(Json(load_detail(&state, order).await?))
}

// ── Status event stream ──

/// GET /api/orders/events
///
/// Server-sent events, filtered to what the caller may see. Delivery is
/// best-effort; clients refresh on reconnect.
pub async fn order_events(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Sse<impl Stream<Item = Result<Event, std::convert::Infallible>>> {
    let rx = state.notifier.subscribe();

    let stream = futures::stream::unfold((rx, user), |(mut rx, user)| async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let visible = match user.role {
                        Role::Admin => true,
                        Role::Partner => {
                            user.canteen_id.as_deref() == Some(event.canteen_id.as_str())
                        }
                        Role::Student => event.user_id == user.user_id,
                    };
                    if !visible {
                        continue;
                    }
                    match Event::default().event("order_status").json_data(&event) {
                        Ok(sse) => return Some((Ok(sse), (rx, user))),
                        Err(e) => {
                            tracing::error!("Failed to encode order event: {e}");
                            continue;
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped = skipped, "Event subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
