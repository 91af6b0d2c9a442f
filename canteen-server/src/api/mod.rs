//! HTTP API routes

pub mod admin;
pub mod auth;
pub mod canteens;
pub mod health;
pub mod orders;
pub mod otp;

use axum::http::HeaderName;
use axum::routing::{get, post, put};
use axum::{Json, Router, middleware};
use shared::error::{AppError, ErrorCode};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use validator::Validate;

use crate::auth::middleware::require_auth;
use crate::auth::rate_limit::{login_rate_limit, otp_rate_limit, register_rate_limit};
use crate::state::AppState;

/// Handler result: JSON body on success, AppError rendered by IntoResponse
pub type ApiResult<T> = Result<Json<T>, AppError>;

/// Run declarative request validation, collecting per-field failures into
/// the error details map.
pub fn validate<T: Validate>(req: &T) -> Result<(), AppError> {
    req.validate().map_err(|errors| {
        let mut err = AppError::new(ErrorCode::ValidationFailed);
        for (field, field_errors) in errors.field_errors() {
            let messages: Vec<String> = field_errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            err = err.with_detail(field.to_string(), serde_json::json!(messages));
        }
        err
    })
}

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Public catalog + health (no auth)
    let public = Router::new()
        .route("/health", get(health::health_check))
        .route("/api/canteens", get(canteens::list_canteens))
        .route("/api/canteens/{id}", get(canteens::get_canteen))
        .route("/api/canteens/{id}/menu", get(canteens::canteen_menu))
        .route("/api/menu/search", get(canteens::search_menu));

    // Credential routes, each under its own rate limit
    let register = Router::new()
        .route("/api/auth/register", post(auth::register))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            register_rate_limit,
        ));
    let login = Router::new()
        .route("/api/auth/login", post(auth::login))
        .layer(middleware::from_fn_with_state(state.clone(), login_rate_limit));
    let auth_public = Router::new()
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/forgot-password", post(auth::forgot_password))
        .route("/api/auth/reset-password", post(auth::reset_password));

    // Verification codes; sends are rate limited per IP on top of the
    // per-contact cooldown
    let otp_send = Router::new()
        .route("/api/otp/send", post(otp::send_code))
        .route("/api/otp/resend", post(otp::send_code))
        .layer(middleware::from_fn_with_state(state.clone(), otp_rate_limit));
    let otp_rest = Router::new().route("/api/otp/verify", post(otp::verify_code));

    // Everything behind bearer auth
    let protected = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/profile", put(auth::update_profile))
        .route("/api/auth/change-password", post(auth::change_password))
        .route("/api/otp/status", get(otp::code_status))
        .route(
            "/api/orders",
            post(orders::create_order).get(orders::list_orders),
        )
        .route("/api/orders/verify-payment", post(orders::verify_payment))
        .route("/api/orders/events", get(orders::order_events))
        .route("/api/orders/{id}", get(orders::get_order))
        .route("/api/orders/{id}/status", put(orders::transition_order))
        .route("/api/orders/{id}/cancel", post(orders::cancel_order))
        .route("/api/orders/{id}/refund", post(admin::refund_order))
        .route("/api/my-canteen/menu", post(canteens::create_menu_item))
        .route("/api/my-canteen/menu/{id}", put(canteens::update_menu_item))
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/users/{id}/active", put(admin::set_user_active))
        .route("/api/admin/users/{id}/approve", post(admin::approve_partner))
        .route("/api/admin/users/{id}/role", put(admin::set_user_role))
        .route("/api/admin/canteens", post(admin::create_canteen))
        .route("/api/admin/canteens/{id}", put(admin::update_canteen))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // Payment webhook (signature-verified, raw body)
    let webhook = Router::new().route("/api/payments/webhook", post(orders::payment_webhook));

    let mut router = Router::new()
        .merge(public)
        .merge(register)
        .merge(login)
        .merge(auth_public)
        .merge(otp_send)
        .merge(otp_rest)
        .merge(protected)
        .merge(webhook);

    // Stand-in for gateway payment confirmation, never registered in production
    if !state.config.is_production() {
        let dev = Router::new()
            .route("/api/orders/{id}/dev-confirm", post(orders::dev_confirm))
            .layer(middleware::from_fn_with_state(state.clone(), require_auth));
        router = router.merge(dev);
    }

    let request_id = HeaderName::from_static("x-request-id");
    router
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
