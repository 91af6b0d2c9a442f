//! canteen-server — campus food ordering backend
//!
//! Long-running service that:
//! - Manages users, canteens, menus and the order lifecycle
//! - Issues JWT access tokens and rotating refresh tokens
//! - Confirms payments via a gateway (signature + webhook) or dev-confirm
//! - Pushes order status events to connected clients

mod api;
mod auth;
mod config;
mod db;
mod notify;
mod otp;
mod payment;
mod state;

use config::Config;
use state::AppState;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "canteen_server=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!(
        "Starting canteen-server (env: {}, gateway: {})",
        config.environment,
        if config.gateway_enabled() { "enabled" } else { "dev mode" }
    );

    let state = AppState::new(config.clone()).await?;

    let app = api::create_router(state.clone());

    // Periodic cleanup: rate limiter windows and expired verification codes
    let rate_limiter = state.rate_limiter.clone();
    let pool = state.pool.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            rate_limiter.cleanup().await;
            match db::otp_codes::purge_expired(&pool, shared::util::now_millis()).await {
                Ok(0) => {}
                Ok(n) => tracing::debug!("Purged {n} expired verification codes"),
                Err(e) => tracing::warn!("Verification code purge failed: {e}"),
            }
        }
    });

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("canteen-server listening on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
