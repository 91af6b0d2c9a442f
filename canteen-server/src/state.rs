//! Shared application state

use shared::error::AppError;
use shared::models::Role;
use shared::util::{hash_password, now_millis};
use sqlx::SqlitePool;

use crate::auth::{JwtConfig, JwtService, RateLimiter};
use crate::config::Config;
use crate::db;
use crate::notify::Notifier;
use crate::otp::{CodeDelivery, OtpService};
use crate::payment::PaymentGateway;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub jwt: JwtService,
    pub rate_limiter: RateLimiter,
    pub notifier: Notifier,
    pub otp: OtpService,
    pub gateway: PaymentGateway,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self, AppError> {
        let pool = db::connect(&config.database_path).await?;

        let jwt = JwtService::new(JwtConfig {
            secret: config.jwt_secret.clone(),
            expiration_minutes: config.jwt_expiration_minutes,
            issuer: config.jwt_issuer.clone(),
            audience: config.jwt_audience.clone(),
        });

        let otp = OtpService::new(pool.clone(), CodeDelivery::from_config(&config));
        let gateway = PaymentGateway::from_config(&config);

        let state = Self {
            pool,
            jwt,
            rate_limiter: RateLimiter::new(),
            notifier: Notifier::new(),
            otp,
            gateway,
            config,
        };

        state.seed_admin().await?;

        Ok(state)
    }

    /// Seed the bootstrap admin account on first startup
    async fn seed_admin(&self) -> Result<(), AppError> {
        if self.config.admin_email.is_empty() || self.config.admin_password.is_empty() {
            return Ok(());
        }
        if db::users::admin_exists(&self.pool).await? {
            return Ok(());
        }

        let hashed = hash_password(&self.config.admin_password)
            .map_err(|e| AppError::internal(format!("Admin password hashing failed: {e}")))?;
        let id = uuid::Uuid::new_v4().to_string();

        db::users::insert(
            &self.pool,
            &db::users::NewUser {
                id: &id,
                name: "Administrator",
                email: &self.config.admin_email,
                phone: None,
                hashed_password: &hashed,
                role: Role::Admin.as_str(),
                is_approved: true,
                created_at: now_millis(),
            },
        )
        .await?;
        db::users::mark_email_verified(&self.pool, &self.config.admin_email).await?;

        tracing::info!(email = %self.config.admin_email, "Bootstrap admin account created");
        Ok(())
    }
}
