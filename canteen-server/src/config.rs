//! Server configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Server configuration, loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file path
    pub database_path: String,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// JWT signing secret
    pub jwt_secret: String,
    /// Access token lifetime in minutes
    pub jwt_expiration_minutes: i64,
    /// JWT issuer claim
    pub jwt_issuer: String,
    /// JWT audience claim
    pub jwt_audience: String,
    /// Payment gateway REST base URL
    pub payment_api_base: String,
    /// Payment gateway key id (basic auth user). Empty disables the gateway.
    pub payment_key_id: String,
    /// Payment gateway key secret (basic auth password + signature key)
    pub payment_key_secret: String,
    /// Payment gateway webhook signing secret
    pub payment_webhook_secret: String,
    /// Code delivery provider endpoint; empty means console delivery
    pub delivery_api_url: String,
    /// Code delivery provider API key
    pub delivery_api_key: String,
    /// Sender address shown on delivered codes
    pub delivery_from: String,
    /// Bootstrap admin email (seeded at startup if no admin exists)
    pub admin_email: String,
    /// Bootstrap admin password
    pub admin_password: String,
    /// Fixed delay applied to login responses, in milliseconds
    pub auth_fixed_delay_ms: u64,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Ok(Self {
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "canteen-connect.db".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            jwt_expiration_minutes: std::env::var("JWT_EXPIRATION_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(15),
            jwt_issuer: std::env::var("JWT_ISSUER")
                .unwrap_or_else(|_| "canteen-connect".into()),
            jwt_audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "canteen-clients".into()),
            payment_api_base: std::env::var("PAYMENT_API_BASE")
                .unwrap_or_else(|_| "https://api.razorpay.com/v1".into()),
            payment_key_id: std::env::var("PAYMENT_KEY_ID").unwrap_or_default(),
            payment_key_secret: if std::env::var("PAYMENT_KEY_ID").is_ok_and(|v| !v.is_empty()) {
                Self::require_secret("PAYMENT_KEY_SECRET", &environment)?
            } else {
                String::new()
            },
            payment_webhook_secret: std::env::var("PAYMENT_WEBHOOK_SECRET").unwrap_or_default(),
            delivery_api_url: std::env::var("DELIVERY_API_URL").unwrap_or_default(),
            delivery_api_key: std::env::var("DELIVERY_API_KEY").unwrap_or_default(),
            delivery_from: std::env::var("DELIVERY_FROM")
                .unwrap_or_else(|_| "noreply@canteenconnect.app".into()),
            admin_email: std::env::var("ADMIN_EMAIL").unwrap_or_default(),
            admin_password: std::env::var("ADMIN_PASSWORD").unwrap_or_default(),
            auth_fixed_delay_ms: std::env::var("AUTH_FIXED_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(500),
            environment,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Whether a payment gateway is configured. Without one, orders are
    /// placed directly and the dev-confirm route stands in for payment.
    pub fn gateway_enabled(&self) -> bool {
        !self.payment_key_id.is_empty() && !self.payment_key_secret.is_empty()
    }
}
