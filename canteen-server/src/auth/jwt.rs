//! JWT token service
//!
//! Handles access token generation and validation. Refresh tokens are
//! opaque DB rows, see `db::refresh_tokens`.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::Role;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Signing secret (should be at least 32 bytes)
    pub secret: String,
    /// Access token expiration in minutes
    pub expiration_minutes: i64,
    /// Token issuer
    pub issuer: String,
    /// Token audience
    pub audience: String,
}

/// Claims stored in the access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Email
    pub email: String,
    /// Role name
    pub role: String,
    /// Owned canteen (partners only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canteen_id: Option<String>,
    /// Token type (always "access")
    pub token_type: String,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
}

/// Authenticated identity, inserted into request extensions by the auth
/// middleware
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: String,
    pub email: String,
    pub role: Role,
    pub canteen_id: Option<String>,
}

/// JWT token service
#[derive(Clone)]
pub struct JwtService {
    pub config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            config,
        }
    }

    /// Generate an access token
    pub fn generate_token(
        &self,
        user_id: &str,
        email: &str,
        role: Role,
        canteen_id: Option<&str>,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role: role.as_str().to_string(),
            canteen_id: canteen_id.map(str::to_string),
            token_type: "access".to_string(),
            exp: (now + Duration::minutes(self.config.expiration_minutes)).timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Token generation failed: {e}");
            AppError::new(ErrorCode::InternalError)
        })
    }

    /// Validate a token and extract the identity.
    ///
    /// Expired and otherwise-invalid tokens surface as distinct error codes
    /// so clients know when to refresh.
    pub fn validate_token(&self, token: &str) -> Result<CurrentUser, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AppError::token_expired(),
                _ => AppError::invalid_token(format!("Token validation failed: {e}")),
            }
        })?;

        let claims = data.claims;
        let role = Role::from_db(&claims.role)
            .ok_or_else(|| AppError::invalid_token(format!("Unknown role: {}", claims.role)))?;

        Ok(CurrentUser {
            user_id: claims.sub,
            email: claims.email,
            role,
            canteen_id: claims.canteen_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(expiration_minutes: i64) -> JwtService {
        JwtService::new(JwtConfig {
            secret: "test-secret-key-at-least-32-chars-long".into(),
            expiration_minutes,
            issuer: "canteen-connect".into(),
            audience: "canteen-clients".into(),
        })
    }

    #[test]
    fn test_generate_and_validate() {
        let svc = service(15);
        let token = svc
            .generate_token("u1", "a@campus.edu", Role::Student, None)
            .unwrap();

        let user = svc.validate_token(&token).unwrap();
        assert_eq!(user.user_id, "u1");
        assert_eq!(user.email, "a@campus.edu");
        assert_eq!(user.role, Role::Student);
        assert!(user.canteen_id.is_none());
    }

    #[test]
    fn test_partner_canteen_claim() {
        let svc = service(15);
        let token = svc
            .generate_token("u2", "p@campus.edu", Role::Partner, Some("c1"))
            .unwrap();
        let user = svc.validate_token(&token).unwrap();
        assert_eq!(user.role, Role::Partner);
        assert_eq!(user.canteen_id.as_deref(), Some("c1"));
    }

    #[test]
    fn test_expired_token() {
        // Token already expired at issue time
        let svc = service(-5);
        let token = svc
            .generate_token("u1", "a@campus.edu", Role::Student, None)
            .unwrap();
        let err = svc.validate_token(&token).unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenExpired);
    }

    #[test]
    fn test_tampered_token() {
        let svc = service(15);
        let token = svc
            .generate_token("u1", "a@campus.edu", Role::Student, None)
            .unwrap();
        let mut tampered = token.clone();
        tampered.pop();
        tampered.push('x');
        let err = svc.validate_token(&tampered).unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenInvalid);
    }

    #[test]
    fn test_wrong_audience_rejected() {
        let svc = service(15);
        let other = JwtService::new(JwtConfig {
            secret: "test-secret-key-at-least-32-chars-long".into(),
            expiration_minutes: 15,
            issuer: "canteen-connect".into(),
            audience: "someone-else".into(),
        });
        let token = other
            .generate_token("u1", "a@campus.edu", Role::Student, None)
            .unwrap();
        let err = svc.validate_token(&token).unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenInvalid);
    }
}
