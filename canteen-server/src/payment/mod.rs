//! Payment gateway integration via REST API (no SDK dependency)
//!
//! Gateway orders are created over HTTP with basic auth; payment and
//! webhook signatures are HMAC-SHA256 verified in constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use shared::error::{AppError, ErrorCode};
use shared::money;

use crate::config::Config;

#[derive(Clone)]
pub struct PaymentGateway {
    client: reqwest::Client,
    api_base: String,
    key_id: String,
    key_secret: String,
}

impl PaymentGateway {
    pub fn from_config(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: config.payment_api_base.clone(),
            key_id: config.payment_key_id.clone(),
            key_secret: config.payment_key_secret.clone(),
        }
    }

    /// Create a gateway order for the given rupee amount. Returns the
    /// gateway order id the client uses to drive checkout.
    pub async fn create_order(&self, amount: f64, receipt: &str) -> Result<String, AppError> {
        let body = serde_json::json!({
            "amount": money::to_minor_units(amount),
            "currency": "INR",
            "receipt": receipt,
        });

        let resp: serde_json::Value = self
            .client
            .post(format!("{}/orders", self.api_base))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Gateway order request failed: {e}");
                AppError::new(ErrorCode::PaymentGatewayError)
            })?
            .json()
            .await
            .map_err(|e| {
                tracing::error!("Gateway order response unreadable: {e}");
                AppError::new(ErrorCode::PaymentGatewayError)
            })?;

        resp["id"].as_str().map(String::from).ok_or_else(|| {
            tracing::error!("Gateway order creation failed: {resp}");
            AppError::new(ErrorCode::PaymentGatewayError)
        })
    }

    /// Verify the checkout signature the client submits after paying:
    /// HMAC-SHA256 over "{gateway_order_id}|{gateway_payment_id}".
    pub fn verify_payment_signature(
        &self,
        gateway_order_id: &str,
        gateway_payment_id: &str,
        signature: &str,
    ) -> Result<(), AppError> {
        verify_hmac_hex(
            format!("{gateway_order_id}|{gateway_payment_id}").as_bytes(),
            signature,
            &self.key_secret,
        )
        .map_err(|_| AppError::new(ErrorCode::PaymentSignatureInvalid))
    }
}

/// Verify a webhook signature header of the form `t=<unix>,v1=<hex>`:
/// HMAC-SHA256 over "{timestamp}.{payload}", then a replay window check.
pub fn verify_webhook_signature(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
) -> Result<(), &'static str> {
    let mut timestamp = "";
    let mut signature = "";
    for part in sig_header.split(',') {
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.strip_prefix("v1=") {
            signature = v;
        }
    }

    if timestamp.is_empty() || signature.is_empty() {
        return Err("Invalid signature header");
    }

    let signed_payload = format!("{timestamp}.{}", std::str::from_utf8(payload).unwrap_or(""));
    verify_hmac_hex(signed_payload.as_bytes(), signature, secret)?;

    // Reject events older than 5 minutes to prevent replay attacks
    let ts: i64 = timestamp.parse().map_err(|_| "Invalid timestamp")?;
    let now = chrono::Utc::now().timestamp();
    if (now - ts).abs() > 300 {
        return Err("Webhook timestamp too old");
    }

    Ok(())
}

/// Constant-time comparison via hmac::verify_slice
fn verify_hmac_hex(message: &[u8], signature_hex: &str, secret: &str) -> Result<(), &'static str> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| "HMAC key error")?;
    mac.update(message);

    let sig_bytes = hex::decode(signature_hex).map_err(|_| "Invalid signature hex")?;
    mac.verify_slice(&sig_bytes).map_err(|_| "Signature mismatch")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(message: &str, secret: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(message.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn gateway() -> PaymentGateway {
        PaymentGateway {
            client: reqwest::Client::new(),
            api_base: "https://gateway.test/v1".into(),
            key_id: "key_test".into(),
            key_secret: "secret_test".into(),
        }
    }

    #[test]
    fn test_payment_signature_accepted() {
        let gw = gateway();
        let sig = sign("order_abc|pay_xyz", "secret_test");
        assert!(gw.verify_payment_signature("order_abc", "pay_xyz", &sig).is_ok());
    }

    #[test]
    fn test_payment_signature_rejected() {
        let gw = gateway();
        let sig = sign("order_abc|pay_xyz", "secret_test");

        // Signature bound to a different payment
        let err = gw
            .verify_payment_signature("order_abc", "pay_other", &sig)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentSignatureInvalid);

        // Wrong key
        let bad = sign("order_abc|pay_xyz", "other_secret");
        assert!(gw.verify_payment_signature("order_abc", "pay_xyz", &bad).is_err());

        // Not hex at all
        assert!(gw.verify_payment_signature("order_abc", "pay_xyz", "zz").is_err());
    }

    #[test]
    fn test_webhook_signature_accepted() {
        let payload = br#"{"id":"evt_1","event":"payment.captured"}"#;
        let ts = chrono::Utc::now().timestamp();
        let sig = sign(
            &format!("{ts}.{}", std::str::from_utf8(payload).unwrap()),
            "whsec",
        );
        let header = format!("t={ts},v1={sig}");
        assert!(verify_webhook_signature(payload, &header, "whsec").is_ok());
    }

    #[test]
    fn test_webhook_signature_tampered_payload() {
        let payload = br#"{"id":"evt_1"}"#;
        let ts = chrono::Utc::now().timestamp();
        let sig = sign(&format!("{ts}.{}", std::str::from_utf8(payload).unwrap()), "whsec");
        let header = format!("t={ts},v1={sig}");
        assert!(verify_webhook_signature(br#"{"id":"evt_2"}"#, &header, "whsec").is_err());
    }

    #[test]
    fn test_webhook_replay_rejected() {
        let payload = br#"{"id":"evt_1"}"#;
        let ts = chrono::Utc::now().timestamp() - 600;
        let sig = sign(&format!("{ts}.{}", std::str::from_utf8(payload).unwrap()), "whsec");
        let header = format!("t={ts},v1={sig}");
        assert_eq!(
            verify_webhook_signature(payload, &header, "whsec"),
            Err("Webhook timestamp too old")
        );
    }

    #[test]
    fn test_webhook_malformed_header() {
        assert!(verify_webhook_signature(b"{}", "v1=abcd", "whsec").is_err());
        assert!(verify_webhook_signature(b"{}", "t=123", "whsec").is_err());
        assert!(verify_webhook_signature(b"{}", "", "whsec").is_err());
    }
}
