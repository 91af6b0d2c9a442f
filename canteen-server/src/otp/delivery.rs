//! Verification code delivery channel
//!
//! Development uses console delivery, which logs the code instead of
//! sending it. Production posts to the configured provider endpoint.

use shared::error::{AppError, ErrorCode};
use shared::models::OtpPurpose;

use crate::config::Config;

#[derive(Clone)]
pub enum CodeDelivery {
    /// Log the code, no external call
    Console,
    /// POST the code to an HTTP delivery provider
    Http {
        client: reqwest::Client,
        url: String,
        api_key: String,
        from: String,
    },
}

impl CodeDelivery {
    pub fn from_config(config: &Config) -> Self {
        if config.delivery_api_url.is_empty() {
            CodeDelivery::Console
        } else {
            CodeDelivery::Http {
                client: reqwest::Client::new(),
                url: config.delivery_api_url.clone(),
                api_key: config.delivery_api_key.clone(),
                from: config.delivery_from.clone(),
            }
        }
    }

    pub async fn deliver(
        &self,
        contact: &str,
        code: &str,
        purpose: OtpPurpose,
    ) -> Result<(), AppError> {
        match self {
            CodeDelivery::Console => {
                tracing::info!(
                    contact = %contact,
                    purpose = %purpose.as_str(),
                    "Verification code (console delivery): {code}"
                );
                Ok(())
            }
            CodeDelivery::Http {
                client,
                url,
                api_key,
                from,
            } => {
                let body = serde_json::json!({
                    "to": contact,
                    "from": from,
                    "subject": subject_for(purpose),
                    "body": format!("Your verification code is {code}. It expires in 5 minutes."),
                });

                let response = client
                    .post(url)
                    .bearer_auth(api_key)
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| {
                        tracing::error!("Code delivery request failed: {e}");
                        AppError::new(ErrorCode::DeliveryFailed)
                    })?;

                if !response.status().is_success() {
                    let status = response.status();
                    let text = response.text().await.unwrap_or_default();
                    tracing::error!("Code delivery provider returned {status}: {text}");
                    return Err(AppError::new(ErrorCode::DeliveryFailed));
                }

                Ok(())
            }
        }
    }
}

fn subject_for(purpose: OtpPurpose) -> &'static str {
    match purpose {
        OtpPurpose::Registration => "Verify your Canteen Connect account",
        OtpPurpose::Login => "Your Canteen Connect login code",
        OtpPurpose::PasswordReset => "Reset your Canteen Connect password",
    }
}
