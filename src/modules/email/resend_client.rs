use async_trait::async_trait;
use serde::Serialize;

use super::{EmailMessage, EmailSender};
use crate::core::config::EmailConfig;
use crate::core::error::{AppError, Result};

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

/// Resend REST client (`POST /emails`)
pub struct ResendClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    from: String,
}

impl ResendClient {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl EmailSender for ResendClient {
    async fn send(&self, message: EmailMessage) -> Result<()> {
        let payload = SendEmailRequest {
            from: &self.from,
            to: [&message.to],
            subject: &message.subject,
            html: &message.html,
        };

        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Resend request failed: {:?}", e);
                AppError::ExternalServiceError(format!("Email service unreachable: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Resend returned {}: {}", status, body);
            return Err(AppError::ExternalServiceError(
                "Failed to send email".to_string(),
            ));
        }

        tracing::info!("Email '{}' sent", message.subject);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let payload = SendEmailRequest {
            from: "SecuredTrans <noreply@example.com>",
            to: ["user@example.com"],
            subject: "Hi",
            html: "<p>x</p>",
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["to"][0], "user@example.com");
        assert_eq!(json["from"], "SecuredTrans <noreply@example.com>");
    }
}
