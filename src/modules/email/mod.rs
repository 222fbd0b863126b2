//! Transactional email.
//!
//! [`Mailer`] renders the bodies and builds the frontend links; the transport
//! sits behind [`EmailSender`].

mod resend_client;

pub use resend_client::ResendClient;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::shared::templates::{render_invite_email, render_otp_email, OtpPurpose};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<()>;
}

pub struct Mailer {
    sender: Arc<dyn EmailSender>,
    frontend_url: String,
    otp_ttl_minutes: i64,
}

impl Mailer {
    pub fn new(sender: Arc<dyn EmailSender>, frontend_url: &str, otp_ttl: Duration) -> Self {
        Self {
            sender,
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
            otp_ttl_minutes: (otp_ttl.as_secs() / 60).max(1) as i64,
        }
    }

    pub fn file_link(&self, file_id: Uuid) -> String {
        format!("{}/user/file/{}", self.frontend_url, file_id)
    }

    pub fn share_link(&self, file_id: Uuid, token: &str) -> String {
        format!(
            "{}/user/file/{}?token={}&shared=true",
            self.frontend_url,
            file_id,
            urlencoding::encode(token)
        )
    }

    pub fn recycle_bin_link(&self) -> String {
        format!("{}/user/recycle-bin", self.frontend_url)
    }

    /// Email a one-time code to the file owner
    pub async fn send_otp(
        &self,
        to: &str,
        purpose: OtpPurpose,
        file_name: &str,
        link: &str,
        otp: &str,
    ) -> Result<()> {
        let html = render_otp_email(purpose, file_name, otp, link, self.otp_ttl_minutes)
            .map_err(|e| AppError::Internal(format!("Failed to render OTP email: {}", e)))?;

        self.sender
            .send(EmailMessage {
                to: to.to_string(),
                subject: purpose.subject().to_string(),
                html,
            })
            .await
    }

    pub async fn send_invite(
        &self,
        to: &str,
        sender_name: &str,
        file_name: &str,
        link: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let expires = expires_at.format("%Y-%m-%d %H:%M UTC").to_string();
        let html = render_invite_email(sender_name, file_name, link, &expires)
            .map_err(|e| AppError::Internal(format!("Failed to render invite email: {}", e)))?;

        self.sender
            .send(EmailMessage {
                to: to.to_string(),
                subject: format!("{} shared a file with you", sender_name),
                html,
            })
            .await
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Records outgoing messages; optionally fails every send
    #[derive(Default)]
    pub struct RecordingSender {
        pub sent: Mutex<Vec<EmailMessage>>,
        pub fail: bool,
    }

    #[async_trait]
    impl EmailSender for RecordingSender {
        async fn send(&self, message: EmailMessage) -> Result<()> {
            if self.fail {
                return Err(AppError::ExternalServiceError("smtp down".to_string()));
            }
            self.sent.lock().unwrap().push(message);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::RecordingSender;
    use super::*;

    fn mailer(sender: Arc<RecordingSender>) -> Mailer {
        Mailer::new(sender, "https://app.example.com/", Duration::from_secs(600))
    }

    #[test]
    fn test_links() {
        let mailer = mailer(Arc::new(RecordingSender::default()));
        let id = Uuid::nil();

        assert_eq!(
            mailer.file_link(id),
            "https://app.example.com/user/file/00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(
            mailer.share_link(id, "a.b+c"),
            "https://app.example.com/user/file/00000000-0000-0000-0000-000000000000?token=a.b%2Bc&shared=true"
        );
        assert_eq!(mailer.recycle_bin_link(), "https://app.example.com/user/recycle-bin");
    }

    #[tokio::test]
    async fn test_send_otp_renders_code() {
        let sender = Arc::new(RecordingSender::default());
        let mailer = mailer(sender.clone());

        mailer
            .send_otp("owner@example.com", OtpPurpose::Unblock, "report.pdf", "https://x", "123456")
            .await
            .unwrap();

        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "owner@example.com");
        assert_eq!(sent[0].subject, OtpPurpose::Unblock.subject());
        assert!(sent[0].html.contains("123456"));
        assert!(sent[0].html.contains("report.pdf"));
    }

    #[tokio::test]
    async fn test_send_failure_propagates() {
        let sender = Arc::new(RecordingSender {
            fail: true,
            ..Default::default()
        });
        let mailer = mailer(sender);

        let err = mailer
            .send_invite("a@example.com", "bob", "f.txt", "https://x", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ExternalServiceError(_)));
    }
}
