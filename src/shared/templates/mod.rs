//! Email body rendering.
//!
//! Templates live in `templates/email/` and use Jinja2 syntax.

pub mod engine;

pub use engine::{render_template, TemplateError};

use minijinja::Value;
use std::collections::HashMap;

/// What a one-time code unlocks; drives the wording of the OTP email
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpPurpose {
    Unblock,
    Restore,
}

impl OtpPurpose {
    fn title(self) -> &'static str {
        match self {
            OtpPurpose::Unblock => "Unblock Your Secured File",
            OtpPurpose::Restore => "Restore Your Secured File",
        }
    }

    fn intro(self) -> &'static str {
        match self {
            OtpPurpose::Unblock => {
                "Your file was locked after too many wrong PIN attempts. Enter the code below to unlock it."
            }
            OtpPurpose::Restore => {
                "An administrator approved your restore request. Enter the code below to restore the file."
            }
        }
    }

    pub fn subject(self) -> &'static str {
        match self {
            OtpPurpose::Unblock => "Your Secure File Access OTP",
            OtpPurpose::Restore => "Your Secure File Restore OTP",
        }
    }
}

/// Render the OTP email body
pub fn render_otp_email(
    purpose: OtpPurpose,
    file_name: &str,
    otp: &str,
    link: &str,
    ttl_minutes: i64,
) -> Result<String, TemplateError> {
    let mut ctx: HashMap<&str, Value> = HashMap::new();
    ctx.insert("title", Value::from(purpose.title()));
    ctx.insert("intro", Value::from(purpose.intro()));
    ctx.insert("file_name", Value::from(file_name));
    ctx.insert("otp", Value::from(otp));
    ctx.insert("link", Value::from(link));
    ctx.insert("ttl_minutes", Value::from(ttl_minutes));

    render_template("email/otp.jinja", &ctx)
}

/// Render the share invitation body
pub fn render_invite_email(
    sender: &str,
    file_name: &str,
    link: &str,
    expires_at: &str,
) -> Result<String, TemplateError> {
    let mut ctx: HashMap<&str, Value> = HashMap::new();
    ctx.insert("sender", Value::from(sender));
    ctx.insert("file_name", Value::from(file_name));
    ctx.insert("link", Value::from(link));
    ctx.insert("expires_at", Value::from(expires_at));

    render_template("email/invite.jinja", &ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_unblock_otp_email() {
        let html = render_otp_email(
            OtpPurpose::Unblock,
            "report.pdf",
            "482913",
            "https://securedtrans.site/user/file/abc",
            10,
        )
        .unwrap();

        assert!(html.contains("482913"));
        assert!(html.contains("report.pdf"));
        assert!(html.contains("10 minutes"));
        assert!(html.contains("Unblock Your Secured File"));
    }

    #[test]
    fn test_render_restore_otp_email_singular_minute() {
        let html = render_otp_email(OtpPurpose::Restore, "a.txt", "111111", "http://x", 1).unwrap();
        assert!(html.contains("1 minute and"));
        assert!(html.contains("Restore Your Secured File"));
    }

    #[test]
    fn test_render_invite_email() {
        let html = render_invite_email(
            "owner@securedtrans.site",
            "plan.docx",
            "https://securedtrans.site/user/file/1?token=t&shared=true",
            "2026-01-01 10:00 UTC",
        )
        .unwrap();

        assert!(html.contains("owner@securedtrans.site"));
        assert!(html.contains("plan.docx"));
        // `&` is escaped inside the href attribute
        assert!(html.contains("token=t&amp;shared=true"));
    }
}
