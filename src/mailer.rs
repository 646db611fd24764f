use async_trait::async_trait;
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Outbound email collaborator.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> anyhow::Result<()>;
}

/// Sends through the SendGrid v3 HTTP API.
pub struct SendGridMailer {
    client: reqwest::Client,
    api_key: String,
    from: String,
}

impl SendGridMailer {
    const ENDPOINT: &'static str = "https://api.sendgrid.com/v3/mail/send";

    pub fn new(api_key: String, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            from,
        }
    }
}

#[async_trait]
impl Mailer for SendGridMailer {
    async fn send(&self, message: EmailMessage) -> anyhow::Result<()> {
        let body = json!({
            "personalizations": [{ "to": [{ "email": message.to }] }],
            "from": { "email": self.from },
            "subject": message.subject,
            "content": [{ "type": "text/html", "value": message.html }],
        });

        let response = self
            .client
            .post(Self::ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("sendgrid responded with {status}: {detail}");
        }

        tracing::info!(to = %message.to, "email sent");
        Ok(())
    }
}

/// Development mailer: writes the message to the log instead of sending it.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: EmailMessage) -> anyhow::Result<()> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            html = %message.html,
            "email not sent, no SENDGRID_API_KEY configured"
        );
        Ok(())
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

pub fn password_reset_email(name: &str, to: &str, reset_url: &str) -> EmailMessage {
    let name = escape_html(name);
    let reset_url = escape_html(reset_url);
    let html = format!(
        r#"<h1>Password Reset Request</h1>
<p>Hi {name},</p>
<p>You requested to reset your password. Please click the link below to reset your password:</p>
<a href="{reset_url}" style="padding: 10px 15px; background-color: #00A76F; color: white; text-decoration: none; border-radius: 4px;">Reset Password</a>
<p>This link will expire in 10 minutes.</p>
<p>If you didn't request this, please ignore this email and your password will remain unchanged.</p>"#
    );

    EmailMessage {
        to: to.to_string(),
        subject: "Password Reset Request".to_string(),
        html,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_email_carries_link_and_recipient() {
        let message = password_reset_email(
            "Ada",
            "ada@example.com",
            "http://localhost:5173/auth/reset-password?token=abc",
        );
        assert_eq!(message.to, "ada@example.com");
        assert!(message.html.contains("Hi Ada"));
        assert!(message.html.contains("reset-password?token=abc\""));
    }

    #[test]
    fn reset_email_escapes_user_name() {
        let message = password_reset_email(
            "<script>alert('x')</script> & co",
            "eve@example.com",
            "http://localhost:5173/auth/reset-password?token=abc",
        );
        assert!(!message.html.contains("<script>"));
        assert!(message.html.contains("Hi &lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt; &amp; co,"));
    }
}
