//! SMTP email channel using Lettre.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use stockwatch_alerts::{ChannelError, ChannelKind, Notification, NotificationChannel};

use crate::config::EmailConfig;

/// Sends alerts as plain-text mail through an authenticated SMTP relay.
///
/// The sender address is the SMTP username.
#[derive(Clone)]
pub struct EmailChannel {
    smtp_host: String,
    smtp_port: u16,
    credentials: Credentials,
    from: String,
    to: String,
}

impl core::fmt::Debug for EmailChannel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EmailChannel")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

impl EmailChannel {
    pub fn new(config: &EmailConfig) -> Self {
        Self {
            smtp_host: config.smtp_host.clone(),
            smtp_port: config.smtp_port,
            credentials: Credentials::new(config.username.clone(), config.password.clone()),
            from: config.username.clone(),
            to: config.recipient.clone(),
        }
    }

    fn build_message(&self, notification: &Notification) -> Result<Message, ChannelError> {
        Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| ChannelError::Config(format!("invalid from address: {e}")))?,
            )
            .to(self
                .to
                .parse()
                .map_err(|e| ChannelError::Config(format!("invalid to address: {e}")))?)
            .subject(notification.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(notification.body.clone())
            .map_err(|e| ChannelError::Config(format!("failed to build email: {e}")))
    }

    /// A fresh transport per send; alerts are rare enough that pooling buys nothing.
    fn build_transport(&self) -> Result<SmtpTransport, ChannelError> {
        Ok(SmtpTransport::starttls_relay(&self.smtp_host)
            .map_err(|e| ChannelError::Config(format!("SMTP relay error: {e}")))?
            .port(self.smtp_port)
            .credentials(self.credentials.clone())
            .build())
    }
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    fn name(&self) -> &str {
        "email"
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::Email
    }

    async fn send(&self, notification: &Notification) -> Result<(), ChannelError> {
        let email = self.build_message(notification)?;
        let mailer = self.build_transport()?;

        tokio::task::spawn_blocking(move || {
            mailer
                .send(&email)
                .map_err(|e| ChannelError::Transport(format!("failed to send email: {e}")))
        })
        .await
        .map_err(|e| ChannelError::Aborted(format!("email task failed: {e}")))?
        .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(username: &str) -> EmailConfig {
        EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            username: username.to_string(),
            password: "secret".to_string(),
            recipient: "pharmacist@example.com".to_string(),
        }
    }

    fn notification() -> Notification {
        Notification {
            subject: "Low Stock Alert: Insulin".to_string(),
            body: "The stock for Insulin is low. Only 3 left.".to_string(),
        }
    }

    #[test]
    fn builds_plain_text_message() {
        let channel = EmailChannel::new(&config("alerts@example.com"));
        let message = channel.build_message(&notification()).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Low Stock Alert: Insulin"));
        assert!(raw.contains("To: pharmacist@example.com"));
        assert!(raw.contains("The stock for Insulin is low. Only 3 left."));
    }

    #[tokio::test]
    async fn invalid_sender_is_a_config_error() {
        let channel = EmailChannel::new(&config("not an address"));
        let err = channel.send(&notification()).await.unwrap_err();
        assert!(matches!(err, ChannelError::Config(msg) if msg.contains("from address")));
    }

    #[test]
    fn debug_output_omits_credentials() {
        let channel = EmailChannel::new(&config("alerts@example.com"));
        assert!(!format!("{channel:?}").contains("secret"));
    }
}
