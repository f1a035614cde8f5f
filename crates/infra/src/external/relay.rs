//! SMS / chat relay channel over HTTP.
//!
//! Speaks the CallMeBot style API: a single `GET` carrying the recipient phone,
//! the message text and an API key as query parameters.

use async_trait::async_trait;
use reqwest::Url;

use stockwatch_alerts::{ChannelError, ChannelKind, Notification, NotificationChannel};

use crate::config::RelayConfig;

#[derive(Clone)]
pub struct RelayChannel {
    client: reqwest::Client,
    base_url: String,
    phone: String,
    api_key: String,
}

impl core::fmt::Debug for RelayChannel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RelayChannel")
            .field("base_url", &self.base_url)
            .field("phone", &self.phone)
            .finish()
    }
}

impl RelayChannel {
    pub fn new(config: &RelayConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: &RelayConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            phone: config.phone.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn request_url(&self, notification: &Notification) -> Result<Url, ChannelError> {
        Url::parse_with_params(
            &self.base_url,
            &[
                ("phone", self.phone.as_str()),
                ("text", notification.body.as_str()),
                ("apikey", self.api_key.as_str()),
            ],
        )
        .map_err(|e| ChannelError::Config(format!("invalid relay url: {e}")))
    }
}

#[async_trait]
impl NotificationChannel for RelayChannel {
    fn name(&self) -> &str {
        "relay"
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::Relay
    }

    async fn send(&self, notification: &Notification) -> Result<(), ChannelError> {
        let url = self.request_url(notification)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ChannelError::Transport(format!("relay request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(ChannelError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
