//! Notification channel capability.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::message::Notification;

/// Transport family of a channel; selects the message layout.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    /// Mail transport: subject line plus plain-text body.
    Email,
    /// SMS / chat relay: a single short line of text.
    Relay,
    /// Local log output.
    Log,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Email => "email",
            ChannelKind::Relay => "relay",
            ChannelKind::Log => "log",
        }
    }
}

impl core::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single channel's send attempt failed.
///
/// Never fatal: the dispatcher logs it and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The channel is misconfigured (bad address, malformed URL, ...).
    #[error("channel misconfigured: {0}")]
    Config(String),

    /// The transport could not deliver (connection refused, TLS, DNS, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote side answered but refused the message.
    #[error("rejected by remote (status {status}): {body}")]
    Rejected { status: u16, body: String },

    /// The attempt did not finish within the dispatcher's bound.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The send task panicked or was cancelled.
    #[error("send task aborted: {0}")]
    Aborted(String),
}

/// Outbound "send a text alert" capability, one implementation per transport.
///
/// Implementations deliver what they are given; composing the text is the
/// dispatcher's job.
#[async_trait]
pub trait NotificationChannel: Send + Sync + 'static {
    /// Stable name used in logs and dispatch reports.
    fn name(&self) -> &str;

    fn kind(&self) -> ChannelKind;

    async fn send(&self, notification: &Notification) -> Result<(), ChannelError>;
}

#[async_trait]
impl<C> NotificationChannel for Arc<C>
where
    C: NotificationChannel + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn kind(&self) -> ChannelKind {
        (**self).kind()
    }

    async fn send(&self, notification: &Notification) -> Result<(), ChannelError> {
        (**self).send(notification).await
    }
}
