//! Channel that writes alerts to the process log.
//!
//! Used when no outbound transport is configured, so low-stock events are still
//! visible somewhere.

use async_trait::async_trait;

use crate::channel::{ChannelError, ChannelKind, NotificationChannel};
use crate::message::Notification;

#[derive(Debug, Default)]
pub struct LogChannel;

impl LogChannel {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationChannel for LogChannel {
    fn name(&self) -> &str {
        "log"
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::Log
    }

    async fn send(&self, notification: &Notification) -> Result<(), ChannelError> {
        tracing::warn!(subject = %notification.subject, body = %notification.body, "low stock alert");
        Ok(())
    }
}
