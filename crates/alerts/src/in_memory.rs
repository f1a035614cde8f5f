//! In-memory channel for tests/dev.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::channel::{ChannelError, ChannelKind, NotificationChannel};
use crate::message::Notification;

/// What an [`InMemoryChannel`] does when asked to send.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ChannelBehavior {
    /// Record the notification and succeed.
    Succeed,
    /// Count the attempt and fail with a transport error.
    Fail,
    /// Never complete (exercises the dispatcher's timeout).
    Hang,
}

/// Channel that keeps delivered notifications in memory.
#[derive(Debug)]
pub struct InMemoryChannel {
    name: String,
    kind: ChannelKind,
    behavior: ChannelBehavior,
    attempts: AtomicUsize,
    delivered: Mutex<Vec<Notification>>,
}

impl InMemoryChannel {
    pub fn new(name: impl Into<String>, kind: ChannelKind) -> Self {
        Self::with_behavior(name, kind, ChannelBehavior::Succeed)
    }

    pub fn failing(name: impl Into<String>, kind: ChannelKind) -> Self {
        Self::with_behavior(name, kind, ChannelBehavior::Fail)
    }

    pub fn hanging(name: impl Into<String>, kind: ChannelKind) -> Self {
        Self::with_behavior(name, kind, ChannelBehavior::Hang)
    }

    pub fn with_behavior(
        name: impl Into<String>,
        kind: ChannelKind,
        behavior: ChannelBehavior,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            behavior,
            attempts: AtomicUsize::new(0),
            delivered: Mutex::new(Vec::new()),
        }
    }

    /// Number of `send` calls, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn delivered(&self) -> Vec<Notification> {
        match self.delivered.lock() {
            Ok(d) => d.clone(),
            Err(_) => vec![],
        }
    }
}

#[async_trait]
impl NotificationChannel for InMemoryChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ChannelKind {
        self.kind
    }

    async fn send(&self, notification: &Notification) -> Result<(), ChannelError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            ChannelBehavior::Succeed => {
                if let Ok(mut d) = self.delivered.lock() {
                    d.push(notification.clone());
                }
                Ok(())
            }
            ChannelBehavior::Fail => Err(ChannelError::Transport(format!(
                "{} is configured to fail",
                self.name
            ))),
            ChannelBehavior::Hang => std::future::pending().await,
        }
    }
}
