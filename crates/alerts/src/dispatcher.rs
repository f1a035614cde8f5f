//! Low-stock alert fan-out.
//!
//! ```text
//! LowStockAlert
//!   ├─ task ─ compose(email) ─ timeout(send) ─┐
//!   ├─ task ─ compose(relay) ─ timeout(send) ─┼─ DispatchReport
//!   └─ ...                                    ┘
//! ```
//!
//! Every channel gets its own tokio task, so a channel that errors, hangs or
//! panics only ever affects its own entry in the report. Nothing is retried and
//! nothing is persisted; each dispatch is an independent attempt set.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use stockwatch_core::StockRecordId;

use crate::channel::{ChannelError, NotificationChannel};
use crate::message::{LowStockAlert, Notification};

/// Explicit channel wiring for an [`AlertDispatcher`].
#[derive(Clone)]
pub struct DispatcherConfig {
    pub channels: Vec<Arc<dyn NotificationChannel>>,
    /// Upper bound on a single channel's send attempt.
    pub channel_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            channels: Vec::new(),
            channel_timeout: Duration::from_secs(10),
        }
    }
}

impl core::fmt::Debug for DispatcherConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DispatcherConfig")
            .field(
                "channels",
                &self.channels.iter().map(|c| c.name().to_string()).collect::<Vec<_>>(),
            )
            .field("channel_timeout", &self.channel_timeout)
            .finish()
    }
}

impl DispatcherConfig {
    pub fn with_channel(mut self, channel: Arc<dyn NotificationChannel>) -> Self {
        self.channels.push(channel);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.channel_timeout = timeout;
        self
    }
}

/// Result of one channel's attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelOutcome {
    pub channel: String,
    pub result: Result<(), ChannelError>,
}

/// What happened to one dispatch, per channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub record_id: StockRecordId,
    pub outcomes: Vec<ChannelOutcome>,
}

impl DispatchReport {
    pub fn sent(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.sent()
    }

    pub fn outcome(&self, channel: &str) -> Option<&ChannelOutcome> {
        self.outcomes.iter().find(|o| o.channel == channel)
    }
}

/// Delivers low-stock alerts through every registered channel, independently.
pub struct AlertDispatcher {
    channels: Vec<Arc<dyn NotificationChannel>>,
    channel_timeout: Duration,
}

impl core::fmt::Debug for AlertDispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AlertDispatcher")
            .field("channels", &self.channels.len())
            .field("channel_timeout", &self.channel_timeout)
            .finish()
    }
}

impl AlertDispatcher {
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            channels: config.channels,
            channel_timeout: config.channel_timeout,
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Attempt every channel once and wait for all attempts to settle.
    ///
    /// Never fails: channel errors are logged and reported, not returned.
    pub async fn dispatch(&self, alert: LowStockAlert) -> DispatchReport {
        let mut attempts = Vec::with_capacity(self.channels.len());

        for channel in &self.channels {
            let channel = Arc::clone(channel);
            let notification = Notification::compose(channel.kind(), &alert);
            let bound = self.channel_timeout;
            let name = channel.name().to_string();

            let task = tokio::spawn(async move {
                match tokio::time::timeout(bound, channel.send(&notification)).await {
                    Ok(result) => result,
                    Err(_) => Err(ChannelError::Timeout(bound)),
                }
            });
            attempts.push((name, task));
        }

        let mut outcomes = Vec::with_capacity(attempts.len());
        for (channel, task) in attempts {
            let result = match task.await {
                Ok(result) => result,
                Err(join_err) => Err(ChannelError::Aborted(join_err.to_string())),
            };

            match &result {
                Ok(()) => info!(
                    record_id = %alert.record_id,
                    item = %alert.name,
                    quantity = alert.quantity,
                    channel = %channel,
                    "low stock alert sent"
                ),
                Err(err) => warn!(
                    record_id = %alert.record_id,
                    item = %alert.name,
                    channel = %channel,
                    error = %err,
                    "low stock alert failed"
                ),
            }

            outcomes.push(ChannelOutcome { channel, result });
        }

        DispatchReport {
            record_id: alert.record_id,
            outcomes,
        }
    }

    /// Fire-and-forget variant: run [`AlertDispatcher::dispatch`] on a detached task.
    ///
    /// The returned handle may be dropped; delivery continues regardless.
    pub fn spawn(self: &Arc<Self>, alert: LowStockAlert) -> JoinHandle<DispatchReport> {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move { dispatcher.dispatch(alert).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelKind;
    use crate::in_memory::InMemoryChannel;

    fn alert() -> LowStockAlert {
        LowStockAlert {
            record_id: StockRecordId::new(),
            name: "Amoxicillin".to_string(),
            quantity: 2,
            threshold: 5,
        }
    }

    #[tokio::test]
    async fn failing_channel_does_not_stop_the_others() {
        let broken = Arc::new(InMemoryChannel::failing("email", ChannelKind::Email));
        let healthy = Arc::new(InMemoryChannel::new("relay", ChannelKind::Relay));
        let dispatcher = AlertDispatcher::new(
            DispatcherConfig::default()
                .with_channel(broken.clone())
                .with_channel(healthy.clone()),
        );

        let report = dispatcher.dispatch(alert()).await;

        assert_eq!(report.sent(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(broken.attempts(), 1);
        assert_eq!(healthy.attempts(), 1);
        assert_eq!(
            healthy.delivered()[0].body,
            "Low Stock Alert: Amoxicillin - Only 2 left!"
        );
        assert!(matches!(
            report.outcome("email").unwrap().result,
            Err(ChannelError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn hanging_channel_is_cut_off_by_timeout() {
        let stuck = Arc::new(InMemoryChannel::hanging("relay", ChannelKind::Relay));
        let healthy = Arc::new(InMemoryChannel::new("email", ChannelKind::Email));
        let bound = Duration::from_millis(50);
        let dispatcher = AlertDispatcher::new(
            DispatcherConfig::default()
                .with_channel(stuck.clone())
                .with_channel(healthy.clone())
                .with_timeout(bound),
        );

        let report = dispatcher.dispatch(alert()).await;

        assert_eq!(
            report.outcome("relay").unwrap().result,
            Err(ChannelError::Timeout(bound))
        );
        assert_eq!(report.outcome("email").unwrap().result, Ok(()));
        assert_eq!(healthy.delivered().len(), 1);
    }

    #[tokio::test]
    async fn each_channel_gets_its_own_layout() {
        let email = Arc::new(InMemoryChannel::new("email", ChannelKind::Email));
        let relay = Arc::new(InMemoryChannel::new("relay", ChannelKind::Relay));
        let dispatcher = AlertDispatcher::new(
            DispatcherConfig::default()
                .with_channel(email.clone())
                .with_channel(relay.clone()),
        );

        dispatcher.dispatch(alert()).await;

        assert_eq!(
            email.delivered()[0].body,
            "The stock for Amoxicillin is low. Only 2 left."
        );
        assert_eq!(
            relay.delivered()[0].body,
            "Low Stock Alert: Amoxicillin - Only 2 left!"
        );
    }

    #[tokio::test]
    async fn no_channels_yields_empty_report() {
        let dispatcher = AlertDispatcher::new(DispatcherConfig::default());
        let a = alert();
        let report = dispatcher.dispatch(a.clone()).await;
        assert_eq!(report.record_id, a.record_id);
        assert!(report.outcomes.is_empty());
    }

    #[tokio::test]
    async fn repeated_dispatches_are_independent() {
        let ch = Arc::new(InMemoryChannel::new("email", ChannelKind::Email));
        let dispatcher =
            Arc::new(AlertDispatcher::new(DispatcherConfig::default().with_channel(ch.clone())));

        dispatcher.spawn(alert()).await.unwrap();
        dispatcher.spawn(alert()).await.unwrap();

        assert_eq!(ch.attempts(), 2);
    }
}
