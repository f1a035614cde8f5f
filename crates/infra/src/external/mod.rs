//! Outbound transports for low-stock alerts, plus the wiring that turns
//! configuration into a dispatcher.

pub mod email;
pub mod relay;

use std::sync::Arc;

use stockwatch_alerts::{DispatcherConfig, LogChannel, NotificationChannel};

use crate::config::AppConfig;

pub use email::EmailChannel;
pub use relay::RelayChannel;

/// Channels enabled by `config`; falls back to the log channel when none is.
pub fn dispatcher_config(config: &AppConfig) -> DispatcherConfig {
    let mut channels: Vec<Arc<dyn NotificationChannel>> = Vec::new();
    if let Some(email) = &config.email {
        channels.push(Arc::new(EmailChannel::new(email)));
    }
    if let Some(relay) = &config.relay {
        channels.push(Arc::new(RelayChannel::new(relay)));
    }
    if channels.is_empty() {
        tracing::warn!("no alert transport configured; low stock alerts go to the log only");
        channels.push(Arc::new(LogChannel::new()));
    }

    DispatcherConfig {
        channels,
        channel_timeout: config.alert_timeout,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<&str, &str> = vars.iter().copied().collect();
        AppConfig::from_lookup(|k| map.get(k).map(|v| v.to_string())).unwrap()
    }

    #[test]
    fn falls_back_to_log_channel() {
        let dc = dispatcher_config(&config(&[]));
        let names: Vec<&str> = dc.channels.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["log"]);
    }

    #[test]
    fn enables_configured_transports_in_order() {
        let dc = dispatcher_config(&config(&[
            ("EMAIL_USER", "alerts@example.com"),
            ("EMAIL_PASS", "secret"),
            ("ALERT_EMAIL", "pharmacist@example.com"),
            ("ALERT_PHONE", "+15550100"),
            ("CALLMEBOT_API_KEY", "k"),
            ("ALERT_TIMEOUT_SECS", "3"),
        ]));
        let names: Vec<&str> = dc.channels.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["email", "relay"]);
        assert_eq!(dc.channel_timeout, std::time::Duration::from_secs(3));
    }
}
