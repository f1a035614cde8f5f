//! Low-stock alerting: the notification channel capability and the dispatcher
//! that fans an alert out to every configured channel.
//!
//! Concrete transports (SMTP, HTTP relay) live in `stockwatch-infra`; this crate
//! only knows the capability they implement.

pub mod channel;
pub mod dispatcher;
pub mod in_memory;
pub mod log;
pub mod message;

pub use channel::{ChannelError, ChannelKind, NotificationChannel};
pub use dispatcher::{AlertDispatcher, ChannelOutcome, DispatchReport, DispatcherConfig};
pub use in_memory::{ChannelBehavior, InMemoryChannel};
pub use log::LogChannel;
pub use message::{LowStockAlert, Notification};
