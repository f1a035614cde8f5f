//! Alert payloads and per-channel message layout.

use stockwatch_core::StockRecordId;
use stockwatch_inventory::StockRecord;

use crate::channel::ChannelKind;

/// Snapshot of a record taken when it was found below threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowStockAlert {
    pub record_id: StockRecordId,
    pub name: String,
    pub quantity: i64,
    pub threshold: i64,
}

impl From<&StockRecord> for LowStockAlert {
    fn from(record: &StockRecord) -> Self {
        Self {
            record_id: record.id(),
            name: record.name().to_string(),
            quantity: record.quantity(),
            threshold: record.threshold(),
        }
    }
}

/// Fully composed outbound message.
///
/// Transports without a subject line ignore `subject`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

impl Notification {
    /// Lay out `alert` for a channel of the given kind.
    pub fn compose(kind: ChannelKind, alert: &LowStockAlert) -> Self {
        let subject = format!("Low Stock Alert: {}", alert.name);
        let body = match kind {
            ChannelKind::Email => format!(
                "The stock for {} is low. Only {} left.",
                alert.name, alert.quantity
            ),
            ChannelKind::Relay => format!(
                "Low Stock Alert: {} - Only {} left!",
                alert.name, alert.quantity
            ),
            ChannelKind::Log => format!(
                "{} is below threshold ({} < {})",
                alert.name, alert.quantity, alert.threshold
            ),
        };
        Self { subject, body }
    }
}
