use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockwatch_core::{DomainError, DomainResult, StockRecordId};

use crate::threshold::is_low;

/// One audited stock delta.
///
/// An entry carries either a consumption or a restock; the other amount is zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub amount_consumed: u64,
    #[serde(default)]
    pub amount_restocked: u64,
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    pub fn consumption(amount: u64, timestamp: DateTime<Utc>) -> Self {
        Self {
            amount_consumed: amount,
            amount_restocked: 0,
            timestamp,
        }
    }

    pub fn restock(amount: u64, timestamp: DateTime<Utc>) -> Self {
        Self {
            amount_consumed: 0,
            amount_restocked: amount,
            timestamp,
        }
    }
}

/// Command: create a stock record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStockRecord {
    pub name: String,
    pub quantity: i64,
    pub threshold: i64,
}

/// Command: adjust stock.
///
/// Amounts arrive unvalidated; `None` and `Some(0)` both mean "no change".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdjustStock {
    pub amount_consumed: Option<i64>,
    pub amount_restocked: Option<i64>,
}

impl AdjustStock {
    pub fn consume(amount: i64) -> Self {
        Self {
            amount_consumed: Some(amount),
            amount_restocked: None,
        }
    }

    pub fn restock(amount: i64) -> Self {
        Self {
            amount_consumed: None,
            amount_restocked: Some(amount),
        }
    }

    /// Validated, non-zero amounts as `(consumed, restocked)`.
    fn effective_amounts(&self) -> DomainResult<(Option<u64>, Option<u64>)> {
        Ok((
            effective_amount("amount_consumed", self.amount_consumed)?,
            effective_amount("amount_restocked", self.amount_restocked)?,
        ))
    }
}

fn effective_amount(field: &str, amount: Option<i64>) -> DomainResult<Option<u64>> {
    match amount {
        None | Some(0) => Ok(None),
        Some(v) if v < 0 => Err(DomainError::invalid_argument(format!(
            "{field} cannot be negative (got {v})"
        ))),
        Some(v) => Ok(Some(v.unsigned_abs())),
    }
}

/// A tracked inventory item with its audit history.
///
/// `quantity` only changes through [`StockRecord::apply`], which appends one
/// history entry per delta. Persisted records come back through
/// [`StockRecord::rehydrate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockRecord {
    id: StockRecordId,
    name: String,
    quantity: i64,
    threshold: i64,
    initial_quantity: i64,
    created_at: DateTime<Utc>,
    history: Vec<Transaction>,
}

impl StockRecord {
    /// Validate a create command and build a fresh record with empty history.
    pub fn create(
        id: StockRecordId,
        cmd: &NewStockRecord,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if cmd.name.trim().is_empty() {
            return Err(DomainError::invalid_argument("name cannot be empty"));
        }
        Ok(Self {
            id,
            name: cmd.name.clone(),
            quantity: cmd.quantity,
            threshold: cmd.threshold,
            initial_quantity: cmd.quantity,
            created_at,
            history: Vec::new(),
        })
    }

    /// Rebuild a record from persisted parts.
    ///
    /// `quantity` is recomputed from the history, so a stored row can never carry a
    /// quantity that disagrees with its audit trail.
    pub fn rehydrate(
        id: StockRecordId,
        name: String,
        initial_quantity: i64,
        threshold: i64,
        created_at: DateTime<Utc>,
        history: Vec<Transaction>,
    ) -> DomainResult<Self> {
        let quantity = replay(initial_quantity, &history)
            .ok_or_else(|| DomainError::invalid_argument("history overflows quantity"))?;
        Ok(Self {
            id,
            name,
            quantity,
            threshold,
            initial_quantity,
            created_at,
            history,
        })
    }

    pub fn id(&self) -> StockRecordId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn threshold(&self) -> i64 {
        self.threshold
    }

    pub fn initial_quantity(&self) -> i64 {
        self.initial_quantity
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn history(&self) -> &[Transaction] {
        &self.history
    }

    pub fn is_low(&self) -> bool {
        is_low(self.quantity, self.threshold)
    }

    /// `initial_quantity + Σ restocked − Σ consumed`, or `None` on overflow.
    pub fn ledger_balance(&self) -> Option<i64> {
        replay(self.initial_quantity, &self.history)
    }

    /// Apply an adjustment, returning the number of history entries appended.
    ///
    /// Consumption is recorded before restock. There is no floor: quantity may go
    /// negative. On error the record is left untouched.
    pub fn apply(&mut self, cmd: &AdjustStock, at: DateTime<Utc>) -> DomainResult<usize> {
        let (consumed, restocked) = cmd.effective_amounts()?;

        let mut next = self.quantity;
        if let Some(amount) = consumed {
            next = next
                .checked_sub_unsigned(amount)
                .ok_or_else(|| DomainError::invalid_argument("quantity underflow"))?;
        }
        if let Some(amount) = restocked {
            next = next
                .checked_add_unsigned(amount)
                .ok_or_else(|| DomainError::invalid_argument("quantity overflow"))?;
        }

        let before = self.history.len();
        if let Some(amount) = consumed {
            self.history.push(Transaction::consumption(amount, at));
        }
        if let Some(amount) = restocked {
            self.history.push(Transaction::restock(amount, at));
        }
        self.quantity = next;

        Ok(self.history.len() - before)
    }
}

fn replay(initial: i64, history: &[Transaction]) -> Option<i64> {
    history.iter().try_fold(initial, |acc, tx| {
        acc.checked_add_unsigned(tx.amount_restocked)?
            .checked_sub_unsigned(tx.amount_consumed)
    })
}
