use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use stockwatch_infra::TransactionOutcome;
use stockwatch_inventory::{AdjustStock, NewStockRecord, StockRecord, Transaction};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    pub quantity: i64,
    pub threshold: i64,
}

impl From<CreateItemRequest> for NewStockRecord {
    fn from(body: CreateItemRequest) -> Self {
        NewStockRecord {
            name: body.name,
            quantity: body.quantity,
            threshold: body.threshold,
        }
    }
}

/// Body of `PUT /api/items/:id`.
///
/// Amounts are kept as raw JSON so integer strings (`"7"`) are accepted as
/// well as numbers; see [`parse_amount`]. `amountTaken` is read as
/// `amountConsumed`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    #[serde(default, alias = "amountTaken")]
    pub amount_consumed: Option<Value>,
    #[serde(default)]
    pub amount_restocked: Option<Value>,
}

impl TransactionRequest {
    pub fn into_command(self) -> Result<AdjustStock, String> {
        Ok(AdjustStock {
            amount_consumed: parse_amount("amountConsumed", self.amount_consumed.as_ref())?,
            amount_restocked: parse_amount("amountRestocked", self.amount_restocked.as_ref())?,
        })
    }
}

/// 2^53. From here on a parsed float may already be a rounded neighbour of
/// what the client sent.
const MAX_EXACT_F64: f64 = 9_007_199_254_740_992.0;

/// Whole number, as a JSON integer, an integral float or a decimal string.
///
/// `null` and the empty string mean "not supplied". Sign is not checked here;
/// the ledger rejects negative amounts.
pub fn parse_amount(field: &str, raw: Option<&Value>) -> Result<Option<i64>, String> {
    let invalid = || format!("{field} must be a whole number");

    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => {
            if let Some(v) = n.as_i64() {
                return Ok(Some(v));
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < MAX_EXACT_F64 => {
                    Ok(Some(f as i64))
                }
                _ => Err(invalid()),
            }
        }
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.parse::<i64>().map(Some).map_err(|_| invalid())
        }
        Some(_) => Err(invalid()),
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEntry {
    pub amount_consumed: u64,
    pub amount_restocked: u64,
    pub timestamp: DateTime<Utc>,
}

impl From<&Transaction> for TransactionEntry {
    fn from(t: &Transaction) -> Self {
        Self {
            amount_consumed: t.amount_consumed,
            amount_restocked: t.amount_restocked,
            timestamp: t.timestamp,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRecordResponse {
    pub id: String,
    pub name: String,
    pub quantity: i64,
    pub threshold: i64,
    pub initial_quantity: i64,
    pub is_low: bool,
    pub created_at: DateTime<Utc>,
    pub history: Vec<TransactionEntry>,
}

impl From<&StockRecord> for StockRecordResponse {
    fn from(r: &StockRecord) -> Self {
        Self {
            id: r.id().to_string(),
            name: r.name().to_string(),
            quantity: r.quantity(),
            threshold: r.threshold(),
            initial_quantity: r.initial_quantity(),
            is_low: r.is_low(),
            created_at: r.created_at(),
            history: r.history().iter().map(TransactionEntry::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    #[serde(flatten)]
    pub record: StockRecordResponse,
    pub crossed_below_threshold: bool,
}

impl From<&TransactionOutcome> for TransactionResponse {
    fn from(outcome: &TransactionOutcome) -> Self {
        Self {
            record: StockRecordResponse::from(&outcome.record),
            crossed_below_threshold: outcome.crossed_below_threshold,
        }
    }
}
