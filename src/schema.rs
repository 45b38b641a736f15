use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::validate::Usable;

/// A single transaction row, in document order.
///
/// Sign convention: purchases are positive, credits/refunds are negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Transaction {
    #[schemars(description = "Transaction date exactly as printed, e.g. 12/04/2024")]
    pub date: String,

    #[schemars(description = "Merchant or narrative text for the transaction")]
    pub description: String,

    #[schemars(description = "Transaction amount. Negative for credits/refunds (CR rows)")]
    pub amount: f64,
}

/// Reward points movement over the statement period. Each component is
/// independently nullable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RewardPointsSummary {
    #[schemars(description = "Points balance carried in from the previous statement")]
    pub opening_balance: Option<f64>,

    #[schemars(description = "Points earned during this statement period")]
    pub earned: Option<f64>,

    #[schemars(description = "Points balance at statement close. opening_balance + earned when not printed")]
    pub closing_balance: Option<f64>,
}

/// The reconciled output of one statement extraction.
///
/// Every field is always present as a key when serialized; "unknown" is an
/// explicit null, never key absence. Dates keep the format observed in the
/// document and are not normalized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StatementRecord {
    #[schemars(description = "Full name of the cardholder")]
    pub customer_name: Option<String>,

    #[schemars(description = "Statement generation date, original format preserved")]
    pub statement_date: Option<String>,

    #[schemars(description = "Payment deadline, original format preserved")]
    pub payment_due_date: Option<String>,

    #[schemars(description = "Total balance owed for the period")]
    pub total_amount_due: Option<f64>,

    #[schemars(description = "Minimum payment required. 5% of total_amount_due when not printed")]
    pub minimum_amount_due: Option<f64>,

    #[schemars(description = "Total credit line on the card")]
    pub credit_limit: Option<f64>,

    #[schemars(description = "Remaining credit. credit_limit - total_amount_due when not printed")]
    pub available_credit_limit: Option<f64>,

    #[schemars(description = "Card number, possibly masked, e.g. 428102*****9388")]
    pub card_number: Option<String>,

    #[schemars(description = "Issuing bank or card services name")]
    pub bank_name: Option<String>,

    #[serde(default)]
    #[schemars(description = "All transactions in document order. Empty when none were found")]
    pub transactions: Vec<Transaction>,

    #[serde(default)]
    #[schemars(description = "Reward points movement for the period")]
    pub reward_points_summary: RewardPointsSummary,
}

impl StatementRecord {
    /// The canonical fully-null record: every scalar unknown, no transactions.
    /// This is the degraded-but-valid outcome of a failed LLM pass.
    pub fn fallback() -> Self {
        Self::default()
    }

    /// Builds a record from untrusted model output.
    ///
    /// The model sometimes returns numbers as strings (with currency symbols
    /// or thousands separators), sentinel strings like "N/A", or omits keys
    /// entirely. Anything that cannot be coerced becomes null.
    pub fn from_loose_json(value: &Value) -> Self {
        let mut record = Self::fallback();
        let Some(map) = value.as_object() else {
            return record;
        };

        record.customer_name = map.get("customer_name").and_then(loose_string);
        record.statement_date = map.get("statement_date").and_then(loose_string);
        record.payment_due_date = map.get("payment_due_date").and_then(loose_string);
        record.total_amount_due = map.get("total_amount_due").and_then(loose_number);
        record.minimum_amount_due = map.get("minimum_amount_due").and_then(loose_number);
        record.credit_limit = map.get("credit_limit").and_then(loose_number);
        record.available_credit_limit = map.get("available_credit_limit").and_then(loose_number);
        record.card_number = map.get("card_number").and_then(loose_string);
        record.bank_name = map.get("bank_name").and_then(loose_string);

        if let Some(rows) = map.get("transactions").and_then(Value::as_array) {
            for row in rows {
                let Some(obj) = row.as_object() else { continue };
                let date = obj.get("date").and_then(loose_string);
                let description = obj.get("description").and_then(loose_string);
                let amount = obj.get("amount").and_then(loose_number);
                if let (Some(date), Some(description), Some(amount)) = (date, description, amount)
                {
                    record.transactions.push(Transaction {
                        date,
                        description,
                        amount,
                    });
                }
            }
        }

        if let Some(rewards) = map.get("reward_points_summary").and_then(Value::as_object) {
            record.reward_points_summary = RewardPointsSummary {
                opening_balance: rewards.get("opening_balance").and_then(loose_number),
                earned: rewards.get("earned").and_then(loose_number),
                closing_balance: rewards.get("closing_balance").and_then(loose_number),
            };
        }

        record
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = schemars::schema_for!(StatementRecord);
        serde_json::to_string_pretty(&schema)
    }
}

/// Coerces a JSON value into a usable string, rejecting null-like sentinels.
fn loose_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_usable() {
                Some(trimmed.to_string())
            } else {
                None
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Coerces a JSON value into a finite number. Strings may carry currency
/// symbols and thousands separators.
fn loose_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            cleaned.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        _ => None,
    }
}
