//! Transaction log entries for executed buys and sells.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Money;

/// Direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Buy,
    Sell,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Buy => "BUY",
            TransactionType::Sell => "SELL",
        }
    }
}

impl FromStr for TransactionType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BUY" => Ok(TransactionType::Buy),
            "SELL" => Ok(TransactionType::Sell),
            _ => Err(anyhow::anyhow!("Unknown transaction type: {}", s)),
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One executed trade. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub symbol: String,
    pub kind: TransactionType,
    pub shares: u32,
    pub price_per_share: Money,

    /// shares * price_per_share
    pub notional: Money,

    pub commission: Money,

    /// Unix timestamp (seconds)
    pub timestamp: i64,

    /// In-game day the trade happened on
    pub day: u32,
}

impl Transaction {
    pub fn generate_id() -> String {
        format!("txn_{}", uuid::Uuid::new_v4().simple())
    }

    /// Notional plus commission.
    pub fn total_cost(&self) -> Money {
        self.notional + self.commission
    }

    /// Net cash movement for the portfolio (negative for buys).
    pub fn cash_delta(&self) -> Money {
        match self.kind {
            TransactionType::Buy => -(self.notional + self.commission),
            TransactionType::Sell => self.notional - self.commission,
        }
    }

    /// In-day time as `HH:MM`.
    pub fn formatted_time(&self) -> String {
        let secs = self.timestamp.rem_euclid(86_400);
        format!("{:02}:{:02}", secs / 3600, (secs % 3600) / 60)
    }
}
