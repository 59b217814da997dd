//! Batch request and per-symbol outcome types.

use std::collections::BTreeMap;

use cc_trade_broker::Order;
use serde::{Deserialize, Serialize};

/// Which side of the covered call a batch trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeKind {
    /// Buy-to-close open short calls.
    #[serde(alias = "buy", alias = "Buy")]
    Buy,
    /// Sell-to-open new covered calls.
    #[serde(alias = "sell", alias = "Sell")]
    Sell,
}

impl std::str::FromStr for TradeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BUY" => Ok(Self::Buy),
            "SELL" => Ok(Self::Sell),
            other => Err(format!("unknown trade type: {other}")),
        }
    }
}

/// `{"type": "SELL", "symbols": ["AAPL", "MSFT"]}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRequest {
    #[serde(rename = "type")]
    pub kind: TradeKind,
    pub symbols: Vec<String>,
}

/// Terminal failure for a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeFailure {
    /// Every expiration, contract, and price offset was tried.
    Exhausted,
}

/// Final outcome for one symbol. Serializes as the filled order or as
/// `{"error": "EXHAUSTED"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TradeResult {
    Filled(Order),
    Failed { error: TradeFailure },
}

impl TradeResult {
    pub fn exhausted() -> Self {
        Self::Failed {
            error: TradeFailure::Exhausted,
        }
    }

    pub fn is_filled(&self) -> bool {
        matches!(self, Self::Filled(_))
    }

    pub fn order(&self) -> Option<&Order> {
        match self {
            Self::Filled(order) => Some(order),
            Self::Failed { .. } => None,
        }
    }
}

/// Outcomes keyed by symbol.
pub type BatchResults = BTreeMap<String, TradeResult>;
