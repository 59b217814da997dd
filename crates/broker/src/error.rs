//! Error types for brokerage access.
//!
//! Every brokerage failure is fatal to the batch that hit it. Nothing in
//! this crate retries a call; callers decide what to do with the error.

use thiserror::Error;

/// Errors that can occur when talking to the brokerage.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// API request failed.
    #[error("API error: {status_code} - {message}")]
    Api {
        /// HTTP status code.
        status_code: u16,
        /// Error message from the brokerage.
        message: String,
    },

    /// Network error.
    #[error("network error: {0}")]
    Network(String),

    /// Order not found.
    #[error("order not found: {order_id}")]
    OrderNotFound {
        /// The order ID that was not found.
        order_id: String,
    },

    /// Option contract not found.
    #[error("contract not found: {contract_id}")]
    ContractNotFound {
        /// The contract ID that was not found.
        contract_id: String,
    },

    /// Underlying symbol not found.
    #[error("symbol not found: {symbol}")]
    SymbolNotFound {
        /// The unknown symbol.
        symbol: String,
    },

    /// Order rejected by the brokerage.
    #[error("order rejected: {0}")]
    Rejected(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl BrokerError {
    /// Creates an API error from status code and message.
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status_code,
            message: message.into(),
        }
    }

    /// Creates an order not found error.
    pub fn order_not_found(order_id: impl Into<String>) -> Self {
        Self::OrderNotFound {
            order_id: order_id.into(),
        }
    }

    /// Creates a contract not found error.
    pub fn contract_not_found(contract_id: impl Into<String>) -> Self {
        Self::ContractNotFound {
            contract_id: contract_id.into(),
        }
    }

    /// Creates a symbol not found error.
    pub fn symbol_not_found(symbol: impl Into<String>) -> Self {
        Self::SymbolNotFound {
            symbol: symbol.into(),
        }
    }
}

impl From<serde_json::Error> for BrokerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for brokerage operations.
pub type Result<T> = std::result::Result<T, BrokerError>;
