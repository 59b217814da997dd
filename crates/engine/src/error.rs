//! Error types for the execution engine.
//!
//! Unfilled orders, spread rejections, and exhausted candidates are not
//! errors; they move the retry state machine. Everything here aborts the
//! batch.

use cc_trade_broker::BrokerError;
use thiserror::Error;

/// Black-Scholes inputs outside the formula's domain.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PricingError {
    /// Zero or negative implied volatility.
    #[error("implied volatility must be positive, got {0}")]
    NonPositiveVolatility(f64),

    /// Zero or negative time to expiry.
    #[error("time to expiry must be positive, got {0} years")]
    NonPositiveTime(f64),

    /// Zero or negative stock or strike price.
    #[error("{name} must be positive, got {value}")]
    NonPositivePrice {
        /// Which input was invalid.
        name: &'static str,
        /// The offending value.
        value: f64,
    },
}

/// Errors that abort a trade batch.
#[derive(Debug, Error)]
pub enum TradeError {
    /// Brokerage call failed.
    #[error(transparent)]
    Broker(#[from] BrokerError),

    /// Probability-of-profit inputs were invalid.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// The batch request itself was malformed.
    #[error("invalid trade request: {0}")]
    InvalidRequest(String),

    /// Position-id pattern failed to compile.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, TradeError>;
