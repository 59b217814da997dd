use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub selection: SelectionConfig,
    pub pricing: PricingConfig,
    pub execution: ExecutionConfig,
}

/// Contract selection for the sell-to-open flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Lower bound of the short-call chance of profit band.
    pub min_probability: f64,
    /// Upper bound of the short-call chance of profit band.
    pub max_probability: f64,
    /// Candidates closest to this chance of profit rank first.
    pub target_probability: f64,
    /// Smallest premium worth selling.
    pub min_premium: Decimal,
    /// Candidates kept per expiration.
    pub contracts_per_expiration: usize,
    /// Expirations searched per symbol.
    pub expirations: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            min_probability: 0.85,
            max_probability: 0.95,
            target_probability: 0.88,
            min_premium: dec!(0.05),
            contracts_per_expiration: 2,
            expirations: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Largest accepted |mid - limit| / mid before a contract is abandoned.
    pub max_spread: Decimal,
    /// Annual risk-free rate used when a probability must be computed locally.
    pub risk_free_rate: f64,
    /// Annual dividend yield used when a probability must be computed locally.
    pub dividend_yield: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            max_spread: dec!(0.20),
            risk_free_rate: 0.0,
            dividend_yield: 0.0,
        }
    }
}

/// Pacing between brokerage-facing iterations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub min_delay_secs: f64,
    pub max_delay_secs: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            min_delay_secs: 5.0,
            max_delay_secs: 10.0,
        }
    }
}
