//! Core types for single-leg option trading against a brokerage account.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Option type (call or put).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl std::fmt::Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "C"),
            Self::Put => write!(f, "P"),
        }
    }
}

/// Minimum price increments for an option contract.
///
/// `above_tick` applies to prices above `cutoff_price` and is the increment
/// used when walking a buy price up; `below_tick` is used when walking a
/// sell price down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinTicks {
    pub above_tick: Decimal,
    pub below_tick: Decimal,
    #[serde(default)]
    pub cutoff_price: Option<Decimal>,
}

/// Live snapshot of an option contract: instrument data merged with market data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: String,
    pub symbol: String,
    pub expiration: NaiveDate,
    pub strike: Decimal,
    pub option_type: OptionType,
    pub bid: Decimal,
    pub ask: Decimal,
    pub min_ticks: MinTicks,
    #[serde(default)]
    pub chance_of_profit_short: Option<f64>,
    #[serde(default)]
    pub chance_of_profit_long: Option<f64>,
    /// Brokerage's suggested sell price with a high fill rate.
    #[serde(default)]
    pub high_fill_rate_sell_price: Option<Decimal>,
    #[serde(default)]
    pub implied_volatility: Option<f64>,
}

impl Contract {
    /// Average of bid and ask.
    pub fn mid_price(&self) -> Decimal {
        (self.bid + self.ask) / Decimal::TWO
    }

    /// Human-readable contract description (e.g., "AAPL 190C 2026-11-20").
    pub fn display_name(&self) -> String {
        format!(
            "{} {}{} {}",
            self.symbol, self.strike, self.option_type, self.expiration
        )
    }
}

/// Probability metric used to filter a contract search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfitMetric {
    ChanceOfProfitShort,
    ChanceOfProfitLong,
}

impl ProfitMetric {
    /// Reads this metric from a contract snapshot.
    pub fn value(self, contract: &Contract) -> Option<f64> {
        match self {
            Self::ChanceOfProfitShort => contract.chance_of_profit_short,
            Self::ChanceOfProfitLong => contract.chance_of_profit_long,
        }
    }
}

/// Contract search restricted to one expiration and a probability band.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractQuery {
    pub symbol: String,
    pub expiration: NaiveDate,
    pub option_type: OptionType,
    pub metric: ProfitMetric,
    pub low: f64,
    pub high: f64,
}

/// Listed expirations for an underlying.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionChain {
    pub symbol: String,
    pub expirations: Vec<NaiveDate>,
}

/// Equity holding in the account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub instrument_id: String,
    pub quantity: Decimal,
    pub price: Decimal,
}

/// Open stock position, including shares pledged as option collateral.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockPosition {
    pub instrument_id: String,
    pub quantity: Decimal,
    #[serde(default)]
    pub shares_held_for_options_collateral: Decimal,
}

/// Long or short side of an option position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionType {
    Long,
    Short,
}

/// Open single-leg option position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionPosition {
    pub option_id: String,
    pub chain_symbol: String,
    #[serde(rename = "type")]
    pub position_type: PositionType,
    pub quantity: Decimal,
}

/// One leg of an aggregate (strategy-level) position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionLeg {
    /// Instrument reference for the leg, usually a URL ending in the option id.
    pub option: String,
    pub expiration: NaiveDate,
    pub strike: Decimal,
}

/// Strategy-level position as reported by the brokerage (e.g. "short_call").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatePosition {
    pub symbol: String,
    pub quantity: Decimal,
    pub strategy: String,
    #[serde(default)]
    pub strategy_code: String,
    pub legs: Vec<PositionLeg>,
}

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Whether an order opens a new position or closes an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionEffect {
    Open,
    Close,
}

/// Whether the order collects or pays premium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceEffect {
    Credit,
    Debit,
}

impl OrderSide {
    /// Premium direction implied by the side: selling collects, buying pays.
    pub fn price_effect(self) -> PriceEffect {
        match self {
            Self::Sell => PriceEffect::Credit,
            Self::Buy => PriceEffect::Debit,
        }
    }
}

/// Order status as reported by the brokerage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderState {
    /// Accepted and working (or not yet confirmed cancelled).
    Open,
    Filled,
    Cancelled,
}

/// A single-leg limit order to submit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitOrderRequest {
    pub side: OrderSide,
    pub effect: PositionEffect,
    pub price: Decimal,
    pub symbol: String,
    pub quantity: u32,
    pub expiration: NaiveDate,
    pub strike: Decimal,
    pub option_type: OptionType,
}

impl LimitOrderRequest {
    /// Sell-to-open a contract.
    pub fn sell_to_open(contract: &Contract, price: Decimal, quantity: u32) -> Self {
        Self {
            side: OrderSide::Sell,
            effect: PositionEffect::Open,
            price,
            symbol: contract.symbol.clone(),
            quantity,
            expiration: contract.expiration,
            strike: contract.strike,
            option_type: contract.option_type,
        }
    }

    /// Buy-to-close a contract.
    pub fn buy_to_close(contract: &Contract, price: Decimal, quantity: u32) -> Self {
        Self {
            side: OrderSide::Buy,
            effect: PositionEffect::Close,
            price,
            symbol: contract.symbol.clone(),
            quantity,
            expiration: contract.expiration,
            strike: contract.strike,
            option_type: contract.option_type,
        }
    }
}

/// An order as known to the brokerage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub symbol: String,
    pub side: OrderSide,
    pub effect: PositionEffect,
    pub price: Decimal,
    pub quantity: u32,
    pub expiration: NaiveDate,
    pub strike: Decimal,
    pub option_type: OptionType,
    pub state: OrderState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn contract() -> Contract {
        Contract {
            id: "c1".to_string(),
            symbol: "AAPL".to_string(),
            expiration: NaiveDate::from_ymd_opt(2026, 11, 20).unwrap(),
            strike: dec!(190),
            option_type: OptionType::Call,
            bid: dec!(1.00),
            ask: dec!(1.25),
            min_ticks: MinTicks {
                above_tick: dec!(0.05),
                below_tick: dec!(0.01),
                cutoff_price: Some(dec!(3.00)),
            },
            chance_of_profit_short: Some(0.88),
            chance_of_profit_long: Some(0.12),
            high_fill_rate_sell_price: None,
            implied_volatility: Some(0.3),
        }
    }

    #[test]
    fn mid_price_averages_bid_and_ask() {
        assert_eq!(contract().mid_price(), dec!(1.125));
    }

    #[test]
    fn display_name_formats_strike_and_type() {
        assert_eq!(contract().display_name(), "AAPL 190C 2026-11-20");
    }

    #[test]
    fn profit_metric_reads_matching_field() {
        let c = contract();
        assert_eq!(ProfitMetric::ChanceOfProfitShort.value(&c), Some(0.88));
        assert_eq!(ProfitMetric::ChanceOfProfitLong.value(&c), Some(0.12));
    }

    #[test]
    fn order_request_constructors_set_side_and_effect() {
        let c = contract();
        let sell = LimitOrderRequest::sell_to_open(&c, dec!(1.10), 2);
        assert_eq!(sell.side, OrderSide::Sell);
        assert_eq!(sell.effect, PositionEffect::Open);
        assert_eq!(sell.side.price_effect(), PriceEffect::Credit);

        let buy = LimitOrderRequest::buy_to_close(&c, dec!(1.10), 2);
        assert_eq!(buy.side, OrderSide::Buy);
        assert_eq!(buy.effect, PositionEffect::Close);
        assert_eq!(buy.side.price_effect(), PriceEffect::Debit);
    }

    #[test]
    fn contract_deserializes_without_optional_fields() {
        let json = r#"{
            "id": "x",
            "symbol": "MSFT",
            "expiration": "2026-11-27",
            "strike": "450",
            "option_type": "call",
            "bid": "2.10",
            "ask": "2.30",
            "min_ticks": {"above_tick": "0.05", "below_tick": "0.05"}
        }"#;
        let c: Contract = serde_json::from_str(json).unwrap();
        assert_eq!(c.strike, dec!(450));
        assert!(c.chance_of_profit_short.is_none());
        assert!(c.min_ticks.cutoff_price.is_none());
    }
}
