//! Opening and closing order flows.
//!
//! A [`TradeFlow`] owns one cursor per symbol and knows how to build the
//! next limit order, and how to move the cursor when an order comes back
//! unfilled. The controller drives it; the flow never waits or loops.

use std::collections::{BTreeMap, BTreeSet};

use cc_trade_broker::{AggregatePosition, BrokerageClient, Order};
use cc_trade_core::AppConfig;
use chrono::NaiveDate;
use regex::{Regex, RegexBuilder};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::cursor::{ClosingCursor, TradeCursor, Transition};
use crate::error::{Result, TradeError};
use crate::expirations::{select_expirations, ExpirationWindow};
use crate::holdings::available_contracts;
use crate::selector::ContractSelector;
use crate::types::{TradeKind, TradeResult};

const SHORT_CALL_STRATEGY: &str = "short_call";
const UUID_PATTERN: &str =
    r"[0-9a-f]{8}-[0-9a-f]{4}-[0-5][0-9a-f]{3}-[089ab][0-9a-f]{3}-[0-9a-f]{12}";

/// What happened when the flow was asked for an order.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// An order reached the brokerage.
    Placed(Order),
    /// Nothing to sell at the cursor; treated as an immediate cancel.
    Skipped,
}

/// Per-symbol cursors for one batch.
#[derive(Debug, Clone)]
pub enum TradeFlow {
    /// Sell-to-open covered calls.
    Open(BTreeMap<String, TradeCursor>),
    /// Buy-to-close short calls.
    Close(BTreeMap<String, ClosingCursor>),
}

impl TradeFlow {
    /// Builds the flow for `kind` over `symbols`.
    ///
    /// # Errors
    /// Propagates brokerage and pricing failures hit while building cursors.
    pub async fn init<B: BrokerageClient + ?Sized>(
        kind: TradeKind,
        broker: &B,
        config: &AppConfig,
        today: NaiveDate,
        symbols: &[String],
    ) -> Result<Self> {
        match kind {
            TradeKind::Sell => {
                Self::init_open(broker, config, today, symbols, &BTreeMap::new()).await
            }
            TradeKind::Buy => Self::init_close(broker, symbols).await,
        }
    }

    /// Opening flow. `windows` narrows the expirations per symbol; symbols
    /// missing from it may use any expiration after the current week.
    ///
    /// # Errors
    /// Propagates brokerage and pricing failures.
    pub async fn init_open<B: BrokerageClient + ?Sized>(
        broker: &B,
        config: &AppConfig,
        today: NaiveDate,
        symbols: &[String],
        windows: &BTreeMap<String, ExpirationWindow>,
    ) -> Result<Self> {
        let available = available_contracts(broker).await?;
        let selector = ContractSelector::new(broker, &config.selection, &config.pricing);

        let mut cursors = BTreeMap::new();
        for symbol in requested(symbols) {
            let Some(availability) = available.get(&symbol).filter(|a| a.contracts > 0) else {
                warn!(symbol = %symbol, "No uncovered lots to sell against, skipping");
                continue;
            };

            let chain = broker.get_chain(&symbol).await?;
            let window = windows.get(&symbol).copied().unwrap_or_default();
            let expirations = select_expirations(
                &chain.expirations,
                today,
                config.selection.expirations,
                window,
            );

            let mut contracts = Vec::with_capacity(expirations.len());
            for &expiration in &expirations {
                contracts.push(
                    selector
                        .candidates(&symbol, expiration, availability.price, today)
                        .await?,
                );
            }

            info!(
                symbol = %symbol,
                quantity = availability.contracts,
                expirations = expirations.len(),
                candidates = contracts.iter().map(Vec::len).sum::<usize>(),
                "Opening cursor ready"
            );
            cursors.insert(
                symbol.clone(),
                TradeCursor::new(
                    symbol,
                    expirations,
                    contracts,
                    availability.contracts,
                    availability.price,
                ),
            );
        }
        Ok(Self::Open(cursors))
    }

    /// Closing flow over the account's short calls on `symbols`.
    ///
    /// # Errors
    /// Propagates brokerage failures, including the initial quote fetch.
    pub async fn init_close<B: BrokerageClient + ?Sized>(
        broker: &B,
        symbols: &[String],
    ) -> Result<Self> {
        let wanted = requested(symbols);
        let uuid = RegexBuilder::new(UUID_PATTERN)
            .case_insensitive(true)
            .build()?;

        let mut cursors = BTreeMap::new();
        for position in broker.get_aggregate_positions().await? {
            if position.strategy != SHORT_CALL_STRATEGY || !wanted.contains(&position.symbol) {
                continue;
            }
            let Some(option_id) = position_option_id(&uuid, &position) else {
                warn!(symbol = %position.symbol, "Short call without an option id, skipping");
                continue;
            };
            let quantity = position.quantity.trunc().to_u32().unwrap_or(0);
            if quantity == 0 {
                warn!(symbol = %position.symbol, quantity = %position.quantity, "Nothing to close");
                continue;
            }
            if cursors.contains_key(&position.symbol) {
                warn!(symbol = %position.symbol, "Multiple short calls, closing the first");
                continue;
            }

            let contract = broker.get_quote(&option_id).await?;
            info!(
                symbol = %position.symbol,
                contract = %contract.display_name(),
                quantity,
                "Closing cursor ready"
            );
            cursors.insert(
                position.symbol.clone(),
                ClosingCursor::new(position.symbol, option_id, quantity, contract),
            );
        }

        for symbol in &wanted {
            if !cursors.contains_key(symbol) {
                warn!(symbol = %symbol, "No short call to close, skipping");
            }
        }
        Ok(Self::Close(cursors))
    }

    pub fn kind(&self) -> TradeKind {
        match self {
            Self::Open(_) => TradeKind::Sell,
            Self::Close(_) => TradeKind::Buy,
        }
    }

    /// Symbols with a cursor, in processing order.
    pub fn symbols(&self) -> Vec<String> {
        match self {
            Self::Open(cursors) => cursors.keys().cloned().collect(),
            Self::Close(cursors) => cursors.keys().cloned().collect(),
        }
    }

    /// Opening cursors with no expiration to search.
    pub fn unsearchable(&self) -> Vec<String> {
        match self {
            Self::Open(cursors) => cursors
                .iter()
                .filter(|(_, cursor)| cursor.is_empty())
                .map(|(symbol, _)| symbol.clone())
                .collect(),
            Self::Close(_) => Vec::new(),
        }
    }

    /// Expiration of each short call being closed.
    pub fn closing_expirations(&self) -> BTreeMap<String, NaiveDate> {
        match self {
            Self::Open(_) => BTreeMap::new(),
            Self::Close(cursors) => cursors
                .iter()
                .map(|(symbol, cursor)| (symbol.clone(), cursor.contract.expiration))
                .collect(),
        }
    }

    /// Places a limit order at the symbol's cursor.
    ///
    /// # Errors
    /// Propagates brokerage failures; an unknown symbol is an invalid request.
    pub async fn submit<B: BrokerageClient + ?Sized>(
        &self,
        broker: &B,
        symbol: &str,
    ) -> Result<Submission> {
        let request = match self {
            Self::Open(cursors) => {
                let cursor = cursors.get(symbol).ok_or_else(|| unknown(symbol))?;
                match cursor.order_request() {
                    Some(request) => request,
                    None => {
                        debug!(
                            symbol,
                            expiration = cursor.position.expiration,
                            "No candidates at this expiration"
                        );
                        return Ok(Submission::Skipped);
                    }
                }
            }
            Self::Close(cursors) => cursors
                .get(symbol)
                .ok_or_else(|| unknown(symbol))?
                .order_request(),
        };

        let order = broker.submit_limit_order(&request).await?;
        info!(
            symbol,
            order_id = %order.id,
            side = ?request.side,
            strike = %request.strike,
            expiration = %request.expiration,
            price = %request.price,
            quantity = request.quantity,
            "Limit order submitted"
        );
        Ok(Submission::Placed(order))
    }

    /// Moves the symbol's cursor after an unfilled or skipped order and
    /// refreshes the quote it will trade next. Returns the symbol's final
    /// result once the opening search runs out.
    ///
    /// # Errors
    /// Propagates brokerage failures from the quote refresh.
    pub async fn adjust<B: BrokerageClient + ?Sized>(
        &mut self,
        broker: &B,
        symbol: &str,
        max_spread: Decimal,
    ) -> Result<Option<TradeResult>> {
        match self {
            Self::Open(cursors) => {
                let cursor = cursors.get_mut(symbol).ok_or_else(|| unknown(symbol))?;
                let transition = cursor.on_unfilled(max_spread);
                let position = cursor.position;
                match transition {
                    Transition::Exhausted => {
                        info!(symbol, "Every candidate tried, giving up");
                        return Ok(Some(TradeResult::exhausted()));
                    }
                    Transition::WalkPrice => {
                        debug!(symbol, offset = position.offset, "Walking limit price");
                    }
                    Transition::NextContract => {
                        warn!(
                            symbol,
                            contract = position.contract,
                            "Spread too wide, trying next contract"
                        );
                    }
                    Transition::NextExpiration => {
                        debug!(
                            symbol,
                            expiration = position.expiration,
                            "Moving to next expiration"
                        );
                    }
                }

                if let Some(id) = cursor.current().map(|c| c.id.clone()) {
                    let fresh = broker.get_quote(&id).await?;
                    cursor.replace_current(fresh);
                }
                Ok(None)
            }
            Self::Close(cursors) => {
                let cursor = cursors.get_mut(symbol).ok_or_else(|| unknown(symbol))?;
                if cursor.on_unfilled(max_spread) {
                    warn!(
                        symbol,
                        offset = cursor.offset,
                        "Closing price past the spread guard, still walking"
                    );
                } else {
                    debug!(symbol, offset = cursor.offset, "Walking closing price");
                }
                cursor.contract = broker.get_quote(&cursor.option_id).await?;
                Ok(None)
            }
        }
    }
}

fn requested(symbols: &[String]) -> BTreeSet<String> {
    symbols
        .iter()
        .map(|s| s.trim().to_ascii_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn unknown(symbol: &str) -> TradeError {
    TradeError::InvalidRequest(format!("no cursor for {symbol}"))
}

/// Option id from the first leg's instrument reference, else the strategy code.
fn position_option_id(uuid: &Regex, position: &AggregatePosition) -> Option<String> {
    position
        .legs
        .first()
        .and_then(|leg| uuid.find(&leg.option))
        .or_else(|| uuid.find(&position.strategy_code))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_trade_broker::PositionLeg;
    use rust_decimal_macros::dec;

    const ID: &str = "0b5c3f43-9f5e-4a55-8b0e-5e8a3c7a1d22";

    fn position(option: &str, code: &str) -> AggregatePosition {
        AggregatePosition {
            symbol: "AAPL".to_string(),
            quantity: dec!(1),
            strategy: SHORT_CALL_STRATEGY.to_string(),
            strategy_code: code.to_string(),
            legs: vec![PositionLeg {
                option: option.to_string(),
                expiration: NaiveDate::from_ymd_opt(2026, 11, 20).unwrap(),
                strike: dec!(190),
            }],
        }
    }

    fn pattern() -> Regex {
        RegexBuilder::new(UUID_PATTERN)
            .case_insensitive(true)
            .build()
            .unwrap()
    }

    #[test]
    fn option_id_comes_from_leg_reference() {
        let p = position(
            &format!("https://api.example.com/options/instruments/{ID}/"),
            "other",
        );
        assert_eq!(position_option_id(&pattern(), &p).as_deref(), Some(ID));
    }

    #[test]
    fn option_id_falls_back_to_strategy_code() {
        let p = position("not-a-reference", &format!("{}_1s", ID.to_uppercase()));
        assert_eq!(
            position_option_id(&pattern(), &p),
            Some(ID.to_uppercase())
        );
    }

    #[test]
    fn missing_option_id_is_none() {
        let p = position("nothing", "here");
        assert!(position_option_id(&pattern(), &p).is_none());
    }

    #[test]
    fn requested_symbols_are_normalized() {
        let symbols = vec![" msft".to_string(), "AAPL".to_string(), "".to_string(), "aapl".to_string()];
        let got: Vec<String> = requested(&symbols).into_iter().collect();
        assert_eq!(got, vec!["AAPL", "MSFT"]);
    }
}
