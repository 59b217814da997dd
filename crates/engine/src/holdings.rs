//! Account views: contracts available to sell, and a per-symbol summary.

use std::collections::{BTreeMap, HashMap};

use cc_trade_broker::{BrokerageClient, PositionType};
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

const SHARES_PER_CONTRACT: Decimal = Decimal::ONE_HUNDRED;

/// How many covered calls a symbol can still back, and at what share price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub contracts: u32,
    pub price: Decimal,
}

fn whole_contracts(shares: Decimal) -> u32 {
    (shares / SHARES_PER_CONTRACT).floor().to_u32().unwrap_or(0)
}

/// Whole lots of 100 shares held, minus lots already pledged as collateral.
///
/// # Errors
/// Propagates brokerage failures.
pub async fn available_contracts<B: BrokerageClient + ?Sized>(
    broker: &B,
) -> Result<BTreeMap<String, Availability>> {
    let holdings = broker.get_holdings().await?;
    let positions = broker.get_open_positions().await?;

    let symbol_by_instrument: HashMap<&str, &str> = holdings
        .iter()
        .map(|h| (h.instrument_id.as_str(), h.symbol.as_str()))
        .collect();

    let mut pledged: HashMap<&str, u32> = HashMap::new();
    for position in &positions {
        let Some(symbol) = symbol_by_instrument
            .get(position.instrument_id.as_str())
            .copied()
        else {
            debug!(instrument_id = %position.instrument_id, "Position without a holding");
            continue;
        };
        *pledged.entry(symbol).or_default() +=
            whole_contracts(position.shares_held_for_options_collateral);
    }

    Ok(holdings
        .iter()
        .map(|h| {
            let max = whole_contracts(h.quantity);
            let used = pledged.get(h.symbol.as_str()).copied().unwrap_or(0);
            (
                h.symbol.clone(),
                Availability {
                    contracts: max.saturating_sub(used),
                    price: h.price,
                },
            )
        })
        .collect())
}

/// One row of the holdings view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingSummary {
    pub key: usize,
    pub symbol: String,
    pub quantity: Option<Decimal>,
    pub price: Option<Decimal>,
    /// Signed contract count: negative when net short.
    pub open_contracts: i64,
    /// Value of the shares beyond whole 100-share lots.
    pub loose: Decimal,
    pub option_type: Option<String>,
    pub expiration: Option<NaiveDate>,
    pub strike: Option<Decimal>,
    pub chance: Option<f64>,
}

impl HoldingSummary {
    fn empty(symbol: &str) -> Self {
        Self {
            key: 0,
            symbol: symbol.to_string(),
            quantity: None,
            price: None,
            open_contracts: 0,
            loose: Decimal::ZERO,
            option_type: None,
            expiration: None,
            strike: None,
            chance: None,
        }
    }
}

/// Holdings joined with open option positions, sorted by symbol.
///
/// # Errors
/// Propagates brokerage failures, including quote lookups for each open
/// option position.
pub async fn holdings_summary<B: BrokerageClient + ?Sized>(
    broker: &B,
) -> Result<Vec<HoldingSummary>> {
    let mut rows: BTreeMap<String, HoldingSummary> = BTreeMap::new();

    for holding in broker.get_holdings().await? {
        let loose = if holding.quantity > SHARES_PER_CONTRACT {
            (holding.quantity % SHARES_PER_CONTRACT) * holding.price
        } else {
            Decimal::ZERO
        };
        let row = rows
            .entry(holding.symbol.clone())
            .or_insert_with(|| HoldingSummary::empty(&holding.symbol));
        row.quantity = Some(holding.quantity);
        row.price = Some(holding.price);
        row.loose = loose;
    }

    for position in broker.get_option_positions().await? {
        let sign = match position.position_type {
            PositionType::Short => -1,
            PositionType::Long => 1,
        };
        let contracts = position.quantity.trunc().to_i64().unwrap_or(0);
        let quote = broker.get_quote(&position.option_id).await?;

        let row = rows
            .entry(position.chain_symbol.clone())
            .or_insert_with(|| HoldingSummary::empty(&position.chain_symbol));
        row.open_contracts += contracts * sign;
        row.option_type = Some(quote.option_type.to_string());
        row.expiration = Some(quote.expiration);
        row.strike = Some(quote.strike);
        row.chance = if row.open_contracts < 0 {
            quote.chance_of_profit_short
        } else {
            quote.chance_of_profit_long
        };
    }

    Ok(rows
        .into_values()
        .enumerate()
        .map(|(key, row)| HoldingSummary { key, ..row })
        .collect())
}
