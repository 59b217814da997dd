//! Paper trading brokerage.
//!
//! Holds an account snapshot in memory and simulates limit-order fills
//! against the quoted bid/ask without touching a live brokerage. A sell
//! fills when its limit is at or below the bid, a buy when its limit is at
//! or above the ask. Fills update positions and option collateral so that
//! a close followed by an open (a roll) sees the freed shares.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::client::BrokerageClient;
use crate::error::{BrokerError, Result};
use crate::types::{
    AggregatePosition, Contract, ContractQuery, Holding, LimitOrderRequest, OptionChain,
    OptionPosition, OptionType, Order, OrderSide, OrderState, PositionEffect, PositionLeg,
    PositionType, StockPosition,
};

const SHARES_PER_CONTRACT: u32 = 100;

/// Account and market state the paper broker starts from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaperSnapshot {
    #[serde(default)]
    pub holdings: Vec<Holding>,
    #[serde(default)]
    pub stock_positions: Vec<StockPosition>,
    #[serde(default)]
    pub option_positions: Vec<OptionPosition>,
    #[serde(default)]
    pub aggregate_positions: Vec<AggregatePosition>,
    /// Listed expirations per underlying.
    #[serde(default)]
    pub chains: BTreeMap<String, Vec<NaiveDate>>,
    #[serde(default)]
    pub contracts: Vec<Contract>,
}

#[derive(Debug, Default)]
struct PaperState {
    snapshot: PaperSnapshot,
    orders: BTreeMap<String, Order>,
    submitted: Vec<LimitOrderRequest>,
    cancelled: Vec<String>,
    quote_requests: usize,
    next_order_id: u64,
    offline: bool,
    /// Cancels still to be ignored, leaving the order open.
    ignored_cancels: usize,
}

/// In-memory [`BrokerageClient`].
#[derive(Debug, Default)]
pub struct PaperBroker {
    state: Mutex<PaperState>,
}

impl PaperBroker {
    /// Creates a paper broker from an account snapshot.
    pub fn new(snapshot: PaperSnapshot) -> Self {
        Self {
            state: Mutex::new(PaperState {
                snapshot,
                ..PaperState::default()
            }),
        }
    }

    /// Parses a JSON snapshot.
    ///
    /// # Errors
    /// Returns a serialization error if the JSON does not describe a snapshot.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let snapshot: PaperSnapshot = serde_json::from_str(json)?;
        Ok(Self::new(snapshot))
    }

    /// Loads a JSON snapshot from disk.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read paper snapshot {}", path.display()))?;
        Self::from_json_str(&json)
            .with_context(|| format!("Failed to parse paper snapshot {}", path.display()))
    }

    /// Replaces the quoted snapshot for a contract (matched by id).
    pub fn set_quote(&self, contract: Contract) {
        let mut state = self.state.lock();
        match state
            .snapshot
            .contracts
            .iter_mut()
            .find(|c| c.id == contract.id)
        {
            Some(existing) => *existing = contract,
            None => state.snapshot.contracts.push(contract),
        }
    }

    /// Makes every subsequent call fail with a network error.
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().offline = offline;
    }

    /// The next `count` cancel requests on open orders are acknowledged but
    /// leave the order open, as a brokerage does when a cancel races a
    /// pending fill.
    pub fn ignore_cancels(&self, count: usize) {
        self.state.lock().ignored_cancels = count;
    }

    /// Every order request received, in submission order.
    pub fn submitted_orders(&self) -> Vec<LimitOrderRequest> {
        self.state.lock().submitted.clone()
    }

    /// Ids of every cancel request received.
    pub fn cancelled_orders(&self) -> Vec<String> {
        self.state.lock().cancelled.clone()
    }

    /// Number of quote refreshes served.
    pub fn quote_requests(&self) -> usize {
        self.state.lock().quote_requests
    }

    /// Current account state, including fills applied so far.
    pub fn snapshot(&self) -> PaperSnapshot {
        self.state.lock().snapshot.clone()
    }
}

impl PaperState {
    fn ensure_online(&self) -> Result<()> {
        if self.offline {
            return Err(BrokerError::Network("paper broker offline".to_string()));
        }
        Ok(())
    }

    fn listed_contract(&self, request: &LimitOrderRequest) -> Option<&Contract> {
        self.snapshot.contracts.iter().find(|c| {
            c.symbol == request.symbol
                && c.expiration == request.expiration
                && c.strike == request.strike
                && c.option_type == request.option_type
        })
    }

    fn instrument_id(&self, symbol: &str) -> Option<String> {
        self.snapshot
            .holdings
            .iter()
            .find(|h| h.symbol == symbol)
            .map(|h| h.instrument_id.clone())
    }

    fn adjust_collateral(&mut self, symbol: &str, shares: Decimal) {
        let Some(instrument_id) = self.instrument_id(symbol) else {
            return;
        };
        let positions = &mut self.snapshot.stock_positions;
        let position = match positions.iter().position(|p| p.instrument_id == instrument_id) {
            Some(idx) => &mut positions[idx],
            None => {
                let quantity = self
                    .snapshot
                    .holdings
                    .iter()
                    .find(|h| h.symbol == symbol)
                    .map(|h| h.quantity)
                    .unwrap_or_default();
                positions.push(StockPosition {
                    instrument_id,
                    quantity,
                    shares_held_for_options_collateral: Decimal::ZERO,
                });
                let last = positions.len() - 1;
                &mut positions[last]
            }
        };
        position.shares_held_for_options_collateral =
            (position.shares_held_for_options_collateral + shares).max(Decimal::ZERO);
    }

    fn apply_fill(&mut self, contract: &Contract, order: &Order) {
        let quantity = Decimal::from(order.quantity);
        let shares = quantity * Decimal::from(SHARES_PER_CONTRACT);
        match (order.side, order.effect) {
            (OrderSide::Sell, PositionEffect::Open) => {
                if contract.option_type == OptionType::Call {
                    self.adjust_collateral(&order.symbol, shares);
                }
                self.snapshot.option_positions.push(OptionPosition {
                    option_id: contract.id.clone(),
                    chain_symbol: order.symbol.clone(),
                    position_type: PositionType::Short,
                    quantity,
                });
                self.snapshot.aggregate_positions.push(AggregatePosition {
                    symbol: order.symbol.clone(),
                    quantity,
                    strategy: "short_call".to_string(),
                    strategy_code: format!("{}_1s", contract.id),
                    legs: vec![PositionLeg {
                        option: format!("https://paper.local/options/instruments/{}/", contract.id),
                        expiration: contract.expiration,
                        strike: contract.strike,
                    }],
                });
            }
            (OrderSide::Buy, PositionEffect::Close) => {
                if contract.option_type == OptionType::Call {
                    self.adjust_collateral(&order.symbol, -shares);
                }
                self.snapshot
                    .option_positions
                    .retain(|p| p.option_id != contract.id);
                self.snapshot.aggregate_positions.retain(|p| {
                    !p.legs
                        .iter()
                        .any(|leg| leg.option.contains(contract.id.as_str()))
                });
            }
            // Other combinations have no position bookkeeping in paper mode.
            _ => {}
        }
    }
}

fn marketable(contract: &Contract, request: &LimitOrderRequest) -> bool {
    match request.side {
        OrderSide::Sell => request.price <= contract.bid,
        OrderSide::Buy => request.price >= contract.ask,
    }
}

#[async_trait]
impl BrokerageClient for PaperBroker {
    async fn get_chain(&self, symbol: &str) -> Result<OptionChain> {
        let state = self.state.lock();
        state.ensure_online()?;
        let expirations = state
            .snapshot
            .chains
            .get(symbol)
            .cloned()
            .ok_or_else(|| BrokerError::symbol_not_found(symbol))?;
        Ok(OptionChain {
            symbol: symbol.to_string(),
            expirations,
        })
    }

    async fn find_contracts(&self, query: &ContractQuery) -> Result<Vec<Contract>> {
        let state = self.state.lock();
        state.ensure_online()?;
        let found: Vec<Contract> = state
            .snapshot
            .contracts
            .iter()
            .filter(|c| {
                c.symbol == query.symbol
                    && c.expiration == query.expiration
                    && c.option_type == query.option_type
            })
            .filter(|c| {
                query
                    .metric
                    .value(c)
                    .is_some_and(|v| v >= query.low && v <= query.high)
            })
            .cloned()
            .collect();
        debug!(
            symbol = %query.symbol,
            expiration = %query.expiration,
            count = found.len(),
            "Paper contract search"
        );
        Ok(found)
    }

    async fn get_quote(&self, contract_id: &str) -> Result<Contract> {
        let mut state = self.state.lock();
        state.ensure_online()?;
        state.quote_requests += 1;
        state
            .snapshot
            .contracts
            .iter()
            .find(|c| c.id == contract_id)
            .cloned()
            .ok_or_else(|| BrokerError::contract_not_found(contract_id))
    }

    async fn submit_limit_order(&self, request: &LimitOrderRequest) -> Result<Order> {
        let mut state = self.state.lock();
        state.ensure_online()?;
        state.submitted.push(request.clone());

        let contract = state.listed_contract(request).cloned().ok_or_else(|| {
            BrokerError::Rejected(format!(
                "no listed {} {}{} {}",
                request.symbol, request.strike, request.option_type, request.expiration
            ))
        })?;

        state.next_order_id += 1;
        let filled = marketable(&contract, request);
        let order = Order {
            id: format!("PAPER-{}", state.next_order_id),
            symbol: request.symbol.clone(),
            side: request.side,
            effect: request.effect,
            price: request.price,
            quantity: request.quantity,
            expiration: request.expiration,
            strike: request.strike,
            option_type: request.option_type,
            state: if filled {
                OrderState::Filled
            } else {
                OrderState::Open
            },
        };

        if filled {
            state.apply_fill(&contract, &order);
            info!(
                order_id = %order.id,
                contract = %contract.display_name(),
                side = ?order.side,
                price = %order.price,
                quantity = order.quantity,
                "Paper fill simulated"
            );
        }

        state.orders.insert(order.id.clone(), order.clone());
        Ok(order)
    }

    async fn cancel_order(&self, order_id: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.ensure_online()?;
        let state = &mut *state;
        state.cancelled.push(order_id.to_string());
        let order = state
            .orders
            .get_mut(order_id)
            .ok_or_else(|| BrokerError::order_not_found(order_id))?;
        if order.state != OrderState::Open {
            return Ok(());
        }
        if state.ignored_cancels > 0 {
            state.ignored_cancels -= 1;
            debug!(order_id, "Paper cancel ignored, order stays open");
            return Ok(());
        }
        order.state = OrderState::Cancelled;
        Ok(())
    }

    async fn get_order_status(&self, order_id: &str) -> Result<Order> {
        let state = self.state.lock();
        state.ensure_online()?;
        state
            .orders
            .get(order_id)
            .cloned()
            .ok_or_else(|| BrokerError::order_not_found(order_id))
    }

    async fn get_holdings(&self) -> Result<Vec<Holding>> {
        let state = self.state.lock();
        state.ensure_online()?;
        Ok(state.snapshot.holdings.clone())
    }

    async fn get_open_positions(&self) -> Result<Vec<StockPosition>> {
        let state = self.state.lock();
        state.ensure_online()?;
        Ok(state.snapshot.stock_positions.clone())
    }

    async fn get_option_positions(&self) -> Result<Vec<OptionPosition>> {
        let state = self.state.lock();
        state.ensure_online()?;
        Ok(state.snapshot.option_positions.clone())
    }

    async fn get_aggregate_positions(&self) -> Result<Vec<AggregatePosition>> {
        let state = self.state.lock();
        state.ensure_online()?;
        Ok(state.snapshot.aggregate_positions.clone())
    }
}
