//! Brokerage client interface.
//!
//! The trading engine only reaches the brokerage through this trait, so the
//! live session, login handshake, and credential handling stay outside the
//! engine. [`crate::paper::PaperBroker`] is the in-memory implementation.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    AggregatePosition, Contract, ContractQuery, Holding, LimitOrderRequest, OptionChain,
    OptionPosition, Order, StockPosition,
};

/// Everything the order-execution engine needs from a brokerage account.
#[async_trait]
pub trait BrokerageClient: Send + Sync {
    /// Listed expirations for an underlying.
    async fn get_chain(&self, symbol: &str) -> Result<OptionChain>;

    /// Contracts at one expiration whose profit metric lies in `[low, high]`.
    async fn find_contracts(&self, query: &ContractQuery) -> Result<Vec<Contract>>;

    /// Fresh market snapshot for a contract.
    async fn get_quote(&self, contract_id: &str) -> Result<Contract>;

    /// Submit a single-leg limit order.
    async fn submit_limit_order(&self, request: &LimitOrderRequest) -> Result<Order>;

    /// Request cancellation of an order. Filled orders stay filled.
    async fn cancel_order(&self, order_id: &str) -> Result<()>;

    /// Current state of an order.
    async fn get_order_status(&self, order_id: &str) -> Result<Order>;

    /// Equity holdings with current prices.
    async fn get_holdings(&self) -> Result<Vec<Holding>>;

    /// Open stock positions, including shares held as option collateral.
    async fn get_open_positions(&self) -> Result<Vec<StockPosition>>;

    /// Open single-leg option positions.
    async fn get_option_positions(&self) -> Result<Vec<OptionPosition>>;

    /// Open strategy-level option positions.
    async fn get_aggregate_positions(&self) -> Result<Vec<AggregatePosition>>;
}
