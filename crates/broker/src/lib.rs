//! Brokerage integration for covered-call trading.
//!
//! Provides the [`BrokerageClient`] interface the execution engine talks
//! to, the option/order data types that cross it, and an in-memory
//! [`PaperBroker`] for dry runs and tests. Brokerage login and session
//! handling live behind the trait, outside this workspace.

pub mod client;
pub mod error;
pub mod paper;
pub mod types;

pub use client::BrokerageClient;
pub use error::{BrokerError, Result};
pub use paper::{PaperBroker, PaperSnapshot};
pub use types::{
    AggregatePosition, Contract, ContractQuery, Holding, LimitOrderRequest, MinTicks, OptionChain,
    OptionPosition, OptionType, Order, OrderSide, OrderState, PositionEffect, PositionLeg,
    PositionType, PriceEffect, ProfitMetric, StockPosition,
};
