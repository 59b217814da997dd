//! Adaptive covered-call execution.
//!
//! This crate provides:
//! - Black-Scholes probability of profit for short calls
//! - Candidate selection by probability band and minimum premium
//! - Tick-aligned limit pricing with a spread guard
//! - A per-symbol cursor that walks price, then contract, then expiration
//! - A controller that submits, waits, cancels, and retries until every
//!   symbol fills or runs out of candidates
//!
//! # Example
//!
//! ```ignore
//! use cc_trade_broker::PaperBroker;
//! use cc_trade_core::AppConfig;
//! use cc_trade_engine::{ExecutionController, SystemClock, TradeKind};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let broker = PaperBroker::from_json_file("paper.json")?;
//!     let config = AppConfig::default();
//!     let clock = SystemClock::from_config(&config.execution);
//!
//!     let controller = ExecutionController::new(&broker, &clock, &config);
//!     let results = controller
//!         .execute(TradeKind::Sell, &["AAPL".to_string()])
//!         .await?;
//!     println!("{}", serde_json::to_string_pretty(&results)?);
//!     Ok(())
//! }
//! ```

pub mod clock;
pub mod controller;
pub mod cursor;
pub mod error;
pub mod expirations;
pub mod flow;
pub mod holdings;
pub mod pricing;
pub mod roll;
pub mod selector;
pub mod ticks;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use controller::ExecutionController;
pub use cursor::{ClosingCursor, CursorPosition, TradeCursor, Transition};
pub use error::{PricingError, Result, TradeError};
pub use expirations::{get_week, select_expirations, ExpirationWindow};
pub use flow::{Submission, TradeFlow};
pub use holdings::{available_contracts, holdings_summary, Availability, HoldingSummary};
pub use pricing::{chance_of_profit, years_to_expiry, ProfitInputs};
pub use roll::{roll, RollDirection};
pub use selector::ContractSelector;
pub use ticks::{buy_limit_price, round_to_tick, sell_limit_price, spread_is_high, RoundDirection};
pub use types::{BatchResults, TradeFailure, TradeKind, TradeRequest, TradeResult};
