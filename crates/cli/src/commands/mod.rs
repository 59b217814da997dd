//! CLI commands for covered-call execution.

pub mod chance;
pub mod holdings;
pub mod roll;
pub mod trade;

use std::path::Path;

use anyhow::{Context as _, Result};
use cc_trade_core::{AppConfig, ConfigLoader};
use cc_trade_engine::{Clock, FixedClock, SystemClock};
use chrono::Utc;
use tracing::info;

pub use chance::{run_chance, ChanceArgs};
pub use holdings::{run_holdings, HoldingsArgs};
pub use roll::{run_roll, RollArgs};
pub use trade::{run_trade, TradeArgs};

/// Settings shared by the order-placing commands.
pub struct Context {
    pub config: AppConfig,
    pub clock: Box<dyn Clock>,
}

impl Context {
    pub fn load(config_path: &Path, no_delay: bool) -> Result<Self> {
        let config = ConfigLoader::load_from(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
        info!(
            config = %config_path.display(),
            max_spread = %config.pricing.max_spread,
            no_delay,
            "Configuration loaded"
        );

        let clock: Box<dyn Clock> = if no_delay {
            Box::new(FixedClock::new(Utc::now().date_naive()))
        } else {
            Box::new(SystemClock::from_config(&config.execution))
        };
        Ok(Self { config, clock })
    }
}
