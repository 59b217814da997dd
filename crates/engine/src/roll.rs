//! Rolling short calls to a different expiration.

use std::collections::BTreeMap;

use cc_trade_broker::BrokerageClient;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::clock::Clock;
use crate::controller::ExecutionController;
use crate::error::Result;
use crate::expirations::ExpirationWindow;
use crate::flow::TradeFlow;
use crate::types::BatchResults;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollDirection {
    /// Reopen at a later expiration.
    Out,
    /// Reopen at an earlier expiration.
    In,
}

impl std::str::FromStr for RollDirection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "out" => Ok(Self::Out),
            "in" => Ok(Self::In),
            other => Err(format!("unknown roll direction: {other}")),
        }
    }
}

impl RollDirection {
    fn window(self, closed: chrono::NaiveDate) -> ExpirationWindow {
        match self {
            Self::Out => ExpirationWindow::After(closed),
            Self::In => ExpirationWindow::Before(closed),
        }
    }
}

/// Closes the short calls on `symbols`, then sells new ones on the symbols
/// that closed, restricted to expirations past (out) or before (in) the
/// closed contract's. Returns the opening results.
///
/// # Errors
/// Brokerage and pricing failures abort the roll at whichever leg hit them.
pub async fn roll<B, C>(
    controller: &ExecutionController<'_, B, C>,
    direction: RollDirection,
    symbols: &[String],
) -> Result<BatchResults>
where
    B: BrokerageClient + ?Sized,
    C: Clock + ?Sized,
{
    let broker = controller.broker();
    let close = TradeFlow::init_close(broker, symbols).await?;
    let closed_expirations = close.closing_expirations();
    let closed = controller.run(close).await?;

    let windows: BTreeMap<String, ExpirationWindow> = closed
        .iter()
        .filter(|(_, result)| result.is_filled())
        .filter_map(|(symbol, _)| {
            closed_expirations
                .get(symbol)
                .map(|&exp| (symbol.clone(), direction.window(exp)))
        })
        .collect();
    let reopen: Vec<String> = windows.keys().cloned().collect();
    info!(?direction, closed = reopen.len(), "Short calls closed, reopening");
    if reopen.is_empty() {
        return Ok(BatchResults::new());
    }

    let open = TradeFlow::init_open(
        broker,
        controller.config(),
        controller.clock().today(),
        &reopen,
        &windows,
    )
    .await?;
    controller.run(open).await
}
