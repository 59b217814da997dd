//! Runs one buy or sell batch against a paper account.

use std::path::PathBuf;

use anyhow::{bail, Context as _, Result};
use cc_trade_broker::PaperBroker;
use cc_trade_engine::{ExecutionController, TradeKind, TradeRequest};
use clap::Args;
use tracing::info;

use super::Context;

/// Arguments for the trade command.
#[derive(Args, Debug)]
pub struct TradeArgs {
    /// Trade type: sell opens covered calls, buy closes them.
    #[arg(long = "type", value_name = "buy|sell", required_unless_present = "request")]
    pub kind: Option<TradeKind>,

    /// Symbols to trade.
    #[arg(conflicts_with = "request")]
    pub symbols: Vec<String>,

    /// Full request as JSON, e.g. '{"type": "SELL", "symbols": ["AAPL"]}'.
    #[arg(long, conflicts_with = "kind")]
    pub request: Option<String>,

    /// Paper account snapshot (JSON).
    #[arg(long, env = "CC_TRADE_PAPER")]
    pub paper: PathBuf,
}

impl TradeArgs {
    fn to_request(&self) -> Result<TradeRequest> {
        if let Some(json) = &self.request {
            return serde_json::from_str(json).context("Failed to parse --request");
        }
        let Some(kind) = self.kind else {
            bail!("either --type or --request is required");
        };
        Ok(TradeRequest {
            kind,
            symbols: self.symbols.clone(),
        })
    }
}

/// Runs the batch and prints symbol → result as JSON.
pub async fn run_trade(args: TradeArgs, ctx: &Context) -> Result<()> {
    let request = args.to_request()?;
    let broker = PaperBroker::from_json_file(&args.paper)?;
    info!(
        kind = ?request.kind,
        symbols = ?request.symbols,
        paper = %args.paper.display(),
        "Running trade batch"
    );

    let controller = ExecutionController::new(&broker, &*ctx.clock, &ctx.config);
    let results = controller.execute_request(&request).await?;

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(kind: Option<TradeKind>, symbols: &[&str], request: Option<&str>) -> TradeArgs {
        TradeArgs {
            kind,
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            request: request.map(str::to_string),
            paper: PathBuf::from("paper.json"),
        }
    }

    #[test]
    fn request_built_from_flags() {
        let req = args(Some(TradeKind::Sell), &["AAPL"], None).to_request().unwrap();
        assert_eq!(req.kind, TradeKind::Sell);
        assert_eq!(req.symbols, vec!["AAPL"]);
    }

    #[test]
    fn json_request_wins() {
        let req = args(None, &[], Some(r#"{"type": "BUY", "symbols": ["MSFT"]}"#))
            .to_request()
            .unwrap();
        assert_eq!(req.kind, TradeKind::Buy);
        assert_eq!(req.symbols, vec!["MSFT"]);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(args(None, &[], Some("{not json")).to_request().is_err());
        assert!(args(None, &["AAPL"], None).to_request().is_err());
    }
}
