use std::path::PathBuf;

use anyhow::Result;
use cc_trade_broker::PaperBroker;
use cc_trade_engine::holdings_summary;
use clap::Args;

/// Arguments for the holdings command.
#[derive(Args, Debug)]
pub struct HoldingsArgs {
    /// Paper account snapshot (JSON).
    #[arg(long, env = "CC_TRADE_PAPER")]
    pub paper: PathBuf,

    /// Print JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

pub async fn run_holdings(args: HoldingsArgs) -> Result<()> {
    let broker = PaperBroker::from_json_file(&args.paper)?;
    let rows = holdings_summary(&broker).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!(
        "{:<4} {:<8} {:>10} {:>10} {:>6} {:>10}  {:<4} {:<10} {:>8} {:>7}",
        "#", "SYMBOL", "QTY", "PRICE", "OPEN", "LOOSE", "TYPE", "EXPIRY", "STRIKE", "CHANCE"
    );
    for row in &rows {
        println!(
            "{:<4} {:<8} {:>10} {:>10} {:>6} {:>10}  {:<4} {:<10} {:>8} {:>7}",
            row.key,
            row.symbol,
            opt(row.quantity),
            opt(row.price),
            row.open_contracts,
            row.loose.round_dp(2),
            row.option_type.as_deref().unwrap_or("-"),
            opt(row.expiration),
            opt(row.strike),
            row.chance
                .map_or_else(|| "-".to_string(), |c| format!("{:.1}%", c * 100.0)),
        );
    }
    Ok(())
}

fn opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
