use std::path::PathBuf;

use anyhow::Result;
use cc_trade_broker::PaperBroker;
use cc_trade_engine::{roll, ExecutionController, RollDirection};
use clap::Args;
use tracing::info;

use super::Context;

/// Arguments for the roll command.
#[derive(Args, Debug)]
pub struct RollArgs {
    /// out: later expiration, in: earlier expiration.
    #[arg(long, value_name = "out|in")]
    pub direction: RollDirection,

    /// Symbols whose short calls to roll.
    #[arg(required = true)]
    pub symbols: Vec<String>,

    /// Paper account snapshot (JSON).
    #[arg(long, env = "CC_TRADE_PAPER")]
    pub paper: PathBuf,
}

pub async fn run_roll(args: RollArgs, ctx: &Context) -> Result<()> {
    let broker = PaperBroker::from_json_file(&args.paper)?;
    info!(direction = ?args.direction, symbols = ?args.symbols, "Rolling short calls");

    let controller = ExecutionController::new(&broker, &*ctx.clock, &ctx.config);
    let results = roll(&controller, args.direction, &args.symbols).await?;

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
