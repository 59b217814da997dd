use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

use commands::{ChanceArgs, Context, HoldingsArgs, RollArgs, TradeArgs};

#[derive(Parser, Debug)]
#[command(name = "cc-trade")]
#[command(about = "Adaptive covered-call order execution", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true, default_value = cc_trade_core::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Skip the randomized wait between order submission and status checks
    #[arg(long, global = true)]
    no_delay: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sell covered calls (sell) or close short calls (buy)
    Trade(TradeArgs),
    /// Show holdings joined with open option positions
    Holdings(HoldingsArgs),
    /// Close short calls and reopen at a later (out) or earlier (in) expiration
    Roll(RollArgs),
    /// Black-Scholes probability of profit for a short call
    Chance(ChanceArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Trade(args) => {
            let ctx = Context::load(&cli.config, cli.no_delay)?;
            commands::run_trade(args, &ctx).await?;
        }
        Commands::Holdings(args) => commands::run_holdings(args).await?,
        Commands::Roll(args) => {
            let ctx = Context::load(&cli.config, cli.no_delay)?;
            commands::run_roll(args, &ctx).await?;
        }
        Commands::Chance(args) => commands::run_chance(&args)?,
    }

    Ok(())
}
