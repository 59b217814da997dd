use anyhow::Result;
use cc_trade_engine::{chance_of_profit, ProfitInputs};
use clap::Args;

/// Arguments for the chance command.
#[derive(Args, Debug)]
pub struct ChanceArgs {
    /// Current share price.
    #[arg(long)]
    pub stock_price: f64,

    /// Call strike.
    #[arg(long)]
    pub strike: f64,

    /// Implied volatility as a fraction (0.30 = 30%).
    #[arg(long)]
    pub vol: f64,

    /// Time to expiry in years.
    #[arg(long)]
    pub time: f64,

    /// Risk-free rate.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub rate: f64,

    /// Continuous dividend yield.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub dividend: f64,
}

impl ChanceArgs {
    fn inputs(&self) -> ProfitInputs {
        ProfitInputs {
            stock_price: self.stock_price,
            strike_price: self.strike,
            implied_vol: self.vol,
            rate: self.rate,
            div_yield: self.dividend,
            time: self.time,
        }
    }
}

pub fn run_chance(args: &ChanceArgs) -> Result<()> {
    let chance = chance_of_profit(&args.inputs())?;
    println!("{:.2}%", chance * 100.0);
    Ok(())
}
