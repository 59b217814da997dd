//! Black-Scholes probability of profit for a short call.

use chrono::NaiveDate;

use crate::error::PricingError;

const DAYS_PER_YEAR: f64 = 365.0;

/// Inputs to the closed-form probability calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfitInputs {
    pub stock_price: f64,
    pub strike_price: f64,
    /// Annualized implied volatility as a decimal (0.30 = 30%).
    pub implied_vol: f64,
    /// Annual risk-free rate as a decimal; may be zero or negative.
    pub rate: f64,
    /// Annual dividend yield as a decimal; may be zero or negative.
    pub div_yield: f64,
    /// Time to expiration in years.
    pub time: f64,
}

impl ProfitInputs {
    fn validate(&self) -> Result<(), PricingError> {
        if self.implied_vol.is_nan() || self.implied_vol <= 0.0 {
            return Err(PricingError::NonPositiveVolatility(self.implied_vol));
        }
        if self.time.is_nan() || self.time <= 0.0 {
            return Err(PricingError::NonPositiveTime(self.time));
        }
        if self.stock_price.is_nan() || self.stock_price <= 0.0 {
            return Err(PricingError::NonPositivePrice {
                name: "stock_price",
                value: self.stock_price,
            });
        }
        if self.strike_price.is_nan() || self.strike_price <= 0.0 {
            return Err(PricingError::NonPositivePrice {
                name: "strike_price",
                value: self.strike_price,
            });
        }
        Ok(())
    }
}

/// d1 term of Black-Scholes.
pub fn d1(inputs: &ProfitInputs) -> f64 {
    let numerator = (inputs.stock_price / inputs.strike_price).ln()
        + (inputs.rate - inputs.div_yield + inputs.implied_vol.powi(2) / 2.0) * inputs.time;
    numerator / (inputs.implied_vol * inputs.time.sqrt())
}

/// d2 term of Black-Scholes.
pub fn d2(d1: f64, implied_vol: f64, time: f64) -> f64 {
    d1 - implied_vol * time.sqrt()
}

/// Standard normal CDF via the error function: Phi(x) = (1 + erf(x / sqrt 2)) / 2.
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + libm::erf(x / std::f64::consts::SQRT_2))
}

/// Probability that a short call expires out of the money: `1 - Phi(d2)`.
///
/// # Errors
/// Returns [`PricingError`] when volatility, time, or either price is not
/// strictly positive.
pub fn chance_of_profit(inputs: &ProfitInputs) -> Result<f64, PricingError> {
    inputs.validate()?;
    let d1 = d1(inputs);
    let d2 = d2(d1, inputs.implied_vol, inputs.time);
    Ok((1.0 - normal_cdf(d2)).clamp(0.0, 1.0))
}

/// Calendar time from `today` until `expiration`, in years.
pub fn years_to_expiry(today: NaiveDate, expiration: NaiveDate) -> f64 {
    (expiration - today).num_days() as f64 / DAYS_PER_YEAR
}
