//! Limit-price arithmetic: tick rounding, price walking, and the spread guard.

use cc_trade_broker::Contract;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Tick used when a contract reports a zero or negative increment.
const FALLBACK_TICK: Decimal = dec!(0.01);

/// Direction to round toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundDirection {
    /// Toward positive infinity (ceiling).
    Up,
    /// Toward negative infinity (floor).
    Down,
}

/// Rounds `n` to `decimals` places in the given direction.
pub fn round_to_tick(n: Decimal, decimals: u32, direction: RoundDirection) -> Decimal {
    let strategy = match direction {
        RoundDirection::Up => RoundingStrategy::ToPositiveInfinity,
        RoundDirection::Down => RoundingStrategy::ToNegativeInfinity,
    };
    n.round_dp_with_strategy(decimals, strategy)
}

fn usable_tick(tick: Decimal) -> Decimal {
    if tick > Decimal::ZERO {
        tick
    } else {
        FALLBACK_TICK
    }
}

/// Sell-to-open limit: the mid rounded up onto the below-tick grid, then
/// `offset` ticks lower. Non-increasing in `offset`.
pub fn sell_limit_price(contract: &Contract, offset: u32) -> Decimal {
    let tick = usable_tick(contract.min_ticks.below_tick);
    let price = round_to_tick(contract.mid_price(), 2, RoundDirection::Up);
    let price = (price / tick).ceil() * tick;
    let price = price - tick * Decimal::from(offset);
    round_to_tick(price, 2, RoundDirection::Up)
}

/// Buy-to-close limit: the mid rounded down onto the above-tick grid, then
/// `offset` ticks higher. Non-decreasing in `offset`.
pub fn buy_limit_price(contract: &Contract, offset: u32) -> Decimal {
    let tick = usable_tick(contract.min_ticks.above_tick);
    let price = round_to_tick(contract.mid_price(), 2, RoundDirection::Down);
    let price = (price / tick).floor() * tick;
    let price = price + tick * Decimal::from(offset);
    round_to_tick(price, 2, RoundDirection::Down)
}

/// True when `price` sits more than `max_spread` (as a fraction of `mid`)
/// away from the mid. A zero mid has no meaningful spread and counts as high.
pub fn spread_is_high(mid_price: Decimal, price: Decimal, max_spread: Decimal) -> bool {
    if mid_price.is_zero() {
        return true;
    }
    ((mid_price - price) / mid_price).abs() > max_spread
}
