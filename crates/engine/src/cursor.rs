//! Per-symbol search position through expirations, contracts, and price offsets.

use cc_trade_broker::{Contract, LimitOrderRequest};
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::ticks::{buy_limit_price, sell_limit_price, spread_is_high};

/// `(expiration, contract, offset)` indices into a [`TradeCursor`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CursorPosition {
    pub expiration: usize,
    pub contract: usize,
    /// Ticks walked away from the mid toward a fill.
    pub offset: u32,
}

/// What the opening flow did after an unfilled order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Same contract, one tick more aggressive.
    WalkPrice,
    /// Next-ranked contract at the same expiration.
    NextContract,
    /// First contract of the next expiration.
    NextExpiration,
    /// No candidates left.
    Exhausted,
}

/// Sell-to-open search state for one symbol.
#[derive(Debug, Clone)]
pub struct TradeCursor {
    pub symbol: String,
    pub expirations: Vec<NaiveDate>,
    /// Ranked candidates, one list per expiration (lists may be empty).
    pub contracts: Vec<Vec<Contract>>,
    pub position: CursorPosition,
    pub quantity: u32,
    /// Share price the candidates were selected against.
    pub reference_price: Decimal,
}

impl TradeCursor {
    pub fn new(
        symbol: impl Into<String>,
        expirations: Vec<NaiveDate>,
        contracts: Vec<Vec<Contract>>,
        quantity: u32,
        reference_price: Decimal,
    ) -> Self {
        debug_assert_eq!(expirations.len(), contracts.len());
        Self {
            symbol: symbol.into(),
            expirations,
            contracts,
            position: CursorPosition::default(),
            quantity,
            reference_price,
        }
    }

    /// True when there is no expiration to search at all.
    pub fn is_empty(&self) -> bool {
        self.expirations.is_empty()
    }

    fn is_last_expiration(&self) -> bool {
        self.position.expiration + 1 >= self.expirations.len()
    }

    /// Contract under the cursor, or `None` when the current expiration has
    /// no candidates.
    pub fn current(&self) -> Option<&Contract> {
        self.contracts
            .get(self.position.expiration)?
            .get(self.position.contract)
    }

    /// Replaces the contract under the cursor with a fresher snapshot.
    pub fn replace_current(&mut self, contract: Contract) {
        let CursorPosition {
            expiration,
            contract: idx,
            ..
        } = self.position;
        if let Some(slot) = self
            .contracts
            .get_mut(expiration)
            .and_then(|list| list.get_mut(idx))
        {
            *slot = contract;
        }
    }

    /// Sell-to-open order at the cursor, if there is a contract to sell.
    pub fn order_request(&self) -> Option<LimitOrderRequest> {
        let contract = self.current()?;
        let price = sell_limit_price(contract, self.position.offset);
        Some(LimitOrderRequest::sell_to_open(contract, price, self.quantity))
    }

    /// Advances the cursor after an order that did not fill.
    ///
    /// An empty candidate list is checked before any price walk; the spread
    /// guard is only consulted after a walk on a non-empty list.
    pub fn on_unfilled(&mut self, max_spread: Decimal) -> Transition {
        let expiration = self.position.expiration;
        let candidates = self.contracts.get(expiration).map_or(0, Vec::len);

        if candidates == 0 {
            if self.is_last_expiration() {
                return Transition::Exhausted;
            }
            self.position = CursorPosition {
                expiration: expiration + 1,
                contract: 0,
                offset: 0,
            };
            return Transition::NextExpiration;
        }

        self.position.offset += 1;
        let Some(contract) = self.current() else {
            return Transition::Exhausted;
        };
        let price = sell_limit_price(contract, self.position.offset);
        if !spread_is_high(contract.mid_price(), price, max_spread) {
            return Transition::WalkPrice;
        }

        self.position.offset = 0;
        if self.position.contract + 1 >= candidates {
            self.position.contract = 0;
            if self.is_last_expiration() {
                return Transition::Exhausted;
            }
            self.position.expiration += 1;
            return Transition::NextExpiration;
        }
        self.position.contract += 1;
        Transition::NextContract
    }
}

/// Buy-to-close state for one short call.
#[derive(Debug, Clone)]
pub struct ClosingCursor {
    pub symbol: String,
    pub option_id: String,
    pub quantity: u32,
    /// Live snapshot, re-fetched after every unfilled order.
    pub contract: Contract,
    pub offset: u32,
}

impl ClosingCursor {
    pub fn new(symbol: impl Into<String>, option_id: impl Into<String>, quantity: u32, contract: Contract) -> Self {
        Self {
            symbol: symbol.into(),
            option_id: option_id.into(),
            quantity,
            contract,
            offset: 0,
        }
    }

    pub fn order_request(&self) -> LimitOrderRequest {
        let price = buy_limit_price(&self.contract, self.offset);
        LimitOrderRequest::buy_to_close(&self.contract, price, self.quantity)
    }

    /// Walks the bid one tick higher. Returns whether the new price is outside
    /// the spread guard; the closing flow reports it but keeps walking.
    pub fn on_unfilled(&mut self, max_spread: Decimal) -> bool {
        self.offset += 1;
        let price = buy_limit_price(&self.contract, self.offset);
        spread_is_high(self.contract.mid_price(), price, max_spread)
    }
}
