//! End-to-end batches against the paper broker.

use std::collections::BTreeMap;

use cc_trade_broker::{
    AggregatePosition, BrokerError, Contract, Holding, MinTicks, OptionPosition, OptionType,
    OrderSide, OrderState, PaperBroker, PaperSnapshot, PositionLeg, PositionType, StockPosition,
};
use cc_trade_core::AppConfig;
use cc_trade_engine::{
    holdings_summary, roll, ExecutionController, FixedClock, RollDirection, TradeError, TradeKind,
    TradeRequest, TradeResult,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const SHORT_ID: &str = "6f1c2a8e-3b4d-4e5f-9a6b-7c8d9e0f1a2b";
const LATER_ID: &str = "a3d9c0b1-2e4f-4a6b-8c9d-0e1f2a3b4c5d";

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, m, d).unwrap()
}

/// Monday; the current week runs 2026-10-18 through 2026-10-24.
fn today() -> NaiveDate {
    date(10, 19)
}

fn holding(symbol: &str, quantity: Decimal, price: Decimal) -> Holding {
    Holding {
        symbol: symbol.to_string(),
        instrument_id: format!("inst-{symbol}"),
        quantity,
        price,
    }
}

fn call(id: &str, symbol: &str, expiration: NaiveDate, bid: Decimal, ask: Decimal) -> Contract {
    Contract {
        id: id.to_string(),
        symbol: symbol.to_string(),
        expiration,
        strike: dec!(190),
        option_type: OptionType::Call,
        bid,
        ask,
        min_ticks: MinTicks {
            above_tick: dec!(0.05),
            below_tick: dec!(0.05),
            cutoff_price: None,
        },
        chance_of_profit_short: Some(0.88),
        chance_of_profit_long: Some(0.12),
        high_fill_rate_sell_price: None,
        implied_volatility: None,
    }
}

fn snapshot(contracts: Vec<Contract>) -> PaperSnapshot {
    PaperSnapshot {
        holdings: vec![holding("AAPL", dec!(200), dec!(180))],
        chains: BTreeMap::from([(
            "AAPL".to_string(),
            vec![date(10, 23), date(11, 20), date(11, 27)],
        )]),
        contracts,
        ..PaperSnapshot::default()
    }
}

fn symbols(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

async fn sell(broker: &PaperBroker, clock: &FixedClock, list: &[&str]) -> cc_trade_engine::Result<cc_trade_engine::BatchResults> {
    let config = AppConfig::default();
    ExecutionController::new(broker, clock, &config)
        .execute(TradeKind::Sell, &symbols(list))
        .await
}

// ==== Opening Flow Tests ====

#[tokio::test]
async fn first_order_fill_is_the_result() {
    let broker = PaperBroker::new(snapshot(vec![call(
        "c1",
        "AAPL",
        date(11, 20),
        dec!(1.10),
        dec!(1.10),
    )]));
    let clock = FixedClock::new(today());

    let results = sell(&broker, &clock, &["AAPL"]).await.unwrap();

    let order = results["AAPL"].order().expect("filled");
    assert_eq!(order.state, OrderState::Filled);
    assert_eq!(order.price, dec!(1.10));
    assert_eq!(order.quantity, 2);
    assert_eq!(order.expiration, date(11, 20));
    assert_eq!(broker.submitted_orders().len(), 1);
    assert_eq!(broker.quote_requests(), 0);
    assert_eq!(clock.delays(), 1);
}

#[tokio::test]
async fn empty_candidates_exhaust_alongside_a_fill() {
    let mut snap = snapshot(vec![call("c1", "AAPL", date(11, 20), dec!(1.10), dec!(1.10))]);
    snap.holdings.push(holding("MSFT", dec!(100), dec!(400)));
    snap.chains.insert("MSFT".to_string(), vec![date(11, 20)]);
    let broker = PaperBroker::new(snap);
    let clock = FixedClock::new(today());

    let results = sell(&broker, &clock, &["AAPL", "MSFT"]).await.unwrap();

    assert_eq!(results.len(), 2);
    assert!(results["AAPL"].is_filled());
    assert_eq!(results["MSFT"], TradeResult::exhausted());
    assert_eq!(clock.delays(), 1);
    assert_eq!(broker.submitted_orders().len(), 1);
}

#[tokio::test]
async fn current_week_only_chain_is_exhausted_without_orders() {
    let mut snap = snapshot(vec![]);
    snap.chains.insert("AAPL".to_string(), vec![date(10, 23)]);
    let broker = PaperBroker::new(snap);
    let clock = FixedClock::new(today());

    let results = sell(&broker, &clock, &["AAPL"]).await.unwrap();

    assert_eq!(results["AAPL"], TradeResult::exhausted());
    assert_eq!(clock.delays(), 0);
    assert!(broker.submitted_orders().is_empty());
}

#[tokio::test]
async fn price_walks_down_until_bid() {
    // mid 1.10: limits 1.10, 1.05, then 1.00 meets the bid.
    let broker = PaperBroker::new(snapshot(vec![call(
        "c1",
        "AAPL",
        date(11, 20),
        dec!(1.00),
        dec!(1.20),
    )]));
    let clock = FixedClock::new(today());

    let results = sell(&broker, &clock, &["AAPL"]).await.unwrap();

    let prices: Vec<Decimal> = broker.submitted_orders().iter().map(|o| o.price).collect();
    assert_eq!(prices, vec![dec!(1.10), dec!(1.05), dec!(1.00)]);
    assert_eq!(results["AAPL"].order().unwrap().price, dec!(1.00));
    assert_eq!(broker.cancelled_orders().len(), 3);
    assert_eq!(clock.delays(), 3);
}

#[tokio::test]
async fn order_left_open_by_cancel_is_resubmitted_at_same_price() {
    let broker = PaperBroker::new(snapshot(vec![call(
        "c1",
        "AAPL",
        date(11, 20),
        dec!(1.00),
        dec!(1.20),
    )]));
    broker.ignore_cancels(1);
    let clock = FixedClock::new(today());

    let results = sell(&broker, &clock, &["AAPL"]).await.unwrap();

    // The first order stays open, so the cursor holds before walking down.
    let prices: Vec<Decimal> = broker.submitted_orders().iter().map(|o| o.price).collect();
    assert_eq!(prices, vec![dec!(1.10), dec!(1.10), dec!(1.05), dec!(1.00)]);
    assert_eq!(results["AAPL"].order().unwrap().price, dec!(1.00));
    assert_eq!(clock.delays(), 4);
    // No transition after the open order, so no quote refresh for it.
    assert_eq!(broker.quote_requests(), 2);
}

#[tokio::test]
async fn unfillable_candidates_exhaust_within_bound() {
    // mid 1.50, bid 1.00: six walks stay inside 20%, the seventh is rejected,
    // and no walk ever reaches the bid.
    let broker = PaperBroker::new(snapshot(vec![
        call("c1", "AAPL", date(11, 20), dec!(1.00), dec!(2.00)),
        call("c2", "AAPL", date(11, 27), dec!(1.00), dec!(2.00)),
    ]));
    let clock = FixedClock::new(today());

    let results = sell(&broker, &clock, &["AAPL"]).await.unwrap();

    assert_eq!(results["AAPL"], TradeResult::exhausted());
    assert_eq!(broker.submitted_orders().len(), 14);
    assert_eq!(clock.delays(), 14);
    // Every transition except the last refreshes the quote.
    assert_eq!(broker.quote_requests(), 13);
    let last = broker.submitted_orders().last().cloned().unwrap();
    assert_eq!(last.expiration, date(11, 27));
    assert_eq!(last.price, dec!(1.20));
}

#[tokio::test]
async fn unheld_symbols_get_no_result() {
    let broker = PaperBroker::new(snapshot(vec![call(
        "c1",
        "AAPL",
        date(11, 20),
        dec!(1.10),
        dec!(1.10),
    )]));
    let clock = FixedClock::new(today());

    let results = sell(&broker, &clock, &["aapl", "TSLA"]).await.unwrap();

    assert_eq!(results.len(), 1);
    assert!(results.contains_key("AAPL"));
}

#[tokio::test]
async fn broker_failure_aborts_batch() {
    let broker = PaperBroker::new(snapshot(vec![]));
    broker.set_offline(true);
    let clock = FixedClock::new(today());

    let err = sell(&broker, &clock, &["AAPL"]).await.unwrap_err();
    assert!(matches!(err, TradeError::Broker(BrokerError::Network(_))));
}

#[tokio::test]
async fn request_without_symbols_is_invalid() {
    let broker = PaperBroker::new(snapshot(vec![]));
    let clock = FixedClock::new(today());
    let config = AppConfig::default();
    let request: TradeRequest = serde_json::from_str(r#"{"type": "SELL", "symbols": []}"#).unwrap();

    let err = ExecutionController::new(&broker, &clock, &config)
        .execute_request(&request)
        .await
        .unwrap_err();
    assert!(matches!(err, TradeError::InvalidRequest(_)));
}

// ==== Closing Flow Tests ====

fn short_call_snapshot(contracts: Vec<Contract>) -> PaperSnapshot {
    let mut snap = snapshot(contracts);
    snap.chains
        .get_mut("AAPL")
        .unwrap()
        .push(date(12, 4));
    snap.stock_positions = vec![StockPosition {
        instrument_id: "inst-AAPL".to_string(),
        quantity: dec!(200),
        shares_held_for_options_collateral: dec!(100),
    }];
    snap.option_positions = vec![OptionPosition {
        option_id: SHORT_ID.to_string(),
        chain_symbol: "AAPL".to_string(),
        position_type: PositionType::Short,
        quantity: dec!(1),
    }];
    snap.aggregate_positions = vec![AggregatePosition {
        symbol: "AAPL".to_string(),
        quantity: dec!(1),
        strategy: "short_call".to_string(),
        strategy_code: format!("{SHORT_ID}_1s"),
        legs: vec![PositionLeg {
            option: format!("https://paper.local/options/instruments/{SHORT_ID}/"),
            expiration: date(11, 20),
            strike: dec!(190),
        }],
    }];
    snap
}

#[tokio::test]
async fn closing_flow_walks_up_to_ask() {
    // mid 1.10: limits 1.10, 1.15, then 1.20 meets the ask.
    let broker = PaperBroker::new(short_call_snapshot(vec![call(
        SHORT_ID,
        "AAPL",
        date(11, 20),
        dec!(1.00),
        dec!(1.20),
    )]));
    let clock = FixedClock::new(today());
    let config = AppConfig::default();

    let results = ExecutionController::new(&broker, &clock, &config)
        .execute(TradeKind::Buy, &symbols(&["AAPL"]))
        .await
        .unwrap();

    let order = results["AAPL"].order().expect("filled");
    assert_eq!(order.side, OrderSide::Buy);
    assert_eq!(order.price, dec!(1.20));
    assert_eq!(order.quantity, 1);
    assert_eq!(clock.delays(), 3);
    // One quote at init, one after each unfilled order.
    assert_eq!(broker.quote_requests(), 3);

    let after = broker.snapshot();
    assert!(after.aggregate_positions.is_empty());
    assert_eq!(
        after.stock_positions[0].shares_held_for_options_collateral,
        Decimal::ZERO
    );
}

#[tokio::test]
async fn closing_symbols_without_short_calls_are_skipped() {
    let broker = PaperBroker::new(snapshot(vec![]));
    let clock = FixedClock::new(today());
    let config = AppConfig::default();

    let results = ExecutionController::new(&broker, &clock, &config)
        .execute(TradeKind::Buy, &symbols(&["AAPL"]))
        .await
        .unwrap();
    assert!(results.is_empty());
    assert_eq!(clock.delays(), 0);
}

// ==== Roll Tests ====

#[tokio::test]
async fn roll_out_reopens_after_closed_expiration() {
    let broker = PaperBroker::new(short_call_snapshot(vec![
        call(SHORT_ID, "AAPL", date(11, 20), dec!(1.10), dec!(1.10)),
        call(LATER_ID, "AAPL", date(11, 27), dec!(1.10), dec!(1.10)),
    ]));
    let clock = FixedClock::new(today());
    let config = AppConfig::default();
    let controller = ExecutionController::new(&broker, &clock, &config);

    let results = roll(&controller, RollDirection::Out, &symbols(&["AAPL"]))
        .await
        .unwrap();

    let order = results["AAPL"].order().expect("reopened");
    assert_eq!(order.side, OrderSide::Sell);
    assert_eq!(order.expiration, date(11, 27));
    // The closed lot is free again, so both lots are sold.
    assert_eq!(order.quantity, 2);

    let submitted = broker.submitted_orders();
    assert_eq!(submitted.len(), 2);
    assert_eq!(submitted[0].side, OrderSide::Buy);
}

#[tokio::test]
async fn roll_in_without_earlier_expiration_exhausts() {
    let broker = PaperBroker::new(short_call_snapshot(vec![call(
        SHORT_ID,
        "AAPL",
        date(11, 20),
        dec!(1.10),
        dec!(1.10),
    )]));
    let clock = FixedClock::new(today());
    let config = AppConfig::default();
    let controller = ExecutionController::new(&broker, &clock, &config);

    let results = roll(&controller, RollDirection::In, &symbols(&["AAPL"]))
        .await
        .unwrap();

    assert_eq!(results["AAPL"], TradeResult::exhausted());
}

// ==== Holdings Tests ====

#[tokio::test]
async fn holdings_summary_reports_short_call() {
    let broker = PaperBroker::new(short_call_snapshot(vec![call(
        SHORT_ID,
        "AAPL",
        date(11, 20),
        dec!(1.00),
        dec!(1.20),
    )]));

    let rows = holdings_summary(&broker).await.unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].symbol, "AAPL");
    assert_eq!(rows[0].open_contracts, -1);
    assert_eq!(rows[0].expiration, Some(date(11, 20)));
    assert_eq!(rows[0].chance, Some(0.88));
}
