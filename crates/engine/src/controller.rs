//! Batch execution loop.
//!
//! Each iteration submits one order per unresolved symbol, waits once,
//! then cancels and checks every order before any cursor moves. Filled
//! orders become results; everything else goes back through the flow.

use cc_trade_broker::{BrokerageClient, OrderState};
use cc_trade_core::AppConfig;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::error::{Result, TradeError};
use crate::flow::{Submission, TradeFlow};
use crate::types::{BatchResults, TradeKind, TradeRequest, TradeResult};

pub struct ExecutionController<'a, B: BrokerageClient + ?Sized, C: Clock + ?Sized> {
    broker: &'a B,
    clock: &'a C,
    config: &'a AppConfig,
}

impl<'a, B: BrokerageClient + ?Sized, C: Clock + ?Sized> ExecutionController<'a, B, C> {
    pub fn new(broker: &'a B, clock: &'a C, config: &'a AppConfig) -> Self {
        Self {
            broker,
            clock,
            config,
        }
    }

    pub fn broker(&self) -> &'a B {
        self.broker
    }

    pub fn clock(&self) -> &'a C {
        self.clock
    }

    pub fn config(&self) -> &'a AppConfig {
        self.config
    }

    /// Parses and runs a `{"type": ..., "symbols": [...]}` request.
    ///
    /// # Errors
    /// Fails on an empty symbol list or any brokerage failure.
    pub async fn execute_request(&self, request: &TradeRequest) -> Result<BatchResults> {
        if request.symbols.iter().all(|s| s.trim().is_empty()) {
            return Err(TradeError::InvalidRequest("no symbols given".to_string()));
        }
        self.execute(request.kind, &request.symbols).await
    }

    /// Builds the flow for `kind` and runs it to completion.
    ///
    /// # Errors
    /// Brokerage and pricing failures abort the batch.
    pub async fn execute(&self, kind: TradeKind, symbols: &[String]) -> Result<BatchResults> {
        let flow = TradeFlow::init(
            kind,
            self.broker,
            self.config,
            self.clock.today(),
            symbols,
        )
        .await?;
        self.run(flow).await
    }

    /// Drives `flow` until every symbol has a result.
    ///
    /// # Errors
    /// Brokerage failures abort the batch; orders already placed in the
    /// failing iteration are left to the brokerage.
    pub async fn run(&self, mut flow: TradeFlow) -> Result<BatchResults> {
        let kind = flow.kind();
        let max_spread = self.config.pricing.max_spread;
        let mut results = BatchResults::new();

        for symbol in flow.unsearchable() {
            info!(symbol = %symbol, "No expirations to search");
            results.insert(symbol, TradeResult::exhausted());
        }

        let mut iteration = 0usize;
        loop {
            let pending: Vec<String> = flow
                .symbols()
                .into_iter()
                .filter(|s| !results.contains_key(s))
                .collect();
            if pending.is_empty() {
                break;
            }
            iteration += 1;
            debug!(?kind, iteration, pending = pending.len(), "Starting iteration");

            let mut submissions = Vec::with_capacity(pending.len());
            for symbol in pending {
                let submission = flow.submit(self.broker, &symbol).await?;
                submissions.push((symbol, submission));
            }

            self.clock.delay().await;

            for (symbol, submission) in submissions {
                let state = match submission {
                    Submission::Placed(order) => {
                        self.broker.cancel_order(&order.id).await?;
                        let status = self.broker.get_order_status(&order.id).await?;
                        if status.state == OrderState::Filled {
                            info!(
                                symbol = %symbol,
                                order_id = %status.id,
                                price = %status.price,
                                "Order filled"
                            );
                            results.insert(symbol, TradeResult::Filled(status));
                            continue;
                        }
                        status.state
                    }
                    Submission::Skipped => OrderState::Cancelled,
                };

                if state == OrderState::Open {
                    debug!(symbol = %symbol, "Order still open after cancel, resubmitting");
                    continue;
                }
                if let Some(result) = flow.adjust(self.broker, &symbol, max_spread).await? {
                    results.insert(symbol, result);
                }
            }
        }

        info!(
            ?kind,
            iterations = iteration,
            filled = results.values().filter(|r| r.is_filled()).count(),
            total = results.len(),
            "Batch complete"
        );
        Ok(results)
    }
}
