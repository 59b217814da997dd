//! Calendar and pacing collaborator.
//!
//! The controller asks the clock for today's date (expiration filtering) and
//! waits on it once per iteration, between submitting orders and checking
//! them. Tests swap in [`FixedClock`], which never sleeps.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use cc_trade_core::ExecutionConfig;
use chrono::{NaiveDate, Utc};
use rand::Rng;
use tracing::debug;

#[async_trait]
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;

    /// Rate-limit pause between brokerage-facing iterations.
    async fn delay(&self);
}

/// Wall clock with a uniformly random delay in `[min, max)` seconds.
#[derive(Debug, Clone)]
pub struct SystemClock {
    min_secs: f64,
    max_secs: f64,
}

impl SystemClock {
    /// Non-finite or negative bounds collapse onto the nearest usable value:
    /// a bad `min` becomes zero, a bad `max` becomes `min`.
    pub fn new(min_secs: f64, max_secs: f64) -> Self {
        let min_secs = if min_secs.is_finite() { min_secs.max(0.0) } else { 0.0 };
        let max_secs = if max_secs.is_finite() { max_secs.max(min_secs) } else { min_secs };
        Self { min_secs, max_secs }
    }

    pub fn from_config(config: &ExecutionConfig) -> Self {
        Self::new(config.min_delay_secs, config.max_delay_secs)
    }

    fn sample(&self) -> Duration {
        let secs = if self.max_secs > self.min_secs {
            rand::thread_rng().gen_range(self.min_secs..self.max_secs)
        } else {
            self.min_secs
        };
        Duration::from_secs_f64(secs)
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::from_config(&ExecutionConfig::default())
    }
}

#[async_trait]
impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }

    async fn delay(&self) {
        let wait = self.sample();
        debug!(wait_ms = wait.as_millis() as u64, "Pacing before order checks");
        tokio::time::sleep(wait).await;
    }
}

/// Fixed date, no waiting. Counts how many delays were requested.
#[derive(Debug)]
pub struct FixedClock {
    today: NaiveDate,
    delays: AtomicUsize,
}

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            delays: AtomicUsize::new(0),
        }
    }

    pub fn delays(&self) -> usize {
        self.delays.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.today
    }

    async fn delay(&self) {
        self.delays.fetch_add(1, Ordering::Relaxed);
    }
}
