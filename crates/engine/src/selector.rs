//! Candidate contract search for selling covered calls.

use cc_trade_broker::{BrokerageClient, Contract, ContractQuery, OptionType, ProfitMetric};
use cc_trade_core::{PricingConfig, SelectionConfig};
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::Result;
use crate::pricing::{chance_of_profit, years_to_expiry, ProfitInputs};

/// Ranks sell-to-open candidates for one symbol and expiration.
pub struct ContractSelector<'a, B: BrokerageClient + ?Sized> {
    broker: &'a B,
    selection: &'a SelectionConfig,
    pricing: &'a PricingConfig,
}

impl<'a, B: BrokerageClient + ?Sized> ContractSelector<'a, B> {
    pub fn new(broker: &'a B, selection: &'a SelectionConfig, pricing: &'a PricingConfig) -> Self {
        Self {
            broker,
            selection,
            pricing,
        }
    }

    /// Up to `contracts_per_expiration` out-of-the-money calls, closest to the
    /// target chance of profit first, each worth at least `min_premium`.
    ///
    /// # Errors
    /// Propagates brokerage failures, and pricing errors for contracts whose
    /// chance of profit has to be computed from a degenerate volatility.
    pub async fn candidates(
        &self,
        symbol: &str,
        expiration: NaiveDate,
        reference_price: Decimal,
        today: NaiveDate,
    ) -> Result<Vec<Contract>> {
        let found = self
            .broker
            .find_contracts(&ContractQuery {
                symbol: symbol.to_string(),
                expiration,
                option_type: OptionType::Call,
                metric: ProfitMetric::ChanceOfProfitShort,
                low: self.selection.min_probability,
                high: self.selection.max_probability,
            })
            .await?;
        let total = found.len();

        let mut ranked = Vec::with_capacity(total);
        for contract in found {
            if contract.strike <= reference_price {
                continue;
            }
            let Some(chance) = self.short_chance(&contract, reference_price, today)? else {
                debug!(contract = %contract.display_name(), "No chance of profit available");
                continue;
            };
            if chance < self.selection.min_probability || chance > self.selection.max_probability {
                continue;
            }
            ranked.push((chance, contract));
        }

        let target = self.selection.target_probability;
        ranked.sort_by(|(a, _), (b, _)| (a - target).abs().total_cmp(&(b - target).abs()));

        let picked: Vec<Contract> = ranked
            .into_iter()
            .map(|(_, contract)| contract)
            .filter(|contract| best_premium(contract) >= self.selection.min_premium)
            .take(self.selection.contracts_per_expiration)
            .collect();

        debug!(
            symbol,
            %expiration,
            found = total,
            picked = picked.len(),
            "Ranked covered-call candidates"
        );
        Ok(picked)
    }

    /// Brokerage-reported short chance of profit, or Black-Scholes from the
    /// contract's implied volatility when the brokerage left it blank.
    fn short_chance(
        &self,
        contract: &Contract,
        reference_price: Decimal,
        today: NaiveDate,
    ) -> Result<Option<f64>> {
        if let Some(chance) = contract.chance_of_profit_short {
            return Ok(Some(chance));
        }
        let (Some(vol), Some(stock), Some(strike)) = (
            contract.implied_volatility,
            reference_price.to_f64(),
            contract.strike.to_f64(),
        ) else {
            return Ok(None);
        };
        let chance = chance_of_profit(&ProfitInputs {
            stock_price: stock,
            strike_price: strike,
            implied_vol: vol,
            rate: self.pricing.risk_free_rate,
            div_yield: self.pricing.dividend_yield,
            time: years_to_expiry(today, contract.expiration),
        })?;
        Ok(Some(chance))
    }
}

/// Brokerage high-fill-rate sell price when offered, else the mid.
pub fn best_premium(contract: &Contract) -> Decimal {
    contract
        .high_fill_rate_sell_price
        .unwrap_or_else(|| contract.mid_price())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_trade_broker::{Holding, MinTicks, PaperBroker, PaperSnapshot};
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn expiry() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 11, 20).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn contract(id: &str, strike: Decimal, chance: Option<f64>, bid: Decimal, ask: Decimal) -> Contract {
        Contract {
            id: id.to_string(),
            symbol: "AAPL".to_string(),
            expiration: expiry(),
            strike,
            option_type: OptionType::Call,
            bid,
            ask,
            min_ticks: MinTicks {
                above_tick: dec!(0.05),
                below_tick: dec!(0.05),
                cutoff_price: None,
            },
            chance_of_profit_short: chance,
            chance_of_profit_long: chance.map(|c| 1.0 - c),
            high_fill_rate_sell_price: None,
            implied_volatility: None,
        }
    }

    fn broker(contracts: Vec<Contract>) -> PaperBroker {
        PaperBroker::new(PaperSnapshot {
            holdings: vec![Holding {
                symbol: "AAPL".to_string(),
                instrument_id: "inst-aapl".to_string(),
                quantity: dec!(200),
                price: dec!(180),
            }],
            chains: BTreeMap::from([("AAPL".to_string(), vec![expiry()])]),
            contracts,
            ..PaperSnapshot::default()
        })
    }

    async fn pick(broker: &PaperBroker, reference: Decimal) -> Vec<String> {
        let selection = SelectionConfig::default();
        let pricing = PricingConfig::default();
        ContractSelector::new(broker, &selection, &pricing)
            .candidates("AAPL", expiry(), reference, today())
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect()
    }

    #[tokio::test]
    async fn ranks_by_distance_from_target() {
        let broker = broker(vec![
            contract("p94", dec!(200), Some(0.94), dec!(0.50), dec!(0.60)),
            contract("p87", dec!(190), Some(0.87), dec!(1.00), dec!(1.20)),
            contract("p90", dec!(195), Some(0.90), dec!(0.80), dec!(0.90)),
        ]);
        assert_eq!(pick(&broker, dec!(180)).await, vec!["p87", "p90"]);
    }

    #[tokio::test]
    async fn in_the_money_strikes_are_discarded() {
        let broker = broker(vec![
            contract("itm", dec!(180), Some(0.88), dec!(3.00), dec!(3.20)),
            contract("otm", dec!(190), Some(0.86), dec!(1.00), dec!(1.20)),
        ]);
        assert_eq!(pick(&broker, dec!(180)).await, vec!["otm"]);
    }

    #[tokio::test]
    async fn cheap_premiums_are_discarded() {
        let mut suggested = contract("hint", dec!(195), Some(0.89), dec!(0.01), dec!(0.03));
        suggested.high_fill_rate_sell_price = Some(dec!(0.05));
        let broker = broker(vec![
            contract("cheap", dec!(190), Some(0.88), dec!(0.02), dec!(0.04)),
            suggested,
        ]);
        assert_eq!(pick(&broker, dec!(180)).await, vec!["hint"]);
    }

    #[tokio::test]
    async fn empty_search_yields_empty_list() {
        let broker = broker(vec![contract("p99", dec!(250), Some(0.99), dec!(0.10), dec!(0.20))]);
        assert!(pick(&broker, dec!(180)).await.is_empty());
    }

    #[test]
    fn missing_chance_is_computed_from_implied_volatility() {
        let broker = broker(vec![]);
        let selection = SelectionConfig::default();
        let pricing = PricingConfig::default();
        let selector = ContractSelector::new(&broker, &selection, &pricing);

        let mut c = contract("iv", dec!(200), None, dec!(1.00), dec!(1.20));
        c.implied_volatility = Some(0.30);
        let chance = selector.short_chance(&c, dec!(180), today()).unwrap().unwrap();
        assert!(chance > 0.5 && chance < 1.0);

        c.implied_volatility = None;
        assert!(selector.short_chance(&c, dec!(180), today()).unwrap().is_none());

        c.implied_volatility = Some(0.0);
        assert!(selector.short_chance(&c, dec!(180), today()).is_err());
    }

    #[test]
    fn best_premium_prefers_brokerage_hint() {
        let mut c = contract("x", dec!(190), Some(0.88), dec!(1.00), dec!(1.20));
        assert_eq!(best_premium(&c), dec!(1.10));
        c.high_fill_rate_sell_price = Some(dec!(1.02));
        assert_eq!(best_premium(&c), dec!(1.02));
    }
}
