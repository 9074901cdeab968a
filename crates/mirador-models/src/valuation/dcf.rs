//! Discounted cash flow valuation model.
//!
//! Projects free cash flows with a decaying growth rate, discounts them plus
//! a Gordon-growth terminal value back to present, and turns the resulting
//! fair value into a signal, a sensitivity grid and a bear/base/bull
//! scenario blend.

use serde::{Deserialize, Serialize};
use tracing::warn;

use mirador_traits::{
    DegradeReason, Evaluation, FundamentalSnapshot, IndicatorModel, ModelInput, Signal,
};

/// Configuration for the DCF model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcfConfig {
    /// Number of years to project cash flows.
    pub projection_years: usize,
    /// Long-term growth rate for the terminal value.
    pub terminal_growth: f64,
    /// Discount rate (WACC).
    pub discount_rate: f64,
    /// Expected first-year free cash flow growth rate.
    pub growth_rate: f64,
}

impl Default for DcfConfig {
    fn default() -> Self {
        Self {
            projection_years: 5,
            terminal_growth: 0.025,
            discount_rate: 0.10,
            growth_rate: 0.05,
        }
    }
}

/// Valuation zone classification of the price-to-fair-value ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValuationZone {
    /// Price below 70% of fair value.
    DeepValue,
    /// Price below 90% of fair value.
    Undervalued,
    /// Price within 10% of fair value.
    FairValue,
    /// Price up to 30% above fair value.
    Overvalued,
    /// Price more than 30% above fair value.
    Expensive,
}

impl ValuationZone {
    /// Classifies a price-to-fair-value ratio.
    #[must_use]
    pub fn from_ratio(price_to_fair: f64) -> Self {
        if price_to_fair < 0.7 {
            Self::DeepValue
        } else if price_to_fair < 0.9 {
            Self::Undervalued
        } else if price_to_fair < 1.1 {
            Self::FairValue
        } else if price_to_fair < 1.3 {
            Self::Overvalued
        } else {
            Self::Expensive
        }
    }
}

/// Auxiliary valuation tags emitted alongside the primary signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValuationTag {
    /// Upside above 50%.
    DeeplyUndervalued,
    /// Downside beyond -50%.
    DeeplyOvervalued,
    /// Upside within 5% of zero.
    FairlyValued,
    /// Upside above 15%.
    ValueOpportunity,
    /// Downside beyond -15%.
    OvervaluationRisk,
}

/// One cell of the growth-by-discount sensitivity grid.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SensitivityCell {
    /// Growth rate used for this cell.
    pub growth_rate: f64,
    /// Discount rate used for this cell.
    pub discount_rate: f64,
    /// Resulting fair value per share.
    pub fair_value: f64,
    /// Upside versus the current price, in percent.
    pub upside_pct: f64,
}

/// Outcome of one scenario (bear, base or bull).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    /// Growth rate assumed by the scenario.
    pub growth_rate: f64,
    /// Discount rate assumed by the scenario.
    pub discount_rate: f64,
    /// Terminal growth assumed by the scenario.
    pub terminal_growth: f64,
    /// Resulting fair value per share.
    pub fair_value: f64,
    /// Upside versus the current price, in percent.
    pub upside_pct: f64,
    /// Weight in the blended fair value.
    pub probability: f64,
}

/// Bear/base/bull scenario analysis with an equal-weight blend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScenarioAnalysis {
    /// Pessimistic case: half the growth, higher discount, reduced terminal.
    pub bear: ScenarioOutcome,
    /// Baseline assumptions.
    pub base: ScenarioOutcome,
    /// Optimistic case: 1.5x growth, lower discount, raised terminal.
    pub bull: ScenarioOutcome,
    /// Probability-weighted fair value across the three cases.
    pub weighted_fair_value: f64,
    /// Upside of the weighted fair value versus the current price.
    pub weighted_upside_pct: f64,
}

/// Valuation multiples implied by the DCF fair value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ValuationMultiples {
    /// Current price over fair value.
    pub price_to_fair_value: f64,
    /// Fair value over revenue per share, when revenue is known.
    pub implied_price_to_sales: Option<f64>,
    /// Price over revenue per share, when revenue is known.
    pub current_price_to_sales: Option<f64>,
    /// Fair value over FCF per share.
    pub implied_price_to_fcf: Option<f64>,
    /// Price over FCF per share.
    pub current_price_to_fcf: Option<f64>,
}

/// Result of a DCF evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcfResult {
    /// Fair value per share.
    pub fair_value_per_share: f64,
    /// Present value of projected flows plus terminal value.
    pub enterprise_value: f64,
    /// Enterprise value less net debt plus cash, floored at zero.
    pub equity_value: f64,
    /// Gordon-growth terminal value (undiscounted).
    pub terminal_value: f64,
    /// Present value of the terminal value.
    pub pv_terminal: f64,
    /// Upside versus the current price, in percent.
    pub upside_pct: f64,
    /// Projected free cash flows, one per year.
    pub projected_fcf: Vec<f64>,
    /// Present values of the projected flows.
    pub present_values: Vec<f64>,
    /// Growth rate used.
    pub growth_rate: f64,
    /// Discount rate actually used (after the terminal-growth guard).
    pub discount_rate: f64,
    /// Terminal growth rate used.
    pub terminal_growth: f64,
    /// Close price the valuation was compared against.
    pub current_price: f64,
    /// Primary valuation signal.
    pub signal: Signal,
    /// Auxiliary tags.
    pub tags: Vec<ValuationTag>,
    /// Valuation zone of the current price.
    pub valuation_zone: ValuationZone,
    /// Growth-by-discount sensitivity grid (cells with an invalid discount
    /// rate are skipped).
    pub sensitivity: Vec<SensitivityCell>,
    /// Bear/base/bull scenario analysis.
    pub scenarios: ScenarioAnalysis,
    /// Implied valuation multiples.
    pub multiples: ValuationMultiples,
    /// Data-sufficiency confidence score in [0, 1].
    pub confidence: f64,
    /// Human-readable summary.
    pub interpretation: String,
}

/// Resolved financial inputs with documented defaults in place of missing
/// fields.
#[derive(Debug, Clone, Copy)]
struct Financials {
    free_cash_flow: f64,
    shares_outstanding: f64,
    net_debt: f64,
    cash: f64,
    revenue: Option<f64>,
    has_net_debt: bool,
    has_cash: bool,
}

impl Financials {
    /// Fills gaps with industry-average estimates: with no snapshot at all,
    /// market cap is taken as price x 1e9 shares, revenue as 1.2x market cap,
    /// FCF as a 15% revenue margin and cash as 10% of revenue.
    fn resolve(current_price: f64, snapshot: Option<&FundamentalSnapshot>) -> Self {
        match snapshot {
            Some(s) => {
                let shares = match s.shares_outstanding {
                    Some(v) if v > 0.0 => v,
                    _ => 1e9,
                };
                let fcf = match s.free_cash_flow {
                    Some(v) if v > 0.0 => v,
                    _ => current_price * 1e8,
                };
                Self {
                    free_cash_flow: fcf,
                    shares_outstanding: shares,
                    net_debt: s.net_debt.unwrap_or(0.0),
                    cash: s.cash.unwrap_or(0.0),
                    revenue: s.revenue.filter(|&r| r > 0.0),
                    has_net_debt: s.net_debt.is_some(),
                    has_cash: s.cash.is_some(),
                }
            }
            None => {
                let market_cap = current_price * 1e9;
                let revenue = market_cap * 1.2;
                Self {
                    free_cash_flow: revenue * 0.15,
                    shares_outstanding: 1e9,
                    net_debt: 0.0,
                    cash: revenue * 0.1,
                    revenue: Some(revenue),
                    has_net_debt: false,
                    has_cash: false,
                }
            }
        }
    }

    fn equity_value(&self, enterprise_value: f64) -> f64 {
        // Equity value cannot be negative.
        (enterprise_value - self.net_debt + self.cash).max(0.0)
    }
}

/// Discounted cash flow valuation calculator.
#[derive(Debug, Clone)]
pub struct DcfModel {
    config: DcfConfig,
}

impl DcfModel {
    /// Creates a DCF model with the given configuration.
    #[must_use]
    pub const fn new(config: DcfConfig) -> Self {
        Self { config }
    }

    /// The model configuration.
    #[must_use]
    pub const fn config(&self) -> &DcfConfig {
        &self.config
    }

    /// Fair value per share for a constant-growth projection. Used by the
    /// sensitivity grid and scenario analysis; the headline valuation uses
    /// the decaying-growth projection instead.
    fn quick_fair_value(
        &self,
        fin: &Financials,
        growth_rate: f64,
        discount_rate: f64,
        terminal_growth: f64,
    ) -> f64 {
        let years = self.config.projection_years.max(1);
        let projected: Vec<f64> = (1..=years)
            .map(|year| fin.free_cash_flow * (1.0 + growth_rate).powi(year as i32))
            .collect();
        let final_fcf = projected[projected.len() - 1];
        let terminal_value = final_fcf * (1.0 + terminal_growth) / (discount_rate - terminal_growth);

        let pv_fcf: f64 = projected
            .iter()
            .enumerate()
            .map(|(i, fcf)| fcf / (1.0 + discount_rate).powi(i as i32 + 1))
            .sum();
        let pv_terminal = terminal_value / (1.0 + discount_rate).powi(years as i32);

        fin.equity_value(pv_fcf + pv_terminal) / fin.shares_outstanding
    }

    fn sensitivity_grid(
        &self,
        fin: &Financials,
        discount_rate: f64,
        current_price: f64,
    ) -> Vec<SensitivityCell> {
        let growth_rates = [
            self.config.growth_rate - 0.02,
            self.config.growth_rate,
            self.config.growth_rate + 0.02,
        ];
        let discount_rates = [discount_rate - 0.01, discount_rate, discount_rate + 0.01];

        let mut cells = Vec::with_capacity(9);
        for &gr in &growth_rates {
            for &dr in &discount_rates {
                if dr <= self.config.terminal_growth {
                    continue;
                }
                let fair_value = self.quick_fair_value(fin, gr, dr, self.config.terminal_growth);
                cells.push(SensitivityCell {
                    growth_rate: gr,
                    discount_rate: dr,
                    fair_value,
                    upside_pct: upside_pct(fair_value, current_price),
                });
            }
        }
        cells
    }

    fn scenario_analysis(
        &self,
        fin: &Financials,
        discount_rate: f64,
        current_price: f64,
    ) -> ScenarioAnalysis {
        // (growth multiplier, discount add, terminal multiplier)
        let presets = [(0.5, 0.02, 0.8), (1.0, 0.0, 1.0), (1.5, -0.01, 1.2)];

        let outcomes = presets.map(|(growth_mult, discount_add, terminal_mult)| {
            let growth = self.config.growth_rate * growth_mult;
            let terminal = self.config.terminal_growth * terminal_mult;
            let discount = (discount_rate + discount_add).max(terminal + 0.01);
            let fair_value = self.quick_fair_value(fin, growth, discount, terminal);
            ScenarioOutcome {
                growth_rate: growth,
                discount_rate: discount,
                terminal_growth: terminal,
                fair_value,
                upside_pct: upside_pct(fair_value, current_price),
                probability: 1.0 / 3.0,
            }
        });

        let weighted_fair_value: f64 = outcomes.iter().map(|o| o.fair_value * o.probability).sum();
        ScenarioAnalysis {
            bear: outcomes[0],
            base: outcomes[1],
            bull: outcomes[2],
            weighted_fair_value,
            weighted_upside_pct: upside_pct(weighted_fair_value, current_price),
        }
    }

    fn multiples(&self, fin: &Financials, fair_value: f64, current_price: f64) -> ValuationMultiples {
        let shares = fin.shares_outstanding;
        let per_share = |total: f64| total / shares;

        let (implied_ps, current_ps) = match fin.revenue {
            Some(revenue) if revenue > 0.0 => {
                let rps = per_share(revenue);
                (Some(fair_value / rps), Some(current_price / rps))
            }
            _ => (None, None),
        };

        let (implied_p_fcf, current_p_fcf) = if fin.free_cash_flow > 0.0 {
            let fcf_ps = per_share(fin.free_cash_flow);
            (Some(fair_value / fcf_ps), Some(current_price / fcf_ps))
        } else {
            (None, None)
        };

        ValuationMultiples {
            price_to_fair_value: if fair_value > 0.0 {
                current_price / fair_value
            } else {
                f64::INFINITY
            },
            implied_price_to_sales: implied_ps,
            current_price_to_sales: current_ps,
            implied_price_to_fcf: implied_p_fcf,
            current_price_to_fcf: current_p_fcf,
        }
    }

    fn confidence(&self, fin: &Financials, bars: usize) -> f64 {
        let mut confidence: f64 = 0.5;
        if fin.revenue.is_some() {
            confidence += 0.1;
        }
        if fin.has_net_debt {
            confidence += 0.1;
        }
        if fin.has_cash {
            confidence += 0.1;
        }
        if bars >= 252 {
            confidence += 0.1;
        }
        if bars >= 1260 {
            confidence += 0.1;
        }
        confidence.min(0.95)
    }

    fn fallback(reason: String) -> Evaluation<DcfResult> {
        let empty_outcome = ScenarioOutcome {
            growth_rate: 0.0,
            discount_rate: 0.0,
            terminal_growth: 0.0,
            fair_value: 0.0,
            upside_pct: 0.0,
            probability: 1.0 / 3.0,
        };
        Evaluation::Degraded {
            result: DcfResult {
                fair_value_per_share: 0.0,
                enterprise_value: 0.0,
                equity_value: 0.0,
                terminal_value: 0.0,
                pv_terminal: 0.0,
                upside_pct: 0.0,
                projected_fcf: Vec::new(),
                present_values: Vec::new(),
                growth_rate: 0.0,
                discount_rate: 0.0,
                terminal_growth: 0.0,
                current_price: 0.0,
                signal: Signal::Hold,
                tags: Vec::new(),
                valuation_zone: ValuationZone::FairValue,
                sensitivity: Vec::new(),
                scenarios: ScenarioAnalysis {
                    bear: empty_outcome,
                    base: empty_outcome,
                    bull: empty_outcome,
                    weighted_fair_value: 0.0,
                    weighted_upside_pct: 0.0,
                },
                multiples: ValuationMultiples {
                    price_to_fair_value: 0.0,
                    implied_price_to_sales: None,
                    current_price_to_sales: None,
                    implied_price_to_fcf: None,
                    current_price_to_fcf: None,
                },
                confidence: 0.0,
                interpretation: "DCF calculation failed".to_string(),
            },
            reason: DegradeReason::Fallback(reason),
        }
    }
}

impl Default for DcfModel {
    fn default() -> Self {
        Self::new(DcfConfig::default())
    }
}

impl IndicatorModel for DcfModel {
    type Output = DcfResult;

    fn name(&self) -> &str {
        "dcf"
    }

    fn min_history(&self) -> usize {
        1
    }

    fn requires_fundamentals(&self) -> bool {
        true
    }

    fn evaluate(&self, input: &ModelInput<'_>) -> Evaluation<DcfResult> {
        let Some(current_price) = input.prices.last_close() else {
            return Self::fallback("empty price series".to_string());
        };

        let cfg = &self.config;
        let years = cfg.projection_years.max(1);

        // Gordon Growth requires discount rate strictly above terminal growth.
        let mut discount_rate = cfg.discount_rate;
        if discount_rate <= cfg.terminal_growth {
            discount_rate = cfg.terminal_growth + 0.02;
            warn!(
                adjusted = discount_rate,
                terminal_growth = cfg.terminal_growth,
                "adjusted discount rate to exceed terminal growth"
            );
        }

        let fin = Financials::resolve(current_price, input.fundamentals);

        // Project free cash flows with a growth rate that decays 5% per year.
        let projected_fcf: Vec<f64> = (1..=years)
            .map(|year| {
                let adjusted_growth = cfg.growth_rate * 0.95f64.powi(year as i32 - 1);
                fin.free_cash_flow * (1.0 + adjusted_growth).powi(year as i32)
            })
            .collect();

        let final_fcf = projected_fcf[projected_fcf.len() - 1];
        let terminal_value =
            final_fcf * (1.0 + cfg.terminal_growth) / (discount_rate - cfg.terminal_growth);

        let present_values: Vec<f64> = projected_fcf
            .iter()
            .enumerate()
            .map(|(i, fcf)| fcf / (1.0 + discount_rate).powi(i as i32 + 1))
            .collect();
        let pv_terminal = terminal_value / (1.0 + discount_rate).powi(years as i32);

        let enterprise_value = present_values.iter().sum::<f64>() + pv_terminal;
        let equity_value = fin.equity_value(enterprise_value);
        let fair_value_per_share = equity_value / fin.shares_outstanding;

        let upside = upside_pct(fair_value_per_share, current_price);
        let signal = Signal::from_upside_pct(upside);

        let mut tags = Vec::new();
        if upside > 50.0 {
            tags.push(ValuationTag::DeeplyUndervalued);
        } else if upside < -50.0 {
            tags.push(ValuationTag::DeeplyOvervalued);
        }
        if upside.abs() < 5.0 {
            tags.push(ValuationTag::FairlyValued);
        }
        if upside > 15.0 {
            tags.push(ValuationTag::ValueOpportunity);
        } else if upside < -15.0 {
            tags.push(ValuationTag::OvervaluationRisk);
        }

        let result = DcfResult {
            fair_value_per_share,
            enterprise_value,
            equity_value,
            terminal_value,
            pv_terminal,
            upside_pct: upside,
            projected_fcf,
            present_values,
            growth_rate: cfg.growth_rate,
            discount_rate,
            terminal_growth: cfg.terminal_growth,
            current_price,
            signal,
            tags,
            valuation_zone: ValuationZone::from_ratio(if fair_value_per_share > 0.0 {
                current_price / fair_value_per_share
            } else {
                f64::INFINITY
            }),
            sensitivity: self.sensitivity_grid(&fin, discount_rate, current_price),
            scenarios: self.scenario_analysis(&fin, discount_rate, current_price),
            multiples: self.multiples(&fin, fair_value_per_share, current_price),
            confidence: self.confidence(&fin, input.prices.len()),
            interpretation: interpret(upside),
        };

        if input.fundamentals.is_none() {
            Evaluation::Degraded {
                result,
                reason: DegradeReason::MissingFundamentals,
            }
        } else {
            Evaluation::Computed(result)
        }
    }
}

fn upside_pct(fair_value: f64, current_price: f64) -> f64 {
    (fair_value - current_price) / current_price * 100.0
}

fn interpret(upside_pct: f64) -> String {
    let text = if upside_pct > 30.0 {
        "Significantly undervalued with strong upside potential"
    } else if upside_pct > 15.0 {
        "Undervalued with moderate upside potential"
    } else if upside_pct > -15.0 {
        "Fairly valued with limited upside/downside"
    } else if upside_pct > -30.0 {
        "Overvalued with moderate downside risk"
    } else {
        "Significantly overvalued with high downside risk"
    };
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mirador_traits::{MarketContext, PriceSeries};

    fn price_series(price: f64, bars: usize) -> PriceSeries {
        PriceSeries::from_closes(vec![price; bars]).unwrap()
    }

    fn sample_snapshot() -> FundamentalSnapshot {
        FundamentalSnapshot {
            free_cash_flow: Some(5e9),
            shares_outstanding: Some(1e9),
            net_debt: Some(2e9),
            cash: Some(10e9),
            ..Default::default()
        }
    }

    fn evaluate(model: &DcfModel, prices: &PriceSeries, snapshot: &FundamentalSnapshot) -> DcfResult {
        let market = MarketContext::default();
        let input = ModelInput::new(prices, snapshot, &market);
        model.evaluate(&input).into_result()
    }

    #[test]
    fn test_default_config() {
        let config = DcfConfig::default();
        assert_eq!(config.projection_years, 5);
        assert_relative_eq!(config.terminal_growth, 0.025);
        assert_relative_eq!(config.discount_rate, 0.10);
        assert_relative_eq!(config.growth_rate, 0.05);
    }

    #[test]
    fn test_end_to_end_valuation() {
        let model = DcfModel::default();
        let prices = price_series(100.0, 300);
        let result = evaluate(&model, &prices, &sample_snapshot());

        assert!(result.fair_value_per_share > 0.0);
        assert!(result.fair_value_per_share.is_finite());
        assert!(result.enterprise_value > 0.0);
        // fcf 5e9 over 1e9 shares at these rates lands in the sell band
        assert_eq!(result.signal, Signal::Sell);
        assert!(result.confidence >= 0.5 && result.confidence <= 0.95);
        assert_eq!(result.projected_fcf.len(), 5);
        assert_eq!(result.present_values.len(), 5);
    }

    #[test]
    fn test_fair_value_monotonic_in_fcf() {
        let model = DcfModel::default();
        let prices = price_series(100.0, 300);

        let mut previous = 0.0;
        for fcf in [1e9, 2e9, 5e9, 10e9] {
            let snapshot = FundamentalSnapshot {
                free_cash_flow: Some(fcf),
                ..sample_snapshot()
            };
            let result = evaluate(&model, &prices, &snapshot);
            assert!(
                result.fair_value_per_share > previous,
                "fair value must strictly increase with free cash flow"
            );
            previous = result.fair_value_per_share;
        }
    }

    #[test]
    fn test_discount_rate_guard() {
        let model = DcfModel::new(DcfConfig {
            discount_rate: 0.02, // at or below terminal growth
            terminal_growth: 0.025,
            ..DcfConfig::default()
        });
        let prices = price_series(100.0, 300);
        let result = evaluate(&model, &prices, &sample_snapshot());

        assert!(result.discount_rate > result.terminal_growth);
        assert_relative_eq!(result.discount_rate, 0.045);
        assert!(result.fair_value_per_share.is_finite());
        assert!(result.terminal_value.is_finite());
        assert!(result.enterprise_value.is_finite());
    }

    #[test]
    fn test_gordon_growth_closed_form() {
        let model = DcfModel::default();
        let prices = price_series(100.0, 300);
        let result = evaluate(&model, &prices, &sample_snapshot());

        let final_fcf = *result.projected_fcf.last().unwrap();
        let expected = final_fcf * (1.0 + result.terminal_growth)
            / (result.discount_rate - result.terminal_growth);
        assert_relative_eq!(result.terminal_value, expected);
    }

    #[test]
    fn test_equity_value_floor() {
        let snapshot = FundamentalSnapshot {
            free_cash_flow: Some(1e6),
            shares_outstanding: Some(1e9),
            net_debt: Some(1e12), // debt dwarfs the cash flows
            cash: Some(0.0),
            ..Default::default()
        };
        let model = DcfModel::default();
        let prices = price_series(100.0, 300);
        let result = evaluate(&model, &prices, &snapshot);

        assert_eq!(result.equity_value, 0.0);
        assert_eq!(result.fair_value_per_share, 0.0);
    }

    #[test]
    fn test_sensitivity_grid_skips_invalid_cells() {
        let model = DcfModel::new(DcfConfig {
            discount_rate: 0.03,
            terminal_growth: 0.025,
            ..DcfConfig::default()
        });
        let prices = price_series(100.0, 300);
        let result = evaluate(&model, &prices, &sample_snapshot());

        // the dr - 0.01 column lands at or below terminal growth and is dropped
        assert!(result.sensitivity.len() < 9);
        for cell in &result.sensitivity {
            assert!(cell.discount_rate > 0.025);
            assert!(cell.fair_value.is_finite());
        }
    }

    #[test]
    fn test_scenario_blend_is_equal_weight() {
        let model = DcfModel::default();
        let prices = price_series(100.0, 300);
        let result = evaluate(&model, &prices, &sample_snapshot());

        let scenarios = &result.scenarios;
        let expected = (scenarios.bear.fair_value
            + scenarios.base.fair_value
            + scenarios.bull.fair_value)
            / 3.0;
        assert_relative_eq!(scenarios.weighted_fair_value, expected, epsilon = 1e-9);
        assert!(scenarios.bull.fair_value > scenarios.bear.fair_value);
    }

    #[test]
    fn test_missing_fundamentals_degrades() {
        let model = DcfModel::default();
        let prices = price_series(100.0, 300);
        let market = MarketContext::default();
        let input = ModelInput::from_prices(&prices, &market);

        let outcome = model.evaluate(&input);
        assert!(outcome.is_degraded());
        assert_eq!(outcome.reason(), Some(&DegradeReason::MissingFundamentals));
        // estimated financials still produce a usable valuation
        assert!(outcome.result().fair_value_per_share > 0.0);
    }

    #[test]
    fn test_empty_series_falls_back() {
        let model = DcfModel::default();
        let prices = PriceSeries::from_closes(vec![]).unwrap();
        let market = MarketContext::default();
        let input = ModelInput::from_prices(&prices, &market);

        let outcome = model.evaluate(&input);
        assert!(outcome.is_degraded());
        assert_eq!(outcome.result().confidence, 0.0);
        assert_eq!(outcome.result().signal, Signal::Hold);
    }

    #[test]
    fn test_confidence_additivity() {
        let model = DcfModel::default();

        // net debt + cash supplied, short history: 0.5 + 0.1 + 0.1
        let result = evaluate(&model, &price_series(100.0, 10), &sample_snapshot());
        assert_relative_eq!(result.confidence, 0.7);

        // adding revenue and five years of bars: + 0.1 + 0.1 + 0.1, capped
        let snapshot = FundamentalSnapshot {
            revenue: Some(50e9),
            ..sample_snapshot()
        };
        let result = evaluate(&model, &price_series(100.0, 1300), &snapshot);
        assert_relative_eq!(result.confidence, 0.95);
    }
}
