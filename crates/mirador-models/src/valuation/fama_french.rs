//! Fama-French factor model.
//!
//! Maps company characteristics onto the five classic factor loadings and
//! prices the stock under both the 3-factor and 5-factor variants. The
//! loadings are heuristic tier lookups, not regression betas, and the R²
//! figures are plausibility scores derived from loading magnitude — both are
//! flagged as such in the result.

use serde::{Deserialize, Serialize};

use mirador_traits::{
    DegradeReason, Evaluation, FundamentalSnapshot, IndicatorModel, MarketContext, ModelInput,
};

/// Loadings are constrained to this range.
pub const MIN_LOADING: f64 = -2.0;
/// Loadings are constrained to this range.
pub const MAX_LOADING: f64 = 2.0;

/// Market-cap pivot separating small, mid and large capitalization tiers.
const MEDIAN_MARKET_CAP: f64 = 10e9;

/// Configuration for the Fama-French model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamaFrenchConfig {
    /// Loading magnitude above which a factor counts as significant.
    pub significance_threshold: f64,
    /// Factor premiums to price with; estimated from market context when
    /// absent.
    pub premiums: Option<FactorPremiums>,
}

impl Default for FamaFrenchConfig {
    fn default() -> Self {
        Self {
            significance_threshold: 0.3,
            premiums: None,
        }
    }
}

/// The five factor premiums.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FactorPremiums {
    /// Market premium (Rm - Rf).
    pub market: f64,
    /// Size premium (SMB).
    pub size: f64,
    /// Value premium (HML).
    pub value: f64,
    /// Profitability premium (RMW).
    pub profitability: f64,
    /// Investment premium (CMA).
    pub investment: f64,
}

impl FactorPremiums {
    /// Estimates premiums from market conditions: the market premium is
    /// taken directly, the size and value premiums shift with the market
    /// climate, and the remaining two use long-run averages.
    #[must_use]
    pub fn estimate(market: &MarketContext) -> Self {
        let market_premium = market.market_return - market.risk_free_rate;
        Self {
            market: market_premium,
            size: if market_premium > 0.05 { 0.02 } else { 0.01 },
            value: if market.inflation_rate < 0.03 { 0.03 } else { 0.02 },
            profitability: 0.025,
            investment: 0.02,
        }
    }
}

/// The five factor loadings for a stock.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FactorLoadings {
    /// Market beta.
    pub market: f64,
    /// Size loading (positive = small-cap characteristics).
    pub size: f64,
    /// Value loading (positive = value characteristics).
    pub value: f64,
    /// Profitability loading (positive = high quality).
    pub profitability: f64,
    /// Investment loading (positive = conservative investment).
    pub investment: f64,
}

impl FactorLoadings {
    fn clamped(self) -> Self {
        let clamp = |v: f64| v.clamp(MIN_LOADING, MAX_LOADING);
        Self {
            market: clamp(self.market),
            size: clamp(self.size),
            value: clamp(self.value),
            profitability: clamp(self.profitability),
            investment: clamp(self.investment),
        }
    }

    fn as_array(&self) -> [f64; 5] {
        [
            self.market,
            self.size,
            self.value,
            self.profitability,
            self.investment,
        ]
    }
}

/// Size style bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeStyle {
    /// Small-cap characteristics.
    SmallCap,
    /// Mid-cap characteristics.
    MidCap,
    /// Large-cap characteristics.
    LargeCap,
}

/// Value/growth style bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueStyle {
    /// Value characteristics.
    Value,
    /// Growth characteristics.
    Growth,
    /// Neither dominates.
    Blend,
}

/// Quality style bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityStyle {
    /// Robust profitability.
    HighQuality,
    /// Middling profitability.
    AverageQuality,
    /// Weak profitability.
    LowQuality,
}

/// Investment-policy style bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvestmentStyle {
    /// Conservative asset growth.
    Conservative,
    /// Middling asset growth.
    Moderate,
    /// Aggressive asset growth.
    Aggressive,
}

/// Investment style classification derived from the loadings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StyleClassification {
    /// Size bucket.
    pub size: SizeStyle,
    /// Value/growth bucket.
    pub style: ValueStyle,
    /// Quality bucket.
    pub quality: QualityStyle,
    /// Investment-policy bucket.
    pub investment: InvestmentStyle,
}

/// Per-factor contribution to the 5-factor expected return.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FactorContributions {
    /// Risk-free base.
    pub risk_free: f64,
    /// Market factor contribution.
    pub market: f64,
    /// Size factor contribution.
    pub size: f64,
    /// Value factor contribution.
    pub value: f64,
    /// Profitability factor contribution.
    pub profitability: f64,
    /// Investment factor contribution.
    pub investment: f64,
}

/// Per-factor share of total factor risk, proportional to loading magnitude.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskAttribution {
    /// Market factor share.
    pub market: f64,
    /// Size factor share.
    pub size: f64,
    /// Value factor share.
    pub value: f64,
    /// Profitability factor share.
    pub profitability: f64,
    /// Investment factor share.
    pub investment: f64,
}

/// Result of a Fama-French evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamaFrenchResult {
    /// Expected return under the 3-factor model.
    pub expected_return_3f: f64,
    /// Expected return under the 5-factor model.
    pub expected_return_5f: f64,
    /// Realized return minus 3-factor expectation, when a realized return
    /// was supplied.
    pub alpha_3f: Option<f64>,
    /// Realized return minus 5-factor expectation.
    pub alpha_5f: Option<f64>,
    /// The factor loadings used.
    pub loadings: FactorLoadings,
    /// The factor premiums used.
    pub premiums: FactorPremiums,
    /// Plausibility score for the 3-factor fit. Not a regression statistic.
    pub r_squared_3f: f64,
    /// Plausibility score for the 5-factor fit. Not a regression statistic.
    pub r_squared_5f: f64,
    /// Always true: the R² figures above are heuristics, not fitted
    /// statistics.
    pub heuristic_r_squared: bool,
    /// Contribution of each factor to the 5-factor expected return.
    pub contributions: FactorContributions,
    /// Loading-proportional risk attribution.
    pub risk_attribution: RiskAttribution,
    /// Style classification.
    pub style: StyleClassification,
    /// Confidence score in [0, 1].
    pub confidence: f64,
    /// Human-readable summary.
    pub interpretation: String,
}

/// Fama-French factor model calculator.
#[derive(Debug, Clone)]
pub struct FamaFrenchModel {
    config: FamaFrenchConfig,
}

impl FamaFrenchModel {
    /// Creates a model with the given configuration.
    #[must_use]
    pub const fn new(config: FamaFrenchConfig) -> Self {
        Self { config }
    }

    /// Derives factor loadings from company characteristics. Each loading is
    /// a tier lookup; missing inputs fall back to the neutral tier.
    fn loadings(snapshot: &FundamentalSnapshot, current_price: f64) -> FactorLoadings {
        let market = snapshot.beta.unwrap_or(1.0);

        // Smaller companies load positively on the size factor.
        let size = match snapshot.market_cap {
            Some(cap) if cap < MEDIAN_MARKET_CAP / 2.0 => 0.8,
            Some(cap) if cap < MEDIAN_MARKET_CAP * 2.0 => 0.2,
            Some(_) => -0.3,
            None => 0.2,
        };

        let price_per_share = match (snapshot.market_cap, snapshot.shares_outstanding) {
            (Some(cap), Some(shares)) if shares > 0.0 => cap / shares,
            _ => current_price,
        };
        let value = match snapshot.book_value_per_share {
            Some(bvps) if bvps > 0.0 => {
                let pb = price_per_share / bvps;
                if pb < 1.0 {
                    0.6
                } else if pb < 2.0 {
                    0.3
                } else if pb < 4.0 {
                    -0.1
                } else {
                    -0.4
                }
            }
            _ => -0.1,
        };

        let profitability = match snapshot.roe_or_derived() {
            Some(roe) if roe > 0.15 => 0.5,
            Some(roe) if roe > 0.10 => 0.2,
            Some(roe) if roe > 0.05 => -0.1,
            Some(_) => -0.4,
            None => -0.1,
        };

        // Aggressive growers load negatively on the investment factor.
        let investment = match (snapshot.revenue_growth, snapshot.earnings_growth) {
            (Some(rg), Some(eg)) => {
                let avg = (rg + eg) / 2.0;
                if avg > 0.15 {
                    -0.4
                } else if avg > 0.08 {
                    -0.1
                } else if avg > 0.03 {
                    0.1
                } else {
                    0.3
                }
            }
            _ => 0.1,
        };

        FactorLoadings {
            market,
            size,
            value,
            profitability,
            investment,
        }
        .clamped()
    }

    fn r_squared(loadings: &FactorLoadings) -> (f64, f64) {
        let strength_3f =
            (loadings.market.abs() + loadings.size.abs() + loadings.value.abs()) / 3.0;
        let strength_5f = loadings.as_array().iter().map(|l| l.abs()).sum::<f64>() / 5.0;
        ((strength_3f * 0.6).min(0.9), (strength_5f * 0.7).min(0.95))
    }

    fn style(&self, loadings: &FactorLoadings) -> StyleClassification {
        let t = self.config.significance_threshold;
        StyleClassification {
            size: if loadings.size > t {
                SizeStyle::SmallCap
            } else if loadings.size < -t {
                SizeStyle::LargeCap
            } else {
                SizeStyle::MidCap
            },
            style: if loadings.value > t {
                ValueStyle::Value
            } else if loadings.value < -t {
                ValueStyle::Growth
            } else {
                ValueStyle::Blend
            },
            quality: if loadings.profitability > t {
                QualityStyle::HighQuality
            } else if loadings.profitability < -t {
                QualityStyle::LowQuality
            } else {
                QualityStyle::AverageQuality
            },
            investment: if loadings.investment > t {
                InvestmentStyle::Conservative
            } else if loadings.investment < -t {
                InvestmentStyle::Aggressive
            } else {
                InvestmentStyle::Moderate
            },
        }
    }

    fn confidence(&self, loadings: &FactorLoadings, r_squared_5f: f64) -> f64 {
        let t = self.config.significance_threshold;
        let values = loadings.as_array();

        let significant = values.iter().filter(|l| l.abs() > t).count();
        let extreme = values.iter().filter(|l| l.abs() > 1.5).count();

        let confidence = 0.6 + r_squared_5f * 0.3 + (significant as f64 / 5.0) * 0.2
            - extreme as f64 * 0.05;
        confidence.clamp(0.3, 0.95)
    }

    fn interpretation(
        &self,
        loadings: &FactorLoadings,
        style: &StyleClassification,
        alpha_5f: Option<f64>,
    ) -> String {
        let mut parts = vec![format!("Style: {:?} {:?}", style.size, style.style)];
        parts.push(format!("Quality: {:?}", style.quality));

        if let Some(alpha) = alpha_5f
            && alpha.abs() > 0.02
        {
            let direction = if alpha > 0.0 {
                "outperforming"
            } else {
                "underperforming"
            };
            parts.push(format!("Alpha: {:.2}% ({direction} factors)", alpha * 100.0));
        }

        let t = self.config.significance_threshold;
        let names = ["market", "size", "value", "profitability", "investment"];
        let dominant: Vec<&str> = names
            .iter()
            .zip(loadings.as_array())
            .filter(|(_, l)| l.abs() > t)
            .map(|(name, _)| *name)
            .collect();
        if !dominant.is_empty() {
            parts.push(format!("Key factors: {}", dominant.join(", ")));
        }

        parts.join("; ")
    }

    fn build(
        &self,
        loadings: FactorLoadings,
        premiums: FactorPremiums,
        risk_free_rate: f64,
        actual_return: Option<f64>,
    ) -> FamaFrenchResult {
        let expected_return_3f = risk_free_rate
            + loadings.market * premiums.market
            + loadings.size * premiums.size
            + loadings.value * premiums.value;
        let expected_return_5f = expected_return_3f
            + loadings.profitability * premiums.profitability
            + loadings.investment * premiums.investment;

        let alpha_3f = actual_return.map(|r| r - expected_return_3f);
        let alpha_5f = actual_return.map(|r| r - expected_return_5f);

        let (r_squared_3f, r_squared_5f) = Self::r_squared(&loadings);

        let contributions = FactorContributions {
            risk_free: risk_free_rate,
            market: loadings.market * premiums.market,
            size: loadings.size * premiums.size,
            value: loadings.value * premiums.value,
            profitability: loadings.profitability * premiums.profitability,
            investment: loadings.investment * premiums.investment,
        };

        let total_risk: f64 = loadings.as_array().iter().map(|l| l.abs() * 0.1).sum();
        let share = |l: f64| {
            if total_risk > 0.0 {
                (l.abs() * 0.1) / total_risk
            } else {
                0.0
            }
        };
        let risk_attribution = RiskAttribution {
            market: share(loadings.market),
            size: share(loadings.size),
            value: share(loadings.value),
            profitability: share(loadings.profitability),
            investment: share(loadings.investment),
        };

        let style = self.style(&loadings);
        let confidence = self.confidence(&loadings, r_squared_5f);
        let interpretation = self.interpretation(&loadings, &style, alpha_5f);

        FamaFrenchResult {
            expected_return_3f,
            expected_return_5f,
            alpha_3f,
            alpha_5f,
            loadings,
            premiums,
            r_squared_3f,
            r_squared_5f,
            heuristic_r_squared: true,
            contributions,
            risk_attribution,
            style,
            confidence,
            interpretation,
        }
    }
}

impl Default for FamaFrenchModel {
    fn default() -> Self {
        Self::new(FamaFrenchConfig::default())
    }
}

impl IndicatorModel for FamaFrenchModel {
    type Output = FamaFrenchResult;

    fn name(&self) -> &str {
        "fama_french"
    }

    fn min_history(&self) -> usize {
        1
    }

    fn requires_fundamentals(&self) -> bool {
        true
    }

    fn evaluate(&self, input: &ModelInput<'_>) -> Evaluation<FamaFrenchResult> {
        let premiums = self
            .config
            .premiums
            .unwrap_or_else(|| FactorPremiums::estimate(input.market));
        let current_price = input.prices.last_close().unwrap_or(0.0);

        match input.fundamentals {
            Some(snapshot) => {
                let loadings = Self::loadings(snapshot, current_price);
                Evaluation::Computed(self.build(
                    loadings,
                    premiums,
                    input.market.risk_free_rate,
                    input.actual_return,
                ))
            }
            None => {
                // Neutral loadings: a beta-one stock with no tilt.
                let loadings = FactorLoadings {
                    market: 1.0,
                    size: 0.0,
                    value: 0.0,
                    profitability: 0.0,
                    investment: 0.0,
                };
                let mut result = self.build(
                    loadings,
                    premiums,
                    input.market.risk_free_rate,
                    input.actual_return,
                );
                result.confidence = 0.3;
                Evaluation::Degraded {
                    result,
                    reason: DegradeReason::MissingFundamentals,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mirador_traits::PriceSeries;

    fn growth_company() -> FundamentalSnapshot {
        FundamentalSnapshot {
            market_cap: Some(4e9),
            shares_outstanding: Some(50e6),
            book_value_per_share: Some(50.0),
            net_income: Some(500e6),
            shareholders_equity: Some(2.5e9),
            revenue_growth: Some(0.12),
            earnings_growth: Some(0.15),
            beta: Some(1.3),
            ..Default::default()
        }
    }

    fn evaluate(snapshot: &FundamentalSnapshot, actual_return: Option<f64>) -> FamaFrenchResult {
        let prices = PriceSeries::from_closes(vec![80.0; 60]).unwrap();
        let market = MarketContext::default();
        let mut input = ModelInput::new(&prices, snapshot, &market);
        input.actual_return = actual_return;
        FamaFrenchModel::default().evaluate(&input).into_result()
    }

    #[test]
    fn test_loadings_tiers() {
        let result = evaluate(&growth_company(), None);

        // $4B market cap sits below half the $10B median: small cap
        assert_relative_eq!(result.loadings.size, 0.8);
        // price per share 80, book 50: P/B 1.6 lands in the value tier
        assert_relative_eq!(result.loadings.value, 0.3);
        // ROE 20% is high profitability
        assert_relative_eq!(result.loadings.profitability, 0.5);
        // mean growth 13.5% is moderate
        assert_relative_eq!(result.loadings.investment, -0.1);
        assert_relative_eq!(result.loadings.market, 1.3);
    }

    #[test]
    fn test_loadings_clamped() {
        let snapshot = FundamentalSnapshot {
            beta: Some(5.0),
            ..growth_company()
        };
        let result = evaluate(&snapshot, None);
        assert_relative_eq!(result.loadings.market, MAX_LOADING);
    }

    #[test]
    fn test_expected_return_formula() {
        let result = evaluate(&growth_company(), None);
        let p = &result.premiums;
        let l = &result.loadings;

        let expected_3f = 0.03 + l.market * p.market + l.size * p.size + l.value * p.value;
        assert_relative_eq!(result.expected_return_3f, expected_3f, epsilon = 1e-12);

        let expected_5f =
            expected_3f + l.profitability * p.profitability + l.investment * p.investment;
        assert_relative_eq!(result.expected_return_5f, expected_5f, epsilon = 1e-12);
    }

    #[test]
    fn test_alpha_only_with_actual_return() {
        let without = evaluate(&growth_company(), None);
        assert!(without.alpha_5f.is_none());

        let with = evaluate(&growth_company(), Some(0.14));
        let alpha = with.alpha_5f.unwrap();
        assert_relative_eq!(alpha, 0.14 - with.expected_return_5f, epsilon = 1e-12);
    }

    #[test]
    fn test_r_squared_is_flagged_heuristic() {
        let result = evaluate(&growth_company(), None);
        assert!(result.heuristic_r_squared);
        assert!(result.r_squared_3f <= 0.9);
        assert!(result.r_squared_5f <= 0.95);
        assert!(result.r_squared_5f > 0.0);
    }

    #[test]
    fn test_style_classification() {
        let result = evaluate(&growth_company(), None);
        assert_eq!(result.style.size, SizeStyle::SmallCap);
        assert_eq!(result.style.style, ValueStyle::Blend);
        assert_eq!(result.style.quality, QualityStyle::HighQuality);
        assert_eq!(result.style.investment, InvestmentStyle::Moderate);
    }

    #[test]
    fn test_risk_attribution_sums_to_one() {
        let result = evaluate(&growth_company(), None);
        let ra = &result.risk_attribution;
        let total = ra.market + ra.size + ra.value + ra.profitability + ra.investment;
        assert_relative_eq!(total, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_confidence_bounds() {
        let result = evaluate(&growth_company(), None);
        assert!(result.confidence >= 0.3 && result.confidence <= 0.95);
    }

    #[test]
    fn test_missing_fundamentals_degrades_to_neutral() {
        let prices = PriceSeries::from_closes(vec![80.0; 60]).unwrap();
        let market = MarketContext::default();
        let input = ModelInput::from_prices(&prices, &market);

        let outcome = FamaFrenchModel::default().evaluate(&input);
        assert!(outcome.is_degraded());
        let result = outcome.result();
        assert_relative_eq!(result.loadings.market, 1.0);
        assert_relative_eq!(result.loadings.size, 0.0);
        assert_relative_eq!(result.confidence, 0.3);
    }
}
