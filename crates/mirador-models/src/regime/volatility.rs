//! Volatility regime switching model.
//!
//! Classifies short-term realized volatility into four fixed bands and
//! forecasts regime transitions with a hand-specified Markov matrix. Two
//! probability models coexist on purpose: the current-regime probability
//! comes from an exponential-distance kernel against fixed regime centers,
//! while the forward forecast comes from the transition matrix.

use serde::{Deserialize, Serialize};

use mirador_traits::stats::{autocorrelation, simple_returns, std_pop};
use mirador_traits::{
    DegradeReason, Evaluation, IndicatorModel, ModelInput, RiskLevel, Signal,
};

/// Trading periods per year used for annualization.
const PERIODS_PER_YEAR: f64 = 252.0;

/// Discrete volatility regime buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Regime {
    /// Annualized volatility below 12%.
    Low,
    /// Annualized volatility in [12%, 20%).
    Normal,
    /// Annualized volatility in [20%, 35%).
    High,
    /// Annualized volatility at or above 35%.
    Extreme,
}

impl Regime {
    /// All regimes, in band order.
    pub const ALL: [Self; 4] = [Self::Low, Self::Normal, Self::High, Self::Extreme];

    /// Classifies an annualized volatility into its band. Bands are
    /// lower-inclusive: exactly 12% is `Normal`.
    #[must_use]
    pub fn classify(annualized_vol: f64) -> Self {
        if annualized_vol < 0.12 {
            Self::Low
        } else if annualized_vol < 0.20 {
            Self::Normal
        } else if annualized_vol < 0.35 {
            Self::High
        } else {
            Self::Extreme
        }
    }

    /// Representative volatility level for the regime, used by the
    /// current-probability kernel.
    #[must_use]
    pub const fn center(&self) -> f64 {
        match self {
            Self::Low => 0.08,
            Self::Normal => 0.16,
            Self::High => 0.27,
            Self::Extreme => 0.45,
        }
    }

    /// Expected regime duration in trading days.
    #[must_use]
    pub const fn expected_duration(&self) -> usize {
        match self {
            Self::Low => 60,
            Self::Normal => 45,
            Self::High => 30,
            Self::Extreme => 15,
        }
    }

    const fn index(&self) -> usize {
        match self {
            Self::Low => 0,
            Self::Normal => 1,
            Self::High => 2,
            Self::Extreme => 3,
        }
    }
}

/// Fixed regime transition probabilities; each row sums to one.
pub const TRANSITION_MATRIX: [[f64; 4]; 4] = [
    [0.85, 0.12, 0.03, 0.00], // from Low
    [0.15, 0.70, 0.13, 0.02], // from Normal
    [0.05, 0.25, 0.60, 0.10], // from High
    [0.02, 0.08, 0.40, 0.50], // from Extreme
];

/// A probability distribution over the four regimes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeDistribution {
    /// Probability of the low regime.
    pub low: f64,
    /// Probability of the normal regime.
    pub normal: f64,
    /// Probability of the high regime.
    pub high: f64,
    /// Probability of the extreme regime.
    pub extreme: f64,
}

impl RegimeDistribution {
    /// A distribution concentrated on one regime.
    #[must_use]
    pub const fn certain(regime: Regime) -> Self {
        let mut values = [0.0; 4];
        values[regime.index()] = 1.0;
        Self::from_array(values)
    }

    /// Builds from `[low, normal, high, extreme]`.
    #[must_use]
    pub const fn from_array(values: [f64; 4]) -> Self {
        Self {
            low: values[0],
            normal: values[1],
            high: values[2],
            extreme: values[3],
        }
    }

    /// As `[low, normal, high, extreme]`.
    #[must_use]
    pub const fn as_array(&self) -> [f64; 4] {
        [self.low, self.normal, self.high, self.extreme]
    }

    /// Probability of the given regime.
    #[must_use]
    pub const fn get(&self, regime: Regime) -> f64 {
        self.as_array()[regime.index()]
    }

    /// The regime with the highest probability.
    #[must_use]
    pub fn most_likely(&self) -> Regime {
        let values = self.as_array();
        let mut best = Regime::Low;
        let mut best_p = values[0];
        for regime in Regime::ALL {
            let p = values[regime.index()];
            if p > best_p {
                best = regime;
                best_p = p;
            }
        }
        best
    }

    /// One left-multiplication by the transition matrix.
    #[must_use]
    pub fn step(&self) -> Self {
        let current = self.as_array();
        let mut next = [0.0; 4];
        for (from, &p) in current.iter().enumerate() {
            if p > 0.0 {
                for (to, slot) in next.iter_mut().enumerate() {
                    *slot += p * TRANSITION_MATRIX[from][to];
                }
            }
        }
        Self::from_array(next)
    }
}

/// Volatility metrics backing the regime classification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VolatilityMetrics {
    /// Annualized volatility of the last 10 returns.
    pub short_term_vol: f64,
    /// Annualized volatility of the last 30 returns.
    pub long_term_vol: f64,
    /// Short-term over long-term volatility.
    pub vol_ratio: f64,
    /// Z-score of the short-term volatility against its rolling history
    /// (zero when fewer than 60 returns are available).
    pub vol_zscore: f64,
    /// Lag-1 autocorrelation of squared returns.
    pub volatility_clustering: f64,
}

/// Regime classification with its probability model outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeAnalysis {
    /// The classified regime.
    pub current_regime: Regime,
    /// Kernel probability of the classified regime.
    pub regime_probability: f64,
    /// Fraction of recent rolling windows classified into the same regime.
    pub persistence: f64,
    /// Expected duration of the regime in trading days.
    pub expected_duration: usize,
    /// One-step transition probabilities out of the current regime.
    pub transition_probability: RegimeDistribution,
}

/// Mean/volatility/Sharpe statistics of returns observed inside one regime.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RegimeReturnStats {
    /// Which regime the statistics cover.
    pub regime: Regime,
    /// Mean per-period return inside the regime.
    pub mean_return: f64,
    /// Return volatility inside the regime.
    pub volatility: f64,
    /// Mean over volatility, zero when volatility is zero.
    pub sharpe: f64,
    /// Number of periods observed in the regime.
    pub count: usize,
}

/// Result of a volatility regime evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolatilityRegimeResult {
    /// Classification and probability outputs.
    pub analysis: RegimeAnalysis,
    /// The metrics behind the classification.
    pub metrics: VolatilityMetrics,
    /// Kernel probabilities for every regime.
    pub regime_probabilities: RegimeDistribution,
    /// Regime-conditional signal.
    pub signal: Signal,
    /// Regime-conditional risk level.
    pub risk_level: RiskLevel,
    /// Confidence score in [0, 1].
    pub confidence: f64,
    /// Human-readable summary.
    pub interpretation: String,
}

/// Volatility regime switching calculator.
#[derive(Debug, Clone, Default)]
pub struct VolatilityRegimeModel;

impl VolatilityRegimeModel {
    /// Creates the model.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn volatility_metrics(prices: &[f64]) -> VolatilityMetrics {
        let returns = simple_returns(prices);

        let short_window = returns.len().min(10);
        let short_returns = &returns[returns.len() - short_window..];
        let short_term_vol = std_pop(short_returns) * PERIODS_PER_YEAR.sqrt();

        let long_window = returns.len().min(30);
        let long_returns = &returns[returns.len() - long_window..];
        let long_term_vol = std_pop(long_returns) * PERIODS_PER_YEAR.sqrt();

        let vol_ratio = if long_term_vol > 0.0 {
            short_term_vol / long_term_vol
        } else {
            1.0
        };

        // Rolling 20-return volatility history for the z-score
        let vol_zscore = if returns.len() >= 60 {
            let historical: Vec<f64> = (20..returns.len())
                .map(|i| std_pop(&returns[i - 20..i]) * PERIODS_PER_YEAR.sqrt())
                .collect();
            let mean_vol = historical.iter().sum::<f64>() / historical.len() as f64;
            let std_vol = std_pop(&historical);
            if std_vol > 0.0 {
                (short_term_vol - mean_vol) / std_vol
            } else {
                0.0
            }
        } else {
            0.0
        };

        let squared: Vec<f64> = returns.iter().map(|r| r * r).collect();
        let clustering = if squared.len() >= 10 {
            let ac = autocorrelation(&squared, 1);
            if ac.is_nan() { 0.0 } else { ac }
        } else {
            0.0
        };

        VolatilityMetrics {
            short_term_vol,
            long_term_vol,
            vol_ratio,
            vol_zscore,
            volatility_clustering: clustering,
        }
    }

    /// Kernel probabilities: exponential decay in the distance from each
    /// regime's center volatility, normalized over the four regimes.
    fn regime_probabilities(short_term_vol: f64) -> RegimeDistribution {
        let mut values = [0.0; 4];
        let mut total = 0.0;
        for regime in Regime::ALL {
            let distance = (short_term_vol - regime.center()).abs();
            let p = (-distance * 10.0).exp();
            values[regime.index()] = p;
            total += p;
        }
        if total > 0.0 {
            for v in &mut values {
                *v /= total;
            }
        }
        RegimeDistribution::from_array(values)
    }

    /// Fraction of the last ten rolling-window classifications that match
    /// the current regime.
    fn persistence(prices: &[f64], current: Regime) -> f64 {
        if prices.len() < 20 {
            return 0.5;
        }
        let window = 10;
        let mut history = Vec::new();
        for i in window..prices.len() {
            let metrics = Self::volatility_metrics(&prices[i - window..i]);
            history.push(Regime::classify(metrics.short_term_vol));
        }
        if history.is_empty() {
            return 0.5;
        }
        let recent = history.len().min(10);
        let matching = history[history.len() - recent..]
            .iter()
            .filter(|r| **r == current)
            .count();
        matching as f64 / recent as f64
    }

    /// Regime-conditional signal. The extreme regime is deliberately
    /// contrarian: a very stretched volatility z-score reads as capitulation.
    fn signal(current: Regime, vol_zscore: f64) -> Signal {
        match current {
            Regime::Low => Signal::Buy,
            Regime::Normal => {
                if vol_zscore > 0.5 {
                    Signal::Hold
                } else {
                    Signal::Buy
                }
            }
            Regime::High => {
                if vol_zscore > 1.0 {
                    Signal::Sell
                } else {
                    Signal::Hold
                }
            }
            Regime::Extreme => {
                if vol_zscore > 2.0 {
                    Signal::Buy
                } else {
                    Signal::Sell
                }
            }
        }
    }

    fn risk_level(current: Regime, persistence: f64) -> RiskLevel {
        match current {
            Regime::Extreme => RiskLevel::High,
            Regime::High => RiskLevel::Medium,
            // a long quiet stretch is its own warning
            Regime::Low if persistence > 0.8 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }

    fn confidence(analysis: &RegimeAnalysis, metrics: &VolatilityMetrics) -> f64 {
        let persistence_bonus = analysis.persistence * 0.2;
        let data_quality = 1.0 - (metrics.vol_ratio - 1.0).abs().min(0.3);
        let total = analysis.regime_probability * 0.6 + persistence_bonus + data_quality * 0.2;
        total.clamp(0.2, 0.9)
    }

    /// Forecasts the regime distribution `periods` steps ahead by repeated
    /// left-multiplication with the transition matrix. Returns one
    /// distribution per step.
    #[must_use]
    pub fn forecast_transition(start: Regime, periods: usize) -> Vec<RegimeDistribution> {
        let mut distribution = RegimeDistribution::certain(start);
        let mut forecast = Vec::with_capacity(periods);
        for _ in 0..periods {
            distribution = distribution.step();
            forecast.push(distribution);
        }
        forecast
    }

    /// Historical per-regime return statistics over rolling classifications.
    #[must_use]
    pub fn regime_return_stats(prices: &[f64]) -> Vec<RegimeReturnStats> {
        if prices.len() < 30 {
            return Vec::new();
        }

        let window = 10;
        let mut grouped: [Vec<f64>; 4] = [Vec::new(), Vec::new(), Vec::new(), Vec::new()];
        for i in window..prices.len() {
            let ret = (prices[i] - prices[i - 1]) / prices[i - 1];
            let metrics = Self::volatility_metrics(&prices[i - window..i]);
            let regime = Regime::classify(metrics.short_term_vol);
            grouped[regime.index()].push(ret);
        }

        Regime::ALL
            .into_iter()
            .filter(|regime| !grouped[regime.index()].is_empty())
            .map(|regime| {
                let rets = &grouped[regime.index()];
                let mean_return = rets.iter().sum::<f64>() / rets.len() as f64;
                let volatility = std_pop(rets);
                RegimeReturnStats {
                    regime,
                    mean_return,
                    volatility,
                    sharpe: if volatility > 0.0 {
                        mean_return / volatility
                    } else {
                        0.0
                    },
                    count: rets.len(),
                }
            })
            .collect()
    }
}

impl IndicatorModel for VolatilityRegimeModel {
    type Output = VolatilityRegimeResult;

    fn name(&self) -> &str {
        "volatility_regime"
    }

    fn min_history(&self) -> usize {
        11
    }

    fn evaluate(&self, input: &ModelInput<'_>) -> Evaluation<VolatilityRegimeResult> {
        let prices = input.prices.closes();

        let degraded = prices.len() < self.min_history();
        let metrics = Self::volatility_metrics(prices);
        let current_regime = Regime::classify(metrics.short_term_vol);
        let probabilities = Self::regime_probabilities(metrics.short_term_vol);
        let persistence = Self::persistence(prices, current_regime);

        let analysis = RegimeAnalysis {
            current_regime,
            regime_probability: probabilities.get(current_regime),
            persistence,
            expected_duration: current_regime.expected_duration(),
            transition_probability: RegimeDistribution::from_array(
                TRANSITION_MATRIX[current_regime.index()],
            ),
        };

        let signal = if degraded {
            Signal::Hold
        } else {
            Self::signal(current_regime, metrics.vol_zscore)
        };
        let risk_level = Self::risk_level(current_regime, persistence);
        let confidence = if degraded {
            0.2
        } else {
            Self::confidence(&analysis, &metrics)
        };

        let interpretation = format!(
            "Volatility regime: {:?} at {:.1}% annualized (probability {:.2})",
            current_regime,
            metrics.short_term_vol * 100.0,
            analysis.regime_probability
        );

        let result = VolatilityRegimeResult {
            analysis,
            metrics,
            regime_probabilities: probabilities,
            signal,
            risk_level,
            confidence,
            interpretation,
        };

        if degraded {
            tracing::debug!(
                available = prices.len(),
                required = self.min_history(),
                "volatility regime degraded: too few bars for a volatility estimate"
            );
            Evaluation::Degraded {
                result,
                reason: DegradeReason::InsufficientHistory {
                    required: self.min_history(),
                    available: prices.len(),
                },
            }
        } else {
            Evaluation::Computed(result)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mirador_traits::{MarketContext, PriceSeries};

    fn evaluate(closes: Vec<f64>) -> Evaluation<VolatilityRegimeResult> {
        let prices = PriceSeries::from_closes(closes).unwrap();
        let market = MarketContext::default();
        let input = ModelInput::from_prices(&prices, &market);
        VolatilityRegimeModel::new().evaluate(&input)
    }

    /// Closes whose per-period return alternates +r/-r, giving a controlled
    /// realized volatility.
    fn alternating_series(bars: usize, r: f64) -> Vec<f64> {
        let mut closes = vec![100.0];
        for i in 1..bars {
            let prev = closes[i - 1];
            let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
            closes.push(prev * (1.0 + sign * r));
        }
        closes
    }

    #[test]
    fn test_transition_matrix_rows_sum_to_one() {
        for row in &TRANSITION_MATRIX {
            let sum: f64 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_classification_boundaries() {
        // bands are lower-inclusive
        assert_eq!(Regime::classify(0.12), Regime::Normal);
        assert_eq!(Regime::classify(0.11999), Regime::Low);
        assert_eq!(Regime::classify(0.20), Regime::High);
        assert_eq!(Regime::classify(0.35), Regime::Extreme);
        assert_eq!(Regime::classify(0.0), Regime::Low);
        assert_eq!(Regime::classify(1.5), Regime::Extreme);
    }

    #[test]
    fn test_flat_series_is_low_regime() {
        let outcome = evaluate(vec![4200.0; 80]);
        let result = outcome.result();

        assert_eq!(result.analysis.current_regime, Regime::Low);
        assert_relative_eq!(result.metrics.short_term_vol, 0.0);
        // a flat line classifies Low in every rolling window
        assert_relative_eq!(result.analysis.persistence, 1.0);
        // persistent calm trips the complacency rule
        assert_eq!(result.risk_level, RiskLevel::Medium);
        assert_eq!(result.signal, Signal::Buy);
    }

    #[test]
    fn test_high_volatility_classification() {
        // 3% per-period swings annualize far above the extreme threshold
        let outcome = evaluate(alternating_series(80, 0.03));
        let result = outcome.result();
        assert_eq!(result.analysis.current_regime, Regime::Extreme);
        assert_eq!(result.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_kernel_probabilities_normalize() {
        let probs = VolatilityRegimeModel::regime_probabilities(0.16);
        let total: f64 = probs.as_array().iter().sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-9);
        // at the normal center, normal is the most likely regime
        assert_eq!(probs.most_likely(), Regime::Normal);
    }

    #[test]
    fn test_forecast_transition_conserves_probability() {
        let forecast = VolatilityRegimeModel::forecast_transition(Regime::Extreme, 5);
        assert_eq!(forecast.len(), 5);
        for step in &forecast {
            let total: f64 = step.as_array().iter().sum();
            assert_relative_eq!(total, 1.0, epsilon = 1e-9);
        }
        // probability mass drains out of the extreme regime over time
        assert!(forecast[4].extreme < 0.5);
    }

    #[test]
    fn test_forecast_from_low_stays_calm() {
        let forecast = VolatilityRegimeModel::forecast_transition(Regime::Low, 1);
        assert_relative_eq!(forecast[0].low, 0.85);
        assert_relative_eq!(forecast[0].extreme, 0.0);
    }

    #[test]
    fn test_short_history_degrades() {
        let outcome = evaluate(vec![100.0; 5]);
        assert!(outcome.is_degraded());
        let result = outcome.result();
        assert_eq!(result.signal, Signal::Hold);
        assert_relative_eq!(result.confidence, 0.2);
    }

    #[test]
    fn test_confidence_bounds() {
        let outcome = evaluate(alternating_series(120, 0.005));
        let result = outcome.result();
        assert!(result.confidence >= 0.2 && result.confidence <= 0.9);
    }

    #[test]
    fn test_regime_return_stats_cover_observed_regimes() {
        let stats = VolatilityRegimeModel::regime_return_stats(&alternating_series(100, 0.03));
        assert!(!stats.is_empty());
        let total: usize = stats.iter().map(|s| s.count).sum();
        assert_eq!(total, 90);
    }
}
