//! ARIMA time-series model.
//!
//! Stationarity screening, automatic (p, d, q) order selection by AIC over a
//! bounded grid, fitting, and fixed-horizon forecasting with confidence
//! intervals. The fit is a lagged-regression approximation: AR terms are
//! lagged differenced values, MA terms are damped lagged values, and the
//! coefficients come from ordinary least squares. A heavier statistical
//! backend could replace the fitter behind the same result shape.

use serde::{Deserialize, Serialize};

use mirador_traits::stats::{autocorrelation, linear_regression, std_pop};
use mirador_traits::{DegradeReason, Evaluation, IndicatorModel, ModelInput};

/// Configuration for the ARIMA model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArimaConfig {
    /// Maximum autoregressive order searched.
    pub max_p: usize,
    /// Maximum differencing order searched.
    pub max_d: usize,
    /// Maximum moving-average order searched.
    pub max_q: usize,
    /// Forecast horizon cap; the effective horizon is the smaller of this
    /// and a quarter of the series length.
    pub forecast_cap: usize,
}

impl Default for ArimaConfig {
    fn default() -> Self {
        Self {
            max_p: 5,
            max_d: 2,
            max_q: 5,
            forecast_cap: 20,
        }
    }
}

/// Stationarity screening statistics in the shape of the ADF and KPSS tests.
///
/// These come from a variance-ratio and trend-correlation proxy, not from
/// the full test distributions; the p-values are coarse bucket estimates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StationarityTests {
    /// ADF-style test statistic.
    pub adf_statistic: f64,
    /// ADF-style p-value bucket.
    pub adf_pvalue: f64,
    /// 5% critical value for the ADF statistic.
    pub adf_critical_5pct: f64,
    /// KPSS-style test statistic.
    pub kpss_statistic: f64,
    /// KPSS-style p-value bucket.
    pub kpss_pvalue: f64,
    /// 5% critical value for the KPSS statistic.
    pub kpss_critical_5pct: f64,
}

/// Fitted model coefficients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArimaParameters {
    /// Regression intercept on the differenced scale.
    pub intercept: f64,
    /// Autoregressive coefficients, lag 1 first.
    pub ar: Vec<f64>,
    /// Moving-average coefficients, lag 1 first.
    pub ma: Vec<f64>,
}

/// Result of an ARIMA evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArimaResult {
    /// Selected (p, d, q) order.
    pub order: (usize, usize, usize),
    /// Akaike information criterion of the fit.
    pub aic: f64,
    /// Bayesian information criterion of the fit.
    pub bic: f64,
    /// Hannan-Quinn information criterion of the fit.
    pub hqic: f64,
    /// One-step-ahead fitted values, same length as the input.
    pub fitted: Vec<f64>,
    /// Input minus fitted, zero over the warm-up prefix.
    pub residuals: Vec<f64>,
    /// Point forecast, `min(forecast_cap, len / 4)` steps.
    pub forecast: Vec<f64>,
    /// Forecast standard errors (residual sigma).
    pub forecast_se: Vec<f64>,
    /// 95% confidence intervals as (lower, upper) pairs.
    pub confidence_intervals: Vec<(f64, f64)>,
    /// Fitted coefficients.
    pub parameters: ArimaParameters,
    /// Stationarity screening of the input.
    pub stationarity: StationarityTests,
}

struct FitCore {
    intercept: f64,
    ar: Vec<f64>,
    ma: Vec<f64>,
    fitted: Vec<f64>,
    residuals: Vec<f64>,
    aic: f64,
    bic: f64,
    hqic: f64,
}

/// ARIMA calculator.
#[derive(Debug, Clone)]
pub struct ArimaModel {
    config: ArimaConfig,
}

impl ArimaModel {
    /// Creates an ARIMA model with the given configuration.
    #[must_use]
    pub const fn new(config: ArimaConfig) -> Self {
        Self { config }
    }

    /// Variance-ratio and trend-correlation stationarity screen.
    #[must_use]
    pub fn test_stationarity(data: &[f64]) -> StationarityTests {
        let n = data.len();
        let mid = n / 2;

        let (var_first, var_second) = if n >= 4 {
            (
                std_pop(&data[..mid]).powi(2),
                std_pop(&data[mid..]).powi(2),
            )
        } else {
            (1.0, 1.0)
        };
        let variance_ratio = if var_second > 0.0 {
            var_first / var_second
        } else {
            1.0
        };

        let xs: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let trend_corr = linear_regression(&xs, data).map_or(0.0, |fit| fit.r);

        let trending = trend_corr.abs() >= 0.1;
        StationarityTests {
            adf_statistic: if trending { -1.0 } else { -2.0 },
            adf_pvalue: if trending { 0.15 } else { 0.05 },
            adf_critical_5pct: -2.86,
            kpss_statistic: if variance_ratio < 2.0 { 0.1 } else { 0.8 },
            kpss_pvalue: if variance_ratio < 2.0 { 0.1 } else { 0.01 },
            kpss_critical_5pct: 0.463,
        }
    }

    /// Lag-1 autocorrelation heuristic for a starting order when the AIC
    /// grid cannot be evaluated.
    fn heuristic_order(&self, data: &[f64]) -> (usize, usize, usize) {
        let stationarity = Self::test_stationarity(data);
        let d = usize::from(stationarity.adf_pvalue > 0.05).min(self.config.max_d);

        let (p, q) = if data.len() > 10 {
            let ac = autocorrelation(data, 1);
            let ac = if ac.is_nan() { 0.0 } else { ac };
            (
                if ac.abs() > 0.5 { 2 } else { 1 },
                usize::from(ac.abs() > 0.3),
            )
        } else {
            (1, 1)
        };

        (p.min(self.config.max_p), d, q.min(self.config.max_q))
    }

    /// Selects the (p, d, q) order minimizing AIC over the bounded grid.
    #[must_use]
    pub fn auto_order(&self, data: &[f64]) -> (usize, usize, usize) {
        let mut best: Option<((usize, usize, usize), f64)> = None;
        for d in 0..=self.config.max_d {
            for p in 0..=self.config.max_p {
                for q in 0..=self.config.max_q {
                    if p == 0 && q == 0 {
                        continue;
                    }
                    if let Some(fit) = self.fit_core(data, (p, d, q))
                        && fit.aic.is_finite()
                        && best.as_ref().is_none_or(|(_, aic)| fit.aic < *aic)
                    {
                        best = Some(((p, d, q), fit.aic));
                    }
                }
            }
        }
        best.map_or_else(|| self.heuristic_order(data), |(order, _)| order)
    }

    fn difference(data: &[f64], d: usize) -> Vec<f64> {
        let mut diff = data.to_vec();
        for _ in 0..d {
            diff = diff.windows(2).map(|w| w[1] - w[0]).collect();
        }
        diff
    }

    fn fit_core(&self, data: &[f64], order: (usize, usize, usize)) -> Option<FitCore> {
        let (p, d, q) = order;
        let n = data.len();
        if n <= d + 1 {
            return None;
        }

        let diff = Self::difference(data, d);
        let max_lag = p.max(q).max(1);
        let m = diff.len();
        let k = p + q + 1; // coefficients including the intercept
        if m <= max_lag || m - max_lag <= k {
            return None;
        }

        // Design matrix: intercept, AR lags, damped lags standing in for MA
        let rows = m - max_lag;
        let mut design = Vec::with_capacity(rows);
        let mut targets = Vec::with_capacity(rows);
        for i in max_lag..m {
            let mut row = Vec::with_capacity(k);
            row.push(1.0);
            for lag in 1..=p {
                row.push(diff[i - lag]);
            }
            for lag in 1..=q {
                row.push(diff[i - lag] * 0.1);
            }
            design.push(row);
            targets.push(diff[i]);
        }

        let coeffs = solve_least_squares(&design, &targets)?;
        let intercept = coeffs[0];
        let ar = coeffs[1..=p].to_vec();
        let ma = coeffs[p + 1..].to_vec();

        // One-step-ahead predictions on the differenced scale
        let preds: Vec<f64> = design
            .iter()
            .map(|row| row.iter().zip(&coeffs).map(|(x, c)| x * c).sum())
            .collect();

        // Reconstruct level-space fitted values from actual prior levels
        let mut fitted = data.to_vec();
        for (row_idx, pred) in preds.iter().enumerate() {
            let i = row_idx + max_lag + d; // original index of this row
            fitted[i] = match d {
                0 => *pred,
                1 => data[i - 1] + pred,
                _ => 2.0 * data[i - 1] - data[i - 2] + pred,
            };
        }

        let warm_up = max_lag + d;
        let residuals: Vec<f64> = data
            .iter()
            .zip(&fitted)
            .enumerate()
            .map(|(i, (actual, fit))| if i < warm_up { 0.0 } else { actual - fit })
            .collect();

        let mse = residuals[warm_up..]
            .iter()
            .map(|r| r * r)
            .sum::<f64>()
            / rows as f64;
        let mse = mse.max(f64::MIN_POSITIVE);
        let nf = rows as f64;
        let kf = k as f64;
        let aic = nf * mse.ln() + 2.0 * kf;
        let bic = nf * mse.ln() + nf.ln() * kf;
        let hqic = aic + 2.0 * (nf.ln()).ln() * kf;

        Some(FitCore {
            intercept,
            ar,
            ma,
            fitted,
            residuals,
            aic,
            bic,
            hqic,
        })
    }

    fn forecast_steps(&self, n: usize) -> usize {
        self.config.forecast_cap.min(n / 4).max(1)
    }

    fn forecast(&self, data: &[f64], core: &FitCore, d: usize) -> Vec<f64> {
        let steps = self.forecast_steps(data.len());
        let mut diff = Self::difference(data, d);

        let mut diff_preds = Vec::with_capacity(steps);
        for _ in 0..steps {
            let mut pred = core.intercept;
            for (lag, coeff) in core.ar.iter().enumerate() {
                let idx = diff.len().checked_sub(lag + 1);
                pred += coeff * idx.map_or(0.0, |i| diff[i]);
            }
            for (lag, coeff) in core.ma.iter().enumerate() {
                let idx = diff.len().checked_sub(lag + 1);
                pred += coeff * idx.map_or(0.0, |i| diff[i]) * 0.1;
            }
            diff.push(pred);
            diff_preds.push(pred);
        }

        // Integrate back to level space, anchored at the last actual values
        match d {
            0 => diff_preds,
            1 => {
                let mut level = data[data.len() - 1];
                diff_preds
                    .iter()
                    .map(|pd| {
                        level += pd;
                        level
                    })
                    .collect()
            }
            _ => {
                let n = data.len();
                let mut diff1 = data[n - 1] - data[n - 2];
                let mut level = data[n - 1];
                diff_preds
                    .iter()
                    .map(|pd| {
                        diff1 += pd;
                        level += diff1;
                        level
                    })
                    .collect()
            }
        }
    }

    /// Flat-mean fallback for series too short to regress on.
    fn flat_fit(&self, data: &[f64], order: (usize, usize, usize)) -> ArimaResult {
        let n = data.len();
        let mean = if n > 0 {
            data.iter().sum::<f64>() / n as f64
        } else {
            0.0
        };
        let fitted = vec![mean; n];
        let residuals: Vec<f64> = data.iter().map(|v| v - mean).collect();
        let sigma = std_pop(&residuals);

        let steps = self.forecast_steps(n);
        let last = data.last().copied().unwrap_or(0.0);
        let forecast = vec![last; steps];

        let mse = (residuals.iter().map(|r| r * r).sum::<f64>() / n.max(1) as f64)
            .max(f64::MIN_POSITIVE);
        let nf = n.max(1) as f64;
        let aic = nf * mse.ln() + 2.0;

        ArimaResult {
            order,
            aic,
            bic: nf * mse.ln() + nf.ln(),
            hqic: aic,
            fitted,
            residuals,
            confidence_intervals: forecast
                .iter()
                .map(|f| (f - 1.96 * sigma, f + 1.96 * sigma))
                .collect(),
            forecast_se: vec![sigma; steps],
            forecast,
            parameters: ArimaParameters {
                intercept: mean,
                ar: Vec::new(),
                ma: Vec::new(),
            },
            stationarity: Self::test_stationarity(data),
        }
    }
}

impl Default for ArimaModel {
    fn default() -> Self {
        Self::new(ArimaConfig::default())
    }
}

impl IndicatorModel for ArimaModel {
    type Output = ArimaResult;

    fn name(&self) -> &str {
        "arima"
    }

    fn min_history(&self) -> usize {
        20
    }

    fn evaluate(&self, input: &ModelInput<'_>) -> Evaluation<ArimaResult> {
        let data = input.prices.closes();
        if data.is_empty() {
            return Evaluation::Degraded {
                result: self.flat_fit(data, (0, 0, 0)),
                reason: DegradeReason::Fallback("empty price series".to_string()),
            };
        }

        let order = self.auto_order(data);
        match self.fit_core(data, order) {
            Some(core) => {
                let forecast = self.forecast(data, &core, order.1);
                let sigma = std_pop(&core.residuals);
                let result = ArimaResult {
                    order,
                    aic: core.aic,
                    bic: core.bic,
                    hqic: core.hqic,
                    forecast_se: vec![sigma; forecast.len()],
                    confidence_intervals: forecast
                        .iter()
                        .map(|f| (f - 1.96 * sigma, f + 1.96 * sigma))
                        .collect(),
                    parameters: ArimaParameters {
                        intercept: core.intercept,
                        ar: core.ar.clone(),
                        ma: core.ma.clone(),
                    },
                    stationarity: Self::test_stationarity(data),
                    fitted: core.fitted,
                    residuals: core.residuals,
                    forecast,
                };
                if data.len() < self.min_history() {
                    Evaluation::Degraded {
                        result,
                        reason: DegradeReason::InsufficientHistory {
                            required: self.min_history(),
                            available: data.len(),
                        },
                    }
                } else {
                    Evaluation::Computed(result)
                }
            }
            None => Evaluation::Degraded {
                result: self.flat_fit(data, order),
                reason: DegradeReason::InsufficientHistory {
                    required: self.min_history(),
                    available: data.len(),
                },
            },
        }
    }
}

/// Solves the normal equations of an ordinary least-squares problem by
/// Gaussian elimination with partial pivoting. `None` when the system is
/// singular.
fn solve_least_squares(design: &[Vec<f64>], targets: &[f64]) -> Option<Vec<f64>> {
    let rows = design.len();
    if rows == 0 {
        return None;
    }
    let k = design[0].len();

    // X^T X and X^T y
    let mut a = vec![vec![0.0; k]; k];
    let mut b = vec![0.0; k];
    for (row, &y) in design.iter().zip(targets) {
        for i in 0..k {
            b[i] += row[i] * y;
            for j in 0..k {
                a[i][j] += row[i] * row[j];
            }
        }
    }

    // Forward elimination with partial pivoting
    for col in 0..k {
        let pivot_row = (col..k)
            .max_by(|&r1, &r2| {
                a[r1][col]
                    .abs()
                    .partial_cmp(&a[r2][col].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(col);
        if a[pivot_row][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in col + 1..k {
            let factor = a[row][col] / a[col][col];
            for j in col..k {
                a[row][j] -= factor * a[col][j];
            }
            b[row] -= factor * b[col];
        }
    }

    // Back substitution
    let mut x = vec![0.0; k];
    for col in (0..k).rev() {
        let mut sum = b[col];
        for j in col + 1..k {
            sum -= a[col][j] * x[j];
        }
        x[col] = sum / a[col][col];
    }

    x.iter().all(|v| v.is_finite()).then_some(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mirador_traits::{MarketContext, PriceSeries};

    /// Deterministic AR(1)-flavored series around a 100 level, noise from a
    /// small linear congruential generator.
    fn ar1_series(n: usize) -> Vec<f64> {
        let mut state: u64 = 42;
        let mut noise = || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((state >> 33) as f64 / (1u64 << 30) as f64) - 1.0 // [-1, 1)
        };

        let mut x = 0.0;
        let mut series = Vec::with_capacity(n);
        for _ in 0..n {
            x = 0.7 * x + noise() * 0.5;
            series.push(100.0 + x);
        }
        series
    }

    fn evaluate(closes: Vec<f64>) -> Evaluation<ArimaResult> {
        let prices = PriceSeries::from_closes(closes).unwrap();
        let market = MarketContext::default();
        let input = ModelInput::from_prices(&prices, &market);
        ArimaModel::default().evaluate(&input)
    }

    #[test]
    fn test_default_config() {
        let config = ArimaConfig::default();
        assert_eq!((config.max_p, config.max_d, config.max_q), (5, 2, 5));
        assert_eq!(config.forecast_cap, 20);
    }

    #[test]
    fn test_stationarity_detects_trend() {
        let trending: Vec<f64> = (0..100).map(|i| 100.0 + i as f64).collect();
        let tests = ArimaModel::test_stationarity(&trending);
        assert!(tests.adf_pvalue > 0.05);

        let flat = ar1_series(100);
        let tests = ArimaModel::test_stationarity(&flat);
        assert!(tests.adf_pvalue <= 0.05);
    }

    #[test]
    fn test_auto_order_within_bounds() {
        let model = ArimaModel::default();
        let (p, d, q) = model.auto_order(&ar1_series(120));
        assert!(p <= 5 && d <= 2 && q <= 5);
        assert!(p + q > 0);
    }

    #[test]
    fn test_fit_shapes() {
        let data = ar1_series(120);
        let result = evaluate(data.clone()).into_result();

        assert_eq!(result.fitted.len(), data.len());
        assert_eq!(result.residuals.len(), data.len());
        assert!(result.fitted.iter().all(|v| v.is_finite()));
        assert!(result.aic.is_finite());
        assert!(result.bic.is_finite());
        assert_eq!(result.parameters.ar.len(), result.order.0);
        assert_eq!(result.parameters.ma.len(), result.order.2);
    }

    #[test]
    fn test_forecast_horizon() {
        // horizon is min(20, len / 4)
        let result = evaluate(ar1_series(120)).into_result();
        assert_eq!(result.forecast.len(), 20);

        let result = evaluate(ar1_series(40)).into_result();
        assert_eq!(result.forecast.len(), 10);
    }

    #[test]
    fn test_confidence_intervals_bracket_forecast() {
        let result = evaluate(ar1_series(120)).into_result();
        assert_eq!(result.confidence_intervals.len(), result.forecast.len());
        let sigma = result.forecast_se[0];
        for (f, (lower, upper)) in result.forecast.iter().zip(&result.confidence_intervals) {
            assert_relative_eq!(*lower, f - 1.96 * sigma, epsilon = 1e-9);
            assert_relative_eq!(*upper, f + 1.96 * sigma, epsilon = 1e-9);
            assert!(lower <= upper);
        }
    }

    #[test]
    fn test_forecast_tracks_level() {
        // forecasts of a mean-reverting series should stay near its level
        let result = evaluate(ar1_series(200)).into_result();
        for value in &result.forecast {
            assert!(*value > 80.0 && *value < 120.0);
        }
    }

    #[test]
    fn test_short_series_degrades_to_flat_fit() {
        let outcome = evaluate(vec![100.0, 101.0, 102.0]);
        assert!(outcome.is_degraded());
        let result = outcome.result();
        assert_eq!(result.fitted.len(), 3);
        assert!(!result.forecast.is_empty());
        assert!(result.forecast.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_empty_series_falls_back() {
        let outcome = evaluate(vec![]);
        assert!(outcome.is_degraded());
        assert!(outcome.result().fitted.is_empty());
    }

    #[test]
    fn test_solve_least_squares_recovers_line() {
        // y = 2 + 3x
        let design: Vec<Vec<f64>> = (0..10).map(|i| vec![1.0, i as f64]).collect();
        let targets: Vec<f64> = (0..10).map(|i| 2.0 + 3.0 * i as f64).collect();
        let coeffs = solve_least_squares(&design, &targets).unwrap();
        assert_relative_eq!(coeffs[0], 2.0, epsilon = 1e-9);
        assert_relative_eq!(coeffs[1], 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_solve_singular_returns_none() {
        // duplicate columns make the system singular
        let design: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64, i as f64]).collect();
        let targets: Vec<f64> = (0..10).map(|i| i as f64).collect();
        assert!(solve_least_squares(&design, &targets).is_none());
    }
}
