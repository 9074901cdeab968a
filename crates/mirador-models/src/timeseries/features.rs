//! Deterministic feature engineering for sequence models.
//!
//! Turns an OHLCV history into a dense feature matrix (moving averages and
//! ratios, volatility, RSI, MACD, Bollinger bands, momentum, lags, calendar
//! and volume features) and windows it into (X, y) training pairs. This is
//! pure data transformation; fitting whatever consumes the tensors is the
//! caller's concern.

use chrono::Datelike;
use ndarray::{Array1, Array2, Array3};
use serde::{Deserialize, Serialize};

use mirador_traits::stats::{log_returns, simple_returns, standardize, std_dev, StandardizeResult};
use mirador_traits::{DegradeReason, Evaluation, PriceSeries};

/// Configuration for the feature pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Lookback periods for moving averages and volatility features.
    pub lookback_periods: Vec<usize>,
    /// RSI period.
    pub rsi_period: usize,
    /// MACD fast EMA span.
    pub macd_fast: usize,
    /// MACD slow EMA span.
    pub macd_slow: usize,
    /// MACD signal EMA span.
    pub macd_signal: usize,
    /// Bollinger band period.
    pub bollinger_period: usize,
    /// Bollinger band width in standard deviations.
    pub bollinger_std: f64,
    /// Momentum lags.
    pub momentum_lags: Vec<usize>,
    /// Number of price/return lag features.
    pub lag_count: usize,
    /// Volume moving-average period.
    pub volume_ma_period: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            lookback_periods: vec![5, 10, 20, 50],
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bollinger_period: 20,
            bollinger_std: 2.0,
            momentum_lags: vec![1, 3, 5, 10],
            lag_count: 5,
            volume_ma_period: 20,
        }
    }
}

/// A dense, warm-up-free feature matrix with its aligned target.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    /// Feature column names, in column order.
    pub names: Vec<String>,
    /// Row-per-bar feature values.
    pub values: Array2<f64>,
    /// Target (close) aligned with the rows.
    pub target: Vec<f64>,
}

impl FeatureMatrix {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.target.len()
    }

    /// Whether the matrix has no rows.
    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    /// A feature column by name.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.names.iter().position(|n| n == name)?;
        Some(self.values.column(idx).to_vec())
    }

    /// Column-wise z-score standardization. Returns the scaled matrix and
    /// the per-column statistics needed to scale new data the same way.
    #[must_use]
    pub fn standardized(&self) -> (Array2<f64>, Vec<StandardizeResult>) {
        let mut scaled = self.values.clone();
        let mut stats = Vec::with_capacity(self.names.len());
        for mut column in scaled.columns_mut() {
            let (values, result) = standardize(&column.to_vec());
            for (slot, v) in column.iter_mut().zip(values) {
                *slot = v;
            }
            stats.push(result);
        }
        (scaled, stats)
    }
}

/// Exponential moving average with `alpha = 2 / (span + 1)`, seeded from the
/// first value.
fn ema(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut state = f64::NAN;
    for &v in values {
        state = if state.is_nan() {
            v
        } else if v.is_nan() {
            state
        } else {
            alpha * v + (1.0 - alpha) * state
        };
        out.push(state);
    }
    out
}

/// Rolling aggregate over a full window only: positions before `window - 1`
/// and windows containing NaN produce NaN. Matches dropna-style trimming.
fn rolling_full(values: &[f64], window: usize, f: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return f64::NAN;
            }
            let slice = &values[i + 1 - window..=i];
            if slice.iter().any(|v| v.is_nan()) {
                f64::NAN
            } else {
                f(slice)
            }
        })
        .collect()
}

fn shifted(values: &[f64], lag: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            if i < lag {
                f64::NAN
            } else {
                values[i - lag]
            }
        })
        .collect()
}

/// Feature-engineering pipeline.
#[derive(Debug, Clone)]
pub struct FeaturePipeline {
    config: FeatureConfig,
}

impl FeaturePipeline {
    /// Creates a pipeline with the given configuration.
    #[must_use]
    pub const fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    /// The pipeline configuration.
    #[must_use]
    pub const fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Computes the full feature set and drops warm-up rows. The result is
    /// degraded (and empty) when no complete row survives.
    pub fn create_features(&self, prices: &PriceSeries) -> Evaluation<FeatureMatrix> {
        let close = prices.closes();
        let n = close.len();
        let cfg = &self.config;

        let mut columns: Vec<(String, Vec<f64>)> = Vec::new();

        // Returns carry a leading NaN so they stay aligned with the bars
        let mut returns = vec![f64::NAN];
        returns.extend(simple_returns(close));
        let mut log_rets = vec![f64::NAN];
        log_rets.extend(log_returns(close));
        columns.push(("returns".to_string(), returns.clone()));
        columns.push(("log_returns".to_string(), log_rets.clone()));

        for &period in &cfg.lookback_periods {
            let ma = rolling_full(close, period, |w| w.iter().sum::<f64>() / w.len() as f64);
            let ratio: Vec<f64> = close.iter().zip(&ma).map(|(c, m)| c / m).collect();
            columns.push((format!("ma_{period}"), ma));
            columns.push((format!("ma_ratio_{period}"), ratio));
        }

        for &period in &cfg.lookback_periods {
            columns.push((
                format!("volatility_{period}"),
                rolling_full(&returns, period, std_dev),
            ));
            let realized: Vec<f64> = rolling_full(&log_rets, period, std_dev)
                .into_iter()
                .map(|v| v * 252f64.sqrt())
                .collect();
            columns.push((format!("realized_vol_{period}"), realized));
        }

        columns.push(("rsi".to_string(), self.rsi(close)));

        let (macd, macd_signal) = self.macd(close);
        columns.push(("macd".to_string(), macd));
        columns.push(("macd_signal".to_string(), macd_signal));

        let (bb_upper, bb_lower, bb_width) = self.bollinger(close);
        columns.push(("bb_upper".to_string(), bb_upper));
        columns.push(("bb_lower".to_string(), bb_lower));
        columns.push(("bb_width".to_string(), bb_width));

        for &lag in &cfg.momentum_lags {
            let momentum: Vec<f64> = (0..n)
                .map(|i| {
                    if i < lag {
                        f64::NAN
                    } else {
                        close[i] / close[i - lag] - 1.0
                    }
                })
                .collect();
            columns.push((format!("momentum_{lag}"), momentum));
        }

        for lag in 1..=cfg.lag_count {
            columns.push((format!("price_lag_{lag}"), shifted(close, lag)));
            columns.push((format!("return_lag_{lag}"), shifted(&returns, lag)));
        }

        if let Some(dates) = prices.dates() {
            let dow: Vec<f64> = dates
                .iter()
                .map(|d| f64::from(d.weekday().num_days_from_monday()))
                .collect();
            let month: Vec<f64> = dates.iter().map(|d| f64::from(d.month())).collect();
            let quarter: Vec<f64> = dates
                .iter()
                .map(|d| f64::from((d.month() - 1) / 3 + 1))
                .collect();
            columns.push(("day_of_week".to_string(), dow));
            columns.push(("month".to_string(), month));
            columns.push(("quarter".to_string(), quarter));
        }

        let volume = prices.volumes();
        if volume.iter().any(|&v| v > 0.0) {
            let volume_ma = rolling_full(volume, cfg.volume_ma_period, |w| {
                w.iter().sum::<f64>() / w.len() as f64
            });
            let volume_ratio: Vec<f64> = volume.iter().zip(&volume_ma).map(|(v, m)| v / m).collect();
            let price_volume: Vec<f64> = close.iter().zip(volume).map(|(c, v)| c * v).collect();
            columns.push(("volume_ma".to_string(), volume_ma));
            columns.push(("volume_ratio".to_string(), volume_ratio));
            columns.push(("price_volume".to_string(), price_volume));
        }

        let high = prices.highs();
        let low = prices.lows();
        let hl_ratio: Vec<f64> = high.iter().zip(low).map(|(h, l)| h / l).collect();
        let price_position: Vec<f64> = (0..n)
            .map(|i| {
                let range = high[i] - low[i];
                if range > 0.0 {
                    (close[i] - low[i]) / range
                } else {
                    0.5 // flat bar
                }
            })
            .collect();
        columns.push(("hl_ratio".to_string(), hl_ratio));
        columns.push(("price_position".to_string(), price_position));

        // Drop rows with any undefined feature
        let keep: Vec<usize> = (0..n)
            .filter(|&i| columns.iter().all(|(_, col)| col[i].is_finite()))
            .collect();

        let names: Vec<String> = columns.iter().map(|(name, _)| name.clone()).collect();
        let mut values = Array2::zeros((keep.len(), names.len()));
        for (row, &i) in keep.iter().enumerate() {
            for (col, (_, data)) in columns.iter().enumerate() {
                values[[row, col]] = data[i];
            }
        }
        let target: Vec<f64> = keep.iter().map(|&i| close[i]).collect();

        let matrix = FeatureMatrix {
            names,
            values,
            target,
        };
        if matrix.is_empty() {
            Evaluation::Degraded {
                result: matrix,
                reason: DegradeReason::InsufficientHistory {
                    required: cfg.lookback_periods.iter().copied().max().unwrap_or(1) + 1,
                    available: n,
                },
            }
        } else {
            Evaluation::Computed(matrix)
        }
    }

    /// Slides a window over the feature matrix: each X window covers
    /// `sequence_length` rows of every feature, and y is the target
    /// `forecast_horizon` steps after the window end. `None` when the matrix
    /// is too short to produce a single window.
    #[must_use]
    pub fn sequence_windows(
        matrix: &FeatureMatrix,
        sequence_length: usize,
        forecast_horizon: usize,
    ) -> Option<(Array3<f64>, Array1<f64>)> {
        let rows = matrix.len();
        let n_features = matrix.names.len();
        let sequence_length = sequence_length.max(1);
        let forecast_horizon = forecast_horizon.max(1);

        if rows + 1 < sequence_length + forecast_horizon {
            return None;
        }
        let count = rows + 1 - sequence_length - forecast_horizon;
        if count == 0 {
            return None;
        }

        let mut x = Array3::zeros((count, sequence_length, n_features));
        let mut y = Array1::zeros(count);
        for (w, start) in (sequence_length..sequence_length + count).enumerate() {
            for s in 0..sequence_length {
                for f in 0..n_features {
                    x[[w, s, f]] = matrix.values[[start - sequence_length + s, f]];
                }
            }
            y[w] = matrix.target[start + forecast_horizon - 1];
        }
        Some((x, y))
    }

    /// Relative strength index over rolling average gains and losses.
    fn rsi(&self, close: &[f64]) -> Vec<f64> {
        let n = close.len();
        let mut gains = vec![f64::NAN; n.min(1)];
        let mut losses = vec![f64::NAN; n.min(1)];
        for i in 1..n {
            let delta = close[i] - close[i - 1];
            gains.push(delta.max(0.0));
            losses.push((-delta).max(0.0));
        }

        let avg = |w: &[f64]| w.iter().sum::<f64>() / w.len() as f64;
        let avg_gain = rolling_full(&gains, self.config.rsi_period, avg);
        let avg_loss = rolling_full(&losses, self.config.rsi_period, avg);

        avg_gain
            .iter()
            .zip(&avg_loss)
            .map(|(g, l)| {
                if g.is_nan() || l.is_nan() {
                    f64::NAN
                } else if *l == 0.0 {
                    100.0
                } else {
                    100.0 - 100.0 / (1.0 + g / l)
                }
            })
            .collect()
    }

    fn macd(&self, close: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let fast = ema(close, self.config.macd_fast);
        let slow = ema(close, self.config.macd_slow);
        let macd: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        let signal = ema(&macd, self.config.macd_signal);
        (macd, signal)
    }

    fn bollinger(&self, close: &[f64]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let period = self.config.bollinger_period;
        let width = self.config.bollinger_std;
        let ma = rolling_full(close, period, |w| w.iter().sum::<f64>() / w.len() as f64);
        let std = rolling_full(close, period, std_dev);

        let upper: Vec<f64> = ma.iter().zip(&std).map(|(m, s)| m + s * width).collect();
        let lower: Vec<f64> = ma.iter().zip(&std).map(|(m, s)| m - s * width).collect();
        let band_width: Vec<f64> = upper
            .iter()
            .zip(&lower)
            .zip(&ma)
            .map(|((u, l), m)| (u - l) / m)
            .collect();
        (upper, lower, band_width)
    }
}

impl Default for FeaturePipeline {
    fn default() -> Self {
        Self::new(FeatureConfig::default())
    }
}
