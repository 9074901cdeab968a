//! Numeric utility functions shared by the indicator models.
//!
//! Everything here is a total function over well-formed numeric input:
//! malformed strings parse to `None`, empty series produce empty (or `None`)
//! outputs, and windows larger than the data fall back to using all
//! available points. Nothing panics, because the models that call these
//! functions promise never to fail.

use ndarray::Array1;

/// Minimum threshold for standard deviation to avoid division by zero.
/// Values below this threshold are treated as zero variance.
pub const MIN_STD_THRESHOLD: f64 = 1e-10;

/// Parses a human-abbreviated quantity like `"1.50B"` or `"250M"` into a
/// plain float (`1.5e9`, `2.5e8`). Recognizes `K`, `M`, `B`, `T` suffixes,
/// case-insensitively, with or without a suffix. Malformed input yields
/// `None`.
#[must_use]
pub fn parse_abbreviated(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let (number, multiplier) = match s.chars().last()? {
        'k' | 'K' => (&s[..s.len() - 1], 1e3),
        'm' | 'M' => (&s[..s.len() - 1], 1e6),
        'b' | 'B' => (&s[..s.len() - 1], 1e9),
        't' | 'T' => (&s[..s.len() - 1], 1e12),
        _ => (s, 1.0),
    };
    let value: f64 = number.trim().parse().ok()?;
    value.is_finite().then(|| value * multiplier)
}

/// Parses a percentage string like `"2.5%"` into a fraction (`0.025`).
/// A bare number is treated as already-percent (`"2.5"` is also `0.025`).
/// Malformed input yields `None`.
#[must_use]
pub fn parse_percent(s: &str) -> Option<f64> {
    let s = s.trim();
    let s = s.strip_suffix('%').unwrap_or(s);
    let value: f64 = s.trim().parse().ok()?;
    value.is_finite().then(|| value / 100.0)
}

/// Period-over-period simple returns. Empty or single-element input yields
/// an empty vector; zero denominators yield 0.
#[must_use]
pub fn simple_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .map(|w| if w[0] != 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

/// Period-over-period log returns. Non-positive ratios yield 0.
#[must_use]
pub fn log_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .map(|w| {
            let ratio = if w[0] > 0.0 { w[1] / w[0] } else { 0.0 };
            if ratio > 0.0 { ratio.ln() } else { 0.0 }
        })
        .collect()
}

/// Arithmetic mean. `None` on empty input.
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (N-1 denominator). Zero for fewer than two
/// points.
#[must_use]
pub fn std_dev(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n - 1) as f64;
    variance.sqrt()
}

/// Population standard deviation (N denominator). Zero on empty input.
/// Volatility estimates use this variant.
#[must_use]
pub fn std_pop(values: &[f64]) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    let m = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / n as f64;
    variance.sqrt()
}

/// Rolling mean with the given window. Output has the same length as the
/// input; positions before a full window use all available data.
#[must_use]
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    values
        .iter()
        .enumerate()
        .map(|(i, _)| {
            let start = i.saturating_sub(window - 1);
            let slice = &values[start..=i];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

/// Rolling population standard deviation with the given window. Same
/// length-preserving, all-available-data semantics as [`rolling_mean`].
#[must_use]
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    values
        .iter()
        .enumerate()
        .map(|(i, _)| {
            let start = i.saturating_sub(window - 1);
            std_pop(&values[start..=i])
        })
        .collect()
}

/// An ordinary-least-squares line fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    /// Slope of the fitted line.
    pub slope: f64,
    /// Intercept of the fitted line.
    pub intercept: f64,
    /// Pearson correlation coefficient.
    pub r: f64,
    /// Coefficient of determination.
    pub r_squared: f64,
}

/// Least-squares linear regression of `ys` on `xs`. `None` when fewer than
/// two points are supplied or `xs` has no variance.
#[must_use]
pub fn linear_regression(xs: &[f64], ys: &[f64]) -> Option<LinearFit> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let xs = &xs[..n];
    let ys = &ys[..n];

    let mean_x = xs.iter().sum::<f64>() / n as f64;
    let mean_y = ys.iter().sum::<f64>() / n as f64;

    let mut ss_xx = 0.0;
    let mut ss_yy = 0.0;
    let mut ss_xy = 0.0;
    for i in 0..n {
        let dx = xs[i] - mean_x;
        let dy = ys[i] - mean_y;
        ss_xx += dx * dx;
        ss_yy += dy * dy;
        ss_xy += dx * dy;
    }

    if ss_xx < MIN_STD_THRESHOLD {
        return None;
    }

    let slope = ss_xy / ss_xx;
    let intercept = mean_y - slope * mean_x;
    let r = if ss_yy < MIN_STD_THRESHOLD {
        0.0
    } else {
        ss_xy / (ss_xx * ss_yy).sqrt()
    };

    Some(LinearFit {
        slope,
        intercept,
        r,
        r_squared: r * r,
    })
}

/// Slope of a least-squares line through `ys` against their indices.
/// `None` for fewer than two points.
#[must_use]
pub fn trend_slope(ys: &[f64]) -> Option<f64> {
    let xs: Vec<f64> = (0..ys.len()).map(|i| i as f64).collect();
    linear_regression(&xs, ys).map(|fit| fit.slope)
}

/// Autocorrelation of a series at the given lag. `NaN` when the series is
/// too short or has no variance.
#[must_use]
pub fn autocorrelation(series: &[f64], lag: usize) -> f64 {
    if series.len() <= lag {
        return f64::NAN;
    }

    let n = series.len() - lag;
    let m = series.iter().sum::<f64>() / series.len() as f64;

    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for i in 0..n {
        numerator += (series[i] - m) * (series[i + lag] - m);
    }
    for val in series {
        denominator += (val - m).powi(2);
    }

    if denominator == 0.0 {
        f64::NAN
    } else {
        numerator / denominator
    }
}

/// Z-score standardization result containing computed statistics.
#[derive(Debug, Clone, Copy)]
pub struct StandardizeResult {
    /// The computed mean of the input values.
    pub mean: f64,
    /// The computed sample standard deviation (N-1 denominator).
    pub std: f64,
    /// Whether the standardization was applied (false if variance was too low).
    pub applied: bool,
}

/// Standardize a slice of f64 values to z-scores (mean=0, std=1).
///
/// Uses sample standard deviation (N-1 denominator). If the standard
/// deviation is below [`MIN_STD_THRESHOLD`], returns zeros. Non-finite
/// values are excluded from the statistics and map to `NaN` in the output.
#[must_use]
pub fn standardize(values: &[f64]) -> (Vec<f64>, StandardizeResult) {
    if values.is_empty() {
        return (
            Vec::new(),
            StandardizeResult {
                mean: f64::NAN,
                std: f64::NAN,
                applied: false,
            },
        );
    }

    let finite_values: Vec<f64> = values.iter().filter(|x| x.is_finite()).copied().collect();

    if finite_values.is_empty() {
        return (
            vec![f64::NAN; values.len()],
            StandardizeResult {
                mean: f64::NAN,
                std: f64::NAN,
                applied: false,
            },
        );
    }

    let n = finite_values.len();
    let m = finite_values.iter().sum::<f64>() / n as f64;
    let variance = if n > 1 {
        finite_values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n - 1) as f64
    } else {
        0.0
    };
    let std = variance.sqrt();

    let applied = std > MIN_STD_THRESHOLD;

    let standardized = if applied {
        values.iter().map(|x| (x - m) / std).collect()
    } else {
        vec![0.0; values.len()]
    };

    (standardized, StandardizeResult { mean: m, std, applied })
}

/// Standardize an ndarray `Array1` to z-scores (mean=0, std=1), returning
/// zeros when the variance is below [`MIN_STD_THRESHOLD`].
#[must_use]
pub fn standardize_array(scores: &Array1<f64>) -> (Array1<f64>, StandardizeResult) {
    if scores.is_empty() {
        return (
            Array1::zeros(0),
            StandardizeResult {
                mean: f64::NAN,
                std: f64::NAN,
                applied: false,
            },
        );
    }

    let m = scores.mean().unwrap_or(0.0);
    let std = scores.std(1.0); // ddof=1 for sample std

    let applied = std > MIN_STD_THRESHOLD;

    let standardized = if applied {
        (scores - m) / std
    } else {
        Array1::zeros(scores.len())
    };

    (standardized, StandardizeResult { mean: m, std, applied })
}
