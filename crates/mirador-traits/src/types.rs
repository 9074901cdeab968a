//! Common data types used throughout the Mirador engine.
//!
//! This module defines the validated market-data containers that every
//! indicator model consumes: [`PriceSeries`] for OHLCV history,
//! [`FundamentalSnapshot`] for point-in-time financial metrics, and
//! [`MarketContext`] for economy-wide inputs.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{MiradorError, Result};

// Re-export date type from chrono
pub use chrono::NaiveDate as Date;

/// A market symbol identifier, e.g. "AAPL" or "BTC".
pub type Symbol = String;

/// Days offset between CE day numbering and the Unix epoch used by Polars
/// date columns.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn column_f64(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let col = df
        .column(name)
        .map_err(|_| MiradorError::MissingColumn(name.to_string()))?;
    let casted = col.as_materialized_series().cast(&DataType::Float64)?;
    Ok(casted
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

/// A validated OHLCV price history for a single symbol.
///
/// Rows are chronologically ascending with no duplicate timestamps, and every
/// row satisfies `high >= max(open, close)`, `low <= min(open, close)` and
/// `close > 0`. Construction is the only fallible boundary: once a
/// `PriceSeries` exists, every accessor is infallible, which is what lets the
/// models uphold their never-fails evaluation contract.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    data: DataFrame,
    open: Vec<f64>,
    high: Vec<f64>,
    low: Vec<f64>,
    close: Vec<f64>,
    volume: Vec<f64>,
    dates: Option<Vec<Date>>,
}

impl PriceSeries {
    /// Builds a price series from a DataFrame with `open`, `high`, `low`,
    /// `close` and `volume` columns (any numeric dtype) and an optional
    /// `date` column.
    ///
    /// # Errors
    ///
    /// Returns an error if a required column is missing, a row violates the
    /// OHLC invariants, or dates are not strictly ascending.
    pub fn try_from_frame(data: DataFrame) -> Result<Self> {
        let open = column_f64(&data, "open")?;
        let high = column_f64(&data, "high")?;
        let low = column_f64(&data, "low")?;
        let close = column_f64(&data, "close")?;
        let volume = column_f64(&data, "volume")?;

        let dates = match data.column("date") {
            Ok(col) => {
                let parsed: Vec<Date> = col
                    .as_materialized_series()
                    .date()?
                    .into_iter()
                    .map(|d: Option<i32>| {
                        d.and_then(|d| Date::from_num_days_from_ce_opt(d + EPOCH_DAYS_FROM_CE))
                            .ok_or_else(|| {
                                MiradorError::InvalidData("null or out-of-range date".to_string())
                            })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Some(parsed)
            }
            Err(_) => None,
        };

        Self::validate(&open, &high, &low, &close, dates.as_deref())?;

        Ok(Self {
            data,
            open,
            high,
            low,
            close,
            volume,
            dates,
        })
    }

    /// Builds a price series from raw column vectors.
    ///
    /// # Errors
    ///
    /// Returns an error if columns have mismatched lengths or any row
    /// violates the OHLC invariants.
    pub fn from_columns(
        dates: Option<Vec<Date>>,
        open: Vec<f64>,
        high: Vec<f64>,
        low: Vec<f64>,
        close: Vec<f64>,
        volume: Vec<f64>,
    ) -> Result<Self> {
        let n = close.len();
        if open.len() != n || high.len() != n || low.len() != n || volume.len() != n {
            return Err(MiradorError::InvalidData(
                "price columns have mismatched lengths".to_string(),
            ));
        }
        if let Some(d) = &dates
            && d.len() != n
        {
            return Err(MiradorError::InvalidData(
                "date column length does not match prices".to_string(),
            ));
        }

        Self::validate(&open, &high, &low, &close, dates.as_deref())?;

        let mut data = df! {
            "open" => &open,
            "high" => &high,
            "low" => &low,
            "close" => &close,
            "volume" => &volume,
        }?;
        if let Some(d) = &dates {
            let date_series = Series::new("date".into(), d.clone());
            data.insert_column(0, date_series)?;
        }

        Ok(Self {
            data,
            open,
            high,
            low,
            close,
            volume,
            dates,
        })
    }

    /// Builds a degenerate series from closes alone, with `open == high ==
    /// low == close` and zero volume. Useful for models that only read the
    /// close column.
    ///
    /// # Errors
    ///
    /// Returns an error if any close is non-positive or non-finite.
    pub fn from_closes(close: Vec<f64>) -> Result<Self> {
        let n = close.len();
        Self::from_columns(
            None,
            close.clone(),
            close.clone(),
            close.clone(),
            close,
            vec![0.0; n],
        )
    }

    fn validate(
        open: &[f64],
        high: &[f64],
        low: &[f64],
        close: &[f64],
        dates: Option<&[Date]>,
    ) -> Result<()> {
        for i in 0..close.len() {
            let (o, h, l, c) = (open[i], high[i], low[i], close[i]);
            if !(o.is_finite() && h.is_finite() && l.is_finite() && c.is_finite()) {
                return Err(MiradorError::InvalidData(format!(
                    "non-finite price at row {i}"
                )));
            }
            if c <= 0.0 {
                return Err(MiradorError::InvalidData(format!(
                    "non-positive close {c} at row {i}"
                )));
            }
            if h < o.max(c) {
                return Err(MiradorError::InvalidData(format!(
                    "high {h} below max(open, close) at row {i}"
                )));
            }
            if l > o.min(c) {
                return Err(MiradorError::InvalidData(format!(
                    "low {l} above min(open, close) at row {i}"
                )));
            }
        }
        if let Some(dates) = dates {
            for w in dates.windows(2) {
                if w[1] <= w[0] {
                    return Err(MiradorError::InvalidData(format!(
                        "timestamps not strictly ascending: {} then {}",
                        w[0], w[1]
                    )));
                }
            }
        }
        Ok(())
    }

    /// Returns a reference to the underlying DataFrame.
    pub const fn data(&self) -> &DataFrame {
        &self.data
    }

    /// Number of bars in the series.
    pub const fn len(&self) -> usize {
        self.close.len()
    }

    /// Whether the series contains no bars.
    pub const fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    /// Open prices.
    pub fn opens(&self) -> &[f64] {
        &self.open
    }

    /// High prices.
    pub fn highs(&self) -> &[f64] {
        &self.high
    }

    /// Low prices.
    pub fn lows(&self) -> &[f64] {
        &self.low
    }

    /// Close prices.
    pub fn closes(&self) -> &[f64] {
        &self.close
    }

    /// Traded volumes.
    pub fn volumes(&self) -> &[f64] {
        &self.volume
    }

    /// Bar dates, when the source carried a `date` column.
    pub fn dates(&self) -> Option<&[Date]> {
        self.dates.as_deref()
    }

    /// The most recent close, if any bars exist.
    pub fn last_close(&self) -> Option<f64> {
        self.close.last().copied()
    }
}

/// A point-in-time view of a company's financial metrics.
///
/// Every field is optional: providers routinely omit metrics, and the models
/// treat absence as "use a documented default or skip the derived value",
/// never as an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FundamentalSnapshot {
    /// Trailing twelve-month revenue.
    pub revenue: Option<f64>,
    /// Trailing twelve-month net income.
    pub net_income: Option<f64>,
    /// Trailing twelve-month free cash flow.
    pub free_cash_flow: Option<f64>,
    /// Total debt outstanding.
    pub total_debt: Option<f64>,
    /// Net debt (total debt minus cash equivalents).
    pub net_debt: Option<f64>,
    /// Cash and cash equivalents.
    pub cash: Option<f64>,
    /// Shares outstanding.
    pub shares_outstanding: Option<f64>,
    /// Total shareholders' equity.
    pub shareholders_equity: Option<f64>,
    /// Book value per share.
    pub book_value_per_share: Option<f64>,
    /// Market capitalization.
    pub market_cap: Option<f64>,
    /// Market beta.
    pub beta: Option<f64>,
    /// Return on equity, as a fraction.
    pub roe: Option<f64>,
    /// Dividend yield, as a fraction.
    pub dividend_yield: Option<f64>,
    /// Year-over-year revenue growth, as a fraction.
    pub revenue_growth: Option<f64>,
    /// Year-over-year earnings growth, as a fraction.
    pub earnings_growth: Option<f64>,
}

impl FundamentalSnapshot {
    /// Return on equity: the reported figure if present, otherwise derived
    /// from net income over shareholders' equity.
    pub fn roe_or_derived(&self) -> Option<f64> {
        self.roe.or_else(|| {
            let ni = self.net_income?;
            let eq = self.shareholders_equity?;
            (eq > 0.0).then(|| ni / eq)
        })
    }

    /// Price-to-book ratio at the given share price.
    pub fn price_to_book(&self, price: f64) -> Option<f64> {
        let bvps = self.book_value_per_share?;
        (bvps > 0.0).then(|| price / bvps)
    }
}

/// Economy-wide inputs shared across models.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketContext {
    /// Risk-free rate, as a fraction.
    pub risk_free_rate: f64,
    /// Expected broad-market return, as a fraction.
    pub market_return: f64,
    /// Inflation rate, as a fraction.
    pub inflation_rate: f64,
    /// GDP growth, as a fraction.
    pub gdp_growth: f64,
    /// Broad-market volatility, annualized.
    pub market_volatility: f64,
}

impl Default for MarketContext {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.03,
            market_return: 0.10,
            inflation_rate: 0.025,
            gdp_growth: 0.025,
            market_volatility: 0.15,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_closes() {
        let series = PriceSeries::from_closes(vec![100.0, 101.0, 102.0]).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.closes(), &[100.0, 101.0, 102.0]);
        assert_eq!(series.last_close(), Some(102.0));
        assert!(series.dates().is_none());
    }

    #[test]
    fn test_from_columns_validates_ohlc() {
        // high below close must be rejected
        let result = PriceSeries::from_columns(
            None,
            vec![100.0],
            vec![99.0],
            vec![98.0],
            vec![100.0],
            vec![0.0],
        );
        assert!(result.is_err());

        // low above open must be rejected
        let result = PriceSeries::from_columns(
            None,
            vec![100.0],
            vec![103.0],
            vec![101.0],
            vec![102.0],
            vec![0.0],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_non_positive_close() {
        assert!(PriceSeries::from_closes(vec![100.0, 0.0]).is_err());
        assert!(PriceSeries::from_closes(vec![100.0, -1.0]).is_err());
    }

    #[test]
    fn test_rejects_unordered_dates() {
        let dates = vec![
            Date::from_ymd_opt(2024, 1, 2).unwrap(),
            Date::from_ymd_opt(2024, 1, 1).unwrap(),
        ];
        let result = PriceSeries::from_columns(
            Some(dates),
            vec![100.0, 100.0],
            vec![101.0, 101.0],
            vec![99.0, 99.0],
            vec![100.0, 100.0],
            vec![0.0, 0.0],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_try_from_frame() {
        let df = df! {
            "open" => &[100.0, 101.0],
            "high" => &[102.0, 103.0],
            "low" => &[99.0, 100.0],
            "close" => &[101.0, 102.0],
            "volume" => &[1_000_000i64, 1_100_000],
        }
        .unwrap();

        let series = PriceSeries::try_from_frame(df).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.volumes(), &[1_000_000.0, 1_100_000.0]);
    }

    #[test]
    fn test_empty_series() {
        let series = PriceSeries::from_closes(vec![]).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.last_close(), None);
    }

    #[test]
    fn test_snapshot_derived_roe() {
        let snapshot = FundamentalSnapshot {
            net_income: Some(1.0e9),
            shareholders_equity: Some(5.0e9),
            ..Default::default()
        };
        assert_eq!(snapshot.roe_or_derived(), Some(0.2));

        let reported = FundamentalSnapshot {
            roe: Some(0.15),
            net_income: Some(1.0e9),
            shareholders_equity: Some(5.0e9),
            ..Default::default()
        };
        assert_eq!(reported.roe_or_derived(), Some(0.15));
    }

    #[test]
    fn test_market_context_default() {
        let market = MarketContext::default();
        assert!(market.market_return > market.risk_free_rate);
    }
}
