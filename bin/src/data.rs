//! Local data loading for the CLI.

use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;

use mirador_traits::{FundamentalSnapshot, PriceSeries};

/// Loads an OHLCV price history from a CSV file with `open`, `high`, `low`,
/// `close` and `volume` columns and an optional `date` column.
pub(crate) fn load_prices(path: &Path) -> Result<PriceSeries> {
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("cannot open {}", path.display()))?
        .finish()
        .with_context(|| format!("cannot parse {}", path.display()))?;

    // A textual date column is parsed if possible, otherwise ignored
    if let Ok(col) = df.column("date")
        && col.dtype() != &DataType::Date
    {
        match col.as_materialized_series().cast(&DataType::Date) {
            Ok(parsed) => {
                df.replace("date", parsed)?;
            }
            Err(_) => {
                tracing::warn!("date column is not parseable as dates; ignoring it");
                let _ = df.drop_in_place("date");
            }
        }
    }

    PriceSeries::try_from_frame(df)
        .with_context(|| format!("{} is not a valid price history", path.display()))
}

/// Loads a fundamental snapshot from a JSON file keyed by metric name.
pub(crate) fn load_fundamentals(path: &Path) -> Result<FundamentalSnapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid fundamentals file", path.display()))
}

/// Loads an exchange flow history from a CSV file with `inflow`, `outflow`,
/// `exchange_balance` and `total_supply` columns.
pub(crate) fn load_flows(path: &Path) -> Result<mirador_models::flow::FlowSeries> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("cannot open {}", path.display()))?
        .finish()
        .with_context(|| format!("cannot parse {}", path.display()))?;

    let column = |name: &str| -> Result<Vec<f64>> {
        let col = df
            .column(name)
            .with_context(|| format!("missing column {name}"))?;
        let casted = col.as_materialized_series().cast(&DataType::Float64)?;
        Ok(casted
            .f64()?
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect())
    };

    mirador_models::flow::FlowSeries::new(
        None,
        column("inflow")?,
        column("outflow")?,
        column("exchange_balance")?,
        column("total_supply")?,
    )
    .with_context(|| format!("{} is not a valid flow history", path.display()))
}
