//! Single-model analysis command implementation.

use std::path::Path;

use anyhow::{bail, Result};

use mirador_models::regime::VolatilityRegimeModel;
use mirador_models::technical::IchimokuModel;
use mirador_models::timeseries::{ArimaModel, FeaturePipeline};
use mirador_models::valuation::{DcfModel, FamaFrenchModel};
use mirador_traits::{IndicatorModel, MarketContext, ModelInput};

use crate::cmd::{emit, OutputFormat};
use crate::data;

/// Run one indicator model over a CSV price history.
pub(crate) fn run(
    model: &str,
    data_path: &Path,
    fundamentals_path: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let prices = data::load_prices(data_path)?;
    let fundamentals = fundamentals_path.map(data::load_fundamentals).transpose()?;
    let market = MarketContext::default();

    let input = match &fundamentals {
        Some(snapshot) => ModelInput::new(&prices, snapshot, &market),
        None => ModelInput::from_prices(&prices, &market),
    };

    match model {
        "dcf" => {
            let outcome = DcfModel::default().evaluate(&input);
            emit(format, &outcome, |r| {
                vec![
                    format!("Fair value per share: {:.2}", r.fair_value_per_share),
                    format!("Current price:        {:.2}", r.current_price),
                    format!("Upside/downside:      {:+.1}%", r.upside_pct),
                    format!("Enterprise value:     {:.3e}", r.enterprise_value),
                    format!("Signal:               {}", r.signal),
                    format!("Confidence:           {:.2}", r.confidence),
                    format!("Interpretation:       {}", r.interpretation),
                ]
            })
        }
        "fama_french" => {
            let outcome = FamaFrenchModel::default().evaluate(&input);
            emit(format, &outcome, |r| {
                vec![
                    format!("3-factor expected return: {:+.2}%", r.expected_return_3f * 100.0),
                    format!("5-factor expected return: {:+.2}%", r.expected_return_5f * 100.0),
                    format!(
                        "Loadings: market {:.2}, size {:.2}, value {:.2}, prof {:.2}, inv {:.2}",
                        r.loadings.market,
                        r.loadings.size,
                        r.loadings.value,
                        r.loadings.profitability,
                        r.loadings.investment
                    ),
                    format!("R² (heuristic):           {:.2} / {:.2}", r.r_squared_3f, r.r_squared_5f),
                    format!("Confidence:               {:.2}", r.confidence),
                    format!("Interpretation:           {}", r.interpretation),
                ]
            })
        }
        "arima" => {
            let outcome = ArimaModel::default().evaluate(&input);
            emit(format, &outcome, |r| {
                let mut lines = vec![
                    format!("Order (p, d, q):  ({}, {}, {})", r.order.0, r.order.1, r.order.2),
                    format!("AIC / BIC:        {:.2} / {:.2}", r.aic, r.bic),
                    format!("Forecast horizon: {} steps", r.forecast.len()),
                ];
                if let (Some(first), Some(last)) = (r.forecast.first(), r.forecast.last()) {
                    lines.push(format!("Forecast:         {first:.2} .. {last:.2}"));
                }
                lines
            })
        }
        "ichimoku" => {
            let outcome = IchimokuModel::default().evaluate(&input);
            emit(format, &outcome, |r| {
                let tags: Vec<String> = r.signals.iter().map(|s| format!("{s:?}")).collect();
                let mut lines = vec![
                    format!("Signals:        {}", tags.join(", ")),
                    format!("Confidence:     {:.2}", r.confidence),
                    format!("Interpretation: {}", r.interpretation),
                ];
                if let (Some(tenkan), Some(kijun)) = (r.tenkan_sen.last(), r.kijun_sen.last()) {
                    lines.insert(0, format!("Tenkan / Kijun: {tenkan:.2} / {kijun:.2}"));
                }
                lines
            })
        }
        "volatility_regime" => {
            let outcome = VolatilityRegimeModel::new().evaluate(&input);
            emit(format, &outcome, |r| {
                vec![
                    format!("Regime:          {:?}", r.analysis.current_regime),
                    format!("Probability:     {:.2}", r.analysis.regime_probability),
                    format!("Persistence:     {:.2}", r.analysis.persistence),
                    format!("Short-term vol:  {:.1}%", r.metrics.short_term_vol * 100.0),
                    format!("Signal:          {}", r.signal),
                    format!("Risk level:      {}", r.risk_level),
                    format!("Confidence:      {:.2}", r.confidence),
                ]
            })
        }
        "features" => {
            let outcome = FeaturePipeline::default().create_features(&prices);
            let matrix = outcome.result();
            match format {
                OutputFormat::Json => {
                    let summary = serde_json::json!({
                        "rows": matrix.len(),
                        "features": matrix.names,
                        "degraded": outcome.is_degraded(),
                    });
                    println!("{}", serde_json::to_string_pretty(&summary)?);
                }
                OutputFormat::Text => {
                    if let Some(reason) = outcome.reason() {
                        println!("note: degraded result ({reason})\n");
                    }
                    println!("Rows:     {}", matrix.len());
                    println!("Features: {}", matrix.names.len());
                    println!("Names:    {}", matrix.names.join(", "));
                }
            }
            Ok(())
        }
        other => bail!(
            "unknown model '{other}'; run `mirador models` for the available set \
             (exchange flow has its own `flows` subcommand)"
        ),
    }
}
