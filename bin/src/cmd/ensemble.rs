//! Ensemble consensus command implementation.

use std::path::Path;

use anyhow::Result;

use mirador_ensemble::Ensemble;
use mirador_traits::{MarketContext, ModelInput};

use crate::cmd::OutputFormat;
use crate::data;

/// Run the full model ensemble over a CSV price history.
pub(crate) fn run(
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

    let ensemble = Ensemble::with_default_models();
    let prediction = ensemble.predict(&input);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&prediction)?);
        }
        OutputFormat::Text => {
            let consensus = &prediction.consensus;
            println!("Consensus prediction: {:.2}", consensus.predicted_value);
            println!("Consensus confidence: {:.2}", consensus.confidence);
            println!("Consensus signal:     {}", consensus.signal);
            println!("Consensus risk:       {}", consensus.risk);
            println!(
                "Contributing models:  {} of {}",
                consensus.contributing, consensus.total
            );
            println!("Prediction variance:  {:.4}", consensus.prediction_variance);

            println!("\nVotes:");
            println!("{}", "-".repeat(60));
            for vote in &prediction.votes {
                let marker = if vote.is_valid() { ' ' } else { 'x' };
                println!(
                    "{marker} {:18} {:>10.2}  conf {:.2}  {:11} {}",
                    vote.model,
                    vote.predicted_value,
                    vote.confidence,
                    vote.signal.as_str(),
                    vote.risk
                );
            }
            println!(
                "\nCategory scores: valuation {:.2}, time-series {:.2}, technical {:.2}, regime {:.2}",
                prediction.scores.valuation,
                prediction.scores.time_series,
                prediction.scores.technical,
                prediction.scores.regime
            );
        }
    }

    Ok(())
}
