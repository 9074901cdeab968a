//! CLI subcommand implementations.

pub(crate) mod analyze;
pub(crate) mod ensemble;
pub(crate) mod flows;
pub(crate) mod models;

use clap::ValueEnum;
use serde::Serialize;

use mirador_traits::Evaluation;

/// Output format for analysis results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable summary.
    Text,
    /// Pretty-printed JSON of the full result.
    Json,
}

/// Prints an evaluation either as JSON (the full tagged result) or as a
/// text summary with a degradation note when applicable.
pub(crate) fn emit<T: Serialize>(
    format: OutputFormat,
    outcome: &Evaluation<T>,
    summarize: impl Fn(&T) -> Vec<String>,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(outcome)?),
        OutputFormat::Text => {
            if let Some(reason) = outcome.reason() {
                println!("note: degraded result ({reason})\n");
            }
            for line in summarize(outcome.result()) {
                println!("{line}");
            }
        }
    }
    Ok(())
}
