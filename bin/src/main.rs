//! Mirador CLI binary.
//!
//! Runs the indicator models and the ensemble over local CSV/JSON data.

mod cmd;
mod data;

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::OutputFormat;

#[derive(Parser)]
#[command(name = "mirador")]
#[command(about = "Quantitative indicator computation engine", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available models
    Models {
        /// Filter by category
        #[arg(short, long)]
        category: Option<String>,

        /// Show detailed information
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run one model over a price history
    Analyze {
        /// Model name (see `mirador models`)
        model: String,

        /// OHLCV CSV file
        #[arg(short, long)]
        data: PathBuf,

        /// Fundamentals JSON file
        #[arg(short, long)]
        fundamentals: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Run the full model ensemble over a price history
    Ensemble {
        /// OHLCV CSV file
        #[arg(short, long)]
        data: PathBuf,

        /// Fundamentals JSON file
        #[arg(short, long)]
        fundamentals: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Analyze exchange flows from a flow history
    Flows {
        /// Flow CSV file (inflow, outflow, exchange_balance, total_supply)
        #[arg(short, long)]
        data: PathBuf,

        /// Asset ticker
        #[arg(short, long, default_value = "BTC")]
        asset: String,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Models { category, verbose } => cmd::models::list_models(category, verbose),
        Commands::Analyze {
            model,
            data,
            fundamentals,
            format,
        } => cmd::analyze::run(&model, &data, fundamentals.as_deref(), format),
        Commands::Ensemble {
            data,
            fundamentals,
            format,
        } => cmd::ensemble::run(&data, fundamentals.as_deref(), format),
        Commands::Flows { data, asset, format } => cmd::flows::run(&data, asset, format),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}
