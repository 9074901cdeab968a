//! Model listing command implementation.

use anyhow::Result;

use mirador_models::registry::{available_models, ModelCategory};

/// List available models, optionally filtered by category.
pub(crate) fn list_models(category: Option<String>, verbose: bool) -> Result<()> {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                     Available Models                         ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let categories = [
        (ModelCategory::Valuation, "Valuation"),
        (ModelCategory::TimeSeries, "Time Series"),
        (ModelCategory::Technical, "Technical"),
        (ModelCategory::Regime, "Regime"),
        (ModelCategory::Flow, "Flow"),
    ];

    for (cat, cat_name) in categories {
        if let Some(ref filter) = category
            && !cat_name.to_lowercase().contains(&filter.to_lowercase())
        {
            continue;
        }

        let cat_models: Vec<_> = available_models()
            .into_iter()
            .filter(|info| info.category == cat)
            .collect();
        if cat_models.is_empty() {
            continue;
        }

        println!("{cat_name}:");
        println!("{}", "-".repeat(60));

        for info in cat_models {
            if verbose {
                println!(
                    "  {:20} - {} (min history: {} bars{})",
                    info.name,
                    info.description,
                    info.min_history,
                    if info.requires_fundamentals {
                        ", needs fundamentals"
                    } else {
                        ""
                    }
                );
            } else {
                println!("  {}", info.name);
            }
        }
        println!();
    }

    if !verbose {
        println!("Use --verbose for detailed model descriptions.\n");
    }

    Ok(())
}
