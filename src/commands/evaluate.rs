//! Evaluate command - Re-estimate from a saved comparables snapshot

use anyhow::{bail, Result};
use colored::Colorize;
use std::path::Path;
use tracing::info;

use rag_imobiliar::pricing::report::{load_comparables, write_json, PricingReport};
use rag_imobiliar::{estimate, Config, PipelineError};

/// Run evaluate command
pub fn run(
    config: &Config,
    comparables_path: Option<&Path>,
    price: Option<f64>,
    sqm: Option<f64>,
    output: Option<&Path>,
    json: bool,
) -> Result<()> {
    let Some(path) = comparables_path.or(config.output.snapshot_path.as_deref()) else {
        bail!("no comparables snapshot configured; pass --comparables <file>");
    };

    let comparables = load_comparables(path)?;
    info!(count = comparables.len(), path = %path.display(), "loaded comparables snapshot");

    let estimation = match estimate(&comparables, price, sqm) {
        Ok(e) => e,
        Err(e) => super::fail(&PipelineError::from(e), json),
    };

    let report = PricingReport {
        estimation,
        comparables_used: comparables,
    };
    if let Some(out) = output {
        write_json(out, &report)?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{} Snapshot: {}", "→".dimmed(), path.display());
        println!();
        super::estimate::print_comparables(&report.comparables_used);
        println!();
        super::estimate::print_estimation(&report.estimation, price);
        if let Some(out) = output {
            println!();
            println!("{} Report written to {}", "✓".green().bold(), out.display());
        }
    }

    Ok(())
}
