//! Estimate command - Fair price for a free-text listing query

use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use rag_imobiliar::pricing::explain::{ExplanationGenerator, ListingContext, TemplateExplainer};
use rag_imobiliar::pricing::report::{write_json, FinalReport};
use rag_imobiliar::{Comparable, Config, Estimation, Pipeline, PipelineInput, Verdict};

pub struct EstimateArgs<'a> {
    pub query: &'a str,
    pub k: Option<usize>,
    pub price: Option<f64>,
    pub sqm: Option<f64>,
    pub title: Option<&'a str>,
    pub export: Option<&'a Path>,
    pub explain: bool,
    pub json: bool,
}

/// Run estimate command
pub fn run(config: &Config, args: EstimateArgs<'_>) -> Result<()> {
    let db_path = &config.storage.db_path;
    if !db_path.exists() {
        eprintln!(
            "{} Index not found at {}. Run {} first.",
            "Error:".red().bold(),
            db_path.display(),
            "imobiliar index <listings.json>".cyan()
        );
        std::process::exit(1);
    }

    let pipeline = Pipeline::from_config(config)?;
    let k = config.retrieval.clamp_k(args.k);
    let input = PipelineInput::new(args.query, k)
        .with_target_price(args.price)
        .with_target_sqm(args.sqm);

    let filters = pipeline.extract_filters(args.query);
    let output = match pipeline.run(&input) {
        Ok(output) => output,
        Err(e) => super::fail(&e, args.json),
    };

    let explanation = if args.explain {
        let listing = ListingContext {
            title: args.title.map(str::to_string),
            listed_price_eur: args.price,
        };
        match TemplateExplainer::default().generate_explanation(
            &output.estimation,
            &output.comparables,
            &listing,
        ) {
            Ok(e) => Some(e),
            Err(e) => {
                tracing::warn!(error = %e, "explanation failed");
                None
            }
        }
    } else {
        None
    };

    if let Some(path) = args.export {
        let report = FinalReport::new(
            args.title.unwrap_or(args.query),
            args.price,
            &output.estimation,
            &output.comparables,
        );
        write_json(path, &report)?;
    }

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "filters": filters,
                "comparables": output.comparables,
                "estimation": output.estimation,
                "explanation": explanation,
            }))?
        );
        return Ok(());
    }

    println!("{} Query: {}", "→".dimmed(), args.query.cyan());
    if filters.is_empty() {
        println!("  {} no filters recognized", "→".dimmed());
    } else {
        println!(
            "  {} filters: {}",
            "→".dimmed(),
            serde_json::to_string(&filters)?.dimmed()
        );
    }
    println!();

    print_comparables(&output.comparables);
    println!();
    print_estimation(&output.estimation, args.price);

    if let Some(explanation) = explanation {
        println!();
        println!("{}", explanation.explanation_text);
        println!("{}", explanation.disclaimer.dimmed());
    }
    if let Some(path) = args.export {
        println!();
        println!("{} Report written to {}", "✓".green().bold(), path.display());
    }

    Ok(())
}

pub(crate) fn print_comparables(comparables: &[Comparable]) {
    println!("{} ({})", "Comparables".bold(), comparables.len());
    for (i, c) in comparables.iter().enumerate() {
        let score = format!("{:.3}", c.final_score);
        let score = if c.final_score > 1.0 {
            score.green()
        } else if c.final_score > 0.7 {
            score.yellow()
        } else {
            score.dimmed()
        };
        println!(
            "{:>3}. [{}] #{} {} in {}, {}: {:.0} EUR, {:.0} sqm ({:.2} EUR/sqm)",
            (i + 1).to_string().bold(),
            score,
            c.id,
            c.property_type,
            c.neighborhood.cyan(),
            c.city,
            c.price_eur,
            c.size_sqm,
            c.price_per_sqm
        );
    }
}

pub(crate) fn print_estimation(estimation: &Estimation, listed: Option<f64>) {
    let ci = &estimation.confidence_interval;
    println!("{}", "Estimate".bold());
    println!(
        "  {} fair price: {} EUR ({:.2} EUR/sqm x {} sqm)",
        "→".dimmed(),
        format!("{:.2}", estimation.fair_price).cyan(),
        estimation.fair_ppsqm,
        estimation.target_sqm
    );
    println!("  {} fair range: {:.2} - {:.2} EUR", "→".dimmed(), ci.lower, ci.upper);
    if let Some(p) = listed {
        println!("  {} listed at: {:.2} EUR", "→".dimmed(), p);
    }
    let verdict = match estimation.verdict {
        Verdict::Underpriced => estimation.verdict.as_str().green().bold(),
        Verdict::Fair => estimation.verdict.as_str().cyan().bold(),
        Verdict::Overpriced => estimation.verdict.as_str().red().bold(),
        Verdict::Unknown => estimation.verdict.as_str().dimmed(),
    };
    println!("  {} verdict: {}", "→".dimmed(), verdict);
}
