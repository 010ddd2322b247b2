//! Filters command - Show what a query is parsed into

use anyhow::Result;
use colored::Colorize;

use rag_imobiliar::{Config, FilterExtractor, KeywordFilterExtractor};

pub fn run(config: &Config, query: &str, json: bool) -> Result<()> {
    let extractor = KeywordFilterExtractor::with_gazetteer(&config.filters.neighborhoods);
    let filters = extractor.extract(query);

    if json {
        println!("{}", serde_json::to_string_pretty(&filters)?);
        return Ok(());
    }

    println!("{} Query: {}", "→".dimmed(), query.cyan());
    if filters.is_empty() {
        println!("  {} no filters recognized", "→".dimmed());
        return Ok(());
    }

    let show = |name: &str, value: Option<String>| {
        if let Some(v) = value {
            println!("  {} {:<13} {}", "→".dimmed(), name, v.green());
        }
    };
    show("type:", filters.property_type.map(|t| t.to_string()));
    show("rooms:", filters.rooms.map(|r| r.to_string()));
    show("max price:", filters.price_max.map(|p| format!("{:.0} EUR", p)));
    show("neighborhood:", filters.neighborhood.clone());

    Ok(())
}
