//! Index command - Load listings into the property store

use anyhow::{bail, Result};
use colored::Colorize;
use std::path::Path;
use tracing::info;

use rag_imobiliar::search::embedding::HarmonicEmbedder;
use rag_imobiliar::search::indexer::{index_properties, load_listings};
use rag_imobiliar::search::vectordb::PropertyStore;
use rag_imobiliar::Config;

/// Run index command
pub fn run(
    config: &Config,
    listings: Option<&Path>,
    status_only: bool,
    rebuild: bool,
    json: bool,
) -> Result<()> {
    let db_path = &config.storage.db_path;

    if status_only {
        return show_status(db_path, json);
    }

    let Some(listings_path) = listings else {
        bail!("a listings file is required (or pass --status)");
    };

    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    if rebuild && db_path.exists() {
        std::fs::remove_file(db_path)?;
        if !json {
            println!("{} Removed existing index", "→".dimmed());
        }
    }

    let properties = load_listings(listings_path)?;
    info!(count = properties.len(), path = %listings_path.display(), "loaded listings");

    if !json {
        println!("{} Indexing {} listings...", "→".dimmed(), properties.len());
    }

    let store = PropertyStore::open(db_path)?;
    let stats = index_properties(&store, &HarmonicEmbedder::new(), &properties)?;
    store.set_meta("source", &listings_path.display().to_string())?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "indexed": stats.indexed,
                "skipped": stats.skipped,
                "failed": stats.failed,
                "duration_ms": stats.duration_ms,
            })
        );
    } else {
        println!();
        println!(
            "{} Indexed {} properties in {:.2}s",
            "✓".green().bold(),
            stats.indexed.to_string().cyan(),
            stats.duration_ms as f64 / 1000.0
        );
        if stats.skipped > 0 {
            println!(
                "  {} {} listings skipped (invalid or duplicate id)",
                "→".dimmed(),
                stats.skipped
            );
        }
        if stats.failed > 0 {
            println!("  {} {} listings failed", "✗".red(), stats.failed);
        }
        println!("  {} Index saved to: {}", "→".dimmed(), db_path.display());
    }

    Ok(())
}

/// Show index status
fn show_status(db_path: &Path, json: bool) -> Result<()> {
    if !db_path.exists() {
        if json {
            println!(
                "{}",
                serde_json::json!({
                    "exists": false,
                    "error": "Index not found"
                })
            );
        } else {
            println!(
                "{} Index not found. Run {} first.",
                "!".yellow().bold(),
                "imobiliar index <listings.json>".cyan()
            );
        }
        return Ok(());
    }

    let store = PropertyStore::open(db_path)?;
    let stats = store.get_stats()?;
    let source = store.get_meta("source")?;
    let file_size = std::fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);

    if json {
        println!(
            "{}",
            serde_json::json!({
                "exists": true,
                "property_count": stats.property_count,
                "embedding_count": stats.embedding_count,
                "last_indexed": stats.last_indexed,
                "source": source,
                "file_size_bytes": file_size,
            })
        );
    } else {
        println!("{}", "Index Status".bold());
        println!();
        println!(
            "  {} {} properties",
            "→".dimmed(),
            stats.property_count.to_string().cyan()
        );
        println!(
            "  {} {} embeddings",
            "→".dimmed(),
            stats.embedding_count.to_string().cyan()
        );
        if stats.property_count != stats.embedding_count {
            println!(
                "  {} catalog and embeddings differ; queries may fail with an integrity error",
                "!".yellow().bold()
            );
        }
        println!("  {} Size: {:.2} KB", "→".dimmed(), file_size as f64 / 1024.0);
        if let Some(src) = source {
            println!("  {} Source: {}", "→".dimmed(), src);
        }
        if let Some(ts) = stats.last_indexed {
            let dt = chrono::DateTime::from_timestamp(ts, 0)
                .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "Unknown".to_string());
            println!("  {} Last indexed: {}", "→".dimmed(), dt);
        }
    }

    Ok(())
}
