mod commands;
#[cfg(feature = "mcp")]
mod mcp;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use rag_imobiliar::Config;

#[derive(Parser)]
#[command(name = "imobiliar")]
#[command(about = "Fair price estimation for real-estate listings", long_about = None)]
#[command(version)]
struct Cli {
    #[arg(long, global = true, help = "Config file (default: ./imobiliar.yaml)")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Property index database")]
    db: Option<PathBuf>,
    #[arg(short, long, global = true, help = "Debug logging on stderr")]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import listings into the property index
    Index {
        #[arg(help = "JSON array of listings")]
        listings: Option<PathBuf>,
        #[arg(long, help = "Show index status only")]
        status: bool,
        #[arg(long, help = "Drop the existing index first")]
        rebuild: bool,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Show the filters extracted from a query
    Filters {
        query: String,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Estimate a fair price from retrieved comparables
    #[command(alias = "est")]
    Estimate {
        query: String,
        #[arg(short, long, help = "Number of comparables")]
        k: Option<usize>,
        #[arg(long, help = "Listed price in EUR")]
        price: Option<f64>,
        #[arg(long, help = "Listing area in sqm")]
        sqm: Option<f64>,
        #[arg(long, help = "Listing title for the report")]
        title: Option<String>,
        #[arg(long, help = "Write a final report JSON to this path")]
        export: Option<PathBuf>,
        #[arg(long, help = "Explain the verdict")]
        explain: bool,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Re-run the estimator on a saved comparables snapshot
    Evaluate {
        #[arg(long, help = "Comparables snapshot (default: configured snapshot path)")]
        comparables: Option<PathBuf>,
        #[arg(long, help = "Listed price in EUR")]
        price: Option<f64>,
        #[arg(long, help = "Listing area in sqm")]
        sqm: Option<f64>,
        #[arg(short, long, help = "Write the pricing report to this path")]
        output: Option<PathBuf>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },

    // ===== MCP Server =====
    /// Start MCP server exposing the valuation tools
    #[cfg(feature = "mcp")]
    Mcp {
        #[arg(long, help = "Show client configuration instructions")]
        install: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.storage.db_path = db;
    }

    match cli.command {
        Commands::Index {
            listings,
            status,
            rebuild,
            json,
        } => commands::index::run(&config, listings.as_deref(), status, rebuild, json),
        Commands::Filters { query, json } => commands::filters::run(&config, &query, json),
        Commands::Estimate {
            query,
            k,
            price,
            sqm,
            title,
            export,
            explain,
            json,
        } => commands::estimate::run(
            &config,
            commands::estimate::EstimateArgs {
                query: &query,
                k,
                price,
                sqm,
                title: title.as_deref(),
                export: export.as_deref(),
                explain,
                json,
            },
        ),
        Commands::Evaluate {
            comparables,
            price,
            sqm,
            output,
            json,
        } => commands::evaluate::run(
            &config,
            comparables.as_deref(),
            price,
            sqm,
            output.as_deref(),
            json,
        ),

        // MCP Server
        #[cfg(feature = "mcp")]
        Commands::Mcp { install } => {
            if install {
                print_mcp_install_instructions();
                Ok(())
            } else {
                run_mcp_server(config)
            }
        }
    }
}

#[cfg(feature = "mcp")]
fn run_mcp_server(config: Config) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(mcp::run_mcp_server(config))
}

#[cfg(feature = "mcp")]
fn print_mcp_install_instructions() {
    use colored::Colorize;

    let work_dir = std::env::current_dir()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| "/path/to/project".to_string());

    let binary_path = std::env::current_exe()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| "imobiliar".to_string());

    println!("{}", "MCP Server Installation Guide".bold().cyan());
    println!();
    println!("Add the following to your MCP client configuration:");
    println!();
    println!(r#"{{
  "mcpServers": {{
    "imobiliar": {{
      "command": "{}",
      "args": ["mcp"],
      "cwd": "{}"
    }}
  }}
}}"#, binary_path, work_dir);
    println!();
    println!("{}", "Available tools:".bold());
    println!("  • {} - Fair price and verdict for a listing query", "property_estimate".green());
    println!("  • {} - Structured filters parsed from a query", "extract_filters".green());
    println!("  • {} - Property index statistics", "index_status".green());
}
