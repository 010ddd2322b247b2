pub mod estimate;
pub mod evaluate;
pub mod filters;
pub mod index;

use colored::Colorize;
use rag_imobiliar::PipelineError;

/// Print a pipeline failure and exit non-zero
pub(crate) fn fail(err: &PipelineError, json: bool) -> ! {
    if json {
        println!(
            "{}",
            serde_json::json!({
                "error": err.code(),
                "message": err.to_string(),
            })
        );
    } else {
        eprintln!("{} [{}] {}", "Error:".red().bold(), err.code(), err);
    }
    std::process::exit(1);
}
