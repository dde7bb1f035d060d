//! Search command implementation.

use super::{report_error, run_preflight};
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(url: &str, query: &str, settings: Settings) -> Result<()> {
    run_preflight(Operation::Search, &settings)?;

    let preview_chars = settings.display.source_preview_chars;
    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Searching...");
    let results = orchestrator.search(url, query).await;
    spinner.finish_and_clear();

    match results {
        Ok((_, chunks)) if chunks.is_empty() => {
            Output::warning("No results found matching your query.");
        }
        Ok((video_id, chunks)) => {
            Output::success(&format!("Found {} results in {}", chunks.len(), video_id));
            for (i, chunk) in chunks.iter().enumerate() {
                Output::source(i + 1, chunk.score, &chunk.content, preview_chars);
            }
            println!();
        }
        Err(e) => return Err(report_error("Search failed", e)),
    }

    Ok(())
}
