//! Index command implementation.

use super::{report_error, run_preflight};
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the index command.
pub async fn run_index(url: &str, settings: Settings) -> Result<()> {
    run_preflight(Operation::Index, &settings)?;

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Fetching captions and building index...");
    let result = orchestrator.ensure_index(url).await;
    spinner.finish_and_clear();

    match result {
        Ok(outcome) if outcome.reused => {
            Output::info(&format!(
                "{} is already indexed ({} chunks)",
                outcome.video_id, outcome.chunk_count
            ));
        }
        Ok(outcome) => {
            Output::success(&format!(
                "Indexed {} ({} chunks)",
                outcome.video_id, outcome.chunk_count
            ));
        }
        Err(e) => return Err(report_error("Failed to index video", e)),
    }

    Ok(())
}
