//! Ask command implementation.

use super::{report_error, run_preflight};
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(url: &str, question: &str, no_sources: bool, settings: Settings) -> Result<()> {
    run_preflight(Operation::Ask, &settings)?;

    let show_sources = settings.display.show_sources && !no_sources;
    let preview_chars = settings.display.source_preview_chars;
    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Processing video...");
    let result = orchestrator.ask(url, question).await;
    spinner.finish_and_clear();

    let answer = match result {
        Ok(answer) => answer,
        Err(e) => return Err(report_error("Failed to generate answer", e)),
    };

    if answer.reused_index {
        Output::info(&format!("Using existing index for {}", answer.video_id));
    } else {
        Output::success(&format!("Indexed {}", answer.video_id));
    }

    Output::header("Answer");
    println!("\n{}\n", answer.answer);

    if show_sources && !answer.sources.is_empty() {
        Output::header("Sources");
        for (i, source) in answer.sources.iter().enumerate() {
            Output::source(i + 1, source.score, &source.content, preview_chars);
        }
        println!();
    }

    Ok(())
}
