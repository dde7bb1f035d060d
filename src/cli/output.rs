//! CLI output formatting utilities.

use chrono::{DateTime, Utc};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print one indexed video.
    pub fn video_info(video_id: &str, chunks: usize, model: &str, indexed_at: &DateTime<Utc>) {
        println!(
            "  {} {} ({} chunks, {}, indexed {})",
            style("*").cyan(),
            style(video_id).bold(),
            chunks,
            style(model).dim(),
            indexed_at.format("%Y-%m-%d %H:%M")
        );
    }

    /// Print a numbered source excerpt.
    pub fn source(rank: usize, score: f32, content: &str, preview_chars: usize) {
        println!(
            "\n{} {} (score: {:.2})",
            style(">>").green(),
            style(format!("Source {}", rank)).bold(),
            score
        );
        println!("   {}", content_preview(content, preview_chars));
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// First `max_chars` characters of a chunk on one line, followed by "...".
pub fn content_preview(content: &str, max_chars: usize) -> String {
    let flat = content.replace('\n', " ");
    let preview: String = flat.chars().take(max_chars).collect();
    format!("{}...", preview)
}
