//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::vector_store::IndexStore;
use anyhow::Result;

/// Run the list command.
pub fn run_list(settings: Settings) -> Result<()> {
    let store = IndexStore::new(settings.index_dir())?;

    match store.list() {
        Ok(videos) if videos.is_empty() => {
            Output::info("No videos indexed yet. Use 'tubeqa ask <url> <question>' to add one.");
        }
        Ok(videos) => {
            Output::header(&format!("Indexed Videos ({})", videos.len()));
            println!();

            for video in &videos {
                Output::video_info(
                    video.video_id.as_str(),
                    video.chunk_count,
                    &video.embedding_model,
                    &video.indexed_at,
                );
            }

            let total_chunks: usize = videos.iter().map(|v| v.chunk_count).sum();
            println!();
            Output::kv("Total videos", &videos.len().to_string());
            Output::kv("Total chunks", &total_chunks.to_string());
            Output::kv("Index directory", &store.root().display().to_string());
        }
        Err(e) => {
            Output::error(&format!("Failed to list videos: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
