//! tubeqa - Ask questions about YouTube videos
//!
//! Answers questions about a YouTube video using only what is said in it.
//!
//! # Overview
//!
//! For a watch URL and a question, tubeqa:
//! - Downloads the video's English subtitles with yt-dlp
//! - Splits the caption text into overlapping chunks
//! - Embeds the chunks into a per-video index on disk, reused on later questions
//! - Retrieves the chunks nearest to the question
//! - Asks a language model to answer from those chunks alone
//!
//! # Architecture
//!
//! - `source` - Video identifier resolution from watch URLs
//! - `captions` - Subtitle download and WebVTT cleaning
//! - `chunking` - Recursive character splitting
//! - `embedding` - Embedding generation
//! - `vector_store` - Per-video vector indexes on disk
//! - `llm` - Language model access
//! - `rag` - Retrieval and answer generation
//! - `orchestrator` - Pipeline coordination
//! - `config` - Settings and prompt templates
//! - `cli` - Command line and HTTP front ends
//!
//! # Example
//!
//! ```rust,no_run
//! use tubeqa::config::Settings;
//! use tubeqa::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let answer = orchestrator
//!         .ask("https://www.youtube.com/watch?v=dQw4w9WgXcQ", "What is the song about?")
//!         .await?;
//!     println!("{}", answer.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod captions;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod source;
pub mod vector_store;

pub use error::{ErrorKind, Result, TubeQaError};
