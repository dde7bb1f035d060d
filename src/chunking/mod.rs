//! Content chunking for breaking caption transcripts into searchable passages.

mod recursive;

pub use recursive::RecursiveSplitter;

use crate::captions::CaptionLine;
use crate::error::{Result, TubeQaError};
use serde::{Deserialize, Serialize};

/// Default maximum chunk length, in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 500;
/// Default overlap between consecutive chunks, in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

/// A passage of caption text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Text content of this chunk.
    pub content: String,
    /// Position of this chunk in the transcript.
    pub order: usize,
}

impl Chunk {
    pub fn new(content: String, order: usize) -> Self {
        Self { content, order }
    }

    /// Length in characters (not bytes).
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// Configuration for chunking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared between the end of one chunk and the start of the next.
    pub chunk_overlap: usize,
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        let config = Self {
            chunk_size,
            chunk_overlap,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject parameters the splitter cannot make progress with.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(TubeQaError::Config("chunk_size must be positive".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(TubeQaError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Trait for caption chunking implementations.
pub trait Chunker: Send + Sync {
    /// Split caption lines into ordered chunks.
    fn chunk(&self, lines: &[CaptionLine]) -> Vec<Chunk>;

    /// The parameters this chunker runs with.
    fn config(&self) -> ChunkingConfig;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ChunkingConfig::default();
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.chunk_overlap, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        assert!(ChunkingConfig::new(0, 0).is_err());
        assert!(ChunkingConfig::new(100, 100).is_err());
        assert!(ChunkingConfig::new(100, 99).is_ok());
    }

    #[test]
    fn test_char_len_counts_characters() {
        let chunk = Chunk::new("héllo".to_string(), 0);
        assert_eq!(chunk.char_len(), 5);
    }
}
