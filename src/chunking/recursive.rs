//! Recursive character splitting.
//!
//! Tries the coarsest boundary first (blank line, caption line, sentence,
//! word) and only falls back to cutting between characters when a piece is
//! still too long. Small pieces are then merged back up to the size limit,
//! carrying the configured overlap into the next chunk.

use super::{Chunk, Chunker, ChunkingConfig};
use crate::captions::CaptionLine;
use crate::error::Result;
use std::collections::VecDeque;
use tracing::warn;

/// Boundaries in order of preference. The empty separator means "between
/// any two characters".
const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", " ", ""];

/// Recursive character splitter.
pub struct RecursiveSplitter {
    config: ChunkingConfig,
}

impl RecursiveSplitter {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Split free text into chunk strings.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, SEPARATORS)
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        // Use the first separator that occurs in the text; finer ones are kept
        // for pieces that are still too long.
        let mut separator = separators.last().copied().unwrap_or("");
        let mut finer: &[&str] = &[];
        for (i, &sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                separator = sep;
                break;
            }
            if text.contains(sep) {
                separator = sep;
                finer = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut small: Vec<&str> = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.config.chunk_size {
                small.push(piece);
                continue;
            }

            if !small.is_empty() {
                chunks.extend(self.merge(&small));
                small.clear();
            }

            if finer.is_empty() {
                // Atomic piece; nothing left to split on.
                let trimmed = piece.trim();
                if !trimmed.is_empty() {
                    chunks.push(trimmed.to_string());
                }
            } else {
                chunks.extend(self.split_recursive(piece, finer));
            }
        }

        if !small.is_empty() {
            chunks.extend(self.merge(&small));
        }

        chunks
    }

    /// Greedily join pieces into chunks no longer than the size limit.
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;

        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);

            if total + len > size && !window.is_empty() {
                if total > size {
                    warn!("Created a chunk of {} characters, longer than {}", total, size);
                }
                push_joined(&mut chunks, &window);

                // Keep the tail of the window as overlap for the next chunk.
                while total > overlap || (total + len > size && total > 0) {
                    match window.pop_front() {
                        Some(dropped) => total -= char_len(dropped),
                        None => break,
                    }
                }
            }

            window.push_back(piece);
            total += len;
        }

        push_joined(&mut chunks, &window);
        chunks
    }
}

impl Chunker for RecursiveSplitter {
    fn chunk(&self, lines: &[CaptionLine]) -> Vec<Chunk> {
        let text = lines
            .iter()
            .map(|l| l.text())
            .collect::<Vec<_>>()
            .join("\n");

        self.split_text(&text)
            .into_iter()
            .enumerate()
            .map(|(order, content)| Chunk::new(content, order))
            .collect()
    }

    fn config(&self) -> ChunkingConfig {
        self.config
    }
}

/// Split so that each piece ends with the separator that followed it.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    text.split_inclusive(separator)
        .filter(|piece| !piece.is_empty())
        .collect()
}

fn push_joined(chunks: &mut Vec<String>, window: &VecDeque<&str>) {
    let joined: String = window.iter().copied().collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
