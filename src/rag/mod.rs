//! RAG (Retrieval-Augmented Generation) over a single video's captions.
//!
//! [`Retriever`] finds the chunks nearest to a question and
//! [`AnswerGenerator`] turns them into an answer.

mod generator;
mod retriever;

pub use generator::{format_context, AnswerGenerator, ANSWER_TEMPERATURE};
pub use retriever::{Retriever, RETRIEVAL_K};

use crate::source::VideoId;
use crate::vector_store::SearchResult;
use serde::Serialize;

/// A chunk returned by retrieval, nearest first.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedChunk {
    /// Text content.
    pub content: String,
    /// Position of the chunk in the transcript.
    pub chunk_order: usize,
    /// Cosine similarity to the question.
    pub score: f32,
}

impl From<SearchResult> for RetrievedChunk {
    fn from(result: SearchResult) -> Self {
        Self {
            content: result.document.content,
            chunk_order: result.document.chunk_order,
            score: result.score,
        }
    }
}

/// An answer together with the chunks it was generated from.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    /// Model output, unmodified.
    pub answer: String,
    pub video_id: VideoId,
    /// Whether an existing index was reused instead of built.
    pub reused_index: bool,
    /// Retrieved chunks, in retrieval order.
    pub sources: Vec<RetrievedChunk>,
}
