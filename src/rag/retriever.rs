//! Nearest-chunk retrieval.

use super::RetrievedChunk;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::VectorIndex;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Number of chunks retrieved per question.
pub const RETRIEVAL_K: usize = 8;

/// Embeds questions and searches a video's index.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    k: usize,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            k: RETRIEVAL_K,
        }
    }

    /// Return up to K chunks, nearest first. Fewer chunks in the index means
    /// fewer results; an empty index yields an empty list.
    #[instrument(skip(self, index, question))]
    pub async fn retrieve(
        &self,
        index: &dyn VectorIndex,
        question: &str,
    ) -> Result<Vec<RetrievedChunk>> {
        let query_embedding = self.embedder.embed(question).await?;
        let results = index.search(&query_embedding, self.k).await?;

        debug!("Retrieved {} chunks", results.len());
        Ok(results.into_iter().map(RetrievedChunk::from).collect())
    }
}
