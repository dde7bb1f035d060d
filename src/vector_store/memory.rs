//! In-memory vector index implementation.
//!
//! Useful for testing.

use super::{rank, Document, SearchResult, VectorIndex};
use crate::error::{Result, TubeQaError};
use async_trait::async_trait;
use std::sync::RwLock;

/// In-memory vector index.
pub struct MemoryVectorIndex {
    documents: RwLock<Vec<Document>>,
}

impl MemoryVectorIndex {
    /// Create a new in-memory vector index.
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(Vec::new()),
        }
    }
}

impl Default for MemoryVectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> TubeQaError {
    TubeQaError::VectorStore(format!("Failed to acquire lock: {}", e))
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn insert_batch(&self, docs: &[Document]) -> Result<usize> {
        let mut store = self.documents.write().map_err(poisoned)?;
        store.extend_from_slice(docs);
        Ok(docs.len())
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        let docs = self.documents.read().map_err(poisoned)?;
        Ok(rank(docs.iter().cloned(), query_embedding, limit))
    }

    async fn documents(&self) -> Result<Vec<Document>> {
        let docs = self.documents.read().map_err(poisoned)?;
        let mut result = docs.clone();
        result.sort_by_key(|d| d.chunk_order);
        Ok(result)
    }

    async fn document_count(&self) -> Result<usize> {
        Ok(self.documents.read().map_err(poisoned)?.len())
    }
}
