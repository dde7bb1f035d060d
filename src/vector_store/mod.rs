//! Vector index abstraction for tubeqa.
//!
//! Each indexed video owns one [`VectorIndex`] holding its chunks and their
//! embeddings. [`IndexStore`] maps video identifiers to index directories on
//! disk and decides whether an index is reused or built.

mod memory;
mod sqlite;
mod store;

pub use memory::MemoryVectorIndex;
pub use sqlite::SqliteVectorIndex;
pub use store::{IndexManifest, IndexStore, INDEX_FILE, MANIFEST_FILE};

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A chunk stored in a video's index together with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID.
    pub id: Uuid,
    /// Text content of this chunk.
    pub content: String,
    /// Order of this chunk in the transcript.
    pub chunk_order: usize,
    /// Embedding vector.
    pub embedding: Vec<f32>,
    /// When this document was indexed.
    pub indexed_at: DateTime<Utc>,
}

impl Document {
    /// Create a new document.
    pub fn new(content: String, chunk_order: usize, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
            chunk_order,
            embedding,
            indexed_at: Utc::now(),
        }
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched document.
    pub document: Document,
    /// Cosine similarity (higher is nearer).
    pub score: f32,
}

/// Trait for per-video vector index implementations.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Bulk insert documents.
    async fn insert_batch(&self, docs: &[Document]) -> Result<usize>;

    /// Return up to `limit` documents, nearest first.
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>>;

    /// All documents in chunk order.
    async fn documents(&self) -> Result<Vec<Document>>;

    /// Get total document count.
    async fn document_count(&self) -> Result<usize>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Score documents against a query and keep the `limit` nearest.
///
/// Ties keep chunk order so results are deterministic.
pub(crate) fn rank(
    docs: impl IntoIterator<Item = Document>,
    query_embedding: &[f32],
    limit: usize,
) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = docs
        .into_iter()
        .map(|doc| {
            let score = cosine_similarity(query_embedding, &doc.embedding);
            SearchResult {
                document: doc,
                score,
            }
        })
        .collect();

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.document.chunk_order.cmp(&b.document.chunk_order))
    });
    results.truncate(limit);
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);

        assert_eq!(cosine_similarity(&a, &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_rank_orders_nearest_first_and_truncates() {
        let docs = vec![
            Document::new("far".to_string(), 0, vec![0.0, 1.0]),
            Document::new("near".to_string(), 1, vec![1.0, 0.1]),
            Document::new("exact".to_string(), 2, vec![1.0, 0.0]),
        ];

        let results = rank(docs, &[1.0, 0.0], 2);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].document.content, "exact");
        assert_eq!(results[1].document.content, "near");
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn test_rank_ties_keep_chunk_order() {
        let docs = vec![
            Document::new("b".to_string(), 1, vec![1.0, 0.0]),
            Document::new("a".to_string(), 0, vec![1.0, 0.0]),
        ];
        let results = rank(docs, &[1.0, 0.0], 8);
        assert_eq!(results[0].document.content, "a");
    }
}
