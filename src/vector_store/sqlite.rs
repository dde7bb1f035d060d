//! SQLite-based vector index implementation.
//!
//! One database file per video. Cosine similarity is computed in Rust; caption
//! indexes are small enough that a full scan per query is fine.

use super::{rank, Document, SearchResult, VectorIndex};
use crate::error::{Result, TubeQaError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OpenFlags};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS documents (
        id TEXT PRIMARY KEY,
        content TEXT NOT NULL,
        chunk_order INTEGER NOT NULL,
        embedding BLOB NOT NULL,
        indexed_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_documents_chunk_order ON documents(chunk_order);
"#;

const SELECT_DOCUMENTS: &str = r#"
    SELECT id, content, chunk_order, embedding, indexed_at
    FROM documents
    ORDER BY chunk_order
"#;

/// SQLite-based vector index.
#[derive(Debug)]
pub struct SqliteVectorIndex {
    conn: Mutex<Connection>,
}

impl SqliteVectorIndex {
    /// Create a new, empty index database at `path`.
    #[instrument(skip_all)]
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;

        info!("Created SQLite vector index at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an existing index database without creating it.
    #[instrument(skip_all)]
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            TubeQaError::VectorStore(format!("Failed to open index {:?}: {}", path, e))
        })?;

        debug!("Opened SQLite vector index at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory index (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| TubeQaError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn load_documents(&self) -> Result<Vec<Document>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(SELECT_DOCUMENTS)?;

        let docs = stmt.query_map([], |row| {
            let id_str: String = row.get(0)?;
            let chunk_order: i64 = row.get(2)?;
            let embedding_bytes: Vec<u8> = row.get(3)?;
            let indexed_at_str: String = row.get(4)?;

            Ok(Document {
                id: uuid::Uuid::parse_str(&id_str).unwrap_or_default(),
                content: row.get(1)?,
                chunk_order: chunk_order.max(0) as usize,
                embedding: Self::bytes_to_embedding(&embedding_bytes),
                indexed_at: DateTime::parse_from_rfc3339(&indexed_at_str)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            })
        })?;

        let result = docs.collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(result)
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding
            .iter()
            .flat_map(|f| f.to_le_bytes())
            .collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }
}

#[async_trait]
impl VectorIndex for SqliteVectorIndex {
    #[instrument(skip(self, docs), fields(count = docs.len()))]
    async fn insert_batch(&self, docs: &[Document]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        for doc in docs {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO documents (id, content, chunk_order, embedding, indexed_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    doc.id.to_string(),
                    doc.content,
                    doc.chunk_order as i64,
                    Self::embedding_to_bytes(&doc.embedding),
                    doc.indexed_at.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        info!("Inserted {} documents", docs.len());
        Ok(docs.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        let results = rank(self.load_documents()?, query_embedding, limit);
        debug!("Found {} matching documents", results.len());
        Ok(results)
    }

    async fn documents(&self) -> Result<Vec<Document>> {
        self.load_documents()
    }

    async fn document_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_vector_index() {
        let index = SqliteVectorIndex::in_memory().unwrap();

        let docs = vec![
            Document::new("This is test content".to_string(), 0, vec![1.0, 0.0, 0.0]),
            Document::new("Something else".to_string(), 1, vec![0.0, 1.0, 0.0]),
        ];
        assert_eq!(index.insert_batch(&docs).await.unwrap(), 2);
        assert_eq!(index.document_count().await.unwrap(), 2);

        let results = index.search(&[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!((results[0].score - 1.0).abs() < 0.001);
        assert_eq!(results[0].document.content, "This is test content");
        assert_eq!(results[0].document.embedding, vec![1.0, 0.0, 0.0]);
    }

    #[tokio::test]
    async fn test_reopen_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");

        {
            let index = SqliteVectorIndex::create(&path).unwrap();
            let docs = vec![Document::new("persisted".to_string(), 0, vec![0.5, 0.5])];
            index.insert_batch(&docs).await.unwrap();
        }

        let index = SqliteVectorIndex::open(&path).unwrap();
        let docs = index.documents().await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "persisted");
        assert_eq!(docs[0].embedding, vec![0.5, 0.5]);
    }

    #[test]
    fn test_open_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = SqliteVectorIndex::open(&dir.path().join("missing.db"));
        assert!(matches!(result, Err(TubeQaError::VectorStore(_))));
        assert!(!dir.path().join("missing.db").exists());
    }

    #[test]
    fn test_embedding_bytes() {
        let embedding = vec![1.5f32, -0.25, 0.0];
        let bytes = SqliteVectorIndex::embedding_to_bytes(&embedding);
        assert_eq!(bytes.len(), 12);
        assert_eq!(SqliteVectorIndex::bytes_to_embedding(&bytes), embedding);
    }
}
