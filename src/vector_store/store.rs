//! Per-video index directories.
//!
//! Layout: `<root>/<video_id>/{index.db, manifest.json}`. A video directory
//! that exists and is non-empty is a complete index; anything else means the
//! video has not been indexed. Indexes are built in a hidden staging
//! directory and renamed into place, so a failed build leaves no video
//! directory behind.

use super::{Document, SqliteVectorIndex, VectorIndex};
use crate::error::{Result, TubeQaError};
use crate::source::VideoId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Database file inside a video directory.
pub const INDEX_FILE: &str = "index.db";
/// Build metadata inside a video directory.
pub const MANIFEST_FILE: &str = "manifest.json";

const STAGING_PREFIX: &str = ".staging-";

/// Staging directories untouched for this long belong to a dead build.
const STALE_STAGING_AGE: Duration = Duration::from_secs(60 * 60);

/// How an index was built. Written last, after every document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub video_id: VideoId,
    pub embedding_model: String,
    pub dimensions: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub chunk_count: usize,
    pub indexed_at: DateTime<Utc>,
}

/// Root directory holding one index directory per video.
pub struct IndexStore {
    root: PathBuf,
    locks: Mutex<HashMap<VideoId, Arc<AsyncMutex<()>>>>,
}

impl IndexStore {
    /// Open (and create if needed) the index root.
    ///
    /// Staging directories left behind by killed builds are removed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        sweep_staging(&root, STALE_STAGING_AGE)?;
        Ok(Self {
            root,
            locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding a video's index.
    pub fn video_dir(&self, video_id: &VideoId) -> PathBuf {
        self.root.join(video_id.as_str())
    }

    /// Whether the video's directory exists and is non-empty.
    pub fn is_indexed(&self, video_id: &VideoId) -> Result<bool> {
        dir_has_entries(&self.video_dir(video_id))
    }

    /// Serialise index decisions for one video within this process.
    ///
    /// Hold the guard across the `is_indexed` check and the build so two
    /// concurrent first requests for the same video build it once.
    pub async fn lock_video(&self, video_id: &VideoId) -> Result<OwnedMutexGuard<()>> {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .map_err(|e| TubeQaError::VectorStore(format!("Failed to acquire lock: {}", e)))?;
            // Entries only the map refers to are neither held nor awaited.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(video_id.clone()).or_default().clone()
        };
        Ok(lock.lock_owned().await)
    }

    /// Open an existing index as-is.
    #[instrument(skip(self), fields(video_id = %video_id))]
    pub fn open(&self, video_id: &VideoId) -> Result<SqliteVectorIndex> {
        let path = self.video_dir(video_id).join(INDEX_FILE);
        debug!("Opening index at {:?}", path);
        SqliteVectorIndex::open(&path)
    }

    /// Read the manifest of an indexed video, if it has one.
    pub fn read_manifest(&self, video_id: &VideoId) -> Result<Option<IndexManifest>> {
        read_manifest_at(&self.video_dir(video_id))
    }

    /// Persist a fresh index for a video and return it opened.
    ///
    /// Documents and manifest are written to a staging directory first. If
    /// another process published the same video in the meantime, its index
    /// wins and the staged copy is discarded.
    #[instrument(skip(self, docs, manifest), fields(video_id = %video_id, count = docs.len()))]
    pub async fn create(
        &self,
        video_id: &VideoId,
        docs: &[Document],
        manifest: &IndexManifest,
    ) -> Result<SqliteVectorIndex> {
        let staging = self
            .root
            .join(format!("{}{}-{}", STAGING_PREFIX, video_id, Uuid::new_v4()));
        std::fs::create_dir_all(&staging)?;

        if let Err(e) = write_staged(&staging, docs, manifest).await {
            discard(&staging);
            return Err(e);
        }

        let target = self.video_dir(video_id);
        if target.exists() && !dir_has_entries(&target)? {
            // An empty directory counts as "not indexed"; clear it for the rename.
            std::fs::remove_dir(&target)?;
        }

        if let Err(e) = std::fs::rename(&staging, &target) {
            discard(&staging);
            if !self.is_indexed(video_id)? {
                return Err(TubeQaError::VectorStore(format!(
                    "Failed to publish index for {}: {}",
                    video_id, e
                )));
            }
            warn!("Index for {} was published concurrently; using the existing one", video_id);
        } else {
            info!("Published index with {} documents", docs.len());
        }

        self.open(video_id)
    }

    /// List every indexed video that has a readable manifest, newest first.
    pub fn list(&self) -> Result<Vec<IndexManifest>> {
        let mut manifests = Vec::new();

        for entry in std::fs::read_dir(&self.root)?.filter_map(|e| e.ok()) {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('.') || !entry.path().is_dir() {
                continue;
            }

            match read_manifest_at(&entry.path()) {
                Ok(Some(manifest)) => manifests.push(manifest),
                Ok(None) => debug!("Skipping {:?}: no manifest", entry.path()),
                Err(e) => warn!("Skipping {:?}: {}", entry.path(), e),
            }
        }

        manifests.sort_by(|a, b| b.indexed_at.cmp(&a.indexed_at));
        Ok(manifests)
    }
}

async fn write_staged(staging: &Path, docs: &[Document], manifest: &IndexManifest) -> Result<()> {
    {
        let index = SqliteVectorIndex::create(&staging.join(INDEX_FILE))?;
        if let Some(doc) = docs.iter().find(|d| d.embedding.len() != manifest.dimensions) {
            return Err(TubeQaError::VectorStore(format!(
                "Chunk {} has {} dimensions, expected {}",
                doc.chunk_order,
                doc.embedding.len(),
                manifest.dimensions
            )));
        }
        index.insert_batch(docs).await?;
    }

    let json = serde_json::to_string_pretty(manifest)?;
    std::fs::write(staging.join(MANIFEST_FILE), json)?;
    Ok(())
}

fn read_manifest_at(dir: &Path) -> Result<Option<IndexManifest>> {
    let path = dir.join(MANIFEST_FILE);
    match std::fs::read_to_string(&path) {
        Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn dir_has_entries(dir: &Path) -> Result<bool> {
    match std::fs::read_dir(dir) {
        Ok(mut entries) => Ok(entries.next().is_some()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Remove staging directories not modified for `older_than`.
fn sweep_staging(root: &Path, older_than: Duration) -> Result<()> {
    for entry in std::fs::read_dir(root)?.filter_map(|e| e.ok()) {
        if !entry.file_name().to_string_lossy().starts_with(STAGING_PREFIX) {
            continue;
        }
        let stale = entry
            .metadata()
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| modified.elapsed().ok())
            .is_some_and(|age| age >= older_than);
        if stale {
            debug!("Removing stale staging directory {:?}", entry.path());
            discard(&entry.path());
        }
    }
    Ok(())
}

fn discard(staging: &Path) {
    if let Err(e) = std::fs::remove_dir_all(staging) {
        warn!("Failed to remove staging directory {:?}: {}", staging, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(id: &str) -> VideoId {
        VideoId::parse(id).unwrap()
    }

    fn manifest(id: &VideoId, count: usize) -> IndexManifest {
        IndexManifest {
            video_id: id.clone(),
            embedding_model: "test-model".to_string(),
            dimensions: 2,
            chunk_size: 500,
            chunk_overlap: 100,
            chunk_count: count,
            indexed_at: Utc::now(),
        }
    }

    fn docs() -> Vec<Document> {
        vec![
            Document::new("first".to_string(), 0, vec![1.0, 0.0]),
            Document::new("second".to_string(), 1, vec![0.0, 1.0]),
        ]
    }

    #[test]
    fn test_is_indexed_requires_non_empty_dir() {
        let root = tempfile::tempdir().unwrap();
        let store = IndexStore::new(root.path()).unwrap();
        let id = video("abc123");

        assert!(!store.is_indexed(&id).unwrap());

        std::fs::create_dir(store.video_dir(&id)).unwrap();
        assert!(!store.is_indexed(&id).unwrap());

        std::fs::write(store.video_dir(&id).join("anything"), "x").unwrap();
        assert!(store.is_indexed(&id).unwrap());
    }

    #[tokio::test]
    async fn test_create_then_open() {
        let root = tempfile::tempdir().unwrap();
        let store = IndexStore::new(root.path()).unwrap();
        let id = video("abc123");

        let index = store.create(&id, &docs(), &manifest(&id, 2)).await.unwrap();
        assert_eq!(index.document_count().await.unwrap(), 2);
        assert!(store.is_indexed(&id).unwrap());
        assert!(store.video_dir(&id).join(INDEX_FILE).exists());

        let reopened = store.open(&id).unwrap();
        let contents: Vec<String> = reopened
            .documents()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.content)
            .collect();
        assert_eq!(contents, vec!["first", "second"]);

        let stored = store.read_manifest(&id).unwrap().unwrap();
        assert_eq!(stored.chunk_count, 2);
        assert_eq!(stored.embedding_model, "test-model");
    }

    #[tokio::test]
    async fn test_create_leaves_no_staging_dirs() {
        let root = tempfile::tempdir().unwrap();
        let store = IndexStore::new(root.path()).unwrap();
        let id = video("abc123");

        store.create(&id, &docs(), &manifest(&id, 2)).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(root.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["abc123"]);
    }

    #[tokio::test]
    async fn test_create_replaces_empty_leftover_dir() {
        let root = tempfile::tempdir().unwrap();
        let store = IndexStore::new(root.path()).unwrap();
        let id = video("abc123");
        std::fs::create_dir(store.video_dir(&id)).unwrap();

        store.create(&id, &docs(), &manifest(&id, 2)).await.unwrap();
        assert!(store.read_manifest(&id).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failed_build_leaves_nothing_behind() {
        let root = tempfile::tempdir().unwrap();
        let store = IndexStore::new(root.path()).unwrap();
        let id = video("abc123");

        let mut wrong = manifest(&id, 2);
        wrong.dimensions = 3;
        let err = store.create(&id, &docs(), &wrong).await.unwrap_err();

        assert!(matches!(err, TubeQaError::VectorStore(_)));
        assert!(!store.video_dir(&id).exists());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_sweep_removes_only_stale_staging_dirs() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join(".staging-abc123-1")).unwrap();
        std::fs::create_dir(root.path().join("abc123")).unwrap();

        // Fresh staging directories may belong to a running build.
        IndexStore::new(root.path()).unwrap();
        assert!(root.path().join(".staging-abc123-1").exists());

        sweep_staging(root.path(), Duration::ZERO).unwrap();
        assert!(!root.path().join(".staging-abc123-1").exists());
        assert!(root.path().join("abc123").exists());
    }

    #[tokio::test]
    async fn test_released_locks_are_pruned() {
        let root = tempfile::tempdir().unwrap();
        let store = IndexStore::new(root.path()).unwrap();

        for id in ["aaa", "bbb", "ccc"] {
            let _guard = store.lock_video(&video(id)).await.unwrap();
        }
        let held = store.lock_video(&video("ddd")).await.unwrap();

        assert_eq!(store.locks.lock().unwrap().len(), 1);
        drop(held);
    }

    #[tokio::test]
    async fn test_existing_index_wins_over_late_build() {
        let root = tempfile::tempdir().unwrap();
        let store = IndexStore::new(root.path()).unwrap();
        let id = video("abc123");

        store.create(&id, &docs(), &manifest(&id, 2)).await.unwrap();

        let late = vec![Document::new("late".to_string(), 0, vec![1.0, 1.0])];
        let index = store.create(&id, &late, &manifest(&id, 1)).await.unwrap();

        assert_eq!(index.document_count().await.unwrap(), 2);
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_list_skips_hidden_and_unmanifested() {
        let root = tempfile::tempdir().unwrap();
        let store = IndexStore::new(root.path()).unwrap();

        let a = video("aaa");
        store.create(&a, &docs(), &manifest(&a, 2)).await.unwrap();
        std::fs::create_dir(root.path().join(".staging-bbb-1")).unwrap();
        std::fs::create_dir(root.path().join("ccc")).unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].video_id, a);
    }

    #[tokio::test]
    async fn test_lock_video_serialises_same_video() {
        let root = tempfile::tempdir().unwrap();
        let store = Arc::new(IndexStore::new(root.path()).unwrap());
        let id = video("abc123");

        let guard = store.lock_video(&id).await.unwrap();

        let other = {
            let store = store.clone();
            let id = id.clone();
            tokio::spawn(async move {
                let _guard = store.lock_video(&id).await.unwrap();
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!other.is_finished());

        // A different video is not blocked.
        let _unrelated = store.lock_video(&video("zzz")).await.unwrap();

        drop(guard);
        other.await.unwrap();
    }
}
