//! Pipeline orchestrator for tubeqa.
//!
//! Coordinates one question from URL to answer: resolve the video, reuse or
//! build its index, retrieve the nearest chunks and generate the answer.

use crate::captions::{CaptionLoader, SubtitleFetcher, YtDlpFetcher};
use crate::chunking::{Chunker, RecursiveSplitter};
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{Result, TubeQaError};
use crate::llm::{LanguageModel, OpenAIChatModel};
use crate::rag::{Answer, AnswerGenerator, RetrievedChunk, Retriever};
use crate::source::VideoId;
use crate::vector_store::{Document, IndexManifest, IndexStore, SqliteVectorIndex, VectorIndex};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Message shown when either input is blank.
pub const MISSING_INPUT_MESSAGE: &str = "Please enter both URL and question";

/// The main orchestrator for the tubeqa pipeline.
pub struct Orchestrator {
    settings: Settings,
    loader: CaptionLoader,
    chunker: Arc<dyn Chunker>,
    embedder: Arc<dyn Embedder>,
    store: IndexStore,
    retriever: Retriever,
    generator: AnswerGenerator,
}

/// Result of making sure a video is indexed.
#[derive(Debug, Clone)]
pub struct IndexOutcome {
    pub video_id: VideoId,
    /// Whether an existing index was reused.
    pub reused: bool,
    pub chunk_count: usize,
}

impl Orchestrator {
    /// Create an orchestrator with the production collaborators.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let fetcher: Arc<dyn SubtitleFetcher> = Arc::new(
            YtDlpFetcher::with_program(&settings.captions.ytdlp_path)
                .with_auto_generated(settings.captions.include_auto_generated),
        );

        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
            &settings.embedding_client(),
        )?);

        let llm: Arc<dyn LanguageModel> = Arc::new(OpenAIChatModel::with_options(
            &settings.llm.model,
            &settings.llm_client(),
        )?);

        info!(
            "Using {} for embeddings and {} for answers",
            settings.embedding.model, settings.llm.model
        );

        Self::with_components(settings, prompts, fetcher, embedder, llm)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        fetcher: Arc<dyn SubtitleFetcher>,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LanguageModel>,
    ) -> Result<Self> {
        let chunker: Arc<dyn Chunker> = Arc::new(RecursiveSplitter::new(settings.chunking_config()?)?);
        let store = IndexStore::new(settings.index_dir())?;

        Ok(Self {
            loader: CaptionLoader::new(fetcher, &settings.captions.language),
            chunker,
            retriever: Retriever::new(embedder.clone()),
            generator: AnswerGenerator::new(llm, prompts),
            embedder,
            store,
            settings,
        })
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get the index store.
    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    /// Answer a question about a video.
    ///
    /// Blank input fails with [`TubeQaError::InvalidInput`]; a URL without a
    /// video id fails with [`TubeQaError::MalformedUrl`]; a video without
    /// captions fails with [`TubeQaError::NoCaptions`]. Everything else is a
    /// collaborator failure, propagated as-is.
    #[instrument(skip(self, question), fields(url = %url))]
    pub async fn ask(&self, url: &str, question: &str) -> Result<Answer> {
        if url.trim().is_empty() || question.trim().is_empty() {
            return Err(TubeQaError::InvalidInput(MISSING_INPUT_MESSAGE.to_string()));
        }

        let video_id = VideoId::from_url(url)?;
        let (index, reused_index) = self.open_or_build(&video_id).await?;

        let sources = self.retriever.retrieve(&index, question).await?;
        let answer = self.generator.generate(question, &sources).await?;

        Ok(Answer {
            answer,
            video_id,
            reused_index,
            sources,
        })
    }

    /// Build the index for a video unless it already exists.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn ensure_index(&self, url: &str) -> Result<IndexOutcome> {
        let video_id = VideoId::from_url(url)?;
        let (index, reused) = self.open_or_build(&video_id).await?;
        let chunk_count = index.document_count().await?;

        Ok(IndexOutcome {
            video_id,
            reused,
            chunk_count,
        })
    }

    /// Retrieve the chunks nearest to a query without generating an answer.
    #[instrument(skip(self, query), fields(url = %url))]
    pub async fn search(&self, url: &str, query: &str) -> Result<(VideoId, Vec<RetrievedChunk>)> {
        if query.trim().is_empty() {
            return Err(TubeQaError::InvalidInput("Query must not be empty".to_string()));
        }

        let video_id = VideoId::from_url(url)?;
        let (index, _) = self.open_or_build(&video_id).await?;
        let chunks = self.retriever.retrieve(&index, query).await?;
        Ok((video_id, chunks))
    }

    /// Indexed videos, newest first.
    pub fn list_videos(&self) -> Result<Vec<IndexManifest>> {
        self.store.list()
    }

    /// Open the video's index, building it first if the video is not indexed.
    ///
    /// The reuse-or-build decision runs under the video's lock, so concurrent
    /// first requests for the same video fetch and embed its captions once.
    async fn open_or_build(&self, video_id: &VideoId) -> Result<(SqliteVectorIndex, bool)> {
        let _guard = self.store.lock_video(video_id).await?;

        if self.store.is_indexed(video_id)? {
            info!("Reusing existing index for {}", video_id);
            self.check_manifest(video_id);
            return Ok((self.store.open(video_id)?, true));
        }

        let index = self.build_index(video_id).await?;
        Ok((index, false))
    }

    #[instrument(skip(self), fields(video_id = %video_id))]
    async fn build_index(&self, video_id: &VideoId) -> Result<SqliteVectorIndex> {
        let lines = self.loader.load(video_id).await?;

        let chunks = self.chunker.chunk(&lines);
        if chunks.is_empty() {
            return Err(TubeQaError::NoCaptions(video_id.to_string()));
        }
        info!("Split {} caption lines into {} chunks", lines.len(), chunks.len());

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(TubeQaError::Embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let docs: Vec<Document> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| Document::new(chunk.content, chunk.order, embedding))
            .collect();

        let manifest = self.expected_manifest(video_id, docs.len());
        self.store.create(video_id, &docs, &manifest).await
    }

    /// Warn when a reused index was built differently from the current
    /// configuration. The index is still used as-is.
    fn check_manifest(&self, video_id: &VideoId) {
        let manifest = match self.store.read_manifest(video_id) {
            Ok(Some(manifest)) => manifest,
            Ok(None) => {
                warn!("Index for {} has no manifest", video_id);
                return;
            }
            Err(e) => {
                warn!("Could not read manifest for {}: {}", video_id, e);
                return;
            }
        };

        let current = self.expected_manifest(video_id, manifest.chunk_count);
        for mismatch in manifest_mismatches(&manifest, &current) {
            warn!("Index for {} {}", video_id, mismatch);
        }
    }

    /// Manifest an index built now with the current configuration would get.
    fn expected_manifest(&self, video_id: &VideoId, chunk_count: usize) -> IndexManifest {
        let chunking = self.chunker.config();
        IndexManifest {
            video_id: video_id.clone(),
            embedding_model: self.embedder.model_name().to_string(),
            dimensions: self.embedder.dimensions(),
            chunk_size: chunking.chunk_size,
            chunk_overlap: chunking.chunk_overlap,
            chunk_count,
            indexed_at: Utc::now(),
        }
    }
}

/// Describe how a stored manifest differs from the current configuration.
fn manifest_mismatches(stored: &IndexManifest, current: &IndexManifest) -> Vec<String> {
    let mut mismatches = Vec::new();

    if stored.embedding_model != current.embedding_model {
        mismatches.push(format!(
            "was built with embedding model {}, now configured {}",
            stored.embedding_model, current.embedding_model
        ));
    }

    // Query vectors of another length score 0.0 against every chunk.
    if stored.dimensions != current.dimensions {
        mismatches.push(format!(
            "has {}-dimensional embeddings, now configured {}",
            stored.dimensions, current.dimensions
        ));
    }

    if stored.chunk_size != current.chunk_size || stored.chunk_overlap != current.chunk_overlap {
        mismatches.push(format!(
            "was chunked with size {}/overlap {}, now configured {}/{}",
            stored.chunk_size, stored.chunk_overlap, current.chunk_size, current.chunk_overlap
        ));
    }

    mismatches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captions::testing::FakeFetcher;
    use crate::embedding::testing::BagOfWordsEmbedder;
    use crate::error::ErrorKind;
    use crate::llm::testing::EchoModel;
    use tokio_test::{assert_err, assert_ok};

    const URL: &str = "https://www.youtube.com/watch?v=abc123";

    struct Harness {
        orchestrator: Orchestrator,
        fetcher: Arc<FakeFetcher>,
        embedder: Arc<BagOfWordsEmbedder>,
        llm: Arc<EchoModel>,
    }

    fn harness(root: &std::path::Path, fetcher: FakeFetcher) -> Harness {
        let mut settings = Settings::default();
        settings.index.dir = root.to_string_lossy().into_owned();

        let fetcher = Arc::new(fetcher);
        let embedder = Arc::new(BagOfWordsEmbedder::new());
        let llm = Arc::new(EchoModel::new());

        let orchestrator = Orchestrator::with_components(
            settings,
            Prompts::default(),
            fetcher.clone(),
            embedder.clone(),
            llm.clone(),
        )
        .unwrap();

        Harness {
            orchestrator,
            fetcher,
            embedder,
            llm,
        }
    }

    fn attention_captions() -> FakeFetcher {
        FakeFetcher::with_captions(&[
            "Self-attention lets each token look at every other token.",
            "It computes weighted sums of value vectors.",
        ])
    }

    #[tokio::test]
    async fn test_self_attention_question_end_to_end() {
        let root = tempfile::tempdir().unwrap();
        let h = harness(root.path(), attention_captions());

        let answer = assert_ok!(h.orchestrator.ask(URL, "What is self-attention?").await);

        assert!(!answer.answer.is_empty());
        assert_eq!(answer.video_id.as_str(), "abc123");
        assert!(!answer.reused_index);
        assert!(!answer.sources.is_empty());
        assert!(answer.sources.iter().any(|c| c.content.contains("Self-attention")
            || c.content.contains("weighted sums")));

        let prompt = h.llm.last_prompt().unwrap();
        assert!(prompt.contains("What is self-attention?"));
        assert!(prompt.contains("Self-attention lets each token look at every other token."));
        assert!(root.path().join("abc123").join("index.db").exists());
    }

    #[tokio::test]
    async fn test_second_ask_reuses_index_without_embedding_chunks() {
        let root = tempfile::tempdir().unwrap();
        let h = harness(root.path(), attention_captions());

        assert_ok!(h.orchestrator.ask(URL, "What is self-attention?").await);
        let embedded_after_first = h.embedder.texts_embedded();

        let second = assert_ok!(h.orchestrator.ask(URL, "What are value vectors?").await);

        assert!(second.reused_index);
        assert_eq!(h.fetcher.call_count(), 1);
        // Only the question is embedded the second time.
        assert_eq!(h.embedder.texts_embedded(), embedded_after_first + 1);
    }

    #[tokio::test]
    async fn test_existing_index_wins_over_new_captions() {
        let root = tempfile::tempdir().unwrap();

        let first = harness(root.path(), attention_captions());
        assert_ok!(first.orchestrator.ensure_index(URL).await);

        let second = harness(
            root.path(),
            FakeFetcher::with_captions(&["Completely different captions about gardening."]),
        );
        let answer = assert_ok!(second.orchestrator.ask(URL, "What is self-attention?").await);

        assert!(answer.reused_index);
        assert_eq!(second.fetcher.call_count(), 0);
        assert!(answer.sources.iter().all(|c| !c.content.contains("gardening")));
    }

    #[tokio::test]
    async fn test_no_captions_leaves_no_index_dir() {
        let root = tempfile::tempdir().unwrap();
        let h = harness(root.path(), FakeFetcher::empty());

        let err = assert_err!(h.orchestrator.ask(URL, "Anything?").await);

        assert_eq!(err.kind(), ErrorKind::NoCaptions);
        assert!(!root.path().join("abc123").exists());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
        assert_eq!(h.llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_header_only_captions_are_no_captions() {
        let root = tempfile::tempdir().unwrap();
        let h = harness(root.path(), FakeFetcher::with_vtt("WEBVTT\n\n"));

        let err = assert_err!(h.orchestrator.ensure_index(URL).await);
        assert!(matches!(err, TubeQaError::NoCaptions(_)));
        assert!(!h.orchestrator.store().is_indexed(&VideoId::parse("abc123").unwrap()).unwrap());
    }

    #[tokio::test]
    async fn test_malformed_url() {
        let root = tempfile::tempdir().unwrap();
        let h = harness(root.path(), attention_captions());

        let err = assert_err!(
            h.orchestrator
                .ask("https://www.youtube.com/watch?t=10", "What?")
                .await
        );
        assert_eq!(err.kind(), ErrorKind::MalformedUrl);
        assert_eq!(h.fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_input_rejected() {
        let root = tempfile::tempdir().unwrap();
        let h = harness(root.path(), attention_captions());

        let err = assert_err!(h.orchestrator.ask(URL, "   ").await);
        assert_eq!(err.to_string(), format!("Invalid input: {}", MISSING_INPUT_MESSAGE));

        let err = assert_err!(h.orchestrator.ask("", "What?").await);
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_concurrent_first_requests_build_once() {
        let root = tempfile::tempdir().unwrap();
        let h = harness(root.path(), attention_captions());

        let (a, b) = tokio::join!(
            h.orchestrator.ask(URL, "What is self-attention?"),
            h.orchestrator.ask(URL, "What are value vectors?"),
        );
        let a = assert_ok!(a);
        let b = assert_ok!(b);

        assert_eq!(h.fetcher.call_count(), 1);
        assert_ne!(a.reused_index, b.reused_index);
    }

    #[tokio::test]
    async fn test_search_and_list() {
        let root = tempfile::tempdir().unwrap();
        let h = harness(root.path(), attention_captions());

        let (video_id, chunks) = assert_ok!(h.orchestrator.search(URL, "value vectors").await);
        assert_eq!(video_id.as_str(), "abc123");
        assert!(!chunks.is_empty());
        assert_eq!(h.llm.call_count(), 0);

        let listed = assert_ok!(h.orchestrator.list_videos());
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].embedding_model, "bag-of-words");
        assert_eq!(listed[0].chunk_count, chunks.len());
    }

    #[test]
    fn test_manifest_dimension_mismatch_is_reported() {
        let root = tempfile::tempdir().unwrap();
        let h = harness(root.path(), attention_captions());
        let id = VideoId::parse("abc123").unwrap();

        let current = h.orchestrator.expected_manifest(&id, 3);
        assert!(manifest_mismatches(&current, &current).is_empty());

        let mut stored = current.clone();
        stored.dimensions = 1536;
        let mismatches = manifest_mismatches(&stored, &current);
        assert_eq!(mismatches.len(), 1);
        assert!(mismatches[0].contains("1536-dimensional"));
    }

    #[test]
    fn test_manifest_model_and_chunking_mismatch_reported() {
        let root = tempfile::tempdir().unwrap();
        let h = harness(root.path(), attention_captions());
        let current = h
            .orchestrator
            .expected_manifest(&VideoId::parse("abc123").unwrap(), 3);

        let mut stored = current.clone();
        stored.embedding_model = "text-embedding-3-large".to_string();
        stored.chunk_size = 800;
        let mismatches = manifest_mismatches(&stored, &current);

        assert_eq!(mismatches.len(), 2);
        assert!(mismatches[0].contains("text-embedding-3-large"));
        assert!(mismatches[1].contains("800"));
    }
}
