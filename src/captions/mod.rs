//! Caption loading for tubeqa.
//!
//! Downloads a video's subtitles into a throwaway directory through a
//! [`SubtitleFetcher`] and reduces the WebVTT file to its spoken lines.

mod vtt;
mod ytdlp;

pub use vtt::clean_vtt;
pub use ytdlp::YtDlpFetcher;

use crate::error::{Result, TubeQaError};
use crate::source::VideoId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Extension of the subtitle files the loader looks for.
const SUBTITLE_EXTENSION: &str = "vtt";

/// One cleaned line of caption text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaptionLine(String);

impl CaptionLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn text(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CaptionLine {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// Trait for subtitle download backends.
#[async_trait]
pub trait SubtitleFetcher: Send + Sync {
    /// Write the subtitle file(s) for `video_id` in `language` into `output_dir`.
    ///
    /// Finding nothing to download is not an error here; the loader decides
    /// what an empty directory means.
    async fn fetch(&self, video_id: &VideoId, language: &str, output_dir: &Path) -> Result<()>;

    /// Human-readable backend name.
    fn name(&self) -> &str;
}

/// Loads and cleans captions for a video.
pub struct CaptionLoader {
    fetcher: Arc<dyn SubtitleFetcher>,
    language: String,
}

impl CaptionLoader {
    /// Create a loader for a single target language.
    pub fn new(fetcher: Arc<dyn SubtitleFetcher>, language: &str) -> Self {
        Self {
            fetcher,
            language: language.to_string(),
        }
    }

    /// Fetch and clean the captions of a video.
    ///
    /// Fails with [`TubeQaError::NoCaptions`] when the fetcher produced no
    /// subtitle file, or when the file holds no caption text at all. The
    /// download directory is removed before returning.
    #[instrument(skip(self), fields(video_id = %video_id, language = %self.language))]
    pub async fn load(&self, video_id: &VideoId) -> Result<Vec<CaptionLine>> {
        let tmp = tempfile::Builder::new().prefix("tubeqa-subs-").tempdir()?;

        info!("Fetching subtitles with {}", self.fetcher.name());
        self.fetcher.fetch(video_id, &self.language, tmp.path()).await?;

        let subtitle_path = find_subtitle_file(tmp.path())?
            .ok_or_else(|| TubeQaError::NoCaptions(video_id.to_string()))?;
        debug!("Reading subtitles from {:?}", subtitle_path);

        let raw = tokio::fs::read(&subtitle_path).await?;
        let lines = clean_vtt(&String::from_utf8_lossy(&raw));

        if lines.is_empty() {
            return Err(TubeQaError::NoCaptions(video_id.to_string()));
        }

        info!("Loaded {} caption lines", lines.len());
        Ok(lines)
    }
}

/// Locate the first subtitle file in a directory, in file-name order.
fn find_subtitle_file(dir: &Path) -> Result<Option<PathBuf>> {
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(SUBTITLE_EXTENSION))
        })
        .collect();

    candidates.sort();
    Ok(candidates.into_iter().next())
}


#[cfg(test)]
mod tests {
    use super::testing::FakeFetcher;
    use super::*;

    fn video() -> VideoId {
        VideoId::parse("abc123").unwrap()
    }

    #[tokio::test]
    async fn test_load_cleans_captions() {
        let fetcher = Arc::new(FakeFetcher::with_captions(&["Hello there.", "General Kenobi."]));
        let loader = CaptionLoader::new(fetcher.clone(), "en");

        let lines = loader.load(&video()).await.unwrap();

        assert_eq!(
            lines,
            vec![
                CaptionLine::from("Kind: captions"),
                CaptionLine::from("Hello there."),
                CaptionLine::from("General Kenobi."),
            ]
        );
        assert_eq!(fetcher.call_count(), 1);
    }

    #[tokio::test]
    async fn test_no_subtitle_file_is_no_captions() {
        let loader = CaptionLoader::new(Arc::new(FakeFetcher::empty()), "en");
        let err = loader.load(&video()).await.unwrap_err();
        assert!(matches!(err, TubeQaError::NoCaptions(id) if id == "abc123"));
    }

    #[tokio::test]
    async fn test_header_only_file_is_no_captions() {
        let loader = CaptionLoader::new(Arc::new(FakeFetcher::with_vtt("WEBVTT\n\n")), "en");
        let err = loader.load(&video()).await.unwrap_err();
        assert!(matches!(err, TubeQaError::NoCaptions(_)));
    }

    #[tokio::test]
    async fn test_download_dir_removed_after_load() {
        let fetcher = Arc::new(FakeFetcher::with_captions(&["Hello there."]));
        let loader = CaptionLoader::new(fetcher.clone(), "en");

        loader.load(&video()).await.unwrap();

        let dir = fetcher.last_output_dir().unwrap();
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_download_dir_removed_when_no_captions() {
        let fetcher = Arc::new(FakeFetcher::empty());
        let loader = CaptionLoader::new(fetcher.clone(), "en");
        assert!(loader.load(&video()).await.is_err());
        assert!(!fetcher.last_output_dir().unwrap().exists());

        let fetcher = Arc::new(FakeFetcher::with_vtt("WEBVTT\n\n"));
        let loader = CaptionLoader::new(fetcher.clone(), "en");
        assert!(loader.load(&video()).await.is_err());
        assert!(!fetcher.last_output_dir().unwrap().exists());
    }

    #[test]
    fn test_find_subtitle_file_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abc.info.json"), "{}").unwrap();
        assert!(find_subtitle_file(dir.path()).unwrap().is_none());

        std::fs::write(dir.path().join("abc.en.VTT"), "WEBVTT").unwrap();
        let found = find_subtitle_file(dir.path()).unwrap().unwrap();
        assert_eq!(found.file_name().unwrap(), "abc.en.VTT");
    }
}
