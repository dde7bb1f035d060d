//! Subtitle download through yt-dlp.

use super::SubtitleFetcher;
use crate::error::{Result, TubeQaError};
use crate::source::VideoId;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Fetches authored and auto-generated subtitles with the `yt-dlp` binary.
pub struct YtDlpFetcher {
    program: String,
    include_auto_generated: bool,
}

impl YtDlpFetcher {
    pub fn new() -> Self {
        Self::with_program("yt-dlp")
    }

    /// Use a specific yt-dlp executable.
    pub fn with_program(program: &str) -> Self {
        Self {
            program: program.to_string(),
            include_auto_generated: true,
        }
    }

    /// Whether to fall back to YouTube's automatic captions.
    pub fn with_auto_generated(mut self, include: bool) -> Self {
        self.include_auto_generated = include;
        self
    }

    /// Build the argument list for a subtitle-only download.
    fn build_args(&self, video_id: &VideoId, language: &str, output_dir: &Path) -> Vec<String> {
        let template = output_dir.join("%(id)s.%(ext)s");

        let mut args = vec![
            "--skip-download".to_string(),
            "--write-subs".to_string(),
        ];
        if self.include_auto_generated {
            args.push("--write-auto-subs".to_string());
        }
        args.extend([
            "--sub-langs".to_string(),
            language.to_string(),
            "--sub-format".to_string(),
            "vtt".to_string(),
            "--output".to_string(),
            template.to_string_lossy().into_owned(),
            "--no-playlist".to_string(),
            "--quiet".to_string(),
            "--no-warnings".to_string(),
            video_id.watch_url(),
        ]);
        args
    }
}

impl Default for YtDlpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubtitleFetcher for YtDlpFetcher {
    #[instrument(skip(self, output_dir), fields(video_id = %video_id))]
    async fn fetch(&self, video_id: &VideoId, language: &str, output_dir: &Path) -> Result<()> {
        let args = self.build_args(video_id, language, output_dir);
        debug!("Running {} {}", self.program, args.join(" "));

        let result = Command::new(&self.program)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TubeQaError::ToolNotFound(self.program.clone()));
            }
            Err(e) => {
                return Err(TubeQaError::SubtitleFetch(format!(
                    "{} execution failed: {e}",
                    self.program
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TubeQaError::ToolFailed(format!(
                "{} failed for {}: {}",
                self.program,
                video_id,
                stderr.trim()
            )));
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "yt-dlp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args() {
        let fetcher = YtDlpFetcher::new();
        let id = VideoId::parse("abc123").unwrap();
        let args = fetcher.build_args(&id, "en", Path::new("/tmp/subs"));

        assert!(args.contains(&"--skip-download".to_string()));
        assert!(args.contains(&"--write-auto-subs".to_string()));
        assert!(args.windows(2).any(|w| w[0] == "--sub-langs" && w[1] == "en"));
        assert!(args.windows(2).any(|w| w[0] == "--output" && w[1] == "/tmp/subs/%(id)s.%(ext)s"));
        assert_eq!(args.last().unwrap(), "https://www.youtube.com/watch?v=abc123");
    }

    #[test]
    fn test_authored_only() {
        let fetcher = YtDlpFetcher::new().with_auto_generated(false);
        let id = VideoId::parse("abc123").unwrap();
        let args = fetcher.build_args(&id, "de", Path::new("/tmp"));

        assert!(!args.contains(&"--write-auto-subs".to_string()));
        assert!(args.contains(&"--write-subs".to_string()));
    }

    #[tokio::test]
    async fn test_missing_binary_is_tool_not_found() {
        let fetcher = YtDlpFetcher::with_program("tubeqa-definitely-not-a-real-binary");
        let id = VideoId::parse("abc123").unwrap();
        let dir = tempfile::tempdir().unwrap();

        let err = fetcher.fetch(&id, "en", dir.path()).await.unwrap_err();
        assert!(matches!(err, TubeQaError::ToolNotFound(_)));
    }
}
