//! Error types for tubeqa.

use thiserror::Error;

/// Library-level error type for tubeqa operations.
#[derive(Error, Debug)]
pub enum TubeQaError {
    #[error("Malformed video URL: {0}")]
    MalformedUrl(String),

    #[error("No captions found for video {0}")]
    NoCaptions(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Subtitle download failed: {0}")]
    SubtitleFetch(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Answer generation failed: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Coarse classification used by the user-facing surfaces.
///
/// Only the first three kinds are anticipated conditions the user can fix;
/// everything else is a collaborator failure and is reported generically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedUrl,
    NoCaptions,
    InvalidInput,
    Collaborator,
}

impl TubeQaError {
    /// Classify this error for presentation.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TubeQaError::MalformedUrl(_) => ErrorKind::MalformedUrl,
            TubeQaError::NoCaptions(_) => ErrorKind::NoCaptions,
            TubeQaError::InvalidInput(_) => ErrorKind::InvalidInput,
            _ => ErrorKind::Collaborator,
        }
    }

    /// Whether the user can correct this by changing their input.
    pub fn is_user_correctable(&self) -> bool {
        self.kind() != ErrorKind::Collaborator
    }
}

/// Result type alias for tubeqa operations.
pub type Result<T> = std::result::Result<T, TubeQaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            TubeQaError::MalformedUrl("x".into()).kind(),
            ErrorKind::MalformedUrl
        );
        assert_eq!(TubeQaError::NoCaptions("abc".into()).kind(), ErrorKind::NoCaptions);
        assert_eq!(
            TubeQaError::Embedding("boom".into()).kind(),
            ErrorKind::Collaborator
        );
        assert!(TubeQaError::InvalidInput("empty".into()).is_user_correctable());
        assert!(!TubeQaError::ToolNotFound("yt-dlp".into()).is_user_correctable());
    }
}
