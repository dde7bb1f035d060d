//! Video identifier resolution.
//!
//! Turns a free-text YouTube watch URL into the video identifier used to key
//! caption downloads and on-disk indexes.

use crate::error::{Result, TubeQaError};
use serde::{Deserialize, Serialize};
use url::Url;

/// Name of the query parameter carrying the video identifier.
const VIDEO_PARAM: &str = "v";

/// A YouTube video identifier, e.g. `dQw4w9WgXcQ`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    /// Resolve the identifier from a watch URL's `v` query parameter.
    ///
    /// Other query parameters (`t`, `list`, ...) are ignored. Fails with
    /// [`TubeQaError::MalformedUrl`] when the input does not parse as a URL or
    /// carries no usable `v` value.
    pub fn from_url(input: &str) -> Result<Self> {
        let input = input.trim();
        let url = Url::parse(input)
            .map_err(|e| TubeQaError::MalformedUrl(format!("{} ({})", input, e)))?;

        // Blank values are skipped, so `?v=&v=abc` resolves to `abc`.
        let value = url
            .query_pairs()
            .filter(|(key, value)| key == VIDEO_PARAM && !value.is_empty())
            .map(|(_, value)| value.into_owned())
            .next()
            .ok_or_else(|| {
                TubeQaError::MalformedUrl(format!(
                    "{} has no '{}' query parameter",
                    input, VIDEO_PARAM
                ))
            })?;

        Self::parse(&value).ok_or_else(|| {
            TubeQaError::MalformedUrl(format!("'{}' is not a valid video identifier", value))
        })
    }

    /// Accept a bare identifier.
    ///
    /// The identifier names a directory under the index root, so only the
    /// URL-safe base64 alphabet YouTube uses is allowed.
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = !raw.is_empty()
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        valid.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch URL for this video.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
