//! Configuration settings for tubeqa.

use crate::chunking::{ChunkingConfig, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::error::{Result, TubeQaError};
use crate::openai::{ClientOptions, DEFAULT_TIMEOUT_SECS};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub captions: CaptionSettings,
    pub chunking: ChunkingSettings,
    pub embedding: EmbeddingSettings,
    pub index: IndexSettings,
    pub llm: LlmSettings,
    pub display: DisplaySettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level used when no -v flag is given (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.tubeqa".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Subtitle download settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionSettings {
    /// Subtitle language code requested from YouTube.
    pub language: String,
    /// yt-dlp executable name or path.
    pub ytdlp_path: String,
    /// Fall back to automatically generated subtitles.
    pub include_auto_generated: bool,
}

impl Default for CaptionSettings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            ytdlp_path: "yt-dlp".to_string(),
            include_auto_generated: true,
        }
    }
}

/// Caption chunking settings, in characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
    /// OpenAI-compatible base URL. Unset means api.openai.com.
    pub api_base: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            api_base: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Vector index location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Root directory; each video gets a subdirectory named by its id.
    pub dir: String,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            dir: "~/.tubeqa/vector_db".to_string(),
        }
    }
}

/// Answer generation model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub model: String,
    pub api_base: Option<String>,
    pub api_key_env: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            api_base: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// How answers and their sources are shown.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Characters of each source chunk shown before "...".
    pub source_preview_chars: usize,
    pub show_sources: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            source_preview_chars: 300,
            show_sources: true,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// A missing file yields the defaults.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| TubeQaError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tubeqa")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded index root.
    pub fn index_dir(&self) -> PathBuf {
        Self::expand_path(&self.index.dir)
    }

    /// Validated chunking parameters.
    pub fn chunking_config(&self) -> Result<ChunkingConfig> {
        ChunkingConfig::new(self.chunking.chunk_size, self.chunking.chunk_overlap)
    }

    pub fn embedding_client(&self) -> ClientOptions {
        ClientOptions {
            api_base: self.embedding.api_base.clone(),
            api_key_env: self.embedding.api_key_env.clone(),
            timeout: Duration::from_secs(self.embedding.timeout_secs),
        }
    }

    pub fn llm_client(&self) -> ClientOptions {
        ClientOptions {
            api_base: self.llm.api_base.clone(),
            api_key_env: self.llm.api_key_env.clone(),
            timeout: Duration::from_secs(self.llm.timeout_secs),
        }
    }

    /// Distinct API key variables the configured endpoints need.
    pub fn required_key_envs(&self) -> Vec<&str> {
        let mut envs = vec![self.embedding.api_key_env.as_str()];
        if self.llm.api_key_env != self.embedding.api_key_env {
            envs.push(self.llm.api_key_env.as_str());
        }
        envs
    }
}
