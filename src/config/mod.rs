//! Configuration module for tubeqa.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AnswerPrompts, Prompts, ANSWER_PROMPT_FILE};
pub use settings::{
    CaptionSettings, ChunkingSettings, DisplaySettings, EmbeddingSettings, GeneralSettings,
    IndexSettings, LlmSettings, PromptSettings, Settings,
};
