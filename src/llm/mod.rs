//! Language model access for answer generation.

mod openai;

pub use openai::OpenAIChatModel;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for text generation backends.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete a single prompt and return the model's text verbatim.
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String>;

    /// Identifier of the underlying model.
    fn model_name(&self) -> &str;
}
