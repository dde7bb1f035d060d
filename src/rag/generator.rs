//! Answer generation from retrieved chunks.

use super::RetrievedChunk;
use crate::config::Prompts;
use crate::error::Result;
use crate::llm::LanguageModel;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// Sampling temperature for answers.
pub const ANSWER_TEMPERATURE: f32 = 0.0;

/// Join chunk contents, in retrieval order, into the prompt context.
pub fn format_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fills the answer template and asks the language model.
pub struct AnswerGenerator {
    llm: Arc<dyn LanguageModel>,
    prompts: Prompts,
}

impl AnswerGenerator {
    pub fn new(llm: Arc<dyn LanguageModel>, prompts: Prompts) -> Self {
        Self { llm, prompts }
    }

    /// The exact prompt sent to the model.
    pub fn build_prompt(&self, question: &str, chunks: &[RetrievedChunk]) -> String {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), format_context(chunks));
        vars.insert("question".to_string(), question.to_string());
        self.prompts
            .render_with_custom(&self.prompts.answer.template, &vars)
    }

    /// Generate an answer. The model output is returned unmodified, and the
    /// model is called even when no chunks were retrieved.
    #[instrument(skip(self, question, chunks), fields(model = %self.llm.model_name(), chunks = chunks.len()))]
    pub async fn generate(&self, question: &str, chunks: &[RetrievedChunk]) -> Result<String> {
        let prompt = self.build_prompt(question, chunks);
        let answer = self.llm.generate(&prompt, ANSWER_TEMPERATURE).await?;
        info!("Generated answer ({} chars)", answer.len());
        Ok(answer)
    }
}
