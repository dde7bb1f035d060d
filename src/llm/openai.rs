//! OpenAI chat completions backend.

use super::LanguageModel;
use crate::error::{Result, TubeQaError};
use crate::openai::{create_client_with, ClientOptions};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Chat model reached through an OpenAI-compatible API.
pub struct OpenAIChatModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl OpenAIChatModel {
    pub fn new(model: &str) -> Result<Self> {
        Self::with_options(model, &ClientOptions::default())
    }

    pub fn with_options(model: &str, options: &ClientOptions) -> Result<Self> {
        Ok(Self {
            client: create_client_with(options)?,
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAIChatModel {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt.to_string())
                .build()
                .map_err(|e| TubeQaError::Generation(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(temperature)
            .build()
            .map_err(|e| TubeQaError::Generation(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            TubeQaError::OpenAI(format!("Failed to generate response: {}", e))
        })?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| TubeQaError::Generation("Empty response from LLM".to_string()))?
            .clone();

        debug!("Generated {} characters", answer.len());
        Ok(answer)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_creation() {
        let model = OpenAIChatModel::new("gpt-4o-mini").unwrap();
        assert_eq!(model.model_name(), "gpt-4o-mini");
    }
}
