//! OpenAI-compatible client configuration.
//!
//! Both the embedder and the language model talk to an OpenAI-style API. The
//! base URL and the environment variable holding the key are configurable so
//! the same client works against compatible hosts (e.g. Groq).

use crate::error::{Result, TubeQaError};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for API requests (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Connection settings for one OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL; `None` uses the async-openai default.
    pub api_base: Option<String>,
    /// Environment variable to read the API key from.
    pub api_key_env: String,
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_base: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Create a client with explicit endpoint, key variable and timeout.
///
/// A missing key is not an error here; requests will fail with the API's own
/// authentication error, and `doctor`/pre-flight report it up front.
pub fn create_client_with(options: &ClientOptions) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(options.timeout)
        .build()
        .map_err(|e| TubeQaError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let mut config = OpenAIConfig::new();
    if let Ok(key) = std::env::var(&options.api_key_env) {
        config = config.with_api_key(key);
    }
    if let Some(base) = &options.api_base {
        config = config.with_api_base(base);
    }

    Ok(Client::with_config(config).with_http_client(http_client))
}
