//! Analysis Client Abstraction
//!
//! Defines the [`AnalysisClient`] trait: one text completion from a system
//! prompt and a user prompt. The review core only ever sees this trait.
//!
//! ## Modules
//!
//! - `openai`: OpenAI Chat Completions client
//! - `retry`: Per-attempt timeout and backoff around any client

mod openai;
mod retry;

pub use openai::OpenAiClient;
pub use retry::{RetryPolicy, RetryingClient};

// Re-export error types from centralized location
pub use crate::types::{ErrorCategory, ErrorClassifier, LlmError};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::types::{Result, ReviewError};

/// One completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            max_tokens,
            temperature,
        }
    }
}

/// Shared client type for concurrent access across pipeline stages.
pub type SharedClient = Arc<dyn AnalysisClient>;

/// Text completion capability
///
/// Implementations may fail with provider errors (rate limit, auth, network)
/// or unexpected ones; callers in the review core convert either into text.
#[async_trait]
pub trait AnalysisClient: Send + Sync {
    /// Complete the request and return the generated text
    async fn analyze(&self, request: &CompletionRequest) -> Result<String>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model name currently in use
    fn model(&self) -> &str;
}

/// Create a shared client from configuration, wrapped with retries
pub fn create_client(config: &LlmConfig) -> Result<SharedClient> {
    let inner: SharedClient = match config.provider.as_str() {
        "openai" => Arc::new(OpenAiClient::new(config)?),
        _ => {
            return Err(ReviewError::Config(format!(
                "Unknown provider: {}. Supported: openai",
                config.provider
            )));
        }
    };

    let policy = RetryPolicy {
        max_attempts: config.max_retries,
        attempt_timeout: Duration::from_secs(config.timeout_secs),
        ..Default::default()
    };

    Ok(Arc::new(RetryingClient::new(inner, policy)))
}
