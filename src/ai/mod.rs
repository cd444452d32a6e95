//! AI Integration Layer
//!
//! Completion clients used by the review pipeline.

pub mod provider;
pub mod timeout;

pub use provider::{
    AnalysisClient, CompletionRequest, ErrorCategory, ErrorClassifier, LlmError, OpenAiClient,
    RetryPolicy, RetryingClient, SharedClient, create_client,
};
pub use timeout::with_timeout;
