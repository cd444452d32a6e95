//! Error Types
//!
//! [`ReviewError`] is the crate-wide error. Completion failures additionally get
//! an [`ErrorCategory`] so the retrying client can tell a rate limit from a
//! revoked key. Failures raised by the analysis client never escape the review
//! core: they are turned into text by [`crate::review::call_and_stringify_errors`].

use std::time::Duration;
use thiserror::Error;

/// How the retrying client treats a failed completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// HTTP 429 or a quota message; waits for the suggested delay
    RateLimit,
    /// Missing, revoked or wrong credentials
    Auth,
    /// The provider rejected the request itself, e.g. the context is too long
    BadRequest,
    /// Connect failures and per-attempt timeouts
    Network,
    /// 5xx and overload responses
    Transient,
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::RateLimit => "RATE_LIMIT",
            Self::Auth => "AUTH",
            Self::BadRequest => "BAD_REQUEST",
            Self::Network => "NETWORK",
            Self::Transient => "TRANSIENT",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(label)
    }
}

impl ErrorCategory {
    /// Sending the same request again cannot fix auth or request errors
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Auth | Self::BadRequest)
    }
}

/// A categorized completion failure
#[derive(Debug, Clone)]
pub struct LlmError {
    pub category: ErrorCategory,
    pub message: String,
    pub provider: String,
    /// Delay the provider asked for, from a `Retry-After` header
    pub retry_after: Option<Duration>,
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}:{}] {}", self.provider, self.category, self.message)
    }
}

impl std::error::Error for LlmError {}

impl LlmError {
    pub fn new(
        category: ErrorCategory,
        message: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            category,
            message: message.into(),
            provider: provider.into(),
            retry_after: None,
        }
    }

    pub fn with_retry_after(mut self, delay: Option<Duration>) -> Self {
        self.retry_after = delay;
        self
    }
}

/// Message fragments seen in OpenAI and GitHub error bodies, checked in order
const MESSAGE_RULES: &[(ErrorCategory, &[&str])] = &[
    (
        ErrorCategory::RateLimit,
        &["rate limit", "rate_limit", "too many requests"],
    ),
    (
        ErrorCategory::Auth,
        &[
            "invalid_api_key",
            "incorrect api key",
            "unauthorized",
            "bad credentials",
        ],
    ),
    (
        ErrorCategory::BadRequest,
        &[
            "context_length_exceeded",
            "maximum context length",
            "invalid_request_error",
            "model_not_found",
        ],
    ),
    (
        ErrorCategory::Network,
        &[
            "error sending request",
            "connection",
            "dns error",
            "timed out",
        ],
    ),
    (
        ErrorCategory::Transient,
        &[
            "server_error",
            "server had an error",
            "overloaded",
            "service unavailable",
            "bad gateway",
        ],
    ),
];

/// Maps provider failures to an [`ErrorCategory`]
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify by message text, for errors that carry no status code
    pub fn classify(message: &str, provider: &str) -> LlmError {
        let lower = message.to_lowercase();
        let category = MESSAGE_RULES
            .iter()
            .find(|(_, needles)| needles.iter().any(|n| lower.contains(n)))
            .map_or(ErrorCategory::Unknown, |(category, _)| *category);

        LlmError::new(category, message, provider)
    }

    pub fn classify_http_status(status: u16, message: &str, provider: &str) -> LlmError {
        let category = match status {
            429 => ErrorCategory::RateLimit,
            401 | 403 => ErrorCategory::Auth,
            400 | 404 | 422 => ErrorCategory::BadRequest,
            408 | 500..=599 => ErrorCategory::Transient,
            _ => ErrorCategory::Unknown,
        };
        LlmError::new(category, message, provider)
    }

    /// Classify any error returned by an [`crate::ai::AnalysisClient`]
    pub fn classify_review_error(err: &ReviewError, provider: &str) -> LlmError {
        match err {
            ReviewError::Llm(llm_err) => llm_err.clone(),
            ReviewError::LlmApi(msg) => Self::classify(msg, provider),
            ReviewError::Http(e) if e.is_timeout() || e.is_connect() => {
                LlmError::new(ErrorCategory::Network, err.to_string(), provider)
            }
            ReviewError::Http(e) => match e.status() {
                Some(status) => {
                    Self::classify_http_status(status.as_u16(), &err.to_string(), provider)
                }
                None => Self::classify(&err.to_string(), provider),
            },
            ReviewError::Timeout { .. } => {
                LlmError::new(ErrorCategory::Network, err.to_string(), provider)
            }
            _ => LlmError::new(ErrorCategory::Unknown, err.to_string(), provider),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Provider failure known only by its message
    #[error("LLM API error: {0}")]
    LlmApi(String),

    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid repository URL: {0}")]
    InvalidRepoUrl(String),

    #[error("Repository retrieval failed for {url}: HTTP {status}")]
    Retrieval { url: String, status: u16 },

    /// Broken internal invariant; the only failure the review core lets escape
    #[error("Invariant violated: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, ReviewError>;

impl ReviewError {
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Failures that originate at the completion provider (rate limit, auth, network)
    /// as opposed to unexpected local failures.
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self,
            Self::Llm(_) | Self::LlmApi(_) | Self::Http(_) | Self::Timeout { .. }
        )
    }
}
