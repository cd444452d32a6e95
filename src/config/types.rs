//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! The resolved [`Config`] is built once at startup and handed to the pipeline,
//! the fetcher and the server by value or reference; nothing reads it globally.

use serde::{Deserialize, Serialize};

use crate::constants::{github, network, retry, review};
use crate::types::{Result, ReviewError};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider settings
    pub llm: LlmConfig,

    /// Reduction and sampling settings
    pub review: ReviewSettings,

    /// Prompt templates passed verbatim to the provider
    pub prompts: PromptTemplates,

    /// Repository retrieval settings
    pub github: GithubConfig,

    /// HTTP server settings
    pub server: ServerConfig,
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `ReviewError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        self.review.validate()?;
        self.prompts.validate()?;

        if self.llm.timeout_secs == 0 {
            return Err(ReviewError::Config(
                "LLM timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.llm.max_retries == 0 {
            return Err(ReviewError::Config(
                "LLM max_retries must be at least 1".to_string(),
            ));
        }

        if self.github.max_concurrent_downloads == 0 {
            return Err(ReviewError::Config(
                "GitHub max_concurrent_downloads must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name
    pub provider: String,

    /// Model name
    pub model: String,

    /// API base URL (for custom endpoints)
    pub api_base: Option<String>,

    /// API key; falls back to the provider's environment variable.
    /// Never serialized to output.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Request timeout in seconds, applied per attempt
    pub timeout_secs: u64,

    /// Attempts per completion before the failure is reported
    pub max_retries: u8,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            api_base: None,
            api_key: None,
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            max_retries: retry::DEFAULT_MAX_RETRIES,
        }
    }
}

// =============================================================================
// Review Settings
// =============================================================================

/// Knobs consumed by the review core
///
/// - `batch_size`: analyses folded by one reduce call, in `[2, 100]`
/// - `max_tokens`: completion budget for structure, file and reduce calls
/// - `max_token_summary`: completion budget for the terminal summary
/// - `total_token_budget`: tokens one reduce round may spend;
///   `max_tokens * batch_size` must fit in it
/// - `temperature`: sampling temperature in `[0, 1]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewSettings {
    pub batch_size: usize,
    pub max_tokens: u32,
    pub max_token_summary: u32,
    pub total_token_budget: u32,
    pub temperature: f32,
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            batch_size: review::DEFAULT_BATCH_SIZE,
            max_tokens: review::DEFAULT_MAX_TOKENS,
            max_token_summary: review::DEFAULT_MAX_TOKEN_SUMMARY,
            total_token_budget: review::DEFAULT_TOTAL_TOKEN_BUDGET,
            temperature: review::DEFAULT_TEMPERATURE,
        }
    }
}

impl ReviewSettings {
    pub fn validate(&self) -> Result<()> {
        if !(review::MIN_BATCH_SIZE..=review::MAX_BATCH_SIZE).contains(&self.batch_size) {
            return Err(ReviewError::Config(format!(
                "review batch_size must be between {} and {}, got {}",
                review::MIN_BATCH_SIZE,
                review::MAX_BATCH_SIZE,
                self.batch_size
            )));
        }

        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(ReviewError::Config(format!(
                "review temperature must be between 0.0 and 1.0, got {}",
                self.temperature
            )));
        }

        if self.max_tokens == 0 || self.max_token_summary == 0 {
            return Err(ReviewError::Config(
                "review max_tokens and max_token_summary must be greater than 0".to_string(),
            ));
        }

        let per_call_budget = self.total_token_budget / self.batch_size as u32;
        if self.max_tokens > per_call_budget {
            return Err(ReviewError::Config(format!(
                "review max_tokens ({}) exceeds total_token_budget / batch_size ({} / {} = {})",
                self.max_tokens, self.total_token_budget, self.batch_size, per_call_budget
            )));
        }

        Ok(())
    }
}

// =============================================================================
// Prompt Templates
// =============================================================================

/// The five prompt templates
///
/// `system` is followed directly by the caller's description. `reduce` and
/// `summary` carry `{analyses}` and `{level}` placeholders. Rendering lives in
/// [`crate::review::prompts`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptTemplates {
    pub system: String,
    pub structure: String,
    pub file_analyze: String,
    pub reduce: String,
    pub summary: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            system: "You are an experienced software reviewer. Evaluate the code according:"
                .to_string(),
            structure: "Identifying weaknesses, issues and good solutions in 3 sentences. \
                        Make conclusion in 1 sentences."
                .to_string(),
            file_analyze: "Identifying weaknesses, issues and good solutions in 2-3 sentences. \
                           Write a brief comment on the developer's skills in 1 sentence for \
                           developer level: "
                .to_string(),
            reduce: "Make summary review according preview analyze:{analyses}\n\
                     Solutions: Summarize identifying weaknesses and good solutions in 2-3 sentences.\n\
                     Skills: Summarize brief comment on the developer's skills in 1-2 sentence.\n\
                     Rating: Summarize rating (from 1 to 5) for developer level: {level}"
                .to_string(),
            summary: "Make summary review according preview analyze:{analyses}\n\
                      Solutions: identifying weaknesses and good solutions in 2-3 sentences.\n\
                      Skills: write a brief comment on the developer's skills in 1-2 sentence.\n\
                      Rating: (from 1 to 5) for developer level: {level}"
                .to_string(),
        }
    }
}

impl PromptTemplates {
    /// Fold templates must place the analyses somewhere, otherwise every
    /// analysis of a round would be dropped from the prompt
    pub fn validate(&self) -> Result<()> {
        for (name, template) in [("reduce", &self.reduce), ("summary", &self.summary)] {
            if !template.contains(review::ANALYSES_PLACEHOLDER) {
                return Err(ReviewError::Config(format!(
                    "prompts.{} must contain the {} placeholder",
                    name,
                    review::ANALYSES_PLACEHOLDER
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// GitHub Configuration
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// Web root accepted in repository URLs
    pub web_root: String,

    /// REST API root
    pub api_url: String,

    /// Optional token for higher rate limits. Never serialized to output.
    #[serde(skip_serializing)]
    pub token: Option<String>,

    /// Extensions (with leading dot) whose content is downloaded
    pub valid_extensions: Vec<String>,

    /// Concurrent raw-file downloads per directory listing
    pub max_concurrent_downloads: usize,
}

impl std::fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubConfig")
            .field("web_root", &self.web_root)
            .field("api_url", &self.api_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("valid_extensions", &self.valid_extensions)
            .field("max_concurrent_downloads", &self.max_concurrent_downloads)
            .finish()
    }
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            web_root: github::WEB_ROOT.to_string(),
            api_url: github::API_URL.to_string(),
            token: None,
            valid_extensions: github::VALID_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            max_concurrent_downloads: github::MAX_CONCURRENT_DOWNLOADS,
        }
    }
}

// =============================================================================
// Server Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: network::DEFAULT_BIND.to_string(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.review.batch_size, 7);
        assert_eq!(config.review.max_tokens, 400);
        assert_eq!(config.review.max_token_summary, 500);
        assert!((config.review.temperature - 0.6).abs() < f32::EPSILON);
        assert_eq!(config.llm.provider, "openai");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_batch_size_bounds() {
        let mut settings = ReviewSettings {
            batch_size: 1,
            ..Default::default()
        };
        assert!(settings.validate().is_err());

        settings.batch_size = 2;
        assert!(settings.validate().is_ok());

        settings.batch_size = 101;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_temperature_bounds() {
        let settings = ReviewSettings {
            temperature: 1.5,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_max_tokens_must_fit_round_budget() {
        // 4096 / 10 = 409 per call
        let ok = ReviewSettings {
            batch_size: 10,
            max_tokens: 409,
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let too_big = ReviewSettings {
            batch_size: 10,
            max_tokens: 410,
            ..Default::default()
        };
        assert!(too_big.validate().is_err());
    }

    #[test]
    fn test_secrets_redacted_and_not_serialized() {
        let config = Config {
            llm: LlmConfig {
                api_key: Some("sk-secret".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(!format!("{:?}", config).contains("sk-secret"));
        let rendered = toml::to_string(&config).unwrap();
        assert!(!rendered.contains("sk-secret"));
    }

    #[test]
    fn test_fold_template_without_analyses_is_rejected() {
        let mut config = Config::default();
        config.prompts.summary = "Summarize the review for {level}".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("prompts.summary"));

        let mut config = Config::default();
        config.prompts.reduce = "Shorten these".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_review_templates_have_placeholders() {
        let prompts = PromptTemplates::default();
        for template in [&prompts.reduce, &prompts.summary] {
            assert!(template.contains("{analyses}"));
            assert!(template.contains("{level}"));
        }
    }
}
