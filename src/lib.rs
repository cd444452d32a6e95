//! codeverdict - LLM Code Review for Repositories
//!
//! Fetches a repository's text files, asks a language model to review each
//! one, and folds the per-file analyses into a single verdict with a
//! tournament reduction that keeps every call under a fixed input budget.
//!
//! ## Quick Start
//!
//! ```ignore
//! use codeverdict::{ConfigLoader, DeveloperLevel, ReviewPipeline, create_client};
//! use codeverdict::github::{GithubFetcher, repo_url_to_api_url};
//!
//! let config = ConfigLoader::load()?;
//! let pipeline = ReviewPipeline::new(create_client(&config.llm)?, &config);
//! let fetcher = GithubFetcher::new(&config.github)?;
//! let api_url = repo_url_to_api_url("https://github.com/owner/repo", &config.github).unwrap();
//! let outcome = pipeline
//!     .review_repository(&fetcher, &api_url, DeveloperLevel::Middle, "A REST API")
//!     .await?;
//! println!("{}", outcome.review);
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: Completion client abstraction, OpenAI client, retries
//! - [`review`]: File analysis, batch reduction, pipeline orchestration
//! - [`github`]: Repository URL normalization and file retrieval
//! - [`server`]: HTTP API
//! - [`config`]: Layered configuration

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod github;
pub mod review;
pub mod server;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::error::{ErrorCategory, Result, ReviewError};

// Domain Types
pub use types::{AnalysisUnit, DeveloperLevel, FileSet};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use review::{
    BatchReducer, FileAnalyzer, PipelineStage, ReviewOutcome, ReviewPipeline, ReviewVerdict,
    call_and_stringify_errors,
};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{AnalysisClient, CompletionRequest, SharedClient, create_client};
