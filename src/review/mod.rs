//! Review Pipeline
//!
//! Turns a repository's files into one review.
//!
//! ## Stages
//!
//! 1. **Fetching**: collect the [`FileSet`] through a [`RepoFetcher`]
//! 2. **StructureAnalyzing**: one call over every listed path
//! 3. **FileAnalyzing**: one concurrent call per file with content
//! 4. **Reducing**: file analyses, then the structure analysis, folded by
//!    [`BatchReducer`]
//! 5. **Done**, or **Failed** when the repository listed no files
//!
//! ## Failure Handling
//!
//! Every completion goes through [`call_and_stringify_errors`]; a failed call
//! becomes an `Error: …` analysis that is folded in like any other. The core
//! only returns `Err` for a broken invariant.

mod file_analyzer;
pub mod prompts;
mod reducer;
pub mod verdict;

pub use file_analyzer::FileAnalyzer;
pub use reducer::{BatchReducer, Reduction, ReductionStats};
pub use verdict::{ReviewVerdict, extract_rating};

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::ai::provider::SharedClient;
use crate::config::Config;
use crate::constants::review::{ERROR_PREFIX, NOTHING_TO_ANALYZE};
use crate::github::RepoFetcher;
use crate::types::{AnalysisUnit, DeveloperLevel, FileSet, Result};

// =============================================================================
// Error Normalization
// =============================================================================

/// Await a completion and turn any failure into an `Error: …` analysis
///
/// Provider failures (rate limit, auth, network, timeout) and unexpected ones
/// get distinct prefixes. Either way the failure is logged with `operation`.
pub async fn call_and_stringify_errors<F>(operation: &str, call: F) -> AnalysisUnit
where
    F: Future<Output = Result<String>>,
{
    match call.await {
        Ok(text) => {
            debug!(operation, "Completion succeeded");
            AnalysisUnit::new(text)
        }
        Err(e) if e.is_provider_error() => {
            error!(operation, "LLM provider error: {}", e);
            AnalysisUnit::failed(format!(
                "{} LLM provider failed with error: {}",
                ERROR_PREFIX, e
            ))
        }
        Err(e) => {
            error!(operation, "Unexpected error: {}", e);
            AnalysisUnit::failed(format!(
                "{} Unexpected failure in {}: {}",
                ERROR_PREFIX, operation, e
            ))
        }
    }
}

// =============================================================================
// Pipeline State
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Fetching,
    StructureAnalyzing,
    FileAnalyzing,
    Reducing,
    Done,
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fetching => "fetching",
            Self::StructureAnalyzing => "structure_analyzing",
            Self::FileAnalyzing => "file_analyzing",
            Self::Reducing => "reducing",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Final review plus bookkeeping
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub review: AnalysisUnit,
    /// `Done`, or `Failed` when there was nothing to analyze
    pub stage: PipelineStage,
    pub files_total: usize,
    pub files_analyzed: usize,
    /// Analyses that stand in for failed calls, before reduction
    pub failed_calls: usize,
    pub reduction: ReductionStats,
}

impl ReviewOutcome {
    pub fn verdict(&self) -> ReviewVerdict {
        ReviewVerdict::parse(self.review.as_str())
    }
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Orchestrator for one review
///
/// Holds no per-review state, so one instance can serve concurrent requests.
pub struct ReviewPipeline {
    analyzer: FileAnalyzer,
    reducer: BatchReducer,
}

impl ReviewPipeline {
    pub fn new(client: SharedClient, config: &Config) -> Self {
        let templates = Arc::new(config.prompts.clone());
        Self {
            analyzer: FileAnalyzer::new(client.clone(), templates.clone(), &config.review),
            reducer: BatchReducer::new(client, templates, &config.review),
        }
    }

    /// Fetch a repository and review it
    ///
    /// Retrieval errors are returned as-is; everything after fetching follows
    /// [`ReviewPipeline::run`].
    #[instrument(skip(self, fetcher, level, description), fields(level = %level))]
    pub async fn review_repository(
        &self,
        fetcher: &dyn RepoFetcher,
        api_url: &str,
        level: DeveloperLevel,
        description: &str,
    ) -> Result<ReviewOutcome> {
        enter(PipelineStage::Fetching);
        let files = fetcher.fetch(api_url).await?;
        self.run(&files, level, description).await
    }

    /// Review an already fetched file set
    #[instrument(skip(self, files, description), fields(file_count = files.len()))]
    pub async fn run(
        &self,
        files: &FileSet,
        level: DeveloperLevel,
        description: &str,
    ) -> Result<ReviewOutcome> {
        if files.is_empty() {
            warn!("Pipeline: repository contains no files");
            enter(PipelineStage::Failed);
            return Ok(ReviewOutcome {
                review: AnalysisUnit::from(NOTHING_TO_ANALYZE),
                stage: PipelineStage::Failed,
                files_total: 0,
                files_analyzed: 0,
                failed_calls: 0,
                reduction: ReductionStats::default(),
            });
        }

        enter(PipelineStage::StructureAnalyzing);
        let structure = self
            .analyzer
            .analyze_structure(files.paths(), description)
            .await;

        enter(PipelineStage::FileAnalyzing);
        let files_analyzed = files.analyzable_count();
        info!(
            "Pipeline: analyzing {} of {} files",
            files_analyzed,
            files.len()
        );

        let mut units = join_all(
            files
                .analyzable()
                .map(|(path, content)| self.analyzer.analyze_file(path, content, level, description)),
        )
        .await;
        units.push(structure);

        let failed_calls = units.iter().filter(|u| u.is_error()).count();
        if failed_calls > 0 {
            warn!("Pipeline: {} of {} analyses failed", failed_calls, units.len());
        }

        enter(PipelineStage::Reducing);
        let reduction = self.reducer.reduce(units, level, description).await?;

        enter(PipelineStage::Done);
        Ok(ReviewOutcome {
            review: reduction.unit,
            stage: PipelineStage::Done,
            files_total: files.len(),
            files_analyzed,
            failed_calls,
            reduction: reduction.stats,
        })
    }
}

fn enter(stage: PipelineStage) {
    info!("Pipeline: {}", stage);
}
