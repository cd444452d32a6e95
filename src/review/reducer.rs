//! Batch Reducer
//!
//! Tournament reduction of analyses into a single verdict.
//!
//! ## Algorithm
//!
//! 1. Nothing to fold: return the sentinel, no call
//! 2. At most `batch_size` analyses: one summary call, done
//! 3. Otherwise slice into contiguous batches of `batch_size`, reduce every
//!    batch concurrently, and repeat with one analysis per batch
//!
//! Each round maps `L` analyses to `ceil(L / batch_size)`, so a repository of
//! `N` files needs `ceil(log_B N)` call layers. Results of a round are
//! collected by batch index, never by completion order.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, instrument};

use crate::ai::provider::{CompletionRequest, SharedClient};
use crate::config::{PromptTemplates, ReviewSettings};
use crate::constants::review::{MAX_BATCH_SIZE, MIN_BATCH_SIZE, NOTHING_TO_SUMMARIZE};
use crate::types::{AnalysisUnit, DeveloperLevel, Result, ReviewError};

use super::call_and_stringify_errors;
use super::prompts::{render_fold, render_system};

/// Work done by one reduction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReductionStats {
    /// Intermediate reduce rounds, excluding the terminal summary
    pub rounds: usize,
    /// Completion calls issued, including the terminal summary
    pub calls: usize,
}

/// Result of folding a sequence of analyses
#[derive(Debug, Clone)]
pub struct Reduction {
    pub unit: AnalysisUnit,
    pub stats: ReductionStats,
}

pub struct BatchReducer {
    client: SharedClient,
    templates: Arc<PromptTemplates>,
    batch_size: usize,
    max_tokens: u32,
    max_token_summary: u32,
    temperature: f32,
}

impl BatchReducer {
    pub fn new(
        client: SharedClient,
        templates: Arc<PromptTemplates>,
        settings: &ReviewSettings,
    ) -> Self {
        Self {
            client,
            templates,
            batch_size: settings.batch_size,
            max_tokens: settings.max_tokens,
            max_token_summary: settings.max_token_summary,
            temperature: settings.temperature,
        }
    }

    /// Fold `units` into exactly one analysis
    ///
    /// Failed calls are folded in as error text. `Err` means the reducer was
    /// built from unchecked settings: a batch width outside `[2, 100]` would keep
    /// the loop from shrinking, and a fold template without `{analyses}` would
    /// drop every unit it is given.
    #[instrument(skip(self, units, description), fields(units = units.len(), batch_size = self.batch_size))]
    pub async fn reduce(
        &self,
        units: Vec<AnalysisUnit>,
        level: DeveloperLevel,
        description: &str,
    ) -> Result<Reduction> {
        if !(MIN_BATCH_SIZE..=MAX_BATCH_SIZE).contains(&self.batch_size) {
            return Err(ReviewError::Invariant(format!(
                "batch_size must be between {} and {}, got {}",
                MIN_BATCH_SIZE, MAX_BATCH_SIZE, self.batch_size
            )));
        }
        self.templates
            .validate()
            .map_err(|e| ReviewError::Invariant(e.to_string()))?;

        if units.is_empty() {
            debug!("Nothing to reduce");
            return Ok(Reduction {
                unit: AnalysisUnit::from(NOTHING_TO_SUMMARIZE),
                stats: ReductionStats::default(),
            });
        }

        let system_prompt = render_system(&self.templates, description);
        let mut stats = ReductionStats::default();
        let mut generation = units;

        while generation.len() > self.batch_size {
            let batches = generation.len().div_ceil(self.batch_size);
            info!(
                "Reduce: round {} ({} analyses -> {})",
                stats.rounds + 1,
                generation.len(),
                batches
            );

            generation = self.reduce_round(&generation, level, &system_prompt).await;
            stats.rounds += 1;
            stats.calls += batches;
        }

        let request = CompletionRequest::new(
            system_prompt,
            render_fold(&self.templates.summary, &generation, level),
            self.max_token_summary,
            self.temperature,
        );
        let unit = call_and_stringify_errors("summarize", self.client.analyze(&request)).await;
        stats.calls += 1;

        info!(
            "Reduce: complete ({} rounds, {} calls)",
            stats.rounds, stats.calls
        );

        Ok(Reduction { unit, stats })
    }

    /// One round: every batch reduced concurrently, results in batch order
    async fn reduce_round(
        &self,
        generation: &[AnalysisUnit],
        level: DeveloperLevel,
        system_prompt: &str,
    ) -> Vec<AnalysisUnit> {
        let calls = generation.chunks(self.batch_size).map(|batch| {
            let request = CompletionRequest::new(
                system_prompt,
                render_fold(&self.templates.reduce, batch, level),
                self.max_tokens,
                self.temperature,
            );
            async move {
                call_and_stringify_errors("reduce_batch", self.client.analyze(&request)).await
            }
        });

        // join_all yields outputs in input order regardless of completion order
        join_all(calls).await
    }
}
