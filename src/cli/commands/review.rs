//! Review Command
//!
//! Usage:
//!   codeverdict review <git_url> [--level junior|middle|strong] [--description TEXT] [--json]

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ai::create_client;
use crate::cli::Output;
use crate::config::ConfigLoader;
use crate::github::{GithubFetcher, repo_url_to_api_url};
use crate::review::{ReviewPipeline, ReviewVerdict};
use crate::types::{DeveloperLevel, Result, ReviewError};

pub struct ReviewOptions {
    pub git_url: String,
    pub level: DeveloperLevel,
    pub description: String,
    pub json: bool,
    /// Overrides `llm.model`
    pub model: Option<String>,
    /// Overrides `review.batch_size`
    pub batch_size: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ReviewReport {
    git_url: String,
    api_url: String,
    level: DeveloperLevel,
    review: String,
    verdict: ReviewVerdict,
    files_total: usize,
    files_analyzed: usize,
    failed_calls: usize,
    reduce_rounds: usize,
    completion_calls: usize,
    elapsed_ms: u64,
    reviewed_at: DateTime<Utc>,
}

pub async fn run(options: ReviewOptions) -> Result<()> {
    let mut config = ConfigLoader::load()?;
    if let Some(model) = options.model {
        config.llm.model = model;
    }
    if let Some(batch_size) = options.batch_size {
        config.review.batch_size = batch_size;
    }
    config.validate()?;

    let api_url = repo_url_to_api_url(&options.git_url, &config.github)
        .ok_or_else(|| ReviewError::InvalidRepoUrl(options.git_url.clone()))?;

    let client = create_client(&config.llm)?;
    let fetcher = GithubFetcher::new(&config.github)?;
    let pipeline = ReviewPipeline::new(client, &config);

    let output = Output::new();
    if !options.json {
        output.info(&format!(
            "Reviewing {} ({}, model {})",
            options.git_url, options.level, config.llm.model
        ));
    }

    let started = Instant::now();
    let outcome = pipeline
        .review_repository(&fetcher, &api_url, options.level, &options.description)
        .await?;
    let elapsed = started.elapsed();

    let report = ReviewReport {
        git_url: options.git_url,
        api_url,
        level: options.level,
        verdict: outcome.verdict(),
        review: outcome.review.into_inner(),
        files_total: outcome.files_total,
        files_analyzed: outcome.files_analyzed,
        failed_calls: outcome.failed_calls,
        reduce_rounds: outcome.reduction.rounds,
        completion_calls: outcome.reduction.calls,
        elapsed_ms: elapsed.as_millis() as u64,
        reviewed_at: Utc::now(),
    };

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    output.header("Code Review");
    output.verdict(&report.verdict);

    output.section("Statistics");
    println!(
        "  Files:            {} listed, {} analyzed",
        report.files_total, report.files_analyzed
    );
    println!(
        "  Completions:      {} ({} reduce rounds)",
        report.completion_calls, report.reduce_rounds
    );
    println!("  Duration:         {:.1}s", elapsed.as_secs_f64());

    if report.failed_calls > 0 {
        output.warning(&format!(
            "{} analyses failed and were folded in as error text",
            report.failed_calls
        ));
    }
    output.success("Review complete");

    Ok(())
}
