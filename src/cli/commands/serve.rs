//! Serve Command
//!
//! Usage:
//!   codeverdict serve [--bind ADDR]

use std::sync::Arc;

use crate::ai::create_client;
use crate::config::ConfigLoader;
use crate::github::GithubFetcher;
use crate::review::ReviewPipeline;
use crate::server::{self, AppState};
use crate::types::Result;

pub async fn run(bind: Option<String>) -> Result<()> {
    let config = ConfigLoader::load()?;
    let bind = bind.unwrap_or_else(|| config.server.bind.clone());

    let client = create_client(&config.llm)?;
    tracing::info!(
        "Using {} model {}",
        client.name(),
        client.model()
    );

    let state = AppState {
        pipeline: Arc::new(ReviewPipeline::new(client, &config)),
        fetcher: Arc::new(GithubFetcher::new(&config.github)?),
        github: Arc::new(config.github.clone()),
    };

    server::serve(&bind, state).await
}
