//! Repository Fetcher
//!
//! Walks the GitHub contents API with an explicit work-list of directory
//! listings. Files with a reviewable extension are downloaded with bounded
//! concurrency; every other listed file is recorded without content.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::GithubConfig;
use crate::constants::{github, network};
use crate::types::{FileSet, Result, ReviewError};

/// Source of repository files
#[async_trait]
pub trait RepoFetcher: Send + Sync {
    /// Collect every file reachable from a contents API URL
    async fn fetch(&self, api_url: &str) -> Result<FileSet>;
}

pub struct GithubFetcher {
    client: reqwest::Client,
    /// Optional token - never exposed in logs or debug output
    token: Option<SecretString>,
    valid_extensions: Vec<String>,
    max_concurrent_downloads: usize,
}

impl std::fmt::Debug for GithubFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubFetcher")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("valid_extensions", &self.valid_extensions)
            .field("max_concurrent_downloads", &self.max_concurrent_downloads)
            .finish()
    }
}

/// One entry of a contents listing
#[derive(Debug, Deserialize)]
struct ContentEntry {
    #[serde(rename = "type")]
    kind: String,
    path: String,
    download_url: Option<String>,
    url: Option<String>,
    #[serde(rename = "_links")]
    links: Option<EntryLinks>,
}

#[derive(Debug, Deserialize)]
struct EntryLinks {
    #[serde(rename = "self")]
    self_link: Option<String>,
}

impl ContentEntry {
    /// Listing URL of a directory entry
    fn listing_url(&self) -> Option<Url> {
        self.links
            .as_ref()
            .and_then(|l| l.self_link.as_deref())
            .or(self.url.as_deref())
            .and_then(|raw| Url::parse(raw).ok())
    }
}

impl GithubFetcher {
    pub fn new(config: &GithubConfig) -> Result<Self> {
        let token = config
            .token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .filter(|t| !t.is_empty())
            .map(SecretString::from);

        let client = reqwest::Client::builder()
            .user_agent(github::USER_AGENT)
            .timeout(Duration::from_secs(network::DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ReviewError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            token,
            valid_extensions: config
                .valid_extensions
                .iter()
                .map(|e| e.to_lowercase())
                .collect(),
            max_concurrent_downloads: config.max_concurrent_downloads.max(1),
        })
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self.client.get(url);
        match &self.token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    /// Extension check on the text after the last dot, like `.py`
    fn is_reviewable(&self, path: &str) -> bool {
        path.rfind('.')
            .map(|idx| path[idx..].to_lowercase())
            .is_some_and(|ext| self.valid_extensions.contains(&ext))
    }

    async fn list(&self, url: &str) -> Result<Vec<ContentEntry>> {
        let response = self
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReviewError::Retrieval {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.json().await?)
    }

    /// Raw file content, `None` on any failure
    async fn download(&self, path: &str, url: &str) -> Option<String> {
        let response = match self.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Download failed for {}: {}", path, e);
                return None;
            }
        };

        if !response.status().is_success() {
            warn!("Download failed for {}: HTTP {}", path, response.status());
            return None;
        }

        match response.text().await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Download failed for {}: {}", path, e);
                None
            }
        }
    }
}

#[async_trait]
impl RepoFetcher for GithubFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, api_url: &str) -> Result<FileSet> {
        let mut files = FileSet::new();
        let mut pending: VecDeque<String> = VecDeque::from([api_url.to_string()]);
        let mut listings = 0usize;

        while let Some(listing_url) = pending.pop_front() {
            let entries = match self.list(&listing_url).await {
                Ok(entries) => entries,
                // The root listing decides whether the repository exists at all
                Err(e) if listings == 0 => return Err(e),
                Err(e) => {
                    warn!("Skipping directory {}: {}", listing_url, e);
                    continue;
                }
            };
            listings += 1;

            let mut downloads = Vec::new();
            for entry in entries {
                match entry.kind.as_str() {
                    "file" => {
                        if self.is_reviewable(&entry.path)
                            && let Some(url) = entry.download_url
                        {
                            downloads.push((entry.path, url));
                        } else {
                            files.insert(entry.path, None);
                        }
                    }
                    "dir" => match entry.listing_url() {
                        Some(url) => pending.push_back(url.to_string()),
                        None => warn!("Directory without listing URL: {}", entry.path),
                    },
                    other => debug!("Skipping {} entry: {}", other, entry.path),
                }
            }

            let fetched: Vec<(String, Option<String>)> = stream::iter(downloads)
                .map(|(path, url)| async move {
                    let content = self.download(&path, &url).await;
                    (path, content)
                })
                .buffer_unordered(self.max_concurrent_downloads)
                .collect()
                .await;
            files.extend(fetched);
        }

        info!(
            "Fetched {} files ({} with content) from {} listings",
            files.len(),
            files.analyzable_count(),
            listings
        );

        Ok(files)
    }
}
