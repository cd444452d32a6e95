//! Repository Retrieval
//!
//! Turns a repository URL into a [`FileSet`](crate::types::FileSet) for the
//! review pipeline.

mod fetcher;
mod repo_url;

pub use fetcher::{GithubFetcher, RepoFetcher};
pub use repo_url::{repo_url_to_api_url, repo_url_to_git_api_url};
