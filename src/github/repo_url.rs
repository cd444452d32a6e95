//! Repository URL normalization

use crate::config::GithubConfig;

/// Map a repository web URL to its contents API URL
///
/// The input is trimmed and lowercased, must start with the configured web
/// root and must name both an owner and a repository. Anything after the
/// repository segment (`/tree/main/...`) is ignored.
///
/// ```ignore
/// let api = repo_url_to_api_url("https://github.com/Owner/Repo", &GithubConfig::default());
/// assert_eq!(api.as_deref(), Some("https://api.github.com/repos/owner/repo/contents"));
/// ```
pub fn repo_url_to_api_url(input: &str, config: &GithubConfig) -> Option<String> {
    let normalized = input.trim().to_lowercase();
    let web_root = config.web_root.to_lowercase();
    let web_root = web_root.trim_end_matches('/');

    let rest = normalized.strip_prefix(web_root)?.strip_prefix('/')?;
    let mut segments = rest.split('/');

    let owner = segments.next().filter(|s| !s.is_empty())?;
    let repo = segments
        .next()
        .map(|s| s.strip_suffix(".git").unwrap_or(s))
        .filter(|s| !s.is_empty())?;

    Some(format!(
        "{}/repos/{}/{}/contents",
        config.api_url.trim_end_matches('/'),
        owner,
        repo
    ))
}

/// [`repo_url_to_api_url`] against the public GitHub endpoints
pub fn repo_url_to_git_api_url(input: &str) -> Option<String> {
    repo_url_to_api_url(input, &GithubConfig::default())
}
