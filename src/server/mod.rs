//! HTTP Server
//!
//! - `GET /api/healthchecker`: liveness
//! - `POST /review`: review a repository by URL
//!
//! Every review request gets a request id, recorded on its tracing span and
//! echoed in the `x-request-id` header.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::config::GithubConfig;
use crate::github::{RepoFetcher, repo_url_to_api_url};
use crate::review::{ReviewPipeline, ReviewVerdict};
use crate::types::{DeveloperLevel, Result, ReviewError};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Shared, read-only state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ReviewPipeline>,
    pub fetcher: Arc<dyn RepoFetcher>,
    pub github: Arc<GithubConfig>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub description: String,
    /// Required; there is no sensible repository to review by default
    pub git_url: String,
    #[serde(default)]
    pub dev_level: DeveloperLevel,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewResponse {
    pub request_id: String,
    pub review: String,
    pub verdict: ReviewVerdict,
    pub files_total: usize,
    pub files_analyzed: usize,
    pub failed_calls: usize,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/healthchecker", get(health_handler))
        .route("/review", post(review_handler))
        .with_state(state)
}

/// Bind and serve until Ctrl-C
pub async fn serve(bind: &str, state: AppState) -> Result<()> {
    let addr: SocketAddr = bind
        .parse()
        .map_err(|e| ReviewError::Config(format!("Invalid bind address {}: {}", bind, e)))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({"message": "OK"}))
}

async fn review_handler(
    State(state): State<AppState>,
    Json(request): Json<ReviewRequest>,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let span = info_span!(
        "review_request",
        request_id = %request_id,
        level = %request.dev_level
    );

    let response = handle_review(&state, &request, &request_id)
        .instrument(span)
        .await;

    with_request_id(response, &request_id)
}

async fn handle_review(state: &AppState, request: &ReviewRequest, request_id: &str) -> Response {
    let Some(api_url) = repo_url_to_api_url(&request.git_url, &state.github) else {
        warn!("Rejected repository URL: {}", request.git_url);
        return error_response(
            StatusCode::BAD_REQUEST,
            ReviewError::InvalidRepoUrl(request.git_url.clone()).to_string(),
            request_id,
        );
    };

    info!("Reviewing {}", api_url);

    let outcome = state
        .pipeline
        .review_repository(
            state.fetcher.as_ref(),
            &api_url,
            request.dev_level,
            &request.description,
        )
        .await;

    match outcome {
        Ok(outcome) => {
            info!(
                files = outcome.files_total,
                analyzed = outcome.files_analyzed,
                failed_calls = outcome.failed_calls,
                "Review complete"
            );
            let verdict = outcome.verdict();
            let body = ReviewResponse {
                request_id: request_id.to_string(),
                review: outcome.review.into_inner(),
                verdict,
                files_total: outcome.files_total,
                files_analyzed: outcome.files_analyzed,
                failed_calls: outcome.failed_calls,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e @ (ReviewError::Retrieval { .. } | ReviewError::Http(_))) => {
            warn!("Repository retrieval failed: {}", e);
            error_response(StatusCode::BAD_GATEWAY, e.to_string(), request_id)
        }
        Err(e) => {
            error!("Review failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), request_id)
        }
    }
}

fn error_response(status: StatusCode, message: String, request_id: &str) -> Response {
    (
        status,
        Json(json!({"error": message, "request_id": request_id})),
    )
        .into_response()
}

fn with_request_id(mut response: Response, request_id: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::{AnalysisClient, CompletionRequest};
    use crate::config::Config;
    use crate::constants::review::NOTHING_TO_ANALYZE;
    use crate::types::FileSet;
    use async_trait::async_trait;
    use serde_json::Value;

    struct CannedClient;

    #[async_trait]
    impl AnalysisClient for CannedClient {
        async fn analyze(&self, request: &CompletionRequest) -> Result<String> {
            if request.user_prompt.starts_with("Make summary review") {
                return Ok("Solutions: tidy.\nSkills: capable.\nRating: 4".to_string());
            }
            Ok("fine".to_string())
        }

        fn name(&self) -> &str {
            "canned"
        }

        fn model(&self) -> &str {
            "canned-model"
        }
    }

    /// Serves `owner/repo` from memory, `owner/empty` as an empty repository,
    /// anything else as missing
    struct MemoryFetcher;

    #[async_trait]
    impl RepoFetcher for MemoryFetcher {
        async fn fetch(&self, api_url: &str) -> Result<FileSet> {
            if api_url.ends_with("/repos/owner/repo/contents") {
                return Ok([
                    ("main.py", Some("print('hi')".to_string())),
                    ("logo.png", None),
                ]
                .into_iter()
                .collect());
            }
            if api_url.ends_with("/repos/owner/empty/contents") {
                return Ok(FileSet::new());
            }
            Err(ReviewError::Retrieval {
                url: api_url.to_string(),
                status: 404,
            })
        }
    }

    async fn spawn_server() -> String {
        let config = Config::default();
        let state = AppState {
            pipeline: Arc::new(ReviewPipeline::new(Arc::new(CannedClient), &config)),
            fetcher: Arc::new(MemoryFetcher),
            github: Arc::new(config.github.clone()),
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, build_router(state)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn post_review(base: &str, body: Value) -> reqwest::Response {
        reqwest::Client::new()
            .post(format!("{base}/review"))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_healthchecker() {
        let base = spawn_server().await;
        let body: Value = reqwest::get(format!("{base}/api/healthchecker"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body, json!({"message": "OK"}));
    }

    #[tokio::test]
    async fn test_review_success() {
        let base = spawn_server().await;
        let response = post_review(
            &base,
            json!({"description": "demo", "git_url": "https://github.com/Owner/Repo", "dev_level": "middle"}),
        )
        .await;

        assert_eq!(response.status(), 200);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        let body: ReviewResponse = response.json().await.unwrap();
        assert_eq!(body.verdict.rating, 4);
        assert_eq!(body.verdict.skills, "capable.");
        assert_eq!(body.files_total, 2);
        assert_eq!(body.files_analyzed, 1);
        assert_eq!(body.failed_calls, 0);
    }

    #[tokio::test]
    async fn test_dev_level_defaults_to_junior() {
        let base = spawn_server().await;
        let response = post_review(
            &base,
            json!({"description": "demo", "git_url": "https://github.com/owner/repo"}),
        )
        .await;
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_invalid_url_is_bad_request() {
        let base = spawn_server().await;
        let response = post_review(
            &base,
            json!({"description": "demo", "git_url": "https://gitlab.com/owner/repo"}),
        )
        .await;

        assert_eq!(response.status(), 400);
        let body: Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("gitlab.com"));
    }

    #[tokio::test]
    async fn test_missing_repository_is_bad_gateway() {
        let base = spawn_server().await;
        let response = post_review(
            &base,
            json!({"description": "demo", "git_url": "https://github.com/owner/missing"}),
        )
        .await;
        assert_eq!(response.status(), 502);
    }

    #[tokio::test]
    async fn test_empty_repository_is_nothing_to_analyze() {
        let base = spawn_server().await;
        let response = post_review(
            &base,
            json!({"description": "demo", "git_url": "https://github.com/owner/empty"}),
        )
        .await;

        assert_eq!(response.status(), 200);
        let body: ReviewResponse = response.json().await.unwrap();
        assert_eq!(body.review, NOTHING_TO_ANALYZE);
        assert_eq!(body.verdict.rating, 0);
    }

    #[tokio::test]
    async fn test_missing_git_url_is_rejected() {
        let base = spawn_server().await;
        let response = post_review(&base, json!({"description": "demo"})).await;
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_unknown_dev_level_is_rejected() {
        let base = spawn_server().await;
        let response = post_review(
            &base,
            json!({"description": "demo", "git_url": "https://github.com/owner/repo", "dev_level": "guru"}),
        )
        .await;
        assert!(response.status().is_client_error());
    }
}
