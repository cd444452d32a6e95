//! OpenAI API Client
//!
//! Text completions over OpenAI's Chat Completions API.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

use super::{AnalysisClient, CompletionRequest};
use crate::config::LlmConfig;
use crate::types::{ErrorClassifier, Result, ReviewError};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const PROVIDER_NAME: &str = "openai";

/// OpenAI API client with secure API key handling
pub struct OpenAiClient {
    /// API key stored securely - never exposed in logs or debug output
    api_key: SecretString,
    api_base: String,
    model: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key_str = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                ReviewError::Config(
                    "OpenAI API key not found. Set OPENAI_API_KEY env var or provide llm.api_key"
                        .to_string(),
                )
            })?;

        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ReviewError::LlmApi(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: SecretString::from(api_key_str),
            api_base: api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            client,
        })
    }

    fn build_request(&self, request: &CompletionRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system_prompt.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.user_prompt.clone(),
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

#[async_trait]
impl AnalysisClient for OpenAiClient {
    async fn analyze(&self, request: &CompletionRequest) -> Result<String> {
        let start_time = Instant::now();
        let body = self.build_request(request);
        let url = format!("{}/chat/completions", self.api_base);

        debug!(
            model = %self.model,
            max_tokens = request.max_tokens,
            "Sending request to OpenAI API"
        );

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            let text = response.text().await.unwrap_or_default();
            return Err(ErrorClassifier::classify_http_status(
                status.as_u16(),
                &format!("OpenAI API error ({}): {}", status, text),
                PROVIDER_NAME,
            )
            .with_retry_after(retry_after)
            .into());
        }

        let response_body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ReviewError::LlmApi(format!("Failed to parse OpenAI response: {}", e)))?;

        let content = response_body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ReviewError::LlmApi("No content in OpenAI response".to_string()))?;

        debug!(
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Received response from OpenAI"
        );

        Ok(content.trim().to_string())
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::StatusCode, routing::post};
    use serde_json::{Value, json};

    async fn spawn_api(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client_for(api_base: String) -> OpenAiClient {
        OpenAiClient::new(&LlmConfig {
            api_key: Some("sk-test".to_string()),
            api_base: Some(api_base),
            model: "gpt-test".to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_build_request_shape() {
        let client = client_for("http://localhost".to_string());
        let body = client.build_request(&CompletionRequest::new("sys", "user", 400, 0.6));
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["model"], "gpt-test");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][0]["content"], "sys");
        assert_eq!(value["messages"][1]["role"], "user");
        assert_eq!(value["max_tokens"], 400);
    }

    #[test]
    fn test_debug_redacts_key() {
        let client = client_for("http://localhost".to_string());
        assert!(!format!("{:?}", client).contains("sk-test"));
    }

    #[tokio::test]
    async fn test_analyze_returns_trimmed_content() {
        let router = Router::new().route(
            "/chat/completions",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["messages"][1]["content"], "review me");
                Json(json!({
                    "choices": [{"message": {"role": "assistant", "content": "  Looks fine.  "}}]
                }))
            }),
        );
        let client = client_for(spawn_api(router).await);

        let text = client
            .analyze(&CompletionRequest::new("sys", "review me", 100, 0.0))
            .await
            .unwrap();
        assert_eq!(text, "Looks fine.");
    }

    #[tokio::test]
    async fn test_analyze_classifies_rate_limit() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async {
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    [("retry-after", "20")],
                    "slow down",
                )
            }),
        );
        let client = client_for(spawn_api(router).await);

        let err = client
            .analyze(&CompletionRequest::new("sys", "user", 100, 0.0))
            .await
            .unwrap_err();
        match err {
            ReviewError::Llm(llm) => {
                assert_eq!(llm.category, crate::types::ErrorCategory::RateLimit);
                assert_eq!(llm.retry_after, Some(Duration::from_secs(20)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
