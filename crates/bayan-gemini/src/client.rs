// SPDX-FileCopyrightText: 2026 Bayan Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Gemini `generateContent` API.
//!
//! Provides [`GeminiClient`] which handles request construction, per-call
//! key authentication, and transient server error retry. Rate-limit (429)
//! and auth (401/403) rejections are surfaced immediately without retry:
//! the credential pool, not this client, decides what happens to the key.

use std::time::Duration;

use bayan_core::{BayanError, ProviderFailure};
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, GenerateContentRequest, GenerateContentResponse};

/// Base URL for the Gemini API.
const API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// HTTP client for Gemini API communication.
///
/// The API key is passed per call so one shared connection pool serves all
/// rotating credentials.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    model: String,
    max_retries: u32,
    base_url: String,
}

impl GeminiClient {
    /// Creates a new Gemini API client for the given model.
    pub fn new(model: String) -> Result<Self, BayanError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| BayanError::Provider {
                kind: ProviderFailure::Other,
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            model,
            max_retries: 1,
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Returns the model identifier this client targets.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Sends a generation request under the given API key.
    ///
    /// Transient server errors (500, 503) are retried once after a short
    /// delay. 429 maps to `RateLimited` and 401/403 to `AuthFailed`, both
    /// without retry.
    pub async fn generate(
        &self,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, BayanError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying generation request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&url)
                .header("x-goog-api-key", api_key)
                .json(request)
                .send()
                .await
                .map_err(|e| BayanError::Provider {
                    kind: ProviderFailure::Other,
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "generation response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| BayanError::Provider {
                    kind: ProviderFailure::Other,
                    message: format!("failed to read response body: {e}"),
                    source: Some(Box::new(e)),
                })?;
                let parsed: GenerateContentResponse = serde_json::from_str(&body)
                    .map_err(|e| BayanError::Provider {
                        kind: ProviderFailure::Other,
                        message: format!("failed to parse API response: {e}"),
                        source: Some(Box::new(e)),
                    })?;
                return Ok(parsed);
            }

            let kind = failure_kind(status);
            let body = response.text().await.unwrap_or_default();
            let message = if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(&body)
            {
                format!(
                    "Gemini API error ({}): {}",
                    api_err.error.status, api_err.error.message
                )
            } else {
                format!("API returned {status}: {body}")
            };

            if kind == ProviderFailure::Transient && attempt < self.max_retries {
                warn!(status = %status, message = message.as_str(), "transient error, will retry");
                last_error = Some(BayanError::Provider {
                    kind,
                    message,
                    source: None,
                });
                continue;
            }

            return Err(BayanError::Provider {
                kind,
                message,
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| BayanError::Provider {
            kind: ProviderFailure::Other,
            message: "generation request failed after retries".into(),
            source: None,
        }))
    }
}

/// Map an HTTP status to a provider failure kind.
fn failure_kind(status: reqwest::StatusCode) -> ProviderFailure {
    match status.as_u16() {
        429 => ProviderFailure::RateLimited,
        401 | 403 => ProviderFailure::AuthFailed,
        500 | 502 | 503 | 529 => ProviderFailure::Transient,
        _ => ProviderFailure::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Content, Part};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> GeminiClient {
        GeminiClient::new("gemini-1.5-flash-latest".into())
            .unwrap()
            .with_base_url(base_url.to_string())
    }

    fn test_request() -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".into()),
                parts: vec![Part {
                    text: "Hello".into(),
                }],
            }],
            system_instruction: None,
            generation_config: None,
        }
    }

    fn success_body(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": text}]},
                "finishReason": "STOP"
            }]
        })
    }

    #[tokio::test]
    async fn generate_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash-latest:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("Hi there!")))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client.generate("test-key", &test_request()).await.unwrap();
        assert_eq!(result.text(), "Hi there!");
    }

    #[tokio::test]
    async fn rate_limit_surfaces_immediately_without_retry() {
        let server = MockServer::start().await;
        let error_body = serde_json::json!({
            "error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}
        });
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(&error_body))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.generate("k", &test_request()).await.unwrap_err();
        assert_eq!(err.provider_failure(), Some(ProviderFailure::RateLimited));
        assert!(err.to_string().contains("RESOURCE_EXHAUSTED"), "got: {err}");
    }

    #[tokio::test]
    async fn auth_failure_is_not_retried() {
        let server = MockServer::start().await;
        let error_body = serde_json::json!({
            "error": {"code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED"}
        });
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(&error_body))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.generate("bad-key", &test_request()).await.unwrap_err();
        assert_eq!(err.provider_failure(), Some(ProviderFailure::AuthFailed));
    }

    #[tokio::test]
    async fn transient_error_retries_once_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("after retry")))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client.generate("k", &test_request()).await.unwrap();
        assert_eq!(result.text(), "after retry");
    }

    #[tokio::test]
    async fn transient_error_exhausts_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.generate("k", &test_request()).await.unwrap_err();
        assert_eq!(err.provider_failure(), Some(ProviderFailure::Transient));
    }
}
