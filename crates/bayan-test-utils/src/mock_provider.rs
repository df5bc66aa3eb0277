// SPDX-FileCopyrightText: 2026 Bayan Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock LLM provider adapter for deterministic testing.
//!
//! `MockProvider` implements `ProviderAdapter` with pre-configured responses
//! or failures, enabling fast, CI-runnable tests without external API calls.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use bayan_core::types::{Credential, ProviderRequest, ProviderResponse};
use bayan_core::{
    AdapterType, BayanError, HealthStatus, PluginAdapter, ProviderAdapter,
    ProviderFailure,
};

/// A mock provider that pops scripted outcomes from a FIFO queue.
///
/// When the queue is empty, a default "mock response" text is returned.
/// Every call records the credential id and request used, for assertions.
pub struct MockProvider {
    outcomes: Arc<Mutex<VecDeque<Result<String, ProviderFailure>>>>,
    calls: Arc<Mutex<Vec<(String, ProviderRequest)>>>,
}

impl MockProvider {
    /// Create a new mock provider with an empty outcome queue.
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock provider pre-loaded with successful responses.
    pub fn with_responses(responses: Vec<String>) -> Self {
        let provider = Self::new();
        {
            let outcomes = provider.outcomes.clone();
            let mut queue = outcomes.try_lock().expect("fresh mutex");
            queue.extend(responses.into_iter().map(Ok));
        }
        provider
    }

    /// Queue a successful response.
    pub async fn push_response(&self, text: impl Into<String>) {
        self.outcomes.lock().await.push_back(Ok(text.into()));
    }

    /// Queue a failure of the given kind.
    pub async fn push_failure(&self, kind: ProviderFailure) {
        self.outcomes.lock().await.push_back(Err(kind));
    }

    /// Number of completion calls made so far.
    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    /// Credential ids used per call, in order.
    pub async fn credentials_used(&self) -> Vec<String> {
        self.calls.lock().await.iter().map(|(id, _)| id.clone()).collect()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, BayanError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BayanError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn complete(
        &self,
        credential: &Credential,
        request: ProviderRequest,
    ) -> Result<ProviderResponse, BayanError> {
        self.calls
            .lock()
            .await
            .push((credential.id.clone(), request));

        match self.outcomes.lock().await.pop_front() {
            Some(Ok(text)) => Ok(ProviderResponse { text }),
            Some(Err(kind)) => Err(BayanError::Provider {
                kind,
                message: format!("scripted {kind} failure"),
                source: None,
            }),
            None => Ok(ProviderResponse {
                text: "mock response".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ProviderRequest {
        ProviderRequest {
            system: None,
            prompt: "hello".into(),
            max_output_tokens: 16,
        }
    }

    #[tokio::test]
    async fn default_response_when_queue_empty() {
        let provider = MockProvider::new();
        let cred = Credential::new("key-1", "s");
        let resp = provider.complete(&cred, request()).await.unwrap();
        assert_eq!(resp.text, "mock response");
    }

    #[tokio::test]
    async fn queued_outcomes_returned_in_order() {
        let provider = MockProvider::with_responses(vec!["first".into(), "second".into()]);
        provider.push_failure(ProviderFailure::RateLimited).await;
        let cred = Credential::new("key-1", "s");

        assert_eq!(provider.complete(&cred, request()).await.unwrap().text, "first");
        assert_eq!(provider.complete(&cred, request()).await.unwrap().text, "second");
        let err = provider.complete(&cred, request()).await.unwrap_err();
        assert_eq!(err.provider_failure(), Some(ProviderFailure::RateLimited));
    }

    #[tokio::test]
    async fn calls_are_recorded() {
        let provider = MockProvider::new();
        let cred = Credential::new("key-7", "s");
        provider.complete(&cred, request()).await.unwrap();
        assert_eq!(provider.call_count().await, 1);
        assert_eq!(provider.credentials_used().await, vec!["key-7"]);
    }
}
