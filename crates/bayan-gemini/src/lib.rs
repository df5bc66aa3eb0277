// SPDX-FileCopyrightText: 2026 Bayan Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Gemini provider adapter for Bayan.
//!
//! Wraps [`GeminiClient`] behind the [`ProviderAdapter`] seam. The API key
//! arrives per call from the credential pool; the adapter itself holds no
//! credentials.

pub mod client;
pub mod types;

use async_trait::async_trait;

use bayan_config::model::GeminiConfig;
use bayan_core::types::{Credential, ProviderRequest, ProviderResponse};
use bayan_core::{
    AdapterType, BayanError, HealthStatus, PluginAdapter, ProviderAdapter,
};

pub use client::GeminiClient;
use types::{Content, GenerateContentRequest, GenerationConfig, Part, SystemInstruction};

/// Gemini-backed implementation of [`ProviderAdapter`].
pub struct GeminiProvider {
    client: GeminiClient,
}

impl GeminiProvider {
    pub fn new(config: &GeminiConfig) -> Result<Self, BayanError> {
        Ok(Self {
            client: GeminiClient::new(config.model.clone())?,
        })
    }

    #[cfg(test)]
    fn with_client(client: GeminiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PluginAdapter for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, BayanError> {
        // No credential is held here, so there is nothing to probe without
        // spending quota; construction already validated the HTTP stack.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BayanError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for GeminiProvider {
    async fn complete(
        &self,
        credential: &Credential,
        request: ProviderRequest,
    ) -> Result<ProviderResponse, BayanError> {
        let api_request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: request.prompt,
                }],
            }],
            system_instruction: request.system.map(|text| SystemInstruction {
                parts: vec![Part { text }],
            }),
            generation_config: Some(GenerationConfig {
                max_output_tokens: request.max_output_tokens,
            }),
        };

        let response = self.client.generate(&credential.secret, &api_request).await?;
        let text = response.text().trim().to_string();
        if text.is_empty() {
            return Err(BayanError::Provider {
                kind: bayan_core::ProviderFailure::Other,
                message: "Gemini returned no candidate text".to_string(),
                source: None,
            });
        }
        Ok(ProviderResponse { text })
    }
}
