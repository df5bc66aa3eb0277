// SPDX-FileCopyrightText: 2026 Bayan Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for language model backends.

use async_trait::async_trait;

use crate::error::BayanError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Credential, ProviderRequest, ProviderResponse};

/// Adapter for language model providers.
///
/// The credential is passed per call rather than held by the adapter, so a
/// single shared HTTP client can serve requests under whichever key the
/// credential pool hands out for the current turn.
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// Sends a completion request under the given credential and returns the
    /// full response.
    async fn complete(
        &self,
        credential: &Credential,
        request: ProviderRequest,
    ) -> Result<ProviderResponse, BayanError>;
}
