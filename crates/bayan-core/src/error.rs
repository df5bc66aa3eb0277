// SPDX-FileCopyrightText: 2026 Bayan Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Bayan assistant.

use thiserror::Error;

/// Classifies a model-provider failure so the orchestrator can decide what to
/// do with the credential that was in use when it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderFailure {
    /// Quota or rate-limit rejection. The credential needs a cooldown.
    RateLimited,
    /// Authentication rejection (invalid or revoked key). The credential is dead.
    AuthFailed,
    /// Transient server-side failure (5xx), retriable with another attempt.
    Transient,
    /// Anything else: malformed response, connection failure, local error.
    Other,
}

impl std::fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderFailure::RateLimited => write!(f, "rate-limited"),
            ProviderFailure::AuthFailed => write!(f, "auth-failed"),
            ProviderFailure::Transient => write!(f, "transient"),
            ProviderFailure::Other => write!(f, "other"),
        }
    }
}

/// The primary error type used across all Bayan adapter traits and core operations.
#[derive(Debug, Error)]
pub enum BayanError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// No credential is available in the pool for this turn.
    #[error("credential pool exhausted")]
    PoolExhausted,

    /// The classification stage could not produce a verdict (provider failure
    /// during the model-assisted path). Carries the underlying provider
    /// failure kind so the caller can handle the credential correctly.
    #[error("classification unavailable: {message}")]
    ClassificationUnavailable {
        message: String,
        failure: Option<ProviderFailure>,
    },

    /// The utterance references a metric or dimension absent from the catalog.
    #[error("unknown entity: {term}")]
    UnknownEntity { term: String },

    /// The warehouse could not be reached or timed out, after the built-in retry.
    #[error("warehouse unavailable: {message}")]
    WarehouseUnavailable { message: String },

    /// Warehouse execution errors other than reachability (bad SQL mapping,
    /// row decoding).
    #[error("warehouse error: {source}")]
    Warehouse {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// LLM provider errors, tagged with a failure kind for credential handling.
    #[error("provider error ({kind}): {message}")]
    Provider {
        kind: ProviderFailure,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A pipeline stage exceeded its time bound.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BayanError {
    /// The provider failure kind, if this error came from the provider seam.
    pub fn provider_failure(&self) -> Option<ProviderFailure> {
        match self {
            BayanError::Provider { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
