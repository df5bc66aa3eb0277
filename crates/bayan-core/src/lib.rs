// SPDX-FileCopyrightText: 2026 Bayan Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Bayan assistant.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Bayan workspace. The provider and
//! warehouse backends implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{BayanError, ProviderFailure};
pub use types::{
    AdapterType, Credential, HealthStatus, Intent, Language, ProviderRequest,
    ProviderResponse, ResponseKind, ResultSet, SessionId, StructuredQuery, TurnId,
    TurnStatus, Value,
};

pub use traits::{PluginAdapter, ProviderAdapter, WarehouseAdapter};
