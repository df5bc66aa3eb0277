// SPDX-FileCopyrightText: 2026 Bayan Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Warehouse adapter trait for the external data warehouse boundary.

use async_trait::async_trait;

use crate::error::BayanError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ResultSet, StructuredQuery};

/// Adapter for the business data warehouse.
///
/// Implementations translate a [`StructuredQuery`] into their native query
/// form and run it read-only under a hard time bound. A well-formed query
/// matching zero rows returns an empty [`ResultSet`], never an error.
#[async_trait]
pub trait WarehouseAdapter: PluginAdapter {
    /// Executes the structured query and returns the tabular result.
    async fn execute(&self, query: &StructuredQuery) -> Result<ResultSet, BayanError>;
}
