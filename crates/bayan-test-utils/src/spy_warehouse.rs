// SPDX-FileCopyrightText: 2026 Bayan Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Spy warehouse adapter for deterministic testing.
//!
//! Records every executed structured query (so tests can assert that
//! conversational turns never touch the warehouse) and pops scripted
//! outcomes from a FIFO queue.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use bayan_core::types::{ResultSet, StructuredQuery, Value};
use bayan_core::{
    AdapterType, BayanError, HealthStatus, PluginAdapter, WarehouseAdapter,
};

/// A scripted outcome for one `execute` call.
enum SpyOutcome {
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    },
    Unavailable(String),
}

/// Warehouse spy with scripted outcomes and a full call log.
///
/// With an empty script, every query returns an empty result set.
pub struct SpyWarehouse {
    outcomes: Arc<Mutex<VecDeque<SpyOutcome>>>,
    calls: Arc<Mutex<Vec<StructuredQuery>>>,
}

impl SpyWarehouse {
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a raw result for the next call.
    pub async fn push_rows(&self, columns: Vec<String>, rows: Vec<Vec<Value>>) {
        self.outcomes
            .lock()
            .await
            .push_back(SpyOutcome::Rows { columns, rows });
    }

    /// Queue the warehouse's period-comparison shape: a `previous` and a
    /// `current` row for the given metric.
    pub async fn push_comparison(&self, metric: &str, previous: f64, current: f64) {
        self.push_rows(
            vec!["period".to_string(), metric.to_string()],
            vec![
                vec![Value::Text("previous".into()), Value::Real(previous)],
                vec![Value::Text("current".into()), Value::Real(current)],
            ],
        )
        .await;
    }

    /// Queue a `WarehouseUnavailable` failure for the next call.
    pub async fn push_unavailable(&self, message: impl Into<String>) {
        self.outcomes
            .lock()
            .await
            .push_back(SpyOutcome::Unavailable(message.into()));
    }

    /// Number of executed queries.
    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    /// Every executed query, in order.
    pub async fn executed_queries(&self) -> Vec<StructuredQuery> {
        self.calls.lock().await.clone()
    }
}

impl Default for SpyWarehouse {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for SpyWarehouse {
    fn name(&self) -> &str {
        "spy-warehouse"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Warehouse
    }

    async fn health_check(&self) -> Result<HealthStatus, BayanError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BayanError> {
        Ok(())
    }
}

#[async_trait]
impl WarehouseAdapter for SpyWarehouse {
    async fn execute(&self, query: &StructuredQuery) -> Result<ResultSet, BayanError> {
        self.calls.lock().await.push(query.clone());

        match self.outcomes.lock().await.pop_front() {
            Some(SpyOutcome::Rows { columns, rows }) => Ok(ResultSet {
                columns,
                rows,
                query: query.clone(),
            }),
            Some(SpyOutcome::Unavailable(message)) => {
                Err(BayanError::WarehouseUnavailable { message })
            }
            None => Ok(ResultSet {
                columns: vec![query.metric.clone()],
                rows: vec![],
                query: query.clone(),
            }),
        }
    }
}
