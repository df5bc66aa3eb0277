// SPDX-FileCopyrightText: 2026 Bayan Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only SQLite access layer for the business data warehouse.
//!
//! Executes structured queries with a hard per-query timeout and a single
//! retry with backoff on connectivity/timeout failures. The connection is
//! opened read-only with `query_only` set; this layer can never mutate the
//! warehouse. A well-formed query matching zero rows returns an empty
//! result set, never an error.

pub mod translate;

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use bayan_config::model::WarehouseConfig;
use bayan_core::types::{ResultSet, StructuredQuery, Value};
use bayan_core::{
    AdapterType, BayanError, HealthStatus, PluginAdapter, WarehouseAdapter,
};
use bayan_planner::Catalog;

use translate::SqlQuery;

/// SQLite-backed warehouse adapter.
///
/// Holds one lazily-opened read-only connection; all calls are serialized
/// through tokio-rusqlite's single background thread.
pub struct SqliteWarehouse {
    config: WarehouseConfig,
    catalog: Catalog,
    conn: OnceCell<tokio_rusqlite::Connection>,
}

/// Internal split between retriable and terminal execution failures.
enum RunError {
    /// Connectivity-shaped failure, worth the single retry.
    Unavailable(String),
    /// Anything else; retrying would not help.
    Fatal(BayanError),
}

impl SqliteWarehouse {
    /// The connection is not opened until [`initialize`] is called.
    pub fn new(config: WarehouseConfig, catalog: Catalog) -> Self {
        Self {
            config,
            catalog,
            conn: OnceCell::new(),
        }
    }

    /// Open the warehouse database read-only.
    pub async fn initialize(&self) -> Result<(), BayanError> {
        let flags = rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
            | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = tokio_rusqlite::Connection::open_with_flags(
            &self.config.database_path,
            flags,
        )
        .await
        .map_err(|e| BayanError::WarehouseUnavailable {
            message: format!("failed to open warehouse database: {e}"),
        })?;

        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch("PRAGMA query_only = ON;")?;
            Ok(())
        })
        .await
        .map_err(|e| BayanError::WarehouseUnavailable {
            message: format!("failed to set query_only: {e}"),
        })?;

        self.conn.set(conn).map_err(|_| {
            BayanError::Internal("warehouse already initialized".to_string())
        })?;
        debug!(path = %self.config.database_path, "warehouse opened read-only");
        Ok(())
    }

    fn conn(&self) -> Result<&tokio_rusqlite::Connection, BayanError> {
        self.conn.get().ok_or_else(|| {
            BayanError::Internal(
                "warehouse not initialized -- call initialize() first".to_string(),
            )
        })
    }

    /// Run the translated SQL once, without timeout or retry.
    async fn run_once(&self, translated: &SqlQuery) -> Result<Vec<Vec<Value>>, RunError> {
        let conn = self.conn().map_err(RunError::Fatal)?;
        let sql = translated.sql.clone();
        let params = translated.params.clone();
        let ncols = translated.columns.len();

        let rows = conn
            .call(move |conn| -> Result<Vec<Vec<Value>>, rusqlite::Error> {
                let mut stmt = conn.prepare(&sql)?;
                let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;
                let mut out = Vec::new();
                while let Some(row) = rows.next()? {
                    let mut record = Vec::with_capacity(ncols);
                    for i in 0..ncols {
                        let value = match row.get_ref(i)? {
                            rusqlite::types::ValueRef::Null => Value::Null,
                            rusqlite::types::ValueRef::Integer(v) => Value::Integer(v),
                            rusqlite::types::ValueRef::Real(v) => Value::Real(v),
                            rusqlite::types::ValueRef::Text(t) => {
                                Value::Text(String::from_utf8_lossy(t).into_owned())
                            }
                            rusqlite::types::ValueRef::Blob(_) => Value::Null,
                        };
                        record.push(value);
                    }
                    out.push(record);
                }
                Ok(out)
            })
            .await
            .map_err(map_run_err)?;

        // Aggregates over an empty period produce NULL; dropping those rows
        // makes "no data" observable as an empty result set.
        let rows = rows
            .into_iter()
            .filter(|record| !matches!(record.last(), Some(Value::Null)))
            .collect();
        Ok(rows)
    }
}

fn map_run_err(err: tokio_rusqlite::Error) -> RunError {
    match err {
        tokio_rusqlite::Error::Error(e) => RunError::Fatal(BayanError::Warehouse {
            source: Box::new(e),
        }),
        other => RunError::Unavailable(other.to_string()),
    }
}

#[async_trait]
impl PluginAdapter for SqliteWarehouse {
    fn name(&self) -> &str {
        "sqlite-warehouse"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Warehouse
    }

    async fn health_check(&self) -> Result<HealthStatus, BayanError> {
        let conn = self.conn()?;
        let result = conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await;
        match result {
            Ok(()) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), BayanError> {
        // Read-only connection: nothing to flush.
        Ok(())
    }
}

#[async_trait]
impl WarehouseAdapter for SqliteWarehouse {
    /// Execute with a hard timeout; connectivity/timeout failures are
    /// retried once with backoff before surfacing as `WarehouseUnavailable`.
    async fn execute(&self, query: &StructuredQuery) -> Result<ResultSet, BayanError> {
        let translated = translate::build_sql(query, &self.catalog)?;
        let time_bound = Duration::from_secs(self.config.query_timeout_secs);
        let mut last_message = String::new();

        for attempt in 0..=1u32 {
            if attempt > 0 {
                warn!(
                    attempt,
                    backoff_ms = self.config.retry_backoff_ms,
                    "retrying warehouse query after failure"
                );
                tokio::time::sleep(Duration::from_millis(self.config.retry_backoff_ms)).await;
            }

            match tokio::time::timeout(time_bound, self.run_once(&translated)).await {
                Ok(Ok(rows)) => {
                    debug!(
                        metric = query.metric.as_str(),
                        rows = rows.len(),
                        "warehouse query complete"
                    );
                    return Ok(ResultSet {
                        columns: translated.columns.clone(),
                        rows,
                        query: query.clone(),
                    });
                }
                Ok(Err(RunError::Fatal(e))) => return Err(e),
                Ok(Err(RunError::Unavailable(message))) => {
                    last_message = message;
                }
                Err(_elapsed) => {
                    last_message = format!("query exceeded {time_bound:?}");
                }
            }
        }

        Err(BayanError::WarehouseUnavailable {
            message: last_message,
        })
    }
}
