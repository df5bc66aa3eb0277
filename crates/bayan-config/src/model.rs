// SPDX-FileCopyrightText: 2026 Bayan Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Bayan assistant.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Bayan configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BayanConfig {
    /// Assistant identity and behavior settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Gemini API settings, including the rotating key set.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Credential pool tuning.
    #[serde(default)]
    pub pool: PoolConfig,

    /// Warehouse connection settings.
    #[serde(default)]
    pub warehouse: WarehouseConfig,

    /// Entity/metric catalog overrides. Empty sections fall back to the
    /// compiled-in catalog.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Answer composition settings.
    #[serde(default)]
    pub composer: ComposerConfig,
}

/// Assistant identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the assistant.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Number of completed turns kept per session for multi-turn context.
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Upper bound in seconds for any single pipeline stage.
    #[serde(default = "default_stage_timeout_secs")]
    pub stage_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            history_window: default_history_window(),
            stage_timeout_secs: default_stage_timeout_secs(),
        }
    }
}

fn default_agent_name() -> String {
    "bayan".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_history_window() -> usize {
    6
}

fn default_stage_timeout_secs() -> u64 {
    30
}

/// Gemini API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiConfig {
    /// Rotating API keys. At least one is required to serve model-backed
    /// turns; several spread quota across keys.
    #[serde(default)]
    pub api_keys: Vec<String>,

    /// Model identifier for all completion calls.
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum tokens to generate per response.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            model: default_model(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

fn default_model() -> String {
    "gemini-1.5-flash-latest".to_string()
}

fn default_max_output_tokens() -> u32 {
    1024
}

/// Credential pool tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PoolConfig {
    /// Seconds a rate-limited credential stays in cooldown before becoming
    /// available again.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,

    /// Consecutive failures after which a credential is demoted to exhausted
    /// regardless of failure type.
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown_secs(),
            max_consecutive_failures: default_max_consecutive_failures(),
        }
    }
}

fn default_cooldown_secs() -> u64 {
    60
}

fn default_max_consecutive_failures() -> u32 {
    2
}

/// Warehouse connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WarehouseConfig {
    /// Path to the warehouse SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Hard per-query timeout in seconds. No query may run unbounded.
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,

    /// Backoff in milliseconds before the single retry on a connectivity or
    /// timeout failure.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            query_timeout_secs: default_query_timeout_secs(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_database_path() -> String {
    "warehouse.db".to_string()
}

fn default_query_timeout_secs() -> u64 {
    15
}

fn default_retry_backoff_ms() -> u64 {
    500
}

/// One metric entry in the catalog override.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MetricEntry {
    /// Stable catalog identifier, e.g. `revenue`.
    pub id: String,
    /// Natural-language aliases in any supported language.
    pub aliases: Vec<String>,
    /// Fact table holding the measure.
    pub fact_table: String,
    /// Measure column.
    pub value_column: String,
    /// Aggregate applied over the measure: `sum`, `avg`, or `count`.
    pub aggregate: String,
    /// Date column on the fact table used for time-range filtering.
    #[serde(default = "default_date_column")]
    pub date_column: String,
}

fn default_date_column() -> String {
    "OrderDate".to_string()
}

/// One dimension entry in the catalog override.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DimensionEntry {
    /// Stable catalog identifier, e.g. `region`.
    pub id: String,
    /// Natural-language aliases in any supported language.
    pub aliases: Vec<String>,
    /// Dimension table name.
    pub table: String,
    /// Foreign key column on the fact table.
    pub fact_key_column: String,
    /// Human-readable label column on the dimension table.
    pub label_column: String,
}

/// Entity/metric catalog configuration.
///
/// When `metrics`/`dimensions` are empty the planner uses its compiled-in
/// catalog; `version` participates in query traceability either way.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// Catalog version recorded on every structured query.
    #[serde(default = "default_catalog_version")]
    pub version: String,

    #[serde(default)]
    pub metrics: Vec<MetricEntry>,

    #[serde(default)]
    pub dimensions: Vec<DimensionEntry>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            version: default_catalog_version(),
            metrics: Vec::new(),
            dimensions: Vec::new(),
        }
    }
}

fn default_catalog_version() -> String {
    "2026.1".to_string()
}

/// Answer composition configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ComposerConfig {
    /// Upper bound in characters for conversational replies.
    #[serde(default = "default_max_conversational_chars")]
    pub max_conversational_chars: usize,

    /// Fractional drop versus the previous period that triggers the
    /// below-previous-period recommendation. 0.0 fires on any decline.
    #[serde(default = "default_decline_threshold")]
    pub decline_threshold: f64,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            max_conversational_chars: default_max_conversational_chars(),
            decline_threshold: default_decline_threshold(),
        }
    }
}

fn default_max_conversational_chars() -> usize {
    500
}

fn default_decline_threshold() -> f64 {
    0.0
}
