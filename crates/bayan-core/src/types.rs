// SPDX-FileCopyrightText: 2026 Bayan Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Bayan pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a conversation session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

/// Unique identifier for a single turn within a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Provider,
    Warehouse,
}

/// Supported user languages.
///
/// `Unknown` covers empty input and input without letters; the pipeline
/// treats it as English for response templates.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
pub enum Language {
    Arabic,
    English,
    Unknown,
}

/// Classification of an utterance: does it need warehouse data or not.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum Intent {
    DataQuery,
    Conversational,
}

/// One model-access credential from the rotating pool.
///
/// The secret never appears in Debug output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// Stable identifier used in diagnostics and pool bookkeeping.
    pub id: String,
    /// The API key value.
    pub secret: String,
}

impl Credential {
    pub fn new(id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

// --- Provider types ---

/// A request to the language model provider.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    /// Optional system/persona instruction prepended to the prompt.
    pub system: Option<String>,
    /// The user-facing prompt text.
    pub prompt: String,
    /// Upper bound on generated tokens.
    pub max_output_tokens: u32,
}

/// A response from the language model provider.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    /// The generated text, trimmed.
    pub text: String,
}

// --- Structured query types ---

/// Granularity of a normalized time range.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
pub enum TimeGrain {
    Month,
    Quarter,
    Year,
}

/// An absolute, inclusive date range produced by normalizing a relative
/// time expression against the process clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub grain: TimeGrain,
}

impl TimeRange {
    /// The immediately preceding period at the same grain, used for
    /// trend comparison.
    pub fn previous(&self) -> TimeRange {
        use chrono::Datelike;
        let (year, month) = (self.start.year(), self.start.month());
        let (start, end) = match self.grain {
            TimeGrain::Month => {
                let (py, pm) = if month == 1 { (year - 1, 12) } else { (year, month - 1) };
                (first_of_month(py, pm), last_of_month(py, pm))
            }
            TimeGrain::Quarter => {
                let q = (month - 1) / 3 + 1;
                let (py, pq) = if q == 1 { (year - 1, 4) } else { (year, q - 1) };
                let pm = (pq - 1) * 3 + 1;
                (first_of_month(py, pm), last_of_month(py, pm + 2))
            }
            TimeGrain::Year => (first_of_month(year - 1, 1), last_of_month(year - 1, 12)),
        };
        TimeRange {
            start,
            end,
            grain: self.grain,
        }
    }
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    // Valid by construction: month is always 1-12 here.
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

fn last_of_month(year: i32, month: u32) -> NaiveDate {
    let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    first_of_month(ny, nm).pred_opt().unwrap_or(NaiveDate::MIN)
}

/// An equality filter on a catalog dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFilter {
    pub dimension: String,
    pub value: String,
}

/// Language-agnostic representation of "what data is needed".
///
/// References only metrics and dimensions known to the warehouse catalog;
/// the planner rejects anything else before this type is ever constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredQuery {
    /// Catalog identifier of the requested metric.
    pub metric: String,
    /// Optional dimension to group results by.
    pub group_by: Option<String>,
    /// Equality filters on dimensions.
    pub filters: Vec<QueryFilter>,
    /// Absolute time range, if the utterance carried one.
    pub time_range: Option<TimeRange>,
    /// Whether the warehouse should also return the preceding period for
    /// trend comparison.
    pub compare_previous: bool,
    /// Runner-up catalog match recorded for the composer to mention.
    pub secondary_hint: Option<String>,
    /// Version of the catalog this query was planned against.
    pub catalog_version: String,
}

// --- Result set types ---

/// A single typed cell value returned by the warehouse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Integer(i64),
    Real(f64),
    Text(String),
    Null,
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{v}"),
            Value::Real(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v}"),
            Value::Null => write!(f, "-"),
        }
    }
}

impl Value {
    /// Numeric view of the cell, for recommendation rules.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Real(v) => Some(*v),
            _ => None,
        }
    }
}

/// Ordered rows of named columns returned by the warehouse, tagged with the
/// originating query for traceability in the composer.
///
/// Zero rows is a valid outcome, not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub query: StructuredQuery,
}

impl ResultSet {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a named column, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

// --- Turn types ---

/// The response category a completed turn resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
pub enum ResponseKind {
    Conversational,
    Data,
    Error,
}

/// Terminal status of a turn as seen by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
pub enum TurnStatus {
    Delivered,
    Failed,
}

/// One completed request/response exchange. Immutable once the turn completes.
#[derive(Debug, Clone)]
pub struct TurnRecord {
    pub id: TurnId,
    pub session_id: SessionId,
    pub utterance: String,
    pub language: Language,
    pub intent: Option<Intent>,
    pub query: Option<StructuredQuery>,
    pub response: String,
    pub kind: ResponseKind,
    pub status: TurnStatus,
    pub created_at: String,
}
