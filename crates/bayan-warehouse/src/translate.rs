// SPDX-FileCopyrightText: 2026 Bayan Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structured query to SQL translation.
//!
//! The SQL dialect is an implementation detail of this layer; nothing
//! outside the warehouse crate sees query text. All user-derived values are
//! bound as parameters. Table and column names come from the catalog, never
//! from the utterance.

use bayan_core::types::StructuredQuery;
use bayan_core::BayanError;
use bayan_planner::{Aggregate, Catalog, CatalogMetric};

/// A translated query: SQL text, positional string parameters, and the
/// result column names in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlQuery {
    pub sql: String,
    pub params: Vec<String>,
    pub columns: Vec<String>,
}

/// Translate a structured query into SQL against the catalog's schema.
///
/// Shapes:
/// - plain aggregate: one row, one value column named after the metric
/// - grouped: one row per dimension label, descending by value
/// - compare-previous: `previous` and `current` rows labeled in a `period`
///   column
pub fn build_sql(query: &StructuredQuery, catalog: &Catalog) -> Result<SqlQuery, BayanError> {
    let metric = catalog
        .metric(&query.metric)
        .ok_or_else(|| BayanError::UnknownEntity {
            term: query.metric.clone(),
        })?;

    let aggregate = aggregate_expr(metric);

    let (filter_sql, mut params) = filter_clause(query, catalog, metric)?;

    if let Some(dimension_id) = &query.group_by {
        let dimension =
            catalog
                .dimension(dimension_id)
                .ok_or_else(|| BayanError::UnknownEntity {
                    term: dimension_id.clone(),
                })?;
        let sql = format!(
            "SELECT d.{label} AS {dim}, {aggregate} AS {metric_col} \
             FROM {fact} f JOIN {dim_table} d ON f.{fact_key} = d.{fact_key} \
             {filter_sql} \
             GROUP BY d.{label} ORDER BY {metric_col} DESC LIMIT 50",
            label = dimension.label_column,
            dim = dimension.id,
            metric_col = metric.id,
            fact = metric.fact_table,
            dim_table = dimension.table,
            fact_key = dimension.fact_key_column,
        );
        return Ok(SqlQuery {
            sql,
            params,
            columns: vec![dimension.id.clone(), metric.id.clone()],
        });
    }

    if query.compare_previous
        && let Some(range) = query.time_range
    {
        let previous = range.previous();
        let sql = format!(
            "SELECT 'previous' AS period, {aggregate} AS {metric_col} \
             FROM {fact} f WHERE f.{date} BETWEEN ?1 AND ?2 \
             UNION ALL \
             SELECT 'current' AS period, {aggregate} AS {metric_col} \
             FROM {fact} f WHERE f.{date} BETWEEN ?3 AND ?4",
            metric_col = metric.id,
            fact = metric.fact_table,
            date = metric.date_column,
        );
        let params = vec![
            previous.start.to_string(),
            previous.end.to_string(),
            range.start.to_string(),
            range.end.to_string(),
        ];
        return Ok(SqlQuery {
            sql,
            params,
            columns: vec!["period".to_string(), metric.id.clone()],
        });
    }

    let sql = format!(
        "SELECT {aggregate} AS {metric_col} FROM {fact} f {filter_sql}",
        metric_col = metric.id,
        fact = metric.fact_table,
    );
    let columns = vec![metric.id.clone()];
    Ok(SqlQuery { sql, params, columns })
}

fn aggregate_expr(metric: &CatalogMetric) -> String {
    match metric.aggregate {
        Aggregate::Sum => format!("SUM(f.{})", metric.value_column),
        Aggregate::Avg => format!("AVG(f.{})", metric.value_column),
        Aggregate::Count => format!("COUNT(DISTINCT f.{})", metric.value_column),
    }
}

/// WHERE clause for time range and dimension filters, with positional params.
fn filter_clause(
    query: &StructuredQuery,
    catalog: &Catalog,
    metric: &CatalogMetric,
) -> Result<(String, Vec<String>), BayanError> {
    let mut conditions = Vec::new();
    let mut params = Vec::new();

    if let Some(range) = query.time_range {
        conditions.push(format!(
            "f.{} BETWEEN ?{} AND ?{}",
            metric.date_column,
            params.len() + 1,
            params.len() + 2
        ));
        params.push(range.start.to_string());
        params.push(range.end.to_string());
    }

    for filter in &query.filters {
        let dimension =
            catalog
                .dimension(&filter.dimension)
                .ok_or_else(|| BayanError::UnknownEntity {
                    term: filter.dimension.clone(),
                })?;
        conditions.push(format!(
            "f.{key} IN (SELECT {key} FROM {table} WHERE {label} = ?{n})",
            key = dimension.fact_key_column,
            table = dimension.table,
            label = dimension.label_column,
            n = params.len() + 1,
        ));
        params.push(filter.value.clone());
    }

    let sql = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };
    Ok((sql, params))
}
