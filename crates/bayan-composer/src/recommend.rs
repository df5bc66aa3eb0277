// SPDX-FileCopyrightText: 2026 Bayan Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Proactive recommendation rules.
//!
//! A small fixed rule set over the result rows. At most one recommendation
//! fires per answer; when nothing fires, nothing is said. Rules never
//! introduce numbers of their own: the only figure a recommendation may cite
//! is a cell from the result set.

use bayan_core::types::{ResultSet, Value};

/// A recommendation derived from the result rows.
#[derive(Debug, Clone, PartialEq)]
pub enum Recommendation {
    /// The current period's figure is below the previous period's.
    BelowPrevious {
        /// The previous period's value, verbatim from the result set.
        previous: Value,
    },
    /// The metric declined across three or more consecutive periods.
    DownwardTrend,
}

/// Evaluate the rule set over a period-labeled result.
///
/// Expects the warehouse's comparison shape: a `period` label column and the
/// metric value column. `decline_threshold` is the fractional drop versus
/// the previous period required for `BelowPrevious` to fire (0.0 fires on
/// any decline).
pub fn evaluate(result: &ResultSet, decline_threshold: f64) -> Option<Recommendation> {
    let period_idx = result.column_index("period")?;
    let value_idx = result.columns.len().checked_sub(1)?;
    if value_idx == period_idx {
        return None;
    }

    let values: Vec<f64> = result
        .rows
        .iter()
        .filter_map(|row| row.get(value_idx).and_then(Value::as_f64))
        .collect();

    // Rule 1: sustained decline across three or more periods.
    if values.len() >= 3 && values.windows(2).all(|w| w[1] < w[0]) {
        return Some(Recommendation::DownwardTrend);
    }

    // Rule 2: current period below the previous one.
    if values.len() >= 2 {
        let previous = values[values.len() - 2];
        let current = values[values.len() - 1];
        if current < previous * (1.0 - decline_threshold) {
            let previous_cell = result.rows[result.rows.len() - 2][value_idx].clone();
            return Some(Recommendation::BelowPrevious {
                previous: previous_cell,
            });
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use bayan_core::types::StructuredQuery;

    fn period_result(values: &[f64]) -> ResultSet {
        ResultSet {
            columns: vec!["period".into(), "revenue".into()],
            rows: values
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    vec![Value::Text(format!("p{i}")), Value::Real(*v)]
                })
                .collect(),
            query: StructuredQuery {
                metric: "revenue".into(),
                group_by: None,
                filters: vec![],
                time_range: None,
                compare_previous: true,
                secondary_hint: None,
                catalog_version: "2026.1".into(),
            },
        }
    }

    #[test]
    fn below_previous_fires_on_decline() {
        let result = period_result(&[3000.0, 1500.0]);
        assert_eq!(
            evaluate(&result, 0.0),
            Some(Recommendation::BelowPrevious {
                previous: Value::Real(3000.0)
            })
        );
    }

    #[test]
    fn no_recommendation_when_metric_grows() {
        let result = period_result(&[1500.0, 3000.0]);
        assert_eq!(evaluate(&result, 0.0), None);
    }

    #[test]
    fn threshold_suppresses_small_dips() {
        // 2% dip under a 5% threshold: nothing fires.
        let result = period_result(&[1000.0, 980.0]);
        assert_eq!(evaluate(&result, 0.05), None);
        // 10% dip over the same threshold fires.
        let result = period_result(&[1000.0, 900.0]);
        assert!(matches!(
            evaluate(&result, 0.05),
            Some(Recommendation::BelowPrevious { .. })
        ));
    }

    #[test]
    fn downward_trend_needs_three_declining_periods() {
        let result = period_result(&[3000.0, 2000.0, 1000.0]);
        assert_eq!(evaluate(&result, 0.0), Some(Recommendation::DownwardTrend));

        // A rebound in the middle breaks the trend; the final decline still
        // fires the below-previous rule.
        let result = period_result(&[3000.0, 3500.0, 1000.0]);
        assert!(matches!(
            evaluate(&result, 0.0),
            Some(Recommendation::BelowPrevious { .. })
        ));
    }

    #[test]
    fn non_period_results_never_recommend() {
        let result = ResultSet {
            columns: vec!["region".into(), "revenue".into()],
            rows: vec![
                vec![Value::Text("Gulf".into()), Value::Real(3000.0)],
                vec![Value::Text("Northwest".into()), Value::Real(1500.0)],
            ],
            query: period_result(&[]).query,
        };
        assert_eq!(evaluate(&result, 0.0), None);
    }

    #[test]
    fn single_row_never_recommends() {
        let result = period_result(&[1500.0]);
        assert_eq!(evaluate(&result, 0.0), None);
    }
}
