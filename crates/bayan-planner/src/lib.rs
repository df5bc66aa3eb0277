// SPDX-FileCopyrightText: 2026 Bayan Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query planning: free text in either language to a structured query.
//!
//! Planning is a pure function of (utterance, catalog, clock). The same
//! utterance against the same catalog always yields the same structured
//! query, which is what makes classification and planning testable and
//! replayable. Utterances whose data vocabulary matches nothing in the
//! catalog are rejected with `UnknownEntity` instead of guessing.

pub mod catalog;
pub mod timeframe;

use bayan_core::types::{Language, StructuredQuery};
use bayan_core::BayanError;
use chrono::{DateTime, Utc};
use tracing::debug;

pub use catalog::{Aggregate, Catalog, CatalogDimension, CatalogMetric};

/// Maps data-intent utterances to structured queries against the catalog.
pub struct QueryPlanner {
    catalog: Catalog,
}

impl QueryPlanner {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Plan a structured query for a data-intent utterance.
    ///
    /// `now` is the clock used to normalize relative time expressions;
    /// callers inject it so planning stays deterministic under test.
    ///
    /// Tie-break policy: when multiple metrics match, the one with the
    /// longest matched alias wins and the runner-up is recorded as a
    /// secondary hint for the composer.
    pub fn plan(
        &self,
        utterance: &str,
        language: Language,
        now: DateTime<Utc>,
    ) -> Result<StructuredQuery, BayanError> {
        let lower = utterance.to_lowercase();

        let mut metric_matches = self.match_metrics(&lower);
        if metric_matches.is_empty() {
            let term: String = utterance.trim().chars().take(64).collect();
            debug!(%language, term = term.as_str(), "no catalog metric matched");
            return Err(BayanError::UnknownEntity { term });
        }

        // Longest matched alias wins; ties resolve in catalog order.
        metric_matches.sort_by(|a, b| b.1.cmp(&a.1));
        let metric = metric_matches[0].0;
        let secondary_hint = metric_matches
            .iter()
            .map(|(id, _)| *id)
            .find(|id| *id != metric)
            .map(str::to_string);

        let group_by = self.match_dimension(&lower);
        let time_range = timeframe::normalize(&lower, now);

        // A single-figure time-ranged question gets the preceding period for
        // trend comparison; grouped questions answer as-is.
        let compare_previous = time_range.is_some() && group_by.is_none();

        let query = StructuredQuery {
            metric: metric.to_string(),
            group_by,
            // TODO: derive dimension-value filters once the catalog carries
            // dimension member lists.
            filters: Vec::new(),
            time_range,
            compare_previous,
            secondary_hint,
            catalog_version: self.catalog.version.clone(),
        };

        debug!(
            %language,
            metric = query.metric.as_str(),
            group_by = ?query.group_by,
            time_range = ?query.time_range,
            "planned structured query"
        );
        Ok(query)
    }

    /// All metrics whose alias appears in the utterance, with the length of
    /// the longest alias that matched.
    fn match_metrics<'a>(&'a self, lower: &str) -> Vec<(&'a str, usize)> {
        self.catalog
            .metrics()
            .iter()
            .filter_map(|m| {
                m.aliases
                    .iter()
                    .filter(|alias| contains_phrase(lower, &alias.to_lowercase()))
                    .map(|alias| alias.chars().count())
                    .max()
                    .map(|len| (m.id.as_str(), len))
            })
            .collect()
    }

    /// The dimension with the longest matched alias, if any.
    fn match_dimension(&self, lower: &str) -> Option<String> {
        self.catalog
            .dimensions()
            .iter()
            .filter_map(|d| {
                d.aliases
                    .iter()
                    .filter(|alias| contains_phrase(lower, &alias.to_lowercase()))
                    .map(|alias| alias.chars().count())
                    .max()
                    .map(|len| (d.id.clone(), len))
            })
            .max_by_key(|(_, len)| *len)
            .map(|(id, _)| id)
    }
}

/// Phrase containment at word boundaries, so "sales" never matches inside
/// "salesperson".
fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    let mut search_from = 0;
    while let Some(rel) = haystack[search_from..].find(phrase) {
        let pos = search_from + rel;
        let before_ok = !haystack[..pos]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric());
        let after_ok = !haystack[pos + phrase.len()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
        search_from = pos + phrase.len();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use bayan_core::types::TimeGrain;
    use chrono::{NaiveDate, TimeZone};

    fn planner() -> QueryPlanner {
        QueryPlanner::new(Catalog::builtin("2026.1".into()))
    }

    fn august_2026() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap()
    }

    #[test]
    fn revenue_last_quarter_plans_q2_with_comparison() {
        let query = planner()
            .plan("What was our revenue last quarter?", Language::English, august_2026())
            .unwrap();
        assert_eq!(query.metric, "revenue");
        assert!(query.group_by.is_none());
        let range = query.time_range.unwrap();
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2026, 4, 1).unwrap());
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2026, 6, 30).unwrap());
        assert_eq!(range.grain, TimeGrain::Quarter);
        assert!(query.compare_previous);
        assert_eq!(query.catalog_version, "2026.1");
    }

    #[test]
    fn arabic_revenue_last_quarter_plans_identically() {
        let en = planner()
            .plan("what was our revenue last quarter?", Language::English, august_2026())
            .unwrap();
        let ar = planner()
            .plan("كم كانت الإيرادات في الربع الماضي؟", Language::Arabic, august_2026())
            .unwrap();
        assert_eq!(en.metric, ar.metric);
        assert_eq!(en.time_range, ar.time_range);
    }

    #[test]
    fn unknown_metric_is_rejected() {
        let err = planner()
            .plan("What was our churn rate last quarter?", Language::English, august_2026())
            .unwrap_err();
        assert!(matches!(err, BayanError::UnknownEntity { .. }));
    }

    #[test]
    fn grouped_query_detects_dimension_and_skips_comparison() {
        let query = planner()
            .plan("show me revenue by region this year", Language::English, august_2026())
            .unwrap();
        assert_eq!(query.metric, "revenue");
        assert_eq!(query.group_by.as_deref(), Some("region"));
        assert!(!query.compare_previous);
    }

    #[test]
    fn longest_alias_wins_with_secondary_hint() {
        // "revenue" (7 chars) beats "orders" (6 chars); the loser is hinted.
        let query = planner()
            .plan("compare revenue and orders for q1", Language::English, august_2026())
            .unwrap();
        assert_eq!(query.metric, "revenue");
        assert_eq!(query.secondary_hint.as_deref(), Some("orders"));
    }

    #[test]
    fn alias_inside_longer_word_does_not_match() {
        // "salesperson" contains "sales" but only at a non-boundary; the
        // employee dimension should match instead via its own alias.
        let query = planner()
            .plan("units sold by salesperson", Language::English, august_2026())
            .unwrap();
        assert_eq!(query.metric, "quantity");
        assert_eq!(query.group_by.as_deref(), Some("employee"));
    }

    #[test]
    fn no_time_expression_means_no_range_and_no_comparison() {
        let query = planner()
            .plan("total revenue", Language::English, august_2026())
            .unwrap();
        assert!(query.time_range.is_none());
        assert!(!query.compare_previous);
    }

    #[test]
    fn planning_is_deterministic() {
        let p = planner();
        let a = p
            .plan("What was our revenue last quarter?", Language::English, august_2026())
            .unwrap();
        let b = p
            .plan("What was our revenue last quarter?", Language::English, august_2026())
            .unwrap();
        assert_eq!(a, b);
    }
}
