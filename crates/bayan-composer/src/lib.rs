// SPDX-FileCopyrightText: 2026 Bayan Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Answer composition in the user's language.
//!
//! Data answers are assembled from templates, never from a model call:
//! every figure in a data answer is the string form of a result-set cell,
//! which is what makes the no-fabrication guarantee structural. The model
//! is only used for conversational replies, where a canned per-language
//! fallback covers provider failures.
//!
//! The composer mutates no shared state; everything here is a pure function
//! of its inputs plus one optional provider call.

pub mod recommend;

use bayan_config::model::ComposerConfig;
use bayan_core::types::{
    Credential, Language, ProviderRequest, ResultSet, TimeGrain, TimeRange,
};
use bayan_core::{BayanError, ProviderAdapter};
use bayan_planner::Catalog;
use tracing::debug;

pub use recommend::Recommendation;

const ENGLISH_MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August",
    "September", "October", "November", "December",
];

/// Composes the final natural-language response for a turn.
pub struct Composer {
    config: ComposerConfig,
    catalog: Catalog,
}

impl Composer {
    pub fn new(config: ComposerConfig, catalog: Catalog) -> Self {
        Self { config, catalog }
    }

    /// Compose a data answer from the warehouse result.
    ///
    /// Handles three result shapes: plain aggregate, period comparison, and
    /// dimension grouping. An empty result gets the "no data found" phrasing,
    /// which is distinct from the unavailability message -- the warehouse
    /// answered, there was just nothing there.
    pub fn data_answer(&self, result: &ResultSet, language: Language) -> String {
        if result.is_empty() {
            return match language {
                Language::Arabic => {
                    "لم أجد أي بيانات لهذه الفترة في مستودع البيانات.".to_string()
                }
                _ => "I could not find any data for that period in the warehouse.".to_string(),
            };
        }

        let metric_label = self.metric_label(&result.query.metric, language);
        let period = period_label(result.query.time_range.as_ref(), language);

        let mut answer = if result.column_index("period").is_some() {
            self.comparison_answer(result, &metric_label, &period, language)
        } else if let Some(dimension_id) = &result.query.group_by {
            self.grouped_answer(result, &metric_label, dimension_id, language)
        } else {
            self.single_value_answer(result, &metric_label, &period, language)
        };

        if let Some(recommendation) =
            recommend::evaluate(result, self.config.decline_threshold)
        {
            debug!(?recommendation, "recommendation rule fired");
            answer.push(' ');
            answer.push_str(&recommendation_text(&recommendation, &metric_label, language));
        }

        if let Some(hint) = &result.query.secondary_hint {
            let hint_label = self.metric_label(hint, language);
            answer.push(' ');
            answer.push_str(&match language {
                Language::Arabic => format!("يمكنني أيضا عرض {hint_label} إذا أردت."),
                _ => format!("I can also report {hint_label} if useful."),
            });
        }

        answer
    }

    fn single_value_answer(
        &self,
        result: &ResultSet,
        metric_label: &str,
        period: &str,
        language: Language,
    ) -> String {
        let value = &result.rows[0][result.columns.len() - 1];
        match language {
            Language::Arabic => format!("بلغت {metric_label} عن {period} ما مقداره {value}."),
            _ => format!("{} for {period} was {value}.", capitalize(metric_label)),
        }
    }

    fn comparison_answer(
        &self,
        result: &ResultSet,
        metric_label: &str,
        period: &str,
        language: Language,
    ) -> String {
        let period_idx = result.column_index("period").unwrap_or(0);
        let value_idx = result.columns.len() - 1;
        let current = result
            .rows
            .iter()
            .find(|row| row[period_idx] == bayan_core::Value::Text("current".into()))
            .map(|row| &row[value_idx]);

        match current {
            Some(value) => match language {
                Language::Arabic => {
                    format!("بلغت {metric_label} عن {period} ما مقداره {value}.")
                }
                _ => format!("{} for {period} was {value}.", capitalize(metric_label)),
            },
            // The requested period itself had no data; only the previous
            // period row survived.
            None => match language {
                Language::Arabic => {
                    "لم أجد أي بيانات لهذه الفترة في مستودع البيانات.".to_string()
                }
                _ => "I could not find any data for that period in the warehouse.".to_string(),
            },
        }
    }

    fn grouped_answer(
        &self,
        result: &ResultSet,
        metric_label: &str,
        dimension_id: &str,
        language: Language,
    ) -> String {
        let dimension_label = self.dimension_label(dimension_id, language);
        let listed = result
            .rows
            .iter()
            .take(5)
            .map(|row| format!("{} {}", row[0], row[result.columns.len() - 1]))
            .collect::<Vec<_>>()
            .join("، ");

        let mut answer = match language {
            Language::Arabic => format!("{metric_label} حسب {dimension_label}: {listed}."),
            _ => {
                let listed = listed.replace('،', ",");
                format!(
                    "{} by {dimension_label}: {listed}.",
                    capitalize(metric_label)
                )
            }
        };
        if result.rows.len() > 5 {
            answer.push_str(match language {
                Language::Arabic => " (الأعلى خمسة فقط)",
                _ => " (top five shown)",
            });
        }
        answer
    }

    /// Compose a conversational reply via the model, in the user's language.
    ///
    /// Provider failures propagate; callers fall back to
    /// [`Composer::fallback_reply`]. The reply is bounded by
    /// `max_conversational_chars`.
    pub async fn conversational(
        &self,
        utterance: &str,
        language: Language,
        provider: &dyn ProviderAdapter,
        credential: &Credential,
    ) -> Result<String, BayanError> {
        let request = ProviderRequest {
            system: Some(persona_prompt(language)),
            prompt: utterance.to_string(),
            max_output_tokens: 256,
        };
        let response = provider.complete(credential, request).await?;
        Ok(truncate(
            response.text.trim(),
            self.config.max_conversational_chars,
        ))
    }

    /// Canned clarification for empty or whitespace-only input.
    pub fn clarification_reply(language: Language) -> String {
        match language {
            Language::Arabic => "لم أسمع سؤالا. اسألني عن بيانات الشركة -- \
                                 الإيرادات أو الطلبات أو المنتجات -- أو قل مرحبا."
                .to_string(),
            _ => "I did not catch a question. Ask me about the company's data -- \
                  revenue, orders, products -- or just say hello."
                .to_string(),
        }
    }

    /// Canned apology when the model cannot be reached.
    pub fn fallback_reply(language: Language) -> String {
        match language {
            Language::Arabic => "عذرا، لا أستطيع معالجة الأسئلة حاليا. \
                                 يرجى المحاولة مرة أخرى بعد قليل."
                .to_string(),
            _ => "Sorry -- I cannot process questions right now. \
                  Please try again in a few minutes."
                .to_string(),
        }
    }

    /// Canned clarification when the utterance matched nothing in the catalog.
    pub fn unknown_entity_reply(&self, language: Language) -> String {
        let metrics = self
            .catalog
            .metrics()
            .iter()
            .map(|m| self.metric_label(&m.id, language))
            .collect::<Vec<_>>()
            .join(match language {
                Language::Arabic => "، ",
                _ => ", ",
            });
        match language {
            Language::Arabic => format!(
                "لم أتمكن من مطابقة سؤالك مع البيانات المتوفرة. \
                 جرب السؤال عن: {metrics}."
            ),
            _ => format!(
                "I could not match that question to the data I know. \
                 Try asking about: {metrics}."
            ),
        }
    }

    /// Generic unavailability message for terminal warehouse failures.
    pub fn unavailable_reply(language: Language) -> String {
        match language {
            Language::Arabic => "مصدر البيانات غير متاح حاليا. \
                                 يرجى المحاولة مرة أخرى لاحقا."
                .to_string(),
            _ => "The data source is currently unavailable. \
                  Please try again later."
                .to_string(),
        }
    }

    /// Display label for a metric: its first alias in the target script.
    fn metric_label(&self, id: &str, language: Language) -> String {
        match self.catalog.metric(id) {
            Some(metric) => alias_for(&metric.aliases, id, language),
            None => id.to_string(),
        }
    }

    fn dimension_label(&self, id: &str, language: Language) -> String {
        match self.catalog.dimension(id) {
            Some(dimension) => alias_for(&dimension.aliases, id, language),
            None => id.to_string(),
        }
    }
}

/// First alias in the requested script, falling back to the catalog id.
fn alias_for(aliases: &[String], id: &str, language: Language) -> String {
    let want_arabic = language == Language::Arabic;
    aliases
        .iter()
        .find(|a| has_arabic(a) == want_arabic)
        .cloned()
        .unwrap_or_else(|| id.to_string())
}

fn has_arabic(s: &str) -> bool {
    s.chars().any(|c| ('\u{0600}'..='\u{06FF}').contains(&c))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Human label for the queried period, derived from the query tag.
fn period_label(range: Option<&TimeRange>, language: Language) -> String {
    use chrono::Datelike;
    let Some(range) = range else {
        return match language {
            Language::Arabic => "كامل الفترة المسجلة".to_string(),
            _ => "the full recorded period".to_string(),
        };
    };
    let year = range.start.year();
    match range.grain {
        TimeGrain::Quarter => {
            let q = (range.start.month() - 1) / 3 + 1;
            match language {
                Language::Arabic => format!("الربع {q} من {year}"),
                _ => format!("Q{q} {year}"),
            }
        }
        TimeGrain::Month => {
            let m = range.start.month();
            match language {
                Language::Arabic => format!("شهر {m}/{year}"),
                _ => format!("{} {year}", ENGLISH_MONTHS[(m - 1) as usize]),
            }
        }
        TimeGrain::Year => match language {
            Language::Arabic => format!("عام {year}"),
            _ => format!("{year}"),
        },
    }
}

/// Recommendation phrasing. The only figure ever cited is the previous
/// period's cell value, verbatim.
fn recommendation_text(
    recommendation: &Recommendation,
    metric_label: &str,
    language: Language,
) -> String {
    match recommendation {
        Recommendation::BelowPrevious { previous } => match language {
            Language::Arabic => format!(
                "توصية: هذا أقل من الفترة السابقة ({previous})؛ \
                 قد يستحق الأمر مراجعة ما تغير."
            ),
            _ => format!(
                "Recommendation: this is below the previous period's {previous}; \
                 it may be worth reviewing what changed."
            ),
        },
        Recommendation::DownwardTrend => match language {
            Language::Arabic => format!(
                "توصية: {metric_label} في انخفاض عبر الفترات الأخيرة؛ \
                 ننصح بمراجعة الاتجاه مع الفريق."
            ),
            _ => format!(
                "Recommendation: {metric_label} has been declining over the \
                 recent periods; consider reviewing the trend with the team."
            ),
        },
    }
}

/// The conversational persona, in the register of the assistant's identity:
/// a friendly business-insights assistant that never pretends to have
/// queried data it did not query.
fn persona_prompt(language: Language) -> String {
    let language_rule = match language {
        Language::Arabic => "The user wrote in Arabic: reply in Arabic only.",
        _ => "The user wrote in English: reply in English only.",
    };
    format!(
        "You are Bayan, a friendly business-insights assistant for managers. \
         This is casual conversation, not a data question: be light and \
         engaging, keep the reply to one or two sentences, and stay in \
         character as a business assistant. Never claim to have looked at \
         any data or figures in this reply. Do not mix languages. {language_rule}"
    )
}

/// Bound a reply to `max_chars` characters, appending an ellipsis when cut.
fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bayan_core::types::{StructuredQuery, Value};
    use bayan_core::{
        AdapterType, HealthStatus, PluginAdapter, ProviderFailure, ProviderResponse,
    };
    use chrono::NaiveDate;

    fn composer() -> Composer {
        Composer::new(
            ComposerConfig::default(),
            Catalog::builtin("2026.1".into()),
        )
    }

    fn q2_2026() -> TimeRange {
        TimeRange {
            start: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2026, 6, 30).unwrap(),
            grain: TimeGrain::Quarter,
        }
    }

    fn revenue_query(compare: bool) -> StructuredQuery {
        StructuredQuery {
            metric: "revenue".into(),
            group_by: None,
            filters: vec![],
            time_range: Some(q2_2026()),
            compare_previous: compare,
            secondary_hint: None,
            catalog_version: "2026.1".into(),
        }
    }

    fn comparison_result(previous: f64, current: f64) -> ResultSet {
        ResultSet {
            columns: vec!["period".into(), "revenue".into()],
            rows: vec![
                vec![Value::Text("previous".into()), Value::Real(previous)],
                vec![Value::Text("current".into()), Value::Real(current)],
            ],
            query: revenue_query(true),
        }
    }

    #[test]
    fn english_answer_states_the_figure_and_period() {
        let result = comparison_result(3000.0, 1500.0);
        let answer = composer().data_answer(&result, Language::English);
        assert!(answer.contains("Revenue for Q2 2026 was 1500."), "got: {answer}");
    }

    #[test]
    fn declining_figure_appends_one_recommendation() {
        let result = comparison_result(3000.0, 1500.0);
        let answer = composer().data_answer(&result, Language::English);
        assert_eq!(answer.matches("Recommendation:").count(), 1);
        assert!(answer.contains("previous period's 3000"), "got: {answer}");
    }

    #[test]
    fn growing_figure_gets_no_recommendation() {
        let result = comparison_result(1500.0, 3000.0);
        let answer = composer().data_answer(&result, Language::English);
        assert!(!answer.contains("Recommendation"), "got: {answer}");
    }

    #[test]
    fn arabic_answer_is_arabic() {
        let result = comparison_result(3000.0, 1500.0);
        let answer = composer().data_answer(&result, Language::Arabic);
        assert!(answer.contains("الإيرادات"), "got: {answer}");
        assert!(answer.contains("1500"), "got: {answer}");
        assert!(!answer.to_lowercase().contains("revenue"), "got: {answer}");
    }

    #[test]
    fn every_figure_traces_to_a_result_cell() {
        let result = comparison_result(3000.0, 1500.0);
        let answer = composer().data_answer(&result, Language::English);
        let cell_strings: Vec<String> = result
            .rows
            .iter()
            .flatten()
            .map(|v| v.to_string())
            .collect();

        // Collect digit runs, excluding the period label that comes from the
        // query tag ("Q2 2026").
        let body = answer.replace("Q2 2026", "");
        for run in body
            .split(|c: char| !c.is_ascii_digit() && c != '.')
            .filter(|t| t.chars().any(|c| c.is_ascii_digit()))
        {
            let run = run.trim_matches('.');
            assert!(
                cell_strings.iter().any(|cell| cell == run),
                "figure `{run}` not found in result cells {cell_strings:?}"
            );
        }
    }

    #[test]
    fn empty_result_phrased_as_no_data_not_failure() {
        let result = ResultSet {
            columns: vec!["revenue".into()],
            rows: vec![],
            query: revenue_query(false),
        };
        let answer = composer().data_answer(&result, Language::English);
        assert!(answer.contains("could not find any data"), "got: {answer}");
        assert_ne!(answer, Composer::unavailable_reply(Language::English));
    }

    #[test]
    fn grouped_answer_lists_rows() {
        let mut query = revenue_query(false);
        query.group_by = Some("region".into());
        let result = ResultSet {
            columns: vec!["region".into(), "revenue".into()],
            rows: vec![
                vec![Value::Text("Gulf".into()), Value::Real(3000.0)],
                vec![Value::Text("Northwest".into()), Value::Real(1500.0)],
            ],
            query,
        };
        let answer = composer().data_answer(&result, Language::English);
        assert!(answer.contains("Gulf 3000"), "got: {answer}");
        assert!(answer.contains("Northwest 1500"), "got: {answer}");
        assert!(answer.contains("by region"), "got: {answer}");
    }

    #[test]
    fn secondary_hint_is_mentioned() {
        let mut result = comparison_result(1000.0, 2000.0);
        result.query.secondary_hint = Some("orders".into());
        let answer = composer().data_answer(&result, Language::English);
        assert!(answer.contains("orders"), "got: {answer}");
    }

    // --- conversational branch ---

    struct OneShotProvider {
        reply: Result<String, ProviderFailure>,
    }

    #[async_trait]
    impl PluginAdapter for OneShotProvider {
        fn name(&self) -> &str {
            "one-shot"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 1, 0)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Provider
        }
        async fn health_check(&self) -> Result<HealthStatus, BayanError> {
            Ok(HealthStatus::Healthy)
        }
        async fn shutdown(&self) -> Result<(), BayanError> {
            Ok(())
        }
    }

    #[async_trait]
    impl ProviderAdapter for OneShotProvider {
        async fn complete(
            &self,
            _credential: &Credential,
            request: ProviderRequest,
        ) -> Result<ProviderResponse, BayanError> {
            assert!(request.system.is_some(), "persona must be set");
            match &self.reply {
                Ok(text) => Ok(ProviderResponse { text: text.clone() }),
                Err(kind) => Err(BayanError::Provider {
                    kind: *kind,
                    message: "scripted failure".into(),
                    source: None,
                }),
            }
        }
    }

    #[tokio::test]
    async fn conversational_returns_model_reply() {
        let provider = OneShotProvider {
            reply: Ok("Why did the accountant break up with the calculator? \
                       It just didn't add up!"
                .into()),
        };
        let cred = Credential::new("key-1", "secret");
        let reply = composer()
            .conversational("tell me a joke", Language::English, &provider, &cred)
            .await
            .unwrap();
        assert!(reply.contains("calculator"));
    }

    #[tokio::test]
    async fn conversational_reply_is_bounded() {
        let provider = OneShotProvider {
            reply: Ok("x".repeat(5000)),
        };
        let cred = Credential::new("key-1", "secret");
        let composer = Composer::new(
            ComposerConfig {
                max_conversational_chars: 100,
                decline_threshold: 0.0,
            },
            Catalog::builtin("2026.1".into()),
        );
        let reply = composer
            .conversational("hello", Language::English, &provider, &cred)
            .await
            .unwrap();
        assert_eq!(reply.chars().count(), 100);
        assert!(reply.ends_with('…'));
    }

    #[tokio::test]
    async fn conversational_provider_error_propagates() {
        let provider = OneShotProvider {
            reply: Err(ProviderFailure::RateLimited),
        };
        let cred = Credential::new("key-1", "secret");
        let err = composer()
            .conversational("hello", Language::English, &provider, &cred)
            .await
            .unwrap_err();
        assert_eq!(err.provider_failure(), Some(ProviderFailure::RateLimited));
    }

    #[test]
    fn canned_replies_follow_the_language() {
        assert!(Composer::clarification_reply(Language::Arabic).contains("سؤالا"));
        assert!(Composer::clarification_reply(Language::English).contains("question"));
        assert!(Composer::fallback_reply(Language::Arabic).contains("عذرا"));
        assert!(Composer::unavailable_reply(Language::English).contains("unavailable"));
        let unknown = composer().unknown_entity_reply(Language::English);
        assert!(unknown.contains("revenue"), "got: {unknown}");
    }
}
