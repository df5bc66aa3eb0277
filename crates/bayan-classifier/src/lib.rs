// SPDX-FileCopyrightText: 2026 Bayan Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Language detection and intent classification.
//!
//! Two independent, composable outputs per utterance: the detected language
//! and the classified intent. Language detection is a script heuristic;
//! intent classification is heuristic-first with a model-assisted call only
//! for inconclusive utterances, so clear cases (greetings, obvious metric
//! questions, empty input) never cost a provider call.

pub mod intent;
pub mod language;

use bayan_core::{
    BayanError, Credential, Intent, Language, ProviderAdapter, ProviderRequest,
};
use tracing::debug;

pub use intent::{HeuristicVerdict, IntentScorer};
pub use language::detect_language;

/// Result of classifying one utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub language: Language,
    pub intent: Intent,
    /// Confidence in the intent (1.0 for model-assisted verdicts).
    pub confidence: f32,
    /// Whether the verdict required a model call.
    pub model_assisted: bool,
}

/// Classifier combining script-based language detection with heuristic intent
/// scoring and a model-assisted fallback.
pub struct Classifier {
    scorer: IntentScorer,
}

impl Classifier {
    /// `vocabulary` is the catalog's full alias list; hits are the strongest
    /// data-intent signal.
    pub fn new(vocabulary: Vec<String>) -> Self {
        Self {
            scorer: IntentScorer::new(vocabulary),
        }
    }

    /// Classify an utterance.
    ///
    /// When the heuristics are inconclusive and a provider + credential are
    /// supplied, one model call decides; without a provider the verdict
    /// defaults to `Conversational` (false negatives on data intent are
    /// preferred over spurious warehouse queries).
    ///
    /// Provider failures surface as [`BayanError::ClassificationUnavailable`]
    /// carrying the underlying failure kind.
    pub async fn classify(
        &self,
        utterance: &str,
        recent: &[&str],
        provider: Option<(&dyn ProviderAdapter, &Credential)>,
    ) -> Result<Classification, BayanError> {
        let language = detect_language(utterance);

        match self.scorer.score(utterance, recent) {
            HeuristicVerdict::Decided {
                intent,
                confidence,
                reason,
            } => {
                debug!(%language, %intent, confidence, reason, "heuristic intent verdict");
                Ok(Classification {
                    language,
                    intent,
                    confidence,
                    model_assisted: false,
                })
            }
            HeuristicVerdict::Inconclusive => match provider {
                Some((provider, credential)) => {
                    let intent = self.classify_with_model(utterance, provider, credential).await?;
                    debug!(%language, %intent, "model-assisted intent verdict");
                    Ok(Classification {
                        language,
                        intent,
                        confidence: 1.0,
                        model_assisted: true,
                    })
                }
                None => {
                    debug!(%language, "inconclusive without provider, defaulting to conversational");
                    Ok(Classification {
                        language,
                        intent: Intent::Conversational,
                        confidence: 0.0,
                        model_assisted: false,
                    })
                }
            },
        }
    }

    async fn classify_with_model(
        &self,
        utterance: &str,
        provider: &dyn ProviderAdapter,
        credential: &Credential,
    ) -> Result<Intent, BayanError> {
        let request = ProviderRequest {
            system: None,
            prompt: intent_prompt(utterance),
            max_output_tokens: 8,
        };

        let response = provider
            .complete(credential, request)
            .await
            .map_err(|e| BayanError::ClassificationUnavailable {
                message: e.to_string(),
                failure: e.provider_failure(),
            })?;

        // Any verdict that is not clearly "data" stays conversational.
        if response.text.trim().to_lowercase().contains("data") {
            Ok(Intent::DataQuery)
        } else {
            Ok(Intent::Conversational)
        }
    }
}

/// Build the one-word intent prompt for the model-assisted path.
///
/// The question may be in Arabic or English; the verdict vocabulary is fixed
/// so the response parses the same either way.
fn intent_prompt(utterance: &str) -> String {
    format!(
        "Classify the following question as either \"data\" or \"casual\".\n\
         \"data\" questions ask about business figures the company warehouse \
         holds: employees, products, resellers, sales, revenue, performance, \
         order volumes.\n\
         \"casual\" questions are greetings, humor, small talk, or anything \
         else.\n\
         The question may be in Arabic or English.\n\n\
         Question: {utterance}\n\n\
         Respond with exactly one word: data or casual."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bayan_core::{
        AdapterType, HealthStatus, PluginAdapter, ProviderFailure, ProviderResponse,
    };
    use std::collections::VecDeque;
    use tokio::sync::Mutex;

    /// Minimal scripted provider for classifier tests.
    struct ScriptedProvider {
        responses: Mutex<VecDeque<Result<String, BayanError>>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Result<String, BayanError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
            }
        }
    }

    #[async_trait]
    impl PluginAdapter for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
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
    impl ProviderAdapter for ScriptedProvider {
        async fn complete(
            &self,
            _credential: &Credential,
            _request: bayan_core::types::ProviderRequest,
        ) -> Result<ProviderResponse, BayanError> {
            match self.responses.lock().await.pop_front() {
                Some(Ok(text)) => Ok(ProviderResponse { text }),
                Some(Err(e)) => Err(e),
                None => Ok(ProviderResponse {
                    text: "casual".into(),
                }),
            }
        }
    }

    fn classifier() -> Classifier {
        Classifier::new(vec!["revenue".into(), "الإيرادات".into()])
    }

    fn credential() -> Credential {
        Credential::new("key-1", "secret")
    }

    #[tokio::test]
    async fn clear_cases_never_call_the_model() {
        let c = classifier();
        // No provider supplied at all: clear cases still classify.
        let data = c
            .classify("What was our revenue last quarter?", &[], None)
            .await
            .unwrap();
        assert_eq!(data.intent, Intent::DataQuery);
        assert_eq!(data.language, Language::English);
        assert!(!data.model_assisted);

        let casual = c.classify("هل يمكنك أن تروي لي نكتة؟", &[], None).await.unwrap();
        assert_eq!(casual.intent, Intent::Conversational);
        assert_eq!(casual.language, Language::Arabic);
        assert!(!casual.model_assisted);
    }

    #[tokio::test]
    async fn empty_input_is_conversational_without_model_call() {
        let c = classifier();
        let result = c.classify("   ", &[], None).await.unwrap();
        assert_eq!(result.intent, Intent::Conversational);
        assert_eq!(result.language, Language::Unknown);
        assert!(!result.model_assisted);
    }

    #[tokio::test]
    async fn inconclusive_input_uses_model_verdict() {
        let provider = ScriptedProvider::new(vec![Ok("data".into())]);
        let c = classifier();
        let cred = credential();
        let result = c
            .classify(
                "tell me about the company plans",
                &[],
                Some((&provider, &cred)),
            )
            .await
            .unwrap();
        assert_eq!(result.intent, Intent::DataQuery);
        assert!(result.model_assisted);
    }

    #[tokio::test]
    async fn inconclusive_without_provider_defaults_to_conversational() {
        let c = classifier();
        let result = c
            .classify("tell me about the company plans", &[], None)
            .await
            .unwrap();
        assert_eq!(result.intent, Intent::Conversational);
    }

    #[tokio::test]
    async fn provider_failure_surfaces_as_classification_unavailable() {
        let provider = ScriptedProvider::new(vec![Err(BayanError::Provider {
            kind: ProviderFailure::RateLimited,
            message: "429".into(),
            source: None,
        })]);
        let c = classifier();
        let cred = credential();
        let err = c
            .classify(
                "tell me about the company plans",
                &[],
                Some((&provider, &cred)),
            )
            .await
            .unwrap_err();
        match err {
            BayanError::ClassificationUnavailable { failure, .. } => {
                assert_eq!(failure, Some(ProviderFailure::RateLimited));
            }
            other => panic!("expected ClassificationUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn classification_is_deterministic_for_identical_input() {
        let c = classifier();
        let a = c
            .classify("What was our revenue last quarter?", &[], None)
            .await
            .unwrap();
        let b = c
            .classify("What was our revenue last quarter?", &[], None)
            .await
            .unwrap();
        assert_eq!(a, b);
    }
}
