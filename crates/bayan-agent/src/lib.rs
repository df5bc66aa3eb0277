// SPDX-FileCopyrightText: 2026 Bayan Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session orchestration for the Bayan assistant.
//!
//! The [`SessionOrchestrator`] sequences one turn through the pipeline:
//! classify, then either plan/execute/compose (data branch) or compose
//! directly (conversational branch). It is the sole caller of the credential
//! pool's `release`, and every turn runs inside a spawned task so the
//! release happens even when the presentation layer abandons the turn
//! mid-flight.
//!
//! Every turn resolves to exactly one of {conversational response, data
//! response, error response}; no turn is left unresolved and no error kind
//! crosses the presentation boundary with internal diagnostics attached.

pub mod turn;

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use bayan_classifier::{detect_language, Classifier};
use bayan_composer::Composer;
use bayan_config::model::BayanConfig;
use bayan_core::types::{
    Credential, Intent, Language, ResponseKind, SessionId, StructuredQuery, TurnId,
    TurnRecord, TurnStatus,
};
use bayan_core::{BayanError, ProviderAdapter, ProviderFailure, WarehouseAdapter};
use bayan_planner::{Catalog, QueryPlanner};
use bayan_pool::{CredentialPool, PoolStats, ReleaseOutcome};
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub use turn::{TurnReport, TurnState};

/// Orchestrates turns across sessions. Cheap to clone; all state is shared.
#[derive(Clone)]
pub struct SessionOrchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    pool: CredentialPool,
    provider: Arc<dyn ProviderAdapter>,
    warehouse: Arc<dyn WarehouseAdapter>,
    classifier: Classifier,
    planner: QueryPlanner,
    composer: Composer,
    stage_timeout: Duration,
    history_window: usize,
    sessions: Mutex<HashMap<String, VecDeque<TurnRecord>>>,
}

/// How one turn resolved, before bookkeeping.
struct Resolution {
    status: TurnStatus,
    kind: ResponseKind,
    intent: Option<Intent>,
    query: Option<StructuredQuery>,
    response: String,
    outcome: ReleaseOutcome,
}

impl SessionOrchestrator {
    pub fn new(
        config: &BayanConfig,
        provider: Arc<dyn ProviderAdapter>,
        warehouse: Arc<dyn WarehouseAdapter>,
    ) -> Result<Self, BayanError> {
        let catalog = Catalog::from_config(&config.catalog)?;
        let classifier = Classifier::new(catalog.vocabulary());
        let planner = QueryPlanner::new(catalog.clone());
        let composer = Composer::new(config.composer.clone(), catalog);
        let pool = CredentialPool::from_config(&config.pool, &config.gemini.api_keys);

        Ok(Self {
            inner: Arc::new(Inner {
                pool,
                provider,
                warehouse,
                classifier,
                planner,
                composer,
                stage_timeout: Duration::from_secs(config.agent.stage_timeout_secs),
                history_window: config.agent.history_window,
                sessions: Mutex::new(HashMap::new()),
            }),
        })
    }

    /// Process one utterance for a session and return the composed response
    /// plus turn status. Never fails: error outcomes become error responses.
    ///
    /// The turn runs in a spawned task, so a caller that drops this future
    /// cannot skip the credential release or the turn bookkeeping.
    pub async fn handle_message(&self, session_id: &str, utterance: &str) -> TurnReport {
        let inner = self.inner.clone();
        let session_id = session_id.to_string();
        let utterance = utterance.to_string();

        let handle =
            tokio::spawn(async move { inner.process(session_id, utterance).await });

        match handle.await {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "turn task panicked or was aborted");
                TurnReport {
                    turn_id: TurnId(uuid::Uuid::new_v4().to_string()),
                    session_id: SessionId(String::new()),
                    response: Composer::fallback_reply(Language::Unknown),
                    status: TurnStatus::Failed,
                    kind: ResponseKind::Error,
                    language: Language::Unknown,
                }
            }
        }
    }

    /// Completed turns for a session, oldest first.
    pub async fn history(&self, session_id: &str) -> Vec<TurnRecord> {
        self.inner
            .sessions
            .lock()
            .await
            .get(session_id)
            .map(|turns| turns.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Credential pool occupancy, for diagnostics.
    pub async fn pool_stats(&self) -> PoolStats {
        self.inner.pool.stats().await
    }
}

impl Inner {
    async fn process(self: Arc<Self>, session_id: String, utterance: String) -> TurnReport {
        let turn_id = TurnId(uuid::Uuid::new_v4().to_string());
        let mut state = TurnState::Received;
        debug!(session = session_id.as_str(), turn = turn_id.0.as_str(), %state, "turn started");

        let language = detect_language(&utterance);

        // Empty input never costs a credential or a model call.
        if utterance.trim().is_empty() {
            let resolution = Resolution {
                status: TurnStatus::Delivered,
                kind: ResponseKind::Conversational,
                intent: Some(Intent::Conversational),
                query: None,
                response: Composer::clarification_reply(language),
                outcome: ReleaseOutcome::Success,
            };
            return self
                .finish(turn_id, session_id, utterance, language, resolution)
                .await;
        }

        let credential = match self.pool.acquire().await {
            Ok(credential) => credential,
            Err(e) => {
                warn!(session = session_id.as_str(), error = %e, "turn failed before classification");
                let resolution = Resolution {
                    status: TurnStatus::Failed,
                    kind: ResponseKind::Error,
                    intent: None,
                    query: None,
                    response: Composer::fallback_reply(language),
                    outcome: ReleaseOutcome::Success,
                };
                return self
                    .finish(turn_id, session_id, utterance, language, resolution)
                    .await;
            }
        };

        let resolution = self
            .run_stages(&session_id, &turn_id, &utterance, language, &credential, &mut state)
            .await;

        // The single release point: every path through run_stages ends here.
        self.pool.release(&credential, resolution.outcome).await;

        self.finish(turn_id, session_id, utterance, language, resolution)
            .await
    }

    async fn run_stages(
        &self,
        session_id: &str,
        turn_id: &TurnId,
        utterance: &str,
        language: Language,
        credential: &Credential,
        state: &mut TurnState,
    ) -> Resolution {
        *state = TurnState::Classifying;
        debug!(turn = turn_id.0.as_str(), %state, "stage");

        let recent = self.recent_utterances(session_id).await;
        let recent_refs: Vec<&str> = recent.iter().map(String::as_str).collect();

        let classify = self.classifier.classify(
            utterance,
            &recent_refs,
            Some((self.provider.as_ref(), credential)),
        );
        let classification = match tokio::time::timeout(self.stage_timeout, classify).await {
            Ok(Ok(classification)) => classification,
            Ok(Err(e)) => {
                warn!(turn = turn_id.0.as_str(), error = %e, "classification unavailable");
                return Resolution {
                    status: TurnStatus::Delivered,
                    kind: ResponseKind::Error,
                    intent: None,
                    query: None,
                    response: Composer::fallback_reply(language),
                    outcome: outcome_of(e.provider_failure()),
                };
            }
            Err(_elapsed) => {
                return self.timed_out(turn_id, "classification", language);
            }
        };

        match classification.intent {
            Intent::Conversational => {
                *state = TurnState::Composing;
                debug!(turn = turn_id.0.as_str(), %state, "stage (conversational)");

                let compose = self.composer.conversational(
                    utterance,
                    language,
                    self.provider.as_ref(),
                    credential,
                );
                match tokio::time::timeout(self.stage_timeout, compose).await {
                    Ok(Ok(response)) => Resolution {
                        status: TurnStatus::Delivered,
                        kind: ResponseKind::Conversational,
                        intent: Some(Intent::Conversational),
                        query: None,
                        response,
                        outcome: ReleaseOutcome::Success,
                    },
                    Ok(Err(e)) => {
                        warn!(turn = turn_id.0.as_str(), error = %e, "conversational compose failed");
                        Resolution {
                            status: TurnStatus::Delivered,
                            kind: ResponseKind::Error,
                            intent: Some(Intent::Conversational),
                            query: None,
                            response: Composer::fallback_reply(language),
                            outcome: outcome_of(e.provider_failure()),
                        }
                    }
                    Err(_elapsed) => self.timed_out(turn_id, "composing", language),
                }
            }
            Intent::DataQuery => {
                *state = TurnState::Planning;
                debug!(turn = turn_id.0.as_str(), %state, "stage");

                let query =
                    match self.planner.plan(utterance, language, chrono::Utc::now()) {
                        Ok(query) => query,
                        Err(BayanError::UnknownEntity { term }) => {
                            debug!(turn = turn_id.0.as_str(), term = term.as_str(), "unknown entity");
                            return Resolution {
                                status: TurnStatus::Delivered,
                                kind: ResponseKind::Error,
                                intent: Some(Intent::DataQuery),
                                query: None,
                                response: self.composer.unknown_entity_reply(language),
                                outcome: ReleaseOutcome::Success,
                            };
                        }
                        Err(e) => {
                            warn!(turn = turn_id.0.as_str(), error = %e, "planning failed");
                            return Resolution {
                                status: TurnStatus::Failed,
                                kind: ResponseKind::Error,
                                intent: Some(Intent::DataQuery),
                                query: None,
                                response: Composer::fallback_reply(language),
                                outcome: ReleaseOutcome::Success,
                            };
                        }
                    };

                *state = TurnState::Executing;
                debug!(turn = turn_id.0.as_str(), %state, "stage");

                // The warehouse enforces its own hard timeout and single
                // retry; no extra bound is stacked on top here.
                let result = match self.warehouse.execute(&query).await {
                    Ok(result) => result,
                    Err(e) => {
                        warn!(turn = turn_id.0.as_str(), error = %e, "warehouse execution failed");
                        return Resolution {
                            status: TurnStatus::Failed,
                            kind: ResponseKind::Error,
                            intent: Some(Intent::DataQuery),
                            query: Some(query),
                            response: Composer::unavailable_reply(language),
                            outcome: ReleaseOutcome::Success,
                        };
                    }
                };

                *state = TurnState::Composing;
                debug!(turn = turn_id.0.as_str(), %state, "stage");

                let response = self.composer.data_answer(&result, language);
                Resolution {
                    status: TurnStatus::Delivered,
                    kind: ResponseKind::Data,
                    intent: Some(Intent::DataQuery),
                    query: Some(query),
                    response,
                    outcome: ReleaseOutcome::Success,
                }
            }
        }
    }

    /// A stage exceeded its bound. The credential is not blamed: there is no
    /// evidence against it, and cooling it down would shrink the pool for
    /// nothing.
    fn timed_out(&self, turn_id: &TurnId, stage: &str, language: Language) -> Resolution {
        let err = BayanError::Timeout {
            duration: self.stage_timeout,
        };
        warn!(turn = turn_id.0.as_str(), stage, error = %err, "stage timed out");
        Resolution {
            status: TurnStatus::Failed,
            kind: ResponseKind::Error,
            intent: None,
            query: None,
            response: Composer::fallback_reply(language),
            outcome: ReleaseOutcome::Success,
        }
    }

    async fn finish(
        &self,
        turn_id: TurnId,
        session_id: String,
        utterance: String,
        language: Language,
        resolution: Resolution,
    ) -> TurnReport {
        let state = match resolution.status {
            TurnStatus::Delivered => TurnState::Delivered,
            TurnStatus::Failed => TurnState::Failed,
        };
        debug!(
            session = session_id.as_str(),
            turn = turn_id.0.as_str(),
            %state,
            kind = %resolution.kind,
            "turn finished"
        );

        let record = TurnRecord {
            id: turn_id.clone(),
            session_id: SessionId(session_id.clone()),
            utterance,
            language,
            intent: resolution.intent,
            query: resolution.query,
            response: resolution.response.clone(),
            kind: resolution.kind,
            status: resolution.status,
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        {
            let mut sessions = self.sessions.lock().await;
            let history = sessions.entry(session_id.clone()).or_default();
            history.push_back(record);
            while history.len() > self.history_window {
                history.pop_front();
            }
        }

        TurnReport {
            turn_id,
            session_id: SessionId(session_id),
            response: resolution.response,
            status: resolution.status,
            kind: resolution.kind,
            language,
        }
    }

    async fn recent_utterances(&self, session_id: &str) -> Vec<String> {
        self.sessions
            .lock()
            .await
            .get(session_id)
            .map(|turns| turns.iter().map(|t| t.utterance.clone()).collect())
            .unwrap_or_default()
    }
}

/// Map a provider failure (if any) to the pool release outcome.
fn outcome_of(failure: Option<ProviderFailure>) -> ReleaseOutcome {
    match failure {
        Some(ProviderFailure::RateLimited) => ReleaseOutcome::RateLimited,
        Some(ProviderFailure::AuthFailed) => ReleaseOutcome::AuthFailed,
        Some(ProviderFailure::Transient) | Some(ProviderFailure::Other) => {
            ReleaseOutcome::Failed
        }
        None => ReleaseOutcome::Success,
    }
}
