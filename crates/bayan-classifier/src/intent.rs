// SPDX-FileCopyrightText: 2026 Bayan Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic intent scoring.
//!
//! Scores utterances toward `DataQuery` or `Conversational` using zero-cost
//! pattern rules in both supported languages. Clear cases never reach the
//! model; everything else is reported as inconclusive so the caller can
//! decide whether to spend a model call.

use bayan_core::Intent;

/// Casual openers and acknowledgements (exact match, case-insensitive).
const CASUAL_EXACT: &[&str] = &[
    "hi", "hello", "hey", "thanks", "thank you", "bye", "ok", "okay", "yes", "no",
    "good morning", "good evening",
    "مرحبا", "أهلا", "اهلا", "شكرا", "مع السلامة", "نعم", "لا", "صباح الخير", "مساء الخير",
];

/// Casual content patterns (contains, case-insensitive).
const CASUAL_INDICATORS: &[&str] = &[
    "joke", "how are you", "who are you", "your name", "how old are you",
    "tell me about yourself",
    "نكتة", "كيف حالك", "من أنت", "ما اسمك", "كم عمرك",
];

/// Question shapes that ask for figures (contains, case-insensitive).
const DATA_INDICATORS: &[&str] = &[
    "how much", "how many", "what was", "what were", "show me", "total",
    "average", "top", "trend", "compare", "breakdown", "by region", "by product",
    "كم", "ما هو إجمالي", "ما هي", "أظهر", "اعرض", "متوسط", "إجمالي", "مقارنة", "الأعلى",
];

/// Relative/absolute time expressions (contains, case-insensitive).
const TIME_INDICATORS: &[&str] = &[
    "last quarter", "this quarter", "last month", "this month", "last year",
    "this year", "q1", "q2", "q3", "q4",
    "الربع الماضي", "الربع الحالي", "الشهر الماضي", "هذا الشهر", "السنة الماضية",
    "هذه السنة", "العام الماضي",
];

/// Verdict of the heuristic pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeuristicVerdict {
    /// The heuristics are confident.
    Decided {
        intent: Intent,
        confidence: f32,
        reason: &'static str,
    },
    /// Neither clearly data-related nor clearly casual.
    Inconclusive,
}

/// Heuristic intent scorer over fixed pattern tables plus the catalog's
/// metric/dimension vocabulary.
pub struct IntentScorer {
    /// Lowercased catalog aliases. A hit is the strongest data signal.
    vocabulary: Vec<String>,
}

impl IntentScorer {
    pub fn new(vocabulary: Vec<String>) -> Self {
        let vocabulary = vocabulary
            .into_iter()
            .map(|v| v.to_lowercase())
            .collect();
        Self { vocabulary }
    }

    /// Score an utterance's intent using heuristic signals.
    ///
    /// `recent` holds the last few utterances of the session; a data-heavy
    /// recent context nudges short follow-ups ("and this month?") toward
    /// `DataQuery`.
    pub fn score(&self, utterance: &str, recent: &[&str]) -> HeuristicVerdict {
        let trimmed = utterance.trim();
        if trimmed.is_empty() {
            return HeuristicVerdict::Decided {
                intent: Intent::Conversational,
                confidence: 1.0,
                reason: "empty utterance",
            };
        }

        let lower = trimmed.to_lowercase();
        let mut score: i32 = 0;

        // Signal 1: casual exact match
        if CASUAL_EXACT.iter().any(|p| lower == *p) {
            score -= 3;
        }

        // Signal 2: casual content patterns
        if CASUAL_INDICATORS.iter().any(|p| lower.contains(p)) {
            score -= 3;
        }

        // Signal 3: data question shapes
        if DATA_INDICATORS.iter().any(|p| lower.contains(p)) {
            score += 2;
        }

        // Signal 4: catalog vocabulary hit
        if self.vocabulary.iter().any(|v| lower.contains(v.as_str())) {
            score += 3;
        }

        // Signal 5: time expressions
        if TIME_INDICATORS.iter().any(|p| lower.contains(p)) {
            score += 1;
        }

        // Signal 6: very short input leans casual
        if trimmed.split_whitespace().count() <= 2 {
            score -= 1;
        }

        // Signal 7: conversation momentum
        score += Self::momentum_score(recent);

        self.verdict(score)
    }

    /// Momentum: two or more of the last three utterances carrying data
    /// signals bias the current one up by a point.
    fn momentum_score(recent: &[&str]) -> i32 {
        let limit = recent.len().min(3);
        let window = &recent[recent.len() - limit..];
        let data_count = window
            .iter()
            .filter(|u| {
                let lower = u.to_lowercase();
                DATA_INDICATORS.iter().any(|p| lower.contains(p))
                    || TIME_INDICATORS.iter().any(|p| lower.contains(p))
            })
            .count();
        if data_count >= 2 { 1 } else { 0 }
    }

    fn verdict(&self, score: i32) -> HeuristicVerdict {
        if score >= 2 {
            HeuristicVerdict::Decided {
                intent: Intent::DataQuery,
                confidence: (score as f32 / 6.0).min(1.0),
                reason: "data query indicators",
            }
        } else if score <= -2 {
            HeuristicVerdict::Decided {
                intent: Intent::Conversational,
                confidence: ((-score) as f32 / 6.0).min(1.0),
                reason: "casual indicators",
            }
        } else {
            HeuristicVerdict::Inconclusive
        }
    }
}
