// SPDX-FileCopyrightText: 2026 Bayan Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-turn state machine types.
//!
//! Each turn moves `Received -> Classifying -> {Planning -> Executing ->
//! Composing} | Composing -> Delivered | Failed`. `Delivered` and `Failed`
//! are terminal; `Failed` carries only a user-safe message outward, never
//! internal diagnostics.

use bayan_core::types::{Language, ResponseKind, SessionId, TurnId, TurnStatus};

/// States in the turn FSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// Message received, nothing decided yet.
    Received,
    /// Detecting language and intent.
    Classifying,
    /// Mapping the utterance to a structured query.
    Planning,
    /// Running the structured query against the warehouse.
    Executing,
    /// Producing the final response text.
    Composing,
    /// Terminal: a response was delivered.
    Delivered,
    /// Terminal: the turn failed with a user-safe message.
    Failed,
}

impl std::fmt::Display for TurnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnState::Received => write!(f, "received"),
            TurnState::Classifying => write!(f, "classifying"),
            TurnState::Planning => write!(f, "planning"),
            TurnState::Executing => write!(f, "executing"),
            TurnState::Composing => write!(f, "composing"),
            TurnState::Delivered => write!(f, "delivered"),
            TurnState::Failed => write!(f, "failed"),
        }
    }
}

/// What the presentation layer gets back for one turn.
#[derive(Debug, Clone)]
pub struct TurnReport {
    pub turn_id: TurnId,
    pub session_id: SessionId,
    pub response: String,
    pub status: TurnStatus,
    pub kind: ResponseKind,
    pub language: Language,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_state_display() {
        assert_eq!(TurnState::Received.to_string(), "received");
        assert_eq!(TurnState::Classifying.to_string(), "classifying");
        assert_eq!(TurnState::Planning.to_string(), "planning");
        assert_eq!(TurnState::Executing.to_string(), "executing");
        assert_eq!(TurnState::Composing.to_string(), "composing");
        assert_eq!(TurnState::Delivered.to_string(), "delivered");
        assert_eq!(TurnState::Failed.to_string(), "failed");
    }

    #[test]
    fn turn_state_equality() {
        assert_eq!(TurnState::Received, TurnState::Received);
        assert_ne!(TurnState::Delivered, TurnState::Failed);
    }
}
