//! Structured per-session diagnostics.
//!
//! The trace is bounded, serialized with the session, and returned alongside
//! the action list by replay queries.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::GameState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceLevel {
    Debug,
    Info,
    Warn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceEvent {
    GameStarted,
    Action,
    Transition,
    CheckRolled,
    CheckChainCapped,
    TurnAdvanced,
    EraTransition,
    CrisisForced,
    CourtOpened,
    CourtRound,
    CourtSettled,
    CourtTimeout,
    OutcomeResolved,
    StateDiff,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckTrace {
    pub key: String,
    pub probability: f64,
    pub roll: f64,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub level: TraceLevel,
    pub event: TraceEvent,
    pub turn: u32,
    pub node_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<CheckTrace>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl TraceEntry {
    #[must_use]
    pub fn new(level: TraceLevel, event: TraceEvent, state: &GameState) -> Self {
        Self {
            level,
            event,
            turn: state.turn,
            node_id: state.current_node_id.clone(),
            action: None,
            check: None,
            changes: Vec::new(),
            message: String::new(),
        }
    }

    #[must_use]
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    #[must_use]
    pub fn with_check(mut self, check: CheckTrace) -> Self {
        self.check = Some(check);
        self
    }

    #[must_use]
    pub fn with_changes(mut self, changes: Vec<String>) -> Self {
        self.changes = changes;
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

/// Fields left out of state diffs: bulky, or changing on every action.
const DIFF_SKIP: [&str; 4] = ["log", "current_event", "court", "roll_count"];

/// Summarize top-level field changes between two states as `field: a -> b`.
#[must_use]
pub fn diff_states(before: &GameState, after: &GameState) -> Vec<String> {
    let (Ok(Value::Object(before)), Ok(Value::Object(after))) =
        (serde_json::to_value(before), serde_json::to_value(after))
    else {
        return Vec::new();
    };
    let mut changes = Vec::new();
    for (field, new_value) in &after {
        if DIFF_SKIP.contains(&field.as_str()) {
            continue;
        }
        match before.get(field) {
            Some(old_value) if old_value == new_value => {}
            Some(old_value) => changes.push(format!("{field}: {old_value} -> {new_value}")),
            None => changes.push(format!("{field}: {new_value}")),
        }
    }
    if before.get("court").and_then(|court| court.get("is_active"))
        != after.get("court").and_then(|court| court.get("is_active"))
    {
        changes.push("court.is_active toggled".to_string());
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_lists_changed_fields_only() {
        let before = GameState::new("t", 1);
        let mut after = before.clone();
        after.food -= 5;
        after.turn += 1;
        after.add_log("noise");
        let changes = diff_states(&before, &after);
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().any(|line| line == "food: 110 -> 105"));
        assert!(changes.iter().any(|line| line == "turn: 1 -> 2"));
    }

    #[test]
    fn diff_notes_court_toggle() {
        let before = GameState::new("t", 1);
        let mut after = before.clone();
        after.court.is_active = true;
        assert_eq!(diff_states(&before, &after), vec!["court.is_active toggled"]);
    }

    #[test]
    fn builder_fills_context() {
        let mut state = GameState::new("t", 1);
        state.current_node_id = "ch1_start".into();
        let entry = TraceEntry::new(TraceLevel::Info, TraceEvent::Action, &state)
            .with_action("next_turn")
            .with_message("advance");
        assert_eq!(entry.node_id, "ch1_start");
        assert_eq!(entry.action.as_deref(), Some("next_turn"));
        let encoded = serde_json::to_value(&entry).unwrap();
        assert_eq!(encoded["event"], "action");
        assert!(encoded.get("check").is_none());
    }
}
