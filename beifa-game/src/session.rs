use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::replay::RecordedAction;
use crate::rng::SessionRng;
use crate::state::GameState;
use crate::trace::TraceEntry;

/// One game's full persisted identity: state, generator, and audit trail.
///
/// A session is checked out of the store, mutated by exactly one operation,
/// and checked back in whole.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSession {
    pub state: GameState,
    pub rng: SessionRng,
    #[serde(default)]
    pub actions: Vec<RecordedAction>,
    #[serde(default)]
    pub diagnostics: Vec<TraceEntry>,
}

impl GameSession {
    /// Fresh session with its generator keyed from `seed`. No node entered yet.
    #[must_use]
    pub fn new(game_id: impl Into<String>, seed: u64) -> Self {
        Self {
            state: GameState::new(game_id, seed),
            rng: SessionRng::from_user_seed(seed),
            actions: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    #[must_use]
    pub fn game_id(&self) -> &str {
        &self.state.game_id
    }

    /// Append a diagnostics entry, dropping the oldest beyond `limit`.
    pub fn trace(&mut self, entry: TraceEntry, limit: usize) {
        self.diagnostics.push(entry);
        if self.diagnostics.len() > limit {
            let excess = self.diagnostics.len() - limit;
            self.diagnostics.drain(..excess);
        }
    }

    pub fn record(&mut self, action: &Action, turn: u32) {
        self.actions.push(RecordedAction {
            turn,
            action: action.kind(),
            payload: action.payload(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{TraceEvent, TraceLevel};

    #[test]
    fn trace_is_bounded() {
        let mut session = GameSession::new("s", 5);
        for _ in 0..5 {
            let entry = TraceEntry::new(TraceLevel::Debug, TraceEvent::Transition, &session.state);
            session.trace(entry, 3);
        }
        assert_eq!(session.diagnostics.len(), 3);
    }

    #[test]
    fn snapshot_resumes_generator_exactly() {
        let mut session = GameSession::new("s", 99);
        session.rng.unit();
        session.record(&Action::NextTurn, 1);
        let encoded = serde_json::to_string(&session).unwrap();
        let mut restored: GameSession = serde_json::from_str(&encoded).unwrap();
        assert_eq!(restored.actions, session.actions);
        assert_eq!(restored.rng.draws(), 1);
        assert_eq!(restored.rng.unit().to_bits(), session.rng.unit().to_bits());
    }
}
