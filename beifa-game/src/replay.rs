//! Action recording, deterministic replay, and state digests.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::hash::Hasher;
use twox_hash::XxHash64;

use crate::action::{Action, ActionKind, ActionPayload};
use crate::error::EngineError;
use crate::session::GameSession;
use crate::state::{GameState, Outcome, Phase};
use crate::trace::TraceEntry;
use crate::turn::TurnController;

/// One accepted action as stored in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedAction {
    /// Turn on which the action was issued.
    pub turn: u32,
    pub action: ActionKind,
    #[serde(default)]
    pub payload: ActionPayload,
}

impl RecordedAction {
    /// Rebuild the typed action.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidAction` if the stored payload no longer
    /// parses.
    pub fn to_action(&self) -> Result<Action, EngineError> {
        Action::parse(self.action.as_str(), &self.payload)
    }
}

/// Exported audit trail for one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayView {
    pub game_id: String,
    pub seed: u64,
    pub actions: Vec<RecordedAction>,
    pub diagnostics: Vec<TraceEntry>,
}

impl From<&GameSession> for ReplayView {
    fn from(session: &GameSession) -> Self {
        Self {
            game_id: session.state.game_id.clone(),
            seed: session.state.seed,
            actions: session.actions.clone(),
            diagnostics: session.diagnostics.clone(),
        }
    }
}

/// The fields that must match between two runs of the same seed and actions.
#[derive(Serialize)]
struct DigestView<'a> {
    node: &'a str,
    outcome: Outcome,
    phase: Phase,
    turn: u32,
    chapter: u8,
    food: i32,
    morale: i32,
    politics: i32,
    wei_pressure: i32,
    health: i32,
    doom: i32,
    longyou_turns: i32,
    guanzhong_turns: i32,
    longyou_collapsed: bool,
    roll_count: u64,
    flags: &'a BTreeMap<String, bool>,
    controlled: &'a [String],
    route_progress_bits: u64,
    court_session: u32,
    court_support: i32,
    court_temperature: i32,
    court_momentum: i32,
}

/// XxHash64 over the canonical JSON of the authoritative state fields.
#[must_use]
pub fn state_digest(state: &GameState) -> u64 {
    let view = DigestView {
        node: &state.current_node_id,
        outcome: state.outcome,
        phase: state.phase,
        turn: state.turn,
        chapter: state.chapter,
        food: state.food,
        morale: state.morale,
        politics: state.politics,
        wei_pressure: state.wei_pressure,
        health: state.health,
        doom: state.doom,
        longyou_turns: state.longyou_turns,
        guanzhong_turns: state.guanzhong_turns,
        longyou_collapsed: state.longyou_collapsed,
        roll_count: state.roll_count,
        flags: &state.flags,
        controlled: &state.controlled_locations,
        route_progress_bits: state.route_progress.to_bits(),
        court_session: state.court.session_id,
        court_support: state.court.support,
        court_temperature: state.court.temperature,
        court_momentum: state.court.momentum,
    };
    let bytes = serde_json::to_vec(&view).unwrap_or_default();
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(&bytes);
    hasher.finish()
}

/// Rebuild a game from its seed by re-running every recorded action.
///
/// # Errors
///
/// Propagates the first error raised by the controller; a faithful record
/// replays without error.
pub fn replay_actions(
    controller: &TurnController,
    game_id: &str,
    seed: u64,
    actions: &[RecordedAction],
) -> Result<GameSession, EngineError> {
    let mut session = controller.start(game_id, seed)?;
    for recorded in actions {
        let action = recorded.to_action()?;
        controller.apply(&mut session, &action)?;
    }
    Ok(session)
}
