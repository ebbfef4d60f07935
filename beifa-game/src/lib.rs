//! Beifa Campaign Engine
//!
//! Platform-agnostic core for the Beifa northern-expedition campaign: a
//! deterministic event-graph traverser with an embedded court negotiation.
//! This crate performs no network or disk I/O. Persistence and dialogue
//! voicing are supplied by the caller through [`SessionStore`] and
//! [`DialogueService`].

pub mod action;
pub mod checks;
pub mod conditions;
pub mod config;
pub mod constants;
pub mod court;
pub mod dialogue;
pub mod effects;
pub mod error;
pub mod graph;
pub mod numbers;
pub mod places;
pub mod replay;
pub mod rng;
pub mod session;
pub mod state;
pub mod store;
pub mod trace;
pub mod turn;

use log::info;
use rand::Rng;
use std::cell::Cell;

// Re-export commonly used types
pub use action::{Action, ActionKind, ActionPayload};
pub use checks::{CheckRoll, base_probability, probability};
pub use conditions::{Condition, evaluate};
pub use config::{ConfigError, CourtConfig, EngineConfig, StatementKeywords};
pub use court::{
    BattleModifier, CourtMessage, CourtResolution, CourtResult, CourtState, CourtStrategy,
    MessageScene, NpcState,
};
pub use dialogue::{
    DialogueError, DialogueRequest, DialogueService, GuardedDialogue, LineGenerator,
    ScriptedDialogue,
};
pub use effects::{Effects, apply_effects, clamp_state};
pub use error::{EngineError, GraphError};
pub use graph::{EventGraph, GraphDocument, Node, NodeKind};
pub use places::PlaceCatalog;
pub use replay::{RecordedAction, ReplayView, replay_actions, state_digest};
pub use rng::{RngSnapshot, SessionRng};
pub use session::GameSession;
pub use state::{EventOption, EventView, GameState, Outcome, Phase, Resource};
pub use store::{MemoryStore, MemoryStoreError};
pub use trace::{TraceEntry, TraceEvent, TraceLevel};
pub use turn::TurnController;

/// Largest seed drawn when a new game is started without one.
pub const MAX_GENERATED_SEED: u64 = (1 << 31) - 1;

/// Trait for abstracting session persistence.
/// Platform-specific implementations should provide this
///
/// Sessions are whole snapshots: the engine checks one out with `get`,
/// mutates it in memory, and writes it back with `save`. Atomicity of a
/// single `save` is the store's responsibility.
pub trait SessionStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist a brand-new session.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is already taken or the write fails.
    fn create(&self, session: &GameSession) -> Result<(), Self::Error>;

    /// Check out a session by game id.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored snapshot cannot be read.
    fn get(&self, game_id: &str) -> Result<Option<GameSession>, Self::Error>;

    /// Replace an existing session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session was never created or the write fails.
    fn save(&self, session: &GameSession) -> Result<(), Self::Error>;

    /// Drop one session, or every session when `game_id` is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be cleared.
    fn reset(&self, game_id: Option<&str>) -> Result<(), Self::Error>;
}

fn store_error<E>(err: E) -> EngineError
where
    E: std::error::Error + Send + Sync + 'static,
{
    EngineError::Store(Box::new(err))
}

/// Main game engine: the action surface over a store and a dialogue voice.
///
/// The engine holds no per-game state of its own; callers must serialize
/// operations against any one game id.
pub struct GameEngine<S, D = ScriptedDialogue>
where
    S: SessionStore,
    D: DialogueService,
{
    controller: TurnController,
    store: S,
    dialogue: D,
    next_serial: Cell<u64>,
}

impl<S: SessionStore> GameEngine<S> {
    /// Engine over the bundled campaign with scripted dialogue.
    ///
    /// # Errors
    ///
    /// Returns `GraphError` if the bundled campaign fails validation.
    pub fn standard(store: S) -> Result<Self, GraphError> {
        Ok(Self::new(TurnController::standard()?, store))
    }

    #[must_use]
    pub const fn new(controller: TurnController, store: S) -> Self {
        Self {
            controller,
            store,
            dialogue: ScriptedDialogue,
            next_serial: Cell::new(0),
        }
    }
}

impl<S, D> GameEngine<S, D>
where
    S: SessionStore,
    D: DialogueService,
{
    /// Swap the dialogue voice used for court reaction lines.
    #[must_use]
    pub fn with_dialogue<V: DialogueService>(self, dialogue: V) -> GameEngine<S, V> {
        GameEngine {
            controller: self.controller,
            store: self.store,
            dialogue,
            next_serial: self.next_serial,
        }
    }

    #[must_use]
    pub const fn controller(&self) -> &TurnController {
        &self.controller
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Start a game under the next free `game-NNNN` id. Without a seed, one
    /// is drawn from OS entropy.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Store` if the store rejects the new session, or
    /// `EngineError::ContentCorruption` for broken content.
    pub fn new_game(&self, seed: Option<u64>) -> Result<GameState, EngineError> {
        let seed = seed.unwrap_or_else(|| rand::thread_rng().gen_range(1..=MAX_GENERATED_SEED));
        let game_id = loop {
            let serial = self.next_serial.get() + 1;
            self.next_serial.set(serial);
            let candidate = format!("game-{serial:04}");
            if self.store.get(&candidate).map_err(store_error)?.is_none() {
                break candidate;
            }
        };
        self.new_game_with_id(&game_id, seed)
    }

    /// Start a game under a caller-chosen id.
    ///
    /// # Errors
    ///
    /// See [`GameEngine::new_game`].
    pub fn new_game_with_id(&self, game_id: &str, seed: u64) -> Result<GameState, EngineError> {
        let mut session = self.controller.start(game_id, seed)?;
        self.voice_court_lines(&mut session, (0, 0), None);
        self.store.create(&session).map_err(store_error)?;
        info!(
            "new game {game_id} at node {}",
            session.state.current_node_id
        );
        Ok(session.state)
    }

    /// Current state, opening a court session first if one is pending.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotFound` for an unknown id.
    pub fn get_state(&self, game_id: &str) -> Result<GameState, EngineError> {
        let mut session = self.checkout(game_id)?;
        self.heal(&mut session)?;
        Ok(session.state)
    }

    /// Apply one action and persist the result. A failed action leaves the
    /// stored session as it was.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotFound` for an unknown id,
    /// `EngineError::InvalidAction` for a bad action or payload, and
    /// `EngineError::ContentCorruption` for broken content.
    pub fn act(
        &self,
        game_id: &str,
        action: &str,
        payload: &ActionPayload,
    ) -> Result<GameState, EngineError> {
        let mut session = self.checkout(game_id)?;
        self.heal(&mut session)?;
        let action = Action::parse(action, payload)?;
        let mark = (
            session.state.court.session_id,
            session.state.court.message_seq,
        );
        self.controller.apply(&mut session, &action)?;
        let statement = match &action {
            Action::CourtStatement { statement, .. } => Some(statement.as_str()),
            _ => None,
        };
        self.voice_court_lines(&mut session, mark, statement);
        self.store.save(&session).map_err(store_error)?;
        Ok(session.state)
    }

    /// Drop one game, or every game.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Store` if the store cannot be cleared.
    pub fn reset(&self, game_id: Option<&str>) -> Result<(), EngineError> {
        self.store.reset(game_id).map_err(store_error)?;
        if game_id.is_none() {
            self.next_serial.set(0);
        }
        Ok(())
    }

    /// Seed, recorded actions, and diagnostics trace for one game.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotFound` for an unknown id.
    pub fn get_replay(&self, game_id: &str) -> Result<ReplayView, EngineError> {
        self.checkout(game_id).map(|session| ReplayView::from(&session))
    }

    /// Rebuild a stored game from its seed and actions and compare digests.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotFound` for an unknown id, or any error the
    /// rebuild raises.
    pub fn verify_replay(&self, game_id: &str) -> Result<bool, EngineError> {
        let session = self.checkout(game_id)?;
        let rebuilt = replay_actions(
            &self.controller,
            game_id,
            session.state.seed,
            &session.actions,
        )?;
        Ok(state_digest(&rebuilt.state) == state_digest(&session.state))
    }

    fn checkout(&self, game_id: &str) -> Result<GameSession, EngineError> {
        self.store
            .get(game_id)
            .map_err(store_error)?
            .ok_or_else(|| EngineError::NotFound(game_id.to_string()))
    }

    fn heal(&self, session: &mut GameSession) -> Result<(), EngineError> {
        if self.controller.ensure_court_session(session) {
            self.voice_court_lines(session, (0, 0), None);
            self.store.save(session).map_err(store_error)?;
        }
        Ok(())
    }

    /// Pass every minister line newer than `mark` through the dialogue voice.
    fn voice_court_lines(
        &self,
        session: &mut GameSession,
        mark: (u32, u32),
        statement: Option<&str>,
    ) {
        let state = &session.state;
        let court = &state.court;
        let voiced: Vec<(usize, String)> = court
            .pending_messages
            .iter()
            .enumerate()
            .filter(|(_, message)| (message.session_id, message.seq) > mark)
            .filter_map(|(index, message)| {
                let npc = court.npc(&message.speaker_id)?;
                let request = DialogueRequest {
                    state,
                    npc,
                    fallback: &message.text,
                    strategy: court.last_strategy,
                    scene: message.scene,
                    statement,
                };
                Some((index, self.dialogue.voice(&request)))
            })
            .collect();
        for (index, text) in voiced {
            if let Some(message) = session.state.court.pending_messages.get_mut(index) {
                message.text = text;
            }
        }
    }
}
