//! Turn controller: the only code path that mutates a session.
//!
//! Every action runs as a single synchronous pass over a checked-out
//! [`GameSession`]: dispatch, follow any chained checks, then re-evaluate the
//! outcome overrides.

use log::{debug, info, warn};

use crate::action::{Action, ActionPayload};
use crate::checks;
use crate::conditions::evaluate;
use crate::config::EngineConfig;
use crate::constants::{
    CRISIS_CHECK_NODE_ID, CRISIS_NODE_ID, DEFEAT_NODE_ID, DOOM_BASE_GAIN, DOOM_HIGH_PRESSURE_AT,
    DOOM_LOW_FOOD_BELOW, DOOM_THRESHOLD, FLAG_CORE_LOST, FLAG_DOOM_CHAIN_ACTIVE,
    FLAG_POST_ZHUGE_ERA, GUANZHONG_HOLD_TURNS, HEALTH_ATTRITION_CHAPTER, MAX_FOOD_POST_ZHUGE,
    MAX_WEI_PRESSURE, MOMENTUM_LIMIT, POST_ZHUGE_DOOM_BONUS, POST_ZHUGE_POLITICS_DRAIN,
    POST_ZHUGE_PRESSURE_BUMP, ROUTE_PROGRESS_STEP_PER_TURN, WIN_NODE_ID,
};
use crate::court::{self, CourtResult, CourtStrategy};
use crate::effects::{Effects, apply_effects};
use crate::error::{EngineError, GraphError};
use crate::graph::{EventGraph, Node, NodeKind};
use crate::places::PlaceCatalog;
use crate::session::GameSession;
use crate::state::{EventOption, EventView, GameState, Outcome, Phase, Resource};
use crate::trace::{CheckTrace, TraceEntry, TraceEvent, TraceLevel, diff_states};

const OPENING_LOG: &str =
    "The chancellor marches north: secure Longyou first, then strike for Guanzhong.";

#[derive(Debug, Clone)]
pub struct TurnController {
    graph: EventGraph,
    catalog: PlaceCatalog,
    config: EngineConfig,
}

impl TurnController {
    #[must_use]
    pub const fn new(graph: EventGraph, catalog: PlaceCatalog, config: EngineConfig) -> Self {
        Self {
            graph,
            catalog,
            config,
        }
    }

    /// Bundled campaign, standard catalog, default tunables.
    ///
    /// # Errors
    ///
    /// Returns `GraphError` if the bundled campaign fails validation.
    pub fn standard() -> Result<Self, GraphError> {
        Ok(Self::new(
            EventGraph::standard()?,
            PlaceCatalog::standard(),
            EngineConfig::default(),
        ))
    }

    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub const fn graph(&self) -> &EventGraph {
        &self.graph
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build a new session and enter the start node.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::ContentCorruption` if the content leads to a
    /// missing node.
    pub fn start(&self, game_id: &str, seed: u64) -> Result<GameSession, EngineError> {
        let mut session = GameSession::new(game_id, seed);
        session.state.add_log(OPENING_LOG);
        let entry = TraceEntry::new(TraceLevel::Info, TraceEvent::GameStarted, &session.state)
            .with_message(format!("seed {seed}"));
        self.trace(&mut session, entry);
        let start = self.graph.start().to_string();
        self.transition(&mut session, &start)?;
        self.evaluate_outcome(&mut session)?;
        self.refresh_event_view(&mut session);
        info!("game {game_id} started with seed {seed}");
        Ok(session)
    }

    /// Open the court if the phase says a session should be running but none
    /// is. Returns whether the session was repaired.
    pub fn ensure_court_session(&self, session: &mut GameSession) -> bool {
        let state = &session.state;
        if !state.outcome.is_ongoing() || state.phase != Phase::Court || state.court.is_active {
            return false;
        }
        self.open_court(session);
        true
    }

    /// Parse and apply a named action.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidAction` for bad input and
    /// `EngineError::ContentCorruption` for broken content.
    pub fn execute(
        &self,
        session: &mut GameSession,
        name: &str,
        payload: &ActionPayload,
    ) -> Result<(), EngineError> {
        let action = Action::parse(name, payload)?;
        self.apply(session, &action)
    }

    /// Apply a parsed action. A finished game is left untouched.
    ///
    /// # Errors
    ///
    /// See [`TurnController::execute`].
    pub fn apply(&self, session: &mut GameSession, action: &Action) -> Result<(), EngineError> {
        self.ensure_court_session(session);
        if !session.state.outcome.is_ongoing() {
            return Ok(());
        }
        let before = session.state.clone();
        let kind = action.kind();

        match action {
            Action::ChooseOption { option_id } => {
                if session.state.court.is_active {
                    let strategy = CourtStrategy::from_legacy_option(option_id);
                    self.court_round(session, kind.as_str(), strategy, None)?;
                } else {
                    self.choose_option(session, option_id)?;
                }
            }
            Action::NextTurn => self.next_turn(session)?,
            Action::CourtStrategy { strategy } => {
                self.court_round(session, kind.as_str(), *strategy, None)?;
            }
            Action::CourtStatement { statement, hint } => {
                let strategy = hint.unwrap_or_else(|| {
                    court::infer_strategy(statement, &self.config.court.keywords)
                });
                self.court_round(session, kind.as_str(), strategy, Some(statement.as_str()))?;
            }
            Action::CourtFastForward => self.court_fast_forward(session)?,
        }

        self.evaluate_outcome(session)?;
        self.refresh_event_view(session);
        session.record(action, before.turn);
        let entry = TraceEntry::new(TraceLevel::Info, TraceEvent::Action, &session.state)
            .with_action(kind.as_str());
        self.trace(session, entry);
        let changes = diff_states(&before, &session.state);
        if !changes.is_empty() {
            let entry = TraceEntry::new(TraceLevel::Debug, TraceEvent::StateDiff, &session.state)
                .with_action(kind.as_str())
                .with_changes(changes);
            self.trace(session, entry);
        }
        Ok(())
    }

    fn choose_option(&self, session: &mut GameSession, option_id: &str) -> Result<(), EngineError> {
        let action = "choose_option";
        let node = self.node(&session.state.current_node_id)?;
        let NodeKind::Choice { options } = &node.kind else {
            return Err(EngineError::invalid(
                action,
                format!("node `{}` is not a choice", node.id),
            ));
        };
        let option = options
            .iter()
            .find(|opt| opt.id == option_id)
            .ok_or_else(|| EngineError::invalid(action, format!("unknown option `{option_id}`")))?;
        if !evaluate(option.condition.as_ref(), &session.state) {
            return Err(EngineError::invalid(
                action,
                format!("option `{option_id}` is not available"),
            ));
        }
        apply_effects(&mut session.state, &option.effects);
        self.transition(session, &option.next)
    }

    /// Convene the court when it is due, otherwise advance the turn.
    fn next_turn(&self, session: &mut GameSession) -> Result<(), EngineError> {
        if session.state.court.is_active {
            return self.court_fast_forward(session);
        }
        if court::should_trigger(&session.state, &self.config.court) {
            self.open_court(session);
            session.state.phase = Phase::Court;
            return Ok(());
        }
        self.advance_turn(session)
    }

    fn require_court(session: &GameSession, action: &str) -> Result<(), EngineError> {
        if session.state.court.is_active {
            Ok(())
        } else {
            Err(EngineError::invalid(action, "no court session is active"))
        }
    }

    fn court_round(
        &self,
        session: &mut GameSession,
        action: &str,
        strategy: CourtStrategy,
        statement: Option<&str>,
    ) -> Result<(), EngineError> {
        Self::require_court(session, action)?;
        let settled = court::resolve_round(
            &mut session.state,
            strategy,
            statement,
            &mut session.rng,
            &self.config.court,
        );
        let entry = TraceEntry::new(TraceLevel::Debug, TraceEvent::CourtRound, &session.state)
            .with_message(format!(
                "{strategy}: support {} temperature {}",
                session.state.court.support, session.state.court.temperature
            ));
        self.trace(session, entry);
        if settled {
            self.close_court(session, false)?;
        }
        Ok(())
    }

    fn court_fast_forward(&self, session: &mut GameSession) -> Result<(), EngineError> {
        Self::require_court(session, "court_fast_forward")?;
        let rounds_before = session.state.court.message_seq;
        court::fast_forward(&mut session.state, &mut session.rng, &self.config.court);
        let timed_out = session.state.court.last_resolution.as_ref().is_some_and(|resolution| {
            matches!(
                resolution.result,
                CourtResult::TimeoutPass | CourtResult::TimeoutFail
            )
        });
        debug!(
            "court fast-forward from message {rounds_before} to {}",
            session.state.court.message_seq
        );
        self.close_court(session, timed_out)
    }

    fn open_court(&self, session: &mut GameSession) {
        court::begin_session(&mut session.state, &mut session.rng);
        let entry = TraceEntry::new(TraceLevel::Info, TraceEvent::CourtOpened, &session.state)
            .with_message(format!("session {}", session.state.court.session_id));
        self.trace(session, entry);
    }

    /// Record a settlement and let the turn advance.
    fn close_court(&self, session: &mut GameSession, timed_out: bool) -> Result<(), EngineError> {
        let summary = session
            .state
            .court
            .last_resolution
            .as_ref()
            .map(|resolution| resolution.summary.clone())
            .unwrap_or_default();
        let event = if timed_out {
            warn!("court session {} ran out of time", session.state.court.session_id);
            TraceEvent::CourtTimeout
        } else {
            TraceEvent::CourtSettled
        };
        let entry = TraceEntry::new(TraceLevel::Info, event, &session.state).with_message(summary);
        self.trace(session, entry);
        self.advance_turn(session)
    }

    /// Advance one turn: doom, modifier drift, attrition, travel, crisis.
    fn advance_turn(&self, session: &mut GameSession) -> Result<(), EngineError> {
        let state = &mut session.state;
        state.turn += 1;

        let mut doom_gain = DOOM_BASE_GAIN;
        if state.food < DOOM_LOW_FOOD_BELOW {
            doom_gain += 1;
        }
        if state.wei_pressure >= DOOM_HIGH_PRESSURE_AT {
            doom_gain += 1;
        }
        if state.longyou_collapsed {
            doom_gain += 1;
        }
        if state.is_post_zhuge_era() {
            doom_gain += POST_ZHUGE_DOOM_BONUS;
            state.politics = (state.politics - POST_ZHUGE_POLITICS_DRAIN).max(0);
        }

        let tick = court::apply_turn_drift(state);
        let doom_gain = (doom_gain + tick.doom_delta).max(0);
        apply_effects(state, &Effects::from_delta([(Resource::Doom, doom_gain)]));
        state.add_log(format!("Turn {}: the war grinds on, doom +{doom_gain}.", state.turn));
        if let Some(title) = tick.expired {
            state.add_log(format!("Court orders expired: {title}."));
        }

        if state.chapter == HEALTH_ATTRITION_CHAPTER && !state.is_post_zhuge_era() {
            state.health = (state.health - 1).max(0);
            state.add_log("The Wuzhang stalemate drags on and the chancellor's health worsens.");
            self.trigger_era_transition(session);
        }

        let state = &mut session.state;
        if state.phase.is_travel() && state.active_route_id.is_some() {
            state.route_progress = (state.route_progress + ROUTE_PROGRESS_STEP_PER_TURN).min(1.0);
        }

        let entry = TraceEntry::new(TraceLevel::Debug, TraceEvent::TurnAdvanced, state)
            .with_message(format!("doom +{doom_gain}"));
        self.trace(session, entry);

        let state = &mut session.state;
        if state.doom >= DOOM_THRESHOLD && !state.flag(FLAG_DOOM_CHAIN_ACTIVE) {
            state.set_flag(FLAG_DOOM_CHAIN_ACTIVE, true);
            state.add_log("The realm is collapsing: Wei launches a total offensive.");
            let entry = TraceEntry::new(TraceLevel::Info, TraceEvent::CrisisForced, state);
            self.trace(session, entry);
            self.transition(session, CRISIS_NODE_ID)?;
        }
        Ok(())
    }

    /// Enter a node, open the court on phase entry, and follow checks.
    fn transition(&self, session: &mut GameSession, node_id: &str) -> Result<(), EngineError> {
        debug!("transition {} -> {node_id}", session.state.current_node_id);
        self.enter_node(session, node_id)?;
        let entry = TraceEntry::new(TraceLevel::Info, TraceEvent::Transition, &session.state);
        self.trace(session, entry);
        self.court_on_phase_entry(session);
        self.resolve_checks(session)
    }

    fn court_on_phase_entry(&self, session: &mut GameSession) {
        if session.state.phase == Phase::Court && !session.state.court.is_active {
            self.open_court(session);
        }
    }

    /// Apply a node's placement, overrides, terminal outcome, and event view.
    fn enter_node(&self, session: &mut GameSession, node_id: &str) -> Result<(), EngineError> {
        let node = self.node(node_id)?;
        let state = &mut session.state;
        state.current_node_id = node.id.clone();
        if let Some(chapter) = node.chapter {
            state.chapter = chapter;
        }
        if let Some(phase) = node.phase {
            state.phase = phase;
        }

        let meta = &node.meta;
        state.current_location = meta.location.clone();
        let mut controlled = std::mem::take(&mut state.controlled_locations);
        controlled.extend(meta.gain_control.iter().cloned());
        controlled.retain(|place| !meta.lose_control.contains(place));
        self.catalog.sort_places(&mut controlled);
        state.controlled_locations = controlled;

        if state.active_route_id != meta.route_id || meta.route_id.is_none() {
            state.route_progress = 0.0;
        }
        state.active_route_id.clone_from(&meta.route_id);

        if node.is_terminal() {
            if node.id == WIN_NODE_ID {
                state.outcome = Outcome::Win;
            } else if node.id == DEFEAT_NODE_ID {
                state.outcome = Outcome::DefeatShu;
            }
        }

        state.current_event = Self::event_view(node, state);
        Ok(())
    }

    fn event_view(node: &Node, state: &GameState) -> EventView {
        let options = match &node.kind {
            NodeKind::Choice { options } => options
                .iter()
                .map(|opt| EventOption {
                    id: opt.id.clone(),
                    label: opt.label.clone(),
                    disabled: !evaluate(opt.condition.as_ref(), state),
                })
                .collect(),
            _ => Vec::new(),
        };
        EventView {
            text: node.text.clone(),
            options,
        }
    }

    /// Recompute option guards against the state as it stands now.
    fn refresh_event_view(&self, session: &mut GameSession) {
        if let Some(node) = self.graph.node(&session.state.current_node_id) {
            session.state.current_event = Self::event_view(node, &session.state);
        }
    }

    /// Follow check nodes until a non-check node or a resolved outcome.
    fn resolve_checks(&self, session: &mut GameSession) -> Result<(), EngineError> {
        for _ in 0..self.config.check_chain_limit {
            if !session.state.outcome.is_ongoing() {
                return Ok(());
            }
            let node = self.node(&session.state.current_node_id)?;
            let NodeKind::Check {
                check,
                success_next,
                fail_next,
                success_effects,
                fail_effects,
            } = &node.kind
            else {
                return Ok(());
            };

            let state = &mut session.state;
            let roll = checks::roll(check, state, &mut session.rng);
            if !check.is_empty() {
                state.add_log(format!(
                    "Check [{check}]: {:.2} / {:.2}.",
                    roll.roll, roll.probability
                ));
            }
            debug!(
                "check {check} rolled {:.4} against {:.4}",
                roll.roll, roll.probability
            );

            let (effects, next, momentum_step) = if roll.success {
                (success_effects, success_next, 1)
            } else {
                (fail_effects, fail_next, -1)
            };
            apply_effects(state, effects);
            state.court.momentum =
                (state.court.momentum + momentum_step).clamp(-MOMENTUM_LIMIT, MOMENTUM_LIMIT);

            let adjustment = court::apply_check_outcome(state, roll.success);
            if !adjustment.is_zero() {
                state.add_log(format!(
                    "Court orders adjust the outcome: food {:+} / morale {:+} / doom {:+}.",
                    adjustment.food, adjustment.morale, adjustment.doom
                ));
            }

            let entry = TraceEntry::new(TraceLevel::Info, TraceEvent::CheckRolled, state).with_check(
                CheckTrace {
                    key: check.clone(),
                    probability: roll.probability,
                    roll: roll.roll,
                    success: roll.success,
                },
            );
            self.trace(session, entry);
            self.trigger_era_transition(session);

            let next = next.as_deref().ok_or_else(|| {
                EngineError::ContentCorruption(format!(
                    "check node `{}` has no {} target",
                    node.id,
                    if roll.success { "success" } else { "fail" }
                ))
            })?;
            self.enter_node(session, next)?;
            self.court_on_phase_entry(session);
            self.evaluate_outcome(session)?;
        }

        if self
            .graph
            .node(&session.state.current_node_id)
            .is_some_and(Node::is_check)
            && session.state.outcome.is_ongoing()
        {
            warn!(
                "check chain stopped at `{}` after {} steps",
                session.state.current_node_id, self.config.check_chain_limit
            );
            let entry = TraceEntry::new(TraceLevel::Warn, TraceEvent::CheckChainCapped, &session.state);
            self.trace(session, entry);
        }
        Ok(())
    }

    /// The one-time, permanent shift into the harsher late era.
    fn trigger_era_transition(&self, session: &mut GameSession) -> bool {
        let state = &mut session.state;
        if state.health > 0 || state.is_post_zhuge_era() {
            return false;
        }
        state.set_flag(FLAG_POST_ZHUGE_ERA, true);
        state.health = 0;
        state.food = state.food.min(MAX_FOOD_POST_ZHUGE);
        state.wei_pressure = (state.wei_pressure + POST_ZHUGE_PRESSURE_BUMP).min(MAX_WEI_PRESSURE);
        state.add_log("The chancellor has died at Wuzhang. The court grows weaker and more divided.");
        info!("game {} entered the late era on turn {}", state.game_id, state.turn);
        let entry = TraceEntry::new(TraceLevel::Info, TraceEvent::EraTransition, state);
        self.trace(session, entry);
        true
    }

    /// Outcome overrides, applied after every action.
    fn evaluate_outcome(&self, session: &mut GameSession) -> Result<(), EngineError> {
        if !session.state.outcome.is_ongoing() {
            return Ok(());
        }
        self.trigger_era_transition(session);

        let state = &mut session.state;
        let in_crisis = [CRISIS_NODE_ID, CRISIS_CHECK_NODE_ID, DEFEAT_NODE_ID]
            .contains(&state.current_node_id.as_str());
        let forced = if state.flag(FLAG_CORE_LOST) {
            Some(DEFEAT_NODE_ID)
        } else if state.guanzhong_turns >= GUANZHONG_HOLD_TURNS && !state.longyou_collapsed {
            Some(WIN_NODE_ID)
        } else if state.doom >= DOOM_THRESHOLD && !in_crisis {
            state.set_flag(FLAG_DOOM_CHAIN_ACTIVE, true);
            Some(CRISIS_NODE_ID)
        } else {
            None
        };

        if let Some(node_id) = forced {
            self.enter_node(session, node_id)?;
            let event = if session.state.outcome.is_ongoing() {
                TraceEvent::CrisisForced
            } else {
                info!(
                    "game {} resolved as {}",
                    session.state.game_id, session.state.outcome
                );
                TraceEvent::OutcomeResolved
            };
            let entry = TraceEntry::new(TraceLevel::Info, event, &session.state);
            self.trace(session, entry);
        }
        Ok(())
    }

    fn node(&self, node_id: &str) -> Result<&Node, EngineError> {
        self.graph
            .node(node_id)
            .ok_or_else(|| EngineError::ContentCorruption(format!("node `{node_id}` does not exist")))
    }

    fn trace(&self, session: &mut GameSession, entry: TraceEntry) {
        session.trace(entry, self.config.diagnostics_limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> TurnController {
        TurnController::standard().expect("bundled campaign validates")
    }

    fn started(seed: u64) -> (TurnController, GameSession) {
        let controller = controller();
        let session = controller.start("t-1", seed).unwrap();
        (controller, session)
    }

    #[test]
    fn start_enters_opening_choice() {
        let (_, session) = started(7);
        let state = &session.state;
        assert_eq!(state.current_node_id, "ch1_start");
        assert_eq!(state.log.first().map(String::as_str), Some(OPENING_LOG));
        assert_eq!(state.current_event.enabled_options().count(), 3);
        assert_eq!(state.roll_count, 0);
        assert!(session.actions.is_empty());
    }

    #[test]
    fn choosing_an_option_applies_effects_and_moves() {
        let (controller, mut session) = started(7);
        controller
            .execute(&mut session, "choose_option", &ActionPayload::option("wood_ox"))
            .unwrap();
        let state = &session.state;
        assert_eq!(state.current_node_id, "ch1_march");
        assert_eq!(state.food, 122);
        assert!(state.flag("wood_ox_done"));
        assert_eq!(state.current_location, "hanzhong");
        assert_eq!(state.active_route_id.as_deref(), Some("hanzhong_to_jieting"));
        assert_eq!(session.actions.len(), 1);
    }

    #[test]
    fn unknown_option_is_rejected_without_recording() {
        let (controller, mut session) = started(7);
        let err = controller
            .execute(&mut session, "choose_option", &ActionPayload::option("nope"))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAction { .. }));
        assert!(session.actions.is_empty());
        assert_eq!(session.state.current_node_id, "ch1_start");
    }

    #[test]
    fn next_turn_on_turn_one_advances_doom() {
        let (controller, mut session) = started(7);
        controller.apply(&mut session, &Action::NextTurn).unwrap();
        assert_eq!(session.state.turn, 2);
        assert_eq!(session.state.doom, 1);
        assert!(!session.state.court.is_active);
    }

    #[test]
    fn court_convenes_when_due_and_settles_on_fast_forward() {
        let (controller, mut session) = started(11);
        session.state.turn = 4;
        controller.apply(&mut session, &Action::NextTurn).unwrap();
        assert!(session.state.court.is_active);
        assert_eq!(session.state.phase, Phase::Court);
        assert_eq!(session.state.turn, 4);

        controller.apply(&mut session, &Action::CourtFastForward).unwrap();
        assert!(!session.state.court.is_active);
        assert_eq!(session.state.phase, Phase::Campaign);
        assert_eq!(session.state.turn, 5);
        assert!(session.state.court.active_modifier.is_some());
    }

    #[test]
    fn court_actions_need_an_open_session() {
        let (controller, mut session) = started(7);
        let err = controller
            .apply(
                &mut session,
                &Action::CourtStrategy {
                    strategy: CourtStrategy::RationalArgument,
                },
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAction { .. }));
        assert!(matches!(
            controller.apply(&mut session, &Action::CourtFastForward),
            Err(EngineError::InvalidAction { .. })
        ));
    }

    #[test]
    fn finished_game_ignores_actions() {
        let (controller, mut session) = started(7);
        session.state.outcome = Outcome::Win;
        controller.apply(&mut session, &Action::NextTurn).unwrap();
        assert_eq!(session.state.turn, 1);
        assert!(session.actions.is_empty());
    }

    #[test]
    fn health_loss_in_chapter_four_starts_late_era() {
        let (controller, mut session) = started(7);
        session.state.chapter = 4;
        session.state.health = 1;
        session.state.food = 150;
        controller.apply(&mut session, &Action::NextTurn).unwrap();
        let state = &session.state;
        assert!(state.is_post_zhuge_era());
        assert_eq!(state.health, 0);
        assert!(state.food <= MAX_FOOD_POST_ZHUGE);
        assert_eq!(state.wei_pressure, 3);
    }

    #[test]
    fn doom_threshold_forces_the_crisis_node() {
        let (controller, mut session) = started(7);
        session.state.doom = DOOM_THRESHOLD - 1;
        controller.apply(&mut session, &Action::NextTurn).unwrap();
        let state = &session.state;
        assert_eq!(state.current_node_id, CRISIS_NODE_ID);
        assert_eq!(state.phase, Phase::Defense);
        assert!(state.flag(FLAG_DOOM_CHAIN_ACTIVE));
    }

    #[test]
    fn outcome_overrides_resolve_the_game() {
        let (controller, mut session) = started(7);
        session.state.set_flag(FLAG_CORE_LOST, true);
        controller
            .execute(&mut session, "choose_option", &ActionPayload::option("march_now"))
            .unwrap();
        assert_eq!(session.state.outcome, Outcome::DefeatShu);
        assert_eq!(session.state.current_node_id, DEFEAT_NODE_ID);

        let (controller, mut session) = started(7);
        session.state.guanzhong_turns = GUANZHONG_HOLD_TURNS;
        controller.apply(&mut session, &Action::NextTurn).unwrap();
        assert_eq!(session.state.outcome, Outcome::Win);
    }

    #[test]
    fn stray_court_phase_is_repaired() {
        let (controller, mut session) = started(7);
        session.state.phase = Phase::Court;
        assert!(controller.ensure_court_session(&mut session));
        assert!(session.state.court.is_active);
        assert!(!controller.ensure_court_session(&mut session));
    }
}
