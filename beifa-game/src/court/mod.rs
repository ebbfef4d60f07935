//! Court negotiation sub-simulation.
//!
//! A session opens when the campaign stalls or on a fixed cadence, runs a few
//! scored rounds against seven ministers, and settles into a temporary
//! [`BattleModifier`] that shapes the following turns.

mod roster;
mod session;
mod settlement;
mod strategy;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::CourtConfig;
use crate::constants::{
    COURT_CRITICAL_DOOM, COURT_CRITICAL_FOOD, COURT_CRITICAL_MOMENTUM, COURT_CRITICAL_MORALE,
};
use crate::state::{GameState, Phase};

pub use roster::default_roster;
pub use session::{begin_session, fast_forward, resolve_round};
pub use settlement::{
    CheckAdjustment, ModifierTick, apply_check_outcome, apply_turn_drift, classify_result,
    modifier_for_result, settle, should_settle,
};
pub use strategy::{StrategyProfile, auto_strategy, infer_strategy, profile, statement_bonus};

pub const PLAYER_SPEAKER_ID: &str = "player";
pub const SYSTEM_SPEAKER_ID: &str = "system";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourtStrategy {
    RationalArgument,
    AuthorityPressure,
    EmotionalMobilization,
}

impl CourtStrategy {
    pub const ALL: [Self; 3] = [
        Self::RationalArgument,
        Self::AuthorityPressure,
        Self::EmotionalMobilization,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RationalArgument => "rational_argument",
            Self::AuthorityPressure => "authority_pressure",
            Self::EmotionalMobilization => "emotional_mobilization",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::RationalArgument => "Reasoned Argument",
            Self::AuthorityPressure => "Chancellor's Authority",
            Self::EmotionalMobilization => "Rally the Hearts",
        }
    }

    /// Strategy behind the legacy court option ids.
    #[must_use]
    pub fn from_legacy_option(option_id: &str) -> Self {
        match option_id {
            "suppress_faction" => Self::AuthorityPressure,
            "ask_budget" => Self::EmotionalMobilization,
            _ => Self::RationalArgument,
        }
    }
}

impl fmt::Display for CourtStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown court strategy `{0}`")]
pub struct UnknownStrategy(pub String);

impl FromStr for CourtStrategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rational" | "reason" | "rational_argument" => Ok(Self::RationalArgument),
            "authority" | "pressure" | "authority_pressure" => Ok(Self::AuthorityPressure),
            "emotional" | "emotion" | "emotional_mobilization" => {
                Ok(Self::EmotionalMobilization)
            }
            other => Err(UnknownStrategy(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourtResult {
    Pass,
    Fail,
    TimeoutPass,
    TimeoutFail,
}

impl CourtResult {
    #[must_use]
    pub const fn is_pass(self) -> bool {
        matches!(self, Self::Pass | Self::TimeoutPass)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::TimeoutPass => "timeout_pass",
            Self::TimeoutFail => "timeout_fail",
        }
    }
}

impl fmt::Display for CourtResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueTag {
    Supply,
    Momentum,
    Setback,
    Morale,
    Risk,
    Stability,
    Offense,
    Governance,
    Time,
    Conflict,
}

impl IssueTag {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Supply => "Supply lines: can the grain keep pace with the march?",
            Self::Momentum => "Momentum: press the advantage or consolidate?",
            Self::Setback => "Setbacks: who answers for the recent losses?",
            Self::Morale => "Morale: the soldiers' spirit is wavering",
            Self::Risk => "Risk: the realm's safety is at stake",
            Self::Stability => "Stability: the rear must not unravel",
            Self::Offense => "Offense: Wei is massing on the front",
            Self::Governance => "Governance: the court's procedures",
            Self::Time => "Time: the season will not wait",
            Self::Conflict => "Factions: old quarrels in the hall",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageScene {
    Opening,
    #[default]
    Round,
    Settlement,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct StrategyAffinity {
    pub rational_argument: f64,
    pub authority_pressure: f64,
    pub emotional_mobilization: f64,
}

impl StrategyAffinity {
    #[must_use]
    pub const fn for_strategy(&self, strategy: CourtStrategy) -> f64 {
        match strategy {
            CourtStrategy::RationalArgument => self.rational_argument,
            CourtStrategy::AuthorityPressure => self.authority_pressure,
            CourtStrategy::EmotionalMobilization => self.emotional_mobilization,
        }
    }
}

/// Resentment gained when a minister is ignored, opposed, or suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResentmentRules {
    pub ignore: i32,
    pub oppose: i32,
    pub suppressed: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcState {
    pub id: String,
    pub display_name: String,
    pub persona_tag: String,
    pub camp: String,
    pub base_stance: i32,
    pub stance: i32,
    pub influence: i32,
    pub affinity: StrategyAffinity,
    pub resentment_rules: ResentmentRules,
    #[serde(default)]
    pub resentment: i32,
    #[serde(default)]
    pub ignored_rounds: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourtMessage {
    pub id: String,
    pub seq: u32,
    pub session_id: u32,
    pub speaker_id: String,
    pub speaker_name: String,
    pub camp: String,
    #[serde(default)]
    pub scene: MessageScene,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BattleModifier {
    pub id: String,
    pub title: String,
    pub description: String,
    pub turns_remaining: u32,
    pub check_modifier: f64,
    pub doom_per_turn: i32,
    pub food_per_turn: i32,
    pub morale_per_turn: i32,
    pub success_reward_food: i32,
    pub success_reward_morale: i32,
    pub failure_penalty_food: i32,
    pub failure_penalty_morale: i32,
    pub failure_penalty_doom: i32,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourtResolution {
    pub session_id: u32,
    pub turn_resolved: u32,
    pub result: CourtResult,
    pub summary: String,
    pub support: i32,
    pub temperature: i32,
    #[serde(default)]
    pub triggered_events: Vec<String>,
    pub modifier: BattleModifier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourtHistoryEntry {
    pub session_id: u32,
    pub turn_resolved: u32,
    pub result: CourtResult,
    pub support: i32,
    pub temperature: i32,
    pub modifier_id: String,
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourtState {
    pub is_active: bool,
    pub session_id: u32,
    pub return_phase: Phase,
    pub temperature: i32,
    pub support: i32,
    pub time_pressure: i32,
    pub max_time_pressure: i32,
    pub momentum: i32,
    /// Roster order fixes the order of per-minister noise draws.
    pub npcs: Vec<NpcState>,
    #[serde(default)]
    pub history: Vec<CourtHistoryEntry>,
    #[serde(default)]
    pub pending_messages: Vec<CourtMessage>,
    #[serde(default)]
    pub current_issues: Vec<String>,
    #[serde(default)]
    pub current_issue_tags: SmallVec<[IssueTag; 5]>,
    #[serde(default)]
    pub active_modifier: Option<BattleModifier>,
    #[serde(default)]
    pub last_resolution: Option<CourtResolution>,
    #[serde(default)]
    pub last_strategy: Option<CourtStrategy>,
    #[serde(default)]
    pub last_trigger_turn: u32,
    #[serde(default)]
    pub message_seq: u32,
    #[serde(default)]
    pub escalation_fired: bool,
    #[serde(default)]
    pub current_escalations: Vec<String>,
}

impl Default for CourtState {
    fn default() -> Self {
        Self {
            is_active: false,
            session_id: 0,
            return_phase: Phase::Campaign,
            temperature: 0,
            support: 55,
            time_pressure: 0,
            max_time_pressure: 0,
            momentum: 0,
            npcs: default_roster(),
            history: Vec::new(),
            pending_messages: Vec::new(),
            current_issues: Vec::new(),
            current_issue_tags: SmallVec::new(),
            active_modifier: None,
            last_resolution: None,
            last_strategy: None,
            last_trigger_turn: 0,
            message_seq: 0,
            escalation_fired: false,
            current_escalations: Vec::new(),
        }
    }
}

impl CourtState {
    #[must_use]
    pub fn npc(&self, id: &str) -> Option<&NpcState> {
        self.npcs.iter().find(|npc| npc.id == id)
    }

    #[must_use]
    pub fn resentment_of(&self, id: &str) -> i32 {
        self.npc(id).map_or(0, |npc| npc.resentment)
    }

    pub(crate) fn push_message(
        &mut self,
        speaker_id: &str,
        speaker_name: &str,
        camp: &str,
        scene: MessageScene,
        text: impl Into<String>,
    ) {
        self.message_seq += 1;
        self.pending_messages.push(CourtMessage {
            id: format!("court-{}-{:02}", self.session_id, self.message_seq),
            seq: self.message_seq,
            session_id: self.session_id,
            speaker_id: speaker_id.to_string(),
            speaker_name: speaker_name.to_string(),
            camp: camp.to_string(),
            scene,
            text: text.into(),
        });
    }

    pub(crate) fn push_system(&mut self, speaker_name: &str, scene: MessageScene, text: impl Into<String>) {
        self.push_message(SYSTEM_SPEAKER_ID, speaker_name, SYSTEM_SPEAKER_ID, scene, text);
    }

    /// Line spoken by a rostered minister. Unknown ids are skipped.
    pub(crate) fn push_npc_line(&mut self, npc_id: &str, scene: MessageScene, text: impl Into<String>) {
        let Some((name, camp)) = self
            .npc(npc_id)
            .map(|npc| (npc.display_name.clone(), npc.camp.clone()))
        else {
            return;
        };
        self.push_message(npc_id, &name, &camp, scene, text);
    }
}

/// Whether the court should convene before the next turn advances.
#[must_use]
pub fn should_trigger(state: &GameState, cfg: &CourtConfig) -> bool {
    let court = &state.court;
    if court.is_active || !state.outcome.is_ongoing() || !state.phase.is_active_play() {
        return false;
    }
    if state.turn <= 1 {
        return false;
    }
    let cadence_due = state.turn.saturating_sub(court.last_trigger_turn) >= cfg.trigger_interval;
    let critical = state.food <= COURT_CRITICAL_FOOD
        || state.morale <= COURT_CRITICAL_MORALE
        || state.doom >= COURT_CRITICAL_DOOM
        || court.momentum <= COURT_CRITICAL_MOMENTUM
        || state.longyou_collapsed;
    cadence_due || critical
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_aliases_parse() {
        assert_eq!(
            "reason".parse::<CourtStrategy>(),
            Ok(CourtStrategy::RationalArgument)
        );
        assert_eq!(
            "Pressure".parse::<CourtStrategy>(),
            Ok(CourtStrategy::AuthorityPressure)
        );
        assert_eq!(
            "emotion".parse::<CourtStrategy>(),
            Ok(CourtStrategy::EmotionalMobilization)
        );
        assert!("bribery".parse::<CourtStrategy>().is_err());
    }

    #[test]
    fn legacy_options_map_to_strategies() {
        assert_eq!(
            CourtStrategy::from_legacy_option("suppress_faction"),
            CourtStrategy::AuthorityPressure
        );
        assert_eq!(
            CourtStrategy::from_legacy_option("ask_budget"),
            CourtStrategy::EmotionalMobilization
        );
        assert_eq!(
            CourtStrategy::from_legacy_option("anything"),
            CourtStrategy::RationalArgument
        );
    }

    #[test]
    fn trigger_waits_for_second_turn() {
        let cfg = CourtConfig::default();
        let mut state = GameState::new("court", 1);
        state.food = 10;
        assert!(!should_trigger(&state, &cfg));
        state.turn = 2;
        assert!(should_trigger(&state, &cfg));
    }

    #[test]
    fn trigger_uses_cadence_or_critical_signals() {
        let cfg = CourtConfig::default();
        let mut state = GameState::new("court", 1);
        state.turn = 3;
        state.court.last_trigger_turn = 1;
        assert!(!should_trigger(&state, &cfg));
        state.turn = 4;
        assert!(should_trigger(&state, &cfg));
        state.turn = 3;
        state.court.momentum = -2;
        assert!(should_trigger(&state, &cfg));
        state.phase = Phase::Recover;
        assert!(!should_trigger(&state, &cfg));
    }

    #[test]
    fn messages_carry_sequence_ids() {
        let mut court = CourtState {
            session_id: 4,
            ..CourtState::default()
        };
        court.push_system("Dispatch", MessageScene::Opening, "The court convenes.");
        court.push_npc_line("wei_yan", MessageScene::Round, "March!");
        court.push_npc_line("nobody", MessageScene::Round, "ignored");
        assert_eq!(court.pending_messages.len(), 2);
        assert_eq!(court.pending_messages[0].id, "court-4-01");
        assert_eq!(court.pending_messages[1].camp, "vanguard");
    }
}
