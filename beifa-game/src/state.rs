use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::constants::{
    FLAG_CORE_LOST, FLAG_DOOM_CHAIN_ACTIVE, FLAG_JIETING_HELD, FLAG_POST_ZHUGE_ERA,
    FLAG_WOOD_OX_DONE, INITIAL_DOOM, INITIAL_FOOD, INITIAL_HEALTH, INITIAL_MORALE,
    INITIAL_POLITICS, INITIAL_WEI_PRESSURE, LOG_CAPACITY, MAX_FOOD_BASE, MAX_FOOD_POST_ZHUGE,
    START_CONTROLLED, START_LOCATION,
};
use crate::court::CourtState;

/// Campaign phase. Recover, court, and defense are buffer phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Campaign,
    Recover,
    Court,
    Defense,
    Final,
}

impl Phase {
    pub const BUFFERS: [Self; 3] = [Self::Recover, Self::Court, Self::Defense];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Campaign => "campaign",
            Self::Recover => "recover",
            Self::Court => "court",
            Self::Defense => "defense",
            Self::Final => "final",
        }
    }

    /// Phases in which the court may convene on its own.
    #[must_use]
    pub const fn is_active_play(self) -> bool {
        matches!(self, Self::Campaign | Self::Defense | Self::Final)
    }

    /// Phases in which route progress advances with each turn.
    #[must_use]
    pub const fn is_travel(self) -> bool {
        matches!(self, Self::Campaign | Self::Final)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown phase `{0}`")]
pub struct UnknownPhase(pub String);

impl FromStr for Phase {
    type Err = UnknownPhase;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "campaign" => Ok(Self::Campaign),
            "recover" => Ok(Self::Recover),
            "court" => Ok(Self::Court),
            "defense" => Ok(Self::Defense),
            "final" => Ok(Self::Final),
            other => Err(UnknownPhase(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    #[default]
    Ongoing,
    Win,
    DefeatShu,
}

impl Outcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ongoing => "ONGOING",
            Self::Win => "WIN",
            Self::DefeatShu => "DEFEAT_SHU",
        }
    }

    #[must_use]
    pub const fn is_ongoing(self) -> bool {
        matches!(self, Self::Ongoing)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric state channels addressable by effect descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Food,
    Morale,
    Politics,
    WeiPressure,
    Health,
    Doom,
    LongyouTurns,
    GuanzhongTurns,
}

impl Resource {
    /// Positive deltas to these channels shrink once the era transition lands.
    #[must_use]
    pub const fn is_era_scaled(self) -> bool {
        matches!(self, Self::Food | Self::Morale | Self::Politics)
    }
}

/// One option of the current event as presented to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventOption {
    pub id: String,
    pub label: String,
    pub disabled: bool,
}

/// Player-facing view of the current node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventView {
    pub text: String,
    #[serde(default)]
    pub options: Vec<EventOption>,
}

impl EventView {
    /// Options the player may currently select.
    pub fn enabled_options(&self) -> impl Iterator<Item = &EventOption> {
        self.options.iter().filter(|option| !option.disabled)
    }
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub game_id: String,
    pub seed: u64,
    pub chapter: u8,
    pub turn: u32,
    pub phase: Phase,
    pub outcome: Outcome,
    pub food: i32,
    pub morale: i32,
    pub politics: i32,
    pub wei_pressure: i32,
    pub health: i32,
    pub doom: i32,
    pub longyou_turns: i32,
    pub guanzhong_turns: i32,
    pub longyou_collapsed: bool,
    #[serde(default)]
    pub flags: BTreeMap<String, bool>,
    #[serde(default)]
    pub log: Vec<String>,
    #[serde(default)]
    pub current_node_id: String,
    #[serde(default)]
    pub current_event: EventView,
    pub current_location: String,
    #[serde(default)]
    pub controlled_locations: Vec<String>,
    #[serde(default)]
    pub active_route_id: Option<String>,
    #[serde(default)]
    pub route_progress: f64,
    #[serde(default)]
    pub roll_count: u64,
    #[serde(default)]
    pub court: CourtState,
}

impl GameState {
    /// Fresh chapter-one state. No node has been entered yet.
    #[must_use]
    pub fn new(game_id: impl Into<String>, seed: u64) -> Self {
        let flags = [
            FLAG_WOOD_OX_DONE,
            FLAG_JIETING_HELD,
            FLAG_POST_ZHUGE_ERA,
            FLAG_CORE_LOST,
            FLAG_DOOM_CHAIN_ACTIVE,
        ]
        .into_iter()
        .map(|flag| (flag.to_string(), false))
        .collect();
        Self {
            game_id: game_id.into(),
            seed,
            chapter: 1,
            turn: 1,
            phase: Phase::Campaign,
            outcome: Outcome::Ongoing,
            food: INITIAL_FOOD,
            morale: INITIAL_MORALE,
            politics: INITIAL_POLITICS,
            wei_pressure: INITIAL_WEI_PRESSURE,
            health: INITIAL_HEALTH,
            doom: INITIAL_DOOM,
            longyou_turns: 0,
            guanzhong_turns: 0,
            longyou_collapsed: false,
            flags,
            log: Vec::new(),
            current_node_id: String::new(),
            current_event: EventView::default(),
            current_location: START_LOCATION.to_string(),
            controlled_locations: START_CONTROLLED.iter().map(ToString::to_string).collect(),
            active_route_id: None,
            route_progress: 0.0,
            roll_count: 0,
            court: CourtState::default(),
        }
    }

    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        self.flags.get(key).copied().unwrap_or(false)
    }

    pub fn set_flag(&mut self, key: &str, value: bool) {
        self.flags.insert(key.to_string(), value);
    }

    #[must_use]
    pub fn is_post_zhuge_era(&self) -> bool {
        self.flag(FLAG_POST_ZHUGE_ERA)
    }

    /// Food ceiling for the current era.
    #[must_use]
    pub fn max_food(&self) -> i32 {
        if self.is_post_zhuge_era() {
            MAX_FOOD_POST_ZHUGE
        } else {
            MAX_FOOD_BASE
        }
    }

    #[must_use]
    pub const fn resource(&self, resource: Resource) -> i32 {
        match resource {
            Resource::Food => self.food,
            Resource::Morale => self.morale,
            Resource::Politics => self.politics,
            Resource::WeiPressure => self.wei_pressure,
            Resource::Health => self.health,
            Resource::Doom => self.doom,
            Resource::LongyouTurns => self.longyou_turns,
            Resource::GuanzhongTurns => self.guanzhong_turns,
        }
    }

    pub const fn resource_mut(&mut self, resource: Resource) -> &mut i32 {
        match resource {
            Resource::Food => &mut self.food,
            Resource::Morale => &mut self.morale,
            Resource::Politics => &mut self.politics,
            Resource::WeiPressure => &mut self.wei_pressure,
            Resource::Health => &mut self.health,
            Resource::Doom => &mut self.doom,
            Resource::LongyouTurns => &mut self.longyou_turns,
            Resource::GuanzhongTurns => &mut self.guanzhong_turns,
        }
    }

    /// Append a line to the bounded campaign log. Blank lines are ignored.
    pub fn add_log(&mut self, line: impl AsRef<str>) {
        let line = line.as_ref().trim();
        if line.is_empty() {
            return;
        }
        self.log.push(line.to_string());
        if self.log.len() > LOG_CAPACITY {
            let excess = self.log.len() - LOG_CAPACITY;
            self.log.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_uses_opening_values() {
        let state = GameState::new("g-1", 7);
        assert_eq!(state.turn, 1);
        assert_eq!(state.chapter, 1);
        assert_eq!(state.food, INITIAL_FOOD);
        assert_eq!(state.controlled_locations, vec!["chengdu", "hanzhong"]);
        assert!(!state.flag(FLAG_POST_ZHUGE_ERA));
        assert!(state.outcome.is_ongoing());
    }

    #[test]
    fn log_keeps_last_ten_lines() {
        let mut state = GameState::new("g-1", 7);
        for idx in 0..14 {
            state.add_log(format!("line {idx}"));
        }
        state.add_log("   ");
        assert_eq!(state.log.len(), LOG_CAPACITY);
        assert_eq!(state.log.first().map(String::as_str), Some("line 4"));
        assert_eq!(state.log.last().map(String::as_str), Some("line 13"));
    }

    #[test]
    fn phase_round_trips_through_text() {
        for phase in [Phase::Campaign, Phase::Recover, Phase::Court, Phase::Defense, Phase::Final] {
            assert_eq!(phase.as_str().parse::<Phase>(), Ok(phase));
        }
        assert!("siege".parse::<Phase>().is_err());
        assert!(Phase::Defense.is_active_play());
        assert!(!Phase::Recover.is_active_play());
    }

    #[test]
    fn outcome_serializes_in_screaming_case() {
        let encoded = serde_json::to_string(&Outcome::DefeatShu).unwrap();
        assert_eq!(encoded, "\"DEFEAT_SHU\"");
    }

    #[test]
    fn max_food_drops_after_era_transition() {
        let mut state = GameState::new("g-1", 7);
        assert_eq!(state.max_food(), MAX_FOOD_BASE);
        state.set_flag(FLAG_POST_ZHUGE_ERA, true);
        assert_eq!(state.max_food(), MAX_FOOD_POST_ZHUGE);
    }
}
