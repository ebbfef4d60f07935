//! Declarative state changes carried by options, checks, and court results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::{
    MAX_DOOM, MAX_HEALTH, MAX_HOLDING_TURNS, MAX_MORALE, MAX_POLITICS, MAX_WEI_PRESSURE,
    MOMENTUM_LIMIT, POST_ZHUGE_EFFICIENCY_MULTIPLIER, RESENTMENT_MAX,
};
use crate::numbers::round_f64_to_i32;
use crate::state::{GameState, Outcome, Phase, Resource};

/// Effect descriptor. Unknown keys are rejected when content is parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Effects {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub delta: BTreeMap<Resource, i32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub set_values: BTreeMap<Resource, i32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub set_flags: BTreeMap<String, bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_phase: Option<Phase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_chapter: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_outcome: Option<Outcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_longyou_collapsed: Option<bool>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub set_guanzhong_reset: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub append_log: Vec<String>,
}

impl Effects {
    /// Delta-only descriptor, used by the court for costs and results.
    #[must_use]
    pub fn from_delta(entries: impl IntoIterator<Item = (Resource, i32)>) -> Self {
        Self {
            delta: entries.into_iter().filter(|(_, value)| *value != 0).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Apply an effect descriptor in its fixed order, then re-clamp the state.
pub fn apply_effects(state: &mut GameState, effects: &Effects) {
    let post_era = state.is_post_zhuge_era();
    for (&resource, &value) in &effects.delta {
        let scaled = if post_era && resource.is_era_scaled() && value > 0 {
            round_f64_to_i32(f64::from(value) * POST_ZHUGE_EFFICIENCY_MULTIPLIER)
        } else {
            value
        };
        let slot = state.resource_mut(resource);
        *slot = slot.saturating_add(scaled);
    }

    for (&resource, &value) in &effects.set_values {
        *state.resource_mut(resource) = value;
    }
    for (flag, &value) in &effects.set_flags {
        state.set_flag(flag, value);
    }
    if let Some(phase) = effects.set_phase {
        state.phase = phase;
    }
    if let Some(chapter) = effects.set_chapter {
        state.chapter = chapter;
    }
    if let Some(outcome) = effects.set_outcome {
        state.outcome = outcome;
    }
    if let Some(collapsed) = effects.set_longyou_collapsed {
        state.longyou_collapsed = collapsed;
    }
    if effects.set_guanzhong_reset {
        state.guanzhong_turns = 0;
    }
    if let Some(line) = &effects.log {
        state.add_log(line);
    }
    for line in &effects.append_log {
        state.add_log(line);
    }

    clamp_state(state);
}

/// Re-clamp every bounded quantity into its documented range.
pub fn clamp_state(state: &mut GameState) {
    state.food = state.food.clamp(0, state.max_food());
    state.morale = state.morale.clamp(0, MAX_MORALE);
    state.politics = state.politics.clamp(0, MAX_POLITICS);
    state.wei_pressure = state.wei_pressure.clamp(0, MAX_WEI_PRESSURE);
    state.health = state.health.clamp(0, MAX_HEALTH);
    state.doom = state.doom.clamp(0, MAX_DOOM);
    state.longyou_turns = state.longyou_turns.clamp(0, MAX_HOLDING_TURNS);
    state.guanzhong_turns = state.guanzhong_turns.clamp(0, MAX_HOLDING_TURNS);
    state.route_progress = state.route_progress.clamp(0.0, 1.0);

    let court = &mut state.court;
    court.support = court.support.clamp(0, 100);
    court.temperature = court.temperature.clamp(-100, 100);
    court.momentum = court.momentum.clamp(-MOMENTUM_LIMIT, MOMENTUM_LIMIT);
    court.time_pressure = court.time_pressure.max(0);
    for npc in &mut court.npcs {
        npc.resentment = npc.resentment.clamp(0, RESENTMENT_MAX);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{FLAG_POST_ZHUGE_ERA, MAX_FOOD_BASE, MAX_FOOD_POST_ZHUGE};

    fn state() -> GameState {
        GameState::new("fx", 3)
    }

    #[test]
    fn deltas_clamp_into_range() {
        let mut state = state();
        let effects = Effects::from_delta([
            (Resource::Food, 500),
            (Resource::Morale, -500),
            (Resource::Doom, 40),
            (Resource::WeiPressure, -3),
        ]);
        apply_effects(&mut state, &effects);
        assert_eq!(state.food, MAX_FOOD_BASE);
        assert_eq!(state.morale, 0);
        assert_eq!(state.doom, MAX_DOOM);
        assert_eq!(state.wei_pressure, 0);
    }

    #[test]
    fn post_era_scales_only_positive_gains() {
        let mut state = state();
        state.set_flag(FLAG_POST_ZHUGE_ERA, true);
        state.food = 50;
        state.morale = 50;
        state.doom = 2;
        let effects = Effects::from_delta([
            (Resource::Food, 10),
            (Resource::Morale, -10),
            (Resource::Doom, 10),
        ]);
        apply_effects(&mut state, &effects);
        assert_eq!(state.food, 57);
        assert_eq!(state.morale, 40);
        assert_eq!(state.doom, 12);
    }

    #[test]
    fn post_era_halves_round_to_even() {
        let mut state = state();
        state.set_flag(FLAG_POST_ZHUGE_ERA, true);
        state.food = 20;
        apply_effects(&mut state, &Effects::from_delta([(Resource::Food, 15)]));
        assert_eq!(state.food, 30);
    }

    #[test]
    fn overwrites_apply_after_deltas() {
        let mut state = state();
        state.guanzhong_turns = 2;
        let effects: Effects = serde_json::from_str(
            r#"{
                "delta": {"food": -10},
                "set_values": {"food": 40},
                "set_flags": {"core_lost": true},
                "set_phase": "defense",
                "set_chapter": 4,
                "set_longyou_collapsed": true,
                "set_guanzhong_reset": true,
                "log": "The front buckles.",
                "append_log": ["", "Messengers ride south."]
            }"#,
        )
        .unwrap();
        apply_effects(&mut state, &effects);
        assert_eq!(state.food, 40);
        assert!(state.flag("core_lost"));
        assert_eq!(state.phase, Phase::Defense);
        assert_eq!(state.chapter, 4);
        assert!(state.longyou_collapsed);
        assert_eq!(state.guanzhong_turns, 0);
        assert_eq!(
            state.log,
            vec!["The front buckles.".to_string(), "Messengers ride south.".to_string()]
        );
    }

    #[test]
    fn unknown_effect_keys_are_rejected() {
        let parsed = serde_json::from_str::<Effects>(r#"{"delta": {"gold": 3}}"#);
        assert!(parsed.is_err());
        let parsed = serde_json::from_str::<Effects>(r#"{"teleport": true}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn clamp_tracks_era_food_ceiling() {
        let mut state = state();
        state.food = 150;
        state.set_flag(FLAG_POST_ZHUGE_ERA, true);
        clamp_state(&mut state);
        assert_eq!(state.food, MAX_FOOD_POST_ZHUGE);
    }
}
