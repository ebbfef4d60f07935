//! Probabilistic check resolution.

use serde::{Deserialize, Serialize};

use crate::constants::{
    CHECK_BASE_PROBABILITIES, CHECK_PROBABILITY_CEILING, CHECK_PROBABILITY_FLOOR,
    POST_ZHUGE_SUCCESS_MULTIPLIER, UNKNOWN_CHECK_BASE,
};
use crate::rng::SessionRng;
use crate::state::GameState;

/// Family of a check key, selecting its linear state adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckCategory {
    Jieting,
    LongyouRebellion,
    SupplyHarass,
    CourtInfighting,
    Sortie,
    ChanganAssault,
    GuanzhongHold,
    DoomDefense,
    Generic,
}

impl CheckCategory {
    #[must_use]
    pub fn of(key: &str) -> Self {
        match key {
            "longyou_rebellion" => Self::LongyouRebellion,
            "supply_harass" => Self::SupplyHarass,
            "court_infighting" => Self::CourtInfighting,
            "wei_sortie" | "wuzhang_sortie" => Self::Sortie,
            "guanzhong_hold" => Self::GuanzhongHold,
            "doom_defense" => Self::DoomDefense,
            _ if key.starts_with("jieting") => Self::Jieting,
            _ if key.starts_with("changan_assault") => Self::ChanganAssault,
            _ => Self::Generic,
        }
    }

    fn adjustment(self, state: &GameState) -> f64 {
        let food = f64::from(state.food);
        let morale = f64::from(state.morale);
        let politics = f64::from(state.politics);
        let pressure = f64::from(state.wei_pressure);
        match self {
            Self::Jieting => (morale - 60.0) * 0.002,
            Self::LongyouRebellion => (politics - 50.0) * 0.004,
            Self::SupplyHarass => (food - 90.0) * 0.002 + (morale - 60.0) * 0.001,
            Self::CourtInfighting => (politics - 50.0) * 0.005,
            Self::Sortie => pressure * 0.05,
            Self::ChanganAssault => {
                (food - 80.0) * 0.002 + (morale - 60.0) * 0.003 + (pressure - 3.0) * 0.01
            }
            Self::GuanzhongHold => (food - 70.0) * 0.002 + (morale - 60.0) * 0.002 - pressure * 0.015,
            Self::DoomDefense => {
                (food - 60.0) * 0.002 + (morale - 55.0) * 0.003 + (politics - 45.0) * 0.002
            }
            Self::Generic => 0.0,
        }
    }
}

/// Static base probability for a check key.
#[must_use]
pub fn base_probability(key: &str) -> f64 {
    CHECK_BASE_PROBABILITIES
        .iter()
        .find(|(known, _)| *known == key)
        .map_or(UNKNOWN_CHECK_BASE, |(_, base)| *base)
}

/// Success probability for `key` under the current state and battle modifier.
#[must_use]
pub fn probability(key: &str, state: &GameState) -> f64 {
    let mut chance = base_probability(key) + CheckCategory::of(key).adjustment(state);
    if state.is_post_zhuge_era() {
        chance *= POST_ZHUGE_SUCCESS_MULTIPLIER;
    }
    if let Some(modifier) = &state.court.active_modifier {
        chance += modifier.check_modifier;
    }
    chance.clamp(CHECK_PROBABILITY_FLOOR, CHECK_PROBABILITY_CEILING)
}

/// Audit record of one resolved check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckRoll {
    pub success: bool,
    pub roll: f64,
    pub probability: f64,
}

/// Resolve a check with one draw from the session stream.
///
/// An empty key marks an unconditional branch: it succeeds without drawing and
/// leaves the roll counter untouched.
pub fn roll(key: &str, state: &mut GameState, rng: &mut SessionRng) -> CheckRoll {
    if key.is_empty() {
        return CheckRoll {
            success: true,
            roll: 0.0,
            probability: 1.0,
        };
    }
    let probability = probability(key, state);
    let roll = rng.unit();
    state.roll_count = state.roll_count.saturating_add(1);
    CheckRoll {
        success: roll <= probability,
        roll,
        probability,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FLAG_POST_ZHUGE_ERA;
    use crate::court::BattleModifier;

    #[test]
    fn categories_follow_key_prefixes() {
        assert_eq!(CheckCategory::of("jieting_masu"), CheckCategory::Jieting);
        assert_eq!(
            CheckCategory::of("changan_assault_steady"),
            CheckCategory::ChanganAssault
        );
        assert_eq!(CheckCategory::of("wuzhang_sortie"), CheckCategory::Sortie);
        assert_eq!(CheckCategory::of("mystery"), CheckCategory::Generic);
    }

    #[test]
    fn unknown_key_uses_even_odds() {
        let state = GameState::new("chk", 1);
        assert!((probability("unheard_of", &state) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn pressure_raises_sortie_odds() {
        let mut state = GameState::new("chk", 1);
        state.wei_pressure = 0;
        let calm = probability("wei_sortie", &state);
        state.wei_pressure = 8;
        let pressed = probability("wei_sortie", &state);
        assert!((pressed - calm - 0.4).abs() < 1e-9);
    }

    #[test]
    fn probability_is_never_certain() {
        let mut state = GameState::new("chk", 1);
        state.food = 160;
        state.morale = 100;
        state.wei_pressure = 10;
        state.court.active_modifier = Some(BattleModifier {
            check_modifier: 0.5,
            ..BattleModifier::default()
        });
        assert!((probability("changan_assault_fast", &state) - 0.95).abs() < 1e-9);
        state.court.active_modifier = None;
        state.food = 0;
        state.morale = 0;
        state.wei_pressure = 0;
        assert!((probability("changan_assault_fast", &state) - 0.05).abs() < 1e-9);
    }

    #[test]
    fn era_penalty_and_modifier_stack() {
        let mut state = GameState::new("chk", 1);
        state.politics = 50;
        let base = probability("court_infighting", &state);
        state.set_flag(FLAG_POST_ZHUGE_ERA, true);
        let penalised = probability("court_infighting", &state);
        assert!((penalised - base * 0.7).abs() < 1e-9);
        state.court.active_modifier = Some(BattleModifier {
            check_modifier: 0.08,
            ..BattleModifier::default()
        });
        let boosted = probability("court_infighting", &state);
        assert!((boosted - (base * 0.7 + 0.08)).abs() < 1e-9);
    }

    #[test]
    fn roll_counts_draws_but_empty_key_does_not() {
        let mut state = GameState::new("chk", 1);
        let mut rng = SessionRng::from_user_seed(11);
        let result = roll("supply_harass", &mut state, &mut rng);
        assert_eq!(state.roll_count, 1);
        assert_eq!(result.success, result.roll <= result.probability);
        let free = roll("", &mut state, &mut rng);
        assert!(free.success);
        assert_eq!(state.roll_count, 1);
        assert_eq!(rng.draws(), 1);
    }
}
