use log::info;
use serde::{Deserialize, Serialize};

use crate::config::CourtConfig;
use crate::constants::{
    COURT_AGGRESSIVE_TEMPERATURE, COURT_CONSERVATIVE_TEMPERATURE, COURT_OBSTRUCTION_FOOD_BELOW,
    STANCE_DRIFT_LIMIT,
};
use crate::effects::{Effects, apply_effects};
use crate::state::{GameState, Resource};

use super::roster::{EMPEROR_ID, settlement_line};
use super::{
    BattleModifier, CourtHistoryEntry, CourtResolution, CourtResult, CourtState, MessageScene,
    RiskLevel,
};

const SETTLEMENT_SPEAKER: &str = "Court Verdict";

/// Per-turn drift reported back to the turn controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierTick {
    pub doom_delta: i32,
    /// Title of the modifier that ran out this turn.
    pub expired: Option<String>,
}

/// Extra resource change applied after a check under an active modifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckAdjustment {
    pub food: i32,
    pub morale: i32,
    pub doom: i32,
}

impl CheckAdjustment {
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.food == 0 && self.morale == 0 && self.doom == 0
    }
}

#[must_use]
pub const fn should_settle(court: &CourtState, cfg: &CourtConfig) -> bool {
    court.support >= cfg.pass_threshold
        || court.support <= cfg.fail_threshold
        || court.time_pressure <= 0
}

#[must_use]
pub const fn classify_result(support: i32, force_timeout: bool, cfg: &CourtConfig) -> CourtResult {
    if support >= cfg.pass_threshold && !force_timeout {
        CourtResult::Pass
    } else if support <= cfg.fail_threshold && !force_timeout {
        CourtResult::Fail
    } else if support >= cfg.timeout_pass_midline {
        CourtResult::TimeoutPass
    } else {
        CourtResult::TimeoutFail
    }
}

/// Battle modifier granted by a settlement. Passing results pick an edict by
/// the room's temperature; failures worsen when the session escalated or the
/// granaries are low.
#[must_use]
pub fn modifier_for_result(state: &GameState, result: CourtResult) -> BattleModifier {
    let court = &state.court;
    if result.is_pass() {
        if court.temperature >= COURT_AGGRESSIVE_TEMPERATURE {
            return BattleModifier {
                id: "edict_rapid_strike".into(),
                title: "Edict of Swift Advance".into(),
                description: "The hawks carry the day: greater gains on success, harsher losses on failure.".into(),
                turns_remaining: 3,
                check_modifier: 0.08,
                doom_per_turn: 1,
                food_per_turn: -2,
                morale_per_turn: 1,
                success_reward_food: 4,
                success_reward_morale: 3,
                failure_penalty_food: 6,
                failure_penalty_morale: 5,
                failure_penalty_doom: 1,
                risk_level: RiskLevel::High,
            };
        }
        if court.temperature <= COURT_CONSERVATIVE_TEMPERATURE {
            return BattleModifier {
                id: "edict_stable_front".into(),
                title: "Edict of Steady Front".into(),
                description: "The cautious faction prevails: slower advance, contained losses.".into(),
                turns_remaining: 3,
                check_modifier: 0.02,
                doom_per_turn: -1,
                food_per_turn: 2,
                morale_per_turn: 1,
                success_reward_food: 1,
                success_reward_morale: 1,
                failure_penalty_food: 2,
                failure_penalty_morale: 1,
                failure_penalty_doom: 0,
                risk_level: RiskLevel::Low,
            };
        }
        return BattleModifier {
            id: "edict_balanced_push".into(),
            title: "Edict of Balanced Advance".into(),
            description: "The moderates broker consensus: steady gains at measured risk.".into(),
            turns_remaining: 3,
            check_modifier: 0.05,
            doom_per_turn: 0,
            food_per_turn: 1,
            morale_per_turn: 1,
            success_reward_food: 2,
            success_reward_morale: 2,
            failure_penalty_food: 3,
            failure_penalty_morale: 2,
            failure_penalty_doom: 0,
            risk_level: RiskLevel::Medium,
        };
    }

    if !court.current_escalations.is_empty() || state.food < COURT_OBSTRUCTION_FOOD_BELOW {
        return BattleModifier {
            id: "court_obstruction".into(),
            title: "Court Obstruction".into(),
            description: "Factional backlash: orders stall while supply and morale erode.".into(),
            turns_remaining: 3,
            check_modifier: -0.10,
            doom_per_turn: 1,
            food_per_turn: -3,
            morale_per_turn: -2,
            success_reward_food: 0,
            success_reward_morale: 0,
            failure_penalty_food: 4,
            failure_penalty_morale: 3,
            failure_penalty_doom: 1,
            risk_level: RiskLevel::High,
        };
    }

    BattleModifier {
        id: "court_drag".into(),
        title: "Deliberation Stalls".into(),
        description: "No consensus: the advance slows and the field forgives less.".into(),
        turns_remaining: 2,
        check_modifier: -0.06,
        doom_per_turn: 1,
        food_per_turn: -2,
        morale_per_turn: -1,
        success_reward_food: 0,
        success_reward_morale: 1,
        failure_penalty_food: 3,
        failure_penalty_morale: 2,
        failure_penalty_doom: 1,
        risk_level: RiskLevel::Medium,
    }
}

const fn immediate_delta(result: CourtResult) -> [(Resource, i32); 3] {
    match result {
        CourtResult::Pass => [(Resource::Morale, 4), (Resource::Politics, 3), (Resource::Food, 0)],
        CourtResult::TimeoutPass => {
            [(Resource::Morale, 2), (Resource::Politics, 1), (Resource::Food, 0)]
        }
        CourtResult::Fail => [(Resource::Food, -8), (Resource::Morale, -6), (Resource::Politics, -4)],
        CourtResult::TimeoutFail => {
            [(Resource::Food, -5), (Resource::Morale, -4), (Resource::Politics, -3)]
        }
    }
}

fn summary_for(result: CourtResult, title: &str) -> String {
    match result {
        CourtResult::Pass => format!("The court approves: {title}."),
        CourtResult::TimeoutPass => format!("Narrowly approved: {title}."),
        CourtResult::Fail => format!("The court rejects the plan: {title}."),
        CourtResult::TimeoutFail => format!("Time runs out: {title}."),
    }
}

fn modifier_line(modifier: &BattleModifier) -> String {
    format!(
        "In force: {} ({} turns), checks {:+.2}, per turn food {:+}/morale {:+}/doom {:+}.",
        modifier.title,
        modifier.turns_remaining,
        modifier.check_modifier,
        modifier.food_per_turn,
        modifier.morale_per_turn,
        modifier.doom_per_turn
    )
}

/// Close the active session and install its battle modifier.
///
/// `force_timeout` classifies by the midline only, as when fast-forwarding
/// runs out of rounds. Does nothing when no session is active.
pub fn settle(state: &mut GameState, force_timeout: bool, cfg: &CourtConfig) {
    if !state.court.is_active {
        return;
    }
    let result = classify_result(state.court.support, force_timeout, cfg);
    let modifier = modifier_for_result(state, result);
    let summary = summary_for(result, &modifier.title);

    apply_effects(state, &Effects::from_delta(immediate_delta(result)));

    let turn = state.turn;
    let court = &mut state.court;
    court.is_active = false;
    court.last_trigger_turn = turn;
    court.active_modifier = Some(modifier.clone());
    court.last_resolution = Some(CourtResolution {
        session_id: court.session_id,
        turn_resolved: turn,
        result,
        summary: summary.clone(),
        support: court.support,
        temperature: court.temperature,
        triggered_events: court.current_escalations.clone(),
        modifier: modifier.clone(),
    });
    court.history.push(CourtHistoryEntry {
        session_id: court.session_id,
        turn_resolved: turn,
        result,
        support: court.support,
        temperature: court.temperature,
        modifier_id: modifier.id.clone(),
    });
    if court.history.len() > cfg.history_limit {
        let excess = court.history.len() - cfg.history_limit;
        court.history.drain(..excess);
    }
    court.time_pressure = 0;
    court.current_issues.clear();
    court.current_issue_tags.clear();
    court.current_escalations.clear();
    court.escalation_fired = false;

    let temperature = court.temperature;
    for npc in &mut court.npcs {
        npc.ignored_rounds = 0;
        npc.resentment = (npc.resentment - 1).max(0);
        let drift = (temperature - npc.stance).signum();
        npc.stance = (npc.stance + drift).clamp(
            npc.base_stance - STANCE_DRIFT_LIMIT,
            npc.base_stance + STANCE_DRIFT_LIMIT,
        );
    }

    court.push_npc_line(EMPEROR_ID, MessageScene::Settlement, settlement_line(result));
    court.push_system(SETTLEMENT_SPEAKER, MessageScene::Settlement, summary.clone());
    court.push_system(
        SETTLEMENT_SPEAKER,
        MessageScene::Settlement,
        modifier_line(&modifier),
    );
    state.phase = court.return_phase;

    info!(
        "court session {} settled {} at support {}",
        state.court.session_id, result, state.court.support
    );
    state.add_log(format!("Court verdict: {summary}"));
    state.add_log(format!(
        "Court orders in force: {} ({} turns)",
        modifier.title, modifier.turns_remaining
    ));
}

/// Apply the active modifier's per-turn food and morale drift and count it
/// down. The doom drift is returned for the caller to fold into its own gain.
pub fn apply_turn_drift(state: &mut GameState) -> ModifierTick {
    let Some(modifier) = state.court.active_modifier.as_ref() else {
        return ModifierTick::default();
    };
    let drift = Effects::from_delta([
        (Resource::Food, modifier.food_per_turn),
        (Resource::Morale, modifier.morale_per_turn),
    ]);
    let doom_delta = modifier.doom_per_turn;
    if !drift.is_empty() {
        apply_effects(state, &drift);
    }

    let mut expired = None;
    if let Some(modifier) = state.court.active_modifier.as_mut() {
        modifier.turns_remaining = modifier.turns_remaining.saturating_sub(1);
        if modifier.turns_remaining == 0 {
            expired = Some(modifier.title.clone());
        }
    }
    if expired.is_some() {
        state.court.active_modifier = None;
    }
    ModifierTick {
        doom_delta,
        expired,
    }
}

/// Reward or penalty for a resolved check under the active modifier.
pub fn apply_check_outcome(state: &mut GameState, success: bool) -> CheckAdjustment {
    let Some(modifier) = state.court.active_modifier.as_ref() else {
        return CheckAdjustment::default();
    };
    let adjustment = if success {
        CheckAdjustment {
            food: modifier.success_reward_food,
            morale: modifier.success_reward_morale,
            doom: 0,
        }
    } else {
        CheckAdjustment {
            food: -modifier.failure_penalty_food,
            morale: -modifier.failure_penalty_morale,
            doom: modifier.failure_penalty_doom,
        }
    };
    if !adjustment.is_zero() {
        apply_effects(
            state,
            &Effects::from_delta([
                (Resource::Food, adjustment.food),
                (Resource::Morale, adjustment.morale),
                (Resource::Doom, adjustment.doom),
            ]),
        );
    }
    adjustment
}
