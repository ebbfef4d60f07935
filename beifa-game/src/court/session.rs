use log::debug;
use smallvec::SmallVec;

use crate::config::CourtConfig;
use crate::constants::{
    COURT_MAX_ISSUE_TAGS, COURT_SCORE_NOISE, COURT_STATEMENT_MAX_CHARS, COURT_SUPPORT_JITTER,
    COURT_SUPPORT_SEED_MAX, COURT_SUPPORT_SEED_MIN, COURT_SUPPORT_SHIFT_LIMIT,
    COURT_TEMPERATURE_JITTER, COURT_TEMPERATURE_LIMIT, COURT_TEMPERATURE_NOISE,
    COURT_TEMPERATURE_SHIFT_LIMIT, RESENTMENT_MAX,
};
use crate::effects::{Effects, apply_effects};
use crate::numbers::clamp_round;
use crate::rng::SessionRng;
use crate::state::{GameState, Phase, Resource};

use super::roster::{
    CENSOR_ID, CLERK_ID, EMPEROR_ID, OPENING_LINES, RIVALRY_CLERK_LINE, RIVALRY_VANGUARD_LINE,
    VANGUARD_ID, negative_line, positive_line, progress_line,
};
use super::settlement::{settle, should_settle};
use super::strategy::{auto_strategy, profile, statement_bonus};
use super::{CourtStrategy, IssueTag, MessageScene, PLAYER_SPEAKER_ID};

const PLAYER_NAME: &str = "Zhuge Liang";
const RECORD_SPEAKER: &str = "Court Record";

/// Open a new session, seeding support and temperature from the campaign.
///
/// Draws exactly two values from `rng`: support jitter, then temperature
/// jitter.
pub fn begin_session(state: &mut GameState, rng: &mut SessionRng) {
    let chapter = state.chapter;
    let phase = state.phase;
    let issue_tags = pick_issue_tags(state);

    let politics = f64::from(state.politics);
    let morale = f64::from(state.morale);
    let pressure = f64::from(state.wei_pressure);
    let low_food = state.food < 65;
    let high_morale = state.morale > 72;

    let court = &mut state.court;
    court.is_active = true;
    court.session_id += 1;
    court.return_phase = if phase == Phase::Court {
        if chapter >= 5 { Phase::Final } else { Phase::Campaign }
    } else {
        phase
    };
    court.pending_messages.clear();
    court.current_escalations.clear();
    court.escalation_fired = false;
    court.message_seq = 0;
    court.last_resolution = None;
    court.last_strategy = None;

    court.current_issues = issue_tags.iter().map(|tag| tag.label().to_string()).collect();
    court.current_issue_tags = issue_tags;

    let momentum = f64::from(court.momentum);
    let base_support = 3.0f64.mul_add(
        momentum,
        0.15f64.mul_add(morale - 50.0, 0.30f64.mul_add(politics - 50.0, 58.0)),
    );
    court.support = clamp_round(
        base_support + rng.uniform(-COURT_SUPPORT_JITTER, COURT_SUPPORT_JITTER),
        COURT_SUPPORT_SEED_MIN,
        COURT_SUPPORT_SEED_MAX,
    );

    let mut temp_seed = 2.8f64.mul_add(
        pressure - 4.0,
        f64::from(court.temperature).mul_add(0.35, momentum * 8.0),
    );
    if low_food {
        temp_seed -= 6.0;
    }
    if high_morale {
        temp_seed += 5.0;
    }
    court.temperature = clamp_round(
        temp_seed + rng.uniform(-COURT_TEMPERATURE_JITTER, COURT_TEMPERATURE_JITTER),
        -COURT_TEMPERATURE_LIMIT,
        COURT_TEMPERATURE_LIMIT,
    );

    court.max_time_pressure = if low_food || court.momentum <= -2 { 3 } else { 4 };
    court.time_pressure = court.max_time_pressure;

    court.push_system(
        "Dispatch",
        MessageScene::Opening,
        "Dispatches arrive. The court in Chengdu convenes in haste.",
    );
    for (npc_id, line) in OPENING_LINES {
        court.push_npc_line(npc_id, MessageScene::Opening, line);
    }

    debug!(
        "court session {} opened: support {} temperature {} time {}",
        court.session_id, court.support, court.temperature, court.time_pressure
    );
    state.add_log("Dispatches arrive: the court convenes and must be steadied first.");
}

fn pick_issue_tags(state: &GameState) -> SmallVec<[IssueTag; 5]> {
    let mut candidates: Vec<(u8, IssueTag)> = Vec::with_capacity(10);
    if state.food < 70 {
        candidates.push((95, IssueTag::Supply));
    }
    if state.court.momentum <= -2 {
        candidates.push((90, IssueTag::Setback));
    }
    if state.court.momentum >= 2 {
        candidates.push((88, IssueTag::Momentum));
    }
    if state.morale < 52 {
        candidates.push((84, IssueTag::Morale));
    }
    if state.doom >= 8 {
        candidates.push((82, IssueTag::Risk));
    }
    if state.wei_pressure >= 6 {
        candidates.push((78, IssueTag::Offense));
    }
    if state.longyou_collapsed {
        candidates.push((80, IssueTag::Stability));
    }
    candidates.extend([
        (72, IssueTag::Conflict),
        (70, IssueTag::Governance),
        (66, IssueTag::Time),
    ]);
    candidates.sort_by(|a, b| b.0.cmp(&a.0));

    let mut selected: SmallVec<[IssueTag; 5]> = SmallVec::new();
    for (_, tag) in candidates {
        if !selected.contains(&tag) {
            selected.push(tag);
        }
        if selected.len() >= COURT_MAX_ISSUE_TAGS {
            break;
        }
    }
    for filler in [IssueTag::Governance, IssueTag::Time] {
        if selected.len() >= 2 {
            break;
        }
        if !selected.contains(&filler) {
            selected.push(filler);
        }
    }
    selected
}

/// Play one round with `strategy`. Returns `true` when the session settled.
///
/// Draws one value per minister in roster order, then one for temperature.
/// Does nothing when no session is active.
pub fn resolve_round(
    state: &mut GameState,
    strategy: CourtStrategy,
    statement: Option<&str>,
    rng: &mut SessionRng,
    cfg: &CourtConfig,
) -> bool {
    if !state.court.is_active {
        return false;
    }
    let statement = statement.map(str::trim).filter(|text| !text.is_empty());
    let weights = profile(strategy);

    match statement {
        Some(text) => {
            let clean: String = text
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .chars()
                .take(COURT_STATEMENT_MAX_CHARS)
                .collect();
            state.court.push_message(
                PLAYER_SPEAKER_ID,
                PLAYER_NAME,
                PLAYER_SPEAKER_ID,
                MessageScene::Round,
                clean,
            );
        }
        None => state.court.push_system(
            RECORD_SPEAKER,
            MessageScene::Round,
            format!("{PLAYER_NAME} adopts {}.", strategy.label()),
        ),
    }
    state.court.last_strategy = Some(strategy);

    apply_effects(state, &Effects::from_delta(weights.cost.iter().copied()));

    let scores = score_ministers(state, strategy, rng);
    let (mut support_shift, temp_shift) = aggregate(state, strategy, &scores, rng);
    if let Some(text) = statement {
        support_shift += statement_bonus(
            text,
            strategy,
            &state.court.current_issue_tags,
            &cfg.keywords,
        );
    }

    let court = &mut state.court;
    let old_support = court.support;
    let old_temperature = court.temperature;
    court.support = (court.support + support_shift).clamp(0, 100);
    court.temperature = (court.temperature + temp_shift)
        .clamp(-COURT_TEMPERATURE_LIMIT, COURT_TEMPERATURE_LIMIT);
    court.time_pressure = (court.time_pressure - 1).max(0);

    update_resentment(state, strategy, &scores);
    let escalations = trigger_escalation(state, cfg);

    let court = &mut state.court;
    let summary = format!(
        "Support {old_support}->{}, temperature {old_temperature}->{}, time left {}/{}.",
        court.support, court.temperature, court.time_pressure, court.max_time_pressure
    );
    court.push_system(RECORD_SPEAKER, MessageScene::Round, summary);
    push_reactions(state, strategy, &scores, cfg);
    for text in escalations {
        state
            .court
            .push_system(RECORD_SPEAKER, MessageScene::Round, text);
    }
    debug!(
        "court round {}: support {} temperature {}",
        strategy, state.court.support, state.court.temperature
    );

    if should_settle(&state.court, cfg) {
        settle(state, false, cfg);
        return true;
    }
    false
}

/// Let the court run on automatic strategy until it settles, forcing a
/// timeout settlement if the round cap is reached.
pub fn fast_forward(state: &mut GameState, rng: &mut SessionRng, cfg: &CourtConfig) {
    let mut rounds = 0;
    while state.court.is_active && rounds < cfg.fast_forward_round_cap {
        let strategy = auto_strategy(&state.court);
        resolve_round(state, strategy, None, rng, cfg);
        rounds += 1;
    }
    if state.court.is_active {
        settle(state, true, cfg);
    }
}

fn score_ministers(state: &GameState, strategy: CourtStrategy, rng: &mut SessionRng) -> Vec<f64> {
    let court = &state.court;
    let weights = profile(strategy);
    let resource_mod = weights.resource_modifier(state);
    let issue_mod = weights.issue_modifier(&court.current_issue_tags);
    let momentum_mod = f64::from(court.momentum) * weights.momentum_weight;
    let temperature = f64::from(court.temperature);

    court
        .npcs
        .iter()
        .map(|npc| {
            let preference = npc.affinity.for_strategy(strategy);
            let temp_fit = 1.0 - (temperature - f64::from(npc.stance)).abs() / 140.0;
            let resentment_penalty = f64::from(npc.resentment) * 0.12;
            let noise = rng.uniform(-COURT_SCORE_NOISE, COURT_SCORE_NOISE);
            weights.support_bias + preference * 2.4 + resource_mod + issue_mod * 0.55 + temp_fit
                + momentum_mod
                - resentment_penalty
                + noise
        })
        .collect()
}

fn aggregate(
    state: &GameState,
    strategy: CourtStrategy,
    scores: &[f64],
    rng: &mut SessionRng,
) -> (i32, i32) {
    let mut weighted_sum = 0.0;
    let mut stance_signal = 0.0;
    let mut total_influence = 0.0;
    for (npc, &score) in state.court.npcs.iter().zip(scores) {
        let influence = f64::from(npc.influence);
        weighted_sum += score * influence;
        let direction = if score >= 0.0 { 1.0 } else { -0.35 };
        stance_signal += direction * f64::from(npc.stance) * influence;
        total_influence += influence;
    }
    let support_shift = clamp_round(
        weighted_sum / (total_influence * 0.9).max(1.0),
        -COURT_SUPPORT_SHIFT_LIMIT,
        COURT_SUPPORT_SHIFT_LIMIT,
    );
    let noise = rng.uniform(-COURT_TEMPERATURE_NOISE, COURT_TEMPERATURE_NOISE);
    let temp_shift = clamp_round(
        profile(strategy).temperature_push + stance_signal / 160.0 + noise,
        -COURT_TEMPERATURE_SHIFT_LIMIT,
        COURT_TEMPERATURE_SHIFT_LIMIT,
    );
    (support_shift, temp_shift)
}

fn update_resentment(state: &mut GameState, strategy: CourtStrategy, scores: &[f64]) {
    for (npc, &score) in state.court.npcs.iter_mut().zip(scores) {
        let preference = npc.affinity.for_strategy(strategy);
        let rules = npc.resentment_rules;
        let ignore_gain = rules.ignore.max(1);
        let oppose_gain = rules.oppose.max(1);
        let suppressed_gain = rules.suppressed.max(1);

        if score >= 1.2 {
            npc.resentment = (npc.resentment - 2).max(0);
            npc.ignored_rounds = 0;
            continue;
        }
        if score >= 0.0 {
            npc.resentment = (npc.resentment - 1).max(0);
            if preference < 0.2 {
                npc.ignored_rounds += 1;
            } else {
                npc.ignored_rounds = 0;
            }
        } else {
            let mut gain = oppose_gain;
            if strategy == CourtStrategy::AuthorityPressure {
                gain += suppressed_gain;
            }
            if preference < -0.2 {
                gain += 1;
            }
            npc.resentment += gain;
            npc.ignored_rounds += 1;
        }
        if npc.ignored_rounds >= 2 && preference < 0.25 {
            npc.resentment += ignore_gain;
            npc.ignored_rounds = 0;
        }
        npc.resentment = npc.resentment.min(RESENTMENT_MAX);
    }
}

/// Fire at most one resentment escalation per session.
fn trigger_escalation(state: &mut GameState, cfg: &CourtConfig) -> Vec<String> {
    if state.court.escalation_fired {
        return Vec::new();
    }
    let threshold = cfg.resentment_threshold;
    let court = &state.court;
    let yang = court.resentment_of(CLERK_ID);
    let wei = court.resentment_of(VANGUARD_ID);
    let dong = court.resentment_of(CENSOR_ID);
    let high_count = court
        .npcs
        .iter()
        .filter(|npc| npc.resentment >= threshold)
        .count();

    // The two rivals quarrel one point below the general threshold.
    let quarrel = threshold - 1;
    let text = if yang >= quarrel && wei >= quarrel {
        state.court.support = (state.court.support - 8).max(0);
        apply_effects(
            state,
            &Effects::from_delta([(Resource::Food, -6), (Resource::Politics, -2)]),
        );
        "Open quarrel: Yang Yi and Wei Yan clash before the throne. Emergency supplies -6."
    } else if high_count >= 2 {
        state.court.support = (state.court.support - 10).max(0);
        state.court.time_pressure = (state.court.time_pressure - 1).max(0);
        "Coordinated obstruction: several factions petition together. Support -10, time -1."
    } else if dong >= threshold {
        state.court.support = (state.court.support - 4).max(0);
        state.court.time_pressure = (state.court.time_pressure - 1).max(0);
        "Procedural stall: Dong Yun insists on a full review. Time -1."
    } else if yang >= threshold {
        state.court.support = (state.court.support - 7).max(0);
        "Memorial of protest: Yang Yi questions the command. Support -7."
    } else {
        return Vec::new();
    };

    debug!("court escalation fired: {text}");
    state.court.escalation_fired = true;
    state.court.current_escalations.push(text.to_string());
    vec![text.to_string()]
}

fn push_reactions(state: &mut GameState, strategy: CourtStrategy, scores: &[f64], cfg: &CourtConfig) {
    let court = &mut state.court;
    let mut ordered: Vec<(String, f64)> = court
        .npcs
        .iter()
        .zip(scores)
        .map(|(npc, &score)| (npc.id.clone(), score))
        .collect();
    ordered.sort_by(|a, b| b.1.total_cmp(&a.1));

    let supporters: Vec<String> = ordered
        .iter()
        .filter(|(_, score)| *score >= 0.5)
        .take(2)
        .map(|(id, _)| id.clone())
        .collect();
    let opposers: Vec<String> = ordered
        .iter()
        .rev()
        .filter(|(_, score)| *score < 0.0)
        .take(2)
        .map(|(id, _)| id.clone())
        .collect();

    for npc_id in &opposers {
        court.push_npc_line(npc_id, MessageScene::Round, negative_line(npc_id, strategy));
    }
    for npc_id in &supporters {
        court.push_npc_line(npc_id, MessageScene::Round, positive_line(npc_id, strategy));
    }

    let supports = |id: &str| supporters.iter().any(|s| s == id);
    let opposes = |id: &str| opposers.iter().any(|s| s == id);
    if supports(CLERK_ID) && opposes(VANGUARD_ID) {
        court.push_npc_line(VANGUARD_ID, MessageScene::Round, RIVALRY_VANGUARD_LINE);
    } else if supports(VANGUARD_ID) && opposes(CLERK_ID) {
        court.push_npc_line(CLERK_ID, MessageScene::Round, RIVALRY_CLERK_LINE);
    }

    let line = progress_line(court.support, court.time_pressure, cfg);
    court.push_npc_line(EMPEROR_ID, MessageScene::Round, line);
}
