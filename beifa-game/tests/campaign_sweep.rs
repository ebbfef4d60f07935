use beifa_game::constants::{
    LOG_CAPACITY, MAX_DOOM, MAX_HEALTH, MAX_HOLDING_TURNS, MAX_MORALE, MAX_POLITICS,
    MAX_TURNS_PER_RUN, MAX_WEI_PRESSURE, MOMENTUM_LIMIT, RESENTMENT_MAX,
};
use beifa_game::places::PLACE_ORDER;
use beifa_game::{ActionPayload, GameEngine, GameState, MemoryStore, Outcome};

const SEEDS: u64 = 40;

fn assert_invariants(state: &GameState) {
    let ctx = format!("game {} turn {}", state.game_id, state.turn);
    assert!((0..=state.max_food()).contains(&state.food), "{ctx}: food {}", state.food);
    assert!((0..=MAX_MORALE).contains(&state.morale), "{ctx}");
    assert!((0..=MAX_POLITICS).contains(&state.politics), "{ctx}");
    assert!((0..=MAX_WEI_PRESSURE).contains(&state.wei_pressure), "{ctx}");
    assert!((0..=MAX_HEALTH).contains(&state.health), "{ctx}");
    assert!((0..=MAX_DOOM).contains(&state.doom), "{ctx}");
    assert!((0..=MAX_HOLDING_TURNS).contains(&state.longyou_turns), "{ctx}");
    assert!((0..=MAX_HOLDING_TURNS).contains(&state.guanzhong_turns), "{ctx}");
    assert!((0.0..=1.0).contains(&state.route_progress), "{ctx}");
    assert!(state.log.len() <= LOG_CAPACITY, "{ctx}");

    let court = &state.court;
    assert!((0..=100).contains(&court.support), "{ctx}");
    assert!((-100..=100).contains(&court.temperature), "{ctx}");
    assert!((-MOMENTUM_LIMIT..=MOMENTUM_LIMIT).contains(&court.momentum), "{ctx}");
    assert!(
        court
            .npcs
            .iter()
            .all(|npc| (0..=RESENTMENT_MAX).contains(&npc.resentment)),
        "{ctx}"
    );

    let ranks: Vec<usize> = state
        .controlled_locations
        .iter()
        .map(|place| PLACE_ORDER.iter().position(|known| known == place).unwrap())
        .collect();
    assert!(ranks.windows(2).all(|pair| pair[0] < pair[1]), "{ctx}");
    if state.outcome == Outcome::Ongoing && !court.is_active {
        assert!(!state.current_event.options.is_empty(), "{ctx}: stuck");
    }
}

/// Rotates through every action so each path is exercised.
fn next_action(state: &GameState, step: usize) -> (&'static str, ActionPayload) {
    if state.court.is_active {
        return match step % 4 {
            0 => ("court_strategy", ActionPayload::strategy("reason")),
            1 => (
                "court_statement",
                ActionPayload::statement("Secure the grain roads before we risk the army.", None),
            ),
            2 => ("court_choice", ActionPayload::option("ask_budget")),
            _ => ("court_fast_forward", ActionPayload::default()),
        };
    }
    let enabled: Vec<&str> = state
        .current_event
        .enabled_options()
        .map(|opt| opt.id.as_str())
        .collect();
    if enabled.is_empty() || step % 7 == 6 {
        return ("next_turn", ActionPayload::default());
    }
    let pick = enabled[(step * 31 + state.turn as usize) % enabled.len()];
    ("choose_option", ActionPayload::option(pick))
}

#[test]
fn seeded_campaigns_keep_every_invariant() {
    let engine = GameEngine::standard(MemoryStore::new()).unwrap();
    let mut finished = 0;
    for seed in 1..=SEEDS {
        let mut state = engine.new_game(Some(seed)).unwrap();
        assert_invariants(&state);
        for step in 0..MAX_TURNS_PER_RUN as usize {
            if !state.outcome.is_ongoing() {
                break;
            }
            let (action, payload) = next_action(&state, step);
            state = engine
                .act(&state.game_id, action, &payload)
                .unwrap_or_else(|err| panic!("seed {seed} step {step} {action}: {err}"));
            assert_invariants(&state);
        }
        if !state.outcome.is_ongoing() {
            finished += 1;
        }
        assert!(engine.verify_replay(&state.game_id).unwrap(), "seed {seed}");
    }
    assert!(finished > 0);
}

#[test]
fn late_era_caps_food_for_the_rest_of_the_game() {
    let engine = GameEngine::standard(MemoryStore::new()).unwrap();
    for seed in 1..=SEEDS {
        let mut state = engine.new_game(Some(seed)).unwrap();
        for step in 0..MAX_TURNS_PER_RUN as usize {
            if !state.outcome.is_ongoing() {
                break;
            }
            let (action, payload) = next_action(&state, step);
            state = engine.act(&state.game_id, action, &payload).unwrap();
            if state.is_post_zhuge_era() {
                assert_eq!(state.health, 0);
                assert!(state.food <= 128);
            }
        }
    }
}
