use beifa_game::{
    ActionPayload, GameEngine, GameState, MemoryStore, SessionRng, SessionStore, TraceEvent,
    TurnController, replay_actions, state_digest,
};

const STEPS: usize = 80;

/// First enabled option, otherwise `next_turn`.
fn play(engine: &GameEngine<MemoryStore>, seed: u64) -> GameState {
    let mut state = engine.new_game(Some(seed)).unwrap();
    for _ in 0..STEPS {
        if !state.outcome.is_ongoing() {
            break;
        }
        let choice = state
            .current_event
            .enabled_options()
            .next()
            .map(|opt| opt.id.clone());
        state = match choice {
            Some(option) => engine
                .act(&state.game_id, "choose_option", &ActionPayload::option(option))
                .unwrap(),
            None => engine
                .act(&state.game_id, "next_turn", &ActionPayload::default())
                .unwrap(),
        };
    }
    state
}

#[test]
fn same_seed_same_actions_same_game() {
    for seed in [7_u64, 2024, 31_337] {
        let first = play(&GameEngine::standard(MemoryStore::new()).unwrap(), seed);
        let second = play(&GameEngine::standard(MemoryStore::new()).unwrap(), seed);
        assert_eq!(first.outcome, second.outcome);
        assert_eq!(first.turn, second.turn);
        assert_eq!(first.current_node_id, second.current_node_id);
        assert_eq!(first.roll_count, second.roll_count);
        assert_eq!(
            (first.food, first.morale, first.politics, first.doom),
            (second.food, second.morale, second.politics, second.doom)
        );
        assert_eq!(state_digest(&first), state_digest(&second));
    }
}

#[test]
fn recorded_actions_rebuild_the_same_state() {
    let engine = GameEngine::standard(MemoryStore::new()).unwrap();
    let state = play(&engine, 4242);
    let replay = engine.get_replay(&state.game_id).unwrap();
    assert!(!replay.actions.is_empty());

    let controller = TurnController::standard().unwrap();
    let rebuilt = replay_actions(&controller, &replay.game_id, replay.seed, &replay.actions)
        .unwrap();
    assert_eq!(state_digest(&rebuilt.state), state_digest(&state));
    assert_eq!(rebuilt.actions, replay.actions);
    assert!(engine.verify_replay(&state.game_id).unwrap());
}

#[test]
fn stored_snapshot_resumes_the_random_stream() {
    let engine = GameEngine::standard(MemoryStore::new()).unwrap();
    let state = engine.new_game(Some(555)).unwrap();
    let session = engine.store().get(&state.game_id).unwrap().unwrap();
    let snapshot = session.rng.snapshot();

    let mut live = session.rng.clone();
    let mut restored = SessionRng::restore(&snapshot);
    for _ in 0..16 {
        assert_eq!(live.unit().to_bits(), restored.unit().to_bits());
    }
    assert_eq!(live.draws(), restored.draws());
}

#[test]
fn diagnostics_record_accepted_actions() {
    let engine = GameEngine::standard(MemoryStore::new()).unwrap();
    let state = play(&engine, 99);
    let replay = engine.get_replay(&state.game_id).unwrap();
    assert!(
        replay
            .diagnostics
            .iter()
            .any(|entry| entry.event == TraceEvent::Action && entry.action.is_some())
    );
    assert!(replay.diagnostics.len() <= 256);
}
