use beifa_game::{ActionPayload, EngineError, GameEngine, MemoryStore, SessionStore};

fn engine() -> GameEngine<MemoryStore> {
    GameEngine::standard(MemoryStore::new()).unwrap()
}

#[test]
fn first_option_then_next_turn_moves_one_turn() {
    let engine = engine();
    let start = engine.new_game(Some(2024)).unwrap();
    let option = start
        .current_event
        .enabled_options()
        .next()
        .map(|opt| opt.id.clone())
        .unwrap();

    let chosen = engine
        .act(&start.game_id, "choose_option", &ActionPayload::option(option))
        .unwrap();
    let advanced = engine
        .act(&start.game_id, "next_turn", &ActionPayload::default())
        .unwrap();

    assert_eq!(advanced.turn, chosen.turn + 1);
    assert!(advanced.log.len() > start.log.len());
    assert!(chosen.roll_count >= start.roll_count);
    assert!(advanced.roll_count >= chosen.roll_count);
}

#[test]
fn crisis_pressure_convenes_the_court() {
    let engine = engine();
    let game_id = engine.new_game(Some(77)).unwrap().game_id;

    let mut session = engine.store().get(&game_id).unwrap().unwrap();
    let state = &mut session.state;
    state.turn = 2;
    state.food = 40;
    state.morale = 30;
    state.doom = 9;
    state.court.momentum = -3;
    state.longyou_collapsed = true;
    engine.store().save(&session).unwrap();

    let state = engine
        .act(&game_id, "next_turn", &ActionPayload::default())
        .unwrap();
    assert!(state.court.is_active);
    assert_eq!(state.turn, 2);
    assert!(!state.court.pending_messages.is_empty());
}

#[test]
fn bad_requests_are_rejected() {
    let engine = engine();
    assert!(matches!(
        engine.get_state("game-9999"),
        Err(EngineError::NotFound(_))
    ));
    assert!(matches!(
        engine.act("game-9999", "next_turn", &ActionPayload::default()),
        Err(EngineError::NotFound(_))
    ));

    let game_id = engine.new_game(Some(1)).unwrap().game_id;
    assert!(matches!(
        engine.act(&game_id, "launch_fireworks", &ActionPayload::default()),
        Err(EngineError::InvalidAction { .. })
    ));
    assert!(matches!(
        engine.act(&game_id, "choose_option", &ActionPayload::default()),
        Err(EngineError::InvalidAction { .. })
    ));
    assert!(matches!(
        engine.act(&game_id, "court_strategy", &ActionPayload::strategy("bribery")),
        Err(EngineError::InvalidAction { .. })
    ));
}

#[test]
fn legacy_aliases_choose_options() {
    let engine = engine();
    let game_id = engine.new_game(Some(3)).unwrap().game_id;
    let state = engine
        .act(
            &game_id,
            "recover_choice",
            &ActionPayload::option("recover_first"),
        )
        .unwrap();
    assert_eq!(state.current_node_id, "recover_hub");
    let replay = engine.get_replay(&game_id).unwrap();
    assert_eq!(replay.actions[0].action.as_str(), "choose_option");
}

#[test]
fn disabled_option_is_rejected() {
    let engine = engine();
    let game_id = engine.new_game(Some(8)).unwrap().game_id;
    let mut session = engine.store().get(&game_id).unwrap().unwrap();
    session.state.current_node_id = "wuzhang_camp".into();
    engine.store().save(&session).unwrap();

    // Final assault needs Longyou secured first.
    let err = engine
        .act(&game_id, "choose_option", &ActionPayload::option("launch_final"))
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAction { .. }));
}

#[test]
fn finished_games_return_state_unchanged() {
    let engine = engine();
    let game_id = engine.new_game(Some(12)).unwrap().game_id;
    let mut session = engine.store().get(&game_id).unwrap().unwrap();
    session.state.guanzhong_turns = 3;
    engine.store().save(&session).unwrap();

    let won = engine
        .act(&game_id, "next_turn", &ActionPayload::default())
        .unwrap();
    assert_eq!(won.outcome.as_str(), "WIN");

    let again = engine
        .act(&game_id, "next_turn", &ActionPayload::default())
        .unwrap();
    assert_eq!(again.turn, won.turn);
    assert_eq!(again.log, won.log);
    assert!(matches!(
        engine.act(&game_id, "no_such_action", &ActionPayload::default()),
        Err(EngineError::InvalidAction { .. })
    ));
}
