use anyhow::{Context, Result};
use beifa_game::{GameEngine, GameState, MemoryStore};
use log::{debug, warn};
use serde::Serialize;

use crate::logic::policy::{GameplayStrategy, PlayerPolicy};
use crate::logic::seeds::seed_for_run;

/// Configuration for one automated game.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub seed: u64,
    pub strategy: GameplayStrategy,
    pub max_steps: usize,
    pub verify_replay: bool,
}

impl SimulationConfig {
    #[must_use]
    pub const fn new(strategy: GameplayStrategy, seed: u64) -> Self {
        Self {
            seed,
            strategy,
            max_steps: 220,
            verify_replay: false,
        }
    }

    #[must_use]
    pub const fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    #[must_use]
    pub const fn with_replay_check(mut self, verify_replay: bool) -> Self {
        self.verify_replay = verify_replay;
        self
    }
}

/// Result of playing one game to its end or to the step cap.
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub seed: u64,
    pub strategy: GameplayStrategy,
    pub outcome: String,
    pub final_node: String,
    pub turns: u32,
    pub steps: usize,
    pub rolls: u64,
    pub doom: i32,
    pub late_era: bool,
    pub court_sessions: u32,
    pub court_passes: u32,
    pub replay_verified: Option<bool>,
    pub error: Option<String>,
}

impl RunRecord {
    fn from_state(config: &SimulationConfig, state: &GameState, steps: usize) -> Self {
        Self {
            seed: config.seed,
            strategy: config.strategy,
            outcome: state.outcome.as_str().to_string(),
            final_node: state.current_node_id.clone(),
            turns: state.turn,
            steps,
            rolls: state.roll_count,
            doom: state.doom,
            late_era: state.is_post_zhuge_era(),
            court_sessions: state.court.session_id,
            court_passes: 0,
            replay_verified: None,
            error: None,
        }
    }

    /// Ongoing when the step cap ran out with no error.
    #[must_use]
    pub fn is_stuck(&self) -> bool {
        self.error.is_none() && self.outcome == "ONGOING"
    }

    #[must_use]
    pub fn is_win(&self) -> bool {
        self.outcome == "WIN"
    }

    #[must_use]
    pub fn replay_mismatch(&self) -> bool {
        self.replay_verified == Some(false)
    }
}

/// Play one game through the public action surface, then drop it from the store.
pub fn run_game(engine: &GameEngine<MemoryStore>, config: SimulationConfig) -> RunRecord {
    let mut policy = config.strategy.create_policy(config.seed);
    let mut state = match engine.new_game(Some(config.seed)) {
        Ok(state) => state,
        Err(err) => {
            let mut record = RunRecord::from_state(&config, &GameState::new("", config.seed), 0);
            record.error = Some(err.to_string());
            return record;
        }
    };
    let game_id = state.game_id.clone();

    let mut steps = 0;
    let mut passes = 0;
    let mut last_settled = 0;
    let mut error = None;
    while steps < config.max_steps && state.outcome.is_ongoing() {
        let decision = policy.decide(&state, engine.controller().graph());
        debug!(
            "[{} seed {}] turn {} {} ({})",
            policy.name(),
            config.seed,
            state.turn,
            decision.action,
            decision.rationale.as_deref().unwrap_or("-")
        );
        match engine.act(&game_id, decision.action, &decision.payload) {
            Ok(next) => state = next,
            Err(err) => {
                warn!("seed {} rejected {}: {err}", config.seed, decision.action);
                error = Some(format!("turn {}: {} failed: {err}", state.turn, decision.action));
                break;
            }
        }
        steps += 1;
        if let Some(resolution) = &state.court.last_resolution
            && resolution.session_id != last_settled
        {
            last_settled = resolution.session_id;
            passes += u32::from(resolution.result.is_pass());
        }
    }

    let mut record = RunRecord::from_state(&config, &state, steps);
    record.court_passes = passes;
    record.error = error;
    if config.verify_replay {
        match engine.verify_replay(&game_id) {
            Ok(matched) => record.replay_verified = Some(matched),
            Err(err) => {
                record.replay_verified = Some(false);
                if record.error.is_none() {
                    record.error = Some(format!("replay: {err}"));
                }
            }
        }
    }
    if let Err(err) = engine.reset(Some(&game_id)) {
        warn!("could not drop {game_id}: {err}");
    }
    record
}

/// Every strategy over every seed, `runs` consecutive seeds per input seed.
pub fn run_matrix(
    seeds: &[u64],
    runs: usize,
    strategies: &[GameplayStrategy],
    max_steps: usize,
    verify_replay: bool,
) -> Result<Vec<RunRecord>> {
    let engine = GameEngine::standard(MemoryStore::new())
        .context("bundled campaign failed validation")?;
    let mut records = Vec::with_capacity(seeds.len() * runs.max(1) * strategies.len());
    for &strategy in strategies {
        for &base in seeds {
            for run in 0..runs.max(1) {
                let config = SimulationConfig::new(strategy, seed_for_run(base, run))
                    .with_max_steps(max_steps)
                    .with_replay_check(verify_replay);
                records.push(run_game(&engine, config));
            }
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn games_finish_or_hit_the_cap_without_errors() {
        let records = run_matrix(&[5, 900], 2, &GameplayStrategy::ALL, 220, true).unwrap();
        assert_eq!(records.len(), 16);
        for record in &records {
            assert!(record.error.is_none(), "{record:?}");
            assert_eq!(record.replay_verified, Some(true), "{record:?}");
            assert!(record.steps <= 220);
            assert!(record.court_passes <= record.court_sessions);
        }
    }

    #[test]
    fn same_config_same_record() {
        let engine = GameEngine::standard(MemoryStore::new()).unwrap();
        let config = SimulationConfig::new(GameplayStrategy::MonteCarlo, 77);
        let first = run_game(&engine, config);
        let second = run_game(&engine, config);
        assert_eq!(first.outcome, second.outcome);
        assert_eq!(first.turns, second.turns);
        assert_eq!(first.rolls, second.rolls);
        assert_eq!(first.final_node, second.final_node);
    }

    #[test]
    fn finished_games_are_dropped_from_the_store() {
        let engine = GameEngine::standard(MemoryStore::new()).unwrap();
        run_game(&engine, SimulationConfig::new(GameplayStrategy::Balanced, 3));
        assert!(engine.store().is_empty());
    }
}
