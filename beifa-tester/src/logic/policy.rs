use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use beifa_game::court::auto_strategy;
use beifa_game::graph::ChoiceOption;
use beifa_game::{ActionPayload, CourtStrategy, EventGraph, GameState, Resource};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Serialize, Serializer};

/// Move returned by a [`PlayerPolicy`].
#[derive(Debug, Clone)]
pub struct PolicyDecision {
    pub action: &'static str,
    pub payload: ActionPayload,
    pub rationale: Option<String>,
}

impl PolicyDecision {
    #[must_use]
    pub fn new(action: &'static str, payload: ActionPayload, rationale: Option<String>) -> Self {
        Self {
            action,
            payload,
            rationale,
        }
    }

    fn next_turn(rationale: &str) -> Self {
        Self::new(
            "next_turn",
            ActionPayload::default(),
            Some(rationale.to_string()),
        )
    }
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Index into the enabled options at the current node.
    fn pick_option(&mut self, state: &GameState, options: &[&ChoiceOption]) -> usize;

    /// Pick a move while the court is in session.
    fn court_move(&mut self, state: &GameState) -> PolicyDecision {
        let strategy = auto_strategy(&state.court);
        PolicyDecision::new(
            "court_strategy",
            ActionPayload::strategy(strategy.as_str()),
            Some(format!("auto {strategy}")),
        )
    }

    /// Full decision for the current state.
    fn decide(&mut self, state: &GameState, graph: &EventGraph) -> PolicyDecision {
        if state.court.is_active {
            return self.court_move(state);
        }
        let Some(node) = graph.node(&state.current_node_id) else {
            return PolicyDecision::next_turn("node missing");
        };
        let options: Vec<&ChoiceOption> = state
            .current_event
            .enabled_options()
            .filter_map(|view| node.option(&view.id))
            .collect();
        if options.is_empty() {
            return PolicyDecision::next_turn("no enabled option");
        }
        let index = self.pick_option(state, &options).min(options.len() - 1);
        let option = options[index];
        PolicyDecision::new(
            "choose_option",
            ActionPayload::option(option.id.clone()),
            Some(format!("{} via {}", option.id, self.name())),
        )
    }
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameplayStrategy {
    Balanced,
    Aggressive,
    Cautious,
    MonteCarlo,
}

impl GameplayStrategy {
    pub const ALL: [Self; 4] = [
        Self::Balanced,
        Self::Aggressive,
        Self::Cautious,
        Self::MonteCarlo,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Balanced => "Balanced",
            Self::Aggressive => "Aggressive",
            Self::Cautious => "Cautious",
            Self::MonteCarlo => "Monte Carlo",
        }
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::Aggressive => "aggressive",
            Self::Cautious => "cautious",
            Self::MonteCarlo => "monte-carlo",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        match self {
            Self::Balanced => Box::new(BalancedPolicy),
            Self::Aggressive => Box::new(AggressivePolicy),
            Self::Cautious => Box::new(CautiousPolicy),
            Self::MonteCarlo => Box::new(MonteCarloPolicy::new(seed)),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for GameplayStrategy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl FromStr for GameplayStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "balanced" => Ok(Self::Balanced),
            "aggressive" => Ok(Self::Aggressive),
            "cautious" | "conservative" => Ok(Self::Cautious),
            "monte-carlo" | "montecarlo" | "mc" => Ok(Self::MonteCarlo),
            other => bail!("Unknown gameplay strategy: {other}"),
        }
    }
}

struct BalancedPolicy;
struct AggressivePolicy;
struct CautiousPolicy;

struct MonteCarloPolicy {
    rng: ChaCha20Rng,
    simulations: u32,
}

impl MonteCarloPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            simulations: 12,
        }
    }
}

impl PlayerPolicy for BalancedPolicy {
    fn name(&self) -> &'static str {
        "Balanced"
    }

    fn pick_option(&mut self, state: &GameState, options: &[&ChoiceOption]) -> usize {
        best_by(options, |option| balanced_score(state, option))
    }
}

impl PlayerPolicy for AggressivePolicy {
    fn name(&self) -> &'static str {
        "Aggressive"
    }

    fn pick_option(&mut self, _state: &GameState, options: &[&ChoiceOption]) -> usize {
        best_by(options, aggressive_score)
    }

    fn court_move(&mut self, state: &GameState) -> PolicyDecision {
        let court = &state.court;
        let strategy = if court.temperature > 40 {
            CourtStrategy::RationalArgument
        } else {
            CourtStrategy::AuthorityPressure
        };
        PolicyDecision::new(
            "court_strategy",
            ActionPayload::strategy(strategy.as_str()),
            Some(format!("press {strategy}")),
        )
    }
}

impl PlayerPolicy for CautiousPolicy {
    fn name(&self) -> &'static str {
        "Cautious"
    }

    fn pick_option(&mut self, _state: &GameState, options: &[&ChoiceOption]) -> usize {
        best_by(options, |option| -risk(option))
    }

    fn court_move(&mut self, state: &GameState) -> PolicyDecision {
        let court = &state.court;
        if court.support >= 60 && court.temperature < 30 {
            return PolicyDecision::new(
                "court_fast_forward",
                ActionPayload::default(),
                Some(format!("support {} is enough", court.support)),
            );
        }
        PolicyDecision::new(
            "court_statement",
            ActionPayload::statement(
                "Secure the grain roads and the granaries before the army moves.",
                None,
            ),
            Some("argue supply".to_string()),
        )
    }
}

impl PlayerPolicy for MonteCarloPolicy {
    fn name(&self) -> &'static str {
        "Monte Carlo"
    }

    fn pick_option(&mut self, state: &GameState, options: &[&ChoiceOption]) -> usize {
        let mut best = (0, i64::MIN);
        for (index, option) in options.iter().enumerate() {
            let base = balanced_score(state, option);
            let mut total = 0_i64;
            for _ in 0..self.simulations {
                total += base + self.rng.gen_range(-6_i64..=6);
            }
            if total > best.1 {
                best = (index, total);
            }
        }
        best.0
    }

    fn court_move(&mut self, state: &GameState) -> PolicyDecision {
        let strategy = if self.rng.gen_bool(0.25) {
            CourtStrategy::ALL[self.rng.gen_range(0..CourtStrategy::ALL.len())]
        } else {
            auto_strategy(&state.court)
        };
        PolicyDecision::new(
            "court_strategy",
            ActionPayload::strategy(strategy.as_str()),
            Some(format!("sampled {strategy}")),
        )
    }
}

fn best_by<F>(options: &[&ChoiceOption], mut score: F) -> usize
where
    F: FnMut(&ChoiceOption) -> i64,
{
    options
        .iter()
        .enumerate()
        .map(|(index, option)| (index, score(*option)))
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
        .map_or(0, |(index, _)| index)
}

fn delta(option: &ChoiceOption, resource: Resource) -> i64 {
    i64::from(option.effects.delta.get(&resource).copied().unwrap_or(0))
}

/// Weights each resource by how scarce it currently is.
fn balanced_score(state: &GameState, option: &ChoiceOption) -> i64 {
    let food_weight = if state.food < 60 { 3 } else { 1 };
    let morale_weight = if state.morale < 40 { 3 } else { 1 };
    let doom_weight = if state.doom >= 8 { 6 } else { 3 };
    delta(option, Resource::Food) * food_weight
        + delta(option, Resource::Morale) * morale_weight
        + delta(option, Resource::Politics) * 2
        + delta(option, Resource::GuanzhongTurns) * 8
        + delta(option, Resource::LongyouTurns) * 4
        - delta(option, Resource::WeiPressure) * 2
        - delta(option, Resource::Doom) * doom_weight
}

fn aggressive_score(option: &ChoiceOption) -> i64 {
    delta(option, Resource::GuanzhongTurns) * 20
        + delta(option, Resource::LongyouTurns) * 10
        + delta(option, Resource::Morale)
        - delta(option, Resource::Food) / 10
}

fn risk(option: &ChoiceOption) -> i64 {
    let losses: i64 = option
        .effects
        .delta
        .iter()
        .filter(|(resource, _)| !matches!(resource, Resource::Doom | Resource::WeiPressure))
        .map(|(_, amount)| i64::from((*amount).min(0)).abs())
        .sum();
    losses + delta(option, Resource::Doom) * 5 + delta(option, Resource::WeiPressure) * 3
}
