pub mod policy;
pub mod reports;
pub mod seeds;
pub mod simulation;

pub use policy::GameplayStrategy;
pub use reports::{StrategySummary, summarize};
pub use seeds::resolve_seed_inputs;
pub use simulation::{RunRecord, run_matrix};

/// Split a comma-separated CLI value, dropping blanks.
#[must_use]
pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Parse a strategy list; `all` expands to every built-in strategy.
///
/// # Errors
///
/// Returns an error for an unknown strategy name.
pub fn resolve_strategies(raw: &str) -> anyhow::Result<Vec<GameplayStrategy>> {
    let tokens = split_csv(raw);
    if tokens.is_empty() || tokens.iter().any(|t| t.eq_ignore_ascii_case("all")) {
        return Ok(GameplayStrategy::ALL.to_vec());
    }
    let mut strategies = Vec::new();
    for token in tokens {
        let strategy: GameplayStrategy = token.parse()?;
        if !strategies.contains(&strategy) {
            strategies.push(strategy);
        }
    }
    Ok(strategies)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_csv_trims_and_filters() {
        assert_eq!(split_csv(" alpha, ,beta,  gamma "), vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn strategies_expand_and_dedupe() {
        assert_eq!(resolve_strategies("all").unwrap().len(), 4);
        assert_eq!(
            resolve_strategies("cautious,conservative,mc").unwrap(),
            vec![GameplayStrategy::Cautious, GameplayStrategy::MonteCarlo]
        );
        assert!(resolve_strategies("balanced,yolo").is_err());
    }
}
