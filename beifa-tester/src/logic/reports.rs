use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::time::Duration;

use super::policy::GameplayStrategy;
use super::simulation::RunRecord;

/// Per-strategy rollup of a run matrix.
#[derive(Debug, Clone, Serialize)]
pub struct StrategySummary {
    pub strategy: GameplayStrategy,
    pub games: usize,
    pub wins: usize,
    pub defeats: usize,
    pub stuck: usize,
    pub errors: usize,
    pub late_era: usize,
    pub mean_turns: f64,
    pub mean_court_sessions: f64,
    pub court_pass_rate: f64,
    pub replay_mismatches: usize,
}

impl StrategySummary {
    #[must_use]
    pub fn win_rate(&self) -> f64 {
        ratio(self.wins, self.games)
    }

    /// A strategy fails the sweep on any error or replay mismatch.
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.errors == 0 && self.replay_mismatches == 0
    }
}

/// Outcomes for one seed across every strategy that played it.
#[derive(Debug, Clone, Serialize)]
pub struct SeedSummary {
    pub seed: u64,
    pub games: usize,
    pub wins: usize,
    pub defeats: usize,
    pub stuck: usize,
    pub mean_turns: f64,
}

#[allow(clippy::cast_precision_loss)]
fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0_usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

#[must_use]
pub fn summarize(records: &[RunRecord]) -> Vec<StrategySummary> {
    let mut grouped: BTreeMap<&'static str, Vec<&RunRecord>> = BTreeMap::new();
    for record in records {
        grouped.entry(record.strategy.key()).or_default().push(record);
    }

    grouped
        .into_values()
        .filter_map(|group| {
            let strategy = group.first()?.strategy;
            let sessions: u32 = group.iter().map(|r| r.court_sessions).sum();
            let passes: u32 = group.iter().map(|r| r.court_passes).sum();
            Some(StrategySummary {
                strategy,
                games: group.len(),
                wins: group.iter().filter(|r| r.is_win()).count(),
                defeats: group.iter().filter(|r| r.outcome == "DEFEAT_SHU").count(),
                stuck: group.iter().filter(|r| r.is_stuck()).count(),
                errors: group.iter().filter(|r| r.error.is_some()).count(),
                late_era: group.iter().filter(|r| r.late_era).count(),
                mean_turns: mean(group.iter().map(|r| f64::from(r.turns))),
                mean_court_sessions: mean(group.iter().map(|r| f64::from(r.court_sessions))),
                court_pass_rate: ratio(passes as usize, sessions as usize),
                replay_mismatches: group.iter().filter(|r| r.replay_mismatch()).count(),
            })
        })
        .collect()
}

#[must_use]
pub fn summarize_seeds(records: &[RunRecord]) -> Vec<SeedSummary> {
    let mut grouped: BTreeMap<u64, Vec<&RunRecord>> = BTreeMap::new();
    for record in records {
        grouped.entry(record.seed).or_default().push(record);
    }
    grouped
        .into_iter()
        .map(|(seed, group)| SeedSummary {
            seed,
            games: group.len(),
            wins: group.iter().filter(|r| r.is_win()).count(),
            defeats: group.iter().filter(|r| r.outcome == "DEFEAT_SHU").count(),
            stuck: group.iter().filter(|r| r.is_stuck()).count(),
            mean_turns: mean(group.iter().map(|r| f64::from(r.turns))),
        })
        .collect()
}

pub fn generate_console_report(
    out: &mut dyn Write,
    records: &[RunRecord],
    summaries: &[StrategySummary],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Campaign Sweep Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "=========================".cyan())?;
    writeln!(out, "Games played: {}", records.len())?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for summary in summaries {
        let status = if summary.passed() {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(out, "{} {}", status, summary.strategy.label().bold())?;
        writeln!(
            out,
            "   Wins {} / Defeats {} / Stuck {} of {} ({:.1}% won)",
            summary.wins.to_string().green(),
            summary.defeats.to_string().red(),
            summary.stuck,
            summary.games,
            summary.win_rate() * 100.0
        )?;
        writeln!(
            out,
            "   Mean turns {:.1}, court sessions {:.1}, court pass rate {:.0}%",
            summary.mean_turns,
            summary.mean_court_sessions,
            summary.court_pass_rate * 100.0
        )?;
        if summary.late_era > 0 {
            writeln!(out, "   Reached the late era: {}", summary.late_era)?;
        }
        if summary.replay_mismatches > 0 {
            writeln!(
                out,
                "   {}",
                format!("Replay mismatches: {}", summary.replay_mismatches).red()
            )?;
        }
        writeln!(out)?;
    }

    writeln!(out, "{}", "🎲 Per Seed".bright_yellow().bold())?;
    for seed in summarize_seeds(records) {
        writeln!(
            out,
            "  seed {:>10}: {} won, {} lost, {} stuck, {:.1} turns",
            seed.seed, seed.wins, seed.defeats, seed.stuck, seed.mean_turns
        )?;
    }
    writeln!(out)?;

    let failures: Vec<&RunRecord> = records.iter().filter(|r| r.error.is_some()).collect();
    if !failures.is_empty() {
        writeln!(out, "{}", "Failures".bright_red().bold())?;
        for record in failures {
            writeln!(
                out,
                "  • [{} seed {}] {}",
                record.strategy.key(),
                record.seed,
                record.error.as_deref().unwrap_or_default().red()
            )?;
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    summaries: &'a [StrategySummary],
    seeds: Vec<SeedSummary>,
    runs: &'a [RunRecord],
}

pub fn generate_json_report(
    out: &mut dyn Write,
    records: &[RunRecord],
    summaries: &[StrategySummary],
) -> Result<()> {
    let report = JsonReport {
        generated_at: Utc::now().to_rfc3339(),
        summaries,
        seeds: summarize_seeds(records),
        runs: records,
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_markdown_report(
    out: &mut dyn Write,
    records: &[RunRecord],
    summaries: &[StrategySummary],
) -> Result<()> {
    writeln!(out, "# Beifa Campaign Sweep\n")?;
    writeln!(out, "_Generated {}_\n", Utc::now().format("%Y-%m-%d %H:%M UTC"))?;
    writeln!(out, "- **Games**: {}\n", records.len())?;

    writeln!(out, "## Strategies\n")?;
    writeln!(
        out,
        "| Strategy | Games | Wins | Defeats | Stuck | Win rate | Mean turns | Court pass rate | Replay mismatches |"
    )?;
    writeln!(out, "|---|---|---|---|---|---|---|---|---|")?;
    for s in summaries {
        writeln!(
            out,
            "| {} | {} | {} | {} | {} | {:.1}% | {:.1} | {:.0}% | {} |",
            s.strategy.label(),
            s.games,
            s.wins,
            s.defeats,
            s.stuck,
            s.win_rate() * 100.0,
            s.mean_turns,
            s.court_pass_rate * 100.0,
            s.replay_mismatches
        )?;
    }

    writeln!(out, "\n## Seeds\n")?;
    writeln!(out, "| Seed | Games | Wins | Defeats | Stuck | Mean turns |")?;
    writeln!(out, "|---|---|---|---|---|---|")?;
    for seed in summarize_seeds(records) {
        writeln!(
            out,
            "| {} | {} | {} | {} | {} | {:.1} |",
            seed.seed, seed.games, seed.wins, seed.defeats, seed.stuck, seed.mean_turns
        )?;
    }

    let failures: Vec<&RunRecord> = records.iter().filter(|r| r.error.is_some()).collect();
    if !failures.is_empty() {
        writeln!(out, "\n## Failures\n")?;
        for record in failures {
            writeln!(
                out,
                "- `{}` seed {}: {}",
                record.strategy.key(),
                record.seed,
                record.error.as_deref().unwrap_or_default()
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(strategy: GameplayStrategy, outcome: &str, turns: u32) -> RunRecord {
        RunRecord {
            seed: 1,
            strategy,
            outcome: outcome.to_string(),
            final_node: "WIN".to_string(),
            turns,
            steps: 10,
            rolls: 2,
            doom: 3,
            late_era: false,
            court_sessions: 2,
            court_passes: 1,
            replay_verified: Some(true),
            error: None,
        }
    }

    #[test]
    fn summaries_group_by_strategy() {
        let records = vec![
            record(GameplayStrategy::Balanced, "WIN", 10),
            record(GameplayStrategy::Balanced, "DEFEAT_SHU", 20),
            record(GameplayStrategy::Cautious, "ONGOING", 30),
        ];
        let summaries = summarize(&records);
        assert_eq!(summaries.len(), 2);
        let balanced = summaries
            .iter()
            .find(|s| s.strategy == GameplayStrategy::Balanced)
            .unwrap();
        assert_eq!((balanced.wins, balanced.defeats), (1, 1));
        assert!((balanced.mean_turns - 15.0).abs() < f64::EPSILON);
        assert!((balanced.court_pass_rate - 0.5).abs() < f64::EPSILON);
        let cautious = summaries
            .iter()
            .find(|s| s.strategy == GameplayStrategy::Cautious)
            .unwrap();
        assert_eq!(cautious.stuck, 1);

        let seeds = summarize_seeds(&records);
        assert_eq!(seeds.len(), 1);
        assert_eq!((seeds[0].games, seeds[0].wins, seeds[0].stuck), (3, 1, 1));
        assert!((seeds[0].mean_turns - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn mismatches_fail_the_summary() {
        let mut bad = record(GameplayStrategy::Aggressive, "WIN", 5);
        bad.replay_verified = Some(false);
        let summaries = summarize(&[bad]);
        assert!(!summaries[0].passed());
    }

    #[test]
    fn reports_render_every_format() {
        let records = vec![record(GameplayStrategy::MonteCarlo, "WIN", 12)];
        let summaries = summarize(&records);

        let mut json = Vec::new();
        generate_json_report(&mut json, &records, &summaries).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(parsed["runs"][0]["strategy"], "monte-carlo");
        assert_eq!(parsed["summaries"][0]["wins"], 1);
        assert_eq!(parsed["seeds"][0]["seed"], 1);

        let mut markdown = Vec::new();
        generate_markdown_report(&mut markdown, &records, &summaries).unwrap();
        let markdown = String::from_utf8(markdown).unwrap();
        assert!(markdown.contains("| Monte Carlo | 1 | 1 |"));

        let mut console = Vec::new();
        generate_console_report(&mut console, &records, &summaries, Duration::from_secs(1))
            .unwrap();
        assert!(String::from_utf8_lossy(&console).contains("Monte Carlo"));
    }
}
