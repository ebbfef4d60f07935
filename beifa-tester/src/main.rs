mod logic;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use logic::{
    GameplayStrategy, RunRecord, StrategySummary, reports, resolve_seed_inputs,
    resolve_strategies, run_matrix, split_csv, summarize,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Console,
    Json,
    Markdown,
}

#[derive(Debug, Parser)]
#[command(name = "beifa-tester", version)]
#[command(about = "Automated campaign sweeps for the Beifa engine")]
struct Args {
    /// Seeds to run (comma-separated numbers or ranges like 10..20)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Consecutive games per seed
    #[arg(long, default_value_t = 10)]
    runs: usize,

    /// Strategies to play (comma-separated, or `all`)
    #[arg(long, default_value = "all")]
    strategies: String,

    /// Action cap per game before it counts as stuck
    #[arg(long, default_value_t = 220)]
    max_steps: usize,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Rebuild every game from its recorded actions and compare digests
    #[arg(long)]
    verify_replay: bool,

    /// List all available strategies and exit
    #[arg(long)]
    list_strategies: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_strategies(&args)? {
        return Ok(());
    }

    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let strategies = resolve_strategies(&args.strategies)?;

    if args.report == ReportFormat::Console {
        announce_banner();
    }
    info!(
        "sweeping {} seeds x {} runs x {} strategies",
        seeds.len(),
        args.runs,
        strategies.len()
    );

    let start_time = Instant::now();
    let records = run_matrix(
        &seeds,
        args.runs,
        &strategies,
        args.max_steps,
        args.verify_replay,
    )?;
    let summaries = summarize(&records);

    if args.verbose {
        for record in &records {
            eprintln!(
                "[{} seed {}] {} after {} turns ({} steps)",
                record.strategy.key(),
                record.seed,
                record.outcome,
                record.turns,
                record.steps
            );
        }
    }

    write_reports(&args, &records, &summaries, start_time)?;

    if summaries.iter().any(|s| !s.passed()) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_strategies(args: &Args) -> Result<bool> {
    if !args.list_strategies {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available strategies:")?;
    for strategy in GameplayStrategy::ALL {
        writeln!(
            output_target.writer(),
            "  {:15} - {}",
            strategy.key(),
            strategy.label()
        )?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🏯 Beifa Campaign Tester".bright_cyan().bold());
    println!("{}", "========================".cyan());
}

fn write_reports(
    args: &Args,
    records: &[RunRecord],
    summaries: &[StrategySummary],
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report {
        ReportFormat::Json => {
            reports::generate_json_report(&mut output_target, records, summaries)?;
        }
        ReportFormat::Markdown => {
            reports::generate_markdown_report(&mut output_target, records, summaries)?;
        }
        ReportFormat::Console => {
            let duration = start_time.elapsed();
            if records.is_empty() {
                writeln!(&mut output_target, "No games played.")?;
            } else {
                reports::generate_console_report(
                    &mut output_target,
                    records,
                    summaries,
                    duration,
                )?;
            }
            writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("beifa-main-{}-{name}", std::process::id()))
    }

    fn base_args() -> Args {
        Args {
            seeds: "7".to_string(),
            runs: 1,
            strategies: "balanced".to_string(),
            max_steps: 60,
            report: ReportFormat::Json,
            output: None,
            verify_replay: true,
            list_strategies: false,
            verbose: false,
        }
    }

    #[test]
    fn output_target_writes_to_file() {
        let path = temp_path("target.txt");
        let mut target = OutputTarget::new(Some(path.clone())).unwrap();
        writeln!(target, "hello").unwrap();
        target.flush_inner().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn list_strategies_writes_every_key() {
        let path = temp_path("strategies.txt");
        let mut args = base_args();
        args.list_strategies = true;
        args.output = Some(path.clone());
        assert!(maybe_list_strategies(&args).unwrap());
        let listed = std::fs::read_to_string(&path).unwrap();
        for strategy in GameplayStrategy::ALL {
            assert!(listed.contains(strategy.key()));
        }
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn markdown_report_lands_in_output_file() {
        let path = temp_path("report.md");
        let mut args = base_args();
        args.report = ReportFormat::Markdown;
        args.output = Some(path.clone());
        let records = run_matrix(&[7], 1, &[GameplayStrategy::Balanced], 60, true).unwrap();
        let summaries = summarize(&records);
        write_reports(&args, &records, &summaries, Instant::now()).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# Beifa Campaign Sweep"));
        let _ = std::fs::remove_file(path);
    }
}
