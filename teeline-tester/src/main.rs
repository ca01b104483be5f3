mod logic;
mod util;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;
use teeline_core::WizardConfig;

use logic::{
    LogicTester, ScenarioResult, catalog, check_record_file, find_scenario, list_scenarios,
    resolve_seed_inputs,
};
use util::split_csv;

#[derive(Debug, Parser)]
#[command(name = "teeline-tester", version)]
#[command(about = "QA sweeps for the Teeline wizard date/offset reconciliation")]
struct Args {
    /// Scenarios to run (comma-separated, `all` for every scenario)
    #[arg(long, default_value = "all")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated integers, 0x hex, or `sweep`)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Stored tournament JSON to load, save and reload (repeatable)
    #[arg(long = "record", value_name = "FILE")]
    records: Vec<PathBuf>,

    /// Wizard configuration JSON (sanity window, default tee time)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner(&args);

    let start_time = Instant::now();
    let config = load_config(args.config.as_deref())?;
    let scenarios = expand_scenarios(&args.scenarios);
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;

    let mut results = run_logic_scenarios(&args, &config, &scenarios, &seeds);
    results.extend(check_records(&args, &config)?);

    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:22} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner(args: &Args) {
    // keep stdout parseable for machine-readable reports
    if args.report != "console" && args.output.is_none() {
        return;
    }
    println!("{}", "⛳ Teeline Reconciliation Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn load_config(path: Option<&Path>) -> Result<WizardConfig> {
    let Some(path) = path else {
        return Ok(WizardConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    WizardConfig::from_json(&raw).with_context(|| format!("invalid config {}", path.display()))
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s == "all") {
        scenarios.retain(|s| s != "all");
        for scenario in catalog() {
            if !scenarios.iter().any(|s| s == scenario.key) {
                scenarios.push(scenario.key.to_string());
            }
        }
    }
    scenarios
}

fn run_logic_scenarios(
    args: &Args,
    config: &WizardConfig,
    scenarios: &[String],
    seeds: &[u64],
) -> Vec<ScenarioResult> {
    let mut results = Vec::new();
    if scenarios.is_empty() {
        return results;
    }

    if args.verbose {
        println!("{}", "🧠 Running Scenarios".bright_yellow().bold());
        println!("{}", "-".repeat(30).yellow());
    }

    let tester = LogicTester::new(config.clone(), args.verbose);
    for scenario_name in scenarios {
        if let Some(scenario) = find_scenario(scenario_name) {
            results.extend(tester.run_scenario(&scenario, seeds, args.iterations));
        } else {
            eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
        }
    }

    results
}

fn check_records(args: &Args, config: &WizardConfig) -> Result<Vec<ScenarioResult>> {
    args.records
        .iter()
        .map(|path| check_record_file(path, config))
        .collect()
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => logic::reports::generate_json_report(&mut output_target, results)?,
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Teeline Reconciliation Test Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        _ => {
            let duration = start_time.elapsed();
            if results.is_empty() {
                writeln!(&mut output_target, "No scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(&mut output_target, results, duration)?;
            }
            writeln!(&mut output_target)?;
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
