mod logic;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use logic::{
    InspectorPersonality, SimulationConfig, SimulationResult, resolve_seed_inputs, run_simulation, split_csv,
};
use nottingham_game::{BundledData, DataLoader, GameEngine, GoodsCatalog, MerchantRoster, RulesConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Colored summary for terminals
    Console,
    /// Machine-readable results
    Json,
    /// Tables for pasting into issues
    Markdown,
}

#[derive(Debug, Parser)]
#[command(name = "nottingham-tester", version = "0.1.0")]
#[command(about = "Headless simulation runs of the Nottingham merchant AI against scripted inspectors")]
struct Args {
    /// Inspector personalities to run (comma-separated, or `all`)
    #[arg(long, default_value = "all")]
    inspectors: String,

    /// List all inspector personalities and exit
    #[arg(long)]
    list_inspectors: bool,

    /// Seeds to run (comma-separated; supports hex and `a..b` ranges)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Rounds played per personality and seed
    #[arg(long, default_value_t = 100)]
    rounds: usize,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

/// Data every simulation run shares.
struct TesterAssets {
    roster: MerchantRoster,
    catalog: GoodsCatalog,
    rules: RulesConfig,
}

impl TesterAssets {
    fn load_default() -> Result<Self> {
        let loader = BundledData;
        let rules = loader.load_rules().context("failed to load rules")?;
        let catalog = loader.load_catalog().context("failed to load goods")?;
        let roster = GameEngine::new(loader)
            .load_roster()
            .context("failed to load merchant roster")?;
        Ok(Self {
            roster,
            catalog,
            rules,
        })
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_inspectors(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let personalities = expand_inspectors(&args.inspectors)?;
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let assets = TesterAssets::load_default()?;

    let results = run_simulations(&args, &assets, &personalities, &seeds)?;
    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed()) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_inspectors(args: &Args) -> Result<bool> {
    if !args.list_inspectors {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available inspectors:")?;
    for personality in InspectorPersonality::ALL {
        writeln!(
            output_target.writer(),
            "  {:15} - {}",
            personality.key(),
            personality.description()
        )?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🏰 Nottingham Merchant Simulator".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn expand_inspectors(arg: &str) -> Result<Vec<InspectorPersonality>> {
    let names = split_csv(arg);
    if names.is_empty() || names.iter().any(|name| name == "all") {
        return Ok(InspectorPersonality::ALL.to_vec());
    }
    let mut personalities = Vec::with_capacity(names.len());
    for name in names {
        let personality = name
            .parse::<InspectorPersonality>()
            .map_err(anyhow::Error::msg)?;
        if !personalities.contains(&personality) {
            personalities.push(personality);
        }
    }
    Ok(personalities)
}

fn run_simulations(
    args: &Args,
    assets: &TesterAssets,
    personalities: &[InspectorPersonality],
    seeds: &[u64],
) -> Result<Vec<SimulationResult>> {
    println!("{}", "🎲 Running Simulations".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let mut results = Vec::with_capacity(personalities.len() * seeds.len());
    for &personality in personalities {
        for &seed in seeds {
            let config = SimulationConfig::new(personality, seed).with_rounds(args.rounds);
            let result = run_simulation(config, &assets.roster, &assets.catalog, &assets.rules)?;
            if args.verbose {
                let status = if result.passed() { "✅".green() } else { "❌".red() };
                println!(
                    "{status} [{} seed {}] {} rounds - {:?}",
                    personality.key().bold(),
                    seed,
                    result.rounds_played,
                    result.duration
                );
            }
            results.push(result);
        }
    }
    Ok(results)
}

fn write_reports(args: &Args, results: &[SimulationResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report {
        ReportFormat::Json => logic::reports::generate_json_report(&mut output_target, results)?,
        ReportFormat::Markdown => {
            logic::reports::generate_markdown_report(&mut output_target, results)?;
        }
        ReportFormat::Console => {
            let duration = start_time.elapsed();
            if results.is_empty() {
                writeln!(&mut output_target, "No simulations executed.")?;
            } else {
                logic::reports::generate_console_report(&mut output_target, results, duration)?;
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
