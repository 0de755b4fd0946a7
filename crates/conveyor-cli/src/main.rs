use clap::Parser;
use conveyor_core::config::LineConfig;
use conveyor_core::line::{LineError, ProductionLine};
use conveyor_core::replicate::replicate;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// A conveyor belt carrying parts past pairs of workers.
///
/// Every timeslot a part ('A', 'B') or nothing is chosen with uniform
/// probability and put on the head of the belt, which moves one slot per
/// timeslot. A worker on each side of every slot collects the parts it
/// needs, assembles a product 'P' and puts it back on the belt at the first
/// opportunity. Only one item can be collected or placed at a slot per
/// timeslot. At the end, the number of products and unused parts that made
/// it off the belt is printed.
#[derive(Parser)]
#[command(name = "conveyor-sim", version)]
struct Cli {
    /// Number of timeslots to run.
    #[arg(short = 'n', long, default_value_t = 1)]
    timeslots: usize,

    /// Belt capacity in slots [default: 1].
    #[arg(short, long)]
    capacity: Option<usize>,

    /// Assembly duration in timeslots [default: 0].
    #[arg(short, long)]
    duration: Option<u32>,

    /// Seed for the item source and the worker priority draws.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Line configuration file (.ron, .toml or .json). Flags override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run this many replications with consecutive seeds and summarize.
    #[arg(long)]
    replications: Option<u64>,

    /// Print the line after every timeslot. Single runs only.
    #[arg(short, long, conflicts_with = "replications")]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match build_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.timeslots == 0 || config.capacity == 0 {
        return ExitCode::SUCCESS;
    }

    let result = match cli.replications {
        Some(count) => run_replications(&config, count, cli.timeslots),
        None => run_single(&config, cli.timeslots, cli.verbose),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Simulation error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn build_config(cli: &Cli) -> Result<LineConfig, conveyor_core::config::ConfigError> {
    let mut config = match &cli.config {
        Some(path) => LineConfig::from_path(path)?,
        None => LineConfig::default(),
    };
    if let Some(capacity) = cli.capacity {
        config.capacity = capacity;
    }
    if let Some(duration) = cli.duration {
        config.assembly_duration = duration;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    Ok(config)
}

fn run_single(config: &LineConfig, timeslots: usize, verbose: bool) -> Result<(), LineError> {
    let mut line = ProductionLine::from_config(config)?;
    info!(capacity = config.capacity, timeslots, seed = config.seed, "running line");

    if verbose {
        for _ in 0..timeslots {
            line.step()?;
            println!("{line}");
        }
    } else {
        line.try_run(timeslots)?;
    }

    println!("Product count: {}", line.product_count());
    println!("Drop count: {}", line.drop_count());
    Ok(())
}

fn run_replications(config: &LineConfig, count: u64, timeslots: usize) -> Result<(), LineError> {
    let seeds = config.seed..config.seed.saturating_add(count);
    let report = replicate(config, seeds, timeslots)?;

    println!("Replications: {}", report.runs.len());
    if let Some(products) = report.products() {
        println!("Product count: {products}");
    }
    if let Some(drops) = report.drops() {
        println!("Drop count: {drops}");
    }
    Ok(())
}
