// IRIS Economy Runner - single runs and Monte Carlo batches
// Seedable ChaCha8 PRNG, per-cycle JSONL audit trail
//
// Usage:
//   cargo run --release --bin iris                               # Reference economy, 10 years
//   cargo run --release --bin iris -- --agents 500 --cycles 240  # Smaller, longer run
//   cargo run --release --bin iris -- --runs 30 --seed 7         # Monte Carlo, seeds 7..37
//   cargo run --release --bin iris -- --config iris.json         # Load a JSON config
//   cargo run --release --bin iris -- --time-series iris-ts      # Write per-cycle JSONL

mod monte_carlo;
mod report;
mod time_series;

use anyhow::{bail, Context, Result};
use iris_engine::{DistributionScheme, SimulationConfig};
use report::*;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::info;
use tracing_subscriber::EnvFilter;

const RESULTS_DIR: &str = "iris-results";

// ─── CLI Parsing ────────────────────────────────────────────────────────────

struct CliArgs {
    config: Option<PathBuf>,
    agents: Option<usize>,
    wealth: Option<f64>,
    cycles: Option<u64>,
    distribution: Option<DistributionScheme>,
    seed: u64,
    runs: usize,
    time_series: Option<PathBuf>,
}

fn parse_args() -> Result<CliArgs> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut cli = CliArgs {
        config: None,
        agents: None,
        wealth: None,
        cycles: None,
        distribution: None,
        seed: 0,
        runs: 1,
        time_series: None,
    };

    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--config" => cli.config = Some(PathBuf::from(take_value(&args, &mut i)?)),
            "--agents" => cli.agents = Some(take_value(&args, &mut i)?.parse().context("--agents")?),
            "--wealth" => cli.wealth = Some(take_value(&args, &mut i)?.parse().context("--wealth")?),
            "--cycles" => cli.cycles = Some(take_value(&args, &mut i)?.parse().context("--cycles")?),
            "--distribution" => cli.distribution = Some(take_value(&args, &mut i)?.parse()?),
            "--seed" => cli.seed = take_value(&args, &mut i)?.parse().context("--seed")?,
            "--runs" => cli.runs = take_value(&args, &mut i)?.parse().context("--runs")?,
            "--time-series" => cli.time_series = Some(PathBuf::from(take_value(&args, &mut i)?)),
            other => bail!("unknown argument: {}", other),
        }
        i += 1;
    }
    if cli.runs == 0 {
        bail!("--runs must be at least 1");
    }
    Ok(cli)
}

/// Consume the value following the flag at `args[*i]`.
fn take_value<'a>(args: &'a [String], i: &mut usize) -> Result<&'a str> {
    let flag = &args[*i];
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .with_context(|| format!("{} expects a value", flag))
}

fn build_config(cli: &CliArgs) -> Result<SimulationConfig> {
    let mut config = match &cli.config {
        Some(path) => SimulationConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    if let Some(agents) = cli.agents {
        config.agents = agents;
    }
    if let Some(wealth) = cli.wealth {
        config.total_wealth = wealth;
    }
    if let Some(cycles) = cli.cycles {
        config.cycles = cycles;
    }
    if let Some(distribution) = cli.distribution {
        config.distribution = distribution;
    }
    config.validate()?;
    Ok(config)
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = parse_args()?;
    let config = build_config(&cli)?;

    info!(
        agents = config.agents,
        wealth = config.total_wealth,
        cycles = config.cycles,
        distribution = %config.distribution,
        runs = cli.runs,
        base_seed = cli.seed,
        "IRIS runner starting"
    );

    let suite_start = Instant::now();
    let mc = monte_carlo::run_monte_carlo(&config, cli.runs, cli.seed, cli.time_series.as_deref())?;
    let suite_elapsed = suite_start.elapsed();

    // ─── Summary ────────────────────────────────────────────────────────

    println!("\n  IRIS Economy Runner v{}", env!("CARGO_PKG_VERSION"));
    println!("  PRNG: ChaCha8Rng | Runs: {} | Base seed: {}", mc.n_runs, mc.base_seed);
    println!("  {}", "-".repeat(64));
    let rows: [(&str, &Stats); 9] = [
        ("Debt ratio D/V", &mc.debt_ratio),
        ("Max |ratio - 1|", &mc.max_ratio_deviation),
        ("Gini", &mc.gini),
        ("Top 10% share", &mc.top10_share),
        ("Liquidity (kappa)", &mc.liquidity),
        ("Production (eta)", &mc.production),
        ("Population", &mc.population),
        ("Living enterprises", &mc.living_enterprises),
        ("Income base", &mc.income_base),
    ];
    println!("  {:<22} {:>12} {:>10} {:>10} {:>10}", "Metric", "Mean", "±95%", "Min", "Max");
    for (label, s) in rows {
        println!("  {:<22} {:>12.4} {:>10.4} {:>10.4} {:>10.4}",
            label, s.mean, s.margin(), s.min, s.max);
    }
    println!("  {}", "-".repeat(64));
    println!("  Stable runs (|D/V - 1| <= {:.2}): {:.1}%  Time: {:.1}s\n",
        monte_carlo::STABILITY_BAND,
        mc.stability_rate * 100.0,
        suite_elapsed.as_secs_f64());

    // ─── Write JSON Report ──────────────────────────────────────────────

    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock before UNIX epoch")?
        .as_millis();
    let timestamp = format!("{}", ts);

    let report = RunnerReport {
        timestamp: timestamp.clone(),
        version: env!("CARGO_PKG_VERSION"),
        prng: "ChaCha8Rng",
        config,
        monte_carlo: mc,
    };

    let dir = Path::new(RESULTS_DIR);
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}/", RESULTS_DIR))?;
    let path = dir.join(format!("iris-{}.json", timestamp));
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    println!("  Results saved to: {}\n", path.display());

    Ok(())
}
