// Monte Carlo Infrastructure - N runs with statistical aggregation
// Run i uses seed base + i, so any single run can be replayed alone

use anyhow::Context;
use iris_engine::{IrisSimulation, SimulationConfig};
use std::path::Path;
use std::time::Instant;
use tracing::info;

use crate::report::*;
use crate::time_series::TimeSeriesRecorder;

/// |D / V_ON - 1| tolerated before a run counts as unstable.
pub const STABILITY_BAND: f64 = 0.10;

/// Run one simulation with a specific seed.
pub fn run_single(
    config: &SimulationConfig,
    seed: u64,
    time_series_dir: Option<&Path>,
) -> anyhow::Result<RunResult> {
    let start = Instant::now();
    let mut sim = IrisSimulation::new(SimulationConfig {
        seed: Some(seed),
        ..config.clone()
    })
    .with_context(|| format!("failed to initialize run with seed {}", seed))?;

    let series = sim
        .run()
        .with_context(|| format!("run with seed {} aborted", seed))?;
    let elapsed_ms = start.elapsed().as_millis();

    if let Some(dir) = time_series_dir {
        let mut recorder = TimeSeriesRecorder::new();
        for metrics in &series {
            recorder.record(metrics);
        }
        let path = dir.join(format!("iris-seed-{}.jsonl", seed));
        recorder.write_jsonl(&path)?;
        info!(path = %path.display(), cycles = recorder.len(), "time series written");
    }

    RunResult::from_series(seed, &series, elapsed_ms, STABILITY_BAND)
        .with_context(|| format!("run with seed {} produced no cycles", seed))
}

/// Run `n_runs` simulations with seeds `base_seed..base_seed + n_runs`.
pub fn run_monte_carlo(
    config: &SimulationConfig,
    n_runs: usize,
    base_seed: u64,
    time_series_dir: Option<&Path>,
) -> anyhow::Result<MonteCarloReport> {
    let mut runs = Vec::with_capacity(n_runs);
    for i in 0..n_runs as u64 {
        let seed = base_seed.wrapping_add(i);
        let result = run_single(config, seed, time_series_dir)?;
        info!(
            seed,
            ratio = result.final_metrics.debt_ratio,
            gini = result.final_metrics.gini,
            population = result.final_metrics.population,
            elapsed_ms = result.elapsed_ms as u64,
            "run complete"
        );
        runs.push(result);
    }
    Ok(MonteCarloReport::aggregate(base_seed, runs))
}
