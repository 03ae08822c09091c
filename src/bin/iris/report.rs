// IRIS Runner Report Types
// Structured output for single runs and Monte Carlo batches

use iris_engine::CycleMetrics;
use serde::Serialize;

// ─── Statistics (per-metric Monte Carlo aggregation) ────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub mean: f64,
    pub std_dev: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub min: f64,
    pub max: f64,
    pub n: usize,
}

impl Stats {
    pub fn from_samples(samples: &[f64]) -> Self {
        let n = samples.len();
        if n == 0 {
            return Self { mean: 0.0, std_dev: 0.0, ci_lower: 0.0, ci_upper: 0.0, min: 0.0, max: 0.0, n: 0 };
        }
        let mean = samples.iter().sum::<f64>() / n as f64;
        let variance = if n > 1 {
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };
        let std_dev = variance.sqrt();
        let stderr = std_dev / (n as f64).sqrt();
        let z = 1.96; // 95% CI
        Self {
            mean,
            std_dev,
            ci_lower: mean - z * stderr,
            ci_upper: mean + z * stderr,
            min: samples.iter().cloned().fold(f64::INFINITY, f64::min),
            max: samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            n,
        }
    }

    /// Half-width of the confidence interval.
    pub fn margin(&self) -> f64 {
        (self.ci_upper - self.ci_lower) / 2.0
    }
}

// ─── Single-Run Result ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub seed: u64,
    pub cycles: u64,
    pub elapsed_ms: u128,
    /// Ratio stayed within the stability band for the whole run.
    pub stable: bool,
    /// Largest |D / V_ON - 1| observed over the run.
    pub max_ratio_deviation: f64,
    pub final_metrics: CycleMetrics,
}

impl RunResult {
    pub fn from_series(seed: u64, series: &[CycleMetrics], elapsed_ms: u128, band: f64) -> Option<Self> {
        let last = series.last()?.clone();
        let max_ratio_deviation = series
            .iter()
            .map(|m| (m.debt_ratio - 1.0).abs())
            .fold(0.0_f64, f64::max);
        Some(Self {
            seed,
            cycles: series.len() as u64,
            elapsed_ms,
            stable: max_ratio_deviation <= band,
            max_ratio_deviation,
            final_metrics: last,
        })
    }
}

// ─── Monte Carlo Report ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct MonteCarloReport {
    pub n_runs: usize,
    pub base_seed: u64,
    pub stability_rate: f64,
    pub debt_ratio: Stats,
    pub max_ratio_deviation: Stats,
    pub gini: Stats,
    pub top10_share: Stats,
    pub liquidity: Stats,
    pub production: Stats,
    pub population: Stats,
    pub living_enterprises: Stats,
    pub income_base: Stats,
    pub active_contracts: Stats,
    pub elapsed_ms: Stats,
    pub individual_runs: Vec<RunResult>,
}

impl MonteCarloReport {
    pub fn aggregate(base_seed: u64, runs: Vec<RunResult>) -> Self {
        let pick = |f: fn(&RunResult) -> f64| -> Stats {
            let samples: Vec<f64> = runs.iter().map(f).collect();
            Stats::from_samples(&samples)
        };
        let stable = runs.iter().filter(|r| r.stable).count();
        Self {
            n_runs: runs.len(),
            base_seed,
            stability_rate: if runs.is_empty() { 0.0 } else { stable as f64 / runs.len() as f64 },
            debt_ratio: pick(|r| r.final_metrics.debt_ratio),
            max_ratio_deviation: pick(|r| r.max_ratio_deviation),
            gini: pick(|r| r.final_metrics.gini),
            top10_share: pick(|r| r.final_metrics.top10_share),
            liquidity: pick(|r| r.final_metrics.liquidity),
            production: pick(|r| r.final_metrics.production),
            population: pick(|r| r.final_metrics.population as f64),
            living_enterprises: pick(|r| r.final_metrics.living_enterprises as f64),
            income_base: pick(|r| r.final_metrics.income_base),
            active_contracts: pick(|r| r.final_metrics.active_contracts as f64),
            elapsed_ms: pick(|r| r.elapsed_ms as f64),
            individual_runs: runs,
        }
    }
}

// ─── Top-Level Report ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct RunnerReport {
    pub timestamp: String,
    pub version: &'static str,
    pub prng: &'static str,
    pub config: iris_engine::SimulationConfig,
    pub monte_carlo: MonteCarloReport,
}
