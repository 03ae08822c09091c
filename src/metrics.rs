// Copyright © 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Per-cycle metrics record and the distribution statistics behind it.
//!
//! Wealth statistics use the durable balance of living agents. Everything
//! here is read-only over the simulation state.

use serde::{Deserialize, Serialize};

use crate::commitment::CommitmentRegistry;
use crate::ledger::{Ledger, SectorBreakdown};
use crate::population::Population;
use crate::regulator::Regulator;

// ---------------------------------------------------------------------------
// Distribution statistics
// ---------------------------------------------------------------------------

/// Gini coefficient of non-negative values, in [0, 1].
///
/// 0 for an empty slice or a non-positive sum.
pub fn gini(values: &[f64]) -> f64 {
    let n = values.len();
    let sum: f64 = values.iter().sum();
    if n == 0 || sum <= 0.0 {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, x)| (2.0 * (i as f64 + 1.0) - n as f64 - 1.0) * x)
        .sum();
    (weighted / (n as f64 * sum)).clamp(0.0, 1.0)
}

/// Share of the total held by the richest `fraction` (at least one holder).
pub fn top_share(values: &[f64], fraction: f64) -> f64 {
    let sum: f64 = values.iter().sum();
    if values.is_empty() || sum <= 0.0 {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    let k = ((values.len() as f64 * fraction).floor() as usize).max(1);
    sorted.iter().take(k).sum::<f64>() / sum
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

// ---------------------------------------------------------------------------
// CycleActivity
// ---------------------------------------------------------------------------

/// Flows accumulated by the orchestrator while a cycle runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleActivity {
    /// V_ON measured at the start of the cycle.
    pub active_wealth: f64,
    pub income_base: f64,
    pub income_distributed: f64,
    pub staking_spent: f64,
    pub investment_spent: f64,
    pub consumption_spent: f64,
    pub effort: f64,
    pub salaries_paid: f64,
    pub value_burned: f64,
    pub capital_raised: f64,
    pub contract_payments: usize,
    pub missed_payments: usize,
    pub contracts_completed: usize,
    pub contracts_cancelled: usize,
    pub goods_redistributed: usize,
    /// Spendable circulation just before expiry.
    pub spendable_circulation: f64,
    pub spendable_expired: f64,
    pub deaths: usize,
    pub births: usize,
}

// ---------------------------------------------------------------------------
// CycleMetrics
// ---------------------------------------------------------------------------

/// One line of the simulation's output series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleMetrics {
    pub cycle: u64,
    pub year: u64,

    // -- Stocks --
    /// Durable wealth held by living agents.
    pub total_wealth: f64,
    /// V_ON at the end of the cycle.
    pub active_wealth: f64,
    pub enterprise_wealth: f64,
    pub spendable_circulation: f64,
    pub total_debt: f64,
    /// D / V_ON at the end of the cycle.
    pub debt_ratio: f64,
    pub sectors: SectorBreakdown,

    // -- Regulation --
    pub liquidity: f64,
    pub production: f64,
    pub investment_ratio: f64,
    pub velocity: f64,
    pub engagement: f64,

    // -- Distribution --
    pub gini: f64,
    pub top10_share: f64,
    pub top20_share: f64,
    pub median_wealth: f64,
    pub mean_wealth: f64,
    pub productivity_mean: f64,
    pub productivity_std: f64,

    // -- Demographics --
    pub population: usize,
    pub living_enterprises: usize,
    pub age_median: f64,
    pub age_mean: f64,
    pub deaths: usize,
    pub births: usize,

    // -- Flows --
    pub income_base: f64,
    pub income_distributed: f64,
    pub spendable_spent: f64,
    pub value_burned: f64,
    pub salaries_paid: f64,
    pub capital_raised: f64,
    pub active_contracts: usize,
    pub missed_payments: usize,
    pub contracts_completed: usize,
    pub commitment_stock: usize,
    pub recycling_stock: usize,
    pub goods_redistributed: usize,
}

impl CycleMetrics {
    /// Snapshot the end-of-cycle state together with the cycle's flows.
    pub fn capture(
        cycle: u64,
        population: &Population,
        ledger: &Ledger,
        regulator: &Regulator,
        registry: &CommitmentRegistry,
        activity: &CycleActivity,
    ) -> Self {
        let wealth: Vec<f64> = population.living().map(|a| a.durable_balance).collect();
        let productivity: Vec<f64> = population.living().map(|a| a.productivity()).collect();
        let ages: Vec<f64> = population.living().map(|a| f64::from(a.age)).collect();
        let active_wealth = population.active_wealth();
        let readings = regulator.last_readings();

        Self {
            cycle,
            year: cycle / 12,

            total_wealth: wealth.iter().sum(),
            active_wealth,
            enterprise_wealth: population.enterprise_wealth(),
            spendable_circulation: activity.spendable_circulation,
            total_debt: ledger.total(),
            debt_ratio: ledger.ratio(active_wealth),
            sectors: ledger.breakdown(),

            liquidity: regulator.liquidity(),
            production: regulator.production(),
            investment_ratio: readings.investment_ratio,
            velocity: readings.velocity,
            engagement: readings.engagement,

            gini: gini(&wealth),
            top10_share: top_share(&wealth, 0.10),
            top20_share: top_share(&wealth, 0.20),
            median_wealth: median(&wealth),
            mean_wealth: mean(&wealth),
            productivity_mean: mean(&productivity),
            productivity_std: std_dev(&productivity),

            population: wealth.len(),
            living_enterprises: population.active_enterprise_count(),
            age_median: median(&ages),
            age_mean: mean(&ages),
            deaths: activity.deaths,
            births: activity.births,

            income_base: activity.income_base,
            income_distributed: activity.income_distributed,
            spendable_spent: activity.staking_spent
                + activity.investment_spent
                + activity.consumption_spent,
            value_burned: activity.value_burned,
            salaries_paid: activity.salaries_paid,
            capital_raised: activity.capital_raised,
            active_contracts: registry.active_count(),
            missed_payments: activity.missed_payments,
            contracts_completed: activity.contracts_completed,
            commitment_stock: registry.stock().len(),
            recycling_stock: registry.recycling().len(),
            goods_redistributed: activity.goods_redistributed,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn gini_extremes() {
        assert_eq!(gini(&[]), 0.0);
        assert_eq!(gini(&[0.0, 0.0]), 0.0);
        assert!(gini(&[5.0; 10]).abs() < 1e-12);

        // one holder among n -> (n - 1) / n
        let mut values = vec![0.0; 9];
        values.push(100.0);
        assert!((gini(&values) - 0.9).abs() < 1e-12);
    }

    #[test]
    fn gini_is_order_independent() {
        let a = gini(&[1.0, 2.0, 3.0, 10.0]);
        let b = gini(&[10.0, 3.0, 1.0, 2.0]);
        assert!((a - b).abs() < 1e-12);
        assert!(a > 0.0 && a < 1.0);
    }

    #[test]
    fn top_share_takes_at_least_one() {
        let values = [1.0, 1.0, 1.0, 7.0];
        assert!((top_share(&values, 0.10) - 0.7).abs() < 1e-12);
        assert!((top_share(&values, 0.50) - 0.8).abs() < 1e-12);
        assert_eq!(top_share(&[], 0.2), 0.0);
    }

    #[test]
    fn central_tendency() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
        assert!((std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]) - 2.0).abs() < 1e-12);
        assert_eq!(median(&[]), 0.0);
        assert_eq!(std_dev(&[]), 0.0);
    }

    #[test]
    fn capture_reads_living_agents_only() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut pop = Population::new();
        for _ in 0..4 {
            pop.spawn(40, false, &mut rng).expect("test: spawn");
        }
        for agent in pop.agents_mut() {
            agent.durable_balance = 25.0;
        }
        pop.kill(crate::core_types::AgentId(3));

        let mut ledger = Ledger::new();
        ledger.adjust(75.0, crate::ledger::Sector::Material);
        let activity = CycleActivity {
            deaths: 1,
            ..CycleActivity::default()
        };
        let m = CycleMetrics::capture(
            13,
            &pop,
            &ledger,
            &Regulator::new(),
            &CommitmentRegistry::new(),
            &activity,
        );
        assert_eq!(m.year, 1);
        assert_eq!(m.population, 3);
        assert_eq!(m.total_wealth, 75.0);
        assert!((m.debt_ratio - 1.0).abs() < 1e-9);
        assert!(m.gini.abs() < 1e-12);
        assert_eq!(m.age_mean, 40.0);
        assert_eq!(m.deaths, 1);

        let json = serde_json::to_string(&m).expect("test: serialize");
        assert!(json.contains("\"top10_share\""));
    }
}
