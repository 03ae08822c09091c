// Copyright © 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Universal income -- the smoothed monthly base credited to every living agent.
//!
//! ```text
//! stress = min(0.5, |D / V_ON - 1|)
//! raw    = (V_ON / population) x 5% x kappa x (1 - stress) x flux
//! base   = clamp(raw, prev x 0.9, prev x 1.1), floored at 10
//! income = base x productivity x eta
//! ```

use serde::{Deserialize, Serialize};

use crate::agent::Agent;

// ---------------------------------------------------------------------------
// IncomeDistributor
// ---------------------------------------------------------------------------

/// Computes and distributes the income base; remembers last cycle's base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeDistributor {
    /// Share of per-capita active wealth redistributed monthly (default 0.05).
    pub redistribution_rate: f64,
    /// Maximum relative change of the base between cycles (default 0.10).
    pub max_variation: f64,
    /// Floor on the base once there is a population (default 10.0).
    pub minimum_base: f64,
    /// Cap on the thermometric stress penalty (default 0.5).
    pub max_stress: f64,
    previous_base: Option<f64>,
}

impl Default for IncomeDistributor {
    fn default() -> Self {
        Self {
            redistribution_rate: 0.05,
            max_variation: 0.10,
            minimum_base: 10.0,
            max_stress: 0.5,
            previous_base: None,
        }
    }
}

impl IncomeDistributor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base stored by the last [`distribute`](Self::distribute) call.
    pub fn previous_base(&self) -> Option<f64> {
        self.previous_base
    }

    /// Thermometric stress: distance of `D / V_ON` from 1, capped.
    pub fn stress(&self, active_wealth: f64, total_debt: f64) -> f64 {
        if active_wealth <= 0.0 {
            return self.max_stress;
        }
        (total_debt / active_wealth - 1.0).abs().min(self.max_stress)
    }

    /// Smoothed income base for this cycle. Does not store it.
    pub fn compute_base(
        &self,
        active_wealth: f64,
        population: usize,
        total_debt: f64,
        liquidity: f64,
        activity_flux: f64,
    ) -> f64 {
        if population == 0 {
            return 0.0;
        }
        let per_capita = active_wealth / population as f64;
        let stress = self.stress(active_wealth, total_debt);
        let raw = per_capita * self.redistribution_rate * liquidity * (1.0 - stress) * activity_flux;

        let smoothed = match self.previous_base {
            Some(prev) if prev > 0.0 => raw.clamp(
                prev * (1.0 - self.max_variation),
                prev * (1.0 + self.max_variation),
            ),
            _ => raw,
        };
        smoothed.max(self.minimum_base)
    }

    /// Income owed to one agent for a given base.
    pub fn income_for(agent: &Agent, base: f64, production: f64) -> f64 {
        base * agent.productivity() * production
    }

    /// Credit every living agent and remember `base` for the next cycle.
    ///
    /// Returns the total amount credited.
    pub fn distribute(&mut self, agents: &mut [Agent], base: f64, production: f64) -> f64 {
        let mut total = 0.0;
        for agent in agents.iter_mut().filter(|a| a.alive) {
            let income = Self::income_for(agent, base, production);
            agent.spendable_balance += income;
            total += income;
        }
        self.previous_base = Some(base);
        total
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
