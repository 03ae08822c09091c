// Copyright © 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Enterprise management -- fundraising campaigns and the salary/burn split.
//!
//! Each cycle, every enterprise with a living owner may run a campaign
//! (frequency set by the owner's growth aptitude), then releases part of its
//! durable surplus above a fixed reserve:
//!
//! ```text
//! distributable = (durable - reserve) x 0.8
//! salaries      = distributable x 0.4   -> random living agents
//! burned        = distributable x 0.6   -> destroyed
//! ```

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core_types::AgentId;
use crate::population::Population;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnterpriseParams {
    /// Durable balance an enterprise never distributes.
    pub reserve: f64,
    /// Fraction of the surplus above the reserve released each cycle.
    pub distribution_share: f64,
    /// Fraction of the released amount paid as salaries; the rest is burned.
    pub salary_share: f64,
    /// Fraction of the living population receiving salaries (at least one).
    pub salary_sample: f64,
    /// Campaign target per enterprise level.
    pub campaign_target_per_level: f64,
    /// Fraction of the target that must be raised to level up.
    pub campaign_success_threshold: f64,
    pub max_investors: usize,
    /// Savings aptitude above which an agent may join a campaign.
    pub investor_savings_threshold: f64,
    /// Spendable balance above which an agent may join a campaign.
    pub investor_min_balance: f64,
    /// Fraction of an investor's spendable balance contributed.
    pub investor_contribution_share: f64,
}

impl Default for EnterpriseParams {
    fn default() -> Self {
        Self {
            reserve: 50.0,
            distribution_share: 0.8,
            salary_share: 0.4,
            salary_sample: 0.1,
            campaign_target_per_level: 1000.0,
            campaign_success_threshold: 0.7,
            max_investors: 10,
            investor_savings_threshold: 60.0,
            investor_min_balance: 100.0,
            investor_contribution_share: 0.2,
        }
    }
}

/// Campaign period in cycles for an owner's growth aptitude.
pub fn campaign_frequency(growth: f64) -> u64 {
    if growth > 70.0 {
        6
    } else if growth > 40.0 {
        12
    } else {
        24
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Split of one enterprise's released surplus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SurplusSplit {
    pub salaries: f64,
    pub burned: f64,
}

impl SurplusSplit {
    pub fn total(&self) -> f64 {
        self.salaries + self.burned
    }
}

/// Outcome of one fundraising campaign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignOutcome {
    pub target: f64,
    pub raised: f64,
    pub investors: usize,
    pub leveled_up: bool,
}

/// Totals over every enterprise for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ManagementReport {
    pub salaries_paid: f64,
    pub value_burned: f64,
    pub campaigns: usize,
    pub capital_raised: f64,
    pub level_ups: usize,
}

// ---------------------------------------------------------------------------
// EnterpriseManager
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnterpriseManager {
    params: EnterpriseParams,
}

impl EnterpriseManager {
    pub fn new(params: EnterpriseParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &EnterpriseParams {
        &self.params
    }

    /// Split a surplus without touching any balance.
    ///
    /// Returns `None` when the balance does not exceed the reserve.
    pub fn split_surplus(&self, durable_balance: f64) -> Option<SurplusSplit> {
        let p = &self.params;
        if durable_balance <= p.reserve {
            return None;
        }
        let distributable = (durable_balance - p.reserve) * p.distribution_share;
        let salaries = distributable * p.salary_share;
        Some(SurplusSplit {
            salaries,
            burned: distributable - salaries,
        })
    }

    /// Run campaigns and the surplus split for every active enterprise.
    ///
    /// Enterprises are visited in owner-id order.
    pub fn manage<R: Rng + ?Sized>(
        &self,
        population: &mut Population,
        cycle: u64,
        rng: &mut R,
    ) -> ManagementReport {
        let mut report = ManagementReport::default();
        for owner in population.active_owners() {
            let growth = population
                .agent(owner)
                .map(|a| a.aptitudes().growth())
                .unwrap_or(0.0);
            if cycle % campaign_frequency(growth) == 0 {
                if let Some(outcome) = self.run_campaign(population, owner, rng) {
                    report.campaigns += 1;
                    report.capital_raised += outcome.raised;
                    if outcome.leveled_up {
                        report.level_ups += 1;
                    }
                }
            }
            if let Some(split) = self.distribute_surplus(population, owner, rng) {
                report.salaries_paid += split.salaries;
                report.value_burned += split.burned;
            }
        }
        if report.campaigns > 0 {
            debug!(
                cycle,
                campaigns = report.campaigns,
                raised = report.capital_raised,
                level_ups = report.level_ups,
                "Campaigns closed"
            );
        }
        report
    }

    /// Raise capital from eligible investors for `owner`'s enterprise.
    ///
    /// Returns `None` when the enterprise is inactive or nobody is eligible.
    pub fn run_campaign<R: Rng + ?Sized>(
        &self,
        population: &mut Population,
        owner: AgentId,
        rng: &mut R,
    ) -> Option<CampaignOutcome> {
        let p = &self.params;
        if !population.is_alive(owner) {
            return None;
        }
        let (level, trust) = population
            .enterprise_of(owner)
            .map(|e| (e.level(), e.trust()))?;
        let target = f64::from(level) * p.campaign_target_per_level;
        let chance = trust / 100.0;

        let eligible: Vec<AgentId> = population
            .living()
            .filter(|a| {
                a.aptitudes().savings() > p.investor_savings_threshold
                    && a.spendable_balance > p.investor_min_balance
            })
            .map(|a| a.id)
            .collect();
        if eligible.is_empty() {
            return None;
        }
        let sample: Vec<AgentId> = eligible
            .choose_multiple(rng, p.max_investors.min(eligible.len()))
            .copied()
            .collect();

        let mut outcome = CampaignOutcome {
            target,
            ..CampaignOutcome::default()
        };
        for id in sample {
            if rng.gen::<f64>() >= chance {
                continue;
            }
            let Some(investor) = population.agent_mut(id) else {
                continue;
            };
            let contribution = (investor.spendable_balance * p.investor_contribution_share)
                .min(target - outcome.raised);
            investor.spendable_balance -= contribution;
            outcome.raised += contribution;
            outcome.investors += 1;
            if outcome.raised >= target {
                break;
            }
        }

        if let Some(enterprise) = population.enterprise_of_mut(owner) {
            enterprise.durable_balance += outcome.raised;
            if outcome.raised >= target * p.campaign_success_threshold {
                outcome.leveled_up = enterprise.level_up();
            }
        }
        Some(outcome)
    }

    /// Release part of the surplus: pay salaries and burn the remainder.
    pub fn distribute_surplus<R: Rng + ?Sized>(
        &self,
        population: &mut Population,
        owner: AgentId,
        rng: &mut R,
    ) -> Option<SurplusSplit> {
        if !population.is_alive(owner) {
            return None;
        }
        let balance = population.enterprise_of(owner)?.durable_balance;
        let split = self.split_surplus(balance)?;

        let living = population.living_ids();
        let count = ((living.len() as f64 * self.params.salary_sample).floor() as usize)
            .max(1)
            .min(living.len());
        let earners: Vec<AgentId> = living.choose_multiple(rng, count).copied().collect();
        if !earners.is_empty() {
            let salary = split.salaries / earners.len() as f64;
            for id in earners {
                if let Some(agent) = population.agent_mut(id) {
                    agent.durable_balance += salary;
                }
            }
        }

        if let Some(enterprise) = population.enterprise_of_mut(owner) {
            enterprise.durable_balance -= split.total();
        }
        Some(split)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
