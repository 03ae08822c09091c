// Copyright © 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Agent decision engine -- how each living agent spends its monthly income.
//!
//! Three stages run in order against the *remaining* spendable balance:
//! staking (long-term aptitude), investment (savings aptitude) and casino
//! consumption (consumption aptitude). A stage that cannot be afforded
//! simply spends nothing.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::agent::{Agent, Aptitudes, Enterprise, FinancialCertificate};
use crate::commitment::CommitmentRegistry;
use crate::core_types::{AgentId, CertificateId, IdSequence};
use crate::goods::{draw_casino_tier, GoodsCatalog};
use crate::ledger::Ledger;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Weights of the effort proxy fed to the velocity sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffortWeights {
    pub staking: f64,
    pub investment: f64,
    pub consumption: f64,
}

impl Default for EffortWeights {
    fn default() -> Self {
        Self {
            staking: 1.2,
            investment: 1.0,
            consumption: 0.6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionParams {
    /// Long-term aptitude above which an agent stakes.
    pub staking_threshold: f64,
    /// Fraction of (remaining x aptitude) offered as monthly staking budget.
    pub staking_share: f64,
    pub investment_threshold: f64,
    pub investment_share: f64,
    pub consumption_threshold: f64,
    /// Casino entry fee per enterprise level, before liquidity.
    pub casino_fee_per_level: f64,
    /// Share of a casino fee kept by the enterprise as durable value.
    pub casino_retention: f64,
    /// Lifetime of a financial certificate, in cycles.
    pub certificate_duration: u32,
    pub effort: EffortWeights,
}

impl Default for DecisionParams {
    fn default() -> Self {
        Self {
            staking_threshold: 60.0,
            staking_share: 0.4,
            investment_threshold: 50.0,
            investment_share: 0.3,
            consumption_threshold: 40.0,
            casino_fee_per_level: 10.0,
            casino_retention: 0.8,
            certificate_duration: 24,
            effort: EffortWeights::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// SpendBreakdown
// ---------------------------------------------------------------------------

/// Spendable value used by one agent (or summed over many) in one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpendBreakdown {
    pub staking: f64,
    pub investment: f64,
    pub consumption: f64,
}

impl SpendBreakdown {
    pub fn total(&self) -> f64 {
        self.staking + self.investment + self.consumption
    }

    /// Effort proxy: weighted spend scaled by `0.5 + (growth + long_term) / 200`.
    pub fn effort(&self, aptitudes: &Aptitudes, weights: &EffortWeights) -> f64 {
        let weighted = weights.staking * self.staking
            + weights.investment * self.investment
            + weights.consumption * self.consumption;
        let scale = (0.5 + (aptitudes.growth() + aptitudes.long_term()) / 200.0).clamp(0.5, 1.0);
        weighted * scale
    }
}

impl std::ops::AddAssign for SpendBreakdown {
    fn add_assign(&mut self, rhs: Self) {
        self.staking += rhs.staking;
        self.investment += rhs.investment;
        self.consumption += rhs.consumption;
    }
}

// ---------------------------------------------------------------------------
// DecisionContext
// ---------------------------------------------------------------------------

/// Shared services one agent's decisions act on.
pub struct DecisionContext<'a, R: Rng + ?Sized> {
    pub cycle: u64,
    pub liquidity: f64,
    /// Enterprise index keyed by owner.
    pub enterprises: &'a mut BTreeMap<AgentId, Enterprise>,
    /// Owners alive at the start of the decision phase.
    pub active_owners: &'a [AgentId],
    pub registry: &'a mut CommitmentRegistry,
    pub ledger: &'a mut Ledger,
    pub catalog: &'a mut GoodsCatalog,
    pub rng: &'a mut R,
}

// ---------------------------------------------------------------------------
// AgentDecisionEngine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentDecisionEngine {
    params: DecisionParams,
    certificate_ids: IdSequence,
}

impl AgentDecisionEngine {
    pub fn new(params: DecisionParams) -> Self {
        Self {
            params,
            certificate_ids: IdSequence::new(),
        }
    }

    pub fn params(&self) -> &DecisionParams {
        &self.params
    }

    /// Run all three stages for one living agent.
    pub fn decide<R: Rng + ?Sized>(&mut self, agent: &mut Agent, ctx: &mut DecisionContext<'_, R>) -> SpendBreakdown {
        if !agent.alive {
            return SpendBreakdown::default();
        }
        let staking = self.stake(agent, ctx);
        let investment = self.invest(agent, ctx);
        let consumption = self.consume(agent, ctx);
        SpendBreakdown { staking, investment, consumption }
    }

    /// Effort proxy for a breakdown under this engine's weights.
    pub fn effort(&self, agent: &Agent, spend: &SpendBreakdown) -> f64 {
        spend.effort(agent.aptitudes(), &self.params.effort)
    }

    fn stake<R: Rng + ?Sized>(&self, agent: &mut Agent, ctx: &mut DecisionContext<'_, R>) -> f64 {
        let aptitude = agent.aptitudes().long_term();
        if aptitude <= self.params.staking_threshold {
            return 0.0;
        }
        let budget = agent.spendable_balance * (aptitude / 100.0) * self.params.staking_share;
        ctx.registry
            .propose(
                agent,
                budget,
                ctx.cycle,
                ctx.liquidity,
                &mut *ctx.ledger,
                &mut *ctx.catalog,
                &mut *ctx.rng,
            )
            .map(|p| p.first_payment)
            .unwrap_or(0.0)
    }

    fn invest<R: Rng + ?Sized>(&mut self, agent: &mut Agent, ctx: &mut DecisionContext<'_, R>) -> f64 {
        let aptitude = agent.aptitudes().savings();
        if aptitude <= self.params.investment_threshold || ctx.liquidity <= 0.0 {
            return 0.0;
        }
        let budget = agent.spendable_balance * (aptitude / 100.0) * self.params.investment_share;
        if budget <= 0.0 {
            return 0.0;
        }

        // Highest trust wins; the first owner in id order breaks ties.
        let target = ctx
            .active_owners
            .iter()
            .filter_map(|owner| ctx.enterprises.get(owner))
            .fold(None::<&Enterprise>, |best, e| match best {
                Some(b) if b.trust() >= e.trust() => Some(b),
                _ => Some(e),
            })
            .map(|e| e.owner);
        let Some(owner) = target else { return 0.0 };
        let Some(enterprise) = ctx.enterprises.get_mut(&owner) else { return 0.0 };

        if !agent.try_spend(budget) {
            return 0.0;
        }
        let injected = budget / ctx.liquidity;
        enterprise.durable_balance += injected;
        agent.certificates.push(FinancialCertificate {
            id: CertificateId(self.certificate_ids.next_id()),
            enterprise: enterprise.id,
            amount_spent: budget,
            value_injected: injected,
            issued_cycle: ctx.cycle,
            remaining_cycles: self.params.certificate_duration,
        });
        budget
    }

    fn consume<R: Rng + ?Sized>(&self, agent: &mut Agent, ctx: &mut DecisionContext<'_, R>) -> f64 {
        if agent.aptitudes().consumption() <= self.params.consumption_threshold || ctx.liquidity <= 0.0 {
            return 0.0;
        }
        let Some(owner) = pick_by_level(ctx.active_owners, ctx.enterprises, &mut *ctx.rng) else {
            return 0.0;
        };
        let Some(enterprise) = ctx.enterprises.get_mut(&owner) else { return 0.0 };

        let fee = f64::from(enterprise.level()) * self.params.casino_fee_per_level * ctx.liquidity;
        if !agent.try_spend(fee) {
            return 0.0;
        }
        enterprise.durable_balance += fee / ctx.liquidity * self.params.casino_retention;
        enterprise.participants += 1;

        let tier = draw_casino_tier(enterprise.level(), &mut *ctx.rng);
        agent.goods.push(ctx.catalog.mint(tier));
        fee
    }
}

/// Choose an active enterprise with probability proportional to its level.
fn pick_by_level<R: Rng + ?Sized>(
    owners: &[AgentId],
    enterprises: &BTreeMap<AgentId, Enterprise>,
    rng: &mut R,
) -> Option<AgentId> {
    let candidates: Vec<&Enterprise> = owners.iter().filter_map(|o| enterprises.get(o)).collect();
    let total: u32 = candidates.iter().map(|e| u32::from(e.level())).sum();
    if total == 0 {
        return None;
    }
    let mut roll = rng.gen_range(0..total);
    for e in &candidates {
        let weight = u32::from(e.level());
        if roll < weight {
            return Some(e.owner);
        }
        roll -= weight;
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
