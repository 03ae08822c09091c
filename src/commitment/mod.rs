// Copyright © 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Commitment registry -- staking contracts over 4★/5★ goods.
//!
//! ```text
//! proposed --(first installment)--> active --(all installments)--> completed
//!                                      |
//!                                      +--(holder dies)--> cancelled
//! ```
//!
//! Opening a contract books its full value as engagement debt; completion or
//! cancellation reverses exactly that amount. The registry also owns the
//! [`RecyclingStock`] for lower-tier goods recovered from estates.

pub mod contract;
pub mod recycling;

pub use contract::{CommitmentContract, ContractState, ContractTerms};
pub use recycling::{RecyclingStock, Redistribution, DEFAULT_REDISTRIBUTION_PER_CYCLE};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::agent::Agent;
use crate::core_types::{AgentId, ContractId, IdSequence};
use crate::goods::{Good, GoodsCatalog, StarTier};
use crate::ledger::{Ledger, Sector};
use crate::population::Population;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CommitmentError {
    #[error("{0}★ goods cannot be recycled; the recycling stock takes 1★-3★ goods only")]
    NotRecyclable(u8),

    #[error("{0}★ goods cannot enter the commitment stock; it takes 4★-5★ goods only")]
    NotCommitmentTier(u8),
}

// -- Constants ---------------------------------------------------------------

/// Value of a synthesized 4★ good when the stock is empty.
pub const PLACEHOLDER_FOUR_STAR_VALUE: f64 = 2000.0;
/// Value of a synthesized 5★ good when the stock is empty.
pub const PLACEHOLDER_FIVE_STAR_VALUE: f64 = 5000.0;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// A successfully opened contract.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub contract: ContractId,
    /// Spendable debited as the first installment.
    pub first_payment: f64,
    pub total_value: f64,
}

/// What one settlement pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SettlementReport {
    pub payments: usize,
    pub collected: f64,
    pub missed: usize,
    pub completed: usize,
    pub cancelled: usize,
    /// Active contracts that can no longer complete.
    pub stalled: usize,
}

/// Lifetime counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub opened: u64,
    pub completed: u64,
    pub cancelled: u64,
    pub missed_payments: u64,
    pub value_collected: f64,
}

// ---------------------------------------------------------------------------
// CommitmentRegistry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitmentRegistry {
    /// 4★/5★ goods available for staking.
    stock: Vec<Good>,
    /// Contracts in the active state.
    contracts: Vec<CommitmentContract>,
    recycling: RecyclingStock,
    ids: IdSequence,
    stats: RegistryStats,
}

impl CommitmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Stock ---------------------------------------------------------------

    /// Add a 4★/5★ good to the staking stock.
    pub fn deposit(&mut self, good: Good) -> Result<(), CommitmentError> {
        if !good.tier().is_commitment_tier() {
            return Err(CommitmentError::NotCommitmentTier(good.tier().stars()));
        }
        self.stock.push(good);
        Ok(())
    }

    /// Route a good left by a deceased agent: high tiers to the staking
    /// stock, the rest to recycling.
    pub fn absorb_estate_good(&mut self, good: Good, ledger: &mut Ledger) -> Result<(), CommitmentError> {
        if good.tier().is_commitment_tier() {
            self.deposit(good)
        } else {
            self.recycling.recycle(good, ledger)
        }
    }

    pub fn stock(&self) -> &[Good] {
        &self.stock
    }

    /// Stock size for one tier.
    pub fn stock_count(&self, tier: StarTier) -> usize {
        self.stock.iter().filter(|g| g.tier() == tier).count()
    }

    pub fn recycling(&self) -> &RecyclingStock {
        &self.recycling
    }

    pub fn recycling_mut(&mut self) -> &mut RecyclingStock {
        &mut self.recycling
    }

    // -- Contracts -------------------------------------------------------------

    pub fn contracts(&self) -> &[CommitmentContract] {
        &self.contracts
    }

    pub fn contract(&self, id: ContractId) -> Option<&CommitmentContract> {
        self.contracts.iter().find(|c| c.id == id)
    }

    pub fn active_count(&self) -> usize {
        self.contracts.len()
    }

    pub fn stats(&self) -> &RegistryStats {
        &self.stats
    }

    /// Total contracted value of contracts whose holder is alive.
    pub fn outstanding_value(&self, population: &Population) -> f64 {
        self.contracts
            .iter()
            .filter(|c| population.is_alive(c.agent))
            .map(|c| c.total_value)
            .sum()
    }

    /// Try to open a contract for `agent` within `budget` per month.
    ///
    /// With an empty stock a placeholder 4★ or 5★ good is synthesized and the
    /// budget is not applied; otherwise the cheapest good whose installment
    /// fits the budget is taken. Returns `None` when nothing fits or the
    /// agent cannot cover the first installment.
    #[allow(clippy::too_many_arguments)]
    pub fn propose<R: Rng + ?Sized>(
        &mut self,
        agent: &mut Agent,
        budget: f64,
        cycle: u64,
        liquidity: f64,
        ledger: &mut Ledger,
        catalog: &mut GoodsCatalog,
        rng: &mut R,
    ) -> Option<Proposal> {
        if budget <= 0.0 || liquidity <= 0.0 {
            return None;
        }

        let (good, terms) = if self.stock.is_empty() {
            let (tier, value) = if rng.gen_bool(0.5) {
                (StarTier::Four, PLACEHOLDER_FOUR_STAR_VALUE)
            } else {
                (StarTier::Five, PLACEHOLDER_FIVE_STAR_VALUE)
            };
            let duration = tier.commitment_duration();
            let monthly = value * liquidity / f64::from(duration);
            if agent.spendable_balance < monthly {
                return None;
            }
            let good = catalog.mint_with_value(tier, value);
            let terms = ContractTerms::for_good(&good, liquidity);
            (good, terms)
        } else {
            let index = self
                .stock
                .iter()
                .enumerate()
                .filter(|(_, g)| ContractTerms::for_good(g, liquidity).monthly_payment <= budget)
                .min_by(|(_, a), (_, b)| a.value.total_cmp(&b.value))
                .map(|(i, _)| i)?;
            let terms = ContractTerms::for_good(&self.stock[index], liquidity);
            if agent.spendable_balance < terms.monthly_payment {
                return None;
            }
            (self.stock.remove(index), terms)
        };

        if !agent.try_spend(terms.monthly_payment) {
            return None;
        }

        let id = ContractId(self.ids.next_id());
        let mut contract = CommitmentContract::propose(id, agent.id, good, terms, cycle);
        contract.activate();
        ledger.adjust(terms.total_value, Sector::Engagement);
        agent.contracts.push(id);
        self.contracts.push(contract);
        self.stats.opened += 1;
        self.stats.value_collected += terms.monthly_payment;

        Some(Proposal {
            contract: id,
            first_payment: terms.monthly_payment,
            total_value: terms.total_value,
        })
    }

    /// Advance every active contract for `cycle`.
    ///
    /// Contracts of dead holders are cancelled, fully paid contracts deliver
    /// their good, and the rest collect an installment when one is due.
    pub fn settle(&mut self, population: &mut Population, cycle: u64, ledger: &mut Ledger) -> SettlementReport {
        let mut report = SettlementReport::default();
        let mut kept = Vec::with_capacity(self.contracts.len());

        for mut contract in std::mem::take(&mut self.contracts) {
            let alive = population.is_alive(contract.agent);
            let holder = population.agent_mut(contract.agent);

            let Some(agent) = holder.filter(|_| alive) else {
                self.cancel(contract, population, ledger);
                report.cancelled += 1;
                continue;
            };

            if contract.is_fully_paid() {
                ledger.adjust(-contract.total_value, Sector::Engagement);
                agent.contracts.retain(|c| *c != contract.id);
                contract.state = ContractState::Completed;
                agent.goods.push(contract.good);
                self.stats.completed += 1;
                report.completed += 1;
                continue;
            }

            if contract.is_payment_due(cycle) {
                if agent.try_spend(contract.monthly_payment) {
                    contract.cycles_paid += 1;
                    report.payments += 1;
                    report.collected += contract.monthly_payment;
                } else {
                    contract.missed_payments += 1;
                    report.missed += 1;
                    self.stats.missed_payments += 1;
                    if contract.missed_payments == 1 {
                        warn!(
                            contract = %contract.id,
                            agent = %contract.agent,
                            cycle,
                            installment = contract.monthly_payment,
                            paid = contract.cycles_paid,
                            duration = contract.duration,
                            "Commitment installment missed; contract stalled"
                        );
                    }
                }
            }
            if contract.is_stalled() {
                report.stalled += 1;
            }
            kept.push(contract);
        }

        self.stats.value_collected += report.collected;
        self.contracts = kept;
        report
    }

    fn cancel(&mut self, mut contract: CommitmentContract, population: &mut Population, ledger: &mut Ledger) {
        ledger.adjust(-contract.total_value, Sector::Engagement);
        if let Some(agent) = population.agent_mut(contract.agent) {
            agent.contracts.retain(|c| *c != contract.id);
        }
        contract.state = ContractState::Cancelled;
        self.stock.push(contract.good);
        self.stats.cancelled += 1;
    }

    /// Hand recycled goods to the poorest living agents.
    pub fn redistribute_recycled<R: Rng + ?Sized>(
        &mut self,
        population: &mut Population,
        ledger: &mut Ledger,
        max_goods: usize,
        rng: &mut R,
    ) -> Redistribution {
        self.recycling.redistribute(population, ledger, max_goods, rng)
    }

    /// Contracts held by `agent`.
    pub fn contracts_of(&self, agent: AgentId) -> impl Iterator<Item = &CommitmentContract> {
        self.contracts.iter().filter(move |c| c.agent == agent)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::GoodId;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    struct Fixture {
        registry: CommitmentRegistry,
        population: Population,
        ledger: Ledger,
        catalog: GoodsCatalog,
        rng: ChaCha8Rng,
    }

    fn fixture(agents: usize) -> Fixture {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut population = Population::new();
        for _ in 0..agents {
            population.spawn(30, false, &mut rng).expect("test: spawn");
        }
        Fixture {
            registry: CommitmentRegistry::new(),
            population,
            ledger: Ledger::new(),
            catalog: GoodsCatalog::generate(10_000.0),
            rng,
        }
    }

    fn stock_good(id: u64, tier: StarTier, value: f64) -> Good {
        Good::new(GoodId(id), tier, value).expect("test: valid good")
    }

    fn open(f: &mut Fixture, agent: AgentId, budget: f64, cycle: u64) -> Option<Proposal> {
        let a = f.population.agent_mut(agent).expect("test: agent exists");
        f.registry.propose(a, budget, cycle, 1.0, &mut f.ledger, &mut f.catalog, &mut f.rng)
    }

    /// Fund the agent and settle every cycle in `cycles`, returning the
    /// cycle at which the contract completed.
    fn run_to_completion(f: &mut Fixture, agent: AgentId, cycles: std::ops::Range<u64>) -> Option<u64> {
        for cycle in cycles {
            if let Some(a) = f.population.agent_mut(agent) {
                a.spendable_balance = 1_000.0;
            }
            let report = f.registry.settle(&mut f.population, cycle, &mut f.ledger);
            if report.completed > 0 {
                return Some(cycle);
            }
        }
        None
    }

    #[test]
    fn deposit_rejects_low_tiers() {
        let mut registry = CommitmentRegistry::new();
        assert!(registry.deposit(stock_good(1, StarTier::Four, 1000.0)).is_ok());
        assert!(matches!(
            registry.deposit(stock_good(2, StarTier::Two, 50.0)),
            Err(CommitmentError::NotCommitmentTier(2))
        ));
        assert_eq!(registry.stock_count(StarTier::Four), 1);
    }

    #[test]
    fn cheapest_affordable_good_is_chosen() {
        let mut f = fixture(1);
        f.registry.deposit(stock_good(1, StarTier::Five, 6000.0)).expect("test: deposit");
        f.registry.deposit(stock_good(2, StarTier::Four, 4800.0)).expect("test: deposit");
        f.registry.deposit(stock_good(3, StarTier::Four, 2400.0)).expect("test: deposit");
        f.population.agents_mut()[0].spendable_balance = 500.0;

        let p = open(&mut f, AgentId(0), 200.0, 0).expect("test: proposal");
        assert_eq!(p.first_payment, 50.0);
        assert_eq!(p.total_value, 2400.0);
        assert_eq!(f.population.agents()[0].spendable_balance, 450.0);
        assert_eq!(f.ledger.sector(Sector::Engagement), 2400.0);
        assert_eq!(f.registry.stock().len(), 2);
        assert_eq!(f.population.agents()[0].contracts, vec![p.contract]);
        let c = f.registry.contract(p.contract).expect("test: contract");
        assert_eq!(c.cycles_paid, 1);
        assert_eq!(c.state, ContractState::Active);
    }

    #[test]
    fn budget_too_small_fails_without_side_effects() {
        let mut f = fixture(1);
        f.registry.deposit(stock_good(1, StarTier::Four, 4800.0)).expect("test: deposit");
        f.population.agents_mut()[0].spendable_balance = 500.0;

        assert!(open(&mut f, AgentId(0), 99.0, 0).is_none());
        assert_eq!(f.population.agents()[0].spendable_balance, 500.0);
        assert_eq!(f.ledger.total(), 0.0);
        assert_eq!(f.registry.stock().len(), 1);
    }

    #[test]
    fn unaffordable_first_installment_fails() {
        let mut f = fixture(1);
        f.registry.deposit(stock_good(1, StarTier::Four, 4800.0)).expect("test: deposit");
        f.population.agents_mut()[0].spendable_balance = 80.0;
        assert!(open(&mut f, AgentId(0), 150.0, 0).is_none());
        assert_eq!(f.registry.stock().len(), 1);
    }

    #[test]
    fn empty_stock_synthesizes_placeholder() {
        let mut f = fixture(1);
        f.population.agents_mut()[0].spendable_balance = 1000.0;
        let p = open(&mut f, AgentId(0), 1.0, 0).expect("test: placeholder proposal");
        let c = f.registry.contract(p.contract).expect("test: contract");
        match c.good.tier() {
            StarTier::Four => assert_eq!(c.good.value, 2000.0),
            StarTier::Five => assert_eq!(c.good.value, 5000.0),
            other => panic!("unexpected placeholder tier {:?}", other),
        }
        assert!(f.registry.stock().is_empty());
    }

    #[test]
    fn four_star_completes_after_forty_eight_cycles() {
        let mut f = fixture(1);
        f.registry.deposit(stock_good(1, StarTier::Four, 2400.0)).expect("test: deposit");
        f.population.agents_mut()[0].spendable_balance = 100.0;
        let start = 5;
        open(&mut f, AgentId(0), 100.0, start).expect("test: proposal");

        let done = run_to_completion(&mut f, AgentId(0), start..start + 100);
        assert_eq!(done, Some(start + 48));
        let agent = &f.population.agents()[0];
        assert_eq!(agent.goods.len(), 1);
        assert!(agent.contracts.is_empty());
        assert!(f.ledger.sector(Sector::Engagement).abs() < 1e-9);
        assert_eq!(f.registry.active_count(), 0);
        assert_eq!(f.registry.stats().completed, 1);
    }

    #[test]
    fn five_star_completes_after_sixty_cycles() {
        let mut f = fixture(1);
        f.registry.deposit(stock_good(1, StarTier::Five, 6000.0)).expect("test: deposit");
        f.population.agents_mut()[0].spendable_balance = 100.0;
        open(&mut f, AgentId(0), 100.0, 0).expect("test: proposal");
        assert_eq!(run_to_completion(&mut f, AgentId(0), 0..100), Some(60));
    }

    #[test]
    fn dead_holder_cancels_contract() {
        let mut f = fixture(2);
        f.registry.deposit(stock_good(1, StarTier::Four, 2400.0)).expect("test: deposit");
        f.population.agents_mut()[1].spendable_balance = 100.0;
        let p = open(&mut f, AgentId(1), 100.0, 0).expect("test: proposal");
        f.ledger.adjust(500.0, Sector::Engagement);
        let before = f.ledger.sector(Sector::Engagement);

        f.population.kill(AgentId(1)).expect("test: alive");
        let report = f.registry.settle(&mut f.population, 3, &mut f.ledger);

        assert_eq!(report.cancelled, 1);
        assert!(f.registry.contract(p.contract).is_none());
        assert_eq!(f.registry.stock().len(), 1, "good returns to stock");
        assert!(f.population.agents()[1].contracts.is_empty());
        assert!((before - f.ledger.sector(Sector::Engagement) - p.total_value).abs() < 1e-9);
    }

    #[test]
    fn missed_installment_stalls_contract() {
        let mut f = fixture(1);
        f.registry.deposit(stock_good(1, StarTier::Four, 2400.0)).expect("test: deposit");
        f.population.agents_mut()[0].spendable_balance = 50.0;
        let p = open(&mut f, AgentId(0), 100.0, 0).expect("test: proposal");

        let r1 = f.registry.settle(&mut f.population, 1, &mut f.ledger);
        assert_eq!(r1.missed, 1);
        assert_eq!(r1.stalled, 1);

        f.population.agents_mut()[0].spendable_balance = 1_000.0;
        let r2 = f.registry.settle(&mut f.population, 2, &mut f.ledger);
        assert_eq!(r2.payments, 0, "a skipped installment is never collected later");
        assert_eq!(r2.stalled, 1);
        let c = f.registry.contract(p.contract).expect("test: still active");
        assert_eq!(c.cycles_paid, 1);
        assert_eq!(f.registry.stats().missed_payments, 1);
    }

    #[test]
    fn outstanding_value_ignores_dead_holders() {
        let mut f = fixture(2);
        for id in 0..2 {
            f.registry.deposit(stock_good(id, StarTier::Four, 2400.0)).expect("test: deposit");
            f.population.agents_mut()[id as usize].spendable_balance = 100.0;
        }
        open(&mut f, AgentId(0), 100.0, 0).expect("test: proposal");
        open(&mut f, AgentId(1), 100.0, 0).expect("test: proposal");
        assert_eq!(f.registry.outstanding_value(&f.population), 4800.0);
        f.population.kill(AgentId(0));
        assert_eq!(f.registry.outstanding_value(&f.population), 2400.0);
    }

    #[test]
    fn estate_goods_are_routed_by_tier() {
        let mut f = fixture(0);
        f.registry
            .absorb_estate_good(stock_good(1, StarTier::Five, 5000.0), &mut f.ledger)
            .expect("test: absorb");
        f.registry
            .absorb_estate_good(stock_good(2, StarTier::One, 8.0), &mut f.ledger)
            .expect("test: absorb");
        assert_eq!(f.registry.stock_count(StarTier::Five), 1);
        assert_eq!(f.registry.recycling().len(), 1);
        assert_eq!(f.ledger.sector(Sector::Regulator), 8.0);
    }
}
