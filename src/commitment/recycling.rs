// Copyright © 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Recycling stock -- 1★-3★ goods recovered from deceased agents.
//!
//! A recycled good's value is parked as regulator debt until the good is
//! handed to one of the poorest living agents, at which point the same
//! amount is released again.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::CommitmentError;
use crate::core_types::AgentId;
use crate::goods::Good;
use crate::ledger::{Ledger, Sector};
use crate::population::Population;

/// Goods handed out per cycle unless configured otherwise.
pub const DEFAULT_REDISTRIBUTION_PER_CYCLE: usize = 10;

/// Outcome of one redistribution pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Redistribution {
    pub count: usize,
    pub value: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecyclingStock {
    goods: VecDeque<Good>,
    recycled_count: u64,
    recycled_value: f64,
    redistributed_count: u64,
    redistributed_value: f64,
}

impl RecyclingStock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take in a 1★-3★ good and book its value as regulator debt.
    pub fn recycle(&mut self, good: Good, ledger: &mut Ledger) -> Result<(), CommitmentError> {
        if good.tier().is_commitment_tier() {
            return Err(CommitmentError::NotRecyclable(good.tier().stars()));
        }
        ledger.adjust(good.value, Sector::Regulator);
        self.recycled_count += 1;
        self.recycled_value += good.value;
        self.goods.push_back(good);
        Ok(())
    }

    /// Give up to `max_goods` goods, oldest first, to random members of the
    /// poorest third of living agents (by patrimony).
    pub fn redistribute<R: Rng + ?Sized>(
        &mut self,
        population: &mut Population,
        ledger: &mut Ledger,
        max_goods: usize,
        rng: &mut R,
    ) -> Redistribution {
        let mut out = Redistribution::default();
        if self.goods.is_empty() || max_goods == 0 {
            return out;
        }
        let pool = poorest_third(population);
        if pool.is_empty() {
            return out;
        }

        for _ in 0..max_goods {
            let Some(good) = self.goods.pop_front() else { break };
            let beneficiary = pool[rng.gen_range(0..pool.len())];
            let Some(agent) = population.agent_mut(beneficiary) else {
                self.goods.push_front(good);
                break;
            };
            ledger.adjust(-good.value, Sector::Regulator);
            out.count += 1;
            out.value += good.value;
            agent.goods.push(good);
        }
        self.redistributed_count += out.count as u64;
        self.redistributed_value += out.value;
        out
    }

    pub fn len(&self) -> usize {
        self.goods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.goods.is_empty()
    }

    /// Value currently waiting in the stock.
    pub fn stock_value(&self) -> f64 {
        self.goods.iter().map(|g| g.value).sum()
    }

    pub fn recycled_count(&self) -> u64 {
        self.recycled_count
    }

    pub fn recycled_value(&self) -> f64 {
        self.recycled_value
    }

    pub fn redistributed_count(&self) -> u64 {
        self.redistributed_count
    }
}

/// Living agents in the bottom third by patrimony (at least one).
fn poorest_third(population: &Population) -> Vec<AgentId> {
    let mut living: Vec<(f64, AgentId)> =
        population.living().map(|a| (a.patrimony(), a.id)).collect();
    if living.is_empty() {
        return Vec::new();
    }
    living.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    let size = (living.len() / 3).max(1);
    living.truncate(size);
    living.into_iter().map(|(_, id)| id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::GoodId;
    use crate::goods::StarTier;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn good(id: u64, tier: StarTier, value: f64) -> Good {
        Good::new(GoodId(id), tier, value).expect("test: valid good")
    }

    fn population(n: usize, rng: &mut ChaCha8Rng) -> Population {
        let mut pop = Population::new();
        for i in 0..n {
            let id = pop.spawn(40, false, rng).expect("test: spawn");
            if let Some(a) = pop.agent_mut(id) {
                a.durable_balance = 100.0 * (i as f64 + 1.0);
            }
        }
        pop
    }

    #[test]
    fn recycle_books_regulator_debt() {
        let mut stock = RecyclingStock::new();
        let mut ledger = Ledger::new();
        stock.recycle(good(1, StarTier::Two, 40.0), &mut ledger).expect("test: recyclable");
        assert_eq!(ledger.sector(Sector::Regulator), 40.0);
        assert_eq!(stock.len(), 1);
        assert_eq!(stock.recycled_value(), 40.0);
    }

    #[test]
    fn high_tier_goods_are_rejected() {
        let mut stock = RecyclingStock::new();
        let mut ledger = Ledger::new();
        let err = stock.recycle(good(1, StarTier::Four, 2000.0), &mut ledger).unwrap_err();
        assert!(matches!(err, CommitmentError::NotRecyclable(4)));
        assert_eq!(ledger.total(), 0.0);
        assert!(stock.is_empty());
    }

    #[test]
    fn redistribution_targets_poorest_third() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut pop = population(9, &mut rng);
        let mut ledger = Ledger::new();
        let mut stock = RecyclingStock::new();
        for i in 0..12 {
            stock.recycle(good(i, StarTier::One, 5.0), &mut ledger).expect("test: recyclable");
        }

        let out = stock.redistribute(&mut pop, &mut ledger, 10, &mut rng);
        assert_eq!(out.count, 10, "capped per cycle");
        assert_eq!(stock.len(), 2);
        assert!((ledger.sector(Sector::Regulator) - 10.0).abs() < 1e-9);

        // Balances 100..900: the poorest third is agents 0, 1 and 2.
        let received: usize = pop.agents()[3..].iter().map(|a| a.goods.len()).sum();
        assert_eq!(received, 0);
        let poor: usize = pop.agents()[..3].iter().map(|a| a.goods.len()).sum();
        assert_eq!(poor, 10);
    }

    #[test]
    fn redistribution_skips_dead_agents() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut pop = population(3, &mut rng);
        pop.kill(AgentId(0));
        let mut ledger = Ledger::new();
        let mut stock = RecyclingStock::new();
        stock.recycle(good(0, StarTier::Three, 20.0), &mut ledger).expect("test: recyclable");

        let out = stock.redistribute(&mut pop, &mut ledger, 10, &mut rng);
        assert_eq!(out.count, 1);
        assert!(pop.agent(AgentId(0)).map(|a| a.goods.is_empty()).unwrap_or(false));
    }

    #[test]
    fn empty_population_keeps_stock() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut pop = Population::new();
        let mut ledger = Ledger::new();
        let mut stock = RecyclingStock::new();
        stock.recycle(good(0, StarTier::One, 5.0), &mut ledger).expect("test: recyclable");
        let out = stock.redistribute(&mut pop, &mut ledger, 10, &mut rng);
        assert_eq!(out.count, 0);
        assert_eq!(stock.len(), 1);
        assert_eq!(ledger.sector(Sector::Regulator), 5.0);
    }
}
