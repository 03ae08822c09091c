// Copyright © 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! The living population: agent roster, enterprise index and demographics.
//!
//! The roster is the source of truth. Dead agents stay in it with
//! `alive = false` so ids never dangle; enterprises are indexed by owner and
//! become inert when their owner dies.

use rand::Rng;
use std::collections::BTreeMap;

use crate::agent::{Agent, AgentError, Aptitudes, Enterprise};
use crate::core_types::{AgentId, EnterpriseId};
use crate::goods::Good;

// -- Demographic constants ---------------------------------------------------

pub const ADULT_AGE: u32 = 18;
pub const MAX_INITIAL_AGE: u32 = 65;

/// Monthly death probability for adults under [`SENESCENCE_AGE`].
const BASE_MORTALITY: f64 = 0.00008;
/// Age from which mortality grows exponentially.
const SENESCENCE_AGE: u32 = 60;
const MORTALITY_GROWTH: f64 = 0.1;
/// Births per death, keeping the population slowly growing.
const BIRTH_REPLACEMENT: f64 = 1.01;

/// Monthly death probability at `age` (Gompertz law).
pub fn death_probability(age: u32) -> f64 {
    if age < ADULT_AGE {
        0.0
    } else if age < SENESCENCE_AGE {
        BASE_MORTALITY
    } else {
        BASE_MORTALITY * (MORTALITY_GROWTH * f64::from(age - SENESCENCE_AGE)).exp()
    }
}

// ---------------------------------------------------------------------------
// Estate
// ---------------------------------------------------------------------------

/// What a deceased agent leaves behind, removed from the roster entry.
#[derive(Debug, Clone)]
pub struct Estate {
    pub agent: AgentId,
    pub durable_balance: f64,
    pub goods: Vec<Good>,
}

// ---------------------------------------------------------------------------
// Population
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Population {
    agents: Vec<Agent>,
    enterprises: BTreeMap<AgentId, Enterprise>,
    next_enterprise: u32,
}

impl Population {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an agent with random aptitudes, optionally founding an enterprise.
    ///
    /// Enterprise level is uniform in 1..=3 and its trust copies the owner's
    /// trust aptitude.
    pub fn spawn<R: Rng + ?Sized>(
        &mut self,
        age: u32,
        with_enterprise: bool,
        rng: &mut R,
    ) -> Result<AgentId, AgentError> {
        let aptitudes = Aptitudes::random(rng);
        let id = AgentId(self.agents.len() as u32);
        if with_enterprise {
            let level = rng.gen_range(1..=3u8);
            let enterprise = Enterprise::new(
                EnterpriseId(self.next_enterprise),
                id,
                level,
                aptitudes.trust(),
            )?;
            self.next_enterprise += 1;
            self.enterprises.insert(id, enterprise);
        }
        self.agents.push(Agent::new(id, age, aptitudes));
        Ok(id)
    }

    /// Insert a pre-built agent, assigning it the next roster id.
    pub fn insert(&mut self, mut agent: Agent) -> AgentId {
        let id = AgentId(self.agents.len() as u32);
        agent.id = id;
        self.agents.push(agent);
        id
    }

    /// Attach an enterprise to an existing agent. Replaces any previous one.
    pub fn found_enterprise(&mut self, owner: AgentId, level: u8) -> Result<EnterpriseId, AgentError> {
        let trust = self.agent(owner).map(|a| a.aptitudes().trust()).unwrap_or(0.0);
        let id = EnterpriseId(self.next_enterprise);
        let enterprise = Enterprise::new(id, owner, level, trust)?;
        self.next_enterprise += 1;
        self.enterprises.insert(owner, enterprise);
        Ok(id)
    }

    // -- Lookup ---------------------------------------------------------------

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agents_mut(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id.index())
    }

    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(id.index())
    }

    pub fn is_alive(&self, id: AgentId) -> bool {
        self.agent(id).map(|a| a.alive).unwrap_or(false)
    }

    pub fn living(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter().filter(|a| a.alive)
    }

    pub fn living_ids(&self) -> Vec<AgentId> {
        self.living().map(|a| a.id).collect()
    }

    pub fn living_count(&self) -> usize {
        self.living().count()
    }

    pub fn enterprise_of(&self, owner: AgentId) -> Option<&Enterprise> {
        self.enterprises.get(&owner)
    }

    pub fn enterprise_of_mut(&mut self, owner: AgentId) -> Option<&mut Enterprise> {
        self.enterprises.get_mut(&owner)
    }

    pub fn enterprises(&self) -> impl Iterator<Item = &Enterprise> {
        self.enterprises.values()
    }

    /// Enterprises whose owner is alive.
    pub fn active_enterprises(&self) -> impl Iterator<Item = &Enterprise> {
        self.enterprises.values().filter(move |e| self.is_alive(e.owner))
    }

    /// Owners of active enterprises, in owner-id order.
    pub fn active_owners(&self) -> Vec<AgentId> {
        self.active_enterprises().map(|e| e.owner).collect()
    }

    pub fn active_enterprise_count(&self) -> usize {
        self.active_enterprises().count()
    }

    /// Disjoint mutable access to the roster and the enterprise index.
    pub fn split_mut(&mut self) -> (&mut [Agent], &mut BTreeMap<AgentId, Enterprise>) {
        (&mut self.agents, &mut self.enterprises)
    }

    // -- Aggregates -------------------------------------------------------------

    /// Durable balances of living agents.
    pub fn living_wealth(&self) -> f64 {
        self.living().map(|a| a.durable_balance).sum()
    }

    /// Durable balances of enterprises with a living owner.
    pub fn enterprise_wealth(&self) -> f64 {
        self.active_enterprises().map(|e| e.durable_balance).sum()
    }

    /// V_ON: durable value held by living agents and active enterprises.
    pub fn active_wealth(&self) -> f64 {
        self.living_wealth() + self.enterprise_wealth()
    }

    /// Spendable value currently held by living agents.
    pub fn spendable_circulation(&self) -> f64 {
        self.living().map(|a| a.spendable_balance).sum()
    }

    /// Zero every spendable balance. Returns the amount destroyed.
    pub fn expire_spendable(&mut self) -> f64 {
        self.agents.iter_mut().map(Agent::expire_spendable).sum()
    }

    /// Count down certificates of every living agent.
    pub fn age_certificates(&mut self) -> usize {
        self.agents
            .iter_mut()
            .filter(|a| a.alive)
            .map(Agent::age_certificates)
            .sum()
    }

    // -- Demographics -------------------------------------------------------------

    /// Every living agent grows one year older.
    pub fn advance_age(&mut self) {
        for agent in self.agents.iter_mut().filter(|a| a.alive) {
            agent.age += 1;
        }
    }

    /// Mark `id` dead and strip its estate. `None` if already dead or unknown.
    pub fn kill(&mut self, id: AgentId) -> Option<Estate> {
        let agent = self.agents.get_mut(id.index()).filter(|a| a.alive)?;
        agent.alive = false;
        agent.spendable_balance = 0.0;
        agent.certificates.clear();
        Some(Estate {
            agent: id,
            durable_balance: std::mem::replace(&mut agent.durable_balance, 0.0),
            goods: std::mem::take(&mut agent.goods),
        })
    }

    /// Draw monthly mortality for every living agent.
    pub fn draw_deaths<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<Estate> {
        let candidates: Vec<AgentId> = self
            .living()
            .filter(|a| rng.gen::<f64>() < death_probability(a.age))
            .map(|a| a.id)
            .collect();
        candidates.into_iter().filter_map(|id| self.kill(id)).collect()
    }

    /// Replace `deaths` agents with newborn adults.
    ///
    /// Births are `floor(deaths x 1.01)`; none when nobody is left alive.
    pub fn spawn_births<R: Rng + ?Sized>(
        &mut self,
        deaths: usize,
        enterprise_ratio: f64,
        rng: &mut R,
    ) -> Result<usize, AgentError> {
        if deaths == 0 || self.living_count() == 0 {
            return Ok(0);
        }
        let births = (deaths as f64 * BIRTH_REPLACEMENT).floor() as usize;
        for _ in 0..births {
            let with_enterprise = rng.gen::<f64>() < enterprise_ratio;
            self.spawn(ADULT_AGE, with_enterprise, rng)?;
        }
        Ok(births)
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

    fn populated(n: usize, enterprises: usize) -> (Population, ChaCha8Rng) {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut pop = Population::new();
        for i in 0..n {
            pop.spawn(30, i < enterprises, &mut rng).expect("test: spawn");
        }
        (pop, rng)
    }

    #[test]
    fn death_probability_law() {
        assert_eq!(death_probability(10), 0.0);
        assert_eq!(death_probability(18), 0.00008);
        assert_eq!(death_probability(59), 0.00008);
        assert!((death_probability(70) - 0.00008 * 1.0_f64.exp()).abs() < 1e-15);
        assert!(death_probability(90) > death_probability(80));
    }

    #[test]
    fn spawn_assigns_dense_ids_and_enterprises() {
        let (pop, _) = populated(10, 3);
        assert_eq!(pop.agents().len(), 10);
        assert_eq!(pop.agent(AgentId(9)).map(|a| a.id), Some(AgentId(9)));
        assert_eq!(pop.active_enterprise_count(), 3);
        for e in pop.enterprises() {
            assert!((1..=3).contains(&e.level()));
            let owner = pop.agent(e.owner).expect("test: owner exists");
            assert_eq!(e.trust(), owner.aptitudes().trust());
        }
    }

    #[test]
    fn active_wealth_excludes_dead() {
        let (mut pop, _) = populated(4, 1);
        for agent in pop.agents_mut() {
            agent.durable_balance = 25.0;
        }
        if let Some(e) = pop.enterprise_of_mut(AgentId(0)) {
            e.durable_balance = 40.0;
        }
        assert_eq!(pop.active_wealth(), 140.0);

        let estate = pop.kill(AgentId(0)).expect("test: alive agent");
        assert_eq!(estate.durable_balance, 25.0);
        assert_eq!(pop.active_wealth(), 75.0, "dead owner's enterprise is inert");
        assert_eq!(pop.living_count(), 3);
        assert!(pop.kill(AgentId(0)).is_none(), "cannot die twice");
    }

    #[test]
    fn expire_spendable_zeroes_everyone() {
        let (mut pop, _) = populated(3, 0);
        for agent in pop.agents_mut() {
            agent.spendable_balance = 5.0;
        }
        assert_eq!(pop.spendable_circulation(), 15.0);
        assert_eq!(pop.expire_spendable(), 15.0);
        assert_eq!(pop.spendable_circulation(), 0.0);
    }

    #[test]
    fn advance_age_skips_dead() {
        let (mut pop, _) = populated(2, 0);
        pop.kill(AgentId(1));
        pop.advance_age();
        assert_eq!(pop.agent(AgentId(0)).map(|a| a.age), Some(31));
        assert_eq!(pop.agent(AgentId(1)).map(|a| a.age), Some(30));
    }

    #[test]
    fn births_replace_deaths() {
        let (mut pop, mut rng) = populated(50, 0);
        let births = pop.spawn_births(3, 0.0, &mut rng).expect("test: births");
        assert_eq!(births, 3);
        assert_eq!(pop.agents().len(), 53);
        assert_eq!(pop.agent(AgentId(52)).map(|a| a.age), Some(ADULT_AGE));

        let none = pop.spawn_births(0, 0.3, &mut rng).expect("test: births");
        assert_eq!(none, 0);
    }

    #[test]
    fn elderly_population_dies_faster() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut old = Population::new();
        for _ in 0..2000 {
            old.spawn(110, false, &mut rng).expect("test: spawn");
        }
        let deaths = old.draw_deaths(&mut rng).len();
        // 0.00008 * e^5 ~= 1.19% per month
        assert!(deaths > 5 && deaths < 60, "deaths {}", deaths);
        assert_eq!(old.living_count(), 2000 - deaths);
    }
}
