// Copyright 2026 Hypermesh Foundation. All rights reserved.
// IRIS Economy Simulation Suite - Simulation Core

use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::agent::AgentError;
use crate::commitment::{CommitmentError, CommitmentRegistry};
use crate::config::{ConfigError, DistributionScheme, SimulationConfig};
use crate::core_types::AgentId;
use crate::decision::{AgentDecisionEngine, DecisionContext, SpendBreakdown};
use crate::enterprise::EnterpriseManager;
use crate::goods::GoodsCatalog;
use crate::income::IncomeDistributor;
use crate::ledger::{Ledger, LedgerError, Sector};
use crate::metrics::{CycleActivity, CycleMetrics};
use crate::population::{Estate, Population, ADULT_AGE, MAX_INITIAL_AGE};
use crate::regulator::{CycleFlows, Regulator, SensorInputs};

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Commitment(#[from] CommitmentError),
}

/// Share of the population holding the large share under Pareto 80/20.
const PARETO_TOP_SHARE: f64 = 0.2;
/// Share of wealth held by that top group.
const PARETO_TOP_WEALTH: f64 = 0.8;

// ─── IrisSimulation struct ───────────────────────────────────────────────────

/// The orchestrator. Owns every subsystem and the single random stream.
pub struct IrisSimulation {
    config: SimulationConfig,
    seed: u64,
    rng: ChaCha8Rng,
    cycle: u64,

    population: Population,
    ledger: Ledger,
    regulator: Regulator,
    income: IncomeDistributor,
    decisions: AgentDecisionEngine,
    enterprises: EnterpriseManager,
    registry: CommitmentRegistry,
    catalog: GoodsCatalog,

    last_metrics: Option<CycleMetrics>,
}

// ─── Construction ────────────────────────────────────────────────────────────

impl IrisSimulation {
    /// Build the first generation and book its wealth as material debt.
    ///
    /// Fails on an invalid configuration or if the ledger does not match
    /// the distributed wealth.
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let n = config.agents;
        let owner_count = ((n as f64 * config.enterprise_ratio).floor() as usize).min(n);
        let mut owners = vec![false; n];
        for i in index::sample(&mut rng, n, owner_count) {
            owners[i] = true;
        }

        let mut population = Population::new();
        for has_enterprise in owners {
            let age = rng.gen_range(ADULT_AGE..=MAX_INITIAL_AGE);
            population.spawn(age, has_enterprise, &mut rng)?;
        }

        let balances = initial_balances(config.distribution, n, config.total_wealth, &mut rng);
        for (agent, balance) in population.agents_mut().iter_mut().zip(balances) {
            agent.durable_balance = balance;
        }

        let mut ledger = Ledger::new();
        ledger.adjust(config.total_wealth, Sector::Material);
        ledger.verify_equilibrium(population.active_wealth())?;

        let catalog = GoodsCatalog::generate(config.total_wealth);

        info!(
            seed,
            agents = n,
            enterprises = population.active_enterprise_count(),
            wealth = config.total_wealth,
            distribution = %config.distribution,
            catalog_items = catalog.item_count(),
            "IRIS economy initialized"
        );

        Ok(Self {
            regulator: Regulator::with_params(config.regulator),
            decisions: AgentDecisionEngine::new(config.decisions),
            enterprises: EnterpriseManager::new(config.enterprise),
            income: IncomeDistributor::new(),
            registry: CommitmentRegistry::new(),
            catalog,
            population,
            ledger,
            config,
            seed,
            rng,
            cycle: 0,
            last_metrics: None,
        })
    }
}

/// Initial durable balances for `n` agents.
///
/// Pareto 80/20 falls back to an equal split when the top group would be
/// empty or would cover everyone.
fn initial_balances<R: Rng + ?Sized>(
    scheme: DistributionScheme,
    n: usize,
    total: f64,
    rng: &mut R,
) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let equal = total / n as f64;
    let top = (n as f64 * PARETO_TOP_SHARE).floor() as usize;
    if scheme == DistributionScheme::Equal || top == 0 || top == n {
        return vec![equal; n];
    }

    let rich_share = total * PARETO_TOP_WEALTH / top as f64;
    let poor_share = total * (1.0 - PARETO_TOP_WEALTH) / (n - top) as f64;
    let mut balances = vec![poor_share; n];
    for i in index::sample(rng, n, top) {
        balances[i] = rich_share;
    }
    balances
}

// ─── Cycle ───────────────────────────────────────────────────────────────────

impl IrisSimulation {
    /// Advance one month and return its metrics.
    pub fn step(&mut self) -> Result<CycleMetrics, SimulationError> {
        let cycle = self.cycle;
        if cycle % 12 == 0 {
            self.population.advance_age();
        }

        // 1. Sense and regulate on start-of-cycle stocks
        let active_wealth = self.population.active_wealth();
        let state = self.regulator.regulate(&SensorInputs {
            ledger_total: self.ledger.total(),
            active_wealth,
            outstanding_commitments: self.registry.outstanding_value(&self.population),
        });

        let mut activity = CycleActivity {
            active_wealth,
            ..CycleActivity::default()
        };

        // 2. Universal income
        let base = self.income.compute_base(
            active_wealth,
            self.population.living_count(),
            self.ledger.total(),
            state.liquidity,
            self.config.activity_flux,
        );
        activity.income_base = base;
        activity.income_distributed =
            self.income
                .distribute(self.population.agents_mut(), base, state.production);

        // 3. Agent decisions
        let (spend, effort) = self.run_decisions(cycle, state.liquidity);
        activity.staking_spent = spend.staking;
        activity.investment_spent = spend.investment;
        activity.consumption_spent = spend.consumption;
        activity.effort = effort;

        // 4. Enterprise management
        let managed = self.enterprises.manage(&mut self.population, cycle, &mut self.rng);
        activity.salaries_paid = managed.salaries_paid;
        activity.value_burned = managed.value_burned;
        activity.capital_raised = managed.capital_raised;

        // 5. Commitments and recycled goods
        let settled = self.registry.settle(&mut self.population, cycle, &mut self.ledger);
        activity.contract_payments = settled.payments;
        activity.missed_payments = settled.missed;
        activity.contracts_completed = settled.completed;
        activity.contracts_cancelled = settled.cancelled;
        let handed_out = self.registry.redistribute_recycled(
            &mut self.population,
            &mut self.ledger,
            self.config.recycled_per_cycle,
            &mut self.rng,
        );
        activity.goods_redistributed = handed_out.count;
        self.population.age_certificates();

        // 6. Spendable value is perishable
        activity.spendable_circulation = self.population.spendable_circulation();
        activity.spendable_expired = self.population.expire_spendable();

        // 7. Debt amortization
        self.ledger.decay();

        // 8. Demographics
        let estates = self.population.draw_deaths(&mut self.rng);
        activity.deaths = estates.len();
        for estate in estates {
            self.settle_estate(estate)?;
        }
        activity.births = self.population.spawn_births(
            activity.deaths,
            self.config.enterprise_ratio,
            &mut self.rng,
        )?;
        self.catalog
            .recalibrate(self.population.active_wealth(), self.config.total_wealth);

        // 9. Hand the flows back to the regulator for next cycle's sensors
        self.regulator.record_cycle(
            active_wealth,
            CycleFlows {
                spendable_burn: spend.total(),
                effort,
                staking_commitment: spend.staking,
                income_distributed: activity.income_distributed,
            },
        );

        let metrics = CycleMetrics::capture(
            cycle,
            &self.population,
            &self.ledger,
            &self.regulator,
            &self.registry,
            &activity,
        );
        debug!(
            cycle,
            ratio = metrics.debt_ratio,
            liquidity = metrics.liquidity,
            production = metrics.production,
            population = metrics.population,
            gini = metrics.gini,
            "Cycle complete"
        );
        if settled.missed > 0 {
            debug!(cycle, missed = settled.missed, stalled = settled.stalled, "Stalled commitments");
        }

        self.cycle += 1;
        self.last_metrics = Some(metrics.clone());
        Ok(metrics)
    }

    /// Run the configured number of cycles.
    pub fn run(&mut self) -> Result<Vec<CycleMetrics>, SimulationError> {
        self.run_batch(self.config.cycles)
    }

    /// Run `cycles` more cycles, logging a summary once per simulated year.
    pub fn run_batch(&mut self, cycles: u64) -> Result<Vec<CycleMetrics>, SimulationError> {
        let mut series = Vec::with_capacity(cycles as usize);
        for _ in 0..cycles {
            let m = self.step()?;
            if (m.cycle + 1) % 12 == 0 {
                info!(
                    year = m.year + 1,
                    ratio = m.debt_ratio,
                    liquidity = m.liquidity,
                    production = m.production,
                    population = m.population,
                    gini = m.gini,
                    "Year complete"
                );
            }
            if m.population == 0 {
                warn!(cycle = m.cycle, "Population extinct; stopping early");
                series.push(m);
                break;
            }
            series.push(m);
        }
        Ok(series)
    }

    /// Kill an agent outside the mortality draw, routing its estate.
    ///
    /// Returns `false` when the agent is unknown or already dead.
    pub fn kill_agent(&mut self, id: AgentId) -> Result<bool, SimulationError> {
        match self.population.kill(id) {
            Some(estate) => {
                info!(agent = %id, durable = estate.durable_balance, goods = estate.goods.len(), "Agent removed");
                self.settle_estate(estate)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn run_decisions(&mut self, cycle: u64, liquidity: f64) -> (SpendBreakdown, f64) {
        let owners = self.population.active_owners();
        let (agents, enterprises) = self.population.split_mut();
        let mut ctx = DecisionContext {
            cycle,
            liquidity,
            enterprises,
            active_owners: &owners,
            registry: &mut self.registry,
            ledger: &mut self.ledger,
            catalog: &mut self.catalog,
            rng: &mut self.rng,
        };

        let mut total = SpendBreakdown::default();
        let mut effort = 0.0;
        for agent in agents.iter_mut().filter(|a| a.alive) {
            let spend = self.decisions.decide(agent, &mut ctx);
            effort += self.decisions.effort(agent, &spend);
            total += spend;
        }
        (total, effort)
    }

    /// High-tier goods return to the commitment stock, the rest is recycled;
    /// the durable balance becomes regulator debt.
    fn settle_estate(&mut self, estate: Estate) -> Result<(), SimulationError> {
        for good in estate.goods {
            self.registry.absorb_estate_good(good, &mut self.ledger)?;
        }
        if estate.durable_balance != 0.0 {
            self.ledger.adjust(estate.durable_balance, Sector::Regulator);
        }
        Ok(())
    }
}

// ─── Accessors ───────────────────────────────────────────────────────────────

impl IrisSimulation {
    pub fn config(&self) -> &SimulationConfig { &self.config }
    /// Seed actually used, including one drawn from entropy.
    pub fn seed(&self) -> u64 { self.seed }
    /// Number of completed cycles.
    pub fn cycle(&self) -> u64 { self.cycle }
    pub fn population(&self) -> &Population { &self.population }
    pub fn ledger(&self) -> &Ledger { &self.ledger }
    pub fn regulator(&self) -> &Regulator { &self.regulator }
    pub fn income(&self) -> &IncomeDistributor { &self.income }
    pub fn registry(&self) -> &CommitmentRegistry { &self.registry }
    pub fn catalog(&self) -> &GoodsCatalog { &self.catalog }
    pub fn last_metrics(&self) -> Option<&CycleMetrics> { self.last_metrics.as_ref() }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn config(agents: usize, wealth: f64, scheme: DistributionScheme) -> SimulationConfig {
        SimulationConfig {
            agents,
            total_wealth: wealth,
            distribution: scheme,
            seed: Some(42),
            cycles: 24,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn pareto_balances_split_eighty_twenty() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let b = initial_balances(DistributionScheme::Pareto8020, 10, 1000.0, &mut rng);
        let rich: Vec<f64> = b.iter().copied().filter(|x| *x > 100.0).collect();
        assert_eq!(rich.len(), 2);
        assert!((rich.iter().sum::<f64>() - 800.0).abs() < 1e-9);
        assert!((b.iter().sum::<f64>() - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn pareto_degenerates_to_equal_for_tiny_populations() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let b = initial_balances(DistributionScheme::Pareto8020, 3, 90.0, &mut rng);
        assert_eq!(b, vec![30.0; 3]);
    }

    #[test]
    fn construction_books_wealth_as_material_debt() {
        let sim = IrisSimulation::new(config(500, 10_000.0, DistributionScheme::Equal))
            .expect("test: valid config");
        assert_eq!(sim.population().living_count(), 500);
        for agent in sim.population().agents() {
            assert!((agent.durable_balance - 20.0).abs() < 1e-9);
            assert!((ADULT_AGE..=MAX_INITIAL_AGE).contains(&agent.age));
        }
        assert!((sim.ledger().sector(Sector::Material) - 10_000.0).abs() < 1e-6);
        assert!((sim.ledger().total() - sim.population().active_wealth()).abs() < 0.01);
        assert_eq!(sim.population().enterprises().count(), 150);
        assert_eq!(sim.seed(), 42);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err = IrisSimulation::new(config(0, 100.0, DistributionScheme::Equal));
        assert!(matches!(err, Err(SimulationError::Config(_))));
    }

    #[test]
    fn step_advances_cycle_and_reports() {
        let mut sim = IrisSimulation::new(config(200, 5_000.0, DistributionScheme::Pareto8020))
            .expect("test: valid config");
        let m = sim.step().expect("test: step");
        assert_eq!(m.cycle, 0);
        assert_eq!(sim.cycle(), 1);
        assert!(m.income_distributed > 0.0);
        assert_eq!(sim.population().spendable_circulation(), 0.0);
        assert!(sim.last_metrics().is_some());
    }

    #[test]
    fn kill_agent_routes_estate() {
        let mut sim = IrisSimulation::new(config(50, 1_000.0, DistributionScheme::Equal))
            .expect("test: valid config");
        let before = sim.ledger().sector(Sector::Regulator);
        assert!(sim.kill_agent(AgentId(3)).expect("test: kill"));
        assert!(!sim.kill_agent(AgentId(3)).expect("test: second kill"));
        assert!(!sim.kill_agent(AgentId(999)).expect("test: unknown agent"));
        let after = sim.ledger().sector(Sector::Regulator);
        assert!((after - before - 20.0).abs() < 1e-6);
        assert!(!sim.population().is_alive(AgentId(3)));
    }

    #[test]
    fn run_uses_configured_cycle_count() {
        let mut sim = IrisSimulation::new(config(100, 2_000.0, DistributionScheme::Equal))
            .expect("test: valid config");
        let series = sim.run().expect("test: run");
        assert_eq!(series.len(), 24);
        assert_eq!(series.last().map(|m| m.year), Some(1));
    }
}
