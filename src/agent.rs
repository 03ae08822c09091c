// Copyright © 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Economic actors: agents, the enterprises they own, and the certificates
//! they receive for investing.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core_types::{AgentId, CertificateId, ContractId, EnterpriseId};
use crate::goods::Good;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Validation errors raised while constructing agents and enterprises.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("aptitudes must sum to 100 (±0.1), got {0}")]
    AptitudeSum(f64),

    #[error("aptitude '{name}' must be finite and non-negative, got {value}")]
    InvalidAptitude { name: &'static str, value: f64 },

    #[error("enterprise level must be between 1 and 5, got {0}")]
    InvalidLevel(u8),

    #[error("trust score must be between 0 and 100, got {0}")]
    InvalidTrust(f64),
}

// -- Constants ---------------------------------------------------------------

pub const APTITUDE_TOTAL: f64 = 100.0;
pub const APTITUDE_TOLERANCE: f64 = 0.1;

pub const MIN_PRODUCTIVITY: f64 = 0.5;
pub const MAX_PRODUCTIVITY: f64 = 1.5;

pub const MAX_ENTERPRISE_LEVEL: u8 = 5;

// ---------------------------------------------------------------------------
// Aptitudes
// ---------------------------------------------------------------------------

/// Five behavioural weights summing to 100.
///
/// Fields are private so the sum invariant holds for every value in the
/// system; build through [`Aptitudes::new`] or [`Aptitudes::random`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Aptitudes {
    growth: f64,
    trust: f64,
    consumption: f64,
    long_term: f64,
    savings: f64,
}

impl Aptitudes {
    pub fn new(
        growth: f64,
        trust: f64,
        consumption: f64,
        long_term: f64,
        savings: f64,
    ) -> Result<Self, AgentError> {
        let named = [
            ("growth", growth),
            ("trust", trust),
            ("consumption", consumption),
            ("long_term", long_term),
            ("savings", savings),
        ];
        for (name, value) in named {
            if !value.is_finite() || value < 0.0 {
                return Err(AgentError::InvalidAptitude { name, value });
            }
        }
        let sum = growth + trust + consumption + long_term + savings;
        if (sum - APTITUDE_TOTAL).abs() > APTITUDE_TOLERANCE {
            return Err(AgentError::AptitudeSum(sum));
        }
        Ok(Self { growth, trust, consumption, long_term, savings })
    }

    /// Five uniform draws in [0, 100) normalized to sum to 100.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let raw: [f64; 5] = std::array::from_fn(|_| rng.gen_range(0.0..100.0));
        let sum: f64 = raw.iter().sum();
        if sum <= 0.0 {
            let even = APTITUDE_TOTAL / 5.0;
            return Self {
                growth: even,
                trust: even,
                consumption: even,
                long_term: even,
                savings: even,
            };
        }
        let scale = APTITUDE_TOTAL / sum;
        Self {
            growth: raw[0] * scale,
            trust: raw[1] * scale,
            consumption: raw[2] * scale,
            long_term: raw[3] * scale,
            savings: raw[4] * scale,
        }
    }

    /// Drive to found and grow enterprises.
    pub fn growth(&self) -> f64 { self.growth }
    /// Credibility when raising funds; copied into an owned enterprise.
    pub fn trust(&self) -> f64 { self.trust }
    pub fn consumption(&self) -> f64 { self.consumption }
    /// Appetite for staking commitments.
    pub fn long_term(&self) -> f64 { self.long_term }
    /// Appetite for investing in enterprises.
    pub fn savings(&self) -> f64 { self.savings }

    pub fn sum(&self) -> f64 {
        self.growth + self.trust + self.consumption + self.long_term + self.savings
    }

    /// Productivity coefficient, clamped to [0.5, 1.5].
    pub fn productivity(&self) -> f64 {
        (0.7 + self.long_term / 200.0 + self.growth / 200.0 - self.consumption / 300.0)
            .clamp(MIN_PRODUCTIVITY, MAX_PRODUCTIVITY)
    }
}

// ---------------------------------------------------------------------------
// FinancialCertificate
// ---------------------------------------------------------------------------

/// Receipt for an investment converted into enterprise durable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialCertificate {
    pub id: CertificateId,
    pub enterprise: EnterpriseId,
    /// Spendable balance paid by the investor.
    pub amount_spent: f64,
    /// Durable value credited to the enterprise.
    pub value_injected: f64,
    pub issued_cycle: u64,
    pub remaining_cycles: u32,
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Agent {
    pub id: AgentId,
    /// Age in years.
    pub age: u32,
    aptitudes: Aptitudes,
    productivity: f64,
    /// Durable value V.
    pub durable_balance: f64,
    /// Spendable value U, zeroed at the end of every cycle.
    pub spendable_balance: f64,
    pub goods: Vec<Good>,
    pub certificates: Vec<FinancialCertificate>,
    /// Active commitment contracts.
    pub contracts: Vec<ContractId>,
    pub alive: bool,
}

impl Agent {
    pub fn new(id: AgentId, age: u32, aptitudes: Aptitudes) -> Self {
        Self {
            id,
            age,
            productivity: aptitudes.productivity(),
            aptitudes,
            durable_balance: 0.0,
            spendable_balance: 0.0,
            goods: Vec::new(),
            certificates: Vec::new(),
            contracts: Vec::new(),
            alive: true,
        }
    }

    pub fn aptitudes(&self) -> &Aptitudes {
        &self.aptitudes
    }

    pub fn productivity(&self) -> f64 {
        self.productivity
    }

    /// Current value of every owned good.
    pub fn goods_value(&self) -> f64 {
        self.goods.iter().map(|g| g.value).sum()
    }

    /// Durable balance plus owned goods.
    pub fn patrimony(&self) -> f64 {
        self.durable_balance + self.goods_value()
    }

    /// Debit `amount` from the spendable balance if it is covered.
    ///
    /// Returns `false` and leaves the balance untouched otherwise.
    pub fn try_spend(&mut self, amount: f64) -> bool {
        if amount < 0.0 || self.spendable_balance < amount {
            return false;
        }
        self.spendable_balance -= amount;
        true
    }

    /// Zero the spendable balance, returning what was destroyed.
    pub fn expire_spendable(&mut self) -> f64 {
        std::mem::replace(&mut self.spendable_balance, 0.0)
    }

    /// Count down every certificate and drop the expired ones.
    pub fn age_certificates(&mut self) -> usize {
        for cert in self.certificates.iter_mut() {
            cert.remaining_cycles = cert.remaining_cycles.saturating_sub(1);
        }
        let before = self.certificates.len();
        self.certificates.retain(|c| c.remaining_cycles > 0);
        before - self.certificates.len()
    }
}

// ---------------------------------------------------------------------------
// Enterprise
// ---------------------------------------------------------------------------

/// A casino-style business owned by exactly one agent.
#[derive(Debug, Clone, Serialize)]
pub struct Enterprise {
    pub id: EnterpriseId,
    pub owner: AgentId,
    level: u8,
    trust: f64,
    pub durable_balance: f64,
    /// Number of paid casino entries.
    pub participants: u64,
}

impl Enterprise {
    pub fn new(id: EnterpriseId, owner: AgentId, level: u8, trust: f64) -> Result<Self, AgentError> {
        if !(1..=MAX_ENTERPRISE_LEVEL).contains(&level) {
            return Err(AgentError::InvalidLevel(level));
        }
        if !trust.is_finite() || !(0.0..=100.0).contains(&trust) {
            return Err(AgentError::InvalidTrust(trust));
        }
        Ok(Self {
            id,
            owner,
            level,
            trust,
            durable_balance: 0.0,
            participants: 0,
        })
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn trust(&self) -> f64 {
        self.trust
    }

    /// Raise the level by one, saturating at 5. Returns whether it changed.
    pub fn level_up(&mut self) -> bool {
        if self.level >= MAX_ENTERPRISE_LEVEL {
            return false;
        }
        self.level += 1;
        true
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

    fn balanced() -> Aptitudes {
        Aptitudes::new(20.0, 20.0, 20.0, 20.0, 20.0).expect("test: valid aptitudes")
    }

    #[test]
    fn aptitudes_validate_sum() {
        assert!(Aptitudes::new(20.0, 20.0, 20.0, 20.0, 20.05).is_ok());
        let err = Aptitudes::new(30.0, 20.0, 20.0, 20.0, 20.0).unwrap_err();
        assert!(matches!(err, AgentError::AptitudeSum(s) if (s - 110.0).abs() < 1e-9));
    }

    #[test]
    fn aptitudes_reject_negative_component() {
        let err = Aptitudes::new(-10.0, 30.0, 30.0, 30.0, 20.0).unwrap_err();
        assert!(matches!(err, AgentError::InvalidAptitude { name: "growth", .. }));
    }

    #[test]
    fn random_aptitudes_always_sum_to_hundred() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..1000 {
            let a = Aptitudes::random(&mut rng);
            assert!((a.sum() - 100.0).abs() <= APTITUDE_TOLERANCE, "sum {}", a.sum());
            assert!(a.growth() >= 0.0 && a.savings() >= 0.0);
        }
    }

    #[test]
    fn productivity_formula_and_clamp() {
        let p = balanced().productivity();
        let expected = 0.7 + 20.0 / 200.0 + 20.0 / 200.0 - 20.0 / 300.0;
        assert!((p - expected).abs() < 1e-12);

        let spender = Aptitudes::new(0.0, 0.0, 100.0, 0.0, 0.0).expect("test: valid");
        assert!((spender.productivity() - (0.7 - 100.0 / 300.0)).abs() < 1e-12);

        let builder = Aptitudes::new(50.0, 0.0, 0.0, 50.0, 0.0).expect("test: valid");
        assert!((builder.productivity() - 1.2).abs() < 1e-12);
        assert!(builder.productivity() <= MAX_PRODUCTIVITY);
    }

    #[test]
    fn try_spend_is_soft() {
        let mut agent = Agent::new(AgentId(0), 30, balanced());
        agent.spendable_balance = 10.0;
        assert!(!agent.try_spend(10.5));
        assert_eq!(agent.spendable_balance, 10.0);
        assert!(agent.try_spend(4.0));
        assert_eq!(agent.spendable_balance, 6.0);
        assert_eq!(agent.expire_spendable(), 6.0);
        assert_eq!(agent.spendable_balance, 0.0);
    }

    #[test]
    fn certificates_expire() {
        let mut agent = Agent::new(AgentId(0), 30, balanced());
        agent.certificates.push(FinancialCertificate {
            id: CertificateId(0),
            enterprise: EnterpriseId(0),
            amount_spent: 5.0,
            value_injected: 5.0,
            issued_cycle: 0,
            remaining_cycles: 2,
        });
        assert_eq!(agent.age_certificates(), 0);
        assert_eq!(agent.age_certificates(), 1);
        assert!(agent.certificates.is_empty());
    }

    #[test]
    fn enterprise_validation() {
        assert!(matches!(
            Enterprise::new(EnterpriseId(0), AgentId(0), 0, 50.0),
            Err(AgentError::InvalidLevel(0))
        ));
        assert!(matches!(
            Enterprise::new(EnterpriseId(0), AgentId(0), 2, 120.0),
            Err(AgentError::InvalidTrust(_))
        ));
        let mut e = Enterprise::new(EnterpriseId(0), AgentId(0), 4, 50.0).expect("test: valid");
        assert!(e.level_up());
        assert_eq!(e.level(), 5);
        assert!(!e.level_up(), "level saturates at 5");
    }
}
