// Copyright © 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Segmented debt ledger.
//!
//! Every unit of durable value in circulation is mirrored by a unit of debt
//! booked in one of five sectors. The thermometric ratio compares the two:
//!
//! ```text
//! ratio = D_total / V_ON        (target 1.0)
//! ```
//!
//! Sectors are adjusted only through signed [`Ledger::adjust`] calls and all
//! of them decay at the same monthly rate, which amortizes the debt of goods
//! over roughly eighty years.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::adapter::{from_decimal, sectors_to_f64, to_decimal};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised by ledger lookups and the initial equilibrium check.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("unknown debt sector '{0}' (expected material, services, contractual, engagement or regulator)")]
    UnknownSector(String),

    #[error("ledger out of equilibrium at initialization: wealth {wealth}, debt {debt}")]
    EquilibriumViolation { wealth: f64, debt: f64 },
}

// -- Constants ---------------------------------------------------------------

/// Monthly decay rate applied to every sector (1 / (80 years x 12)).
pub const DECAY_RATE: Decimal = dec!(0.00104166);

/// Maximum |wealth - debt| accepted when the ledger is seeded.
pub const EQUILIBRIUM_TOLERANCE: Decimal = dec!(0.01);

// ---------------------------------------------------------------------------
// Sector
// ---------------------------------------------------------------------------

/// The five debt sectors. The discriminant indexes the ledger's sector array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sector {
    /// Durable value created at genesis and held in goods.
    Material = 0,
    Services = 1,
    Contractual = 2,
    /// Outstanding value of staking commitments.
    Engagement = 3,
    /// Value parked in the recycling stock or recovered from estates.
    Regulator = 4,
}

impl Sector {
    pub const ALL: [Sector; 5] = [
        Sector::Material,
        Sector::Services,
        Sector::Contractual,
        Sector::Engagement,
        Sector::Regulator,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Sector::Material => "material",
            Sector::Services => "services",
            Sector::Contractual => "contractual",
            Sector::Engagement => "engagement",
            Sector::Regulator => "regulator",
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Sector {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "material" => Ok(Sector::Material),
            "services" => Ok(Sector::Services),
            "contractual" => Ok(Sector::Contractual),
            "engagement" => Ok(Sector::Engagement),
            "regulator" => Ok(Sector::Regulator),
            _ => Err(LedgerError::UnknownSector(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// SectorBreakdown
// ---------------------------------------------------------------------------

/// Per-sector snapshot in simulation units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SectorBreakdown {
    pub material: f64,
    pub services: f64,
    pub contractual: f64,
    pub engagement: f64,
    pub regulator: f64,
}

impl SectorBreakdown {
    pub fn total(&self) -> f64 {
        self.material + self.services + self.contractual + self.engagement + self.regulator
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Five signed debt accumulators with uniform monthly decay.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    sectors: [Decimal; 5],
}

impl Ledger {
    /// Empty ledger, all sectors at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a signed amount to one sector. Sectors have no lower bound.
    pub fn adjust(&mut self, amount: f64, sector: Sector) {
        self.sectors[sector.index()] += to_decimal(amount);
    }

    /// Adjust a sector addressed by name.
    pub fn adjust_named(&mut self, amount: f64, sector: &str) -> Result<(), LedgerError> {
        let sector = sector.parse::<Sector>()?;
        self.adjust(amount, sector);
        Ok(())
    }

    /// Current value of one sector.
    pub fn sector(&self, sector: Sector) -> f64 {
        from_decimal(self.sectors[sector.index()])
    }

    /// Sum of all five sectors.
    pub fn total(&self) -> f64 {
        from_decimal(self.total_exact())
    }

    fn total_exact(&self) -> Decimal {
        self.sectors.iter().copied().sum()
    }

    /// Thermometric ratio `D / V`, or 1.0 when there is no wealth to compare against.
    pub fn ratio(&self, circulating_wealth: f64) -> f64 {
        if circulating_wealth <= 0.0 {
            return 1.0;
        }
        self.total() / circulating_wealth
    }

    /// Apply one month of decay to every sector.
    ///
    /// Returns the aggregate amount removed across sectors (negative when
    /// the ledger total is negative).
    pub fn decay(&mut self) -> f64 {
        let before = self.total_exact();
        let keep = Decimal::ONE - DECAY_RATE;
        for value in self.sectors.iter_mut() {
            *value *= keep;
        }
        from_decimal(before - self.total_exact())
    }

    /// Snapshot of every sector.
    pub fn breakdown(&self) -> SectorBreakdown {
        let [material, services, contractual, engagement, regulator] = sectors_to_f64(&self.sectors);
        SectorBreakdown {
            material,
            services,
            contractual,
            engagement,
            regulator,
        }
    }

    /// Check that the ledger mirrors `wealth` within [`EQUILIBRIUM_TOLERANCE`].
    pub fn verify_equilibrium(&self, wealth: f64) -> Result<(), LedgerError> {
        let debt = self.total_exact();
        if (to_decimal(wealth) - debt).abs() >= EQUILIBRIUM_TOLERANCE {
            return Err(LedgerError::EquilibriumViolation {
                wealth,
                debt: from_decimal(debt),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjust_is_signed_per_sector() {
        let mut ledger = Ledger::new();
        ledger.adjust(100.0, Sector::Material);
        ledger.adjust(-30.0, Sector::Material);
        ledger.adjust(-5.0, Sector::Regulator);
        assert_eq!(ledger.sector(Sector::Material), 70.0);
        assert_eq!(ledger.sector(Sector::Regulator), -5.0);
        assert_eq!(ledger.total(), 65.0);
    }

    #[test]
    fn ratio_defaults_to_one_without_wealth() {
        let mut ledger = Ledger::new();
        ledger.adjust(50.0, Sector::Engagement);
        assert_eq!(ledger.ratio(0.0), 1.0);
        assert_eq!(ledger.ratio(-10.0), 1.0);
        assert_eq!(ledger.ratio(100.0), 0.5);
    }

    #[test]
    fn decay_removes_fraction_from_every_sector() {
        let mut ledger = Ledger::new();
        ledger.adjust(10000.0, Sector::Material);
        ledger.adjust(1000.0, Sector::Engagement);
        let removed = ledger.decay();
        let expected = 11000.0 * 0.00104166;
        assert!((removed - expected).abs() < 1e-9, "removed {} vs {}", removed, expected);
        assert!((ledger.sector(Sector::Material) - 10000.0 * (1.0 - 0.00104166)).abs() < 1e-9);
        assert!((ledger.sector(Sector::Engagement) - 1000.0 * (1.0 - 0.00104166)).abs() < 1e-9);
    }

    #[test]
    fn decay_of_empty_ledger_is_zero() {
        let mut ledger = Ledger::new();
        assert_eq!(ledger.decay(), 0.0);
    }

    #[test]
    fn named_adjustment_rejects_unknown_sector() {
        let mut ledger = Ledger::new();
        ledger.adjust_named(12.0, "services").expect("test: known sector");
        assert_eq!(ledger.sector(Sector::Services), 12.0);

        let err = ledger.adjust_named(1.0, "speculative").unwrap_err();
        assert!(matches!(err, LedgerError::UnknownSector(ref s) if s == "speculative"));
        assert_eq!(ledger.total(), 12.0, "failed adjustment must not mutate");
    }

    #[test]
    fn sector_parsing_ignores_case_and_whitespace() {
        assert_eq!("Material".parse::<Sector>().expect("test: parse"), Sector::Material);
        assert_eq!(" regulator ".parse::<Sector>().expect("test: parse"), Sector::Regulator);
        assert!("".parse::<Sector>().is_err());
    }

    #[test]
    fn breakdown_matches_total() {
        let mut ledger = Ledger::new();
        for (i, sector) in Sector::ALL.iter().enumerate() {
            ledger.adjust((i + 1) as f64 * 10.0, *sector);
        }
        let b = ledger.breakdown();
        assert_eq!(b.material, 10.0);
        assert_eq!(b.regulator, 50.0);
        assert!((b.total() - ledger.total()).abs() < 1e-12);
    }

    #[test]
    fn equilibrium_tolerance() {
        let mut ledger = Ledger::new();
        ledger.adjust(10000.0, Sector::Material);
        assert!(ledger.verify_equilibrium(10000.0).is_ok());
        assert!(ledger.verify_equilibrium(10000.005).is_ok());
        let err = ledger.verify_equilibrium(10000.5).unwrap_err();
        assert!(matches!(err, LedgerError::EquilibriumViolation { .. }));
    }
}
