// Copyright © 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Goods, star tiers and the catalog that mints them.
//!
//! The catalog is sized from the initial wealth with a Fibonacci split: many
//! cheap 1★ items, fewer 2★ and 3★ items, and the bulk of value concentrated
//! in the high tiers that only circulate through staking contracts.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core_types::{GoodId, IdSequence};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Construction errors for goods.
#[derive(Debug, thiserror::Error)]
pub enum GoodError {
    #[error("star tier must be between 1 and 5, got {0}")]
    InvalidStarTier(u8),

    #[error("good value must be finite and non-negative, got {0}")]
    InvalidValue(f64),
}

// ---------------------------------------------------------------------------
// StarTier / GoodCategory
// ---------------------------------------------------------------------------

/// Rarity tier of a good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum StarTier {
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
}

impl StarTier {
    pub const ALL: [StarTier; 5] = [
        StarTier::One,
        StarTier::Two,
        StarTier::Three,
        StarTier::Four,
        StarTier::Five,
    ];

    pub fn stars(self) -> u8 {
        self as u8
    }

    pub fn category(self) -> GoodCategory {
        match self {
            StarTier::One => GoodCategory::Consumable,
            StarTier::Two => GoodCategory::Durable,
            _ => GoodCategory::Patrimonial,
        }
    }

    /// 4★ and 5★ goods only move through commitment contracts.
    pub fn is_commitment_tier(self) -> bool {
        self >= StarTier::Four
    }

    /// Commitment duration in cycles: 12 per star.
    pub fn commitment_duration(self) -> u32 {
        12 * u32::from(self.stars())
    }

    /// Unit value used when the catalog holds no item of this tier.
    pub fn fallback_value(self) -> f64 {
        match self {
            StarTier::One => 10.0,
            StarTier::Two => 50.0,
            StarTier::Three => 200.0,
            StarTier::Four => 1000.0,
            StarTier::Five => 5000.0,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            StarTier::One => "1★ consumable",
            StarTier::Two => "2★ durable",
            StarTier::Three => "3★ patrimonial",
            StarTier::Four => "4★ patrimonial (commitment)",
            StarTier::Five => "5★ patrimonial (commitment)",
        }
    }
}

impl TryFrom<u8> for StarTier {
    type Error = GoodError;

    fn try_from(stars: u8) -> Result<Self, Self::Error> {
        match stars {
            1 => Ok(StarTier::One),
            2 => Ok(StarTier::Two),
            3 => Ok(StarTier::Three),
            4 => Ok(StarTier::Four),
            5 => Ok(StarTier::Five),
            other => Err(GoodError::InvalidStarTier(other)),
        }
    }
}

impl From<StarTier> for u8 {
    fn from(tier: StarTier) -> Self {
        tier.stars()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoodCategory {
    Consumable,
    Durable,
    Patrimonial,
}

// ---------------------------------------------------------------------------
// Good
// ---------------------------------------------------------------------------

/// A unit of durable value held by an agent or a stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Good {
    pub id: GoodId,
    tier: StarTier,
    /// Current monetary value, rescaled by catalog recalibration.
    pub value: f64,
    /// Value at creation; recalibration always scales from here.
    initial_value: f64,
    pub active: bool,
}

impl Good {
    pub fn new(id: GoodId, tier: StarTier, value: f64) -> Result<Self, GoodError> {
        if !value.is_finite() || value < 0.0 {
            return Err(GoodError::InvalidValue(value));
        }
        Ok(Self {
            id,
            tier,
            value,
            initial_value: value,
            active: true,
        })
    }

    pub fn tier(&self) -> StarTier {
        self.tier
    }

    pub fn category(&self) -> GoodCategory {
        self.tier.category()
    }

    pub fn initial_value(&self) -> f64 {
        self.initial_value
    }

    /// Set the value to `initial_value * factor`.
    pub fn rescale(&mut self, factor: f64) {
        self.value = self.initial_value * factor;
    }
}

// ---------------------------------------------------------------------------
// Casino drop table
// ---------------------------------------------------------------------------

/// Probability of drawing a 1★, 2★ or 3★ good, by enterprise level 1-5.
pub const DROP_TABLE: [[f64; 3]; 5] = [
    [0.70, 0.25, 0.05],
    [0.50, 0.35, 0.15],
    [0.30, 0.45, 0.25],
    [0.20, 0.40, 0.40],
    [0.10, 0.35, 0.55],
];

/// Draw the tier of a casino reward for an enterprise of `level`.
///
/// Levels outside 1-5 are clamped into range.
pub fn draw_casino_tier<R: Rng + ?Sized>(level: u8, rng: &mut R) -> StarTier {
    let row = DROP_TABLE[usize::from(level.clamp(1, 5) - 1)];
    let roll: f64 = rng.gen();
    if roll < row[0] {
        StarTier::One
    } else if roll < row[0] + row[1] {
        StarTier::Two
    } else {
        StarTier::Three
    }
}

// ---------------------------------------------------------------------------
// GoodsCatalog
// ---------------------------------------------------------------------------

/// Share of initial wealth carried by each tier (Fibonacci-derived).
const VALUE_SHARES: [f64; 5] = [0.05, 0.08, 0.13, 0.21, 0.53];

/// Share of catalog items in each circulating tier (1★-3★).
const QUANTITY_SHARES: [f64; 3] = [0.55, 0.34, 0.11];

/// Items generated per unit of initial wealth.
const ITEMS_PER_WEALTH: f64 = 0.5;

/// One circulating tier of the catalog. All items of a tier share a unit value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogTier {
    pub tier: StarTier,
    pub count: usize,
    pub initial_unit_value: f64,
    pub unit_value: f64,
}

/// Source of every good in the economy; owns the good id sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoodsCatalog {
    tiers: Vec<CatalogTier>,
    ids: IdSequence,
    factor: f64,
}

impl GoodsCatalog {
    /// Build the catalog for an economy seeded with `total_wealth`.
    pub fn generate(total_wealth: f64) -> Self {
        let base_items = (total_wealth.max(0.0) * ITEMS_PER_WEALTH).floor();
        let tiers = [StarTier::One, StarTier::Two, StarTier::Three]
            .into_iter()
            .enumerate()
            .filter_map(|(i, tier)| {
                let count = (base_items * QUANTITY_SHARES[i]).floor() as usize;
                if count == 0 {
                    return None;
                }
                let unit = total_wealth * VALUE_SHARES[i] / count as f64;
                Some(CatalogTier {
                    tier,
                    count,
                    initial_unit_value: unit,
                    unit_value: unit,
                })
            })
            .collect();
        Self {
            tiers,
            ids: IdSequence::new(),
            factor: 1.0,
        }
    }

    /// Current unit value for a tier, falling back to the fixed table.
    pub fn unit_value(&self, tier: StarTier) -> f64 {
        self.tiers
            .iter()
            .find(|t| t.tier == tier)
            .map(|t| t.unit_value)
            .unwrap_or_else(|| tier.fallback_value())
    }

    /// Mint a new good of `tier` at the current catalog value.
    pub fn mint(&mut self, tier: StarTier) -> Good {
        let value = self.unit_value(tier);
        self.mint_with_value(tier, value)
    }

    /// Mint a good with an explicit value. Invalid values are floored at zero.
    pub fn mint_with_value(&mut self, tier: StarTier, value: f64) -> Good {
        let value = if value.is_finite() { value.max(0.0) } else { 0.0 };
        Good {
            id: GoodId(self.ids.next_id()),
            tier,
            value,
            initial_value: value,
            active: true,
        }
    }

    /// Rescale every tier to follow active wealth: `initial x V_ON / V_initial`.
    pub fn recalibrate(&mut self, active_wealth: f64, initial_wealth: f64) {
        if initial_wealth <= 0.0 {
            return;
        }
        self.factor = (active_wealth / initial_wealth).max(0.0);
        for tier in self.tiers.iter_mut() {
            tier.unit_value = tier.initial_unit_value * self.factor;
        }
    }

    /// Last recalibration factor (1.0 before the first call).
    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub fn tiers(&self) -> &[CatalogTier] {
        &self.tiers
    }

    /// Total number of catalog items across circulating tiers.
    pub fn item_count(&self) -> usize {
        self.tiers.iter().map(|t| t.count).sum()
    }

    /// Number of goods minted so far.
    pub fn minted(&self) -> u64 {
        self.ids.issued()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
