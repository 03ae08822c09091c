// Copyright © 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Simulation configuration.
//!
//! Every field has a default, so a JSON file only needs to name what it
//! overrides. Parameter blocks of the individual subsystems nest under their
//! own keys (`regulator`, `decisions`, `enterprise`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::commitment::DEFAULT_REDISTRIBUTION_PER_CYCLE;
use crate::decision::DecisionParams;
use crate::enterprise::EnterpriseParams;
use crate::regulator::RegulatorParams;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// DistributionScheme
// ---------------------------------------------------------------------------

/// How the initial wealth is spread across the first generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistributionScheme {
    /// A random 20% of agents share 80% of the wealth.
    #[default]
    #[serde(rename = "pareto_80_20")]
    Pareto8020,
    #[serde(rename = "equal")]
    Equal,
}

impl DistributionScheme {
    pub fn name(self) -> &'static str {
        match self {
            DistributionScheme::Pareto8020 => "pareto_80_20",
            DistributionScheme::Equal => "equal",
        }
    }
}

impl fmt::Display for DistributionScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DistributionScheme {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pareto_80_20" | "pareto" => Ok(DistributionScheme::Pareto8020),
            "equal" | "uniform" => Ok(DistributionScheme::Equal),
            other => Err(ConfigError::Invalid(format!(
                "unknown distribution scheme '{}'",
                other
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// SimulationConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Size of the first generation.
    pub agents: usize,
    /// Durable value distributed at initialization.
    pub total_wealth: f64,
    /// Cycles (months) run by [`IrisSimulation::run`](crate::IrisSimulation::run).
    pub cycles: u64,
    /// Probability that an agent owns an enterprise.
    pub enterprise_ratio: f64,
    pub distribution: DistributionScheme,
    /// Random seed; drawn from entropy when absent.
    pub seed: Option<u64>,
    /// Exogenous activity multiplier on the income base.
    pub activity_flux: f64,
    /// Recycled goods handed back to the poorest agents each cycle.
    pub recycled_per_cycle: usize,
    pub regulator: RegulatorParams,
    pub decisions: DecisionParams,
    pub enterprise: EnterpriseParams,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            agents: 4069,
            total_wealth: 23_530.0,
            cycles: 120,
            enterprise_ratio: 0.3,
            distribution: DistributionScheme::default(),
            seed: None,
            activity_flux: 1.0,
            recycled_per_cycle: DEFAULT_REDISTRIBUTION_PER_CYCLE,
            regulator: RegulatorParams::default(),
            decisions: DecisionParams::default(),
            enterprise: EnterpriseParams::default(),
        }
    }
}

impl SimulationConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agents == 0 {
            return Err(ConfigError::Invalid("agent count must be positive".into()));
        }
        if !self.total_wealth.is_finite() || self.total_wealth <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "total wealth must be finite and positive, got {}",
                self.total_wealth
            )));
        }
        if !(0.0..=1.0).contains(&self.enterprise_ratio) {
            return Err(ConfigError::Invalid(format!(
                "enterprise ratio must lie in [0, 1], got {}",
                self.enterprise_ratio
            )));
        }
        if !self.activity_flux.is_finite() || self.activity_flux < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "activity flux must be finite and non-negative, got {}",
                self.activity_flux
            )));
        }
        let bounds = &self.regulator.bounds;
        if !(bounds.min > 0.0 && bounds.min <= 1.0 && bounds.max >= 1.0 && bounds.max_step > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "coefficient bounds must bracket 1.0 with a positive step, got [{}, {}] step {}",
                bounds.min, bounds.max, bounds.max_step
            )));
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
    fn defaults_are_valid() {
        let c = SimulationConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.agents, 4069);
        assert_eq!(c.distribution, DistributionScheme::Pareto8020);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c = SimulationConfig::from_json(
            r#"{"agents": 500, "distribution": "equal", "seed": 7, "regulator": {"velocity_target": 0.3}}"#,
        )
        .expect("test: parse");
        assert_eq!(c.agents, 500);
        assert_eq!(c.distribution, DistributionScheme::Equal);
        assert_eq!(c.seed, Some(7));
        assert_eq!(c.regulator.velocity_target, 0.3);
        assert_eq!(c.regulator.engagement_target, 0.35);
        assert_eq!(c.cycles, 120);
    }

    #[test]
    fn rejects_invalid_values() {
        for text in [
            r#"{"agents": 0}"#,
            r#"{"total_wealth": -1.0}"#,
            r#"{"enterprise_ratio": 1.5}"#,
            r#"{"activity_flux": -0.1}"#,
            r#"{"regulator": {"bounds": {"min": 1.2}}}"#,
        ] {
            assert!(
                matches!(SimulationConfig::from_json(text), Err(ConfigError::Invalid(_))),
                "{} should be rejected",
                text
            );
        }
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            SimulationConfig::from_json("{agents: }"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn scheme_names_round_trip() {
        for scheme in [DistributionScheme::Pareto8020, DistributionScheme::Equal] {
            assert_eq!(scheme.to_string().parse::<DistributionScheme>().ok(), Some(scheme));
        }
        assert!("lognormal".parse::<DistributionScheme>().is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = SimulationConfig::from_file(Path::new("/nonexistent/iris.json"));
        assert!(matches!(err, Err(ConfigError::Io(_))));
    }
}
