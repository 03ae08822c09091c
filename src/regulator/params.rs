// Copyright © 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Regulator tuning: sensor targets, feedback gains and coefficient bounds.
//!
//! Every block implements `Default` with the reference calibration and
//! deserializes with `#[serde(default)]`, so a configuration file only needs
//! to name the values it overrides.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RegulationState
// ---------------------------------------------------------------------------

/// The two control coefficients produced each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegulationState {
    /// kappa: durable-to-spendable conversion rate.
    pub liquidity: f64,
    /// eta: multiplier on distributed income.
    pub production: f64,
}

impl Default for RegulationState {
    fn default() -> Self {
        Self {
            liquidity: 1.0,
            production: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// FeedbackGains
// ---------------------------------------------------------------------------

/// Weights of one coefficient's feedback law.
///
/// For production: alpha on thermometric error, beta on velocity error,
/// gamma on engagement error. For liquidity: alpha on velocity error, beta on
/// engagement error, gamma on thermometric error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeedbackGains {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl FeedbackGains {
    pub fn production() -> Self {
        Self { alpha: 0.3, beta: 0.4, gamma: 0.2 }
    }

    pub fn liquidity() -> Self {
        Self { alpha: 0.4, beta: 0.3, gamma: 0.2 }
    }
}

// ---------------------------------------------------------------------------
// CoefficientBounds
// ---------------------------------------------------------------------------

/// Hard limits on coefficient values and per-cycle movement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoefficientBounds {
    pub min: f64,
    pub max: f64,
    /// Maximum |delta| applied in one cycle.
    pub max_step: f64,
}

impl Default for CoefficientBounds {
    fn default() -> Self {
        Self {
            min: 0.5,
            max: 2.0,
            max_step: 0.15,
        }
    }
}

impl CoefficientBounds {
    /// Apply a raw delta to `current`, clamping the step then the result.
    pub fn step(&self, current: f64, delta: f64) -> f64 {
        let delta = delta.clamp(-self.max_step, self.max_step);
        (current + delta).clamp(self.min, self.max)
    }
}

// ---------------------------------------------------------------------------
// RegulatorParams
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegulatorParams {
    /// Target effective velocity (nu_target).
    pub velocity_target: f64,
    /// Target engagement rate (tau_target).
    pub engagement_target: f64,
    /// Velocity reported when no previous active wealth exists.
    pub default_velocity: f64,
    pub production_gains: FeedbackGains,
    pub liquidity_gains: FeedbackGains,
    pub bounds: CoefficientBounds,
}

impl Default for RegulatorParams {
    fn default() -> Self {
        Self {
            velocity_target: 0.20,
            engagement_target: 0.35,
            default_velocity: 0.20,
            production_gains: FeedbackGains::production(),
            liquidity_gains: FeedbackGains::liquidity(),
            bounds: CoefficientBounds::default(),
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_neutral() {
        let s = RegulationState::default();
        assert_eq!(s.liquidity, 1.0);
        assert_eq!(s.production, 1.0);
    }

    #[test]
    fn step_clamps_delta_then_value() {
        let b = CoefficientBounds::default();
        let close = |x: f64, y: f64| (x - y).abs() < 1e-12;
        assert!(close(b.step(1.0, 0.5), 1.15));
        assert!(close(b.step(1.0, -0.5), 0.85));
        assert_eq!(b.step(1.95, 0.1), 2.0);
        assert_eq!(b.step(0.55, -0.1), 0.5);
        assert!(close(b.step(1.0, 0.05), 1.05));
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let p: RegulatorParams =
            serde_json::from_str(r#"{"velocity_target": 0.25}"#).expect("test: parse");
        assert_eq!(p.velocity_target, 0.25);
        assert_eq!(p.engagement_target, 0.35);
        assert_eq!(p.production_gains, FeedbackGains::production());
        assert_eq!(p.bounds.max_step, 0.15);
    }
}
