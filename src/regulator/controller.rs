// Copyright © 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Regulator -- the feedback loop that keeps debt and wealth in balance.
//!
//! Consumes [`SensorInputs`] once per cycle and produces a new
//! [`RegulationState`]. Velocity and engagement are measured on the flows of
//! the *previous* cycle, which the orchestrator hands back through
//! [`Regulator::record_cycle`] once a cycle is complete.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::params::*;

/// Stock measurements taken at the start of a cycle.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SensorInputs {
    /// Ledger total D.
    pub ledger_total: f64,
    /// V_ON: durable value of living agents and active enterprises.
    pub active_wealth: f64,
    /// Outstanding value of commitment contracts held by living agents.
    pub outstanding_commitments: f64,
}

/// Flows accumulated over one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleFlows {
    /// Spendable value spent by agents on staking, investment and consumption.
    pub spendable_burn: f64,
    /// Effort proxy summed over agents.
    pub effort: f64,
    /// Spendable committed to newly opened staking contracts.
    pub staking_commitment: f64,
    /// Total universal income credited.
    pub income_distributed: f64,
}

/// The four sensor values driving the feedback laws.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReadings {
    /// r = D / V_ON.
    pub thermometric_ratio: f64,
    /// r_ic = outstanding commitments / V_ON.
    pub investment_ratio: f64,
    /// nu_eff = (burn + effort) / previous V_ON.
    pub velocity: f64,
    /// tau_eng = new staking / income distributed.
    pub engagement: f64,
}

impl Default for SensorReadings {
    fn default() -> Self {
        Self {
            thermometric_ratio: 1.0,
            investment_ratio: 0.0,
            velocity: 0.20,
            engagement: 0.0,
        }
    }
}

// -- Regulator -----------------------------------------------------------------

/// Clamped two-coefficient controller. Holds its own state across cycles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Regulator {
    params: RegulatorParams,
    state: RegulationState,
    last_readings: SensorReadings,
    previous_active_wealth: Option<f64>,
    previous_flows: CycleFlows,
}

impl Regulator {
    /// Create with the reference calibration; both coefficients start at 1.0.
    pub fn new() -> Self {
        Self::with_params(RegulatorParams::default())
    }

    pub fn with_params(params: RegulatorParams) -> Self {
        Self {
            last_readings: SensorReadings {
                velocity: params.default_velocity,
                ..SensorReadings::default()
            },
            params,
            state: RegulationState::default(),
            previous_active_wealth: None,
            previous_flows: CycleFlows::default(),
        }
    }

    pub fn params(&self) -> &RegulatorParams {
        &self.params
    }

    pub fn state(&self) -> RegulationState {
        self.state
    }

    pub fn liquidity(&self) -> f64 {
        self.state.liquidity
    }

    pub fn production(&self) -> f64 {
        self.state.production
    }

    /// Readings from the last call to [`regulate`](Self::regulate).
    pub fn last_readings(&self) -> &SensorReadings {
        &self.last_readings
    }

    /// Compute sensor values without touching state.
    pub fn sense(&self, inputs: &SensorInputs) -> SensorReadings {
        let v_on = inputs.active_wealth;
        let thermometric_ratio = if v_on > 0.0 { inputs.ledger_total / v_on } else { 1.0 };
        let investment_ratio = if v_on > 0.0 { inputs.outstanding_commitments / v_on } else { 0.0 };

        let flows = &self.previous_flows;
        let velocity = match self.previous_active_wealth {
            Some(prev) if prev > 0.0 => (flows.spendable_burn + flows.effort) / prev,
            _ => self.params.default_velocity,
        };
        let engagement = if flows.income_distributed > 0.0 {
            flows.staking_commitment / flows.income_distributed
        } else {
            0.0
        };

        SensorReadings {
            thermometric_ratio,
            investment_ratio,
            velocity,
            engagement,
        }
    }

    /// Apply the feedback laws to `readings`, updating and returning the state.
    ///
    /// ```text
    /// d_eta   = a_p (1 - r) + b_p (nu* - nu) - g_p (tau - tau*)
    /// d_kappa = a_l (nu* - nu) - b_l (tau - tau*) + g_l (1 - r)
    /// ```
    pub fn adjust(&mut self, readings: &SensorReadings) -> RegulationState {
        let p = &self.params;
        let thermal_error = 1.0 - readings.thermometric_ratio;
        let velocity_error = p.velocity_target - readings.velocity;
        let engagement_error = readings.engagement - p.engagement_target;

        let pg = p.production_gains;
        let d_production =
            pg.alpha * thermal_error + pg.beta * velocity_error - pg.gamma * engagement_error;

        let lg = p.liquidity_gains;
        let d_liquidity =
            lg.alpha * velocity_error - lg.beta * engagement_error + lg.gamma * thermal_error;

        self.state = RegulationState {
            production: p.bounds.step(self.state.production, d_production),
            liquidity: p.bounds.step(self.state.liquidity, d_liquidity),
        };
        self.state
    }

    /// Run one control cycle: sense, then adjust.
    pub fn regulate(&mut self, inputs: &SensorInputs) -> RegulationState {
        let readings = self.sense(inputs);
        let state = self.adjust(&readings);
        self.last_readings = readings;
        debug!(
            ratio = readings.thermometric_ratio,
            r_ic = readings.investment_ratio,
            velocity = readings.velocity,
            engagement = readings.engagement,
            liquidity = state.liquidity,
            production = state.production,
            "Regulator updated"
        );
        state
    }

    /// Hand back the flows of the cycle just completed for the next sensing pass.
    pub fn record_cycle(&mut self, active_wealth: f64, flows: CycleFlows) {
        self.previous_active_wealth = Some(active_wealth);
        self.previous_flows = flows;
    }

    /// Spendable equivalent of durable value at the current liquidity.
    pub fn to_spendable(&self, durable: f64) -> f64 {
        durable * self.state.liquidity
    }

    /// Durable equivalent of spendable value at the current liquidity.
    pub fn to_durable(&self, spendable: f64) -> f64 {
        if self.state.liquidity <= 0.0 {
            return 0.0;
        }
        spendable / self.state.liquidity
    }
}

impl Default for Regulator {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
