//! Closed-loop regulation of the liquidity and production coefficients.

pub mod controller;
pub mod params;

pub use controller::{CycleFlows, Regulator, SensorInputs, SensorReadings};
pub use params::{CoefficientBounds, FeedbackGains, RegulationState, RegulatorParams};
