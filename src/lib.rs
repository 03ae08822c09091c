// Copyright 2026 Hypermesh Foundation. All rights reserved.
// IRIS Economy Simulation Suite

pub mod simulation;
pub mod config;
pub mod metrics;

// Economy subsystems
pub mod core_types;
pub mod adapter;
pub mod ledger;
pub mod goods;
pub mod agent;
pub mod population;
pub mod regulator;
pub mod income;
pub mod commitment;
pub mod decision;
pub mod enterprise;

pub use config::{ConfigError, DistributionScheme, SimulationConfig};
pub use metrics::CycleMetrics;
pub use simulation::{IrisSimulation, SimulationError};
