//! PV-fed PWM converter, bus capacitor, and electrolyzer simulator.

pub mod config;
pub mod io;
/// Simulation engine, components, and metrics.
pub mod sim;

pub use sim::engine::{run_simulation, run_simulation_with};
pub use sim::error::{ConfigError, SimError};
pub use sim::types::{RunSettings, SimulationConfig, SimulationResult};
