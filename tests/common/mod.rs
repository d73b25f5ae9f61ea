//! Shared fixtures for integration tests.
#![allow(dead_code)]

use pv_h2_sim::sim::types::{RunSettings, SimulationConfig};

/// Documented boundary defaults (1 panel, 12/20 us, 5 A, 55 V, 0.5 ohm, 470 uF).
pub fn default_config() -> SimulationConfig {
    SimulationConfig::default()
}

/// Small-bus configuration that settles into periodic regulation well
/// before the measurement window opens.
pub fn steady_state_config() -> SimulationConfig {
    SimulationConfig {
        bus_capacitance_f: 10.0e-6,
        ..SimulationConfig::default()
    }
}

/// Same as `base` with the on-time set to `duty * period`.
pub fn with_duty(base: &SimulationConfig, duty: f64) -> SimulationConfig {
    SimulationConfig {
        on_time_s: duty * base.period_s,
        ..base.clone()
    }
}

/// Coarse 1 ms horizon for sweeps: 50 periods at 20 us, 50 steps each.
pub fn short_settings() -> RunSettings {
    RunSettings {
        duration_s: 1.0e-3,
        window_s: 2.0e-4,
        steps_per_period: 50,
    }
}

/// Asserts `|actual - expected| <= tol` with a readable message.
pub fn assert_close(actual: f64, expected: f64, tol: f64, what: &str) {
    assert!(
        (actual - expected).abs() <= tol,
        "{what}: expected {expected} +/- {tol}, got {actual}"
    );
}
