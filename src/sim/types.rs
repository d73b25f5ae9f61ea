//! Core simulation types: configuration, run settings, step records, and results.

use std::fmt;

use super::error::{ConfigError, SimError};
use super::metrics::MetricsAggregator;

/// Upper bound on steps a single run may take.
pub const MAX_TOTAL_STEPS: u64 = 50_000_000;

/// Fewest samples per switching period that still resolve the ripple waveform.
pub const MIN_STEPS_PER_PERIOD: u32 = 20;

/// Immutable electrical parameters of one run, in SI units.
///
/// Build it directly or convert from boundary units with
/// [`crate::config::BoundaryParams::to_simulation_config`].
///
/// # Examples
///
/// ```
/// use pv_h2_sim::sim::types::SimulationConfig;
///
/// let cfg = SimulationConfig::default();
/// assert!(cfg.validate().is_ok());
/// assert!((cfg.duty_ratio() - 0.6).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Number of aggregated PV sources (>= 1).
    pub panel_count: u32,
    /// Converter on-time per period (s).
    pub on_time_s: f64,
    /// Converter switching period (s, > 0).
    pub period_s: f64,
    /// Per-panel current limit (A, > 0).
    pub set_current_a: f64,
    /// Bus voltage floor for a viable electrolyzer (V, >= 0).
    pub min_voltage_v: f64,
    /// Electrolyzer series resistance (ohm, >= 0).
    pub series_resistance_ohm: f64,
    /// Bus capacitance (F, > 0).
    pub bus_capacitance_f: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            panel_count: 1,
            on_time_s: 12.0e-6,
            period_s: 20.0e-6,
            set_current_a: 5.0,
            min_voltage_v: 55.0,
            series_resistance_ohm: 0.5,
            bus_capacitance_f: 470.0e-6,
        }
    }
}

impl SimulationConfig {
    /// Fraction of each period during which the converter delivers current.
    pub fn duty_ratio(&self) -> f64 {
        self.on_time_s / self.period_s
    }

    /// Lists every violated invariant. Empty when the config is valid.
    pub fn violations(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.panel_count == 0 {
            errors.push(ConfigError::new("panel_count", "must be >= 1"));
        }

        let reals = [
            ("on_time_s", self.on_time_s),
            ("period_s", self.period_s),
            ("set_current_a", self.set_current_a),
            ("min_voltage_v", self.min_voltage_v),
            ("series_resistance_ohm", self.series_resistance_ohm),
            ("bus_capacitance_f", self.bus_capacitance_f),
        ];
        let mut non_finite = false;
        for (field, value) in reals {
            if !value.is_finite() {
                non_finite = true;
                errors.push(ConfigError::new(field, format!("must be finite, got {value}")));
            }
        }
        // range checks are meaningless on NaN or infinity
        if non_finite {
            return errors;
        }

        if self.period_s <= 0.0 {
            errors.push(ConfigError::new("period_s", "must be > 0"));
        }
        if self.on_time_s < 0.0 {
            errors.push(ConfigError::new("on_time_s", "must be >= 0"));
        } else if self.on_time_s > self.period_s {
            errors.push(ConfigError::new("on_time_s", "must be <= period_s"));
        }
        if self.set_current_a <= 0.0 {
            errors.push(ConfigError::new("set_current_a", "must be > 0"));
        }
        if self.min_voltage_v < 0.0 {
            errors.push(ConfigError::new("min_voltage_v", "must be >= 0"));
        }
        if self.series_resistance_ohm < 0.0 {
            errors.push(ConfigError::new("series_resistance_ohm", "must be >= 0"));
        }
        if self.bus_capacitance_f <= 0.0 {
            errors.push(ConfigError::new("bus_capacitance_f", "must be > 0"));
        }

        errors
    }

    /// Checks all invariants and reports the first violation.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] if any invariant is violated.
    pub fn validate(&self) -> Result<(), SimError> {
        match self.violations().into_iter().next() {
            Some(e) => Err(SimError::Config(e)),
            None => Ok(()),
        }
    }
}

/// Horizon and resolution of a run, independent of the electrical parameters.
///
/// Defaults reproduce the classic measurement setup: 5 ms of simulated time,
/// metrics taken over the final 0.2 ms.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    /// Simulated horizon (s). Rounded up to whole switching periods.
    pub duration_s: f64,
    /// Trailing measurement window (s). Rounded to whole periods, at least one.
    pub window_s: f64,
    /// Fixed integration steps per switching period.
    pub steps_per_period: u32,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            duration_s: 5.0e-3,
            window_s: 2.0e-4,
            steps_per_period: 200,
        }
    }
}

impl RunSettings {
    /// Lists every violated constraint that does not depend on the period.
    pub fn violations(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if !self.duration_s.is_finite() || self.duration_s <= 0.0 {
            errors.push(ConfigError::new("duration_s", "must be finite and > 0"));
        }
        if !self.window_s.is_finite() || self.window_s <= 0.0 {
            errors.push(ConfigError::new("window_s", "must be finite and > 0"));
        }
        if self.steps_per_period < MIN_STEPS_PER_PERIOD {
            errors.push(ConfigError::new(
                "steps_per_period",
                format!("must be >= {MIN_STEPS_PER_PERIOD}"),
            ));
        }
        errors
    }
}

/// Mutable per-run state, owned exclusively by one engine.
#[derive(Debug, Clone)]
pub struct SimulationState {
    /// Index of the next step to execute.
    pub step: u64,
    /// Simulated clock at the end of the last executed step (s).
    pub elapsed_s: f64,
    /// Bus capacitor voltage (V, never negative).
    pub bus_voltage_v: f64,
    /// Running integrators over the measurement window.
    pub metrics: MetricsAggregator,
}

impl SimulationState {
    /// Fresh state: discharged bus, zero clock.
    pub fn new() -> Self {
        Self {
            step: 0,
            elapsed_s: 0.0,
            bus_voltage_v: 0.0,
            metrics: MetricsAggregator::new(),
        }
    }
}

impl Default for SimulationState {
    fn default() -> Self {
        Self::new()
    }
}

/// Complete record of one integration step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    /// Step index.
    pub step: u64,
    /// Simulated time at the end of the step (s).
    pub time_s: f64,
    /// Whether the converter gate was in its on-phase.
    pub gate_on: bool,
    /// Current delivered into the bus (A).
    pub i_in_a: f64,
    /// Current drawn by the electrolyzer (A).
    pub i_load_a: f64,
    /// Bus voltage at the start of the step (V).
    pub bus_start_v: f64,
    /// Bus voltage at the end of the step (V).
    pub bus_v: f64,
    /// Trapezoidal bus voltage over the step (V).
    pub bus_mid_v: f64,
    /// Input power into the bus, trapezoidal voltage (W).
    pub p_in_w: f64,
    /// Power delivered to the load, trapezoidal voltage (W).
    pub p_out_w: f64,
    /// Whether the bus met the minimum viable voltage at the end of the step.
    pub up: bool,
    /// Hydrogen produced during this step (kg).
    pub h2_kg: f64,
    /// Whether the step falls inside the measurement window.
    pub in_window: bool,
}

/// Aggregate operating metrics of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    /// Time-averaged bus voltage over the window (V).
    pub vout_avg_v: f64,
    /// Peak-to-peak bus voltage over the window (V).
    pub vout_pp_v: f64,
    /// Time-averaged input power into the bus (W).
    pub pin_avg_w: f64,
    /// Time-averaged power delivered to the electrolyzer (W).
    pub pout_avg_w: f64,
    /// `100 * Pout / Pin`, or 0 when no input energy accumulated.
    pub eff_pct: f64,
    /// Hydrogen produced over the window (kg).
    pub h2_kg_window: f64,
    /// Percentage of window steps with the bus at or above the minimum voltage.
    pub uptime_pct: f64,
    /// Total simulated time (s).
    pub sim_duration_s: f64,
}

impl fmt::Display for SimulationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Simulation Report ---")?;
        writeln!(f, "vout_avg_V      = {:.3} V", self.vout_avg_v)?;
        writeln!(f, "vout_pp_V       = {:.3} V", self.vout_pp_v)?;
        writeln!(f, "Pin_avg_W       = {:.3} W", self.pin_avg_w)?;
        writeln!(f, "Pout_avg_W      = {:.3} W", self.pout_avg_w)?;
        writeln!(f, "eff_pct         = {:.2} %", self.eff_pct)?;
        writeln!(f, "H2_kg_window    = {:.6e} kg", self.h2_kg_window)?;
        writeln!(f, "uptime_pct      = {:.1} %", self.uptime_pct)?;
        write!(f, "sim_duration_s  = {:.6} s", self.sim_duration_s)
    }
}
