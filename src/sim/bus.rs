//! Bus capacitor integration.

use super::types::SimulationConfig;

/// Sanity bound on bus voltage (V). Anything above is treated as divergence.
pub const MAX_BUS_VOLTAGE_V: f64 = 1.0e6;

/// Anything that draws current from the bus.
///
/// The load is solved implicitly: given the voltage the bus would reach
/// over the step with no load attached (`free_voltage_v`), return the load
/// current consistent with the end-of-step voltage.
pub trait BusLoad {
    fn step_current_a(&self, free_voltage_v: f64, capacitance_f: f64, dt_s: f64) -> f64;

    /// Lowest voltage the load can pull the bus to while it conducts.
    fn conduction_floor_v(&self) -> f64 {
        0.0
    }
}

/// Outcome of one capacitor step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BusStep {
    /// Voltage before the step (V).
    pub start_v: f64,
    /// Voltage after the step, clamped at zero (V).
    pub end_v: f64,
    /// Load current applied over the step (A).
    pub load_current_a: f64,
}

impl BusStep {
    /// Trapezoidal voltage over the step (V).
    pub fn mid_v(&self) -> f64 {
        0.5 * (self.start_v + self.end_v)
    }
}

/// Divergence detected while stepping the bus.
#[derive(Debug, Clone, PartialEq)]
pub enum BusFault {
    NonFinite(f64),
    OutOfRange(f64),
}

impl std::fmt::Display for BusFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonFinite(v) => write!(f, "bus voltage is not finite ({v})"),
            Self::OutOfRange(v) => {
                write!(f, "bus voltage {v:.3e} V exceeds sanity bound {MAX_BUS_VOLTAGE_V:.0e} V")
            }
        }
    }
}

/// Bus capacitor integrating `dV/dt = (I_in - I_load) / C`.
///
/// Holds only the capacitance; the voltage lives in the run state and is
/// passed in for each step.
#[derive(Debug, Clone, PartialEq)]
pub struct BusCapacitor {
    /// Capacitance (F).
    pub capacitance_f: f64,
}

impl BusCapacitor {
    pub fn new(capacitance_f: f64) -> Self {
        Self { capacitance_f }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.bus_capacitance_f)
    }

    /// Advances the bus from `start_v` by one fixed step.
    ///
    /// The source current is explicit over the step; the load term is
    /// backward Euler via [`BusLoad::step_current_a`].
    ///
    /// # Errors
    ///
    /// Returns a [`BusFault`] if the new voltage is non-finite or above
    /// [`MAX_BUS_VOLTAGE_V`].
    pub fn advance(
        &self,
        start_v: f64,
        input_current_a: f64,
        load: &impl BusLoad,
        dt_s: f64,
    ) -> Result<BusStep, BusFault> {
        let free_v = start_v + input_current_a * dt_s / self.capacitance_f;
        let load_current_a = load.step_current_a(free_v, self.capacitance_f, dt_s);
        let raw_v = free_v - load_current_a * dt_s / self.capacitance_f;

        // f64::max would swallow a NaN here
        if !raw_v.is_finite() || !load_current_a.is_finite() {
            return Err(BusFault::NonFinite(raw_v));
        }
        // a conducting load stops at its floor; rounding must not cross it
        let floor_v = if load_current_a > 0.0 {
            load.conduction_floor_v().max(0.0)
        } else {
            0.0
        };
        let end_v = raw_v.max(floor_v);
        if end_v > MAX_BUS_VOLTAGE_V {
            return Err(BusFault::OutOfRange(end_v));
        }

        Ok(BusStep {
            start_v,
            end_v,
            load_current_a,
        })
    }
}
