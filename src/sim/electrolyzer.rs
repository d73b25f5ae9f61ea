//! Electrolyzer load: viability cutoff, resistive draw, and hydrogen yield.

use super::bus::BusLoad;
use super::types::SimulationConfig;

/// Faraday constant (C/mol), CODATA 2018 exact value.
pub const FARADAY_C_PER_MOL: f64 = 96_485.332_12;

/// Molar mass of H2 (kg/mol).
pub const H2_MOLAR_MASS_KG_PER_MOL: f64 = 2.015_88e-3;

/// Hydrogen mass per coulomb passed through the cell (kg/C).
///
/// Two electrons per H2 molecule at 100 % Faradaic efficiency:
/// `M_H2 / (2 F)`, about 1.0447e-8 kg/C.
pub const H2_KG_PER_COULOMB: f64 = H2_MOLAR_MASS_KG_PER_MOL / (2.0 * FARADAY_C_PER_MOL);

/// Draw limit for a zero-resistance (ideal sink) electrolyzer (A).
pub const IDEAL_SINK_CURRENT_LIMIT_A: f64 = 1_000.0;

/// Electrolyzer stack seen from the bus: a voltage floor plus a series
/// resistance.
#[derive(Debug, Clone, PartialEq)]
pub struct Electrolyzer {
    /// Bus voltage below which the stack does not conduct (V).
    pub min_voltage_v: f64,
    /// Series resistance (ohm). Zero means an ideal sink at `min_voltage_v`.
    pub series_resistance_ohm: f64,
}

impl Electrolyzer {
    pub fn new(min_voltage_v: f64, series_resistance_ohm: f64) -> Self {
        Self {
            min_voltage_v,
            series_resistance_ohm,
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.min_voltage_v, config.series_resistance_ohm)
    }

    /// Whether the stack is viable at this bus voltage.
    pub fn is_up(&self, bus_voltage_v: f64) -> bool {
        bus_voltage_v >= self.min_voltage_v
    }

    /// Hydrogen produced by `charge_c` coulombs (kg).
    pub fn h2_mass_kg(&self, charge_c: f64) -> f64 {
        charge_c.max(0.0) * H2_KG_PER_COULOMB
    }
}

impl BusLoad for Electrolyzer {
    /// Solves `I = max(0, (V_end - Vmin) / Rs)` with
    /// `V_end = V_free - I * dt / C`, giving `I = (V_free - Vmin) / (Rs + dt / C)`.
    fn step_current_a(&self, free_voltage_v: f64, capacitance_f: f64, dt_s: f64) -> f64 {
        let overvoltage = free_voltage_v - self.min_voltage_v;
        if overvoltage <= 0.0 {
            return 0.0;
        }
        let current = overvoltage / (self.series_resistance_ohm + dt_s / capacitance_f);
        if self.series_resistance_ohm > 0.0 {
            current
        } else {
            current.min(IDEAL_SINK_CURRENT_LIMIT_A)
        }
    }

    fn conduction_floor_v(&self) -> f64 {
        self.min_voltage_v
    }
}
