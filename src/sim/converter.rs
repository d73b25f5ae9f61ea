//! PWM switching stage between the panel array and the bus.

use super::types::SimulationConfig;

/// Gate state of the switching stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePhase {
    /// Array current flows into the bus.
    On,
    /// No current is delivered.
    Off,
}

/// Periodic gate with fixed on-time and period.
///
/// The gate is an explicit function of the phase inside the period, which
/// the caller derives from the step index; there is no toggling flag.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchingStage {
    on_time_s: f64,
    period_s: f64,
}

impl SwitchingStage {
    pub fn new(on_time_s: f64, period_s: f64) -> Self {
        Self {
            on_time_s,
            period_s,
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.on_time_s, config.period_s)
    }

    pub fn duty_ratio(&self) -> f64 {
        self.on_time_s / self.period_s
    }

    /// Gate state for a phase already reduced into `[0, period)`.
    pub fn gate_at_phase(&self, phase_s: f64) -> GatePhase {
        if phase_s < self.on_time_s {
            GatePhase::On
        } else {
            GatePhase::Off
        }
    }

    /// Current delivered toward the bus for a given gate state.
    pub fn delivered_current_a(&self, gate: GatePhase, array_current_a: f64) -> f64 {
        match gate {
            GatePhase::On => array_current_a,
            GatePhase::Off => 0.0,
        }
    }
}
