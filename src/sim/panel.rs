use super::types::SimulationConfig;

/// `n_panels` identical current-limited PV sources, modeled in aggregate.
///
/// The array is an ideal current source: it delivers its full limit at any
/// bus voltage. Stateless.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelArray {
    /// Number of panels in parallel.
    pub panel_count: u32,
    /// Current limit of a single panel (A).
    pub set_current_a: f64,
}

impl PanelArray {
    pub fn new(panel_count: u32, set_current_a: f64) -> Self {
        Self {
            panel_count,
            set_current_a,
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.panel_count, config.set_current_a)
    }

    /// Current the array delivers during the converter on-phase (A, >= 0).
    pub fn current_a(&self) -> f64 {
        (f64::from(self.panel_count) * self.set_current_a).max(0.0)
    }
}
