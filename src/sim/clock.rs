use super::error::{ConfigError, SimError};
use super::types::{MAX_TOTAL_STEPS, RunSettings};

/// Relative slack when rounding a horizon to whole periods, so that
/// `5 ms / 20 us` lands on 250 periods rather than 251.
const PERIOD_ROUNDING_SLACK: f64 = 1e-9;

/// Fixed-step schedule of one run, derived from [`RunSettings`] and the
/// switching period.
#[derive(Debug, Clone, PartialEq)]
pub struct RunPlan {
    /// Integration step (s).
    pub dt_s: f64,
    /// Steps per switching period.
    pub steps_per_period: u64,
    /// Whole periods simulated.
    pub total_periods: u64,
    /// Whole periods in the trailing measurement window.
    pub window_periods: u64,
}

impl RunPlan {
    /// Derives the step schedule for a given switching period.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] if the settings are unusable or the
    /// horizon would exceed [`MAX_TOTAL_STEPS`].
    pub fn new(settings: &RunSettings, period_s: f64) -> Result<Self, SimError> {
        if let Some(e) = settings.violations().into_iter().next() {
            return Err(e.within("run").into());
        }

        let spp = u64::from(settings.steps_per_period);
        let periods = (settings.duration_s / period_s - PERIOD_ROUNDING_SLACK)
            .ceil()
            .max(1.0);
        let steps = periods * spp as f64;
        if !steps.is_finite() || steps > MAX_TOTAL_STEPS as f64 {
            return Err(ConfigError::new(
                "run.duration_s",
                format!("horizon needs {steps:.3e} steps, limit is {MAX_TOTAL_STEPS}"),
            )
            .into());
        }
        let total_periods = periods as u64;
        let window_periods = ((settings.window_s / period_s).round() as u64).clamp(1, total_periods);

        Ok(Self {
            dt_s: period_s / spp as f64,
            steps_per_period: spp,
            total_periods,
            window_periods,
        })
    }

    /// Total number of integration steps.
    pub fn total_steps(&self) -> u64 {
        self.total_periods * self.steps_per_period
    }

    /// Index of the first step inside the measurement window.
    pub fn window_start_step(&self) -> u64 {
        (self.total_periods - self.window_periods) * self.steps_per_period
    }

    /// Simulated time covered by the whole run (s).
    pub fn duration_s(&self) -> f64 {
        self.total_steps() as f64 * self.dt_s
    }
}

/// Timing of one step handed out by [`StepClock`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Step index.
    pub index: u64,
    /// Position inside the switching period, sampled at the step midpoint (s).
    pub phase_s: f64,
    /// Simulated time at the end of the step (s).
    pub end_time_s: f64,
    /// Whether the step belongs to the measurement window.
    pub in_window: bool,
}

/// A simulation clock that walks the steps of a [`RunPlan`].
///
/// Phase is computed from the integer step index modulo the steps per
/// period, so it never drifts however long the run is.
///
/// # Examples
///
/// ```
/// use pv_h2_sim::sim::clock::{RunPlan, StepClock};
/// use pv_h2_sim::sim::types::RunSettings;
///
/// let settings = RunSettings { duration_s: 40e-6, window_s: 20e-6, steps_per_period: 20 };
/// let plan = RunPlan::new(&settings, 20e-6).unwrap();
/// let mut clock = StepClock::new(&plan);
/// let mut n = 0;
/// clock.run(|_| n += 1);
/// assert_eq!(n, 40);
/// ```
pub struct StepClock {
    /// Next step index.
    current: u64,
    total: u64,
    steps_per_period: u64,
    window_start: u64,
    dt_s: f64,
}

impl StepClock {
    pub fn new(plan: &RunPlan) -> Self {
        Self {
            current: 0,
            total: plan.total_steps(),
            steps_per_period: plan.steps_per_period,
            window_start: plan.window_start_step(),
            dt_s: plan.dt_s,
        }
    }

    /// Advances the clock by one step.
    ///
    /// # Returns
    ///
    /// * `Some(tick)` - Timing of the step just started
    /// * `None` - If the clock has reached its total steps
    pub fn tick(&mut self) -> Option<Tick> {
        if self.current >= self.total {
            return None;
        }
        let index = self.current;
        self.current += 1;
        let in_period = index % self.steps_per_period;
        Some(Tick {
            index,
            phase_s: (in_period as f64 + 0.5) * self.dt_s,
            end_time_s: (index + 1) as f64 * self.dt_s,
            in_window: index >= self.window_start,
        })
    }

    /// Runs a function for each remaining step in the clock.
    pub fn run(&mut self, mut f: impl FnMut(Tick)) {
        while let Some(tick) = self.tick() {
            f(tick);
        }
    }
}
