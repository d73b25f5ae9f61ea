//! Simulation engine that steps the array, converter, bus, and load.

use tracing::{debug, info, warn};

use super::bus::BusCapacitor;
use super::clock::{RunPlan, StepClock, Tick};
use super::converter::{GatePhase, SwitchingStage};
use super::electrolyzer::Electrolyzer;
use super::error::SimError;
use super::panel::PanelArray;
use super::types::{RunSettings, SimulationConfig, SimulationResult, SimulationState, StepRecord};

/// Runs one simulation with the default [`RunSettings`].
///
/// Pure with respect to its inputs: no shared state, safe to call from
/// several threads at once.
///
/// # Errors
///
/// * [`SimError::Config`] if `config` violates an invariant
/// * [`SimError::Numerical`] if the bus state diverges mid-run
///
/// # Examples
///
/// ```
/// use pv_h2_sim::sim::engine::run_simulation;
/// use pv_h2_sim::sim::types::SimulationConfig;
///
/// let result = run_simulation(&SimulationConfig::default()).unwrap();
/// assert!(result.sim_duration_s > 0.0);
/// assert!((0.0..=100.0).contains(&result.uptime_pct));
/// ```
pub fn run_simulation(config: &SimulationConfig) -> Result<SimulationResult, SimError> {
    run_simulation_with(config, &RunSettings::default())
}

/// Runs one simulation with explicit horizon and resolution.
///
/// # Errors
///
/// Same as [`run_simulation`]; unusable `settings` also yield
/// [`SimError::Config`].
pub fn run_simulation_with(
    config: &SimulationConfig,
    settings: &RunSettings,
) -> Result<SimulationResult, SimError> {
    Engine::new(config.clone(), settings)?.run()
}

/// Simulation engine owning the components and the per-run state.
///
/// Holds typed component fields rather than trait objects since the
/// topology is fixed. Consumed by [`Engine::run`], so a state is never
/// reused across runs.
pub struct Engine {
    config: SimulationConfig,
    plan: RunPlan,
    panel: PanelArray,
    stage: SwitchingStage,
    bus: BusCapacitor,
    load: Electrolyzer,
    state: SimulationState,
}

impl Engine {
    /// Validates the inputs and builds a ready-to-run engine.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] for an invalid config or settings. No
    /// step is taken in that case.
    pub fn new(config: SimulationConfig, settings: &RunSettings) -> Result<Self, SimError> {
        config.validate()?;
        let plan = RunPlan::new(settings, config.period_s)?;

        Ok(Self {
            panel: PanelArray::from_config(&config),
            stage: SwitchingStage::from_config(&config),
            bus: BusCapacitor::from_config(&config),
            load: Electrolyzer::from_config(&config),
            state: SimulationState::new(),
            config,
            plan,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn plan(&self) -> &RunPlan {
        &self.plan
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Executes one integration step and folds it into the metrics.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Numerical`] if the bus voltage diverges.
    pub fn step(&mut self, tick: Tick) -> Result<StepRecord, SimError> {
        let dt = self.plan.dt_s;

        // 1. Gate and source
        let gate = self.stage.gate_at_phase(tick.phase_s);
        let i_in = self
            .stage
            .delivered_current_a(gate, self.panel.current_a());

        // 2. Bus with the load solved against the end-of-step voltage
        let bus_step = self
            .bus
            .advance(self.state.bus_voltage_v, i_in, &self.load, dt)
            .map_err(|fault| SimError::Numerical {
                step: tick.index,
                time_s: tick.end_time_s,
                reason: fault.to_string(),
            })?;
        let i_load = bus_step.load_current_a;
        let mid_v = bus_step.mid_v();

        // 3. Viability and hydrogen
        let up = self.load.is_up(bus_step.end_v);
        let h2_kg = if up {
            self.load.h2_mass_kg(i_load * dt)
        } else {
            0.0
        };

        let record = StepRecord {
            step: tick.index,
            time_s: tick.end_time_s,
            gate_on: gate == GatePhase::On,
            i_in_a: i_in,
            i_load_a: i_load,
            bus_start_v: bus_step.start_v,
            bus_v: bus_step.end_v,
            bus_mid_v: mid_v,
            p_in_w: mid_v * i_in,
            p_out_w: mid_v * i_load,
            up,
            h2_kg,
            in_window: tick.in_window,
        };

        self.state.step = tick.index + 1;
        self.state.elapsed_s = tick.end_time_s;
        self.state.bus_voltage_v = bus_step.end_v;
        self.state.metrics.record(&record, dt);

        Ok(record)
    }

    /// Executes all steps and returns the aggregate result.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Numerical`] if the run diverges. No partial result
    /// is returned.
    pub fn run(self) -> Result<SimulationResult, SimError> {
        self.run_with(|_| {})
    }

    /// Like [`Engine::run`], also returning every step record.
    ///
    /// Holds the whole trajectory in memory; use [`Engine::run_with`] to
    /// stream long runs instead.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::run`].
    pub fn run_recorded(self) -> Result<(SimulationResult, Vec<StepRecord>), SimError> {
        let mut records = Vec::new();
        let result = self.run_with(|r| records.push(r))?;
        Ok((result, records))
    }

    /// Executes all steps, handing each record to `sink` as it is produced.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::run`].
    pub fn run_with(
        mut self,
        mut sink: impl FnMut(StepRecord),
    ) -> Result<SimulationResult, SimError> {
        debug!(
            panels = self.config.panel_count,
            duty = self.stage.duty_ratio(),
            dt_s = self.plan.dt_s,
            total_steps = self.plan.total_steps(),
            window_start = self.plan.window_start_step(),
            "starting simulation run"
        );

        let mut clock = StepClock::new(&self.plan);
        while let Some(tick) = clock.tick() {
            match self.step(tick) {
                Ok(record) => sink(record),
                Err(e) => {
                    warn!(error = %e, "simulation aborted");
                    return Err(e);
                }
            }
        }

        let result = self.state.metrics.finish(self.state.elapsed_s);
        info!(
            vout_avg_v = result.vout_avg_v,
            eff_pct = result.eff_pct,
            uptime_pct = result.uptime_pct,
            h2_kg = result.h2_kg_window,
            "simulation complete"
        );
        Ok(result)
    }
}
