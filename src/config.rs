//! TOML-based scenario configuration, boundary units, and presets.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::sim::error::ConfigError;
use crate::sim::types::{RunSettings, SimulationConfig};

const MICRO: f64 = 1e-6;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Array, converter, bus, and load parameters in boundary units.
    #[serde(default)]
    pub converter: BoundaryParams,
    /// Horizon and resolution.
    #[serde(default)]
    pub run: RunParams,
}

/// Electrical parameters as named and scaled at the service boundary:
/// times in microseconds, capacitance in microfarads.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoundaryParams {
    /// Number of panels.
    pub n_panels: i64,
    /// Converter on-time (us).
    #[serde(rename = "Ton_us")]
    pub ton_us: f64,
    /// Switching period (us).
    #[serde(rename = "Tper_us")]
    pub tper_us: f64,
    /// Per-panel current limit (A).
    #[serde(rename = "Iset_A")]
    pub iset_a: f64,
    /// Electrolyzer viability cutoff (V).
    #[serde(rename = "Vmin_V")]
    pub vmin_v: f64,
    /// Electrolyzer series resistance (ohm).
    #[serde(rename = "Rs_el_ohm")]
    pub rs_el_ohm: f64,
    /// Bus capacitance (uF).
    #[serde(rename = "Cbus_uF")]
    pub cbus_uf: f64,
}

impl Default for BoundaryParams {
    fn default() -> Self {
        Self {
            n_panels: 1,
            ton_us: 12.0,
            tper_us: 20.0,
            iset_a: 5.0,
            vmin_v: 55.0,
            rs_el_ohm: 0.5,
            cbus_uf: 470.0,
        }
    }
}

impl BoundaryParams {
    /// Boundary parameter names, in the order they are documented.
    pub const NAMES: &[&str] = &[
        "n_panels",
        "Ton_us",
        "Tper_us",
        "Iset_A",
        "Vmin_V",
        "Rs_el_ohm",
        "Cbus_uF",
    ];

    /// Converts to SI units. Out-of-range panel counts saturate and are
    /// caught by validation.
    pub fn to_simulation_config(&self) -> SimulationConfig {
        SimulationConfig {
            panel_count: u32::try_from(self.n_panels.max(0)).unwrap_or(u32::MAX),
            on_time_s: self.ton_us * MICRO,
            period_s: self.tper_us * MICRO,
            set_current_a: self.iset_a,
            min_voltage_v: self.vmin_v,
            series_resistance_ohm: self.rs_el_ohm,
            bus_capacitance_f: self.cbus_uf * MICRO,
        }
    }

    /// Overrides one parameter by its boundary name.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the name is unknown or the value does not
    /// parse.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
        if name == "n_panels" {
            self.n_panels = value.trim().parse().map_err(|e| {
                ConfigError::new(name, format!("\"{value}\" is not an integer: {e}"))
            })?;
            return Ok(());
        }

        let slot = match name {
            "Ton_us" => &mut self.ton_us,
            "Tper_us" => &mut self.tper_us,
            "Iset_A" => &mut self.iset_a,
            "Vmin_V" => &mut self.vmin_v,
            "Rs_el_ohm" => &mut self.rs_el_ohm,
            "Cbus_uF" => &mut self.cbus_uf,
            _ => {
                return Err(ConfigError::new(
                    name,
                    format!("unknown parameter, available: {}", Self::NAMES.join(", ")),
                ));
            }
        };
        *slot = value
            .trim()
            .parse()
            .map_err(|e| ConfigError::new(name, format!("\"{value}\" is not a number: {e}")))?;
        Ok(())
    }

    /// Validates the parameters, reporting boundary field names.
    pub fn violations(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.n_panels > i64::from(u32::MAX) {
            errors.push(ConfigError::new("n_panels", "is too large"));
        }
        errors.extend(
            self.to_simulation_config()
                .violations()
                .into_iter()
                .map(|e| ConfigError {
                    field: boundary_name(&e.field).to_string(),
                    message: e.message.replace("period_s", "Tper_us"),
                }),
        );
        errors
    }
}

fn boundary_name(field: &str) -> &str {
    match field {
        "panel_count" => "n_panels",
        "on_time_s" => "Ton_us",
        "period_s" => "Tper_us",
        "set_current_a" => "Iset_A",
        "min_voltage_v" => "Vmin_V",
        "series_resistance_ohm" => "Rs_el_ohm",
        "bus_capacitance_f" => "Cbus_uF",
        other => other,
    }
}

/// Horizon and resolution in boundary units.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunParams {
    /// Simulated horizon (us).
    pub duration_us: f64,
    /// Trailing measurement window (us).
    pub window_us: f64,
    /// Integration steps per switching period.
    pub steps_per_period: u32,
}

impl Default for RunParams {
    fn default() -> Self {
        let s = RunSettings::default();
        Self {
            duration_us: s.duration_s / MICRO,
            window_us: s.window_s / MICRO,
            steps_per_period: s.steps_per_period,
        }
    }
}

impl RunParams {
    pub fn to_run_settings(&self) -> RunSettings {
        RunSettings {
            duration_s: self.duration_us * MICRO,
            window_s: self.window_us * MICRO,
            steps_per_period: self.steps_per_period,
        }
    }

    pub fn violations(&self) -> Vec<ConfigError> {
        self.to_run_settings()
            .violations()
            .into_iter()
            .map(|e| {
                let field = match e.field.as_str() {
                    "duration_s" => "duration_us",
                    "window_s" => "window_us",
                    other => other,
                };
                ConfigError::new(field, e.message)
            })
            .collect()
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario (the documented boundary defaults).
    pub fn baseline() -> Self {
        Self {
            converter: BoundaryParams::default(),
            run: RunParams::default(),
        }
    }

    /// Returns a small-bus scenario that reaches regulation well inside the
    /// horizon, so the window sees the electrolyzer running.
    pub fn steady_state() -> Self {
        Self {
            converter: BoundaryParams {
                cbus_uf: 10.0,
                ..BoundaryParams::default()
            },
            run: RunParams::default(),
        }
    }

    /// Returns the steady-state scenario at 100 % duty.
    pub fn full_duty() -> Self {
        let mut cfg = Self::steady_state();
        cfg.converter.ton_us = cfg.converter.tper_us;
        cfg
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "steady_state", "full_duty"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "steady_state" => Ok(Self::steady_state()),
            "full_duty" => Ok(Self::full_duty()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors: Vec<ConfigError> = self
            .converter
            .violations()
            .into_iter()
            .map(|e| e.within("converter"))
            .collect();
        errors.extend(self.run.violations().into_iter().map(|e| e.within("run")));
        errors
    }

    pub fn simulation_config(&self) -> SimulationConfig {
        self.converter.to_simulation_config()
    }

    pub fn run_settings(&self) -> RunSettings {
        self.run.to_run_settings()
    }
}
