//! CSV export for step trajectories and run summaries.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;

use crate::sim::types::{SimulationConfig, SimulationResult, StepRecord};

/// Column header for trajectory export.
const TRAJECTORY_HEADER: &str = "step,time_s,gate_on,i_in_a,i_load_a,bus_v,\
                                 p_in_w,p_out_w,up,h2_kg";

/// One-row run summary using the boundary field names.
///
/// Voltages and powers are rounded to 3 places, efficiency to 2, uptime
/// to 1 and duration to 6. Hydrogen keeps 6 significant digits, since
/// window masses sit far below a microgram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub n_panels: u32,
    #[serde(rename = "vout_avg_V")]
    pub vout_avg_v: f64,
    #[serde(rename = "vout_pp_V")]
    pub vout_pp_v: f64,
    #[serde(rename = "Pin_avg_W")]
    pub pin_avg_w: f64,
    #[serde(rename = "Pout_avg_W")]
    pub pout_avg_w: f64,
    pub eff_pct: f64,
    #[serde(rename = "H2_kg_window")]
    pub h2_kg_window: f64,
    pub uptime_pct: f64,
    pub sim_duration_s: f64,
}

impl SummaryRow {
    pub fn new(config: &SimulationConfig, result: &SimulationResult) -> Self {
        Self {
            n_panels: config.panel_count,
            vout_avg_v: round_to(result.vout_avg_v, 3),
            vout_pp_v: round_to(result.vout_pp_v, 3),
            pin_avg_w: round_to(result.pin_avg_w, 3),
            pout_avg_w: round_to(result.pout_avg_w, 3),
            eff_pct: round_to(result.eff_pct, 2),
            h2_kg_window: round_sig(result.h2_kg_window, 6),
            uptime_pct: round_to(result.uptime_pct, 1),
            sim_duration_s: round_to(result.sim_duration_s, 6),
        }
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10_f64.powi(places);
    (value * scale).round() / scale
}

fn round_sig(value: f64, digits: i32) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    let magnitude = value.abs().log10().floor() as i32;
    round_to(value, digits - 1 - magnitude)
}

/// Exports a step trajectory to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_trajectory_csv(records: &[StepRecord], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_trajectory_csv(records, io::BufWriter::new(file))
}

/// Writes a step trajectory as CSV to any writer.
///
/// Produces deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_trajectory_csv(records: &[StepRecord], writer: impl Write) -> io::Result<()> {
    let mut wtr = TrajectoryWriter::new(writer)?;
    for r in records {
        wtr.write(r)?;
    }
    wtr.finish()
}

/// Incremental trajectory CSV writer, fed one step at a time so long runs
/// never hold the whole trajectory in memory.
pub struct TrajectoryWriter<W: Write> {
    wtr: csv::Writer<W>,
}

impl<W: Write> TrajectoryWriter<W> {
    /// Wraps `writer` and emits the header row.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if the header cannot be written.
    pub fn new(writer: W) -> io::Result<Self> {
        let mut wtr = csv::WriterBuilder::new().from_writer(writer);
        wtr.write_record(TRAJECTORY_HEADER.split(',').map(str::trim))?;
        Ok(Self { wtr })
    }

    /// Appends one step row.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if writing fails.
    pub fn write(&mut self, r: &StepRecord) -> io::Result<()> {
        self.wtr.write_record(&[
            r.step.to_string(),
            format!("{:.9e}", r.time_s),
            r.gate_on.to_string(),
            format!("{:.6}", r.i_in_a),
            format!("{:.6}", r.i_load_a),
            format!("{:.6}", r.bus_v),
            format!("{:.6}", r.p_in_w),
            format!("{:.6}", r.p_out_w),
            r.up.to_string(),
            format!("{:.6e}", r.h2_kg),
        ])?;
        Ok(())
    }

    /// Flushes buffered rows.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if flushing fails.
    pub fn finish(mut self) -> io::Result<()> {
        self.wtr.flush()
    }
}

/// Exports a one-row run summary to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_summary_csv(row: &SummaryRow, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_summary_csv(row, io::BufWriter::new(file))
}

/// Writes a one-row run summary (header + row) to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if serialization or writing fails.
pub fn write_summary_csv(row: &SummaryRow, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.serialize(row)?;
    wtr.flush()?;
    Ok(())
}
