//! End-to-end runs of the documented default configuration and the
//! regulated (small-bus) regime.

mod common;

use pv_h2_sim::sim::electrolyzer::H2_KG_PER_COULOMB;
use pv_h2_sim::sim::engine::{Engine, run_simulation};
use pv_h2_sim::sim::types::{RunSettings, SimulationConfig, SimulationResult};

#[test]
fn default_run_completes_within_bounds() {
    let result = run_simulation(&common::default_config()).unwrap();

    common::assert_close(result.sim_duration_s, 5.0e-3, 1e-12, "sim_duration_s");
    assert!((0.0..=100.0).contains(&result.uptime_pct));
    assert!((0.0..=100.0).contains(&result.eff_pct));
    assert!(result.h2_kg_window >= 0.0);
    assert!(result.vout_pp_v >= 0.0);
}

#[test]
fn default_run_is_still_charging_the_bus() {
    // 3 A average into 470 uF reaches about 32 V after 5 ms, below the
    // 55 V cutoff, so the electrolyzer never conducts.
    let result = run_simulation(&common::default_config()).unwrap();

    assert!(
        (31.0..31.6).contains(&result.vout_avg_v),
        "vout_avg_v = {}",
        result.vout_avg_v
    );
    // ten periods of 60 uC each into 470 uF
    common::assert_close(result.vout_pp_v, 10.0 * 60e-6 / 470e-6, 1e-6, "vout_pp_v");
    assert!(
        (92.0..96.0).contains(&result.pin_avg_w),
        "pin_avg_w = {}",
        result.pin_avg_w
    );
    assert_eq!(result.pout_avg_w, 0.0);
    assert_eq!(result.eff_pct, 0.0);
    assert_eq!(result.h2_kg_window, 0.0);
    assert_eq!(result.uptime_pct, 0.0);
}

#[test]
fn zero_duty_delivers_nothing() {
    let cfg = common::with_duty(&common::default_config(), 0.0);
    let result = run_simulation(&cfg).unwrap();

    assert_eq!(result.pin_avg_w, 0.0);
    assert_eq!(result.pout_avg_w, 0.0);
    assert_eq!(result.eff_pct, 0.0);
    assert_eq!(result.h2_kg_window, 0.0);
    assert_eq!(result.vout_avg_v, 0.0);
    assert_eq!(result.vout_pp_v, 0.0);
}

#[test]
fn zero_duty_with_zero_cutoff_counts_as_up() {
    let cfg = SimulationConfig {
        min_voltage_v: 0.0,
        ..common::with_duty(&common::default_config(), 0.0)
    };
    let result = run_simulation(&cfg).unwrap();
    assert_eq!(result.uptime_pct, 100.0);
    assert_eq!(result.h2_kg_window, 0.0);
}

#[test]
fn regulated_bus_feeds_the_electrolyzer() {
    let result = run_simulation(&common::steady_state_config()).unwrap();

    // fully up, all input passes to the load over whole periods
    assert_eq!(result.uptime_pct, 100.0);
    assert!(result.vout_avg_v > 55.0 && result.vout_avg_v < 57.5);
    assert!(result.eff_pct > 99.0, "eff_pct = {}", result.eff_pct);
    assert!(result.eff_pct <= 100.0);

    // 3 A average over the 0.2 ms window
    let expected_h2 = 3.0 * 2.0e-4 * H2_KG_PER_COULOMB;
    common::assert_close(
        result.h2_kg_window,
        expected_h2,
        expected_h2 * 1e-3,
        "h2_kg_window",
    );
}

#[test]
fn ideal_sink_clamps_bus_at_cutoff() {
    let cfg = SimulationConfig {
        series_resistance_ohm: 0.0,
        ..common::steady_state_config()
    };
    let result = run_simulation(&cfg).unwrap();

    assert_eq!(result.uptime_pct, 100.0);
    common::assert_close(result.vout_avg_v, 55.0, 1e-6, "vout_avg_v");
    assert!(result.vout_pp_v < 1e-6, "vout_pp_v = {}", result.vout_pp_v);
    assert!(result.h2_kg_window > 0.0);
}

#[test]
fn energy_balance_closes_over_the_window() {
    let engine = Engine::new(common::default_config(), &common::short_settings()).unwrap();
    let window_start = engine.plan().window_start_step();
    let (result, records) = engine.run_recorded().unwrap();

    let first = records
        .iter()
        .find(|r| r.step == window_start)
        .expect("window start step recorded");
    let last = records.last().expect("non-empty run");
    let window_s = 2.0e-4;
    let stored_w = 0.5 * 470e-6 * (last.bus_v.powi(2) - first.bus_start_v.powi(2)) / window_s;

    common::assert_close(
        result.pin_avg_w - result.pout_avg_w,
        stored_w,
        1e-9 * result.pin_avg_w.max(1.0),
        "Pin - Pout",
    );
}

#[test]
fn identical_inputs_give_identical_results() {
    let cfg = common::steady_state_config();
    let a = run_simulation(&cfg).unwrap();
    let b = run_simulation(&cfg).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.vout_avg_v.to_bits(), b.vout_avg_v.to_bits());
}

#[test]
fn concurrent_runs_match_serial_runs() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SimulationConfig>();
    assert_send_sync::<SimulationResult>();

    let configs: Vec<SimulationConfig> = [0.25, 0.5, 0.75, 1.0]
        .iter()
        .map(|&d| common::with_duty(&common::steady_state_config(), d))
        .collect();
    let settings = &common::short_settings();

    let serial: Vec<SimulationResult> = configs
        .iter()
        .map(|c| pv_h2_sim::run_simulation_with(c, settings).unwrap())
        .collect();

    let parallel: Vec<SimulationResult> = std::thread::scope(|s| {
        let handles: Vec<_> = configs
            .iter()
            .map(|c| s.spawn(move || pv_h2_sim::run_simulation_with(c, settings).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(serial, parallel);
}

#[test]
fn horizon_rounds_up_to_whole_periods() {
    let settings = RunSettings {
        duration_s: 1.01e-3,
        ..common::short_settings()
    };
    let result = pv_h2_sim::run_simulation_with(&common::default_config(), &settings).unwrap();
    // 50.5 periods round up to 51
    common::assert_close(result.sim_duration_s, 51.0 * 20e-6, 1e-12, "sim_duration_s");
}
