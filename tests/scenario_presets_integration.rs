use std::path::PathBuf;
use std::process::{Command, Output};

#[derive(Debug)]
struct Report {
    vout_avg_v: f64,
    vout_pp_v: f64,
    uptime_pct: f64,
    h2_kg_window: f64,
}

#[test]
fn scenario_files_run_via_cli_and_produce_distinct_regimes() {
    let baseline = run_and_parse(&["--scenario", "scenarios/baseline.toml"]);
    let steady = run_and_parse(&["--scenario", "scenarios/steady_state.toml"]);
    let two_panels = run_and_parse(&["--scenario", "scenarios/two_panels_fast.toml"]);

    assert!(
        baseline.vout_avg_v < 55.0 && baseline.uptime_pct == 0.0,
        "baseline should still be charging: {baseline:?}"
    );
    assert!(
        steady.uptime_pct == 100.0 && steady.vout_avg_v > 55.0 && steady.h2_kg_window > 0.0,
        "steady_state should be regulated: {steady:?}"
    );
    assert!(
        two_panels.uptime_pct == 100.0,
        "two_panels_fast should be regulated: {two_panels:?}"
    );
    assert!(
        (steady.vout_pp_v - baseline.vout_pp_v).abs() > 0.1,
        "expected ripple to differ: baseline={:.3}, steady={:.3}",
        baseline.vout_pp_v,
        steady.vout_pp_v
    );
}

#[test]
fn presets_match_their_scenario_files() {
    let from_preset = run_and_parse(&["--preset", "steady_state"]);
    let from_file = run_and_parse(&["--scenario", "scenarios/steady_state.toml"]);
    assert_eq!(from_preset.vout_avg_v, from_file.vout_avg_v);
    assert_eq!(from_preset.vout_pp_v, from_file.vout_pp_v);
    assert_eq!(from_preset.h2_kg_window, from_file.h2_kg_window);

    let full = run_and_parse(&["--preset", "full_duty"]);
    assert!(full.vout_pp_v < from_preset.vout_pp_v);
}

#[test]
fn set_override_changes_the_run() {
    let base = run_and_parse(&["--preset", "steady_state"]);
    let more_panels = run_and_parse(&["--preset", "steady_state", "--set", "n_panels=3"]);
    assert!(more_panels.vout_avg_v > base.vout_avg_v);
}

#[test]
fn invalid_parameters_exit_with_error() {
    let output = run(&["--set", "Ton_us=30"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("converter.Ton_us"), "stderr: {stderr}");

    let output = run(&["--set", "Cbus_uF=0"]);
    assert!(!output.status.success());

    let output = run(&["--preset", "does_not_exist"]);
    assert!(!output.status.success());

    let output = run(&["--set", "Lmag_uH=3"]);
    assert!(!output.status.success());
}

#[test]
fn csv_exports_are_written() {
    let dir = std::env::temp_dir().join(format!("pv-h2-sim-cli-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let summary: PathBuf = dir.join("summary.csv");
    let trajectory: PathBuf = dir.join("trajectory.csv");

    let output = run(&[
        "--scenario",
        "scenarios/two_panels_fast.toml",
        "--summary-out",
        summary.to_str().unwrap(),
        "--trajectory-out",
        trajectory.to_str().unwrap(),
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let summary_text = std::fs::read_to_string(&summary).unwrap();
    let mut lines = summary_text.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("n_panels,vout_avg_V"), "header: {header}");
    assert!(lines.next().unwrap().starts_with("2,"));

    // 100 periods of 100 steps plus the header
    let trajectory_text = std::fs::read_to_string(&trajectory).unwrap();
    assert_eq!(trajectory_text.lines().count(), 10_001);

    std::fs::remove_dir_all(&dir).ok();
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pv-h2-sim"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("pv-h2-sim process should run")
}

fn run_and_parse(args: &[&str]) -> Report {
    let output = run(args);
    assert!(
        output.status.success(),
        "run failed for {args:?}: stderr={} ",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout should be valid UTF-8");
    Report {
        vout_avg_v: parse_metric(&stdout, "vout_avg_V", "V"),
        vout_pp_v: parse_metric(&stdout, "vout_pp_V", "V"),
        uptime_pct: parse_metric(&stdout, "uptime_pct", "%"),
        h2_kg_window: parse_metric(&stdout, "H2_kg_window", "kg"),
    }
}

fn parse_metric(stdout: &str, label: &str, unit: &str) -> f64 {
    let line = stdout
        .lines()
        .find(|line| line.trim_start().starts_with(label))
        .unwrap_or_else(|| panic!("missing metric line `{label}` in output: {stdout}"));

    let raw = line
        .split_once('=')
        .map(|(_, right)| right.trim())
        .unwrap_or_else(|| panic!("invalid metric format for line `{line}`"));

    let numeric = raw.strip_suffix(unit).unwrap_or(raw).trim();
    numeric
        .parse::<f64>()
        .unwrap_or_else(|_| panic!("failed parsing `{numeric}` from metric line `{line}`"))
}
