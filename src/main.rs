//! pv-h2-sim entry point: CLI wiring and config-driven engine construction.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::process;

use tracing_subscriber::EnvFilter;

use pv_h2_sim::config::ScenarioConfig;
use pv_h2_sim::io::export::{SummaryRow, TrajectoryWriter, export_summary_csv};
use pv_h2_sim::sim::engine::Engine;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    overrides: Vec<(String, String)>,
    trajectory_out: Option<String>,
    summary_out: Option<String>,
}

fn print_help() {
    eprintln!("pv-h2-sim: PV-fed PWM converter and electrolyzer bus simulator");
    eprintln!();
    eprintln!("Usage: pv-h2-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!("  --preset <name>          Use a built-in preset (baseline, steady_state, full_duty)");
    eprintln!("  --set <name>=<value>     Override a converter parameter (e.g. Ton_us=10)");
    eprintln!("  --trajectory-out <path>  Export per-step trajectory to CSV");
    eprintln!("  --summary-out <path>     Export one-row run summary to CSV");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
    eprintln!("Log verbosity follows RUST_LOG (default: info).");
}

fn require_value(args: &[String], i: usize, flag: &str, what: &str) -> String {
    match args.get(i) {
        Some(v) => v.clone(),
        None => {
            eprintln!("error: {flag} requires {what}");
            process::exit(1);
        }
    }
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        overrides: Vec::new(),
        trajectory_out: None,
        summary_out: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                i += 1;
                cli.scenario_path = Some(require_value(&args, i, "--scenario", "a path argument"));
            }
            "--preset" => {
                i += 1;
                cli.preset = Some(require_value(&args, i, "--preset", "a name argument"));
            }
            "--set" => {
                i += 1;
                let pair = require_value(&args, i, "--set", "a <name>=<value> argument");
                match pair.split_once('=') {
                    Some((name, value)) => {
                        cli.overrides.push((name.trim().to_string(), value.to_string()));
                    }
                    None => {
                        eprintln!("error: --set value \"{pair}\" is not <name>=<value>");
                        process::exit(1);
                    }
                }
            }
            "--trajectory-out" => {
                i += 1;
                cli.trajectory_out =
                    Some(require_value(&args, i, "--trajectory-out", "a path argument"));
            }
            "--summary-out" => {
                i += 1;
                cli.summary_out = Some(require_value(&args, i, "--summary-out", "a path argument"));
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    if cli.scenario_path.is_some() && cli.preset.is_some() {
        eprintln!("error: --scenario and --preset are mutually exclusive; choose one source");
        process::exit(1);
    }

    cli
}

fn open_trajectory(path: &str) -> std::io::Result<TrajectoryWriter<BufWriter<File>>> {
    TrajectoryWriter::new(BufWriter::new(File::create(path)?))
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = parse_args();
    init_tracing();

    // Load config: --scenario takes priority, then --preset, then baseline default
    let mut scenario = if let Some(ref path) = cli.scenario_path {
        match ScenarioConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match ScenarioConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        ScenarioConfig::baseline()
    };

    // Apply parameter overrides
    for (name, value) in &cli.overrides {
        if let Err(e) = scenario.converter.set(name, value) {
            eprintln!("{}", e.within("converter"));
            process::exit(1);
        }
    }

    // Validate
    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    // Build and run, streaming the trajectory if requested
    let sim_config = scenario.simulation_config();
    let engine = match Engine::new(sim_config.clone(), &scenario.run_settings()) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("error: run_simulation failed with code {}: {e}", e.code());
            process::exit(1);
        }
    };

    let mut trajectory = match cli.trajectory_out.as_deref().map(open_trajectory) {
        Some(Ok(writer)) => Some(writer),
        Some(Err(e)) => {
            eprintln!("error: failed to open trajectory CSV: {e}");
            process::exit(1);
        }
        None => None,
    };
    let mut write_error: Option<std::io::Error> = None;

    let outcome = engine.run_with(|record| {
        let Some(wtr) = trajectory.as_mut() else {
            return;
        };
        if write_error.is_none() {
            if let Err(e) = wtr.write(&record) {
                write_error = Some(e);
            }
        }
    });
    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            eprintln!("error: run_simulation failed with code {}: {e}", e.code());
            process::exit(1);
        }
    };

    println!("{result}");

    if let Some(wtr) = trajectory {
        if let Some(e) = write_error.or_else(|| wtr.finish().err()) {
            eprintln!("error: failed to write trajectory CSV: {e}");
            process::exit(1);
        }
        if let Some(ref path) = cli.trajectory_out {
            eprintln!("Trajectory written to {path}");
        }
    }

    if let Some(ref path) = cli.summary_out {
        let row = SummaryRow::new(&sim_config, &result);
        if let Err(e) = export_summary_csv(&row, Path::new(path)) {
            eprintln!("error: failed to write summary CSV: {e}");
            process::exit(1);
        }
        eprintln!("Summary written to {path}");
    }
}
