//! EV charging station simulator entry point: CLI wiring and batch execution.

use std::path::Path;
use std::process;

use ev_station_sim::config::ScenarioConfig;
use ev_station_sim::io::export::export_batch;
use ev_station_sim::logging;
use ev_station_sim::sim::batch::{BatchPlan, BatchRun, run_batch};

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    seed_override: Option<u64>,
    repetitions: Option<usize>,
    compare_flex: bool,
    telemetry_out: Option<String>,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: u16,
}

fn print_help() {
    eprintln!("ev-station-sim: EV charging station simulator");
    eprintln!();
    eprintln!("Usage: ev-station-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!(
        "  --preset <name>          Use a built-in preset ({})",
        ScenarioConfig::PRESETS.join(", ")
    );
    eprintln!("  --seed <u64>             Override random seed");
    eprintln!("  --repetitions <n>        Override repetitions per scenario");
    eprintln!("  --compare-flex           Run with and without the flexibility battery");
    eprintln!("  --telemetry-out <dir>    Export agent and station records as CSV");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Start REST API server after simulation");
        eprintln!("  --port <u16>             API server port (default: 3000)");
    }
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
    eprintln!("Log verbosity follows RUST_LOG (default: info).");
}

/// Returns the value following flag `name`, exiting if it is missing.
fn flag_value<'a>(args: &'a [String], i: &mut usize, name: &str, what: &str) -> &'a str {
    *i += 1;
    match args.get(*i) {
        Some(v) => v.as_str(),
        None => {
            eprintln!("error: {name} requires {what}");
            process::exit(1);
        }
    }
}

/// Parses `raw` or exits with a message naming the flag.
fn parse_or_exit<T: std::str::FromStr>(raw: &str, name: &str, ty: &str) -> T {
    raw.parse::<T>().unwrap_or_else(|_| {
        eprintln!("error: {name} value \"{raw}\" is not a valid {ty}");
        process::exit(1);
    })
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        seed_override: None,
        repetitions: None,
        compare_flex: false,
        telemetry_out: None,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                cli.scenario_path =
                    Some(flag_value(&args, &mut i, "--scenario", "a path argument").to_string());
            }
            "--preset" => {
                cli.preset =
                    Some(flag_value(&args, &mut i, "--preset", "a name argument").to_string());
            }
            "--seed" => {
                let raw = flag_value(&args, &mut i, "--seed", "a u64 argument");
                cli.seed_override = Some(parse_or_exit(raw, "--seed", "u64"));
            }
            "--repetitions" => {
                let raw = flag_value(&args, &mut i, "--repetitions", "a count argument");
                cli.repetitions = Some(parse_or_exit(raw, "--repetitions", "count"));
            }
            "--compare-flex" => {
                cli.compare_flex = true;
            }
            "--telemetry-out" => {
                cli.telemetry_out = Some(
                    flag_value(&args, &mut i, "--telemetry-out", "a directory argument")
                        .to_string(),
                );
            }
            #[cfg(feature = "api")]
            "--serve" => {
                cli.serve = true;
            }
            #[cfg(feature = "api")]
            "--port" => {
                let raw = flag_value(&args, &mut i, "--port", "a u16 argument");
                cli.port = parse_or_exit(raw, "--port", "u16");
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

/// Loads the scenario and the name its runs are reported under.
fn load_scenario(cli: &CliArgs) -> (String, ScenarioConfig) {
    // --scenario takes priority, then --preset, then the baseline default
    let loaded = if let Some(ref path) = cli.scenario_path {
        let path = Path::new(path);
        let name = path
            .file_stem()
            .map_or_else(|| "scenario".to_string(), |s| s.to_string_lossy().into_owned());
        ScenarioConfig::from_toml_file(path).map(|cfg| (name, cfg))
    } else if let Some(ref name) = cli.preset {
        ScenarioConfig::from_preset(name).map(|cfg| (name.clone(), cfg))
    } else {
        Ok(("baseline".to_string(), ScenarioConfig::baseline()))
    };

    loaded.unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    })
}

fn print_runs(runs: &[BatchRun]) -> usize {
    let mut failures = 0;
    for run in runs {
        match &run.result {
            Ok(output) => {
                println!(
                    "=== {} #{} (seed {}) ===",
                    run.run_id, run.iteration, output.seed
                );
                println!("{}\n", output.kpi);
            }
            Err(e) => {
                failures += 1;
                eprintln!("error: run {} #{} failed: {e}", run.run_id, run.iteration);
            }
        }
    }
    failures
}

fn main() {
    logging::init();
    let cli = parse_args();
    let (name, mut scenario) = load_scenario(&cli);

    if let Some(seed) = cli.seed_override {
        scenario.simulation.seed = seed;
    }
    if let Some(repetitions) = cli.repetitions {
        scenario.simulation.repetitions = repetitions;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let plan = if cli.compare_flex {
        BatchPlan::flex_comparison(&scenario)
    } else {
        BatchPlan::single(name, scenario.clone())
    };
    let runs = run_batch(&plan);

    // Per-tick trace only makes sense for a single run.
    if let [run] = runs.as_slice() {
        if let Ok(output) = &run.result {
            for r in &output.ticks {
                println!("{r}");
            }
            println!();
        }
    }

    let failures = print_runs(&runs);

    if let Some(ref dir) = cli.telemetry_out {
        match export_batch(&runs, Path::new(dir)) {
            Ok((agents, station)) => eprintln!(
                "Records written to {} and {}",
                agents.display(),
                station.display()
            ),
            Err(e) => {
                eprintln!("error: failed to write CSV: {e}");
                process::exit(1);
            }
        }
    }

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let Some(output) = runs.into_iter().find_map(|r| r.result.ok()) else {
            eprintln!("error: no successful run to serve");
            process::exit(1);
        };
        let state = Arc::new(ev_station_sim::api::AppState {
            config: scenario.simulation.sim_config(),
            kpi: output.kpi,
            ticks: output.ticks,
            agents: output.agents,
        });
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        });
        if let Err(e) = rt.block_on(ev_station_sim::api::serve(state, addr)) {
            eprintln!("error: API server failed: {e}");
            process::exit(1);
        }
    }

    if failures > 0 {
        process::exit(1);
    }
}
