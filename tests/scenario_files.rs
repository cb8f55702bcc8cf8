//! Shipped scenario files load, validate, and run through the CLI.

use std::path::Path;
use std::process::Command;

use ev_station_sim::config::ScenarioConfig;

const SCENARIOS: &[&str] = &[
    "scenarios/baseline.toml",
    "scenarios/flex.toml",
    "scenarios/congested.toml",
];

#[test]
fn scenario_files_are_valid() {
    for path in SCENARIOS {
        let cfg = ScenarioConfig::from_toml_file(Path::new(path))
            .unwrap_or_else(|e| panic!("{path} should parse: {e}"));
        let errors = cfg.validate();
        assert!(errors.is_empty(), "{path} should be valid: {errors:?}");
    }
}

#[test]
fn battery_never_raises_the_peak() {
    let baseline = run_and_parse("scenarios/baseline.toml");
    let flex = run_and_parse("scenarios/flex.toml");

    // Vehicles do not see the battery, so the load before it is identical.
    assert!(
        (baseline.peak_without_battery - flex.peak_without_battery).abs() < 1e-2,
        "load before battery differs: baseline={:.2}, flex={:.2}",
        baseline.peak_without_battery,
        flex.peak_without_battery
    );
    assert!(
        flex.peak <= baseline.peak + 1e-2,
        "battery raised the peak: baseline={:.2}, flex={:.2}",
        baseline.peak,
        flex.peak
    );
}

#[test]
fn unknown_preset_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_ev-station-sim"))
        .args(["--preset", "nope"])
        .output()
        .expect("ev-station-sim process should run");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown preset"));
}

#[derive(Debug)]
struct Peaks {
    peak: f64,
    peak_without_battery: f64,
}

fn run_and_parse(path: &str) -> Peaks {
    let output = Command::new(env!("CARGO_BIN_EXE_ev-station-sim"))
        .args(["--scenario", path])
        .env("RUST_LOG", "warn")
        .output()
        .expect("ev-station-sim process should run");

    assert!(
        output.status.success(),
        "scenario run failed for {path}: stderr={} ",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout should be valid UTF-8");
    Peaks {
        peak: parse_metric(&stdout, "Peak station power:", "kW"),
        peak_without_battery: parse_metric(&stdout, "Peak before battery:", "kW"),
    }
}

fn parse_metric(stdout: &str, label: &str, unit: &str) -> f64 {
    let line = stdout
        .lines()
        .find(|line| line.trim_start().starts_with(label))
        .unwrap_or_else(|| panic!("missing KPI line `{label}` in output: {stdout}"));

    let raw = line
        .split_once(':')
        .map(|(_, right)| right.trim())
        .unwrap_or_else(|| panic!("invalid KPI format for line `{line}`"));

    let numeric = raw.strip_suffix(unit).unwrap_or(raw).trim();
    numeric
        .parse::<f64>()
        .unwrap_or_else(|_| panic!("failed parsing `{numeric}` from KPI line `{line}`"))
}
