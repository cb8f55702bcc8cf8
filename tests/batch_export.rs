//! Batch isolation and CSV export of batch results.

mod common;

use std::fs;

use ev_station_sim::io::export::export_batch;
use ev_station_sim::sim::batch::{BatchPlan, BatchVariant, run_batch};

#[test]
fn invalid_variant_is_reported_alongside_valid_runs() {
    let good = common::short_preset("baseline", 6);
    let mut bad = good.clone();
    bad.categories.depot.arrival_weights = vec![1.0; 12];

    let plan = BatchPlan {
        variants: vec![
            BatchVariant {
                name: "good".to_string(),
                scenario: good.clone(),
            },
            BatchVariant {
                name: "bad".to_string(),
                scenario: bad,
            },
            BatchVariant {
                name: "good_again".to_string(),
                scenario: good,
            },
        ],
        record_agents: false,
    }
    .with_repetitions(2);

    let runs = run_batch(&plan);
    assert_eq!(runs.len(), 6);
    for run in &runs {
        match run.run_id.as_str() {
            "bad" => {
                let err = run.result.as_ref().unwrap_err();
                assert_eq!(err.field, "categories.depot.arrival_weights");
                assert!(err.to_string().contains("24"));
            }
            _ => assert!(run.result.is_ok(), "{} should succeed", run.run_id),
        }
    }
}

#[test]
fn export_writes_every_successful_run() {
    let scenario = common::short_preset("flex", 4);
    let vehicles = scenario.population.total();
    let ticks = 4 * 6;
    let runs = run_batch(&BatchPlan::flex_comparison(&scenario));

    let dir = std::env::temp_dir().join(format!("ev-station-sim-export-{}", std::process::id()));
    let (agent_path, station_path) = export_batch(&runs, &dir).unwrap();

    let agents = fs::read_to_string(&agent_path).unwrap();
    let mut lines = agents.lines();
    assert_eq!(
        lines.next(),
        Some("RunId,iteration,Step,Time,AgentID,Soc,Arrival,Capacity,MaxCharge,Type,BreakType,power,Waiting,Charged")
    );
    assert_eq!(lines.count(), 2 * ticks * vehicles);

    let station = fs::read_to_string(&station_path).unwrap();
    assert_eq!(station.lines().count(), 1 + 2 * ticks);
    assert!(station.lines().nth(1).unwrap().starts_with("without_battery,0,0,00:00,"));
    assert!(
        station
            .lines()
            .nth(1 + ticks)
            .unwrap()
            .starts_with("with_battery,0,0,00:00,")
    );

    fs::remove_dir_all(&dir).ok();
}
