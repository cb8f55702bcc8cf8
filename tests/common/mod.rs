//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use ev_station_sim::config::ScenarioConfig;
use ev_station_sim::devices::{BreakType, Vehicle, VehicleCategory, VehicleSpec};
use ev_station_sim::sim::policy::PowerPolicy;
use ev_station_sim::sim::types::SimConfig;

/// One-hour ticks over a day, seed 42.
pub fn hourly_config() -> SimConfig {
    SimConfig::new(60, 24, 42)
}

/// Ten-minute ticks over a day, seed 42.
pub fn ten_minute_config() -> SimConfig {
    SimConfig::new(10, 24, 42)
}

/// A 100 kWh vehicle charging from `soc` to `target_soc` within `dwell_ticks`.
pub fn spec(id: usize, soc: f32, target_soc: f32, arrival_tick: usize, dwell_ticks: usize) -> VehicleSpec {
    VehicleSpec {
        id,
        category: VehicleCategory::Internal,
        break_type: BreakType::Long,
        capacity_kwh: 100.0,
        max_charge_kw: 400.0,
        soc,
        arrival_tick,
        target_soc,
        dwell_ticks,
        max_wait_ticks: None,
    }
}

/// Builds a vehicle with the linear power policy.
pub fn linear(spec: VehicleSpec, config: &SimConfig) -> Vehicle {
    Vehicle::new(spec, &PowerPolicy::Linear, config.dt_hours)
}

/// A preset shortened to `hours` of simulated time.
pub fn short_preset(name: &str, hours: u32) -> ScenarioConfig {
    let mut cfg = ScenarioConfig::from_preset(name).expect("preset should exist");
    cfg.simulation.sim_hours = hours;
    cfg
}
