//! The charging station: chargers, optional battery, and visiting vehicles.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::info;

use crate::config::{CategoryParams, ConfigError, ScenarioConfig};
use crate::devices::{
    Charger, FlexBattery, TickContext, Vehicle, VehicleCategory, VehicleSpec, VehicleState,
};
use crate::sampling::{SampleError, Sampler};

use super::types::{AgentRecord, SimConfig, TickRecord};

/// Orchestrates one simulated run.
///
/// Each call to [`Station::tick`] runs the two vehicle phases over the
/// whole population, lets the battery react to the summed charger
/// reservations, and advances `tick_count`. The station never stops on
/// its own; the driver decides how many ticks to run.
#[derive(Debug)]
pub struct Station {
    config: SimConfig,
    chargers: Vec<Charger>,
    battery: Option<FlexBattery>,
    vehicles: Vec<Vehicle>,
    order: Vec<usize>,
    shuffle_rng: Option<StdRng>,
    tick_count: usize,
    power_without_battery_kw: f32,
    total_power_kw: f32,
    running: bool,
}

impl Station {
    /// Builds a station from a scenario, sampling every vehicle up front.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` reported by
    /// [`ScenarioConfig::validate`], or a sampling failure mapped onto the
    /// category whose table could not be sampled.
    pub fn setup(scenario: &ScenarioConfig) -> Result<Self, ConfigError> {
        if let Some(err) = scenario.validate().into_iter().next() {
            return Err(err);
        }

        let sim = &scenario.simulation;
        let config = sim.sim_config();

        let mut chargers = Vec::with_capacity(scenario.charger_count());
        for group in &scenario.chargers {
            for _ in 0..group.count {
                chargers.push(Charger::new(
                    chargers.len(),
                    group.rated_power_kw,
                    group.socket_count,
                ));
            }
        }

        let b = &scenario.battery;
        let battery = b.enabled.then(|| {
            FlexBattery::with_recharge_floor(
                b.capacity_kwh,
                b.initial_soc,
                b.max_power_kw,
                b.station_limit_kw,
                b.recharge_floor_kw(),
                &config,
            )
        });

        let mut sampler = Sampler::new(config.seed);
        let mut vehicles = Vec::with_capacity(scenario.population.total());
        for category in VehicleCategory::ALL {
            let params = scenario.categories.get(category);
            for _ in 0..scenario.population.count(category) {
                let spec =
                    sample_spec(&mut sampler, vehicles.len(), category, params, &config)
                        .map_err(|e| {
                            ConfigError::new(format!("categories.{category}"), e.to_string())
                        })?;
                vehicles.push(Vehicle::new(spec, &sim.power_policy, config.dt_hours));
            }
        }

        info!(
            chargers = chargers.len(),
            vehicles = vehicles.len(),
            battery = battery.is_some(),
            seed = config.seed,
            "station set up"
        );

        let mut station = Self::from_parts(config, chargers, battery, vehicles);
        if sim.shuffle {
            station.shuffle_rng = Some(sampler.into_rng());
        }
        Ok(station)
    }

    /// Assembles a station from prebuilt components, processing vehicles in
    /// the order given.
    pub fn from_parts(
        config: SimConfig,
        chargers: Vec<Charger>,
        battery: Option<FlexBattery>,
        vehicles: Vec<Vehicle>,
    ) -> Self {
        Self {
            order: (0..vehicles.len()).collect(),
            config,
            chargers,
            battery,
            vehicles,
            shuffle_rng: None,
            tick_count: 0,
            power_without_battery_kw: 0.0,
            total_power_kw: 0.0,
            running: true,
        }
    }

    /// Runs one tick and returns the station snapshot for it.
    pub fn tick(&mut self) -> TickRecord {
        let ctx = TickContext {
            tick: self.tick_count,
            dt_hours: self.config.dt_hours,
        };

        if let Some(rng) = self.shuffle_rng.as_mut() {
            self.order.shuffle(rng);
        }

        // Departures from last tick free their power before anyone searches.
        for &i in &self.order {
            self.vehicles[i].release_if_departing(&mut self.chargers);
        }
        for &i in &self.order {
            self.vehicles[i].act(&ctx, &mut self.chargers);
        }

        self.power_without_battery_kw = self.chargers.iter().map(Charger::reserved_power_kw).sum();
        self.total_power_kw = match self.battery.as_mut() {
            Some(battery) => battery.react(self.power_without_battery_kw),
            None => self.power_without_battery_kw,
        };

        self.tick_count += 1;
        self.tick_record()
    }

    /// Snapshot of the most recently processed tick.
    pub fn tick_record(&self) -> TickRecord {
        let tick = self.tick_count.saturating_sub(1);
        TickRecord {
            tick,
            time: self.config.time_label(tick),
            total_power_kw: self.total_power_kw,
            power_without_battery_kw: self.power_without_battery_kw,
            battery_power_kw: self
                .battery
                .as_ref()
                .map_or(0.0, FlexBattery::current_power_kw),
            battery_soc: self.battery.as_ref().map(|b| b.soc),
        }
    }

    /// Per-vehicle snapshots of the most recently processed tick.
    pub fn agent_records(&self) -> Vec<AgentRecord> {
        let tick = self.tick_count.saturating_sub(1);
        let time = self.config.time_label(tick);
        self.vehicles
            .iter()
            .map(|v| {
                let spec = v.spec();
                AgentRecord {
                    tick,
                    time: time.clone(),
                    agent_id: spec.id,
                    soc: v.soc(),
                    arrival_tick: spec.arrival_tick,
                    capacity_kwh: spec.capacity_kwh,
                    max_charge_kw: spec.max_charge_kw,
                    category: spec.category,
                    break_type: spec.break_type,
                    power_kw: v.current_power_kw(),
                    waiting_ticks: v.waiting_ticks(),
                    left_without_charge: v.outcome().left_without_charge(),
                }
            })
            .collect()
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn chargers(&self) -> &[Charger] {
        &self.chargers
    }

    pub fn battery(&self) -> Option<&FlexBattery> {
        self.battery.as_ref()
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    /// Number of ticks processed so far.
    pub fn tick_count(&self) -> usize {
        self.tick_count
    }

    /// Grid draw after the battery reacted in the last tick (kW).
    pub fn total_power_kw(&self) -> f32 {
        self.total_power_kw
    }

    /// Sum of charger reservations in the last tick (kW).
    pub fn power_without_battery_kw(&self) -> f32 {
        self.power_without_battery_kw
    }

    /// Vehicles currently connected to a charger.
    pub fn charging_count(&self) -> usize {
        self.vehicles
            .iter()
            .filter(|v| v.state() == VehicleState::Charging)
            .count()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Marks the run as stopped; further ticks are still possible.
    pub fn halt(&mut self) {
        self.running = false;
    }
}

/// Samples one vehicle's attributes for `category`.
fn sample_spec(
    sampler: &mut Sampler,
    id: usize,
    category: VehicleCategory,
    params: &CategoryParams,
    config: &SimConfig,
) -> Result<VehicleSpec, SampleError> {
    let arrival_tick = sampler.arrival_tick(&params.arrival_weights, config)?;
    let profile = sampler.break_profile(&params.breaks, config.hour_of_day(arrival_tick))?;
    let capacity_kwh = sampler.pick_weighted(&params.capacity_kwh)?;
    let max_charge_kw = sampler.pick_weighted(&params.max_charge_kw)?;
    let soc = sampler.initial_soc(params.initial_soc)?;
    let dwell_ticks = sampler.dwell_ticks(profile, config);

    Ok(VehicleSpec {
        id,
        category,
        break_type: profile.break_type,
        capacity_kwh,
        max_charge_kw,
        soc,
        arrival_tick,
        target_soc: profile.target_soc,
        dwell_ticks,
        max_wait_ticks: params.max_wait_minutes.map(|m| config.minutes_to_ticks(m)),
    })
}
