//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::devices::{BreakType, VehicleCategory};
use crate::sim::policy::PowerPolicy;
use crate::sim::types::SimConfig;

/// Top-level scenario configuration parsed from TOML.
///
/// All sections have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Simulation timing and global parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Number of vehicles per category.
    #[serde(default)]
    pub population: PopulationConfig,
    /// Charger groups installed at the station.
    #[serde(default = "default_chargers")]
    pub chargers: Vec<ChargerConfig>,
    /// Flexibility battery parameters.
    #[serde(default)]
    pub battery: BatteryConfig,
    /// Per-category sampling tables.
    #[serde(default)]
    pub categories: CategoriesConfig,
}

/// Simulation timing and global parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Simulated minutes per tick (must divide 60).
    pub tick_resolution_minutes: u32,
    /// Simulated horizon in hours.
    pub sim_hours: u32,
    /// Master random seed.
    pub seed: u64,
    /// Shuffle the vehicle processing order every tick (seeded).
    pub shuffle: bool,
    /// How vehicles derive their desired charging power.
    pub power_policy: PowerPolicy,
    /// Repetitions per scenario in batch mode.
    pub repetitions: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_resolution_minutes: 10,
            sim_hours: 24,
            seed: 42,
            shuffle: false,
            power_policy: PowerPolicy::Linear,
            repetitions: 1,
        }
    }
}

impl SimulationConfig {
    /// Timing configuration for the run.
    ///
    /// # Panics
    ///
    /// Panics on timing values that [`ScenarioConfig::validate`] rejects.
    pub fn sim_config(&self) -> SimConfig {
        SimConfig::new(self.tick_resolution_minutes, self.sim_hours, self.seed)
    }
}

/// Number of vehicles per category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PopulationConfig {
    pub fast_charge: usize,
    #[serde(rename = "break")]
    pub break_stop: usize,
    pub depot: usize,
    pub internal: usize,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            fast_charge: 6,
            break_stop: 1,
            depot: 1,
            internal: 15,
        }
    }
}

impl PopulationConfig {
    /// Vehicle count for `category`.
    pub fn count(&self, category: VehicleCategory) -> usize {
        match category {
            VehicleCategory::FastCharge => self.fast_charge,
            VehicleCategory::Break => self.break_stop,
            VehicleCategory::Depot => self.depot,
            VehicleCategory::Internal => self.internal,
        }
    }

    /// Total vehicle count.
    pub fn total(&self) -> usize {
        VehicleCategory::ALL.iter().map(|c| self.count(*c)).sum()
    }
}

/// A group of identical chargers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChargerConfig {
    /// Rated power shared by the sockets (kW).
    pub rated_power_kw: f32,
    /// Sockets per charger.
    pub socket_count: usize,
    /// Number of chargers in the group.
    #[serde(default = "default_charger_count")]
    pub count: usize,
}

fn default_charger_count() -> usize {
    1
}

fn default_chargers() -> Vec<ChargerConfig> {
    vec![ChargerConfig {
        rated_power_kw: 350.0,
        socket_count: 4,
        count: 4,
    }]
}

/// Flexibility battery parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// Whether the station has a flexibility battery.
    pub enabled: bool,
    /// Energy capacity (kWh).
    pub capacity_kwh: f32,
    /// Charge and discharge power ceiling (kW).
    pub max_power_kw: f32,
    /// Initial state of charge (percent).
    pub initial_soc: f32,
    /// Station load above which the battery discharges (kW).
    pub station_limit_kw: f32,
    /// Station load below which the battery recharges (kW, defaults to half the limit).
    pub recharge_below_kw: Option<f32>,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            capacity_kwh: 150.0,
            max_power_kw: 150.0,
            initial_soc: 100.0,
            station_limit_kw: 700.0,
            recharge_below_kw: None,
        }
    }
}

impl BatteryConfig {
    /// Effective recharge floor (kW).
    pub fn recharge_floor_kw(&self) -> f32 {
        self.recharge_below_kw.unwrap_or(self.station_limit_kw / 2.0)
    }
}

/// A discrete value with a sampling weight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeightedValue {
    pub value: f32,
    pub weight: f32,
}

const fn wv(value: f32, weight: f32) -> WeightedValue {
    WeightedValue { value, weight }
}

/// Gamma distribution parameters for the initial state of charge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GammaParams {
    pub shape: f32,
    pub scale: f32,
}

/// A kind of stop with its dwell range and target state of charge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BreakProfile {
    pub break_type: BreakType,
    /// Base sampling weight.
    pub weight: f32,
    /// Optional 24 multipliers applied by hour of arrival.
    #[serde(default)]
    pub hourly_weights: Option<Vec<f32>>,
    /// Shortest stay (minutes).
    pub dwell_minutes_min: u32,
    /// Longest stay (minutes).
    pub dwell_minutes_max: u32,
    /// State of charge at which the vehicle leaves (percent).
    pub target_soc: f32,
}

impl BreakProfile {
    /// Sampling weight for a vehicle arriving during `hour`.
    pub fn weight_at(&self, hour: usize) -> f32 {
        let factor = self
            .hourly_weights
            .as_ref()
            .and_then(|w| w.get(hour % 24).copied())
            .unwrap_or(1.0);
        self.weight * factor
    }
}

/// Sampling table for one vehicle category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryParams {
    /// Battery capacities (kWh).
    pub capacity_kwh: Vec<WeightedValue>,
    /// Vehicle charging ceilings (kW).
    pub max_charge_kw: Vec<WeightedValue>,
    /// 24 hourly arrival weights.
    pub arrival_weights: Vec<f32>,
    /// Stop kinds the category makes.
    pub breaks: Vec<BreakProfile>,
    /// Minutes waited for a charger before leaving, if the category ever leaves.
    #[serde(default)]
    pub max_wait_minutes: Option<u32>,
    /// Initial state of charge distribution.
    pub initial_soc: GammaParams,
}

/// Sampling tables for every category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CategoriesConfig {
    pub fast_charge: CategoryParams,
    #[serde(rename = "break")]
    pub break_stop: CategoryParams,
    pub depot: CategoryParams,
    pub internal: CategoryParams,
}

impl CategoriesConfig {
    /// Table for `category`.
    pub fn get(&self, category: VehicleCategory) -> &CategoryParams {
        match category {
            VehicleCategory::FastCharge => &self.fast_charge,
            VehicleCategory::Break => &self.break_stop,
            VehicleCategory::Depot => &self.depot,
            VehicleCategory::Internal => &self.internal,
        }
    }
}

/// Evening-heavy arrivals for vehicles parking overnight.
const DEPOT_ARRIVALS: [f32; 24] = [
    1.0, 1.0, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 1.0, 1.0, 1.0, 2.0, 3.0, 5.0, 6.0,
    6.0, 5.0, 3.0, 2.0, 1.0,
];

/// Multipliers favouring overnight rests for break vehicles.
const NIGHT_REST: [f32; 24] = [
    4.0, 4.0, 3.0, 2.0, 1.0, 0.5, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.5,
    1.0, 2.0, 3.0, 4.0, 4.0,
];

impl Default for CategoriesConfig {
    fn default() -> Self {
        let external_capacity = vec![wv(100.0, 1.0), wv(150.0, 2.0), wv(200.0, 1.0)];
        let external_charge = vec![wv(150.0, 1.0), wv(200.0, 2.0), wv(250.0, 1.0)];
        Self {
            fast_charge: CategoryParams {
                capacity_kwh: external_capacity.clone(),
                max_charge_kw: external_charge.clone(),
                arrival_weights: vec![1.0; 24],
                breaks: vec![BreakProfile {
                    break_type: BreakType::Short,
                    weight: 1.0,
                    hourly_weights: None,
                    dwell_minutes_min: 20,
                    dwell_minutes_max: 40,
                    target_soc: 80.0,
                }],
                max_wait_minutes: Some(15),
                initial_soc: GammaParams {
                    shape: 2.0,
                    scale: 10.0,
                },
            },
            break_stop: CategoryParams {
                capacity_kwh: external_capacity,
                max_charge_kw: external_charge,
                arrival_weights: [1.0, 7.0].repeat(12),
                breaks: vec![
                    BreakProfile {
                        break_type: BreakType::Short,
                        weight: 3.0,
                        hourly_weights: None,
                        dwell_minutes_min: 45,
                        dwell_minutes_max: 60,
                        target_soc: 80.0,
                    },
                    BreakProfile {
                        break_type: BreakType::Long,
                        weight: 1.0,
                        hourly_weights: Some(NIGHT_REST.to_vec()),
                        dwell_minutes_min: 540,
                        dwell_minutes_max: 660,
                        target_soc: 100.0,
                    },
                ],
                max_wait_minutes: Some(20),
                initial_soc: GammaParams {
                    shape: 2.0,
                    scale: 10.0,
                },
            },
            depot: CategoryParams {
                capacity_kwh: vec![wv(200.0, 1.0), wv(250.0, 2.0), wv(300.0, 1.0)],
                max_charge_kw: vec![wv(200.0, 1.0), wv(250.0, 2.0), wv(350.0, 1.0)],
                arrival_weights: DEPOT_ARRIVALS.to_vec(),
                breaks: vec![BreakProfile {
                    break_type: BreakType::Long,
                    weight: 1.0,
                    hourly_weights: None,
                    dwell_minutes_min: 480,
                    dwell_minutes_max: 720,
                    target_soc: 100.0,
                }],
                max_wait_minutes: None,
                initial_soc: GammaParams {
                    shape: 2.0,
                    scale: 12.0,
                },
            },
            internal: CategoryParams {
                capacity_kwh: vec![wv(250.0, 1.0), wv(300.0, 2.0), wv(350.0, 1.0)],
                max_charge_kw: vec![wv(350.0, 1.0), wv(400.0, 2.0), wv(450.0, 1.0)],
                arrival_weights: vec![1.0; 24],
                breaks: vec![
                    BreakProfile {
                        break_type: BreakType::Medium,
                        weight: 3.0,
                        hourly_weights: None,
                        dwell_minutes_min: 60,
                        dwell_minutes_max: 180,
                        target_soc: 90.0,
                    },
                    BreakProfile {
                        break_type: BreakType::Long,
                        weight: 2.0,
                        hourly_weights: None,
                        dwell_minutes_min: 360,
                        dwell_minutes_max: 600,
                        target_soc: 100.0,
                    },
                ],
                max_wait_minutes: None,
                initial_soc: GammaParams {
                    shape: 3.0,
                    scale: 10.0,
                },
            },
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.tick_resolution_minutes"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario: four 350 kW chargers, no battery.
    pub fn baseline() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            population: PopulationConfig::default(),
            chargers: default_chargers(),
            battery: BatteryConfig::default(),
            categories: CategoriesConfig::default(),
        }
    }

    /// Returns the flexibility preset: baseline plus a peak-shaving battery.
    pub fn flex() -> Self {
        Self {
            battery: BatteryConfig {
                enabled: true,
                ..BatteryConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Returns the congested preset: more vehicles than two mixed chargers can serve.
    pub fn congested() -> Self {
        Self {
            population: PopulationConfig {
                fast_charge: 20,
                break_stop: 8,
                depot: 4,
                internal: 15,
            },
            chargers: vec![
                ChargerConfig {
                    rated_power_kw: 350.0,
                    socket_count: 2,
                    count: 1,
                },
                ChargerConfig {
                    rated_power_kw: 150.0,
                    socket_count: 2,
                    count: 1,
                },
            ],
            battery: BatteryConfig {
                enabled: true,
                station_limit_kw: 400.0,
                ..BatteryConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "flex", "congested"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "flex" => Ok(Self::flex()),
            "congested" => Ok(Self::congested()),
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

    /// Returns a copy with the flexibility battery switched on or off.
    pub fn with_battery(&self, enabled: bool) -> Self {
        let mut cfg = self.clone();
        cfg.battery.enabled = enabled;
        cfg
    }

    /// Total number of chargers across all groups.
    pub fn charger_count(&self) -> usize {
        self.chargers.iter().map(|c| c.count).sum()
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let s = &self.simulation;
        if s.tick_resolution_minutes == 0 || 60 % s.tick_resolution_minutes != 0 {
            errors.push(ConfigError::new(
                "simulation.tick_resolution_minutes",
                format!("must divide 60, got {}", s.tick_resolution_minutes),
            ));
        }
        if s.sim_hours == 0 {
            errors.push(ConfigError::new("simulation.sim_hours", "must be > 0"));
        }
        if s.repetitions == 0 {
            errors.push(ConfigError::new("simulation.repetitions", "must be > 0"));
        }
        if let PowerPolicy::Scaled { factor } = s.power_policy {
            if !is_positive(factor) {
                errors.push(ConfigError::new("simulation.power_policy.factor", "must be > 0"));
            }
        }

        for (i, c) in self.chargers.iter().enumerate() {
            if !is_positive(c.rated_power_kw) {
                errors.push(ConfigError::new(
                    format!("chargers[{i}].rated_power_kw"),
                    "must be > 0",
                ));
            }
            if c.socket_count == 0 {
                errors.push(ConfigError::new(
                    format!("chargers[{i}].socket_count"),
                    "must be > 0",
                ));
            }
            if c.count == 0 {
                errors.push(ConfigError::new(format!("chargers[{i}].count"), "must be > 0"));
            }
        }

        let b = &self.battery;
        if b.enabled {
            if !is_positive(b.capacity_kwh) {
                errors.push(ConfigError::new("battery.capacity_kwh", "must be > 0"));
            }
            if !is_positive(b.max_power_kw) {
                errors.push(ConfigError::new("battery.max_power_kw", "must be > 0"));
            }
            if !(0.0..=100.0).contains(&b.initial_soc) {
                errors.push(ConfigError::new("battery.initial_soc", "must be in [0, 100]"));
            }
            if !(b.station_limit_kw >= 0.0 && b.station_limit_kw.is_finite()) {
                errors.push(ConfigError::new("battery.station_limit_kw", "must be >= 0"));
            }
            if !(0.0..=b.station_limit_kw).contains(&b.recharge_floor_kw()) {
                errors.push(ConfigError::new(
                    "battery.recharge_below_kw",
                    "must be in [0, battery.station_limit_kw]",
                ));
            }
        }

        for category in VehicleCategory::ALL {
            validate_category(
                &format!("categories.{category}"),
                self.categories.get(category),
                &mut errors,
            );
        }

        errors
    }
}

/// Finite and strictly positive; rejects NaN.
fn is_positive(v: f32) -> bool {
    v > 0.0 && v.is_finite()
}

fn validate_weighted(field: &str, options: &[WeightedValue], errors: &mut Vec<ConfigError>) {
    if options.is_empty() {
        errors.push(ConfigError::new(field, "needs at least one option"));
        return;
    }
    if options.iter().any(|o| !is_positive(o.value)) {
        errors.push(ConfigError::new(field, "values must be > 0"));
    }
    validate_weights(field, options.iter().map(|o| o.weight), errors);
}

fn validate_weights(
    field: &str,
    weights: impl Iterator<Item = f32>,
    errors: &mut Vec<ConfigError>,
) {
    let mut sum = 0.0;
    for w in weights {
        if !(w >= 0.0 && w.is_finite()) {
            errors.push(ConfigError::new(field, "weights must be finite and >= 0"));
            return;
        }
        sum += w;
    }
    if sum <= 0.0 {
        errors.push(ConfigError::new(field, "weights must not all be zero"));
    }
}

fn validate_hourly(field: &str, weights: &[f32], errors: &mut Vec<ConfigError>) {
    if weights.len() != 24 {
        errors.push(ConfigError::new(
            field,
            format!("must have 24 hourly weights, got {}", weights.len()),
        ));
        return;
    }
    validate_weights(field, weights.iter().copied(), errors);
}

fn validate_category(prefix: &str, params: &CategoryParams, errors: &mut Vec<ConfigError>) {
    validate_weighted(&format!("{prefix}.capacity_kwh"), &params.capacity_kwh, errors);
    validate_weighted(&format!("{prefix}.max_charge_kw"), &params.max_charge_kw, errors);
    validate_hourly(
        &format!("{prefix}.arrival_weights"),
        &params.arrival_weights,
        errors,
    );

    if params.breaks.is_empty() {
        errors.push(ConfigError::new(
            format!("{prefix}.breaks"),
            "needs at least one break profile",
        ));
    }
    for (i, b) in params.breaks.iter().enumerate() {
        let field = format!("{prefix}.breaks[{i}]");
        if !(b.weight >= 0.0 && b.weight.is_finite()) {
            errors.push(ConfigError::new(format!("{field}.weight"), "must be >= 0"));
        }
        if let Some(hourly) = &b.hourly_weights {
            validate_hourly(&format!("{field}.hourly_weights"), hourly, errors);
        }
        if b.dwell_minutes_min == 0 {
            errors.push(ConfigError::new(
                format!("{field}.dwell_minutes_min"),
                "must be > 0",
            ));
        }
        if b.dwell_minutes_max < b.dwell_minutes_min {
            errors.push(ConfigError::new(
                format!("{field}.dwell_minutes_max"),
                "must be >= dwell_minutes_min",
            ));
        }
        if !(b.target_soc > 0.0 && b.target_soc <= 100.0) {
            errors.push(ConfigError::new(
                format!("{field}.target_soc"),
                "must be in (0, 100]",
            ));
        }
    }
    if !params.breaks.is_empty()
        && (0..24).all(|h| params.breaks.iter().all(|b| b.weight_at(h) <= 0.0))
    {
        errors.push(ConfigError::new(
            format!("{prefix}.breaks"),
            "break weights must not all be zero",
        ));
    }

    let g = params.initial_soc;
    if !(g.shape > 0.0 && g.scale > 0.0) {
        errors.push(ConfigError::new(
            format!("{prefix}.initial_soc"),
            "shape and scale must be > 0",
        ));
    }
}
