//! Core simulation types: timing configuration and per-tick records.

use std::fmt;

use serde::Serialize;

use crate::devices::{BreakType, VehicleCategory};

/// Centralized timing configuration for one simulated run.
///
/// Every component that converts between power and energy reads
/// `dt_hours` from here instead of recomputing it.
///
/// # Examples
///
/// ```
/// use ev_station_sim::sim::types::SimConfig;
///
/// let cfg = SimConfig::new(10, 24, 42);
/// assert_eq!(cfg.total_ticks(), 144);
/// assert_eq!(cfg.ticks_per_hour(), 6);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct SimConfig {
    /// Simulated minutes per tick.
    pub tick_resolution_minutes: u32,
    /// Simulated horizon in hours.
    pub sim_hours: u32,
    /// Duration of one tick in hours, derived as `tick_resolution_minutes / 60`.
    pub dt_hours: f32,
    /// Master random seed for reproducibility.
    pub seed: u64,
}

impl SimConfig {
    /// Creates a new timing configuration.
    ///
    /// # Panics
    ///
    /// Panics if `tick_resolution_minutes` is zero or does not divide an
    /// hour, or if `sim_hours` is zero.
    pub fn new(tick_resolution_minutes: u32, sim_hours: u32, seed: u64) -> Self {
        assert!(tick_resolution_minutes > 0, "tick_resolution_minutes must be > 0");
        assert!(
            60 % tick_resolution_minutes == 0,
            "tick_resolution_minutes must divide 60"
        );
        assert!(sim_hours > 0, "sim_hours must be > 0");
        Self {
            tick_resolution_minutes,
            sim_hours,
            dt_hours: tick_resolution_minutes as f32 / 60.0,
            seed,
        }
    }

    /// Number of ticks in the configured horizon.
    pub fn total_ticks(&self) -> usize {
        self.sim_hours as usize * 60 / self.tick_resolution_minutes as usize
    }

    /// Number of ticks per simulated hour.
    pub fn ticks_per_hour(&self) -> usize {
        (60 / self.tick_resolution_minutes) as usize
    }

    /// Hour of day (0..24) that `tick` falls into.
    pub fn hour_of_day(&self, tick: usize) -> usize {
        (tick / self.ticks_per_hour()) % 24
    }

    /// Converts a duration in minutes into whole ticks, rounding up.
    pub fn minutes_to_ticks(&self, minutes: u32) -> usize {
        minutes.div_ceil(self.tick_resolution_minutes) as usize
    }

    /// Wall-clock style label (`HH:MM`) for the start of `tick`.
    ///
    /// Hours keep counting past 24 on multi-day horizons.
    pub fn time_label(&self, tick: usize) -> String {
        let minutes = tick * self.tick_resolution_minutes as usize;
        format!("{:02}:{:02}", minutes / 60, minutes % 60)
    }
}

/// Station-level snapshot taken after one tick.
#[derive(Debug, Clone, Serialize)]
pub struct TickRecord {
    /// Tick index.
    pub tick: usize,
    /// `HH:MM` label of the tick.
    pub time: String,
    /// Power drawn from the grid after the battery reacted (kW).
    pub total_power_kw: f32,
    /// Sum of charger reservations before the battery reacted (kW).
    pub power_without_battery_kw: f32,
    /// Battery power (kW; positive=discharging to the station, negative=charging).
    pub battery_power_kw: f32,
    /// Battery state of charge in percent, `None` without a battery.
    pub battery_soc: Option<f32>,
}

impl fmt::Display for TickRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:>4} ({}) | station={:>8.2} kW  chargers={:>8.2} kW  battery={:>7.2} kW",
            self.tick,
            self.time,
            self.total_power_kw,
            self.power_without_battery_kw,
            self.battery_power_kw,
        )?;
        if let Some(soc) = self.battery_soc {
            write!(f, " (SoC={soc:.1}%)")?;
        }
        Ok(())
    }
}

/// Per-vehicle snapshot taken after one tick.
#[derive(Debug, Clone, Serialize)]
pub struct AgentRecord {
    /// Tick index.
    pub tick: usize,
    /// `HH:MM` label of the tick.
    pub time: String,
    /// Vehicle id.
    pub agent_id: usize,
    /// State of charge in percent.
    pub soc: f32,
    /// Arrival tick.
    pub arrival_tick: usize,
    /// Battery capacity (kWh).
    pub capacity_kwh: f32,
    /// Vehicle charging ceiling (kW).
    pub max_charge_kw: f32,
    /// Vehicle category.
    pub category: VehicleCategory,
    /// Break type driving the target SoC.
    pub break_type: BreakType,
    /// Power currently granted (kW).
    pub power_kw: f32,
    /// Accumulated ticks spent waiting for a charger.
    pub waiting_ticks: usize,
    /// Left the station without reaching its target SoC.
    pub left_without_charge: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_config_basic() {
        let cfg = SimConfig::new(10, 24, 42);
        assert_eq!(cfg.total_ticks(), 144);
        assert_eq!(cfg.ticks_per_hour(), 6);
        assert!((cfg.dt_hours - 1.0 / 6.0).abs() < 1e-6);
        assert_eq!(cfg.seed, 42);
    }

    #[test]
    fn long_horizon_does_not_overflow() {
        let cfg = SimConfig::new(60, u32::MAX, 0);
        assert_eq!(cfg.total_ticks(), u32::MAX as usize);
        let cfg = SimConfig::new(1, 80_000_000, 0);
        assert_eq!(cfg.total_ticks() as u64, 4_800_000_000);
    }

    #[test]
    fn hour_of_day_wraps() {
        let cfg = SimConfig::new(30, 48, 0);
        assert_eq!(cfg.hour_of_day(0), 0);
        assert_eq!(cfg.hour_of_day(3), 1);
        assert_eq!(cfg.hour_of_day(48), 0);
        assert_eq!(cfg.hour_of_day(95), 23);
    }

    #[test]
    fn minutes_round_up_to_ticks() {
        let cfg = SimConfig::new(15, 24, 0);
        assert_eq!(cfg.minutes_to_ticks(15), 1);
        assert_eq!(cfg.minutes_to_ticks(16), 2);
        assert_eq!(cfg.minutes_to_ticks(0), 0);
    }

    #[test]
    fn time_label_formats_hours_and_minutes() {
        let cfg = SimConfig::new(10, 48, 0);
        assert_eq!(cfg.time_label(0), "00:00");
        assert_eq!(cfg.time_label(7), "01:10");
        assert_eq!(cfg.time_label(150), "25:00");
    }

    #[test]
    #[should_panic]
    fn zero_resolution_panics() {
        SimConfig::new(0, 24, 0);
    }

    #[test]
    #[should_panic]
    fn resolution_not_dividing_hour_panics() {
        SimConfig::new(7, 24, 0);
    }

    #[test]
    #[should_panic]
    fn zero_horizon_panics() {
        SimConfig::new(10, 0, 0);
    }
}
