//! Post-hoc KPI computation from a finished run.

use std::fmt;

use serde::Serialize;

use crate::devices::{ChargeOutcome, VehicleState};

use super::station::Station;
use super::types::TickRecord;

/// Aggregate indicators of one run.
///
/// Power figures come from the tick records, vehicle figures from the
/// station's final state.
#[derive(Debug, Clone, Serialize)]
pub struct KpiReport {
    /// Highest grid draw (kW).
    pub peak_power_kw: f32,
    /// Mean grid draw (kW).
    pub mean_power_kw: f32,
    /// Highest summed charger reservation before the battery (kW).
    pub peak_without_battery_kw: f32,
    /// Energy delivered into vehicles (kWh).
    pub energy_delivered_kwh: f32,
    /// Battery energy throughput (kWh, sum of |power| * dt).
    pub battery_throughput_kwh: f32,
    pub vehicles_total: usize,
    pub completed: usize,
    pub undercharged: usize,
    pub abandoned: usize,
    /// Vehicles still waiting or charging when the horizon ended.
    pub in_progress: usize,
    /// Vehicles whose arrival tick was never reached.
    pub never_arrived: usize,
    /// Mean minutes spent waiting for a charger, over arrived vehicles.
    pub mean_wait_minutes: f32,
    pub max_wait_minutes: f32,
}

impl KpiReport {
    pub fn from_run(records: &[TickRecord], station: &Station) -> Self {
        let config = station.config();
        let dt_hours = config.dt_hours;

        let mut peak = 0.0_f32;
        let mut peak_without = 0.0_f32;
        let mut power_sum = 0.0_f32;
        let mut throughput = 0.0_f32;
        for r in records {
            peak = peak.max(r.total_power_kw);
            peak_without = peak_without.max(r.power_without_battery_kw);
            power_sum += r.total_power_kw;
            throughput += r.battery_power_kw.abs() * dt_hours;
        }
        let mean = if records.is_empty() {
            0.0
        } else {
            power_sum / records.len() as f32
        };

        let mut report = Self {
            peak_power_kw: peak,
            mean_power_kw: mean,
            peak_without_battery_kw: peak_without,
            energy_delivered_kwh: 0.0,
            battery_throughput_kwh: throughput,
            vehicles_total: station.vehicles().len(),
            completed: 0,
            undercharged: 0,
            abandoned: 0,
            in_progress: 0,
            never_arrived: 0,
            mean_wait_minutes: 0.0,
            max_wait_minutes: 0.0,
        };

        let minutes_per_tick = config.tick_resolution_minutes as f32;
        let mut wait_sum = 0.0_f32;
        let mut arrived = 0_usize;
        for v in station.vehicles() {
            report.energy_delivered_kwh += v.energy_delivered_kwh();
            match v.outcome() {
                ChargeOutcome::Completed => report.completed += 1,
                ChargeOutcome::Undercharged => report.undercharged += 1,
                ChargeOutcome::Abandoned => report.abandoned += 1,
                ChargeOutcome::Pending if v.state() == VehicleState::NotArrived => {
                    report.never_arrived += 1;
                }
                ChargeOutcome::Pending => report.in_progress += 1,
            }
            if v.state() != VehicleState::NotArrived {
                arrived += 1;
                let wait = v.waiting_ticks() as f32 * minutes_per_tick;
                wait_sum += wait;
                report.max_wait_minutes = report.max_wait_minutes.max(wait);
            }
        }
        if arrived > 0 {
            report.mean_wait_minutes = wait_sum / arrived as f32;
        }
        report
    }

    /// Vehicles that left without reaching their target.
    pub fn left_without_charge(&self) -> usize {
        self.undercharged + self.abandoned
    }
}

impl fmt::Display for KpiReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- KPI Report ---")?;
        writeln!(f, "Peak station power:    {:.2} kW", self.peak_power_kw)?;
        writeln!(f, "Peak before battery:   {:.2} kW", self.peak_without_battery_kw)?;
        writeln!(f, "Mean station power:    {:.2} kW", self.mean_power_kw)?;
        writeln!(f, "Energy delivered:      {:.2} kWh", self.energy_delivered_kwh)?;
        writeln!(f, "Battery throughput:    {:.2} kWh", self.battery_throughput_kwh)?;
        writeln!(
            f,
            "Vehicles:              {} total, {} completed, {} undercharged, {} abandoned",
            self.vehicles_total, self.completed, self.undercharged, self.abandoned
        )?;
        writeln!(
            f,
            "                       {} in progress, {} not arrived",
            self.in_progress, self.never_arrived
        )?;
        write!(
            f,
            "Wait time:             {:.1} min mean, {:.1} min max",
            self.mean_wait_minutes, self.max_wait_minutes
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{BreakType, Charger, Vehicle, VehicleCategory, VehicleSpec};
    use crate::sim::policy::PowerPolicy;
    use crate::sim::types::SimConfig;

    fn record(total: f32, without: f32, battery: f32) -> TickRecord {
        TickRecord {
            tick: 0,
            time: "00:00".to_string(),
            total_power_kw: total,
            power_without_battery_kw: without,
            battery_power_kw: battery,
            battery_soc: None,
        }
    }

    fn empty_station() -> Station {
        Station::from_parts(SimConfig::new(30, 24, 0), Vec::new(), None, Vec::new())
    }

    #[test]
    fn power_figures_from_records() {
        let records = vec![
            record(100.0, 100.0, 0.0),
            record(300.0, 400.0, 100.0),
            record(200.0, 150.0, -50.0),
        ];
        let kpi = KpiReport::from_run(&records, &empty_station());
        assert_eq!(kpi.peak_power_kw, 300.0);
        assert_eq!(kpi.peak_without_battery_kw, 400.0);
        assert!((kpi.mean_power_kw - 200.0).abs() < 1e-4);
        // (100 + 50) kW over half-hour ticks
        assert!((kpi.battery_throughput_kwh - 75.0).abs() < 1e-4);
    }

    #[test]
    fn empty_run() {
        let kpi = KpiReport::from_run(&[], &empty_station());
        assert_eq!(kpi.peak_power_kw, 0.0);
        assert_eq!(kpi.mean_power_kw, 0.0);
        assert_eq!(kpi.vehicles_total, 0);
        assert_eq!(kpi.mean_wait_minutes, 0.0);
    }

    #[test]
    fn vehicle_outcomes_are_counted() {
        let cfg = SimConfig::new(60, 4, 0);
        let make = |id, soc, arrival_tick, dwell_ticks, max_wait_ticks| {
            Vehicle::new(
                VehicleSpec {
                    id,
                    category: VehicleCategory::FastCharge,
                    break_type: BreakType::Short,
                    capacity_kwh: 100.0,
                    max_charge_kw: 100.0,
                    soc,
                    arrival_tick,
                    target_soc: 80.0,
                    dwell_ticks,
                    max_wait_ticks,
                },
                &PowerPolicy::Linear,
                cfg.dt_hours,
            )
        };
        // One socket: vehicle 0 charges for two ticks, vehicle 1 waits one
        // tick and abandons, vehicle 2 arrives after the horizon.
        let vehicles = vec![
            make(0, 40.0, 0, 2, None),
            make(1, 40.0, 0, 1, Some(0)),
            make(2, 40.0, 10, 1, None),
        ];
        let mut station = Station::from_parts(cfg, vec![Charger::new(0, 350.0, 1)], None, vehicles);
        let records: Vec<_> = (0..4).map(|_| station.tick()).collect();

        let kpi = KpiReport::from_run(&records, &station);
        assert_eq!(kpi.vehicles_total, 3);
        assert_eq!(kpi.completed, 1);
        assert_eq!(kpi.abandoned, 1);
        assert_eq!(kpi.never_arrived, 1);
        assert_eq!(kpi.left_without_charge(), 1);
        assert!((kpi.energy_delivered_kwh - 40.0).abs() < 1e-3);
        assert_eq!(kpi.max_wait_minutes, 60.0);
        assert!((kpi.mean_wait_minutes - 30.0).abs() < 1e-4);
    }
}
