//! API response and query types.
//!
//! Field names follow the CSV export columns.

use serde::{Deserialize, Serialize};

use crate::devices::{BreakType, VehicleCategory};
use crate::sim::kpi::KpiReport;
use crate::sim::types::{AgentRecord, SimConfig, TickRecord};

/// Combined state response: config, KPIs, and the last station snapshot.
#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub config: SimConfig,
    pub kpi: KpiReport,
    /// `None` when the run produced no ticks.
    pub latest_tick: Option<TelemetryRecord>,
}

/// Station snapshot of one tick.
#[derive(Debug, Serialize)]
pub struct TelemetryRecord {
    pub step: usize,
    pub time: String,
    /// Grid draw after the battery (kW).
    pub power: f32,
    pub power_without_battery: f32,
    pub battery_power: f32,
    pub battery_soc: Option<f32>,
}

impl From<&TickRecord> for TelemetryRecord {
    fn from(r: &TickRecord) -> Self {
        Self {
            step: r.tick,
            time: r.time.clone(),
            power: r.total_power_kw,
            power_without_battery: r.power_without_battery_kw,
            battery_power: r.battery_power_kw,
            battery_soc: r.battery_soc,
        }
    }
}

/// Snapshot of one vehicle at one tick.
#[derive(Debug, Serialize)]
pub struct AgentView {
    pub step: usize,
    pub time: String,
    pub agent_id: usize,
    pub soc: f32,
    pub arrival: usize,
    pub capacity: f32,
    pub max_charge: f32,
    #[serde(rename = "type")]
    pub category: VehicleCategory,
    pub break_type: BreakType,
    pub power: f32,
    pub waiting: usize,
    /// Left without reaching the target state of charge.
    pub charged: bool,
}

impl From<&AgentRecord> for AgentView {
    fn from(r: &AgentRecord) -> Self {
        Self {
            step: r.tick,
            time: r.time.clone(),
            agent_id: r.agent_id,
            soc: r.soc,
            arrival: r.arrival_tick,
            capacity: r.capacity_kwh,
            max_charge: r.max_charge_kw,
            category: r.category,
            break_type: r.break_type,
            power: r.power_kw,
            waiting: r.waiting_ticks,
            charged: r.left_without_charge,
        }
    }
}

/// Optional inclusive tick range for the telemetry endpoint.
#[derive(Debug, Deserialize)]
pub struct TelemetryQuery {
    pub from: Option<usize>,
    pub to: Option<usize>,
}

/// Optional tick filter for the agents endpoint.
#[derive(Debug, Deserialize)]
pub struct AgentsQuery {
    pub tick: Option<usize>,
}

/// Error response body for 4xx errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_view_uses_export_names() {
        let record = AgentRecord {
            tick: 5,
            time: "00:50".to_string(),
            agent_id: 3,
            soc: 61.0,
            arrival_tick: 2,
            capacity_kwh: 200.0,
            max_charge_kw: 250.0,
            category: VehicleCategory::Depot,
            break_type: BreakType::Long,
            power_kw: 80.0,
            waiting_ticks: 1,
            left_without_charge: false,
        };
        let json = serde_json::to_value(AgentView::from(&record)).unwrap();
        assert_eq!(json["step"], 5);
        assert_eq!(json["arrival"], 2);
        assert_eq!(json["type"], "depot");
        assert_eq!(json["break_type"], "long");
        assert_eq!(json["charged"], false);
    }

    #[test]
    fn telemetry_record_maps_fields() {
        let tick = TickRecord {
            tick: 7,
            time: "01:10".to_string(),
            total_power_kw: 650.0,
            power_without_battery_kw: 750.0,
            battery_power_kw: 100.0,
            battery_soc: Some(40.0),
        };
        let record = TelemetryRecord::from(&tick);
        assert_eq!(record.step, 7);
        assert_eq!(record.power, 650.0);
        assert_eq!(record.power_without_battery, 750.0);
        assert_eq!(record.battery_soc, Some(40.0));
    }
}
