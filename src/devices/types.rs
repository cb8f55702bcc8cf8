//! Common enums and context shared by the station components.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Vehicle population category, fixed at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleCategory {
    /// External vehicle stopping only to fast charge.
    FastCharge,
    /// External vehicle on a mandatory driver break.
    Break,
    /// External vehicle parked at the depot for a long stay.
    Depot,
    /// Vehicle belonging to the station's own fleet.
    Internal,
}

impl VehicleCategory {
    /// All categories in population order.
    pub const ALL: [VehicleCategory; 4] = [
        VehicleCategory::FastCharge,
        VehicleCategory::Break,
        VehicleCategory::Depot,
        VehicleCategory::Internal,
    ];

    /// Configuration key of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleCategory::FastCharge => "fast_charge",
            VehicleCategory::Break => "break",
            VehicleCategory::Depot => "depot",
            VehicleCategory::Internal => "internal",
        }
    }
}

impl fmt::Display for VehicleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Length of a stop at the station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakType {
    Short,
    Medium,
    Long,
}

impl fmt::Display for BreakType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BreakType::Short => "short",
            BreakType::Medium => "medium",
            BreakType::Long => "long",
        })
    }
}

/// Lifecycle of a vehicle within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleState {
    /// Arrival tick not reached yet.
    NotArrived,
    /// Arrived, no charger with headroom found yet.
    Waiting,
    /// Connected to a charger.
    Charging,
    /// Departed; inert for the rest of the run.
    Done,
}

/// How a vehicle's visit ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeOutcome {
    /// Still arriving, waiting, or charging.
    Pending,
    /// Reached its target state of charge.
    Completed,
    /// Dwell budget ran out before reaching the target.
    Undercharged,
    /// Gave up waiting for a charger and never charged.
    Abandoned,
}

impl ChargeOutcome {
    /// Returns `true` when the vehicle left without reaching its target.
    pub fn left_without_charge(&self) -> bool {
        matches!(self, ChargeOutcome::Undercharged | ChargeOutcome::Abandoned)
    }
}

/// Per-tick information handed to vehicles by the station.
#[derive(Debug, Clone, Copy)]
pub struct TickContext {
    /// Tick being processed.
    pub tick: usize,
    /// Duration of one tick in hours.
    pub dt_hours: f32,
}
