//! Desired charging power policies.

use serde::{Deserialize, Serialize};

/// Inputs for deriving how fast a vehicle wants to charge.
#[derive(Debug, Clone, Copy)]
pub struct PowerRequest {
    /// Vehicle battery capacity (kWh).
    pub capacity_kwh: f32,
    /// Current state of charge (percent).
    pub soc: f32,
    /// Target state of charge (percent).
    pub target_soc: f32,
    /// Ticks the vehicle is willing to stay connected.
    pub dwell_ticks: usize,
    /// Vehicle charging ceiling (kW).
    pub max_charge_kw: f32,
    /// Duration of one tick in hours.
    pub dt_hours: f32,
}

impl PowerRequest {
    /// Energy needed to go from `soc` to `target_soc` (kWh, never negative).
    pub fn missing_energy_kwh(&self) -> f32 {
        ((self.target_soc - self.soc) / 100.0 * self.capacity_kwh).max(0.0)
    }
}

/// How a vehicle turns its missing energy and dwell budget into a power request.
///
/// Every variant is capped by the vehicle's `max_charge_kw` and is
/// non-increasing in `dwell_ticks`: a longer stay never asks for more power.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PowerPolicy {
    /// Spread the missing energy evenly over the dwell budget.
    #[default]
    Linear,
    /// Linear request multiplied by `factor`, to leave slack for the
    /// slower end of the charge curve.
    Scaled { factor: f32 },
    /// Always ask for the vehicle's full charging power.
    FullRate,
}

impl PowerPolicy {
    /// Desired charging power in kW.
    pub fn desired_power_kw(&self, req: &PowerRequest) -> f32 {
        let missing = req.missing_energy_kwh();
        if missing <= 0.0 {
            return 0.0;
        }

        let raw = match self {
            PowerPolicy::Linear => linear_kw(missing, req),
            PowerPolicy::Scaled { factor } => factor * linear_kw(missing, req),
            PowerPolicy::FullRate => req.max_charge_kw,
        };
        raw.clamp(0.0, req.max_charge_kw)
    }
}

fn linear_kw(missing_kwh: f32, req: &PowerRequest) -> f32 {
    let hours = req.dwell_ticks.max(1) as f32 * req.dt_hours;
    missing_kwh / hours
}
