use tracing::debug;

use crate::devices::charger::{Charger, POWER_EPS_KW};
use crate::devices::types::{BreakType, ChargeOutcome, TickContext, VehicleCategory, VehicleState};
use crate::sim::policy::{PowerPolicy, PowerRequest};

/// Tolerance when comparing state of charge against its target (percent).
const SOC_EPS: f32 = 1e-4;

/// Sampled attributes of one vehicle, fixed when the station is set up.
#[derive(Debug, Clone)]
pub struct VehicleSpec {
    pub id: usize,
    pub category: VehicleCategory,
    pub break_type: BreakType,
    /// Battery capacity (kWh).
    pub capacity_kwh: f32,
    /// The vehicle's own charging ceiling (kW).
    pub max_charge_kw: f32,
    /// Initial state of charge (percent).
    pub soc: f32,
    /// First tick the vehicle looks for a charger.
    pub arrival_tick: usize,
    /// State of charge at which the vehicle leaves (percent).
    pub target_soc: f32,
    /// Ticks the vehicle may stay connected.
    pub dwell_ticks: usize,
    /// Ticks the vehicle waits for a charger before abandoning, if it ever does.
    pub max_wait_ticks: Option<usize>,
}

/// An electric vehicle visiting the station.
///
/// Processed in two phases per tick. [`Vehicle::release_if_departing`]
/// frees the charger of a vehicle that finished during the previous tick,
/// then [`Vehicle::act`] performs this tick's search, wait, or charge.
/// The split lets a departing vehicle report its final state in the
/// previous tick's snapshot while its power is already free for vehicles
/// searching in this tick.
#[derive(Debug, Clone)]
pub struct Vehicle {
    spec: VehicleSpec,
    soc: f32,
    dwell_ticks_remaining: usize,
    desired_power_kw: f32,
    current_power_kw: f32,
    charger: Option<usize>,
    state: VehicleState,
    outcome: ChargeOutcome,
    departing: bool,
    waiting_ticks: usize,
    energy_delivered_kwh: f32,
}

impl Vehicle {
    /// Creates a vehicle that has not arrived yet.
    ///
    /// The desired power is derived once from the sampled state through `policy`.
    ///
    /// # Arguments
    ///
    /// * `spec` - Sampled attributes (capacity, SoC, arrival, target, dwell)
    /// * `policy` - Turns missing energy and dwell into a power request
    /// * `dt_hours` - Duration of one tick in hours
    ///
    /// # Panics
    ///
    /// Panics if capacity or charging power is not positive, a state of
    /// charge is outside `[0, 100]`, or the dwell budget is zero.
    pub fn new(spec: VehicleSpec, policy: &PowerPolicy, dt_hours: f32) -> Self {
        assert!(spec.capacity_kwh > 0.0, "vehicle capacity must be > 0");
        assert!(spec.max_charge_kw > 0.0, "vehicle max charge power must be > 0");
        assert!((0.0..=100.0).contains(&spec.soc));
        assert!((0.0..=100.0).contains(&spec.target_soc));
        assert!(spec.dwell_ticks > 0, "dwell budget must be at least one tick");

        let desired_power_kw = policy.desired_power_kw(&PowerRequest {
            capacity_kwh: spec.capacity_kwh,
            soc: spec.soc,
            target_soc: spec.target_soc,
            dwell_ticks: spec.dwell_ticks,
            max_charge_kw: spec.max_charge_kw,
            dt_hours,
        });

        Self {
            soc: spec.soc,
            dwell_ticks_remaining: spec.dwell_ticks,
            desired_power_kw,
            current_power_kw: 0.0,
            charger: None,
            state: VehicleState::NotArrived,
            outcome: ChargeOutcome::Pending,
            departing: false,
            waiting_ticks: 0,
            energy_delivered_kwh: 0.0,
            spec,
        }
    }

    pub fn id(&self) -> usize {
        self.spec.id
    }

    pub fn spec(&self) -> &VehicleSpec {
        &self.spec
    }

    /// State of charge in percent.
    pub fn soc(&self) -> f32 {
        self.soc
    }

    pub fn state(&self) -> VehicleState {
        self.state
    }

    pub fn outcome(&self) -> ChargeOutcome {
        self.outcome
    }

    /// Charger index held while charging.
    pub fn charger(&self) -> Option<usize> {
        self.charger
    }

    pub fn desired_power_kw(&self) -> f32 {
        self.desired_power_kw
    }

    /// Power granted by the connected charger (kW).
    pub fn current_power_kw(&self) -> f32 {
        self.current_power_kw
    }

    pub fn dwell_ticks_remaining(&self) -> usize {
        self.dwell_ticks_remaining
    }

    pub fn waiting_ticks(&self) -> usize {
        self.waiting_ticks
    }

    pub fn energy_delivered_kwh(&self) -> f32 {
        self.energy_delivered_kwh
    }

    /// Returns `true` once the vehicle will leave at the next tick boundary.
    pub fn is_departing(&self) -> bool {
        self.departing
    }

    /// Phase 1: hands back the charger of a vehicle that finished last tick.
    pub fn release_if_departing(&mut self, chargers: &mut [Charger]) {
        if self.state != VehicleState::Charging || !self.departing {
            return;
        }
        if let Some(idx) = self.charger.take() {
            chargers[idx].release(self.current_power_kw);
            debug!(
                vehicle = self.spec.id,
                charger = idx,
                released_kw = self.current_power_kw,
                soc = self.soc,
                outcome = ?self.outcome,
                "vehicle departed"
            );
        }
        self.current_power_kw = 0.0;
        self.departing = false;
        self.state = VehicleState::Done;
    }

    /// Phase 2: searches, waits, or charges for one tick.
    ///
    /// A vehicle that connects charges in the same tick, so every tick it
    /// holds power delivers energy and counts against its dwell budget.
    pub fn act(&mut self, ctx: &TickContext, chargers: &mut [Charger]) {
        match self.state {
            VehicleState::Done => {}
            VehicleState::Charging => self.charge(ctx, chargers),
            VehicleState::Waiting => {
                if self.try_connect(ctx, chargers) {
                    self.charge(ctx, chargers);
                } else {
                    self.waiting_ticks += 1;
                    if self
                        .spec
                        .max_wait_ticks
                        .is_some_and(|max| self.waiting_ticks > max)
                    {
                        self.abandon(ctx);
                    }
                }
            }
            VehicleState::NotArrived => {
                if ctx.tick < self.spec.arrival_tick {
                    return;
                }
                if self.soc >= self.spec.target_soc - SOC_EPS {
                    self.state = VehicleState::Done;
                    self.outcome = ChargeOutcome::Completed;
                    return;
                }
                if self.try_connect(ctx, chargers) {
                    self.charge(ctx, chargers);
                } else {
                    self.state = VehicleState::Waiting;
                }
            }
        }
    }

    fn try_connect(&mut self, ctx: &TickContext, chargers: &mut [Charger]) -> bool {
        let Some(idx) = closest_fit(chargers, self.desired_power_kw) else {
            return false;
        };

        let charger = &mut chargers[idx];
        let granted = charger.accessible_power_kw().min(self.desired_power_kw);
        charger.reserve(granted);

        self.charger = Some(idx);
        self.current_power_kw = granted;
        self.state = VehicleState::Charging;
        debug!(
            tick = ctx.tick,
            vehicle = self.spec.id,
            charger = idx,
            desired_kw = self.desired_power_kw,
            granted_kw = granted,
            waited = self.waiting_ticks,
            "vehicle connected"
        );
        true
    }

    fn charge(&mut self, ctx: &TickContext, chargers: &mut [Charger]) {
        let Some(idx) = self.charger else {
            return;
        };

        // Absorb headroom freed by departures on the same charger.
        let charger = &mut chargers[idx];
        let shortfall = self.desired_power_kw - self.current_power_kw;
        if shortfall > POWER_EPS_KW && charger.accessible_power_kw() > POWER_EPS_KW {
            let extra = shortfall.min(charger.accessible_power_kw());
            charger.extend(extra);
            self.current_power_kw += extra;
        }

        let cap = self.spec.target_soc.min(100.0);
        let gained = self.current_power_kw * ctx.dt_hours / self.spec.capacity_kwh * 100.0;
        let new_soc = (self.soc + gained).min(cap);
        self.energy_delivered_kwh += (new_soc - self.soc) / 100.0 * self.spec.capacity_kwh;
        self.soc = new_soc;
        self.dwell_ticks_remaining = self.dwell_ticks_remaining.saturating_sub(1);

        if self.soc >= cap - SOC_EPS {
            self.departing = true;
            self.outcome = ChargeOutcome::Completed;
        } else if self.dwell_ticks_remaining == 0 {
            self.departing = true;
            self.outcome = ChargeOutcome::Undercharged;
        }
    }

    fn abandon(&mut self, ctx: &TickContext) {
        debug!(
            tick = ctx.tick,
            vehicle = self.spec.id,
            waited = self.waiting_ticks,
            "vehicle abandoned the queue"
        );
        self.state = VehicleState::Done;
        self.outcome = ChargeOutcome::Abandoned;
    }
}

/// Picks the available charger whose headroom is closest to `desired_kw`.
///
/// Ties go to the charger seen first.
pub fn closest_fit(chargers: &[Charger], desired_kw: f32) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, charger) in chargers.iter().enumerate() {
        if !charger.is_available() {
            continue;
        }
        let distance = (charger.accessible_power_kw() - desired_kw).abs();
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((idx, distance));
        }
    }
    best.map(|(idx, _)| idx)
}
