use crate::sim::types::SimConfig;

/// A stationary battery that shaves station peaks against a power limit.
///
/// # Power Convention (Station)
/// - Positive `current_power_kw`: discharging into the station (reduces grid draw)
/// - Negative `current_power_kw`: charging from the grid (adds to grid draw)
///
/// Each tick the station hands the battery its load before the battery
/// reacts. Above `station_limit_kw` the battery discharges the excess; below
/// `recharge_below_kw` it recharges with the spare headroom up to that floor.
/// Between the two thresholds it idles, which keeps it from oscillating
/// around the limit.
#[derive(Debug, Clone)]
pub struct FlexBattery {
    /// Battery capacity in kilowatt-hours.
    pub capacity_kwh: f32,

    /// State of charge in percent (0.0 to 100.0).
    pub soc: f32,

    /// Ceiling on instantaneous charge or discharge power (kW).
    pub max_power_kw: f32,

    /// Station load above which the battery discharges (kW).
    pub station_limit_kw: f32,

    /// Station load below which the battery recharges (kW).
    pub recharge_below_kw: f32,

    /// Power applied during the last tick (kW, positive=discharge).
    current_power_kw: f32,

    /// Duration of one tick in hours.
    dt_hours: f32,
}

impl FlexBattery {
    /// Creates a battery with the recharge floor set to half the station limit.
    ///
    /// # Arguments
    ///
    /// * `capacity_kwh` - Usable capacity in kWh (must be > 0)
    /// * `soc` - Initial state of charge in percent (0 to 100)
    /// * `max_power_kw` - Charge and discharge power ceiling in kW
    /// * `station_limit_kw` - Grid draw above which the battery discharges
    /// * `config` - Simulation configuration for timing
    ///
    /// # Panics
    ///
    /// Panics if capacity or power is not positive, the limit is negative,
    /// or `soc` is outside `[0, 100]`.
    pub fn new(
        capacity_kwh: f32,
        soc: f32,
        max_power_kw: f32,
        station_limit_kw: f32,
        config: &SimConfig,
    ) -> Self {
        Self::with_recharge_floor(
            capacity_kwh,
            soc,
            max_power_kw,
            station_limit_kw,
            station_limit_kw / 2.0,
            config,
        )
    }

    /// Creates a battery with an explicit recharge floor.
    ///
    /// `recharge_below_kw` is the grid draw below which the battery recharges;
    /// the other arguments are as for [`FlexBattery::new`].
    ///
    /// # Panics
    ///
    /// Same as [`FlexBattery::new`], and if `recharge_below_kw` is negative
    /// or above `station_limit_kw`.
    pub fn with_recharge_floor(
        capacity_kwh: f32,
        soc: f32,
        max_power_kw: f32,
        station_limit_kw: f32,
        recharge_below_kw: f32,
        config: &SimConfig,
    ) -> Self {
        assert!(capacity_kwh > 0.0);
        assert!(max_power_kw > 0.0);
        assert!((0.0..=100.0).contains(&soc));
        assert!(station_limit_kw >= 0.0);
        assert!((0.0..=station_limit_kw).contains(&recharge_below_kw));

        Self {
            capacity_kwh,
            soc,
            max_power_kw,
            station_limit_kw,
            recharge_below_kw,
            current_power_kw: 0.0,
            dt_hours: config.dt_hours,
        }
    }

    /// Power applied during the last tick (kW, positive=discharge).
    pub fn current_power_kw(&self) -> f32 {
        self.current_power_kw
    }

    pub fn is_empty(&self) -> bool {
        self.soc <= 0.0
    }

    pub fn is_full(&self) -> bool {
        self.soc >= 100.0
    }

    /// Reacts to the station load for one tick and returns the grid draw
    /// after the battery's contribution.
    pub fn react(&mut self, station_power_without_battery_kw: f32) -> f32 {
        let load = station_power_without_battery_kw;

        self.current_power_kw = if load > self.station_limit_kw && !self.is_empty() {
            let commanded = self.max_power_kw.min(load - self.station_limit_kw);
            self.discharge(commanded)
        } else if load < self.recharge_below_kw && !self.is_full() {
            let commanded = self.max_power_kw.min(self.recharge_below_kw - load);
            -self.recharge(commanded)
        } else {
            0.0
        };

        load - self.current_power_kw
    }

    /// Discharges at up to `power_kw`, stopping exactly at empty.
    ///
    /// Returns the power actually delivered.
    fn discharge(&mut self, power_kw: f32) -> f32 {
        let drop = self.percent_for(power_kw);
        if drop >= self.soc {
            let actual = self.power_for(self.soc);
            self.soc = 0.0;
            actual
        } else {
            self.soc -= drop;
            power_kw
        }
    }

    /// Recharges at up to `power_kw`, stopping exactly at full.
    ///
    /// Returns the power actually absorbed.
    fn recharge(&mut self, power_kw: f32) -> f32 {
        let gain = self.percent_for(power_kw);
        let space = 100.0 - self.soc;
        if gain >= space {
            let actual = self.power_for(space);
            self.soc = 100.0;
            actual
        } else {
            self.soc += gain;
            power_kw
        }
    }

    /// SoC percent moved by holding `power_kw` for one tick.
    fn percent_for(&self, power_kw: f32) -> f32 {
        power_kw * self.dt_hours / self.capacity_kwh * 100.0
    }

    /// Power that moves exactly `percent` of SoC in one tick.
    fn power_for(&self, percent: f32) -> f32 {
        percent / 100.0 * self.capacity_kwh / self.dt_hours
    }
}
