//! Run driver that ticks a station to its horizon.

use tracing::info;

use super::clock::Clock;
use super::collector::Collector;
use super::station::Station;
use super::types::TickRecord;

/// How a run driven by [`Engine::run_until`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every tick of the horizon was processed.
    Completed { ticks: usize },
    /// The stop predicate fired at a tick boundary.
    Aborted { at_tick: usize },
}

/// Owns a station, a clock for its remaining ticks, and a collector.
///
/// The collector is handed the station after every tick, between one
/// tick's vehicle actions and the next tick's departures.
pub struct Engine<C: Collector> {
    station: Station,
    clock: Clock,
    collector: C,
}

impl<C: Collector> Engine<C> {
    pub fn new(station: Station, collector: C) -> Self {
        let remaining = station
            .config()
            .total_ticks()
            .saturating_sub(station.tick_count());
        Self {
            station,
            clock: Clock::new(remaining),
            collector,
        }
    }

    /// Runs one tick, or returns `None` when the horizon is reached.
    pub fn step(&mut self) -> Option<TickRecord> {
        self.clock.tick()?;
        let record = self.station.tick();
        self.collector.collect(&self.station);
        Some(record)
    }

    /// Runs every remaining tick and returns the station snapshots.
    pub fn run(&mut self) -> Vec<TickRecord> {
        info!(ticks = self.clock.remaining(), "run started");
        let mut records = Vec::with_capacity(self.clock.remaining());
        while let Some(record) = self.step() {
            records.push(record);
        }
        info!(ticks = records.len(), "run finished");
        records
    }

    /// Runs until the horizon or until `stop` returns `true`.
    ///
    /// `stop` is checked before every tick, so a run is only ever
    /// interrupted between ticks.
    pub fn run_until(&mut self, mut stop: impl FnMut(&Station) -> bool) -> RunStatus {
        loop {
            if self.clock.is_finished() {
                return RunStatus::Completed {
                    ticks: self.station.tick_count(),
                };
            }
            if stop(&self.station) {
                self.station.halt();
                info!(at_tick = self.station.tick_count(), "run aborted");
                return RunStatus::Aborted {
                    at_tick: self.station.tick_count(),
                };
            }
            self.step();
        }
    }

    pub fn station(&self) -> &Station {
        &self.station
    }

    pub fn collector(&self) -> &C {
        &self.collector
    }

    pub fn into_parts(self) -> (Station, C) {
        (self.station, self.collector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScenarioConfig;
    use crate::sim::collector::RecordingCollector;

    fn short_scenario() -> ScenarioConfig {
        let mut cfg = ScenarioConfig::baseline();
        cfg.simulation.sim_hours = 2;
        cfg
    }

    #[test]
    fn run_covers_horizon() {
        let station = Station::setup(&short_scenario()).unwrap();
        let total = station.config().total_ticks();
        let mut engine = Engine::new(station, RecordingCollector::new());
        let records = engine.run();
        assert_eq!(records.len(), total);
        assert_eq!(engine.collector().ticks().len(), total);
        assert_eq!(engine.station().tick_count(), total);
        assert!(engine.step().is_none());
        assert!(engine.station().is_running());
    }

    #[test]
    fn run_until_stops_at_tick_boundary() {
        let station = Station::setup(&short_scenario()).unwrap();
        let mut engine = Engine::new(station, RecordingCollector::station_only());
        let status = engine.run_until(|s| s.tick_count() == 5);
        assert_eq!(status, RunStatus::Aborted { at_tick: 5 });
        assert_eq!(engine.collector().ticks().len(), 5);
        assert!(!engine.station().is_running());
    }

    #[test]
    fn run_until_without_stop_completes() {
        let station = Station::setup(&short_scenario()).unwrap();
        let total = station.config().total_ticks();
        let mut engine = Engine::new(station, ());
        assert_eq!(
            engine.run_until(|_| false),
            RunStatus::Completed { ticks: total }
        );
    }

    #[test]
    fn engine_resumes_a_partly_run_station() {
        let mut station = Station::setup(&short_scenario()).unwrap();
        let total = station.config().total_ticks();
        station.tick();
        station.tick();
        let mut engine = Engine::new(station, ());
        assert_eq!(engine.run().len(), total - 2);
    }
}
