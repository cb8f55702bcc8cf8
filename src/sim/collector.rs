//! Per-tick statistics collection.

use super::station::Station;
use super::types::{AgentRecord, TickRecord};

/// Observes the station once after every tick.
///
/// Collectors get read-only access; they cannot influence the run.
pub trait Collector {
    fn collect(&mut self, station: &Station);
}

/// Discards everything.
impl Collector for () {
    fn collect(&mut self, _station: &Station) {}
}

/// Keeps every station and agent snapshot in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingCollector {
    ticks: Vec<TickRecord>,
    agents: Vec<AgentRecord>,
    record_agents: bool,
}

impl RecordingCollector {
    /// Records station and agent snapshots.
    pub fn new() -> Self {
        Self {
            record_agents: true,
            ..Self::default()
        }
    }

    /// Records station snapshots only.
    pub fn station_only() -> Self {
        Self::default()
    }

    pub fn ticks(&self) -> &[TickRecord] {
        &self.ticks
    }

    /// Agent snapshots, grouped by tick in vehicle id order.
    pub fn agents(&self) -> &[AgentRecord] {
        &self.agents
    }

    pub fn into_parts(self) -> (Vec<TickRecord>, Vec<AgentRecord>) {
        (self.ticks, self.agents)
    }
}

impl Collector for RecordingCollector {
    fn collect(&mut self, station: &Station) {
        self.ticks.push(station.tick_record());
        if self.record_agents {
            self.agents.extend(station.agent_records());
        }
    }
}
