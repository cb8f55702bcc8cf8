//! Batch execution of scenario variants over repeated seeds.

use tracing::{info, warn};

use crate::config::{ConfigError, ScenarioConfig};

use super::collector::RecordingCollector;
use super::engine::Engine;
use super::kpi::KpiReport;
use super::station::Station;
use super::types::{AgentRecord, TickRecord};

/// A named scenario inside a batch.
#[derive(Debug, Clone)]
pub struct BatchVariant {
    pub name: String,
    pub scenario: ScenarioConfig,
}

/// Variants to run, each repeated `simulation.repetitions` times.
///
/// Repetition `i` of a variant runs with seed `simulation.seed + i`.
#[derive(Debug, Clone)]
pub struct BatchPlan {
    pub variants: Vec<BatchVariant>,
    /// Keep per-agent snapshots in the outputs.
    pub record_agents: bool,
}

impl BatchPlan {
    pub fn single(name: impl Into<String>, scenario: ScenarioConfig) -> Self {
        Self {
            variants: vec![BatchVariant {
                name: name.into(),
                scenario,
            }],
            record_agents: true,
        }
    }

    /// The scenario with and without the flexibility battery.
    pub fn flex_comparison(scenario: &ScenarioConfig) -> Self {
        Self {
            variants: vec![
                BatchVariant {
                    name: "without_battery".to_string(),
                    scenario: scenario.with_battery(false),
                },
                BatchVariant {
                    name: "with_battery".to_string(),
                    scenario: scenario.with_battery(true),
                },
            ],
            record_agents: true,
        }
    }

    /// Overrides the repetition count of every variant.
    pub fn with_repetitions(mut self, repetitions: usize) -> Self {
        for v in &mut self.variants {
            v.scenario.simulation.repetitions = repetitions;
        }
        self
    }

    /// Total number of runs in the plan.
    pub fn run_count(&self) -> usize {
        self.variants
            .iter()
            .map(|v| v.scenario.simulation.repetitions)
            .sum()
    }
}

/// Everything recorded by one completed run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub seed: u64,
    pub ticks: Vec<TickRecord>,
    pub agents: Vec<AgentRecord>,
    pub kpi: KpiReport,
}

/// One run of a batch, successful or not.
#[derive(Debug, Clone)]
pub struct BatchRun {
    pub run_id: String,
    pub iteration: usize,
    pub result: Result<RunOutput, ConfigError>,
}

/// Sets up and runs one scenario to its horizon.
///
/// # Errors
///
/// Returns the `ConfigError` from [`Station::setup`].
pub fn run_once(scenario: &ScenarioConfig, record_agents: bool) -> Result<RunOutput, ConfigError> {
    let station = Station::setup(scenario)?;
    let collector = if record_agents {
        RecordingCollector::new()
    } else {
        RecordingCollector::station_only()
    };
    let mut engine = Engine::new(station, collector);
    let ticks = engine.run();
    let (station, collector) = engine.into_parts();
    let kpi = KpiReport::from_run(&ticks, &station);
    let (_, agents) = collector.into_parts();
    Ok(RunOutput {
        seed: station.config().seed,
        ticks,
        agents,
        kpi,
    })
}

/// Runs every variant and repetition in plan order.
///
/// Runs are independent: each owns its station and random stream, and a
/// failing run is reported in its own slot without stopping the rest.
pub fn run_batch(plan: &BatchPlan) -> Vec<BatchRun> {
    info!(
        variants = plan.variants.len(),
        runs = plan.run_count(),
        "batch started"
    );
    let mut runs = Vec::with_capacity(plan.run_count());
    for variant in &plan.variants {
        for iteration in 0..variant.scenario.simulation.repetitions {
            let mut scenario = variant.scenario.clone();
            scenario.simulation.seed = scenario.simulation.seed.wrapping_add(iteration as u64);

            let result = run_once(&scenario, plan.record_agents);
            match &result {
                Ok(output) => info!(
                    run = %variant.name,
                    iteration,
                    seed = output.seed,
                    peak_kw = output.kpi.peak_power_kw,
                    "run complete"
                ),
                Err(err) => warn!(run = %variant.name, iteration, %err, "run failed"),
            }
            runs.push(BatchRun {
                run_id: variant.name.clone(),
                iteration,
                result,
            });
        }
    }
    runs
}
