use crate::cycle::{Cycle, CycleDetector};
use crate::grid::Grid;
use crate::occupant::Occupant;
use crate::substance::{AgentType, EnergyType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct GenerationStats {
    pub generation: u64,
    pub live_organisms: usize,
    pub dead_organisms: usize,
    pub devices: usize,
    pub extents: usize,
    pub empty: usize,
    /// Sum of local agent intensities per type (ambient excluded).
    pub agent_totals: BTreeMap<AgentType, f64>,
    /// Sum of local energy intensities per type (ambient excluded).
    pub energy_totals: BTreeMap<EnergyType, f64>,
    /// Detected cycle period, 0 while none.
    pub repeat_period: usize,
    pub message: Option<String>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CycleReport {
    pub period: usize,
    pub start_generation: u64,
}

impl From<Cycle> for CycleReport {
    fn from(cycle: Cycle) -> Self {
        Self {
            period: cycle.period,
            start_generation: cycle.start_generation,
        }
    }
}

fn default_schema_version() -> u32 {
    1
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub generations: usize,
    pub sample_every: usize,
    pub samples: Vec<GenerationStats>,
    /// Every cycle detected during the run, one per population.
    #[serde(default)]
    pub cycles: Vec<CycleReport>,
    #[serde(default)]
    pub restarts: usize,
    pub final_stats: GenerationStats,
}

pub fn collect_generation_stats(grid: &Grid, detector: &CycleDetector) -> GenerationStats {
    let mut stats = GenerationStats {
        generation: detector.generation(),
        repeat_period: detector.repeat_period(),
        message: detector.message().map(str::to_owned),
        ..GenerationStats::default()
    };
    for (_, _, cell) in grid.cells() {
        match &cell.occupant {
            Occupant::Empty => stats.empty += 1,
            Occupant::Organism(organism) => {
                if organism.is_alive() {
                    stats.live_organisms += 1;
                } else {
                    stats.dead_organisms += 1;
                }
            }
            Occupant::Device(_) => stats.devices += 1,
            Occupant::Extent { .. } => stats.extents += 1,
        }
        for agent in cell.agents.values() {
            *stats.agent_totals.entry(agent.kind).or_insert(0.0) += f64::from(agent.intensity);
        }
        for energy in cell.energies.values() {
            *stats.energy_totals.entry(energy.kind).or_insert(0.0) += f64::from(energy.intensity);
        }
    }
    stats
}

pub(crate) fn summarize(
    generations: usize,
    sample_every: usize,
    samples: Vec<GenerationStats>,
    cycles: &[Cycle],
    restarts: usize,
    final_stats: GenerationStats,
) -> RunSummary {
    RunSummary {
        schema_version: 1,
        generations,
        sample_every,
        samples,
        cycles: cycles.iter().copied().map(CycleReport::from).collect(),
        restarts,
        final_stats,
    }
}
