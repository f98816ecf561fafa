use crate::config::{DishConfig, DishConfigError};
use crate::cycle::{self, Cycle, CycleDetector};
use crate::grid::Grid;
use crate::metrics::{GenerationStats, RunSummary};
use crate::occupant::{Occupant, Organism};
use crate::render::{Projection, Projector};
use crate::seed::{self, Pattern, PatternError};
use crate::substance::{settle, SubstanceKind};
use rand_chacha::ChaCha12Rng;
use std::{error::Error, fmt};
use tracing::debug;

/// Effect produced by a device during a generation, applied once every cell has acted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Emission {
    pub source: (isize, isize),
    pub target: (isize, isize),
    pub effect: Effect,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Effect {
    /// Place a copy of the organism into the target.
    Spawn(Organism),
    /// Add the source cell's substances into the target.
    Replicate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DishInitError {
    Config(DishConfigError),
}

impl fmt::Display for DishInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DishInitError::Config(e) => write!(f, "{}", e),
        }
    }
}

impl From<DishConfigError> for DishInitError {
    fn from(err: DishConfigError) -> Self {
        DishInitError::Config(err)
    }
}

impl Error for DishInitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DishInitError::Config(e) => Some(e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    InvalidSampleEvery,
    TooManyGenerations { max: usize, actual: usize },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::InvalidSampleEvery => write!(f, "sample_every must be positive"),
            RunError::TooManyGenerations { max, actual } => {
                write!(f, "generations ({actual}) exceed supported maximum ({max})")
            }
        }
    }
}

impl Error for RunError {}

/// Container of all life: the generation-advance engine.
///
/// An external driver calls [`PetriDish::populate`] once and then [`PetriDish::advance`]
/// once per tick. During `advance` every behavior reads only the current buffer and every
/// write lands in the next buffer, so no behavior observes a write from its own generation.
pub struct PetriDish {
    grid: Grid,
    detector: CycleDetector,
    config: DishConfig,
    rng: ChaCha12Rng,
    /// Number of populations so far; selects the RNG stream of the next one.
    epoch: u64,
    emissions: Vec<Emission>,
}

impl PetriDish {
    pub const MAX_RUN_GENERATIONS: usize = 1_000_000;

    pub fn new(config: DishConfig) -> Result<Self, DishInitError> {
        config.validate()?;
        let mut grid = Grid::new(config.width, config.height);
        for (&kind, &level) in &config.ambient_agents {
            grid.ambient_mut().set(kind, level);
        }
        for (&kind, &level) in &config.ambient_energies {
            grid.ambient_mut().set(kind, level);
        }
        Ok(Self {
            grid,
            detector: CycleDetector::new(config.history_capacity),
            rng: crate::rng::create_rng(config.seed),
            config,
            epoch: 0,
            emissions: Vec::new(),
        })
    }

    pub fn config(&self) -> &DishConfig {
        &self.config
    }

    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Occupant at `x`:`y` in the current generation; `Empty` outside the dish.
    pub fn get(&self, x: isize, y: isize) -> &Occupant {
        self.grid.get(x, y)
    }

    /// Ambient plus local intensity of `kind` at `x`:`y` in the current generation.
    pub fn intensity<K: SubstanceKind>(&self, x: isize, y: isize, kind: K) -> f32 {
        self.grid.intensity(x, y, kind)
    }

    pub fn local_intensity<K: SubstanceKind>(&self, x: isize, y: isize, kind: K) -> f32 {
        self.grid.local_intensity(x, y, kind)
    }

    pub fn generation(&self) -> u64 {
        self.detector.generation()
    }

    /// Detected cycle period, or 0 while none has been found.
    pub fn repeat_period(&self) -> usize {
        self.detector.repeat_period()
    }

    pub fn cycle(&self) -> Option<Cycle> {
        self.detector.cycle()
    }

    pub fn message(&self) -> Option<&str> {
        self.detector.message()
    }

    /// Set a world-wide base level. Only possible between generations.
    pub fn set_ambient(&mut self, kind: impl Into<crate::substance::SubstanceType>, level: f32) {
        self.grid.ambient_mut().set(kind, level);
    }

    /// Seed every cell through `initializer` and commit the result as generation 0.
    ///
    /// Clears both buffers, the generation counter and the cycle history. No behavior runs.
    pub fn populate(&mut self, mut initializer: impl FnMut(usize, usize) -> Occupant) {
        self.detector.reset();
        self.grid.clear();
        let epoch = self.epoch;
        self.rng = crate::rng::derive_epoch_rng(self.config.seed, epoch);
        self.epoch = self.epoch.wrapping_add(1);

        let (width, height) = (self.grid.width(), self.grid.height());
        for y in 0..height {
            for x in 0..width {
                self.grid.set(x as isize, y as isize, initializer(x, y));
            }
        }

        self.detector
            .record(cycle::fingerprint(self.grid.next_cells()));
        self.grid.swap();
        debug!(width, height, epoch, "dish populated");
    }

    /// Seed a random Conway soup at the configured density.
    pub fn populate_random(&mut self) {
        // The complemented seed keeps the soup stream apart from device trials.
        let rng = crate::rng::derive_epoch_rng(!self.config.seed, self.epoch);
        let initializer = seed::conway_soup(rng, self.config.conway_density);
        self.populate(initializer);
    }

    /// Seed `pattern` with its top-left corner at `origin`; every other cell is a dead Conway.
    pub fn populate_pattern(
        &mut self,
        pattern: &Pattern,
        origin: (usize, usize),
    ) -> Result<(), PatternError> {
        pattern.check_fits(self.grid.width(), self.grid.height(), origin)?;
        self.populate(|x, y| Occupant::conway(pattern.alive_at_offset(x, y, origin)));
        Ok(())
    }

    /// Compute the next generation, run cycle detection on it and make it current.
    ///
    /// Returns the cycle on the generation where it is first detected.
    pub fn advance(&mut self) -> Option<Cycle> {
        self.grid.clear_next_substances();
        self.emissions.clear();

        self.step_occupant_phase();
        self.step_diffusion_phase();
        self.step_emission_phase();

        let found = self
            .detector
            .observe(cycle::fingerprint(self.grid.next_cells()));
        self.grid.swap();
        found
    }

    /// Replace the occupant at `x`:`y` in the current generation.
    ///
    /// Cycle detection restarts from the edited state; the generation counter is kept.
    /// Returns `false` outside the dish.
    pub fn edit(&mut self, x: isize, y: isize, occupant: Occupant) -> bool {
        let Some(cell) = self.grid.current_cell_mut(x, y) else {
            return false;
        };
        cell.occupant = occupant;
        self.restart_detection();
        true
    }

    /// Flip the alive flag of a Conway organism at `x`:`y`. Other occupants are left alone.
    pub fn toggle(&mut self, x: isize, y: isize) -> bool {
        let flipped = match self.grid.get(x, y) {
            Occupant::Organism(Organism::Conway { alive }) => Occupant::conway(!alive),
            Occupant::Empty | Occupant::Device(_) | Occupant::Extent { .. } => return false,
        };
        self.edit(x, y, flipped)
    }

    /// Write a local substance intensity into the current generation, subject to the
    /// type's dissolution and saturation. Restarts cycle detection like [`Self::edit`].
    pub fn deposit<K: SubstanceKind>(&mut self, x: isize, y: isize, kind: K, intensity: f32) -> bool {
        let Some(cell) = self.grid.current_cell_mut(x, y) else {
            return false;
        };
        match settle(kind, intensity) {
            Some(value) => cell.set_intensity(kind, value),
            None => cell.remove_substance(kind),
        }
        self.restart_detection();
        true
    }

    fn restart_detection(&mut self) {
        let fingerprint = cycle::fingerprint(self.grid.cells().map(|(_, _, cell)| cell));
        self.detector.reset_detection();
        self.detector.record(fingerprint);
    }

    pub fn stats(&self) -> GenerationStats {
        crate::metrics::collect_generation_stats(&self.grid, &self.detector)
    }

    /// Advance `generations` times, sampling statistics every `sample_every` generations
    /// and after the last one. Re-populates with a fresh soup on cycles when configured.
    pub fn run(&mut self, generations: usize, sample_every: usize) -> Result<RunSummary, RunError> {
        if sample_every == 0 {
            return Err(RunError::InvalidSampleEvery);
        }
        if generations > Self::MAX_RUN_GENERATIONS {
            return Err(RunError::TooManyGenerations {
                max: Self::MAX_RUN_GENERATIONS,
                actual: generations,
            });
        }

        let mut samples = Vec::with_capacity(generations / sample_every + 1);
        let mut cycles = Vec::new();
        let mut restarts = 0usize;
        for step in 1..=generations {
            if let Some(found) = self.advance() {
                cycles.push(found);
            }
            if step % sample_every == 0 || step == generations {
                samples.push(self.stats());
            }
            if self.config.restart_on_cycle && self.repeat_period() != 0 && step != generations {
                debug!(generation = self.generation(), "restarting after cycle");
                self.populate_random();
                restarts += 1;
            }
        }
        Ok(crate::metrics::summarize(
            generations,
            sample_every,
            samples,
            &cycles,
            restarts,
            self.stats(),
        ))
    }

    /// Project the current generation through an external renderer's `projector`.
    pub fn project<P: Projector>(&self, projector: &P) -> Vec<Projection<P::View>> {
        crate::render::project(&self.grid, projector)
    }
}

mod phases;
#[cfg(test)]
mod tests;
