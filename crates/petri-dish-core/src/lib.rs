pub mod cell;
pub mod config;
pub mod constants;
pub mod cycle;
pub mod dish;
pub mod grid;
pub mod metrics;
pub mod occupant;
pub mod render;
pub mod rng;
pub mod seed;
pub mod substance;

pub use cell::Cell;
pub use config::{DishConfig, DishConfigError};
pub use cycle::Cycle;
pub use dish::{DishInitError, PetriDish, RunError};
pub use metrics::{CycleReport, GenerationStats, RunSummary};
pub use occupant::{Device, DeviceKind, Direction, Occupant, Organism, Spread, Supply};
pub use render::{Projection, Projector};
pub use seed::{Pattern, PatternError};
pub use substance::{AgentType, EnergyType, SubstanceType};
