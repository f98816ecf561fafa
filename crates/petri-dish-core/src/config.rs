use crate::substance::{AgentType, EnergyType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DishConfig {
    /// Deterministic seed for device trials and random seeding.
    pub seed: u64,
    /// Number of columns in the dish.
    pub width: usize,
    /// Number of rows in the dish.
    pub height: usize,
    /// Maximum number of generation fingerprints kept for cycle detection.
    pub history_capacity: usize,
    /// Probability that a randomly seeded Conway cell starts alive.
    pub conway_density: f32,
    /// World-wide base agent levels added to every cell's local intensity.
    pub ambient_agents: BTreeMap<AgentType, f32>,
    /// World-wide base energy levels added to every cell's local intensity.
    pub ambient_energies: BTreeMap<EnergyType, f32>,
    /// Re-populate with a fresh soup once a cycle has been detected.
    pub restart_on_cycle: bool,
}

impl Default for DishConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            width: 320,
            height: 180,
            history_capacity: crate::constants::MAX_GENERATIONS_CHECKED,
            conway_density: 0.5,
            ambient_agents: BTreeMap::new(),
            ambient_energies: BTreeMap::new(),
            restart_on_cycle: false,
        }
    }
}

macro_rules! define_dish_config_error {
    (
        $(
            $variant:ident $( { $($field:ident : $type:ty),* } )? => $fmt:literal $(, $arg:expr)*
        );* $(;)?
    ) => {
        #[derive(Debug, Clone, PartialEq)]
        pub enum DishConfigError {
            $(
                $variant $( { $($field : $type),* } )?,
            )*
        }

        impl std::fmt::Display for DishConfigError {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        Self::$variant $( { $($field),* } )? => write!(f, $fmt $(, $arg)*),
                    )*
                }
            }
        }
    };
}

define_dish_config_error! {
    InvalidWidth => "width must be greater than 0";
    InvalidHeight => "height must be greater than 0";
    DimensionTooLarge { max: usize, actual: usize } => "dish dimension ({actual}) exceeds supported maximum ({max})";
    CellCountOverflow => "width * height overflows usize";
    InvalidHistoryCapacity => "history_capacity must be greater than 0";
    InvalidConwayDensity => "conway_density must be finite and within [0,1]";
    InvalidAmbientAgent { kind: AgentType } => "ambient level for agent {:?} must be finite and non-negative", kind;
    InvalidAmbientEnergy { kind: EnergyType } => "ambient level for energy {:?} must be finite and non-negative", kind;
}

impl std::error::Error for DishConfigError {}

impl DishConfig {
    pub const MAX_DISH_DIMENSION: usize = crate::constants::MAX_DISH_DIMENSION;

    pub fn validate(&self) -> Result<(), DishConfigError> {
        self.validate_dimensions()?;
        self.validate_seeding()?;
        self.validate_ambient()?;
        Ok(())
    }

    fn validate_dimensions(&self) -> Result<(), DishConfigError> {
        if self.width == 0 {
            return Err(DishConfigError::InvalidWidth);
        }
        if self.height == 0 {
            return Err(DishConfigError::InvalidHeight);
        }
        for actual in [self.width, self.height] {
            if actual > Self::MAX_DISH_DIMENSION {
                return Err(DishConfigError::DimensionTooLarge {
                    max: Self::MAX_DISH_DIMENSION,
                    actual,
                });
            }
        }
        self.width
            .checked_mul(self.height)
            .ok_or(DishConfigError::CellCountOverflow)?;
        if self.history_capacity == 0 {
            return Err(DishConfigError::InvalidHistoryCapacity);
        }
        Ok(())
    }

    fn validate_seeding(&self) -> Result<(), DishConfigError> {
        if !(self.conway_density.is_finite() && (0.0..=1.0).contains(&self.conway_density)) {
            return Err(DishConfigError::InvalidConwayDensity);
        }
        Ok(())
    }

    fn validate_ambient(&self) -> Result<(), DishConfigError> {
        for (&kind, &level) in &self.ambient_agents {
            if !(level.is_finite() && level >= 0.0) {
                return Err(DishConfigError::InvalidAmbientAgent { kind });
            }
        }
        for (&kind, &level) in &self.ambient_energies {
            if !(level.is_finite() && level >= 0.0) {
                return Err(DishConfigError::InvalidAmbientEnergy { kind });
            }
        }
        Ok(())
    }
}
