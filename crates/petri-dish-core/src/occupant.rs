use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};
use std::ops::RangeInclusive;

/// The single primary entity resident in a cell.
///
/// Behavior dispatch over occupants is always an exhaustive `match`, so adding a variant
/// forces every call site that inspects occupant identity to be revisited.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Occupant {
    /// Neither an organism nor a device.
    #[default]
    Empty,
    Organism(Organism),
    Device(Device),
    /// The body of an organism that extends beyond its centre at `column`:`row`.
    Extent { column: usize, row: usize },
}

impl Occupant {
    pub const EMPTY: Occupant = Occupant::Empty;

    pub fn conway(alive: bool) -> Self {
        Self::Organism(Organism::Conway { alive })
    }

    /// Whether the occupant counts as a living neighbor.
    pub fn is_alive(&self) -> bool {
        match self {
            Self::Organism(organism) => organism.is_alive(),
            Self::Empty | Self::Device(_) | Self::Extent { .. } => false,
        }
    }

    /// Whether a renderer would draw this occupant by default.
    pub fn is_visible(&self) -> bool {
        match self {
            Self::Organism(organism) => organism.is_alive(),
            Self::Empty | Self::Device(_) | Self::Extent { .. } => false,
        }
    }

    pub fn as_device(&self) -> Option<&Device> {
        match self {
            Self::Device(device) => Some(device),
            Self::Empty | Self::Organism(_) | Self::Extent { .. } => None,
        }
    }

    /// Append the canonical code used as cycle-detection fingerprint input.
    pub fn write_code(&self, out: &mut String) {
        match self {
            Self::Empty => out.push('_'),
            Self::Organism(organism) => organism.write_code(out),
            Self::Device(device) => device.write_code(out),
            Self::Extent { column, row } => {
                let _ = write!(out, "X{column},{row};");
            }
        }
    }

    pub fn code(&self) -> String {
        let mut out = String::with_capacity(8);
        self.write_code(&mut out);
        out
    }
}

/// A living (or pseudo-living) occupant governed by a survival rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Organism {
    /// Follows the rules of Conway's Game of Life.
    Conway { alive: bool },
}

impl Organism {
    pub const LIVE: Organism = Organism::Conway { alive: true };
    pub const DEAD: Organism = Organism::Conway { alive: false };

    pub fn is_alive(self) -> bool {
        match self {
            Self::Conway { alive } => alive,
        }
    }

    fn write_code(self, out: &mut String) {
        match self {
            Self::Conway { alive: true } => out.push_str("C1"),
            Self::Conway { alive: false } => out.push_str("C0"),
        }
    }
}

/// Conway transition: survival on 2 or 3 live neighbors, birth on exactly 3.
pub fn conway_rule(alive: bool, live_neighbors: u8) -> bool {
    match (alive, live_neighbors) {
        (true, 2 | 3) => true,
        (false, 3) => true,
        _ => false,
    }
}

/// Compass position of a target cell around a device, numbered clockwise from north:
///
/// ```text
/// 8 1 2
/// 7 D 3
/// 6 5 4
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    North = 1,
    NorthEast = 2,
    East = 3,
    SouthEast = 4,
    South = 5,
    SouthWest = 6,
    West = 7,
    NorthWest = 8,
}

impl Direction {
    pub const ALL: [Self; 8] = [
        Self::North,
        Self::NorthEast,
        Self::East,
        Self::SouthEast,
        Self::South,
        Self::SouthWest,
        Self::West,
        Self::NorthWest,
    ];

    pub fn from_number(number: u8) -> Result<Self, SpreadError> {
        match number {
            1..=8 => Ok(Self::ALL[number as usize - 1]),
            _ => Err(SpreadError::InvalidDirection(number)),
        }
    }

    pub fn number(self) -> u8 {
        self as u8
    }

    /// Column/row offset of the target; rows grow downward so north is `-1`.
    pub fn offset(self) -> (isize, isize) {
        match self {
            Self::North => (0, -1),
            Self::NorthEast => (1, -1),
            Self::East => (1, 0),
            Self::SouthEast => (1, 1),
            Self::South => (0, 1),
            Self::SouthWest => (-1, 1),
            Self::West => (-1, 0),
            Self::NorthWest => (-1, -1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpreadError {
    InvalidDirection(u8),
}

impl fmt::Display for SpreadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpreadError::InvalidDirection(n) => {
                write!(f, "spread direction {n} is outside 1..=8")
            }
        }
    }
}

impl std::error::Error for SpreadError {}

/// Set of directions a device acts upon, stored as a bitmask (bit `n - 1` for direction `n`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Spread(pub u8);

impl Spread {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(0xFF);

    /// Spread over a contiguous run of direction numbers, e.g. `1..=8`.
    pub fn range(numbers: RangeInclusive<u8>) -> Result<Self, SpreadError> {
        Self::from_numbers(numbers)
    }

    pub fn from_numbers(numbers: impl IntoIterator<Item = u8>) -> Result<Self, SpreadError> {
        let mut spread = Self::NONE;
        for number in numbers {
            spread.insert(Direction::from_number(number)?);
        }
        Ok(spread)
    }

    #[inline]
    pub fn contains(self, direction: Direction) -> bool {
        self.0 & (1 << (direction.number() - 1)) != 0
    }

    #[inline]
    pub fn insert(&mut self, direction: Direction) {
        self.0 |= 1 << (direction.number() - 1);
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Directions in clockwise order starting from north.
    pub fn directions(self) -> impl Iterator<Item = Direction> {
        Direction::ALL.into_iter().filter(move |d| self.contains(*d))
    }
}

/// Remaining emissions of a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Supply {
    Infinite,
    Remaining(u64),
}

impl Supply {
    pub fn is_exhausted(self) -> bool {
        self == Self::Remaining(0)
    }

    /// Spend one emission; infinite supplies never run out.
    pub fn consume(&mut self) {
        if let Self::Remaining(n) = self {
            *n = n.saturating_sub(1);
        }
    }
}

impl From<i64> for Supply {
    /// Negative counts (conventionally `-1`) mean an infinite supply.
    fn from(raw: i64) -> Self {
        u64::try_from(raw).map_or(Self::Infinite, Self::Remaining)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    /// Replicates its host cell's substances into targets instead of diffusing them.
    Replicator,
    /// Places a copy of `organism` into targets.
    Spawner { organism: Organism },
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceError {
    InvalidProbability(f32),
    InvalidFrequency(f32),
    EmptySpread,
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::InvalidProbability(p) => {
                write!(f, "probability ({p}) must be finite and within [0,1]")
            }
            DeviceError::InvalidFrequency(v) => {
                write!(
                    f,
                    "frequency ({v}) must be finite and within [0,{}]",
                    crate::constants::MAX_DEVICE_FREQUENCY
                )
            }
            DeviceError::EmptySpread => write!(f, "spread must name at least one direction"),
        }
    }
}

impl std::error::Error for DeviceError {}

/// A resource-limited occupant that emits effects into surrounding cells at `frequency`
/// activations per generation, each target succeeding with `probability`, until its
/// `supply` runs out. It then disintegrates with one final attempt on its own cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDevice")]
pub struct Device {
    // Private, and deserialized through `Device::new`, so probability and frequency stay valid.
    kind: DeviceKind,
    spread: Spread,
    frequency: f32,
    probability: f32,
    supply: Supply,
}

impl Device {
    pub fn new(
        kind: DeviceKind,
        spread: Spread,
        frequency: f32,
        probability: f32,
        supply: Supply,
    ) -> Result<Self, DeviceError> {
        if !(probability.is_finite() && (0.0..=1.0).contains(&probability)) {
            return Err(DeviceError::InvalidProbability(probability));
        }
        if !(frequency.is_finite()
            && (0.0..=crate::constants::MAX_DEVICE_FREQUENCY).contains(&frequency))
        {
            return Err(DeviceError::InvalidFrequency(frequency));
        }
        if spread.is_empty() {
            return Err(DeviceError::EmptySpread);
        }
        Ok(Self {
            kind,
            spread,
            frequency,
            probability,
            supply,
        })
    }

    /// Replicator over all eight neighbors, always acting, with an infinite supply.
    pub fn replicator() -> Self {
        Self {
            kind: DeviceKind::Replicator,
            spread: Spread::ALL,
            frequency: 1.0,
            probability: 1.0,
            supply: Supply::Infinite,
        }
    }

    /// Spawner of `organism` over all eight neighbors, always acting, with an infinite supply.
    pub fn spawner(organism: Organism) -> Self {
        Self {
            kind: DeviceKind::Spawner { organism },
            ..Self::replicator()
        }
    }

    pub fn with_supply(mut self, supply: Supply) -> Self {
        self.supply = supply;
        self
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn spread(&self) -> Spread {
        self.spread
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn probability(&self) -> f32 {
        self.probability
    }

    pub fn supply(&self) -> Supply {
        self.supply
    }

    pub(crate) fn supply_mut(&mut self) -> &mut Supply {
        &mut self.supply
    }

    fn write_code(&self, out: &mut String) {
        match self.kind {
            DeviceKind::Replicator => out.push('R'),
            DeviceKind::Spawner { organism } => {
                out.push('S');
                organism.write_code(out);
            }
        }
        let _ = write!(
            out,
            "{:02x}{:08x}{:08x}",
            self.spread.0,
            self.frequency.to_bits(),
            self.probability.to_bits()
        );
        match self.supply {
            Supply::Infinite => out.push_str("i;"),
            Supply::Remaining(n) => {
                let _ = write!(out, "{n};");
            }
        }
    }
}

/// Unchecked wire form of a [`Device`].
#[derive(Deserialize)]
struct RawDevice {
    kind: DeviceKind,
    spread: Spread,
    frequency: f32,
    probability: f32,
    supply: Supply,
}

impl TryFrom<RawDevice> for Device {
    type Error = DeviceError;

    fn try_from(raw: RawDevice) -> Result<Self, Self::Error> {
        Device::new(
            raw.kind,
            raw.spread,
            raw.frequency,
            raw.probability,
            raw.supply,
        )
    }
}

impl From<Device> for Occupant {
    fn from(device: Device) -> Self {
        Occupant::Device(device)
    }
}

impl From<Organism> for Occupant {
    fn from(organism: Organism) -> Self {
        Occupant::Organism(organism)
    }
}
