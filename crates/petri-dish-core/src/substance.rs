//! Diffusible quantities hosted by cells.
//!
//! Over each generation a substance diffuses from one cell (the originator) into each
//! adjacent cell (the receivers) as it seeks equilibrium. Unless a receiver resists some
//! or all of the transfer, the originator's intensity is divided evenly between it and
//! each receiver. A resulting amount at or below the type's dissolution dissolves into
//! nothing; an amount above its saturation is clamped and the excess evaporates.

use crate::cell::Cell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Write};

/// Intensity floor shared by every substance type unless tuned per type.
pub const DEFAULT_DISSOLUTION: f32 = 0.0;
/// Intensity ceiling shared by every substance type unless tuned per type.
pub const DEFAULT_SATURATION: f32 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyType {
    Electricity,
    Heat,
    Light,
    Magnetism,
    RadiationAlpha,
    RadiationBeta,
    RadiationGamma,
    Ultraviolet,
}

impl EnergyType {
    pub const ALL: [Self; 8] = [
        Self::Electricity,
        Self::Heat,
        Self::Light,
        Self::Magnetism,
        Self::RadiationAlpha,
        Self::RadiationBeta,
        Self::RadiationGamma,
        Self::Ultraviolet,
    ];

    pub fn is_radiation(self) -> bool {
        matches!(
            self,
            Self::RadiationAlpha | Self::RadiationBeta | Self::RadiationGamma
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    Acid,
    Carbohydrate,
    /// Resists light and ultraviolet.
    Darkener,
    Hydrocarbon,
    /// Resists heat.
    Insulator,
    Neutral,
    Pressure,
    /// Resists electricity and magnetism.
    Resistor,
    /// Resists every radiation band.
    Shielding,
    /// Slows organism movement; has no effect on diffusion.
    Thickener,
}

impl AgentType {
    pub const ALL: [Self; 10] = [
        Self::Acid,
        Self::Carbohydrate,
        Self::Darkener,
        Self::Hydrocarbon,
        Self::Insulator,
        Self::Neutral,
        Self::Pressure,
        Self::Resistor,
        Self::Shielding,
        Self::Thickener,
    ];

    /// Whether this agent damps diffusion of `target` into and out of its cell.
    pub fn resists(self, target: SubstanceType) -> bool {
        match self {
            Self::Darkener => matches!(
                target,
                SubstanceType::Energy(EnergyType::Light | EnergyType::Ultraviolet)
            ),
            Self::Insulator => target == SubstanceType::Energy(EnergyType::Heat),
            Self::Resistor => matches!(
                target,
                SubstanceType::Energy(EnergyType::Electricity | EnergyType::Magnetism)
            ),
            Self::Shielding => matches!(target, SubstanceType::Energy(e) if e.is_radiation()),
            Self::Acid
            | Self::Carbohydrate
            | Self::Hydrocarbon
            | Self::Neutral
            | Self::Pressure
            | Self::Thickener => false,
        }
    }

    /// Agents that resist `target`, in type order.
    pub fn resisting(target: SubstanceType) -> impl Iterator<Item = AgentType> {
        Self::ALL.into_iter().filter(move |a| a.resists(target))
    }
}

/// Either family of substance type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubstanceType {
    Agent(AgentType),
    Energy(EnergyType),
}

impl SubstanceType {
    pub fn dissolution(self) -> f32 {
        match self {
            Self::Agent(a) => a.dissolution(),
            Self::Energy(e) => e.dissolution(),
        }
    }

    pub fn saturation(self) -> f32 {
        match self {
            Self::Agent(a) => a.saturation(),
            Self::Energy(e) => e.saturation(),
        }
    }
}

impl From<AgentType> for SubstanceType {
    fn from(kind: AgentType) -> Self {
        Self::Agent(kind)
    }
}

impl From<EnergyType> for SubstanceType {
    fn from(kind: EnergyType) -> Self {
        Self::Energy(kind)
    }
}

/// A substance type family usable as a per-cell layer key.
pub trait SubstanceKind: Copy + Ord + fmt::Debug + Into<SubstanceType> + 'static {
    /// Intensity at or below which the substance vanishes.
    fn dissolution(self) -> f32 {
        DEFAULT_DISSOLUTION
    }

    /// Intensity above which the excess is discarded.
    fn saturation(self) -> f32 {
        DEFAULT_SATURATION
    }

    /// Short discriminant used in canonical codes.
    fn tag(self) -> &'static str;

    fn layer(cell: &Cell) -> &BTreeMap<Self, Substance<Self>>;

    fn layer_mut(cell: &mut Cell) -> &mut BTreeMap<Self, Substance<Self>>;
}

impl SubstanceKind for EnergyType {
    fn tag(self) -> &'static str {
        match self {
            Self::Electricity => "eE",
            Self::Heat => "eH",
            Self::Light => "eL",
            Self::Magnetism => "eM",
            Self::RadiationAlpha => "eA",
            Self::RadiationBeta => "eB",
            Self::RadiationGamma => "eG",
            Self::Ultraviolet => "eU",
        }
    }

    fn layer(cell: &Cell) -> &BTreeMap<Self, Substance<Self>> {
        &cell.energies
    }

    fn layer_mut(cell: &mut Cell) -> &mut BTreeMap<Self, Substance<Self>> {
        &mut cell.energies
    }
}

impl SubstanceKind for AgentType {
    fn tag(self) -> &'static str {
        match self {
            Self::Acid => "aA",
            Self::Carbohydrate => "aC",
            Self::Darkener => "aD",
            Self::Hydrocarbon => "aH",
            Self::Insulator => "aI",
            Self::Neutral => "aN",
            Self::Pressure => "aP",
            Self::Resistor => "aR",
            Self::Shielding => "aS",
            Self::Thickener => "aT",
        }
    }

    fn layer(cell: &Cell) -> &BTreeMap<Self, Substance<Self>> {
        &cell.agents
    }

    fn layer_mut(cell: &mut Cell) -> &mut BTreeMap<Self, Substance<Self>> {
        &mut cell.agents
    }
}

/// A quantity of one substance type resident in a cell.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Substance<K> {
    pub kind: K,
    pub intensity: f32,
}

pub type Energy = Substance<EnergyType>;
pub type Agent = Substance<AgentType>;

impl<K: SubstanceKind> Substance<K> {
    pub fn new(kind: K, intensity: f32) -> Self {
        Self { kind, intensity }
    }

    pub fn dissolution(&self) -> f32 {
        self.kind.dissolution()
    }

    pub fn saturation(&self) -> f32 {
        self.kind.saturation()
    }

    /// Whether the substance is strong enough to persist and diffuse.
    pub fn is_present(&self) -> bool {
        self.intensity > self.kind.dissolution()
    }

    /// Append the canonical code: type tag followed by the exact intensity bits.
    pub fn write_code(&self, out: &mut String) {
        out.push_str(self.kind.tag());
        // Writing into a String cannot fail.
        let _ = write!(out, "{:08x};", self.intensity.to_bits());
    }

    pub fn code(&self) -> String {
        let mut out = String::with_capacity(12);
        self.write_code(&mut out);
        out
    }
}

/// Apply the dissolution floor and saturation ceiling of `kind` to a raw intensity.
///
/// Returns `None` when the substance dissolves.
pub fn settle<K: SubstanceKind>(kind: K, intensity: f32) -> Option<f32> {
    if !intensity.is_finite() || intensity <= kind.dissolution() {
        None
    } else {
        Some(intensity.min(kind.saturation()))
    }
}
