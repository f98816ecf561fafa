use crate::occupant::Occupant;
use crate::substance::{Agent, AgentType, Energy, EnergyType, Substance, SubstanceKind};
use std::collections::BTreeMap;

/// Contents of one dish cell: one occupant plus at most one substance per type.
///
/// Substance layers are ordered maps, so iteration (and therefore the canonical code)
/// always follows the fixed type order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cell {
    pub occupant: Occupant,
    pub agents: BTreeMap<AgentType, Agent>,
    pub energies: BTreeMap<EnergyType, Energy>,
}

impl Cell {
    pub fn with_occupant(occupant: Occupant) -> Self {
        Self {
            occupant,
            ..Self::default()
        }
    }

    /// Local intensity of `kind`; absence means zero.
    pub fn intensity<K: SubstanceKind>(&self, kind: K) -> f32 {
        K::layer(self).get(&kind).map_or(0.0, |s| s.intensity)
    }

    /// Write the local intensity of `kind`, creating the entry if absent.
    pub fn set_intensity<K: SubstanceKind>(&mut self, kind: K, intensity: f32) {
        K::layer_mut(self)
            .entry(kind)
            .or_insert_with(|| Substance::new(kind, 0.0))
            .intensity = intensity;
    }

    pub fn remove_substance<K: SubstanceKind>(&mut self, kind: K) {
        K::layer_mut(self).remove(&kind);
    }

    pub fn clear_substances(&mut self) {
        self.agents.clear();
        self.energies.clear();
    }

    pub fn has_substances(&self) -> bool {
        !self.agents.is_empty() || !self.energies.is_empty()
    }

    /// Append the canonical code: occupant, then agents, then energies in type order.
    pub fn write_code(&self, out: &mut String) {
        self.occupant.write_code(out);
        for agent in self.agents.values() {
            agent.write_code(out);
        }
        for energy in self.energies.values() {
            energy.write_code(out);
        }
        out.push('|');
    }

    pub fn code(&self) -> String {
        let mut out = String::with_capacity(16);
        self.write_code(&mut out);
        out
    }
}
