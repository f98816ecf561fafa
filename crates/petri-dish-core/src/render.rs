//! Hook for external renderers.
//!
//! The engine never builds or stores a visual. A renderer implements [`Projector`] to map
//! occupants and substances to its own view type, and pulls the projection after each
//! generation.

use crate::grid::Grid;
use crate::occupant::Occupant;
use crate::substance::{Agent, Energy};

pub trait Projector {
    type View;

    fn occupant(&self, occupant: &Occupant) -> Option<Self::View>;

    fn agent(&self, _agent: &Agent) -> Option<Self::View> {
        None
    }

    fn energy(&self, _energy: &Energy) -> Option<Self::View> {
        None
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Projection<V> {
    pub x: usize,
    pub y: usize,
    pub view: V,
}

/// Project the current generation in paint order: agents, then the occupant, then energies.
pub fn project<P: Projector>(grid: &Grid, projector: &P) -> Vec<Projection<P::View>> {
    let mut out = Vec::new();
    for (x, y, cell) in grid.cells() {
        let agents = cell.agents.values().filter_map(|a| projector.agent(a));
        let occupant = projector.occupant(&cell.occupant);
        let energies = cell.energies.values().filter_map(|e| projector.energy(e));
        out.extend(
            agents
                .chain(occupant)
                .chain(energies)
                .map(|view| Projection { x, y, view }),
        );
    }
    out
}
