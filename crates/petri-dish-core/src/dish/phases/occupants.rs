use super::super::PetriDish;
use crate::grid::Grid;
use crate::occupant::{conway_rule, Direction, Occupant, Organism};

impl PetriDish {
    /// Run every occupant's behavior in row-major order, reading the current buffer and
    /// writing each cell's successor into the next buffer.
    pub(in crate::dish) fn step_occupant_phase(&mut self) {
        let width = self.grid.width() as isize;
        let height = self.grid.height() as isize;
        for y in 0..height {
            for x in 0..width {
                let next = match self.grid.get(x, y).clone() {
                    Occupant::Empty => Occupant::Empty,
                    extent @ Occupant::Extent { .. } => extent,
                    Occupant::Organism(organism) => {
                        Occupant::Organism(next_organism(&self.grid, x, y, organism))
                    }
                    Occupant::Device(device) => self.step_device(x, y, device),
                };
                self.grid.set(x, y, next);
            }
        }
    }
}

/// Living occupants among the eight surrounding cells; cells outside the dish count as dead.
pub(crate) fn live_neighbors(grid: &Grid, x: isize, y: isize) -> u8 {
    Direction::ALL
        .iter()
        .filter(|direction| {
            let (dx, dy) = direction.offset();
            grid.get(x + dx, y + dy).is_alive()
        })
        .count() as u8
}

fn next_organism(grid: &Grid, x: isize, y: isize, organism: Organism) -> Organism {
    match organism {
        Organism::Conway { alive } => Organism::Conway {
            alive: conway_rule(alive, live_neighbors(grid, x, y)),
        },
    }
}
