use super::super::PetriDish;
use crate::grid::Grid;
use crate::occupant::{DeviceKind, Direction, Occupant};
use crate::substance::{settle, AgentType, EnergyType, SubstanceKind};
use std::collections::BTreeSet;

impl PetriDish {
    /// Diffuse every substance layer, one cell at a time in row-major order.
    ///
    /// Each cell gathers its own next intensity from the current buffer: what it keeps of
    /// its own substance plus the shares its neighbors pass on. Writing only the gathering
    /// cell keeps every write owned by a single coordinate.
    pub(in crate::dish) fn step_diffusion_phase(&mut self) {
        let width = self.grid.width() as isize;
        let height = self.grid.height() as isize;
        for y in 0..height {
            for x in 0..width {
                self.diffuse_layer::<AgentType>(x, y);
                self.diffuse_layer::<EnergyType>(x, y);
            }
        }
    }

    fn diffuse_layer<K: SubstanceKind>(&mut self, x: isize, y: isize) {
        let kinds = kinds_near::<K>(&self.grid, x, y);
        for kind in kinds {
            let gathered = gathered_intensity(&self.grid, x, y, kind);
            if let Some(value) = settle(kind, gathered) {
                self.grid.set_intensity(x, y, kind, value);
            }
        }
    }
}

/// Substance types present in the 3×3 neighbourhood around `x`:`y`.
fn kinds_near<K: SubstanceKind>(grid: &Grid, x: isize, y: isize) -> BTreeSet<K> {
    let mut kinds = BTreeSet::new();
    for dy in -1..=1 {
        for dx in -1..=1 {
            if let Some(cell) = grid.cell(x + dx, y + dy) {
                kinds.extend(K::layer(cell).keys().copied());
            }
        }
    }
    kinds
}

/// Next local intensity of `kind` at `x`:`y` after one diffusion pass.
///
/// An originator with intensity `I` and `n` in-bounds neighbors offers `I / (n + 1)` to
/// each neighbor, scaled by how much both cells let the substance through.
pub(crate) fn gathered_intensity<K: SubstanceKind>(grid: &Grid, x: isize, y: isize, kind: K) -> f32 {
    let own = grid.local_intensity(x, y, kind);
    let own_passage = passage(grid, x, y, kind);
    let mut next = own;

    if emits(grid, x, y, kind) {
        let share = own / (in_bounds_neighbors(grid, x, y) + 1) as f32;
        for (nx, ny) in neighbors(grid, x, y) {
            next -= share * own_passage * passage(grid, nx, ny, kind);
        }
    }

    for (nx, ny) in neighbors(grid, x, y) {
        if !emits(grid, nx, ny, kind) {
            continue;
        }
        let offered = grid.local_intensity(nx, ny, kind) / (in_bounds_neighbors(grid, nx, ny) + 1) as f32;
        next += offered * passage(grid, nx, ny, kind) * own_passage;
    }
    next
}

/// Fraction of a transfer the cell lets through: one minus the strongest resisting agent's
/// intensity relative to its saturation.
pub(crate) fn passage<K: SubstanceKind>(grid: &Grid, x: isize, y: isize, kind: K) -> f32 {
    let resistance = AgentType::resisting(kind.into())
        .map(|agent| grid.intensity(x, y, agent) / agent.saturation())
        .fold(0.0f32, f32::max)
        .clamp(0.0, 1.0);
    1.0 - resistance
}

/// Whether the cell diffuses its own `kind` this generation. Replicators hold their
/// substances back to copy them instead.
fn emits<K: SubstanceKind>(grid: &Grid, x: isize, y: isize, kind: K) -> bool {
    if grid.local_intensity(x, y, kind) <= kind.dissolution() {
        return false;
    }
    match grid.get(x, y) {
        Occupant::Device(device) => match device.kind() {
            DeviceKind::Replicator => false,
            DeviceKind::Spawner { .. } => true,
        },
        Occupant::Empty | Occupant::Organism(_) | Occupant::Extent { .. } => true,
    }
}

fn neighbors(grid: &Grid, x: isize, y: isize) -> impl Iterator<Item = (isize, isize)> + '_ {
    Direction::ALL.into_iter().filter_map(move |direction| {
        let (dx, dy) = direction.offset();
        let (nx, ny) = (x + dx, y + dy);
        grid.contains(nx, ny).then_some((nx, ny))
    })
}

fn in_bounds_neighbors(grid: &Grid, x: isize, y: isize) -> usize {
    neighbors(grid, x, y).count()
}
