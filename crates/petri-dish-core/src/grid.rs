use crate::cell::Cell;
use crate::occupant::Occupant;
use crate::substance::{SubstanceKind, SubstanceType};
use std::collections::BTreeMap;

static EMPTY: Occupant = Occupant::Empty;

/// World-wide base intensity per substance type, added to every in-bounds cell's local level.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Ambient {
    levels: BTreeMap<SubstanceType, f32>,
}

impl Ambient {
    pub fn level(&self, kind: impl Into<SubstanceType>) -> f32 {
        self.levels.get(&kind.into()).copied().unwrap_or(0.0)
    }

    /// Set the base level; zero removes the entry.
    pub fn set(&mut self, kind: impl Into<SubstanceType>, level: f32) {
        let kind = kind.into();
        if level == 0.0 {
            self.levels.remove(&kind);
        } else {
            self.levels.insert(kind, level);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (SubstanceType, f32)> + '_ {
        self.levels.iter().map(|(k, v)| (*k, *v))
    }
}

/// Double-buffered 2D cell store.
///
/// Reads (`get`, `intensity`, `local_intensity`) target the current buffer; writes (`set`,
/// `set_intensity`) target the next buffer. Coordinates outside `[0,width)×[0,height)` read
/// as empty/zero and ignore writes. There is no wraparound.
#[derive(Clone, Debug)]
pub struct Grid {
    width: usize,
    height: usize,
    buffers: [Vec<Cell>; 2],
    current: usize,
    ambient: Ambient,
}

impl Grid {
    pub(crate) fn new(width: usize, height: usize) -> Self {
        assert!(width > 0 && height > 0, "grid dimensions must be positive");
        assert!(
            width.checked_mul(height).is_some(),
            "grid cell count must fit in usize"
        );
        let len = width * height;
        Self {
            width,
            height,
            buffers: [vec![Cell::default(); len], vec![Cell::default(); len]],
            current: 0,
            ambient: Ambient::default(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn contains(&self, x: isize, y: isize) -> bool {
        self.index(x, y).is_some()
    }

    /// Occupant at `x`:`y` in the current generation; `Empty` outside the dish.
    pub fn get(&self, x: isize, y: isize) -> &Occupant {
        match self.index(x, y) {
            Some(idx) => &self.buffers[self.current][idx].occupant,
            None => &EMPTY,
        }
    }

    /// Set the occupant at `x`:`y` for the next generation.
    pub fn set(&mut self, x: isize, y: isize, occupant: Occupant) {
        if let Some(idx) = self.index(x, y) {
            self.buffers[1 - self.current][idx].occupant = occupant;
        }
    }

    /// Ambient plus local intensity of `kind` at `x`:`y` in the current generation.
    pub fn intensity<K: SubstanceKind>(&self, x: isize, y: isize, kind: K) -> f32 {
        match self.index(x, y) {
            Some(idx) => self.ambient.level(kind) + self.buffers[self.current][idx].intensity(kind),
            None => 0.0,
        }
    }

    /// Local intensity of `kind` at `x`:`y` in the current generation, ignoring ambient.
    pub fn local_intensity<K: SubstanceKind>(&self, x: isize, y: isize, kind: K) -> f32 {
        self.index(x, y)
            .map_or(0.0, |idx| self.buffers[self.current][idx].intensity(kind))
    }

    /// Set the local intensity of `kind` at `x`:`y` for the next generation.
    pub fn set_intensity<K: SubstanceKind>(&mut self, x: isize, y: isize, kind: K, intensity: f32) {
        if let Some(idx) = self.index(x, y) {
            self.buffers[1 - self.current][idx].set_intensity(kind, intensity);
        }
    }

    /// Current-generation cell at `x`:`y`.
    pub fn cell(&self, x: isize, y: isize) -> Option<&Cell> {
        self.index(x, y).map(|idx| &self.buffers[self.current][idx])
    }

    /// Current-generation cells in row-major order with their coordinates.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &Cell)> + '_ {
        let width = self.width;
        self.buffers[self.current]
            .iter()
            .enumerate()
            .map(move |(idx, cell)| (idx % width, idx / width, cell))
    }

    pub fn ambient(&self) -> &Ambient {
        &self.ambient
    }

    pub(crate) fn ambient_mut(&mut self) -> &mut Ambient {
        &mut self.ambient
    }

    /// Next-generation cells in row-major order.
    pub(crate) fn next_cells(&self) -> &[Cell] {
        &self.buffers[1 - self.current]
    }

    pub(crate) fn next_cell_mut(&mut self, x: isize, y: isize) -> Option<&mut Cell> {
        let idx = self.index(x, y)?;
        Some(&mut self.buffers[1 - self.current][idx])
    }

    pub(crate) fn current_cell_mut(&mut self, x: isize, y: isize) -> Option<&mut Cell> {
        let idx = self.index(x, y)?;
        Some(&mut self.buffers[self.current][idx])
    }

    /// Drop every substance from the next buffer so nothing stale survives a generation.
    pub(crate) fn clear_next_substances(&mut self) {
        for cell in &mut self.buffers[1 - self.current] {
            cell.clear_substances();
        }
    }

    /// Reset both buffers to empty cells.
    pub(crate) fn clear(&mut self) {
        for buffer in &mut self.buffers {
            buffer.fill(Cell::default());
        }
    }

    /// Commit the next generation: it becomes current, and the old current is recycled.
    pub(crate) fn swap(&mut self) {
        self.current = 1 - self.current;
    }

    fn index(&self, x: isize, y: isize) -> Option<usize> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y * self.width + x)
    }
}
