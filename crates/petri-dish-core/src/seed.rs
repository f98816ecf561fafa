//! Population callbacks for [`crate::dish::PetriDish::populate`].

use crate::occupant::Occupant;
use rand::Rng;
use rand_chacha::ChaCha12Rng;
use std::fmt;

/// Random Conway soup: each cell is alive with probability `density`.
pub fn random_conway(seed: u64, density: f32) -> impl FnMut(usize, usize) -> Occupant {
    conway_soup(crate::rng::create_rng(seed), density)
}

/// Random Conway soup drawing from an existing RNG stream.
pub fn conway_soup(mut rng: ChaCha12Rng, density: f32) -> impl FnMut(usize, usize) -> Occupant {
    move |_, _| Occupant::conway(rng.random::<f32>() < density)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    Empty,
    UnknownGlyph { line: usize, column: usize, glyph: char },
    DoesNotFit {
        pattern: (usize, usize),
        origin: (usize, usize),
        dish: (usize, usize),
    },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::Empty => write!(f, "pattern has no cells"),
            PatternError::UnknownGlyph { line, column, glyph } => {
                write!(f, "unknown glyph {glyph:?} at line {line}, column {column}")
            }
            PatternError::DoesNotFit {
                pattern,
                origin,
                dish,
            } => write!(
                f,
                "pattern {}x{} at {}:{} does not fit a {}x{} dish",
                pattern.0, pattern.1, origin.0, origin.1, dish.0, dish.1
            ),
        }
    }
}

impl std::error::Error for PatternError {}

/// A rectangular Conway pattern in plaintext form: `O` or `*` alive, `.` dead, lines
/// starting with `!` are comments. Short lines are padded with dead cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    width: usize,
    height: usize,
    alive: Vec<bool>,
}

impl Pattern {
    pub fn parse(text: &str) -> Result<Self, PatternError> {
        let mut rows: Vec<Vec<bool>> = Vec::new();
        for (line_idx, line) in text.lines().enumerate() {
            let line = line.trim_end();
            if line.starts_with('!') {
                continue;
            }
            let mut row = Vec::with_capacity(line.len());
            for (column, glyph) in line.chars().enumerate() {
                match glyph {
                    'O' | '*' => row.push(true),
                    '.' => row.push(false),
                    _ => {
                        return Err(PatternError::UnknownGlyph {
                            line: line_idx + 1,
                            column: column + 1,
                            glyph,
                        })
                    }
                }
            }
            rows.push(row);
        }
        while rows.last().is_some_and(|row| row.is_empty()) {
            rows.pop();
        }

        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let height = rows.len();
        if width == 0 {
            return Err(PatternError::Empty);
        }
        let mut alive = Vec::with_capacity(width * height);
        for mut row in rows {
            row.resize(width, false);
            alive.extend(row);
        }
        Ok(Self {
            width,
            height,
            alive,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn alive_at(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.alive[y * self.width + x]
    }

    /// Whether dish cell `x`:`y` is alive when the pattern sits at `origin`.
    pub fn alive_at_offset(&self, x: usize, y: usize, origin: (usize, usize)) -> bool {
        match (x.checked_sub(origin.0), y.checked_sub(origin.1)) {
            (Some(px), Some(py)) => self.alive_at(px, py),
            _ => false,
        }
    }

    pub fn check_fits(
        &self,
        dish_width: usize,
        dish_height: usize,
        origin: (usize, usize),
    ) -> Result<(), PatternError> {
        let fits_x = origin.0.checked_add(self.width).is_some_and(|end| end <= dish_width);
        let fits_y = origin.1.checked_add(self.height).is_some_and(|end| end <= dish_height);
        if fits_x && fits_y {
            Ok(())
        } else {
            Err(PatternError::DoesNotFit {
                pattern: (self.width, self.height),
                origin,
                dish: (dish_width, dish_height),
            })
        }
    }

    pub fn live_count(&self) -> usize {
        self.alive.iter().filter(|a| **a).count()
    }
}
