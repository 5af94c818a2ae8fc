/*!
This module handles the playing [`Grid`] of locked cells.
*/

use std::{collections::VecDeque, fmt};

use crate::{Coord, Piece, Size};

/// The two fixed grid dimension sets a session can be started with.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Default, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GridProfile {
    /// 10 columns × 24 rows.
    #[default]
    Narrow,
    /// 18 columns × 18 rows.
    Square,
}

impl GridProfile {
    /// All `GridProfile` enum variants.
    pub const VARIANTS: [Self; 2] = [GridProfile::Narrow, GridProfile::Square];

    /// Dimensions `(columns, rows)` of the profile.
    pub const fn size(&self) -> Size {
        match self {
            GridProfile::Narrow => (10, 24),
            GridProfile::Square => (18, 18),
        }
    }
}

/// An occupancy lookup addressed a cell outside the grid's column range or below its last row.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
pub struct OutOfRange {
    /// Column that was looked up.
    pub col: isize,
    /// Row that was looked up.
    pub row: isize,
}

/// Result of merging a piece into the grid.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
pub enum LockOutcome {
    /// The piece settled entirely below the top row.
    Settled,
    /// Some cell of the piece locked in or above the top row; the session is lost.
    ToppedOut,
}

/// Rectangular occupancy matrix of locked cells.
///
/// Row `0` is the topmost visible row. Rows above it (negative row indices) never hold locked
/// cells; a falling piece may still occupy them before it enters the grid.
#[derive(Eq, PartialEq, Clone, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Grid {
    width: usize,
    rows: VecDeque<Vec<bool>>,
}

impl Grid {
    /// Allocates an empty grid.
    pub fn new((width, height): Size) -> Self {
        Self {
            width,
            rows: (0..height).map(|_| vec![false; width]).collect(),
        }
    }

    /// Allocates an empty grid with the dimensions of the given profile.
    pub fn with_profile(profile: GridProfile) -> Self {
        Self::new(profile.size())
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Dimensions `(columns, rows)`.
    pub fn size(&self) -> Size {
        (self.width(), self.height())
    }

    /// Iterates over the rows top-to-bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Whether the cell at `(col, row)` is occupied.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRange`] if `col` lies outside `0..width` or `row` outside `0..height`.
    pub fn cell(&self, col: isize, row: isize) -> Result<bool, OutOfRange> {
        let out_of_range = OutOfRange { col, row };
        let x = usize::try_from(col)
            .ok()
            .filter(|&x| x < self.width)
            .ok_or(out_of_range)?;
        let y = usize::try_from(row).map_err(|_| out_of_range)?;
        self.rows
            .get(y)
            .map(|line| line[x])
            .ok_or(out_of_range)
    }

    /// Collision predicate for rotation and horizontal-move validation:
    /// out-of-range lookups, including rows above the grid, count as blocked.
    pub fn blocked_strict(&self, (col, row): Coord) -> bool {
        self.cell(col, row).unwrap_or(true)
    }

    /// Collision predicate for gravity and hard-drop probes:
    /// out-of-range lookups, including rows above the grid, count as free.
    pub fn blocked_permissive(&self, (col, row): Coord) -> bool {
        self.cell(col, row).unwrap_or(false)
    }

    /// Merges every in-bounds occupied cell of `piece` into the grid.
    ///
    /// Reports [`LockOutcome::ToppedOut`] if any occupied cell of the piece lies in row `0` or above.
    pub fn lock(&mut self, piece: &Piece) -> LockOutcome {
        let mut outcome = LockOutcome::Settled;
        for (col, row) in piece.occupied_cells() {
            if row <= 0 {
                outcome = LockOutcome::ToppedOut;
            }
            let (Ok(x), Ok(y)) = (usize::try_from(col), usize::try_from(row)) else {
                continue;
            };
            if let Some(cell) = self.rows.get_mut(y).and_then(|line| line.get_mut(x)) {
                *cell = true;
            }
        }
        outcome
    }

    /// Indices of all completely occupied rows, top-to-bottom.
    pub fn full_rows(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, line)| line.iter().all(|&c| c))
            .map(|(y, _)| y)
            .collect()
    }

    /// Removes the given rows and inserts as many empty rows at the top.
    ///
    /// Row indices refer to the grid as it was before the call. Out-of-range and duplicate indices
    /// are ignored.
    pub fn clear_rows(&mut self, row_indices: &[usize]) {
        let mut sorted = row_indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        // Removing top-to-bottom and re-inserting at the top leaves every row below the
        // current index where it was.
        for y in sorted {
            if y < self.rows.len() {
                self.rows.remove(y);
                self.rows.push_front(vec![false; self.width]);
            }
        }
    }

    /// Empties every cell.
    pub fn clear(&mut self) {
        for line in &mut self.rows {
            line.fill(false);
        }
    }

    /// Number of occupied cells.
    pub fn occupied_count(&self) -> usize {
        self.rows.iter().flatten().filter(|&&c| c).count()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.rows {
            let s: String = line.iter().map(|&c| if c { '#' } else { '.' }).collect();
            writeln!(f, "{s}")?;
        }
        Ok(())
    }
}
