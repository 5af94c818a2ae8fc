/*!
This module handles the [`Piece`] under player control.
*/

use crate::{Color, Coord, Grid, Matrix, Offset, RotationSystem, Shape, ShapeError, Size};

/// A polyomino in play: an occupancy matrix placed on the grid at an anchor.
///
/// The matrix is guaranteed to be rectangular and to contain at least one occupied cell.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Piece {
    cells: Matrix,
    size: Size,
    /// Position of the matrix's top-left corner on the grid.
    pub anchor: Coord,
    /// Display tag.
    pub color: Color,
}

impl Piece {
    /// Creates a piece from an arbitrary occupancy matrix.
    ///
    /// # Errors
    ///
    /// Fails with [`ShapeError`] if the matrix is empty, not rectangular, or has no occupied cell.
    pub fn new(cells: Matrix, color: Color, anchor: Coord) -> Result<Self, ShapeError> {
        let size = validate(&cells)?;
        Ok(Self {
            cells,
            size,
            anchor,
            color,
        })
    }

    /// Creates a piece of one of the catalog shapes.
    pub fn from_shape(shape: Shape, color: Color, anchor: Coord) -> Self {
        let cells = shape.matrix();
        let size = (cells[0].len(), cells.len());
        Self {
            cells,
            size,
            anchor,
            color,
        }
    }

    /// The occupancy matrix.
    pub fn cells(&self) -> &Matrix {
        &self.cells
    }

    /// Dimensions `(columns, rows)` of the occupancy matrix.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Number of matrix columns.
    pub fn width(&self) -> usize {
        self.size.0
    }

    /// Number of matrix rows.
    pub fn height(&self) -> usize {
        self.size.1
    }

    /// Number of occupied cells.
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().flatten().filter(|&&c| c).count()
    }

    /// Grid coordinates of every matrix cell in row-major order, `None` for empty cells.
    pub fn absolute_cells(&self) -> Vec<Option<Coord>> {
        let (ax, ay) = self.anchor;
        let mut out = Vec::with_capacity(self.size.0 * self.size.1);
        for (y, line) in self.cells.iter().enumerate() {
            for (x, &occupied) in line.iter().enumerate() {
                out.push(occupied.then_some((ax + x as isize, ay + y as isize)));
            }
        }
        out
    }

    /// Grid coordinates of the occupied cells in row-major order.
    pub fn occupied_cells(&self) -> impl Iterator<Item = Coord> + '_ {
        let (ax, ay) = self.anchor;
        self.cells.iter().enumerate().flat_map(move |(y, line)| {
            line.iter()
                .enumerate()
                .filter(|(_, &occupied)| occupied)
                .map(move |(x, _)| (ax + x as isize, ay + y as isize))
        })
    }

    /// Row index just below the piece's matrix.
    pub fn bottom(&self) -> isize {
        self.anchor.1 + self.size.1 as isize
    }

    /// Returns a copy of the piece moved by `offset`.
    pub fn translated(&self, (dx, dy): Offset) -> Self {
        let mut piece = self.clone();
        piece.anchor = (self.anchor.0 + dx, self.anchor.1 + dy);
        piece
    }

    /// Returns a copy of the piece with its matrix rotated by 90° clockwise and its anchor
    /// shifted by `offset`, without any collision checks.
    pub fn rotated_clockwise(&self, offset: Offset) -> Self {
        let (w, h) = self.size;
        // Transpose, then reverse every resulting row.
        let cells: Matrix = (0..w)
            .map(|x| (0..h).rev().map(|y| self.cells[y][x]).collect())
            .collect();
        Self {
            cells,
            size: (h, w),
            anchor: (self.anchor.0 + offset.0, self.anchor.1 + offset.1),
            color: self.color,
        }
    }

    /// Whether the piece overlaps nothing under the rotation/horizontal-move collision policy:
    /// cells in negative columns, in rows above the grid or past its walls and floor count as blocked.
    pub fn fits_strict(&self, grid: &Grid) -> bool {
        self.occupied_cells()
            .all(|(col, row)| col >= 0 && !grid.blocked_strict((col, row)))
    }

    /// Whether the piece could move one row down under the gravity/hard-drop collision policy:
    /// it must not reach the floor, and out-of-range lookups below it count as free.
    pub fn can_fall(&self, grid: &Grid) -> bool {
        self.bottom() < grid.height() as isize
            && self
                .occupied_cells()
                .all(|(col, row)| !grid.blocked_permissive((col, row + 1)))
    }

    /// Tries to rotate the piece clockwise with the given rotation system.
    ///
    /// Returns whether the rotation succeeded; on failure the piece is left untouched.
    pub fn rotate_clockwise(&mut self, grid: &Grid, rotation_system: RotationSystem) -> bool {
        match rotation_system.rotate(self, grid) {
            Some(rotated) => {
                *self = rotated;
                true
            }
            None => false,
        }
    }

    /// The anchor the piece would come to rest at if it were dropped straight down.
    pub fn hard_drop_target(&self, grid: &Grid) -> Coord {
        let mut probe = self.clone();
        while probe.can_fall(grid) {
            probe.anchor.1 += 1;
        }
        probe.anchor
    }

    /// Moves the piece to its [`Piece::hard_drop_target`].
    pub fn hard_drop(&mut self, grid: &Grid) {
        self.anchor = self.hard_drop_target(grid);
    }
}

fn validate(cells: &Matrix) -> Result<Size, ShapeError> {
    let width = cells.first().map_or(0, Vec::len);
    if width == 0 {
        return Err(ShapeError::Empty);
    }
    if let Some((row, line)) = cells.iter().enumerate().find(|(_, l)| l.len() != width) {
        return Err(ShapeError::Ragged {
            row,
            expected: width,
            found: line.len(),
        });
    }
    if !cells.iter().flatten().any(|&c| c) {
        return Err(ShapeError::NoOccupiedCells);
    }
    Ok((width, cells.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: &[&str]) -> Matrix {
        rows.iter()
            .map(|line| line.chars().map(|c| c == '#').collect())
            .collect()
    }

    #[test]
    fn rejects_malformed_matrices() {
        let c = Color::NEUTRAL;
        assert_eq!(Piece::new(vec![], c, (0, 0)), Err(ShapeError::Empty));
        assert_eq!(Piece::new(vec![vec![]], c, (0, 0)), Err(ShapeError::Empty));
        assert_eq!(
            Piece::new(matrix(&["##", "#"]), c, (0, 0)),
            Err(ShapeError::Ragged {
                row: 1,
                expected: 2,
                found: 1
            })
        );
        assert_eq!(
            Piece::new(matrix(&["..", ".."]), c, (0, 0)),
            Err(ShapeError::NoOccupiedCells)
        );
    }

    #[test]
    fn absolute_cells_row_major() {
        let piece = Piece::new(matrix(&["#.", "##"]), Color::NEUTRAL, (3, -2)).unwrap();
        assert_eq!(
            piece.absolute_cells(),
            vec![Some((3, -2)), None, Some((3, -1)), Some((4, -1))]
        );
        assert_eq!(
            piece.occupied_cells().collect::<Vec<_>>(),
            vec![(3, -2), (3, -1), (4, -1)]
        );
    }

    #[test]
    fn rotated_matrix_is_transposed_and_reversed() {
        let piece = Piece::from_shape(Shape::J, Color::NEUTRAL, (0, 0));
        let rotated = piece.rotated_clockwise((0, 0));
        assert_eq!(rotated.cells(), &matrix(&["##", "#.", "#."]));
        assert_eq!(rotated.size(), (2, 3));
    }

    #[test]
    fn hard_drop_lands_on_floor() {
        let grid = Grid::new((10, 24));
        let piece = Piece::from_shape(Shape::O, Color::NEUTRAL, (4, -2));
        assert_eq!(piece.hard_drop_target(&grid), (4, 22));
    }

    #[test]
    fn hard_drop_lands_on_stack() {
        let mut grid = Grid::new((6, 8));
        let floor = Piece::new(matrix(&["######"]), Color::NEUTRAL, (0, 5)).unwrap();
        grid.lock(&floor);
        let mut piece = Piece::from_shape(Shape::T, Color::NEUTRAL, (1, 0));
        piece.hard_drop(&grid);
        assert_eq!(piece.anchor, (1, 3));
    }

    #[test]
    fn hard_drop_at_or_below_floor_stays_put() {
        let grid = Grid::new((4, 4));
        let piece = Piece::from_shape(Shape::I, Color::NEUTRAL, (0, 3));
        assert_eq!(piece.hard_drop_target(&grid), (0, 3));
        let piece = Piece::from_shape(Shape::I, Color::NEUTRAL, (0, 6));
        assert_eq!(piece.hard_drop_target(&grid), (0, 6));
    }

    #[test]
    fn hard_drop_ignores_columns_outside_grid() {
        // Half the piece hangs off the right edge; only the in-range column is probed.
        let grid = Grid::new((4, 4));
        let piece = Piece::from_shape(Shape::O, Color::NEUTRAL, (3, 0));
        assert_eq!(piece.hard_drop_target(&grid), (3, 2));
    }
}
