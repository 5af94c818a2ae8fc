/*!
This module handles random generation and placement of new [`Piece`]s.
*/

use rand::Rng;
use rand_chacha::rand_core::SeedableRng;

use crate::{Color, Coord, GameRng, Grid, Piece, Shape};

/// Draws pieces uniformly from the [`Shape`] catalog and picks where they enter the grid.
#[derive(Eq, PartialEq, Clone, Debug)]
pub struct Spawner {
    /// Reproducible source of randomness.
    pub rng: GameRng,
    /// Color tag given to every spawned piece.
    pub color: Color,
}

impl Spawner {
    /// Creates a spawner whose sequence of pieces is fully determined by `seed`.
    pub fn seeded(seed: u64, color: Color) -> Self {
        Self {
            rng: GameRng::seed_from_u64(seed),
            color,
        }
    }

    /// A piece of a uniformly random catalog shape, anchored at `(0, 0)` pending placement.
    pub fn random_piece(&mut self) -> Piece {
        let shape = Shape::VARIANTS[self.rng.random_range(0..Shape::VARIANTS.len())];
        Piece::from_shape(shape, self.color, (0, 0))
    }

    /// A uniformly random column in `0..=grid_width - piece_width`, and the row that puts the piece
    /// just above the visible grid.
    pub fn spawn_position(&mut self, grid: &Grid, piece: &Piece) -> Coord {
        let max_col = grid.width().saturating_sub(piece.width());
        let col = self.rng.random_range(0..=max_col);
        (col as isize, -(piece.height() as isize))
    }

    /// Places `piece` at a fresh [`Spawner::spawn_position`].
    pub fn place(&mut self, grid: &Grid, piece: &mut Piece) {
        piece.anchor = self.spawn_position(grid, piece);
    }
}
