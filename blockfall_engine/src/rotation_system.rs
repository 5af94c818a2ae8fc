/*!
This module handles rotation of [`Piece`]s.
*/

use crate::{Grid, Offset, Piece, Size};

/// Handles the logic of how to rotate a piece in play.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Default, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RotationSystem {
    /// Simple kick-less rotation with a fixed one-cell anchor nudge.
    ///
    /// When rotation changes the piece's width, the anchor moves one column towards the side the
    /// piece shrank from, regardless of by how much. The long 1×4 piece additionally moves one row
    /// down when turning upright and one row up when turning flat. This is an approximation, not
    /// a centered rotation.
    #[default]
    Nudge,
}

impl RotationSystem {
    /// Tries to rotate a piece clockwise with the chosen `RotationSystem`.
    ///
    /// This will return `None` if the rotation is not possible, and `Some(p)` if the rotation
    /// succeeded with `p` as the new state of the piece.
    pub fn rotate(&self, piece: &Piece, grid: &Grid) -> Option<Piece> {
        let offset = self.anchor_correction(piece.size(), (piece.height(), piece.width()));
        let rotated = piece.rotated_clockwise(offset);
        if rotated.fits_strict(grid) {
            Some(rotated)
        } else {
            tracing::debug!(
                anchor = ?piece.anchor,
                size = ?piece.size(),
                "rotation rejected"
            );
            None
        }
    }

    /// The anchor offset applied when a piece of `old_size` turns into `new_size`.
    pub fn anchor_correction(&self, (old_width, _): Size, (new_width, _): Size) -> Offset {
        match self {
            RotationSystem::Nudge => {
                let delta = old_width as isize - new_width as isize;
                let dy = match delta {
                    3 => 1,
                    -3 => -1,
                    _ => 0,
                };
                (delta.signum(), dy)
            }
        }
    }
}
