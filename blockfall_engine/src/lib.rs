/*!
# Blockfall Engine

`blockfall_engine` is a small falling-block puzzle engine: one piece at a time falls onto a
fixed-size grid under timed gravity, can be moved, rotated and hard-dropped, locks on contact,
clears full rows and accumulates score.

# Examples

```
use std::time::Duration;
use blockfall_engine::*;

// Starting up a game - in-game time starts at 0.0s.
let mut game = Game::builder()
    .seed(42)
    /* ...Further optional configuration possible... */
    .build();

// Advance the game by one frame, with 'left' being held down.
let report = game.update(&TickInput::idle(Duration::from_millis(16)).hold(Button::MoveLeft));
assert!(!report.just_lost);

// Advance the game by one frame, with 'hard drop' freshly pressed.
game.update(&TickInput::idle(Duration::from_millis(16)).press(Button::DropHard));

// Read most recent game state;
// This is how a UI can know how to render the grid, etc.
let State { grid, score, .. } = game.state();
assert_eq!(grid.size(), (10, 24));
assert!(*score >= 8);
```
*/

#![warn(missing_docs)]

mod game_builder;
mod game_update;
pub mod grid;
pub mod piece;
pub mod rotation_system;
pub mod spawner;
pub mod speed;

use std::{fmt, num::NonZeroU32, ops, time::Duration};

use rand_chacha::ChaCha12Rng;

pub use game_builder::GameBuilder;
pub use grid::{Grid, GridProfile, LockOutcome, OutOfRange};
pub use piece::Piece;
pub use rotation_system::RotationSystem;
pub use spawner::Spawner;
pub use speed::SpeedMultiplier;

/// Coordinates `(column, row)` relative to the grid origin in the top left.
///
/// Rows grow downwards. Either component may be negative, e.g. for a piece that has just spawned
/// above the visible grid.
pub type Coord = (isize, isize);
/// Coordinate offsets that can be added to [`Coord`]inates.
pub type Offset = (isize, isize);
/// Dimensions `(columns, rows)` of an occupancy matrix.
pub type Size = (usize, usize);
/// Rectangular occupancy matrix, rows top-to-bottom and columns left-to-right.
pub type Matrix = Vec<Vec<bool>>;
/// The internal RNG used by a game.
pub type GameRng = ChaCha12Rng;
/// The state of every [`Button`], indexable by `Button`.
pub type ButtonStates = [bool; Button::VARIANTS.len()];

/// Opaque display tag carried by a [`Piece`]; irrelevant to game logic.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color(pub u8, pub u8, pub u8);

/// One of the seven shapes of the piece catalog.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Shape {
    /// Four squares in a straight line; `▄▄▄▄`.
    I = 0,
    /// `█▄▄`.
    J,
    /// `▄▄█`.
    L,
    /// Four squares as one big square; `██`.
    O,
    /// `▄█▀`.
    S,
    /// `▄█▄`.
    T,
    /// `▀█▄`.
    Z,
}

/// Represents an abstract game input.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Button {
    /// Moves the piece to the left while held.
    MoveLeft = 0,
    /// Moves the piece to the right while held.
    MoveRight,
    /// "Soft" dropping: while held, the fall interval is divided by the configured
    /// [`Configuration::soft_drop_divisor`].
    DropSoft,
    /// Rotates the piece by 90° clockwise, once per press.
    Rotate,
    /// "Hard" dropping: moves the piece all the way down and locks it immediately, once per press.
    DropHard,
}

/// Everything the engine needs to advance the game by one tick.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Default, Debug)]
pub struct TickInput {
    /// Time elapsed since the previous tick.
    pub elapsed: Duration,
    /// Which buttons are currently being held down.
    ///
    /// Only relevant for [`Button::MoveLeft`], [`Button::MoveRight`] and [`Button::DropSoft`].
    pub held: ButtonStates,
    /// Which buttons were freshly pressed since the previous tick.
    ///
    /// Only relevant for [`Button::Rotate`] and [`Button::DropHard`]. The caller is responsible
    /// for setting these for exactly one tick per physical press.
    pub pressed: ButtonStates,
}

/// A number of feedback events that can be returned by the game.
///
/// These can be used to more easily render visual feedback to the player.
#[derive(Eq, PartialEq, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Feedback {
    /// A piece was locked down in a certain configuration.
    PieceLocked {
        /// Information about the [`Piece`] that was locked.
        piece: Piece,
        /// Points awarded for the locked cells themselves.
        points: u32,
    },
    /// A piece was hard dropped from its original position to a new one.
    HardDrop {
        /// Anchor before the drop.
        from: Coord,
        /// Anchor after the drop.
        to: Coord,
    },
    /// A number of rows were cleared.
    LinesCleared {
        /// Row indices (top-to-bottom, as they were before clearing) that were full.
        rows: Vec<usize>,
        /// Bonus points awarded for the clear.
        bonus: u32,
    },
    /// The session was lost and has been reset.
    GameLost {
        /// Score reached before the loss.
        score: u32,
        /// Lines cleared before the loss.
        lines_cleared: u32,
    },
    /// A new high score should be persisted.
    NewHighScore {
        /// The value to persist.
        score: u32,
    },
}

/// What happened during one call to [`Game::update`].
#[derive(Eq, PartialEq, Clone, Default, Debug)]
pub struct TickReport {
    /// Feedback events in the order they happened.
    pub feedback: Vec<Feedback>,
    /// Whether the session was lost (and reset) during this tick.
    pub just_lost: bool,
    /// Present only on the tick a new high score should be persisted.
    pub new_high_score: Option<u32>,
}

/// Configuration options of the game, which can be modified without hurting internal invariants.
#[derive(Eq, PartialEq, Clone, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Configuration {
    /// Dimensions of the playing grid.
    pub profile: GridProfile,
    /// The method of piece rotation used.
    pub rotation_system: RotationSystem,
    /// How long it takes for a held 'move' button to shift the piece again.
    pub move_repeat_interval: Duration,
    /// How long it takes a piece to fall one row at speed multiplier 1.
    pub fall_interval: Duration,
    /// How many times faster than normal a piece should fall while 'soft drop' is being held.
    pub soft_drop_divisor: NonZeroU32,
    /// How many line clears beyond the first ten it takes to gain +0.1 speed.
    pub speedup_every_n_lineclears: NonZeroU32,
    /// Bonus points for clearing 1, 2, 3 or 4 rows with a single piece.
    pub line_clear_bonus: [u32; 4],
    /// Color tag given to every spawned piece.
    pub piece_color: Color,
}

/// Struct storing internal game state that changes over the course of play.
#[derive(Eq, PartialEq, Clone, Debug)]
pub struct State {
    /// Current in-game time.
    pub time: Duration,
    /// The main playing grid of locked cells.
    pub grid: Grid,
    /// The piece currently controlled by the player.
    pub active: Piece,
    /// The piece that will be played after `active` locks.
    pub next: Piece,
    /// The current total score of this session.
    pub score: u32,
    /// The total number of rows cleared this session.
    pub lines_cleared: u32,
    /// Number of pieces locked this session.
    pub pieces_locked: u32,
    /// Current gravity speedup, derived from `lines_cleared`.
    pub speed: SpeedMultiplier,
    /// Best score known to the game, handed in at start and raised whenever a session is lost
    /// with a better score.
    pub high_score: u32,
    /// Whether the next lock was caused by a hard drop.
    pub hard_drop_pending: bool,
    /// Time accumulated since the last horizontal repeat window opened.
    pub since_move: Duration,
    /// Time accumulated since the piece last fell.
    pub since_fall: Duration,
}

/// The two phases a session can be in.
///
/// `Lost` is transient: [`Game::update`] resets the session and returns to `Playing` within the
/// same tick, so callers only ever observe it through [`TickReport::just_lost`].
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
pub enum Phase {
    /// A piece is in play.
    Playing,
    /// The last lock reached the top of the grid.
    Lost,
}

/// Main game struct representing a session of play.
#[derive(Debug)]
pub struct Game {
    /// Some internal configuration options of the `Game`.
    pub config: Configuration,
    seed: u64,
    spawner: Spawner,
    state: State,
    phase: Phase,
    last_report: TickReport,
}

/// An error raised when constructing a [`Piece`] from a malformed occupancy matrix.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
pub enum ShapeError {
    /// The matrix has no rows or no columns.
    Empty,
    /// A row's length differs from the first row's.
    Ragged {
        /// Index of the offending row.
        row: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        found: usize,
    },
    /// Not a single cell is occupied.
    NoOccupiedCells,
}

impl Shape {
    /// All `Shape` enum variants in order.
    ///
    /// Note that `Shape::VARIANTS[s as usize] == s` always holds.
    pub const VARIANTS: [Self; 7] = {
        use Shape::*;
        [I, J, L, O, S, T, Z]
    };

    #[rustfmt::skip]
    const CATALOG: [&'static [&'static [u8]]; 7] = [
        &[&[1, 1, 1, 1]],             // I
        &[&[1, 0, 0], &[1, 1, 1]],    // J
        &[&[0, 0, 1], &[1, 1, 1]],    // L
        &[&[1, 1], &[1, 1]],          // O
        &[&[0, 1, 1], &[1, 1, 0]],    // S
        &[&[0, 1, 0], &[1, 1, 1]],    // T
        &[&[1, 1, 0], &[0, 1, 1]],    // Z
    ];

    /// Returns the occupancy matrix of the shape in its spawn orientation.
    pub fn matrix(&self) -> Matrix {
        Self::CATALOG[*self as usize]
            .iter()
            .map(|row| row.iter().map(|&c| c == 1).collect())
            .collect()
    }
}

impl Color {
    /// The fixed neutral color given to spawned pieces.
    pub const NEUTRAL: Self = Color(200, 200, 200);
}

impl Default for Color {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl Button {
    /// All `Button` enum variants.
    ///
    /// Note that `Button::VARIANTS[b as usize] == b` always holds.
    pub const VARIANTS: [Self; 5] = {
        use Button as B;
        [B::MoveLeft, B::MoveRight, B::DropSoft, B::Rotate, B::DropHard]
    };
}

impl<T> ops::Index<Button> for [T; Button::VARIANTS.len()] {
    type Output = T;

    fn index(&self, idx: Button) -> &Self::Output {
        &self[idx as usize]
    }
}

impl<T> ops::IndexMut<Button> for [T; Button::VARIANTS.len()] {
    fn index_mut(&mut self, idx: Button) -> &mut Self::Output {
        &mut self[idx as usize]
    }
}

impl TickInput {
    /// A tick in which no button is held or pressed.
    pub fn idle(elapsed: Duration) -> Self {
        Self {
            elapsed,
            ..Default::default()
        }
    }

    /// Marks a button as held down during this tick.
    pub fn hold(mut self, button: Button) -> Self {
        self.held[button] = true;
        self
    }

    /// Marks a button as freshly pressed during this tick.
    pub fn press(mut self, button: Button) -> Self {
        self.pressed[button] = true;
        self
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            profile: GridProfile::default(),
            rotation_system: RotationSystem::default(),
            move_repeat_interval: Duration::from_millis(150),
            fall_interval: Duration::from_millis(500),
            soft_drop_divisor: NonZeroU32::new(5).unwrap(),
            speedup_every_n_lineclears: NonZeroU32::new(10).unwrap(),
            line_clear_bonus: [40, 100, 300, 1200],
            piece_color: Color::NEUTRAL,
        }
    }
}

impl Configuration {
    /// Bonus points for clearing `rows` rows with one piece; `0` rows earn nothing.
    pub fn bonus_for(&self, rows: usize) -> u32 {
        match rows {
            0 => 0,
            n => self.line_clear_bonus[n.min(self.line_clear_bonus.len()) - 1],
        }
    }

    /// The duration a piece currently takes to fall one row.
    pub fn current_fall_interval(&self, speed: SpeedMultiplier, soft_dropping: bool) -> Duration {
        let base = if soft_dropping {
            self.fall_interval / self.soft_drop_divisor.get()
        } else {
            self.fall_interval
        };
        speed.divide(base)
    }
}

impl Game {
    /// Creates a blank new template representing a yet-to-be-started [`Game`] ready for configuration.
    pub fn builder() -> GameBuilder {
        GameBuilder::default()
    }

    /// The seed the game's PRNG was started with.
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Read accessor for the current game state.
    pub const fn state(&self) -> &State {
        &self.state
    }

    /// Read accessor for the current phase.
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// What happened during the most recent call to [`Game::update`].
    pub const fn last_report(&self) -> &TickReport {
        &self.last_report
    }

    /// Whether the session was lost during the most recent tick.
    pub const fn just_lost(&self) -> bool {
        self.last_report.just_lost
    }

    /// The high score to persist, present only on the tick it was reached.
    pub const fn new_high_score(&self) -> Option<u32> {
        self.last_report.new_high_score
    }
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeError::Empty => write!(f, "occupancy matrix has no rows or no columns"),
            ShapeError::Ragged {
                row,
                expected,
                found,
            } => write!(
                f,
                "occupancy matrix is not rectangular: row {row} has {found} cells, expected {expected}"
            ),
            ShapeError::NoOccupiedCells => write!(f, "occupancy matrix has no occupied cells"),
        }
    }
}

impl std::error::Error for ShapeError {}
