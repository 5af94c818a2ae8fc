/*!
This module handles creation / initialization / building of [`Game`]s.
*/

use rand::Rng;

use super::*;

/// This builder exposes the ability to configure a new [`Game`] to varying degrees.
///
/// Generally speaking, when using `GameBuilder`, you’ll first call [`GameBuilder::new`] or
/// [`Game::builder`], then chain calls to methods to set each field, then call
/// [`GameBuilder::build`].
/// This will give you a [`Game`] as specified that you can then use as normal.
/// The `GameBuilder` is not used up and its configuration can be re-used to initialize more [`Game`]s.
#[derive(PartialEq, Clone, Default, Debug)]
pub struct GameBuilder {
    /// Many of the configuration options that will be set for the game.
    pub config: Configuration,
    /// The value to seed the game's PRNG with.
    pub seed: Option<u64>,
    /// The best score known before the game starts.
    pub high_score: u32,
    /// A piece to play first instead of a random one.
    pub opening_piece: Option<Piece>,
}

impl GameBuilder {
    /// Creates a blank new template representing a yet-to-be-started [`Game`] ready for configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a [`Game`] with the information specified by `self`.
    pub fn build(&self) -> Game {
        let config = self.config.clone();
        let seed = self.seed.unwrap_or_else(|| rand::rng().random());
        let mut spawner = Spawner::seeded(seed, config.piece_color);
        let grid = Grid::with_profile(config.profile);

        let mut active = match &self.opening_piece {
            Some(piece) => piece.clone(),
            None => spawner.random_piece(),
        };
        spawner.place(&grid, &mut active);
        let next = spawner.random_piece();

        tracing::debug!(seed, profile = ?config.profile, "game built");

        Game {
            state: State {
                time: Duration::ZERO,
                grid,
                active,
                next,
                score: 0,
                lines_cleared: 0,
                pieces_locked: 0,
                speed: SpeedMultiplier::default(),
                high_score: self.high_score,
                hard_drop_pending: false,
                since_move: Duration::ZERO,
                since_fall: Duration::ZERO,
            },
            phase: Phase::Playing,
            last_report: TickReport::default(),
            spawner,
            seed,
            config,
        }
    }

    /// Sets the [`Configuration`] that will be used by [`Game`].
    pub fn config(&mut self, x: Configuration) -> &mut Self {
        self.config = x;
        self
    }

    /// Dimensions of the playing grid.
    pub fn profile(&mut self, x: GridProfile) -> &mut Self {
        self.config.profile = x;
        self
    }
    /// The method of piece rotation used.
    pub fn rotation_system(&mut self, x: RotationSystem) -> &mut Self {
        self.config.rotation_system = x;
        self
    }
    /// How long it takes for a held 'move' button to shift the piece again.
    pub fn move_repeat_interval(&mut self, x: Duration) -> &mut Self {
        self.config.move_repeat_interval = x;
        self
    }
    /// How long it takes a piece to fall one row at speed multiplier 1.
    pub fn fall_interval(&mut self, x: Duration) -> &mut Self {
        self.config.fall_interval = x;
        self
    }
    /// How many times faster than normal a piece should fall while 'soft drop' is being held.
    pub fn soft_drop_divisor(&mut self, x: NonZeroU32) -> &mut Self {
        self.config.soft_drop_divisor = x;
        self
    }
    /// How many line clears beyond the first ten it takes to gain +0.1 speed.
    pub fn speedup_every_n_lineclears(&mut self, x: NonZeroU32) -> &mut Self {
        self.config.speedup_every_n_lineclears = x;
        self
    }
    /// Bonus points for clearing 1, 2, 3 or 4 rows with a single piece.
    pub fn line_clear_bonus(&mut self, x: [u32; 4]) -> &mut Self {
        self.config.line_clear_bonus = x;
        self
    }
    /// Color tag given to every spawned piece.
    pub fn piece_color(&mut self, x: Color) -> &mut Self {
        self.config.piece_color = x;
        self
    }

    /// The value to seed the game's PRNG with.
    pub fn seed(&mut self, x: u64) -> &mut Self {
        self.seed = Some(x);
        self
    }
    /// The best score known before the game starts.
    pub fn high_score(&mut self, x: u32) -> &mut Self {
        self.high_score = x;
        self
    }
    /// A piece to play first instead of a random one; its anchor is replaced by a spawn position.
    pub fn opening_piece(&mut self, x: Piece) -> &mut Self {
        self.opening_piece = Some(x);
        self
    }
}
