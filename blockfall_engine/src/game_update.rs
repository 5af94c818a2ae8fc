/*!
This module handles what happens when [`Game::update`] is called.
*/

use super::*;

impl Game {
    /// The main function used to advance the game state by one tick.
    ///
    /// Within a tick, in order:
    /// 1. held 'move' buttons shift the piece, at most once per `move_repeat_interval`,
    /// 2. a fresh 'rotate' press rotates the piece,
    /// 3. a fresh 'hard drop' press drops and locks the piece, ending the tick's piece handling,
    /// 4. otherwise gravity moves the piece down or locks it once the fall interval has passed.
    ///
    /// If a lock tops out the grid the session is reset within the same tick; the returned
    /// [`TickReport`] then has `just_lost` set and, if the score beat the high score,
    /// `new_high_score` holds the value to persist.
    pub fn update(&mut self, input: &TickInput) -> &TickReport {
        let mut report = TickReport::default();

        self.state.time += input.elapsed;
        self.state.since_move += input.elapsed;
        self.state.since_fall += input.elapsed;

        self.apply_held_moves(input);

        if input.pressed[Button::Rotate] {
            let rotation_system = self.config.rotation_system;
            self.state
                .active
                .rotate_clockwise(&self.state.grid, rotation_system);
        }

        if input.pressed[Button::DropHard] {
            self.hard_drop(&mut report);
        } else {
            self.apply_gravity(input.held[Button::DropSoft], &mut report);
        }

        if self.phase == Phase::Lost {
            self.reset_after_loss(&mut report);
        }

        self.last_report = report;
        &self.last_report
    }

    fn apply_held_moves(&mut self, input: &TickInput) {
        if self.state.since_move <= self.config.move_repeat_interval {
            return;
        }
        let any_held = [Button::MoveLeft, Button::MoveRight, Button::DropSoft]
            .iter()
            .any(|&b| input.held[b]);
        if !any_held {
            return;
        }
        // Any held button restarts the repeat window, even if no shift happens.
        self.state.since_move = Duration::ZERO;

        let dx = if input.held[Button::MoveLeft] {
            -1
        } else if input.held[Button::MoveRight] {
            1
        } else {
            return;
        };
        self.try_shift(dx);
    }

    /// Shifts the active piece by `dx` columns if the grid's side walls and locked cells allow.
    fn try_shift(&mut self, dx: isize) -> bool {
        let State { grid, active, .. } = &mut self.state;
        let within_walls = if dx < 0 {
            active.anchor.0 + dx >= 0
        } else {
            active.anchor.0 + active.width() as isize + dx <= grid.width() as isize
        };
        let shifted = active.translated((dx, 0));
        if within_walls && shifted.fits_strict(grid) {
            *active = shifted;
            true
        } else {
            false
        }
    }

    fn hard_drop(&mut self, report: &mut TickReport) {
        let from = self.state.active.anchor;
        self.state.active.hard_drop(&self.state.grid);
        self.state.hard_drop_pending = true;
        report.feedback.push(Feedback::HardDrop {
            from,
            to: self.state.active.anchor,
        });
        self.lock_active(report);
    }

    fn apply_gravity(&mut self, soft_dropping: bool, report: &mut TickReport) {
        let interval = self
            .config
            .current_fall_interval(self.state.speed, soft_dropping);
        if self.state.since_fall <= interval {
            return;
        }
        self.state.since_fall = Duration::ZERO;
        if self.state.active.can_fall(&self.state.grid) {
            self.state.active.anchor.1 += 1;
        } else {
            self.lock_active(report);
        }
    }

    fn lock_active(&mut self, report: &mut TickReport) {
        let hard = std::mem::take(&mut self.state.hard_drop_pending);
        let piece = self.state.active.clone();

        if self.state.grid.lock(&piece) == LockOutcome::ToppedOut {
            tracing::info!(
                score = self.state.score,
                lines_cleared = self.state.lines_cleared,
                "grid topped out"
            );
            self.phase = Phase::Lost;
            return;
        }

        let points_per_cell = if hard { 2 } else { 1 };
        let points = points_per_cell * piece.occupied_count() as u32;
        self.state.score = self.state.score.saturating_add(points);
        self.state.pieces_locked += 1;
        tracing::debug!(anchor = ?piece.anchor, points, hard, "piece locked");
        report.feedback.push(Feedback::PieceLocked { piece, points });

        let rows = self.state.grid.full_rows();
        if !rows.is_empty() {
            self.state.grid.clear_rows(&rows);
            let bonus = self.config.bonus_for(rows.len());
            self.state.score = self.state.score.saturating_add(bonus);
            self.state.lines_cleared += rows.len() as u32;
            self.state.speed = SpeedMultiplier::from_lineclears(
                self.state.lines_cleared,
                self.config.speedup_every_n_lineclears,
            );
            tracing::info!(
                rows = rows.len(),
                bonus,
                lines_cleared = self.state.lines_cleared,
                speed = %self.state.speed,
                "rows cleared"
            );
            report.feedback.push(Feedback::LinesCleared { rows, bonus });
        }

        let next = self.spawner.random_piece();
        let mut active = std::mem::replace(&mut self.state.next, next);
        self.spawner.place(&self.state.grid, &mut active);
        self.state.active = active;
    }

    fn reset_after_loss(&mut self, report: &mut TickReport) {
        let (score, lines_cleared) = (self.state.score, self.state.lines_cleared);
        report.just_lost = true;
        report.feedback.push(Feedback::GameLost {
            score,
            lines_cleared,
        });
        if score > self.state.high_score {
            tracing::info!(score, previous = self.state.high_score, "new high score");
            self.state.high_score = score;
            report.new_high_score = Some(score);
            report.feedback.push(Feedback::NewHighScore { score });
        }

        self.state.grid.clear();
        self.state.score = 0;
        self.state.lines_cleared = 0;
        self.state.pieces_locked = 0;
        self.state.speed = SpeedMultiplier::default();
        self.state.hard_drop_pending = false;
        self.state.since_move = Duration::ZERO;
        self.state.since_fall = Duration::ZERO;

        let mut active = self.spawner.random_piece();
        self.spawner.place(&self.state.grid, &mut active);
        self.state.active = active;
        self.state.next = self.spawner.random_piece();

        self.phase = Phase::Playing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(16);

    fn game() -> Game {
        Game::builder().seed(1234).build()
    }

    fn place(game: &mut Game, shape: Shape, anchor: Coord) {
        game.state.active = Piece::from_shape(shape, Color::NEUTRAL, anchor);
    }

    fn fill_row(game: &mut Game, row: isize, except: &[isize]) {
        let width = game.state.grid.width() as isize;
        for col in (0..width).filter(|c| !except.contains(c)) {
            let cell = Piece::new(vec![vec![true]], Color::NEUTRAL, (col, row)).unwrap();
            game.state.grid.lock(&cell);
        }
    }

    #[test]
    fn hard_dropped_o_piece_scores_double() {
        let mut game = game();
        place(&mut game, Shape::O, (4, -2));
        let report = game
            .update(&TickInput::idle(FRAME).press(Button::DropHard))
            .clone();
        let grid = &game.state().grid;
        for (col, row) in [(4, 22), (5, 22), (4, 23), (5, 23)] {
            assert_eq!(grid.cell(col, row), Ok(true));
        }
        assert_eq!(grid.occupied_count(), 4);
        assert_eq!(game.state().score, 8);
        assert_eq!(game.state().lines_cleared, 0);
        assert!(!report.just_lost);
        assert!(matches!(
            report.feedback[..],
            [Feedback::HardDrop { from: (4, -2), to: (4, 22) }, Feedback::PieceLocked { points: 8, .. }]
        ));
    }

    #[test]
    fn gravity_lock_scores_single() {
        let mut game = game();
        place(&mut game, Shape::O, (0, 22));
        game.update(&TickInput::idle(Duration::from_millis(501)));
        assert_eq!(game.state().score, 4);
        assert_eq!(game.state().pieces_locked, 1);
    }

    #[test]
    fn completing_bottom_row_clears_it() {
        let mut game = game();
        fill_row(&mut game, 23, &[9]);
        place(&mut game, Shape::I, (0, 0));
        game.state.active = game.state.active.rotated_clockwise((9, 0));
        let report = game
            .update(&TickInput::idle(FRAME).press(Button::DropHard))
            .clone();
        assert_eq!(game.state().lines_cleared, 1);
        assert_eq!(game.state().score, 4 * 2 + 40);
        // The upper three cells of the long piece shift down by one.
        let grid = &game.state().grid;
        assert_eq!(grid.occupied_count(), 3);
        for row in 21..24 {
            assert_eq!(grid.cell(9, row), Ok(true));
        }
        assert!(report
            .feedback
            .contains(&Feedback::LinesCleared { rows: vec![23], bonus: 40 }));
    }

    #[test]
    fn four_rows_at_once_earn_top_bonus() {
        let mut game = game();
        for row in 20..24 {
            fill_row(&mut game, row, &[0]);
        }
        place(&mut game, Shape::I, (0, 0));
        game.state.active = game.state.active.rotated_clockwise((0, 0));
        game.update(&TickInput::idle(FRAME).press(Button::DropHard));
        assert_eq!(game.state().lines_cleared, 4);
        assert_eq!(game.state().score, 8 + 1200);
        assert_eq!(game.state().grid.occupied_count(), 0);
    }

    fn drop_long_piece_upright(game: &mut Game, col: isize) {
        place(game, Shape::I, (0, 0));
        game.state.active = game.state.active.rotated_clockwise((col, 0));
        game.update(&TickInput::idle(FRAME).press(Button::DropHard));
    }

    #[test]
    fn two_rows_at_once_earn_double_bonus() {
        let mut game = game();
        for row in 22..24 {
            fill_row(&mut game, row, &[0]);
        }
        drop_long_piece_upright(&mut game, 0);
        assert_eq!(game.state().lines_cleared, 2);
        assert_eq!(game.state().score, 8 + 100);
        let grid = &game.state().grid;
        assert_eq!(grid.occupied_count(), 2);
        assert_eq!((grid.cell(0, 22), grid.cell(0, 23)), (Ok(true), Ok(true)));
    }

    #[test]
    fn three_rows_at_once_earn_triple_bonus() {
        let mut game = game();
        for row in 21..24 {
            fill_row(&mut game, row, &[0]);
        }
        drop_long_piece_upright(&mut game, 0);
        assert_eq!(game.state().lines_cleared, 3);
        assert_eq!(game.state().score, 8 + 300);
        assert_eq!(game.state().grid.occupied_count(), 1);
        assert_eq!(game.state().grid.cell(0, 23), Ok(true));
    }

    #[test]
    fn twentieth_line_speeds_up_gravity() {
        let mut game = game();
        game.state.lines_cleared = 18;
        fill_row(&mut game, 23, &[9]);
        drop_long_piece_upright(&mut game, 9);
        assert_eq!(game.state().lines_cleared, 19);
        assert_eq!(game.state().speed.steps(), 0);

        place(&mut game, Shape::O, (4, 5));
        game.state.since_fall = Duration::ZERO;
        game.update(&TickInput::idle(Duration::from_millis(455)));
        assert_eq!(game.state().active.anchor, (4, 5));

        game.state.grid.clear();
        fill_row(&mut game, 23, &[9]);
        drop_long_piece_upright(&mut game, 9);
        assert_eq!(game.state().lines_cleared, 20);
        assert_eq!(game.state().speed.steps(), 1);

        // 500ms at 1.1x is 454.5ms.
        place(&mut game, Shape::O, (4, 5));
        game.state.since_fall = Duration::ZERO;
        game.update(&TickInput::idle(Duration::from_millis(450)));
        assert_eq!(game.state().active.anchor, (4, 5));
        game.update(&TickInput::idle(Duration::from_millis(5)));
        assert_eq!(game.state().active.anchor, (4, 6));
    }

    #[test]
    fn held_move_repeats_on_interval() {
        let mut game = game();
        place(&mut game, Shape::O, (4, 5));
        let left = |elapsed| TickInput::idle(elapsed).hold(Button::MoveLeft);
        // The first press after an idle period shifts immediately.
        game.update(&left(Duration::from_millis(151)));
        assert_eq!(game.state().active.anchor.0, 3);
        game.update(&left(Duration::from_millis(100)));
        assert_eq!(game.state().active.anchor.0, 3);
        game.update(&left(Duration::from_millis(60)));
        assert_eq!(game.state().active.anchor.0, 2);
    }

    #[test]
    fn walls_and_stack_block_shifts() {
        let mut game = game();
        place(&mut game, Shape::O, (0, 5));
        assert!(!game.try_shift(-1));
        place(&mut game, Shape::O, (8, 5));
        assert!(!game.try_shift(1));
        let blocker = Piece::new(vec![vec![true]], Color::NEUTRAL, (3, 6)).unwrap();
        game.state.grid.lock(&blocker);
        place(&mut game, Shape::O, (4, 5));
        assert!(!game.try_shift(-1));
        assert!(game.try_shift(1));
        assert_eq!(game.state().active.anchor, (5, 5));
    }

    #[test]
    fn pieces_above_grid_fall_but_do_not_shift_or_rotate() {
        let mut game = game();
        place(&mut game, Shape::T, (4, -2));
        assert!(!game.try_shift(-1));
        assert!(!game.try_shift(1));
        game.update(&TickInput::idle(FRAME).press(Button::Rotate));
        assert_eq!(game.state().active.anchor, (4, -2));
        assert_eq!(game.state().active.size(), (3, 2));

        game.update(&TickInput::idle(Duration::from_millis(501)));
        assert_eq!(game.state().active.anchor, (4, -1));
        assert!(!game.try_shift(-1));
        game.update(&TickInput::idle(Duration::from_millis(501)));
        assert_eq!(game.state().active.anchor, (4, 0));
        assert!(game.try_shift(-1));
        assert_eq!(game.state().active.anchor, (3, 0));
    }

    #[test]
    fn soft_drop_falls_faster() {
        let mut game = game();
        place(&mut game, Shape::O, (4, 0));
        game.update(&TickInput::idle(Duration::from_millis(101)).hold(Button::DropSoft));
        assert_eq!(game.state().active.anchor.1, 1);
        game.update(&TickInput::idle(Duration::from_millis(101)));
        assert_eq!(game.state().active.anchor.1, 1);
    }

    #[test]
    fn rotate_press_rotates_once() {
        let mut game = game();
        place(&mut game, Shape::I, (3, 5));
        game.update(&TickInput::idle(FRAME).press(Button::Rotate));
        assert_eq!(game.state().active.size(), (1, 4));
        assert_eq!(game.state().active.anchor, (4, 6));
        game.update(&TickInput::idle(FRAME));
        assert_eq!(game.state().active.size(), (1, 4));
    }

    #[test]
    fn topping_out_resets_session() {
        let mut game = Game::builder().seed(99).high_score(10).build();
        game.state.score = 57;
        game.state.lines_cleared = 31;
        game.state.speed =
            SpeedMultiplier::from_lineclears(31, game.config.speedup_every_n_lineclears);
        fill_row(&mut game, 1, &[]);
        place(&mut game, Shape::O, (2, -1));
        let report = game
            .update(&TickInput::idle(FRAME).press(Button::DropHard))
            .clone();
        assert!(report.just_lost);
        assert_eq!(report.new_high_score, Some(57));
        assert!(game.just_lost());
        assert_eq!(game.new_high_score(), Some(57));
        let state = game.state();
        assert_eq!(state.score, 0);
        assert_eq!(state.lines_cleared, 0);
        assert_eq!(state.speed, SpeedMultiplier::default());
        assert_eq!(state.grid.occupied_count(), 0);
        assert_eq!(state.high_score, 57);
        assert_eq!(game.phase(), Phase::Playing);

        // The loss signal lasts a single tick.
        game.update(&TickInput::idle(FRAME));
        assert!(!game.just_lost());
        assert_eq!(game.new_high_score(), None);
    }

    #[test]
    fn losing_below_high_score_persists_nothing() {
        let mut game = Game::builder().seed(5).high_score(1000).build();
        game.state.score = 20;
        fill_row(&mut game, 1, &[]);
        place(&mut game, Shape::O, (2, -1));
        let report = game.update(&TickInput::idle(FRAME).press(Button::DropHard));
        assert!(report.just_lost);
        assert_eq!(report.new_high_score, None);
        assert_eq!(game.state().high_score, 1000);
    }

    #[test]
    fn opening_piece_is_played_first() {
        let opening =
            Piece::new(vec![vec![true, false], vec![true, true]], Color::NEUTRAL, (0, 0)).unwrap();
        let game = Game::builder().seed(3).opening_piece(opening.clone()).build();
        let active = &game.state().active;
        assert_eq!(active.cells(), opening.cells());
        assert_eq!(active.anchor.1, -2);
    }

    #[test]
    fn same_seed_same_session() {
        let inputs = [
            TickInput::idle(Duration::from_millis(200)).hold(Button::MoveRight),
            TickInput::idle(FRAME).press(Button::Rotate),
            TickInput::idle(FRAME).press(Button::DropHard),
            TickInput::idle(Duration::from_millis(600)).hold(Button::MoveLeft),
            TickInput::idle(FRAME).press(Button::DropHard),
        ];
        let mut a = game();
        let mut b = game();
        for input in &inputs {
            a.update(input);
            b.update(input);
        }
        assert_eq!(a.state(), b.state());
    }
}
