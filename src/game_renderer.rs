// NOTE: This renderer diffs the printed characters, not the game state they were derived from.

use std::{
    fmt::Display,
    io::{self, Write},
    time::Duration,
};

use blockfall_engine::{Feedback, Game, Piece, State};
use crossterm::{
    cursor,
    style::{self, Color, Print, PrintStyledContent, Stylize},
    terminal, QueueableCommand,
};

const CELL: &str = "██";
const EMPTY: &str = " .";
const LOCKED_COLOR: Color = Color::DarkGrey;
const MESSAGE_LIFETIME: Duration = Duration::from_secs(3);

#[derive(Clone, Default, Debug)]
struct TerminalScreenBuffer {
    prev: Vec<Vec<(char, Option<Color>)>>,
    next: Vec<Vec<(char, Option<Color>)>>,
    x_draw: usize,
    y_draw: usize,
}

impl TerminalScreenBuffer {
    fn buffer_reset(&mut self, (x, y): (usize, usize)) {
        self.prev.clear();
        (self.x_draw, self.y_draw) = (x, y);
    }

    fn buffer_str(&mut self, str: &str, fg_color: Option<Color>, (x, y): (usize, usize)) {
        for (x_c, c) in str.chars().enumerate() {
            while y >= self.next.len() {
                self.next.push(Vec::new());
            }
            let row = &mut self.next[y];
            while x + x_c >= row.len() {
                row.push((' ', None));
            }
            row[x + x_c] = (c, fg_color);
        }
    }

    fn move_to(&self, term: &mut impl Write, x: usize, y: usize) -> io::Result<()> {
        let col = u16::try_from(self.x_draw + x).unwrap_or(u16::MAX);
        let row = u16::try_from(self.y_draw + y).unwrap_or(u16::MAX);
        term.queue(cursor::MoveTo(col, row))?;
        Ok(())
    }

    fn put(&self, term: &mut impl Write, c: char, x: usize, y: usize) -> io::Result<()> {
        self.move_to(term, x, y)?;
        term.queue(Print(c))?;
        Ok(())
    }

    fn put_styled<D: Display>(
        &self,
        term: &mut impl Write,
        content: style::StyledContent<D>,
        x: usize,
        y: usize,
    ) -> io::Result<()> {
        self.move_to(term, x, y)?;
        term.queue(PrintStyledContent(content))?;
        Ok(())
    }

    fn put_cell(
        &self,
        term: &mut impl Write,
        (c, col): (char, Option<Color>),
        was_colored: bool,
        x: usize,
        y: usize,
    ) -> io::Result<()> {
        match col {
            Some(col) => self.put_styled(term, c.with(col), x, y),
            None if was_colored => self.put_styled(term, c.reset(), x, y),
            None => self.put(term, c, x, y),
        }
    }

    fn flush(&mut self, term: &mut impl Write) -> io::Result<()> {
        term.queue(terminal::BeginSynchronizedUpdate)?;
        if self.prev.is_empty() {
            term.queue(terminal::Clear(terminal::ClearType::All))?;
            for (y, line) in self.next.iter().enumerate() {
                for (x, &cell) in line.iter().enumerate() {
                    self.put_cell(term, cell, false, x, y)?;
                }
            }
        } else {
            let height = self.prev.len().max(self.next.len());
            for y in 0..height {
                let line_prev = self.prev.get(y).map_or(&[][..], Vec::as_slice);
                let line_next = self.next.get(y).map_or(&[][..], Vec::as_slice);
                let width = line_prev.len().max(line_next.len());
                for x in 0..width {
                    let cell_prev = line_prev.get(x).copied();
                    let cell_next = line_next.get(x).copied();
                    if cell_prev == cell_next {
                        continue;
                    }
                    let was_colored = cell_prev.is_some_and(|(_, col)| col.is_some());
                    // Cells beyond the new line's end are erased.
                    let cell = cell_next.unwrap_or((' ', None));
                    self.put_cell(term, cell, was_colored, x, y)?;
                }
            }
        }
        term.queue(cursor::MoveTo(0, 0))?;
        term.queue(terminal::EndSynchronizedUpdate)?;
        term.flush()?;
        self.prev.clear();
        std::mem::swap(&mut self.prev, &mut self.next);
        Ok(())
    }
}

/// Draws the grid, the falling piece, a preview of the next piece and the session statistics.
#[derive(Clone, Default, Debug)]
pub struct GameRenderer {
    screen: TerminalScreenBuffer,
    message: Option<(String, Duration)>,
}

impl GameRenderer {
    /// Remembers the most noteworthy feedback of a tick for the status line.
    pub fn push_game_feedback(&mut self, feedback: &[Feedback], time: Duration) {
        for fb in feedback {
            let msg = match fb {
                Feedback::LinesCleared { rows, bonus } => match rows.len() {
                    1 => format!("Single! +{bonus}"),
                    2 => format!("Double! +{bonus}"),
                    3 => format!("Triple! +{bonus}"),
                    n => format!("{n} lines! +{bonus}"),
                },
                Feedback::GameLost {
                    score,
                    lines_cleared,
                } => format!("Topped out at {score} pts, {lines_cleared} lines"),
                Feedback::NewHighScore { score } => format!("New high score: {score}!"),
                Feedback::PieceLocked { .. } | Feedback::HardDrop { .. } => continue,
            };
            self.message = Some((msg, time));
        }
    }

    pub fn render(
        &mut self,
        term: &mut impl Write,
        game: &Game,
        keybinds_legend: &[String],
        screen_resized: bool,
    ) -> io::Result<()> {
        let state = game.state();
        let (w_grid, h_grid) = state.grid.size();
        let w_main = 2 * w_grid + 2 + 2 + 28;
        let h_main = h_grid + 2;

        if screen_resized || self.screen.prev.is_empty() {
            let (w_console, h_console) = terminal::size()?;
            let x_main = usize::from(w_console).saturating_sub(w_main) / 2;
            let y_main = usize::from(h_console).saturating_sub(h_main) / 2;
            self.screen.buffer_reset((x_main, y_main));
        }
        self.screen.next.clear();

        self.buffer_grid(state);

        let x_side = 2 * w_grid + 4;
        self.buffer_next_preview(&state.next, x_side);

        let stats = [
            format!("Score:      {}", state.score),
            format!("Lines:      {}", state.lines_cleared),
            format!("Speed:      {}", state.speed),
            format!("Pieces:     {}", state.pieces_locked),
            format!("Time:       {}", fmt_duration(state.time)),
            format!("High score: {}", state.high_score),
        ];
        for (dy, line) in stats.iter().enumerate() {
            self.screen.buffer_str(line, None, (x_side, 7 + dy));
        }

        if let Some((msg, since)) = &self.message {
            if state.time.saturating_sub(*since) < MESSAGE_LIFETIME {
                self.screen
                    .buffer_str(msg, Some(Color::Yellow), (x_side, 7 + stats.len() + 1));
            }
        }

        let y_legend = h_main.saturating_sub(keybinds_legend.len());
        for (dy, line) in keybinds_legend.iter().enumerate() {
            self.screen.buffer_str(line, None, (x_side, y_legend + dy));
        }

        self.screen.flush(term)
    }

    fn buffer_grid(&mut self, state: &State) {
        let w_grid = state.grid.width();
        let horizontal = "─".repeat(2 * w_grid);
        self.screen
            .buffer_str(&format!("┌{horizontal}┐"), None, (0, 0));
        for (y, line) in state.grid.rows().enumerate() {
            self.screen.buffer_str("│", None, (0, 1 + y));
            for (x, &occupied) in line.iter().enumerate() {
                let (s, col) = if occupied {
                    (CELL, Some(LOCKED_COLOR))
                } else {
                    (EMPTY, None)
                };
                self.screen.buffer_str(s, col, (1 + 2 * x, 1 + y));
            }
            self.screen.buffer_str("│", None, (1 + 2 * w_grid, 1 + y));
        }
        self.screen.buffer_str(
            &format!("└{horizontal}┘"),
            None,
            (0, 1 + state.grid.height()),
        );

        let piece_color = Some(to_term_color(&state.active));
        for (col, row) in state.active.occupied_cells() {
            // Cells above the grid are not drawn.
            if let (Ok(x), Ok(y)) = (usize::try_from(col), usize::try_from(row)) {
                if x < w_grid && y < state.grid.height() {
                    self.screen
                        .buffer_str(CELL, piece_color, (1 + 2 * x, 1 + y));
                }
            }
        }
    }

    fn buffer_next_preview(&mut self, next: &Piece, x_side: usize) {
        self.screen.buffer_str("Next:", None, (x_side, 0));
        self.screen.buffer_str("┌────────┐", None, (x_side, 1));
        for y in 0..4 {
            self.screen.buffer_str("│        │", None, (x_side, 2 + y));
        }
        self.screen.buffer_str("└────────┘", None, (x_side, 6));
        let color = Some(to_term_color(next));
        for (y, line) in next.cells().iter().enumerate() {
            for (x, &occupied) in line.iter().enumerate() {
                if occupied {
                    self.screen
                        .buffer_str(CELL, color, (x_side + 1 + 2 * x, 2 + y));
                }
            }
        }
    }
}

fn to_term_color(piece: &Piece) -> Color {
    let blockfall_engine::Color(r, g, b) = piece.color;
    Color::Rgb { r, g, b }
}

pub fn fmt_duration(dur: Duration) -> String {
    let secs = dur.as_secs();
    format!("{}:{:02}.{}", secs / 60, secs % 60, dur.subsec_millis() / 100)
}
