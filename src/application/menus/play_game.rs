use std::{
    io::{self, Write},
    sync::mpsc,
    time::{Duration, Instant},
};

use blockfall_engine::{Button, Feedback, Game};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    ExecutableCommand,
};

use crate::{
    application::{Application, HighScoreEntry},
    button_tracker::ButtonTracker,
    game_renderer::GameRenderer,
    keybinds_presets::{fmt_keys_of, Keybinds},
    live_input_handler::{self, LiveTermSignal},
};

impl<T: Write> Application<T> {
    pub(in crate::application) fn run_menu_play_game(&mut self, game: &mut Game) -> io::Result<()> {
        /* Game loop:
          * Enter 'update_and_render loop:
            - Enter 'wait loop until the next frame is due:
              + Feed terminal key events into the button tracker.
              + Quit or redraw on non-game events.
            - Build one tick's input from the tracker and the real time elapsed.
            - Do game.update(), persist a new high score if one was reached.
            - Render.
        */

        // Release events are only reported with enhanced keyboard events.
        if self.kitty_detected {
            let _v = self.term.execute(event::PushKeyboardEnhancementFlags(
                Self::KEYBOARD_ENHANCEMENT_FLAGS,
            ));
        }

        let (input_sender, input_receiver) = mpsc::channel();
        let _join_handle = live_input_handler::spawn(input_sender, self.settings.keybinds.clone());

        let keybinds_legend = play_keybinds_legend(&self.settings.keybinds);
        let mut buttons = ButtonTracker::new(self.kitty_detected);
        let mut renderer = GameRenderer::default();

        renderer.render(&mut self.term, game, &keybinds_legend, true)?;

        let mut rerender_entire_view = false;
        let frame_interval = Duration::from_secs_f64(f64::from(self.settings.fps.max(1)).recip());
        let mut time_last_update = Instant::now();
        let mut time_next_frame = time_last_update;

        'update_and_render: loop {
            // Skip frames we already missed.
            let now = Instant::now();
            loop {
                time_next_frame += frame_interval;
                if time_next_frame >= now {
                    break;
                }
            }

            'wait: loop {
                let refresh_time_budget_remaining =
                    time_next_frame.saturating_duration_since(Instant::now());

                match input_receiver.recv_timeout(refresh_time_budget_remaining) {
                    Ok((LiveTermSignal::RecognizedButton(button, kind), timestamp)) => {
                        buttons.key_event(button, kind, timestamp);
                    }

                    Ok((LiveTermSignal::RawEvent(event), _timestamp)) => match event {
                        Event::Key(KeyEvent {
                            code,
                            modifiers,
                            kind: KeyEventKind::Press,
                            ..
                        }) => match (code, modifiers) {
                            // [Esc], [Q]: Quit.
                            (KeyCode::Esc | KeyCode::Char('q' | 'Q'), _) => {
                                break 'update_and_render;
                            }
                            // [Ctrl+C]: Quit.
                            (KeyCode::Char('c' | 'C'), m) if m.contains(KeyModifiers::CONTROL) => {
                                break 'update_and_render;
                            }
                            _ => continue 'wait,
                        },

                        Event::Resize(_, _) => {
                            rerender_entire_view = true;
                            break 'wait;
                        }

                        _ => continue 'wait,
                    },

                    Err(mpsc::RecvTimeoutError::Timeout) => break 'wait,

                    Err(mpsc::RecvTimeoutError::Disconnected) => {
                        tracing::warn!("input handler disconnected");
                        break 'update_and_render;
                    }
                }
            }

            let now = Instant::now();
            let input = buttons.tick_input(now.saturating_duration_since(time_last_update), now);
            time_last_update = now;

            game.update(&input);
            let report = game.last_report();
            renderer.push_game_feedback(&report.feedback, game.state().time);

            if let Some(score) = report.new_high_score {
                let lines_cleared = report
                    .feedback
                    .iter()
                    .find_map(|fb| match fb {
                        Feedback::GameLost { lines_cleared, .. } => Some(*lines_cleared),
                        _ => None,
                    })
                    .unwrap_or_default();
                self.record_high_score(HighScoreEntry::now(
                    game.config.profile,
                    score,
                    lines_cleared,
                ));
            }
            if report.just_lost {
                // Keys held into the new session would act on it immediately.
                buttons.release_all();
            }

            renderer.render(&mut self.term, game, &keybinds_legend, rerender_entire_view)?;
            rerender_entire_view = false;
        }

        if self.kitty_detected {
            let _v = self.term.execute(event::PopKeyboardEnhancementFlags);
        }

        Ok(())
    }
}

fn play_keybinds_legend(keybinds: &Keybinds) -> Vec<String> {
    vec![
        format!(
            "Move:      {} {}",
            fmt_keys_of(Button::MoveLeft, keybinds),
            fmt_keys_of(Button::MoveRight, keybinds)
        ),
        format!("Soft drop: {}", fmt_keys_of(Button::DropSoft, keybinds)),
        format!("Rotate:    {}", fmt_keys_of(Button::Rotate, keybinds)),
        format!("Hard drop: {}", fmt_keys_of(Button::DropHard, keybinds)),
        "Quit:      Esc/Q".to_owned(),
    ]
}
