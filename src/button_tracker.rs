use std::time::{Duration, Instant};

use blockfall_engine::{Button, ButtonStates, TickInput};
use crossterm::event::KeyEventKind;

/// Turns a stream of terminal key events into per-tick held/pressed button states.
///
/// Terminals with keyboard enhancement report releases, so a button stays held until released.
/// Other terminals only report (auto-repeated) presses; there a button counts as held for
/// [`ButtonTracker::HOLD_WINDOW`] after its latest press, and a press only counts as fresh once
/// the key has been silent for longer than [`ButtonTracker::REPEAT_DELAY`].
#[derive(Clone, Debug)]
pub struct ButtonTracker {
    release_events: bool,
    last_seen: [Option<Instant>; Button::VARIANTS.len()],
    pressed: ButtonStates,
}

impl ButtonTracker {
    pub const HOLD_WINDOW: Duration = Duration::from_millis(100);
    /// Longest gap between a key press and its first auto-repeat that is still taken as a repeat.
    pub const REPEAT_DELAY: Duration = Duration::from_millis(600);

    pub fn new(release_events: bool) -> Self {
        Self {
            release_events,
            last_seen: [None; Button::VARIANTS.len()],
            pressed: ButtonStates::default(),
        }
    }

    pub fn key_event(&mut self, button: Button, kind: KeyEventKind, at: Instant) {
        match kind {
            KeyEventKind::Press => {
                if self.is_fresh_press(button, at) {
                    self.pressed[button] = true;
                }
                self.last_seen[button] = Some(at);
            }
            KeyEventKind::Repeat => {
                self.last_seen[button] = Some(at);
            }
            KeyEventKind::Release => {
                self.last_seen[button] = None;
            }
        }
    }

    fn is_fresh_press(&self, button: Button, at: Instant) -> bool {
        match self.last_seen[button] {
            None => true,
            Some(_) if self.release_events => false,
            // Auto-repeats start only after the OS repeat delay, so the hold window alone
            // would see the first repeat as a new press.
            Some(seen) => at.saturating_duration_since(seen) > Self::REPEAT_DELAY,
        }
    }

    pub fn is_held(&self, button: Button, now: Instant) -> bool {
        match self.last_seen[button] {
            None => false,
            Some(_) if self.release_events => true,
            Some(seen) => now.saturating_duration_since(seen) < Self::HOLD_WINDOW,
        }
    }

    /// Builds the input for the next tick and consumes the pending presses.
    ///
    /// A button pressed and released between two ticks still counts as held for that tick.
    pub fn tick_input(&mut self, elapsed: Duration, now: Instant) -> TickInput {
        let pressed = std::mem::take(&mut self.pressed);
        let mut held = ButtonStates::default();
        for button in Button::VARIANTS {
            held[button] = pressed[button] || self.is_held(button, now);
        }
        TickInput {
            elapsed,
            held,
            pressed,
        }
    }

    pub fn release_all(&mut self) {
        self.last_seen = [None; Button::VARIANTS.len()];
        self.pressed = ButtonStates::default();
    }
}
