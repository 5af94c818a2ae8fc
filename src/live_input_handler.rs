use std::{
    io,
    sync::mpsc::{SendError, Sender},
    thread::{self, JoinHandle},
    time::Instant,
};

use blockfall_engine::Button;
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};

use crate::keybinds_presets::{normalize, Keybinds};

pub enum LiveTermSignal {
    RecognizedButton(Button, KeyEventKind),
    RawEvent(Event),
}

pub fn spawn(
    input_sender: Sender<(LiveTermSignal, Instant)>,
    keybinds: Keybinds,
) -> JoinHandle<()> {
    thread::spawn(move || forward_events(event::read, &input_sender, &keybinds))
}

fn forward_events(
    mut read: impl FnMut() -> io::Result<Event>,
    input_sender: &Sender<(LiveTermSignal, Instant)>,
    keybinds: &Keybinds,
) {
    'detect_events: loop {
        match read() {
            Ok(event) => {
                let timestamp = Instant::now();

                let mut stop_thread = false;

                let signal = match event {
                    Event::Key(KeyEvent {
                        code,
                        modifiers,
                        kind,
                        ..
                    }) => {
                        let is_press = matches!(kind, KeyEventKind::Press);
                        let (code, modifiers) = normalize((code, modifiers));
                        let quit = matches!(code, event::KeyCode::Esc | event::KeyCode::Char('q'))
                            || (matches!(code, event::KeyCode::Char('c'))
                                && modifiers.contains(event::KeyModifiers::CONTROL));

                        if is_press && quit {
                            stop_thread = true;
                        }

                        match keybinds.get(&(code, modifiers)) {
                            None => LiveTermSignal::RawEvent(event),
                            Some(&button) => LiveTermSignal::RecognizedButton(button, kind),
                        }
                    }

                    _ => LiveTermSignal::RawEvent(event),
                };

                if let Err(SendError(_)) = input_sender.send((signal, timestamp)) {
                    break 'detect_events;
                }

                if stop_thread {
                    break 'detect_events;
                }
            }

            // Returning drops the sender, which ends the game loop.
            Err(e) => {
                tracing::error!("reading terminal event failed: {e}");
                break 'detect_events;
            }
        }
    }
    tracing::debug!("input handler stopped");
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use crossterm::event::{KeyCode, KeyModifiers};

    use super::*;
    use crate::keybinds_presets::blockfall_default_keybinds;

    #[test]
    fn read_error_stops_forwarding() {
        let (sender, receiver) = mpsc::channel();
        let mut reads = 0;
        forward_events(
            || {
                reads += 1;
                Err(io::Error::other("terminal gone"))
            },
            &sender,
            &blockfall_default_keybinds(),
        );
        drop(sender);
        assert_eq!(reads, 1);
        assert!(receiver.recv().is_err());
    }

    #[test]
    fn bound_keys_become_buttons() {
        let (sender, receiver) = mpsc::channel();
        let mut events = vec![
            Ok(Event::Key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE))),
            Ok(Event::Key(KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE))),
        ];
        forward_events(
            || events.pop().unwrap_or_else(|| Err(io::Error::other("no more events"))),
            &sender,
            &blockfall_default_keybinds(),
        );
        drop(sender);
        let signals: Vec<_> = receiver.iter().map(|(signal, _)| signal).collect();
        assert!(matches!(
            signals[..],
            [
                LiveTermSignal::RecognizedButton(Button::DropHard, KeyEventKind::Press),
                LiveTermSignal::RawEvent(_),
            ]
        ));
    }
}
