use std::collections::HashMap;

use blockfall_engine::Button;
use crossterm::event::{KeyCode, KeyModifiers};

pub type Keybinds = HashMap<(KeyCode, KeyModifiers), Button>;

pub fn normalize((mut code, mut modifiers): (KeyCode, KeyModifiers)) -> (KeyCode, KeyModifiers) {
    match code {
        KeyCode::Modifier(modifier_key_code) => {
            // A modifier pressed on its own also reports itself as a modifier flag; drop the duplicate.
            use crossterm::event::ModifierKeyCode as MKC;
            let modifier = match modifier_key_code {
                MKC::LeftShift | MKC::RightShift => KeyModifiers::SHIFT,
                MKC::LeftControl | MKC::RightControl => KeyModifiers::CONTROL,
                MKC::LeftAlt | MKC::RightAlt => KeyModifiers::ALT,
                MKC::LeftSuper | MKC::RightSuper => KeyModifiers::SUPER,
                MKC::LeftHyper | MKC::RightHyper => KeyModifiers::HYPER,
                MKC::LeftMeta | MKC::RightMeta => KeyModifiers::META,
                MKC::IsoLevel3Shift | MKC::IsoLevel5Shift => KeyModifiers::NONE,
            };

            modifiers.remove(modifier);
        }

        // Bindings are stored lowercase; Shift+A and CapsLock still hit the 'a' binding.
        KeyCode::Char(ref mut char) => {
            *char = char.to_ascii_lowercase();
            modifiers.remove(KeyModifiers::SHIFT);
        }

        _ => {}
    }

    (code, modifiers)
}

/// Letter keys on the left hand, with the arrow keys as an alternative.
pub fn blockfall_default_keybinds() -> Keybinds {
    let keybinds: [((KeyCode, KeyModifiers), Button); 9] = [
        (KeyCode::Char('a'), Button::MoveLeft),
        (KeyCode::Char('d'), Button::MoveRight),
        (KeyCode::Char('s'), Button::DropSoft),
        (KeyCode::Char('r'), Button::Rotate),
        (KeyCode::Char(' '), Button::DropHard),
        (KeyCode::Left, Button::MoveLeft),
        (KeyCode::Right, Button::MoveRight),
        (KeyCode::Down, Button::DropSoft),
        (KeyCode::Up, Button::Rotate),
    ]
    .map(|(k, b)| ((k, KeyModifiers::NONE), b));
    HashMap::from(keybinds)
}

pub fn vim_keybinds() -> Keybinds {
    let keybinds_vim: [((KeyCode, KeyModifiers), Button); 5] = [
        (KeyCode::Char('h'), Button::MoveLeft),
        (KeyCode::Char('l'), Button::MoveRight),
        (KeyCode::Char('j'), Button::DropSoft),
        (KeyCode::Char('k'), Button::Rotate),
        (KeyCode::Char(' '), Button::DropHard),
    ]
    .map(|(k, b)| ((k, KeyModifiers::NONE), b));
    HashMap::from(keybinds_vim)
}

/// Keys bound to `button`, formatted for the on-screen legend.
pub fn fmt_keys_of(button: Button, keybinds: &Keybinds) -> String {
    let mut keys: Vec<String> = keybinds
        .iter()
        .filter(|(_, &b)| b == button)
        .map(|((code, _), _)| match code {
            KeyCode::Char(' ') => "Space".to_owned(),
            KeyCode::Char(c) => c.to_ascii_uppercase().to_string(),
            KeyCode::Left => "←".to_owned(),
            KeyCode::Right => "→".to_owned(),
            KeyCode::Up => "↑".to_owned(),
            KeyCode::Down => "↓".to_owned(),
            other => format!("{other:?}"),
        })
        .collect();
    keys.sort();
    keys.join("/")
}
