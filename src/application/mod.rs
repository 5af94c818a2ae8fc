mod menus;

use std::{
    fs::File,
    io::{self, Read, Write},
    path::PathBuf,
};

use blockfall_engine::{Color, Game, GridProfile, Piece};
use crossterm::{cursor, event::KeyboardEnhancementFlags, style, terminal, ExecutableCommand};

use crate::keybinds_presets::Keybinds;

/// Best result reached on one grid profile.
#[derive(
    PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Debug, serde::Serialize, serde::Deserialize,
)]
pub struct HighScoreEntry {
    pub profile: GridProfile,
    pub score: u32,
    pub lines_cleared: u32,
    pub achieved_at: String,
}

impl HighScoreEntry {
    pub fn now(profile: GridProfile, score: u32, lines_cleared: u32) -> Self {
        Self {
            profile,
            score,
            lines_cleared,
            achieved_at: chrono::Utc::now().format("%Y-%m-%d_%H:%M").to_string(),
        }
    }
}

#[derive(
    PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Debug, Default, serde::Serialize, serde::Deserialize,
)]
pub struct Savefile {
    high_scores: Vec<HighScoreEntry>,
}

impl Savefile {
    pub fn best(&self, profile: GridProfile) -> Option<&HighScoreEntry> {
        self.high_scores.iter().find(|e| e.profile == profile)
    }

    /// Stores `entry` if it beats the recorded best of its profile; returns whether it did.
    pub fn record(&mut self, entry: HighScoreEntry) -> bool {
        match self.high_scores.iter_mut().find(|e| e.profile == entry.profile) {
            Some(best) if best.score >= entry.score => false,
            Some(best) => {
                *best = entry;
                true
            }
            None => {
                self.high_scores.push(entry);
                true
            }
        }
    }
}

/// Options fixed for the duration of one run of the program.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct SessionSettings {
    pub profile: GridProfile,
    pub seed: Option<u64>,
    pub keybinds: Keybinds,
    pub fps: u32,
    pub use_savefile: bool,
}

#[derive(PartialEq, Clone, Debug)]
pub struct Application<T: Write> {
    term: T,
    kitty_detected: bool,
    settings: SessionSettings,
    savefile: Savefile,
}

impl<T: Write> Drop for Application<T> {
    fn drop(&mut self) {
        // (Try to) undo terminal setup.
        let _ = terminal::disable_raw_mode();
        let _ = self.term.execute(style::ResetColor);
        let _ = self.term.execute(cursor::Show);
        let _ = self.term.execute(terminal::LeaveAlternateScreen);

        if self.settings.use_savefile {
            if let Err(e) = self.store_savefile(Self::savefile_path()) {
                eprintln!("{e}");
            }
        }
    }
}

impl<T: Write> Application<T> {
    pub const SAVEFILE_NAME: &'static str =
        concat!(".blockfall_", clap::crate_version!(), "_savefile.json");

    pub const KEYBOARD_ENHANCEMENT_FLAGS: KeyboardEnhancementFlags =
        KeyboardEnhancementFlags::all();

    pub fn new(mut term: T, settings: SessionSettings) -> Self {
        // Console prologue: Initialization.
        let _v = term.execute(terminal::EnterAlternateScreen);
        let _v = term.execute(terminal::SetTitle("Blockfall"));
        let _v = term.execute(cursor::Hide);
        let _v = terminal::enable_raw_mode();

        let kitty_detected = terminal::supports_keyboard_enhancement().unwrap_or(false);
        tracing::debug!(kitty_detected, "terminal initialized");

        let mut app = Self {
            term,
            kitty_detected,
            settings,
            savefile: Savefile::default(),
        };

        if app.settings.use_savefile {
            let path = Self::savefile_path();
            match app.load_savefile(path.clone()) {
                Ok(()) => tracing::info!(path = %path.display(), "savefile loaded"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(path = %path.display(), "could not load savefile: {e}"),
            }
        }

        app
    }

    fn savefile_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::SAVEFILE_NAME)
    }

    fn store_savefile(&mut self, path: PathBuf) -> io::Result<()> {
        let save_str = serde_json::to_string(&self.savefile)?;
        let mut file = File::create(path)?;
        file.write_all(save_str.as_bytes())?;
        Ok(())
    }

    fn load_savefile(&mut self, path: PathBuf) -> io::Result<()> {
        let mut file = File::open(path)?;
        let mut save_str = String::new();
        file.read_to_string(&mut save_str)?;
        self.savefile = serde_json::from_str(&save_str)?;
        Ok(())
    }

    fn record_high_score(&mut self, entry: HighScoreEntry) {
        if !self.savefile.record(entry) {
            return;
        }
        if self.settings.use_savefile {
            // Written right away so a crash later on does not lose it.
            if let Err(e) = self.store_savefile(Self::savefile_path()) {
                tracing::warn!("could not store savefile: {e}");
            }
        }
    }

    /// The three-cell piece every run opens with.
    fn opening_piece() -> Option<Piece> {
        Piece::new(vec![vec![true, false], vec![true, true]], Color::NEUTRAL, (0, 0)).ok()
    }

    pub fn run(&mut self) -> io::Result<()> {
        let profile = self.settings.profile;
        let high_score = self.savefile.best(profile).map_or(0, |e| e.score);

        let mut builder = Game::builder();
        builder.profile(profile).high_score(high_score);
        if let Some(seed) = self.settings.seed {
            builder.seed(seed);
        }
        if let Some(piece) = Self::opening_piece() {
            builder.opening_piece(piece);
        }
        let mut game = builder.build();
        tracing::info!(seed = game.seed(), ?profile, high_score, "starting game");

        self.run_menu_play_game(&mut game)
    }
}
