mod application;
mod button_tracker;
mod game_renderer;
mod keybinds_presets;
mod live_input_handler;

use std::{fs::File, io, path::PathBuf, sync::Mutex};

use blockfall_engine::GridProfile;
use clap::{Parser, ValueEnum};
use tracing::Level;
use tracing_subscriber::prelude::*;

#[derive(ValueEnum, PartialEq, Eq, Clone, Copy, Debug)]
enum Profile {
    /// 10 columns × 24 rows.
    Narrow,
    /// 18 columns × 18 rows.
    Square,
}

#[derive(ValueEnum, PartialEq, Eq, Clone, Copy, Debug)]
enum KeybindsPreset {
    /// A/D move, S soft drop, R rotate, Space hard drop; arrow keys also work.
    Default,
    /// H/L move, J soft drop, K rotate, Space hard drop.
    Vim,
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Grid dimensions to play on.
    #[arg(short, long, value_enum, default_value_t = Profile::Narrow)]
    profile: Profile,
    /// Starting seed given as a 64-bit integer.
    /// The same seed produces the same sequence of pieces and spawn columns.
    /// Example: `./blockfall --seed=42` or `./blockfall -s 42`.
    #[arg(short, long)]
    seed: Option<u64>,
    /// Which keys control the game.
    #[arg(short, long, value_enum, default_value_t = KeybindsPreset::Default)]
    keybinds: KeybindsPreset,
    /// Frames rendered per second.
    #[arg(long, default_value_t = 60)]
    fps: u32,
    /// Neither read nor write the high score savefile.
    #[arg(long)]
    no_savefile: bool,
    /// Write logs to this file; nothing is logged without it.
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Increase log verbosity (-v = DEBUG, -vv = TRACE).
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(log_file: Option<&PathBuf>, verbose: u8) -> io::Result<()> {
    // The terminal is in raw mode on the alternate screen, so logs only go to a file.
    let Some(path) = log_file else {
        return Ok(());
    };
    let file = File::create(path)?;
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(level))
        .init();
    tracing::info!("logging initialized at level {level}");
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    init_logging(args.log_file.as_ref(), args.verbose)?;

    let settings = application::SessionSettings {
        profile: match args.profile {
            Profile::Narrow => GridProfile::Narrow,
            Profile::Square => GridProfile::Square,
        },
        seed: args.seed,
        keybinds: match args.keybinds {
            KeybindsPreset::Default => keybinds_presets::blockfall_default_keybinds(),
            KeybindsPreset::Vim => keybinds_presets::vim_keybinds(),
        },
        fps: args.fps,
        use_savefile: !args.no_savefile,
    };

    // Initialize application.
    let stdout = io::BufWriter::new(io::stdout());
    let mut app = application::Application::new(stdout, settings);

    // Catch panics and print them after the terminal is usable again.
    std::panic::set_hook(Box::new(|panic_info| {
        // `Application` restores the terminal on drop, but not always before the message is printed.
        let _ = crossterm::terminal::disable_raw_mode();
        let _ =
            crossterm::ExecutableCommand::execute(&mut io::stderr(), crossterm::style::ResetColor);
        let _ = crossterm::ExecutableCommand::execute(&mut io::stderr(), crossterm::cursor::Show);
        let _ = crossterm::ExecutableCommand::execute(
            &mut io::stderr(),
            crossterm::terminal::LeaveAlternateScreen,
        );

        tracing::error!("{panic_info}");
        eprint!("{panic_info}\n\n");
    }));

    app.run()?;

    Ok(())
}
